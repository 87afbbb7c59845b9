use std::path::Path;

use thiserror::Error;

use crate::{
    config::AppConfig, models::ScanReport, parser::parse_nmap_xml,
    security::run_command_allowlisted,
};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("command not allowed: {0}")]
    NotAllowed(String),

    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} timed out after {secs} seconds")]
    Timeout { tool: String, secs: u64 },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("unreadable scan output: {0}")]
    Parse(#[from] quick_xml::de::DeError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub target: String,
    pub ports: String,
    pub flags: Vec<String>,
}

impl ScanRequest {
    pub fn from_config(target: impl Into<String>, cfg: &AppConfig) -> Self {
        Self {
            target: target.into(),
            ports: cfg.scan_ports.clone(),
            flags: cfg.scan_flags.clone(),
        }
    }
}

#[async_trait::async_trait]
pub trait ToolAdapter: Send + Sync {
    fn name(&self) -> &'static str;
    async fn run(&self, req: ScanRequest) -> Result<ScanReport, ScanError>;
}

pub struct NmapAdapter {
    pub binary: String,
    pub timeout_secs: u64,
}

impl NmapAdapter {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            binary: cfg.nmap_path.clone(),
            timeout_secs: cfg.scan_timeout_secs,
        }
    }

    // a configured path is only trusted when it points at an `nmap` executable
    fn allowed_commands(&self) -> Vec<&str> {
        let mut allowed = vec!["nmap"];
        let is_nmap = Path::new(&self.binary)
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name == "nmap" || name == "nmap.exe");
        if is_nmap && self.binary != "nmap" {
            allowed.push(&self.binary);
        }
        allowed
    }
}

#[async_trait::async_trait]
impl ToolAdapter for NmapAdapter {
    fn name(&self) -> &'static str {
        "nmap"
    }

    async fn run(&self, req: ScanRequest) -> Result<ScanReport, ScanError> {
        let args = nmap_args(&req);
        let allowed = self.allowed_commands();
        let xml = run_command_allowlisted(&self.binary, &args, &allowed, self.timeout_secs).await?;
        parse_nmap_xml(&xml)
    }
}

// target goes last so it can never be read as an option
fn nmap_args(req: &ScanRequest) -> Vec<String> {
    let mut args = req.flags.clone();
    if !req.ports.is_empty() {
        args.push("-p".to_string());
        args.push(req.ports.clone());
    }
    args.extend(["-oX".to_string(), "-".to_string(), req.target.clone()]);
    args
}

#[cfg(test)]
mod tests {
    use super::{nmap_args, NmapAdapter, ScanError, ScanRequest, ToolAdapter};
    use crate::config::AppConfig;

    #[test]
    fn request_uses_configured_ports_and_flags() {
        let req = ScanRequest::from_config("scanme.nmap.org", &AppConfig::default());
        assert_eq!(
            nmap_args(&req),
            vec!["-T4", "-p", "1-65535", "-oX", "-", "scanme.nmap.org"]
        );
    }

    #[test]
    fn empty_port_spec_leaves_nmap_defaults() {
        let req = ScanRequest {
            target: "10.0.0.1".into(),
            ports: String::new(),
            flags: vec!["-Pn".into(), "-T3".into()],
        };
        assert_eq!(nmap_args(&req), vec!["-Pn", "-T3", "-oX", "-", "10.0.0.1"]);
    }

    #[tokio::test]
    async fn missing_nmap_binary_surfaces_as_scan_error() {
        let adapter = NmapAdapter {
            binary: "/nonexistent/bin/nmap".into(),
            timeout_secs: 5,
        };
        let req = ScanRequest::from_config("127.0.0.1", &AppConfig::default());
        let err = adapter.run(req).await.unwrap_err();
        assert!(matches!(err, ScanError::Spawn { .. }));
        assert_eq!(adapter.name(), "nmap");
    }

    #[tokio::test]
    async fn configured_binary_other_than_nmap_is_refused() {
        for binary in ["/bin/sh", "echo", "/usr/local/bin/nmap-wrapper"] {
            let adapter = NmapAdapter {
                binary: binary.into(),
                timeout_secs: 5,
            };
            let req = ScanRequest::from_config("127.0.0.1", &AppConfig::default());
            let err = adapter.run(req).await.unwrap_err();
            assert!(matches!(err, ScanError::NotAllowed(ref cmd) if cmd == binary));
        }
    }

    #[test]
    fn nmap_at_a_custom_path_is_allowed() {
        let adapter = NmapAdapter {
            binary: "/opt/nmap/bin/nmap".into(),
            timeout_secs: 5,
        };
        assert_eq!(adapter.allowed_commands(), vec!["nmap", "/opt/nmap/bin/nmap"]);

        let default = NmapAdapter::from_config(&AppConfig::default());
        assert_eq!(default.allowed_commands(), vec!["nmap"]);
    }
}
