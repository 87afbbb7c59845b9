use std::{env, fs};

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub nmap_path: String,
    pub scan_ports: String,
    pub scan_flags: Vec<String>,
    pub scan_timeout_secs: u64,
    pub callback_timeout_secs: u64,
    pub scope_allowlist: Vec<String>,
    pub verification_token: Option<String>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = env::var("SCANHOOK_CONFIG").unwrap_or_else(|_| "config.json".to_string());
        let file_cfg: Option<AppConfig> = fs::read_to_string(&path)
            .ok()
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .with_context(|| format!("failed to parse {path}"))?;

        let mut cfg = file_cfg.unwrap_or_default();
        cfg.apply_env(|key| env::var(key).ok());
        Ok(cfg)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("SH_HOST") {
            self.host = v;
        }
        if let Some(v) = var("SH_PORT") {
            self.port = v.parse().unwrap_or(self.port);
        }
        if let Some(v) = var("SH_NMAP_PATH") {
            self.nmap_path = v;
        }
        if let Some(v) = var("SH_SCAN_PORTS") {
            self.scan_ports = v;
        }
        if let Some(v) = var("SH_SCAN_FLAGS") {
            self.scan_flags = v.split_whitespace().map(ToString::to_string).collect();
        }
        if let Some(v) = var("SH_SCAN_TIMEOUT_SECS") {
            self.scan_timeout_secs = v.parse().unwrap_or(self.scan_timeout_secs);
        }
        if let Some(v) = var("SH_CALLBACK_TIMEOUT_SECS") {
            self.callback_timeout_secs = v.parse().unwrap_or(self.callback_timeout_secs);
        }
        if let Some(v) = var("SH_SCOPE_ALLOWLIST") {
            self.scope_allowlist = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = var("SH_VERIFICATION_TOKEN") {
            self.verification_token = Some(v).filter(|t| !t.is_empty());
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            nmap_path: "nmap".to_string(),
            scan_ports: "1-65535".to_string(),
            scan_flags: vec!["-T4".to_string()],
            scan_timeout_secs: 900,
            callback_timeout_secs: 10,
            scope_allowlist: vec![],
            verification_token: None,
        }
    }
}
