use std::{collections::HashSet, net::IpAddr, str::FromStr, time::Duration};

use ipnet::IpNet;
use tokio::{process::Command, time::timeout};
use tracing::info;

use crate::adapters::ScanError;

pub fn in_scope(target: &str, resolved: &[IpAddr], allowlist: &[String]) -> bool {
    // empty allowlist: no scope restriction
    if allowlist.is_empty() {
        return true;
    }

    if allowlist
        .iter()
        .any(|item| item.eq_ignore_ascii_case(target))
    {
        return true;
    }

    let literal = IpAddr::from_str(target).ok();
    let candidates: Vec<IpAddr> = literal.into_iter().chain(resolved.iter().copied()).collect();

    allowlist.iter().any(|entry| {
        let net = IpNet::from_str(entry)
            .ok()
            .or_else(|| IpAddr::from_str(entry).ok().map(IpNet::from));
        net.is_some_and(|net| candidates.iter().any(|ip| net.contains(ip)))
    })
}

pub async fn run_command_allowlisted(
    cmd: &str,
    args: &[String],
    allowed: &[&str],
    timeout_secs: u64,
) -> Result<String, ScanError> {
    let allowed_set: HashSet<&str> = allowed.iter().copied().collect();
    if !allowed_set.contains(cmd) {
        return Err(ScanError::NotAllowed(cmd.to_string()));
    }

    info!(command = cmd, ?args, "audit: launching external tool");
    let child = Command::new(cmd)
        .args(args)
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ScanError::Spawn {
            tool: cmd.to_string(),
            source,
        })?;

    let out = timeout(Duration::from_secs(timeout_secs), child.wait_with_output())
        .await
        .map_err(|_| ScanError::Timeout {
            tool: cmd.to_string(),
            secs: timeout_secs,
        })?
        .map_err(|source| ScanError::Spawn {
            tool: cmd.to_string(),
            source,
        })?;

    if !out.status.success() {
        return Err(ScanError::Failed {
            tool: cmd.to_string(),
            status: out.status.to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&out.stdout).to_string())
}
