use std::net::IpAddr;

use hickory_resolver::TokioAsyncResolver;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no target given")]
    Empty,

    #[error("target `{0}` looks like a command-line option")]
    OptionLike(String),

    #[error("`{target}` is neither an IP address nor a resolvable host: {reason}")]
    Unresolvable { target: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTarget {
    pub target: String,
    pub addrs: Vec<IpAddr>,
}

#[async_trait::async_trait]
pub trait TargetResolver: Send + Sync {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, String>;
}

pub struct SystemResolver {
    inner: TokioAsyncResolver,
}

impl SystemResolver {
    pub fn from_system_conf() -> anyhow::Result<Self> {
        Ok(Self {
            inner: TokioAsyncResolver::tokio_from_system_conf()?,
        })
    }
}

#[async_trait::async_trait]
impl TargetResolver for SystemResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, String> {
        self.inner
            .lookup_ip(host)
            .await
            .map(|lookup| lookup.iter().collect())
            .map_err(|e| e.to_string())
    }
}

pub async fn validate_target(
    input: &str,
    resolver: &dyn TargetResolver,
) -> Result<ValidatedTarget, ValidationError> {
    let target = input.trim();
    if target.is_empty() {
        return Err(ValidationError::Empty);
    }
    if target.starts_with('-') {
        return Err(ValidationError::OptionLike(target.to_string()));
    }

    if let Ok(ip) = target.parse::<IpAddr>() {
        return Ok(ValidatedTarget {
            target: target.to_string(),
            addrs: vec![ip],
        });
    }

    match resolver.lookup(target).await {
        Ok(addrs) if !addrs.is_empty() => Ok(ValidatedTarget {
            target: target.to_string(),
            addrs,
        }),
        Ok(_) => Err(ValidationError::Unresolvable {
            target: target.to_string(),
            reason: "no addresses returned".to_string(),
        }),
        Err(reason) => Err(ValidationError::Unresolvable {
            target: target.to_string(),
            reason,
        }),
    }
}
