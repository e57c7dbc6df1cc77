//! Network-origin check for student check-ins.
//!
//! The caller's public address is resolved through an [`OriginResolver`] and
//! judged by an [`OriginPolicy`]. Resolution is bounded by a timeout, and a
//! failed or slow lookup always denies.

use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// True iff a resolved address exactly matches the allowed one.
///
/// `None` stands for a failed lookup and is never allowed.
#[must_use]
pub fn check_origin(resolved: Option<IpAddr>, allowed: IpAddr) -> bool {
    resolved == Some(allowed)
}

/// Source of the caller's externally visible address.
#[async_trait::async_trait]
pub trait OriginResolver: Send + Sync + fmt::Debug {
    /// Resolve the current public address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OriginLookup`] if the address can't be determined.
    async fn resolve(&self) -> Result<IpAddr>;
}

/// Decides whether a resolved address may check in.
pub trait OriginPolicy: Send + Sync + fmt::Debug {
    /// Whether `observed` is an acceptable origin.
    fn permits(&self, observed: IpAddr) -> bool;
}

/// Accept exactly one address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExactAddress(pub IpAddr);

impl OriginPolicy for ExactAddress {
    fn permits(&self, observed: IpAddr) -> bool {
        check_origin(Some(observed), self.0)
    }
}

/// Resolves the public address by asking an HTTP echo service.
///
/// The service must answer a GET with the address as plain text, as
/// `https://api.ipify.org` does.
#[derive(Debug, Clone)]
pub struct HttpOriginResolver {
    client: reqwest::Client,
    url: String,
}

impl HttpOriginResolver {
    /// Create a resolver for `url` whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OriginLookup`] if the HTTP client can't be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|err| Error::origin_lookup(err.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// The lookup URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl OriginResolver for HttpOriginResolver {
    async fn resolve(&self) -> Result<IpAddr> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| Error::origin_lookup(err.to_string()))?
            .text()
            .await
            .map_err(|err| Error::origin_lookup(err.to_string()))?;

        let text = body.trim();
        text.parse()
            .map_err(|_| Error::origin_lookup(format!("lookup service returned `{text}`")))
    }
}

/// Result of an origin check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginDecision {
    /// The caller is at an allowed address.
    Allowed {
        /// The resolved address.
        observed: IpAddr,
    },
    /// The caller resolved to an address the policy rejects.
    Denied {
        /// The resolved address.
        observed: IpAddr,
    },
    /// The address couldn't be resolved in time. Treated as denial.
    LookupFailed {
        /// Why resolution failed.
        reason: String,
    },
}

impl OriginDecision {
    /// Only [`OriginDecision::Allowed`] lets a check-in through.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Resolver, policy and time bound for the origin check.
#[derive(Debug)]
pub struct OriginGate {
    resolver: Box<dyn OriginResolver>,
    policy: Box<dyn OriginPolicy>,
    timeout: Duration,
}

impl OriginGate {
    /// Create a gate. `timeout` bounds the whole resolution.
    #[must_use]
    pub fn new(
        resolver: Box<dyn OriginResolver>,
        policy: Box<dyn OriginPolicy>,
        timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            policy,
            timeout,
        }
    }

    /// Resolve the caller's address and judge it.
    pub async fn check(&self) -> OriginDecision {
        let resolved = match tokio::time::timeout(self.timeout, self.resolver.resolve()).await {
            Ok(Ok(addr)) => addr,
            Ok(Err(err)) => {
                warn!("Origin lookup failed: {err}");
                return OriginDecision::LookupFailed {
                    reason: err.to_string(),
                };
            }
            Err(_) => {
                warn!("Origin lookup timed out after {:?}", self.timeout);
                return OriginDecision::LookupFailed {
                    reason: format!("lookup timed out after {}ms", self.timeout.as_millis()),
                };
            }
        };

        if self.policy.permits(resolved) {
            debug!("Origin {resolved} allowed");
            OriginDecision::Allowed { observed: resolved }
        } else {
            warn!("Origin {resolved} denied");
            OriginDecision::Denied { observed: resolved }
        }
    }
}
