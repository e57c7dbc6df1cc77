//! Access gates in front of the ledger.
//!
//! Two independent yes/no checks, neither of which touches storage:
//!
//! - **Origin**: is the student checking in from the allowed network address?
//!   Lookup failures and timeouts deny.
//! - **Credential**: may this caller open the instructor view?

mod credential;
mod origin;

use crate::config::Config;
use crate::error::Result;

pub use credential::{check_credential, CredentialDecision, CredentialVerifier, SharedSecret};
pub use origin::{
    check_origin, ExactAddress, HttpOriginResolver, OriginDecision, OriginGate, OriginPolicy,
    OriginResolver,
};

/// Build the origin gate from configuration.
///
/// Returns `None` when no allowed address is configured, in which case
/// check-ins are not location-gated.
///
/// # Errors
///
/// Returns an error if the HTTP resolver can't be built.
pub fn origin_gate_from_config(config: &Config) -> Result<Option<OriginGate>> {
    let Some(allowed) = config.gate.allowed_origin_address else {
        return Ok(None);
    };

    let timeout = config.lookup_timeout();
    let resolver = HttpOriginResolver::new(config.gate.origin_lookup_url.clone(), timeout)?;
    Ok(Some(OriginGate::new(
        Box::new(resolver),
        Box::new(ExactAddress(allowed)),
        timeout,
    )))
}

/// Build the credential verifier from configuration.
#[must_use]
pub fn credential_verifier_from_config(config: &Config) -> Box<dyn CredentialVerifier> {
    Box::new(SharedSecret::new(config.gate.teacher_secret.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_allowed_address_means_no_gate() {
        let config = Config::default();
        assert!(origin_gate_from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_allowed_address_builds_gate() {
        let mut config = Config::default();
        config.gate.allowed_origin_address = Some("203.0.113.7".parse().unwrap());
        assert!(origin_gate_from_config(&config).unwrap().is_some());
    }

    #[test]
    fn test_verifier_from_config() {
        let mut config = Config::default();
        assert!(!credential_verifier_from_config(&config)
            .verify("anything")
            .is_granted());

        config.gate.teacher_secret = Some("s3cret".to_string());
        assert!(credential_verifier_from_config(&config)
            .verify("s3cret")
            .is_granted());
    }
}
