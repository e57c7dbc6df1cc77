//! Instructor credential check.
//!
//! A single shared secret compared as a plain string. This is a placeholder
//! trust boundary: there is no hashing, lockout or rate limiting. Swap in a
//! different [`CredentialVerifier`] for real identity checks.

use std::fmt;

use tracing::warn;

/// True iff `supplied` exactly equals `expected`.
#[must_use]
pub fn check_credential(supplied: &str, expected: &str) -> bool {
    supplied == expected
}

/// Outcome of a credential check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialDecision {
    /// Access to the instructor view is granted.
    Granted,
    /// The credential didn't match. A normal outcome, not an error.
    Denied,
}

impl CredentialDecision {
    /// Whether access was granted.
    #[must_use]
    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }
}

/// Verifies a credential supplied for the instructor view.
pub trait CredentialVerifier: Send + Sync + fmt::Debug {
    /// Check `supplied` against whatever this verifier trusts.
    fn verify(&self, supplied: &str) -> CredentialDecision;
}

/// One configured secret shared by every instructor.
///
/// With no secret configured the instructor view stays locked.
#[derive(Clone)]
pub struct SharedSecret {
    expected: Option<String>,
}

impl SharedSecret {
    /// Verify against `expected`, or deny everything when `None`.
    #[must_use]
    pub fn new(expected: Option<String>) -> Self {
        Self { expected }
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSecret")
            .field("configured", &self.expected.is_some())
            .finish()
    }
}

impl CredentialVerifier for SharedSecret {
    fn verify(&self, supplied: &str) -> CredentialDecision {
        match &self.expected {
            Some(expected) if check_credential(supplied, expected) => CredentialDecision::Granted,
            Some(_) => {
                warn!("Instructor credential rejected");
                CredentialDecision::Denied
            }
            None => {
                warn!("Instructor credential checked but no secret is configured");
                CredentialDecision::Denied
            }
        }
    }
}
