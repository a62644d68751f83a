//! Identity collaborator seams.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AuthError;

/// What the identity store knows about a principal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalRecord {
    /// Principal name, as carried in the token subject.
    pub name: String,
    /// Whether the principal may connect at all.
    pub enabled: bool,
}

impl PrincipalRecord {
    /// An enabled principal.
    pub fn enabled(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
        }
    }
}

/// Verifies bearer credentials.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialVerifier: Send + Sync {
    /// Read the principal name out of a token, checking its integrity.
    fn extract_principal(&self, token: &str) -> Result<String, AuthError>;

    /// Whether `token` is currently valid for `record`.
    fn is_credential_valid(&self, token: &str, record: &PrincipalRecord) -> bool;
}

/// Looks up principals by name.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Fetch the record for `name`.
    async fn lookup_principal(&self, name: &str) -> Result<PrincipalRecord, AuthError>;
}
