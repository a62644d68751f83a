//! HS256 JSON Web Token verification.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AuthError;
use crate::types::{CredentialVerifier, PrincipalRecord};

/// Claims read from handshake tokens.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Principal name.
    pub sub: String,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
    /// Issue time, seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

/// Verifies tokens signed with a shared HS256 secret.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Create a verifier for `secret`.
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Decode and verify signature and expiry.
    pub fn claims(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier").finish_non_exhaustive()
    }
}

impl CredentialVerifier for JwtVerifier {
    fn extract_principal(&self, token: &str) -> Result<String, AuthError> {
        let claims = self.claims(token)?;
        if claims.sub.is_empty() {
            return Err(AuthError::MissingSubject);
        }
        Ok(claims.sub)
    }

    fn is_credential_valid(&self, token: &str, record: &PrincipalRecord) -> bool {
        let Ok(claims) = self.claims(token) else {
            return false;
        };
        let now = chrono::Utc::now().timestamp();
        let valid = record.enabled && claims.sub == record.name && claims.exp > now;
        if !valid {
            debug!(principal = %record.name, enabled = record.enabled, "token not valid for principal");
        }
        valid
    }
}
