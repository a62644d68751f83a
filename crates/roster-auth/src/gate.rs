//! Handshake admission.
//!
//! [`AuthGate::admit`] runs before the WebSocket upgrade. It never creates
//! session state; the caller refuses the upgrade when it returns
//! [`Rejected`].

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::errors::Rejected;
use crate::query::extract_token;
use crate::types::{CredentialVerifier, IdentityStore};

/// Admits or rejects connection attempts based on their `token` parameter.
#[derive(Clone)]
pub struct AuthGate {
    verifier: Arc<dyn CredentialVerifier>,
    store: Arc<dyn IdentityStore>,
}

impl AuthGate {
    /// Create a gate over the given collaborators.
    pub fn new(verifier: Arc<dyn CredentialVerifier>, store: Arc<dyn IdentityStore>) -> Self {
        Self { verifier, store }
    }

    /// Admit a handshake, returning the authenticated principal name.
    pub async fn admit(&self, query: Option<&str>) -> Result<String, Rejected> {
        let result = self.verify(query).await;
        match &result {
            Ok(principal) => debug!(principal, "handshake admitted"),
            Err(Rejected::Verification(e)) => {
                error!(error = %e, "invalid token in WebSocket connection");
                warn!("unauthorized WebSocket connection attempt");
            }
            Err(e) => warn!(reason = %e, "unauthorized WebSocket connection attempt"),
        }
        result
    }

    async fn verify(&self, query: Option<&str>) -> Result<String, Rejected> {
        debug!(has_query = query.is_some(), "processing WebSocket handshake");
        let token = extract_token(query)?;
        let principal = self.verifier.extract_principal(&token)?;
        let record = self.store.lookup_principal(&principal).await?;
        if self.verifier.is_credential_valid(&token, &record) {
            Ok(principal)
        } else {
            Err(Rejected::InvalidCredential(principal))
        }
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate").finish_non_exhaustive()
    }
}
