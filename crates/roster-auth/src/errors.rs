//! Auth error types.

/// Failures reported by the identity collaborators.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The token failed signature, expiry, or format checks.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// The token carries no subject.
    #[error("token has no subject")]
    MissingSubject,

    /// The identity store has no record for this principal.
    #[error("unknown principal: {0}")]
    UnknownPrincipal(String),
}

/// Why a handshake was refused.
#[derive(Debug, thiserror::Error)]
pub enum Rejected {
    /// No `token` query parameter, or an empty one.
    #[error("missing token query parameter")]
    MissingToken,

    /// The `token` value is not valid percent-encoded UTF-8.
    #[error("malformed token query parameter")]
    MalformedToken,

    /// A collaborator failed while verifying the credential.
    #[error("credential verification failed: {0}")]
    Verification(#[from] AuthError),

    /// The credential does not authorize the named principal.
    #[error("credential is not valid for principal {0}")]
    InvalidCredential(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_principal_display() {
        let err = AuthError::UnknownPrincipal("mallory".into());
        assert_eq!(err.to_string(), "unknown principal: mallory");
    }

    #[test]
    fn rejected_wraps_auth_error() {
        let err: Rejected = AuthError::MissingSubject.into();
        assert_eq!(
            err.to_string(),
            "credential verification failed: token has no subject"
        );
    }

    #[test]
    fn invalid_credential_display() {
        let err = Rejected::InvalidCredential("alice".into());
        assert!(err.to_string().contains("alice"));
    }
}
