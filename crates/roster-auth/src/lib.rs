//! # roster-auth
//!
//! Handshake authentication for Roster WebSocket connections.
//!
//! A client connects to `/ws?token=<credential>`. The [`AuthGate`] pulls the
//! token out of the query string, asks a [`CredentialVerifier`] for the
//! principal it names, looks that principal up in an [`IdentityStore`], and
//! asks the verifier again whether the token is valid for the record. Any
//! failure on that path is a [`Rejected`].
//!
//! Default collaborators:
//! - [`JwtVerifier`]: HS256 tokens with `sub` and `exp` claims
//! - [`InMemoryIdentityStore`]: principals configured at startup

#![deny(unsafe_code)]

pub mod errors;
pub mod gate;
pub mod jwt;
pub mod query;
pub mod store;
pub mod types;

pub use errors::{AuthError, Rejected};
pub use gate::AuthGate;
pub use jwt::{Claims, JwtVerifier};
pub use query::extract_token;
pub use store::InMemoryIdentityStore;
pub use types::{CredentialVerifier, IdentityStore, PrincipalRecord};
