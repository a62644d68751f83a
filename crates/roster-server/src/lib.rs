//! # roster-server
//!
//! Axum server that pushes attendance updates to authenticated WebSocket
//! clients.
//!
//! - [`server`]: router with `/ws`, `/health` and `/metrics`
//! - [`websocket`]: sessions, the session registry, frame handling and the
//!   [`BroadcastHub`] producers call into
//! - [`shutdown`]: cancellation-token based graceful shutdown
//! - [`metrics`]: Prometheus recorder and metric names

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod health;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use config::ServerConfig;
pub use errors::{HubError, SessionError};
pub use server::RosterServer;
pub use shutdown::ShutdownCoordinator;
pub use websocket::hub::{BroadcastHub, BroadcastReport};
pub use websocket::registry::SessionRegistry;
pub use websocket::session::{Session, SessionState};
