//! WebSocket sessions, the session registry, frame dispatch and broadcasting.

pub mod connection;
pub mod handler;
pub mod hub;
pub mod registry;
pub mod session;
