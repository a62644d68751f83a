//! # roster-core
//!
//! Shared building blocks for the Roster attendance broadcaster:
//!
//! - [`protocol`]: the tagged JSON message codec spoken over each WebSocket
//! - [`ids`]: the [`SessionId`] newtype
//! - [`employee`]: the typed attendance payload
//! - [`logging`]: `tracing` subscriber initialization

#![deny(unsafe_code)]

pub mod employee;
pub mod ids;
pub mod logging;
pub mod protocol;

pub use employee::{EmployeeRecord, EmployeeStatus};
pub use ids::SessionId;
pub use logging::{LogFormat, init_subscriber};
pub use protocol::{CodecError, Message, decode, encode};
