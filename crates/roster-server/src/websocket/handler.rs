//! Inbound frame dispatch.

use roster_core::{Message, decode};
use tracing::{info, warn};

/// Handle one inbound text frame.
///
/// Returns the reply to queue on the same session, if any. Only `PING` gets a
/// reply. Everything else, including frames that fail to decode, is logged
/// and otherwise ignored.
pub fn handle_frame(text: &str) -> Option<Message> {
    match decode(text) {
        Ok(Message::Ping) => Some(Message::Pong),
        Ok(message) => {
            info!(kind = message.type_tag(), payload = text, "received message");
            None
        }
        Err(e) => {
            warn!(error = %e, payload = text, "ignoring malformed frame");
            None
        }
    }
}
