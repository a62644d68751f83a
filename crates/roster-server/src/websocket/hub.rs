//! Attendance fan-out to connected clients.

use std::sync::Arc;

use metrics::counter;
use roster_core::{Message, encode};
use serde::Serialize;
use tracing::{debug, error, warn};

use super::registry::SessionRegistry;
use crate::errors::HubError;
use crate::metrics::{WS_BROADCAST_DROPS_TOTAL, WS_BROADCASTS_TOTAL};

/// Outcome of a broadcast that was encoded and attempted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Open sessions in the snapshot.
    pub recipients: usize,
    /// Sessions whose writer accepted the frame.
    pub delivered: usize,
    /// Sessions that could not take the frame.
    pub failed: usize,
}

/// Producer-facing facade over the session registry.
#[derive(Clone)]
pub struct BroadcastHub {
    registry: Arc<SessionRegistry>,
}

impl BroadcastHub {
    /// Create a hub over `registry`.
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this hub delivers to.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Send `{"type":"ATTENDANCE","data":employee}` to every open session.
    pub async fn broadcast_attendance<E>(&self, employee: &E) -> Result<BroadcastReport, HubError>
    where
        E: Serialize + ?Sized,
    {
        self.broadcast(&Message::Attendance { data: employee }).await
    }

    /// Send `{"type":"ERROR","message":...}` to every open session.
    pub async fn broadcast_error(
        &self,
        message: impl Into<String>,
    ) -> Result<BroadcastReport, HubError> {
        self.broadcast(&Message::<()>::Error {
            message: message.into(),
        })
        .await
    }

    /// Close every session with a normal closure and empty the registry.
    pub async fn close_all_sessions(&self) {
        self.registry.close_all_sessions().await;
    }

    async fn broadcast<T: Serialize>(
        &self,
        message: &Message<T>,
    ) -> Result<BroadcastReport, HubError> {
        let kind = message.type_tag();
        let text = match encode(message) {
            Ok(text) => Arc::new(text),
            Err(e) => {
                error!(kind, error = %e, "failed to encode broadcast");
                return Err(e.into());
            }
        };

        let sessions = self.registry.snapshot_open().await;
        let mut report = BroadcastReport {
            recipients: sessions.len(),
            ..BroadcastReport::default()
        };
        debug!(kind, recipients = report.recipients, "broadcasting");

        for session in &sessions {
            match session.send(Arc::clone(&text)) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    counter!(WS_BROADCAST_DROPS_TOTAL).increment(1);
                    warn!(session_id = %session.id(), error = %e, "failed to deliver broadcast");
                }
            }
        }

        counter!(WS_BROADCASTS_TOTAL, "type" => kind).increment(1);
        Ok(report)
    }
}

impl std::fmt::Debug for BroadcastHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("sessions", &self.registry.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::session::Session;
    use assert_matches::assert_matches;
    use futures::FutureExt;
    use roster_core::{EmployeeRecord, EmployeeStatus};
    use std::collections::HashMap;
    use tokio::sync::mpsc;

    fn employee() -> EmployeeRecord {
        EmployeeRecord {
            id: 7,
            name: Some("Ada".into()),
            department: Some("R&D".into()),
            email: None,
            trainings_attended: 3,
            status: EmployeeStatus::Active,
        }
    }

    async fn hub_with(n: usize) -> (BroadcastHub, Vec<(Arc<Session>, mpsc::Receiver<Arc<String>>)>) {
        let registry = Arc::new(SessionRegistry::new());
        let mut sessions = Vec::new();
        for i in 0..n {
            let (tx, rx) = mpsc::channel(4);
            let session = Arc::new(Session::new(format!("user{i}"), tx));
            registry.add(session.clone()).await;
            sessions.push((session, rx));
        }
        (BroadcastHub::new(registry), sessions)
    }

    fn text_of(frame: Arc<String>) -> String {
        frame.as_str().to_owned()
    }

    #[tokio::test]
    async fn attendance_reaches_every_open_session_once() {
        let (hub, mut sessions) = hub_with(3).await;
        let report = hub.broadcast_attendance(&employee()).await.unwrap();
        assert_eq!(
            report,
            BroadcastReport {
                recipients: 3,
                delivered: 3,
                failed: 0
            }
        );

        let mut texts = Vec::new();
        for (_, rx) in &mut sessions {
            texts.push(text_of(rx.try_recv().unwrap()));
            assert!(rx.try_recv().is_err());
        }
        assert!(texts.windows(2).all(|w| w[0] == w[1]));
        let value: serde_json::Value = serde_json::from_str(&texts[0]).unwrap();
        assert_eq!(value["type"], "ATTENDANCE");
        assert_eq!(value["data"]["name"], "Ada");
        assert_eq!(value["data"]["department"], "R&D");
    }

    #[tokio::test]
    async fn sessions_share_one_encoded_frame() {
        let (hub, mut sessions) = hub_with(2).await;
        let _ = hub.broadcast_error("boom").await.unwrap();
        let a = sessions[0].1.try_recv().unwrap();
        let b = sessions[1].1.try_recv().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn error_broadcast_shape() {
        let (hub, mut sessions) = hub_with(1).await;
        let _ = hub.broadcast_error("db down").await.unwrap();
        let text = text_of(sessions[0].1.try_recv().unwrap());
        assert_eq!(text, r#"{"type":"ERROR","message":"db down"}"#);
    }

    #[tokio::test]
    async fn closed_sessions_are_excluded() {
        let (hub, mut sessions) = hub_with(3).await;
        sessions[1].0.mark_closed();
        let report = hub.broadcast_attendance(&employee()).await.unwrap();
        assert_eq!(report.recipients, 2);
        assert_eq!(report.delivered, 2);
        assert!(sessions[1].1.try_recv().is_err());
        assert_eq!(hub.registry().len(), 2);
    }

    #[tokio::test]
    async fn empty_registry_is_a_noop() {
        let (hub, _) = hub_with(0).await;
        let report = hub.broadcast_error("nobody").await.unwrap();
        assert_eq!(report, BroadcastReport::default());
    }

    #[tokio::test]
    async fn slow_session_does_not_block_others() {
        let (hub, mut sessions) = hub_with(2).await;
        for _ in 0..4 {
            sessions[0].0.send(Arc::new("fill".into())).unwrap();
        }
        let report = hub.broadcast_error("x").await.unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 1);
        assert!(sessions[0].0.is_open());
        assert_eq!(hub.registry().len(), 2);
        assert!(sessions[1].1.try_recv().is_ok());
    }

    #[tokio::test]
    async fn encode_failure_delivers_nothing() {
        let (hub, mut sessions) = hub_with(2).await;
        let mut bad = HashMap::new();
        let _ = bad.insert((1, 2), "tuple keys are not valid JSON object keys");
        assert_matches!(hub.broadcast_attendance(&bad).await, Err(HubError::Encode(_)));
        for (session, rx) in &mut sessions {
            assert!(rx.try_recv().is_err());
            assert!(session.is_open());
        }
    }

    #[tokio::test]
    async fn close_all_delegates_to_registry() {
        let (hub, mut sessions) = hub_with(2).await;
        hub.close_all_sessions().await;
        assert!(hub.registry().is_empty());
        for (session, rx) in &mut sessions {
            assert!(session.closed().now_or_never().is_some());
            assert_eq!(session.close_code(), 1000);
            assert!(rx.try_recv().is_err());
        }
    }
}
