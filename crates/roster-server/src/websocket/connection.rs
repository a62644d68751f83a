//! WebSocket connection lifecycle, from upgrade through disconnect.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message as WsMessage, WebSocket};
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use roster_core::{Message, encode};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use super::handler::handle_frame;
use super::registry::SessionRegistry;
use super::session::Session;
use crate::metrics::{
    WS_CONNECTION_DURATION_SECONDS, WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL,
    WS_DISCONNECTIONS_TOTAL,
};

/// How long the writer may keep flushing after the session closes.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Run an admitted session until the client goes away or the server closes it.
///
/// Registers `session`, forwards text queued on `rx` to the socket from a
/// writer task, and answers each inbound `PING` with a `PONG` on this session
/// only. Pongs and the close frame are signalled through `session` and go out
/// ahead of any queued text. On exit the session is closed and removed from
/// `registry`.
#[instrument(skip_all, fields(session_id = %session.id(), principal = session.principal()))]
pub async fn run_session(
    ws: WebSocket,
    session: Arc<Session>,
    mut rx: mpsc::Receiver<Arc<String>>,
    registry: Arc<SessionRegistry>,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();

    registry.add(Arc::clone(&session)).await;
    info!("client connected");
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);

    let writer_session = Arc::clone(&session);
    let mut writer = tokio::spawn(async move {
        let session = writer_session;
        loop {
            tokio::select! {
                biased;
                () = session.closed() => {
                    let close = CloseFrame {
                        code: session.close_code(),
                        reason: "".into(),
                    };
                    if let Err(e) = ws_tx.send(WsMessage::Close(Some(close))).await {
                        debug!(error = %e, "close frame write failed");
                    }
                    break;
                }
                () = session.pong_requested() => {
                    let pong = match encode(&Message::<()>::Pong) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!(error = %e, "failed to encode pong");
                            continue;
                        }
                    };
                    let mut failed = false;
                    for _ in 0..session.take_pongs() {
                        if let Err(e) = ws_tx.send(WsMessage::Text(pong.as_str().into())).await {
                            debug!(error = %e, "pong write failed");
                            failed = true;
                            break;
                        }
                    }
                    if failed {
                        break;
                    }
                }
                frame = rx.recv() => {
                    let Some(text) = frame else { break };
                    if let Err(e) = ws_tx.send(WsMessage::Text(text.as_str().into())).await {
                        debug!(error = %e, "write failed");
                        break;
                    }
                }
            }
        }
        session.mark_closed();
    });

    let mut writer_done = false;
    loop {
        tokio::select! {
            inbound = ws_rx.next() => {
                let text = match inbound {
                    Some(Ok(WsMessage::Text(t))) => t.to_string(),
                    Some(Ok(WsMessage::Binary(data))) => match std::str::from_utf8(&data) {
                        Ok(s) => s.to_owned(),
                        Err(_) => {
                            info!(len = data.len(), "ignoring non-UTF8 binary frame");
                            continue;
                        }
                    },
                    Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_))) => continue,
                    Some(Ok(WsMessage::Close(_))) => {
                        info!("client sent close frame");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(error = %e, "read failed");
                        break;
                    }
                    None => break,
                };

                let Some(reply) = handle_frame(&text) else { continue };
                let queued = match &reply {
                    Message::Pong => session.queue_pong(),
                    other => match encode(other) {
                        Ok(json) => session.send(Arc::new(json)),
                        Err(e) => {
                            warn!(error = %e, "failed to encode reply");
                            continue;
                        }
                    },
                };
                if let Err(e) = queued {
                    warn!(error = %e, kind = reply.type_tag(), "failed to enqueue reply");
                }
            }
            () = session.closed() => {
                debug!(code = session.close_code(), "session closed by server");
                break;
            }
            _ = &mut writer => {
                debug!("writer finished");
                writer_done = true;
                break;
            }
        }
    }

    session.mark_closed();
    if !writer_done && tokio::time::timeout(CLOSE_GRACE, &mut writer).await.is_err() {
        debug!("writer did not finish within grace period");
        writer.abort();
    }
    registry.remove(session.id()).await;

    info!("client disconnected");
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(session.age().as_secs_f64());
}
