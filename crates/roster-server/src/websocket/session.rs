//! Per-connection session state.
//!
//! Broadcast text rides a bounded queue that a slow client can fill. Control
//! traffic (`PONG` replies and the server close) is signalled on the session
//! itself so it reaches the writer regardless of queue depth.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use roster_core::SessionId;
use tokio::sync::Notify;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use crate::errors::SessionError;

/// WebSocket close code for a normal closure.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Lifecycle state. Only ever moves from `Open` to `Closed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Admitted and connected.
    Open,
    /// Disconnected, failed, or closed by the server.
    Closed,
}

/// An authenticated WebSocket connection.
pub struct Session {
    id: SessionId,
    principal: String,
    tx: mpsc::Sender<Arc<String>>,
    open: AtomicBool,
    /// Fired once, on the first transition to `Closed`.
    closing: CancellationToken,
    close_code: AtomicU16,
    pending_pongs: AtomicU32,
    pong_ready: Notify,
    connected_at: Instant,
    dropped_frames: AtomicU64,
}

impl Session {
    /// Create an open session for `principal` writing text frames into `tx`.
    pub fn new(principal: impl Into<String>, tx: mpsc::Sender<Arc<String>>) -> Self {
        Self {
            id: SessionId::new(),
            principal: principal.into(),
            tx,
            open: AtomicBool::new(true),
            closing: CancellationToken::new(),
            close_code: AtomicU16::new(NORMAL_CLOSURE),
            pending_pongs: AtomicU32::new(0),
            pong_ready: Notify::new(),
            connected_at: Instant::now(),
            dropped_frames: AtomicU64::new(0),
        }
    }

    /// Session id.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Authenticated principal name.
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Current state. A session whose writer has gone away reads as closed.
    pub fn state(&self) -> SessionState {
        if self.open.load(Ordering::Acquire) && !self.tx.is_closed() {
            SessionState::Open
        } else {
            SessionState::Closed
        }
    }

    /// Shorthand for `state() == SessionState::Open`.
    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Transition to `Closed` and wake anything waiting in [`closed`](Self::closed).
    /// Idempotent.
    pub fn mark_closed(&self) {
        self.open.store(false, Ordering::Release);
        self.closing.cancel();
    }

    /// Resolves once the session has been closed, by either side.
    pub async fn closed(&self) {
        self.closing.cancelled().await;
    }

    /// Queue a text frame without waiting.
    ///
    /// A full queue counts a dropped frame and leaves the session open. A
    /// closed writer marks the session closed.
    pub fn send(&self, text: Arc<String>) -> Result<(), SessionError> {
        if !self.is_open() {
            return Err(SessionError::Closed);
        }
        match self.tx.try_send(text) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                let _ = self.dropped_frames.fetch_add(1, Ordering::Relaxed);
                Err(SessionError::QueueFull)
            }
            Err(TrySendError::Closed(_)) => {
                self.mark_closed();
                Err(SessionError::Closed)
            }
        }
    }

    /// Ask the writer for one more `PONG`.
    ///
    /// Pongs are counted, not queued, so a backlogged text queue never drops
    /// them and a flood of pings costs no memory.
    pub fn queue_pong(&self) -> Result<(), SessionError> {
        if !self.is_open() {
            return Err(SessionError::Closed);
        }
        let _ = self.pending_pongs.fetch_add(1, Ordering::AcqRel);
        self.pong_ready.notify_one();
        Ok(())
    }

    /// Resolves when [`queue_pong`](Self::queue_pong) has been called since
    /// the last wake-up.
    pub async fn pong_requested(&self) {
        self.pong_ready.notified().await;
    }

    /// Take every pending pong, leaving none.
    pub fn take_pongs(&self) -> u32 {
        self.pending_pongs.swap(0, Ordering::AcqRel)
    }

    /// Close the session with `code` and signal the writer to send the close
    /// frame.
    ///
    /// Returns `false` when the session was already closed, in which case the
    /// first close code stands. Never waits for the peer or for queue space.
    pub fn close(&self, code: u16) -> bool {
        let was_open = self.open.swap(false, Ordering::AcqRel) && !self.tx.is_closed();
        if was_open {
            self.close_code.store(code, Ordering::Release);
        }
        self.closing.cancel();
        was_open
    }

    /// Close code the writer sends once [`closed`](Self::closed) resolves.
    pub fn close_code(&self) -> u16 {
        self.close_code.load(Ordering::Acquire)
    }

    /// Frames dropped because the queue was full.
    pub fn drop_count(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    /// Time since admission.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("principal", &self.principal)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
