//! Session registry for SSE clients
//!
//! Each `GET /sse` connection owns one session. The session is registered
//! when the stream is created and removed when the stream is dropped, which
//! is how axum signals that the client went away.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::Stream;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::mcp::McpResponse;

/// Session ID
pub type SessionId = String;

/// Frames buffered per session before further replies are dropped
pub const SESSION_QUEUE_CAPACITY: usize = 64;

/// Frame queued for delivery on a session's event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Tells the client where to POST its requests
    Endpoint(String),
    /// A serialized JSON-RPC message
    Message(String),
}

/// Handle to an open session, used to push messages to its client
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    opened_at: DateTime<Utc>,
    tx: mpsc::Sender<SessionEvent>,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Queue a JSON-RPC response for the client.
    ///
    /// Fails with `SessionFull` when the client has stopped reading and
    /// the queue is at capacity.
    pub fn send(&self, response: &McpResponse) -> Result<()> {
        let json = serde_json::to_string(response)?;
        self.tx
            .try_send(SessionEvent::Message(json))
            .map_err(|e| match e {
                TrySendError::Full(_) => Error::SessionFull(self.id.clone()),
                TrySendError::Closed(_) => Error::SessionClosed(self.id.clone()),
            })
    }

    /// Whether the client side of the stream is gone
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Registry of open sessions
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: DashMap<SessionId, Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new session whose client posts to `endpoint`.
    ///
    /// The id is generated here and is unique among open sessions. The first
    /// event on the returned stream announces `<endpoint>?sessionId=<id>`.
    pub fn open(self: &Arc<Self>, endpoint: &str) -> SessionStream {
        let (tx, receiver) = mpsc::channel(SESSION_QUEUE_CAPACITY);

        let session = loop {
            let id = Uuid::new_v4().to_string();
            if let Entry::Vacant(slot) = self.sessions.entry(id.clone()) {
                let session = Session {
                    id,
                    opened_at: Utc::now(),
                    tx,
                };
                slot.insert(session.clone());
                break session;
            }
        };

        // Fresh channel with a live receiver, so this cannot fail.
        let _ = session.tx.try_send(SessionEvent::Endpoint(format!(
            "{}?sessionId={}",
            endpoint, session.id
        )));

        tracing::info!(session_id = %session.id, open = self.len(), "Session opened");

        SessionStream {
            id: session.id,
            receiver,
            manager: Arc::clone(self),
        }
    }

    /// Look up an open session
    pub fn resolve(&self, id: &str) -> Result<Session> {
        self.sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    /// Remove a session. Returns false if it was already gone.
    pub fn close(&self, id: &str) -> bool {
        match self.sessions.remove(id) {
            Some((_, session)) => {
                let open_for = Utc::now() - session.opened_at;
                tracing::info!(
                    session_id = id,
                    duration_secs = open_for.num_seconds(),
                    "Session closed"
                );
                true
            }
            None => false,
        }
    }

    /// Remove every session, ending their streams
    pub fn close_all(&self) -> usize {
        let ids: Vec<SessionId> = self.sessions.iter().map(|e| e.key().clone()).collect();
        ids.iter().filter(|id| self.close(id)).count()
    }

    /// Number of open sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Event stream of one session.
///
/// Ends once the session is closed and its queue is drained. Dropping it
/// closes the session.
#[derive(Debug)]
pub struct SessionStream {
    id: SessionId,
    receiver: mpsc::Receiver<SessionEvent>,
    manager: Arc<SessionManager>,
}

impl SessionStream {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Stream for SessionStream {
    type Item = SessionEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for SessionStream {
    fn drop(&mut self) {
        self.manager.close(&self.id);
    }
}
