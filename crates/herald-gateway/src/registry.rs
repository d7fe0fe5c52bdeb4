use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use herald_types::UserId;
use herald_types::events::ServerEvent;

/// Identity of one physical gateway connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(Uuid);

impl ConnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Error)]
#[error("connection {0} is closed")]
pub struct PushError(pub ConnId);

/// Sending half of a live connection. Two handles are equal iff they belong
/// to the same connection.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    conn_id: ConnId,
    tx: mpsc::UnboundedSender<ServerEvent>,
}

impl ChannelHandle {
    /// Create a handle for a new connection plus the receiver its writer task drains.
    pub fn open() -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                conn_id: ConnId::new(),
                tx,
            },
            rx,
        )
    }

    pub fn conn_id(&self) -> ConnId {
        self.conn_id
    }

    /// Queue an event for the connection. Never blocks; fails once the
    /// connection's writer has gone away.
    pub fn push(&self, event: ServerEvent) -> Result<(), PushError> {
        self.tx.send(event).map_err(|_| PushError(self.conn_id))
    }
}

impl PartialEq for ChannelHandle {
    fn eq(&self, other: &Self) -> bool {
        self.conn_id == other.conn_id
    }
}

impl Eq for ChannelHandle {}

/// Maps each user to the one connection that last authenticated as them.
///
/// Cloning is cheap and every clone shares the same map. All operations take
/// the lock only for in-memory work; pushing happens on a cloned handle after
/// the lock is released.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    bindings: Arc<RwLock<HashMap<UserId, ChannelHandle>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `user_id` to `handle`, replacing any previous connection for that user.
    /// A connection that re-authenticates as someone else stops representing its
    /// previous user.
    pub async fn bind(&self, user_id: UserId, handle: ChannelHandle) {
        let mut bindings = self.bindings.write().await;
        bindings.retain(|uid, h| *uid == user_id || h.conn_id != handle.conn_id);
        bindings.insert(user_id, handle);
    }

    /// Drop the binding held by `conn_id`, if any. Returns the user it represented.
    /// A newer connection for the same user is left untouched.
    pub async fn unbind(&self, conn_id: &ConnId) -> Option<UserId> {
        let mut bindings = self.bindings.write().await;
        let user_id = bindings
            .iter()
            .find(|(_, h)| h.conn_id == *conn_id)
            .map(|(uid, _)| *uid)?;
        bindings.remove(&user_id);
        Some(user_id)
    }

    pub async fn lookup(&self, user_id: UserId) -> Option<ChannelHandle> {
        self.bindings.read().await.get(&user_id).cloned()
    }

    pub async fn online_count(&self) -> usize {
        self.bindings.read().await.len()
    }
}
