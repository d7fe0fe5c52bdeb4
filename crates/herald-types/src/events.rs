use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{NotificationId, UserId};

/// Events sent FROM server TO client over the WebSocket gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A notification addressed to the connected user was just stored
    NewNotification(NotificationPush),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPush {
    pub id: NotificationId,
    pub sender_id: UserId,
    pub sender_username: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Commands sent FROM client TO server over the WebSocket gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Bind this connection to `user_id`. The token must belong to that user.
    Authenticate {
        #[serde(rename = "userId")]
        user_id: UserId,
        token: String,
    },
}
