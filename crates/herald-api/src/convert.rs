//! Row -> wire conversions.

use chrono::{DateTime, Utc};
use tracing::warn;

use herald_db::models::{InboxRow, NotificationRow, UserRow, parse_timestamp};
use herald_types::models::{InboxNotification, Notification, User};

fn timestamp(raw: &str, what: &str, id: i64) -> DateTime<Utc> {
    parse_timestamp(raw).unwrap_or_else(|| {
        warn!("Corrupt created_at '{}' on {} {}", raw, what, id);
        DateTime::default()
    })
}

pub(crate) fn user(row: UserRow) -> User {
    User {
        created_at: timestamp(&row.created_at, "user", row.id),
        id: row.id,
        username: row.username,
    }
}

pub(crate) fn notification(row: NotificationRow) -> Notification {
    Notification {
        created_at: timestamp(&row.created_at, "notification", row.id),
        id: row.id,
        sender_id: row.sender_id,
        receiver_id: row.receiver_id,
        message: row.message,
        is_read: row.is_read,
    }
}

pub(crate) fn inbox(row: InboxRow) -> InboxNotification {
    InboxNotification {
        created_at: timestamp(&row.created_at, "notification", row.id),
        id: row.id,
        message: row.message,
        is_read: row.is_read,
        sender_id: row.sender_id,
        sender_username: row.sender_username,
    }
}
