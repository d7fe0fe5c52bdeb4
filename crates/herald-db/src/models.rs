//! Database row types. These map directly to SQLite rows and stay
//! independent of the wire types in herald-types.

use chrono::{DateTime, NaiveDateTime, Utc};

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct NotificationRow {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
}

/// A notification joined with its sender's username.
pub struct InboxRow {
    pub id: i64,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
    pub sender_id: i64,
    pub sender_username: String,
}

/// Parse a stored `created_at`. Rows written by the schema default are RFC 3339;
/// plain `datetime('now')` values ("YYYY-MM-DD HH:MM:SS") are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(|ndt| ndt.and_utc())
        })
}
