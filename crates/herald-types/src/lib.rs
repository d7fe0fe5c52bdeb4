pub mod api;
pub mod events;
pub mod models;

/// Store-assigned user identity.
pub type UserId = i64;

/// Store-assigned notification identity.
pub type NotificationId = i64;

/// Longest notification body accepted, in characters.
pub const MAX_MESSAGE_CHARS: usize = 255;
