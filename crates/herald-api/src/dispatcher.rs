use std::sync::Arc;

use tracing::{debug, info, warn};

use herald_db::Database;
use herald_gateway::ConnectionRegistry;
use herald_types::api::{ListNotificationsQuery, SendNotificationRequest};
use herald_types::events::{NotificationPush, ServerEvent};
use herald_types::models::{InboxNotification, Notification};
use herald_types::{MAX_MESSAGE_CHARS, NotificationId, UserId};

use crate::blocking;
use crate::convert;
use crate::error::{ApiError, Result};

/// A send request that passed input validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingNotification {
    sender_id: UserId,
    receiver_id: UserId,
    message: String,
}

impl OutgoingNotification {
    pub fn new(sender_id: UserId, receiver_id: UserId, message: String) -> Result<Self> {
        if sender_id <= 0 || receiver_id <= 0 || message.is_empty() {
            return Err(ApiError::validation(
                "Sender ID, receiver ID, and message are required",
            ));
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ApiError::validation(format!(
                "Message must be at most {} characters",
                MAX_MESSAGE_CHARS
            )));
        }
        Ok(Self {
            sender_id,
            receiver_id,
            message,
        })
    }

    pub fn sender_id(&self) -> UserId {
        self.sender_id
    }

    pub fn receiver_id(&self) -> UserId {
        self.receiver_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl TryFrom<SendNotificationRequest> for OutgoingNotification {
    type Error = ApiError;

    fn try_from(req: SendNotificationRequest) -> Result<Self> {
        match (req.sender_id, req.receiver_id, req.message) {
            (Some(sender_id), Some(receiver_id), Some(message)) => {
                Self::new(sender_id, receiver_id, message)
            }
            _ => Err(ApiError::validation(
                "Sender ID, receiver ID, and message are required",
            )),
        }
    }
}

/// One page window over a receiver's inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub const DEFAULT_PAGE: i64 = 1;
    pub const DEFAULT_LIMIT: i64 = 10;

    /// Absent or non-positive values fall back to the defaults.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(Self::DEFAULT_PAGE),
            limit: limit.filter(|l| *l > 0).unwrap_or(Self::DEFAULT_LIMIT),
        }
    }

    pub fn from_query(query: &ListNotificationsQuery) -> Self {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
        Self::new(parse(&query.page), parse(&query.limit))
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Stores notifications and hands them to the receiver's live connection when
/// there is one. The stored row is the source of truth; live delivery is a
/// courtesy that may silently miss.
#[derive(Clone)]
pub struct NotificationDispatcher {
    db: Arc<Database>,
    registry: ConnectionRegistry,
}

impl NotificationDispatcher {
    pub fn new(db: Arc<Database>, registry: ConnectionRegistry) -> Self {
        Self { db, registry }
    }

    /// Persist `outgoing`, then try to push it to the receiver.
    ///
    /// Succeeds as soon as the row is written, whatever happens to the push.
    pub async fn send(&self, outgoing: OutgoingNotification) -> Result<Notification> {
        let db = self.db.clone();
        let OutgoingNotification {
            sender_id,
            receiver_id,
            message,
        } = outgoing;

        let (sender_username, row) = blocking(move || {
            let sender = db
                .get_user_by_id(sender_id)?
                .ok_or_else(|| ApiError::not_found("Sender not found"))?;
            if db.get_user_by_id(receiver_id)?.is_none() {
                return Err(ApiError::not_found("Receiver not found"));
            }

            let row = db.insert_notification(sender_id, receiver_id, &message)?;
            Ok((sender.username, row))
        })
        .await?;

        let notification = convert::notification(row);
        let pushed = self.deliver(&notification, sender_username).await;
        debug!(
            "Notification {} for user {} stored (pushed live: {})",
            notification.id, notification.receiver_id, pushed
        );

        Ok(notification)
    }

    /// Best-effort push to the receiver's bound connection. Returns whether the
    /// event was queued.
    async fn deliver(&self, notification: &Notification, sender_username: String) -> bool {
        let receiver_id = notification.receiver_id;

        let Some(channel) = self.registry.lookup(receiver_id).await else {
            info!(
                "User {} is not connected, notification {} stored only",
                receiver_id, notification.id
            );
            return false;
        };

        let event = ServerEvent::NewNotification(NotificationPush {
            id: notification.id,
            sender_id: notification.sender_id,
            sender_username,
            message: notification.message.clone(),
            created_at: notification.created_at,
        });

        match channel.push(event) {
            Ok(()) => {
                debug!(
                    "Pushed notification {} to user {} on {}",
                    notification.id,
                    receiver_id,
                    channel.conn_id()
                );
                true
            }
            Err(e) => {
                warn!("Live delivery of notification {} failed: {}", notification.id, e);
                false
            }
        }
    }

    /// A page of `user_id`'s inbox, newest first.
    ///
    /// `has_more` is true whenever the page came back full. It does not count
    /// what remains, so a final page that is exactly full still reports true
    /// and the next request returns an empty page.
    pub async fn list(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<(Vec<InboxNotification>, bool)> {
        let db = self.db.clone();
        let rows = blocking(move || {
            Ok(db.list_notifications_for(user_id, pagination.limit, pagination.offset())?)
        })
        .await?;

        debug!("Found {} notifications for user {}", rows.len(), user_id);

        let has_more = rows.len() as i64 == pagination.limit;
        Ok((rows.into_iter().map(convert::inbox).collect(), has_more))
    }

    /// Mark one notification read on behalf of its receiver. Repeating it is harmless.
    pub async fn mark_read(&self, notification_id: NotificationId, user_id: UserId) -> Result<()> {
        let db = self.db.clone();
        blocking(move || {
            let row = db
                .get_notification(notification_id)?
                .ok_or_else(|| ApiError::not_found("Notification not found"))?;
            if row.receiver_id != user_id {
                return Err(ApiError::forbidden("Unauthorized access to this notification"));
            }

            db.mark_notification_read(notification_id)?;
            Ok(())
        })
        .await
    }

    /// Mark every notification addressed to `user_id` read. Returns how many changed.
    pub async fn mark_all_read(&self, user_id: UserId) -> Result<usize> {
        let db = self.db.clone();
        blocking(move || Ok(db.mark_all_notifications_read(user_id)?)).await
    }

    pub async fn unread_count(&self, user_id: UserId) -> Result<u64> {
        let db = self.db.clone();
        blocking(move || Ok(db.count_unread_notifications(user_id)?)).await
    }
}
