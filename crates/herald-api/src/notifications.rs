use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use herald_types::NotificationId;
use herald_types::api::{
    Claims, ListNotificationsQuery, ListNotificationsResponse, MessageResponse, PaginationInfo,
    SendNotificationRequest, SendNotificationResponse, UnreadCountResponse,
};

use crate::dispatcher::{OutgoingNotification, Pagination};
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// POST /notifications/send
///
/// `senderId` must name the caller; nobody sends on someone else's behalf.
/// A mismatch is refused with 403 Forbidden, on top of the 400 / 401 / 404
/// failures the other checks produce.
pub async fn send_notification(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: std::result::Result<Json<SendNotificationRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(req) = payload?;
    let outgoing = OutgoingNotification::try_from(req)?;

    if outgoing.sender_id() != claims.sub {
        return Err(ApiError::forbidden(
            "Cannot send notifications on behalf of another user",
        ));
    }

    let notification = state.dispatcher.send(outgoing).await?;

    Ok((
        StatusCode::CREATED,
        Json(SendNotificationResponse {
            message: "Notification sent successfully".into(),
            notification,
        }),
    ))
}

/// GET /notifications?page&limit
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<impl IntoResponse> {
    let pagination = Pagination::from_query(&query);
    debug!(
        "Listing notifications for {} (page {}, limit {})",
        claims.sub, pagination.page, pagination.limit
    );

    let (notifications, has_more) = state.dispatcher.list(claims.sub, pagination).await?;

    Ok(Json(ListNotificationsResponse {
        notifications,
        pagination: PaginationInfo {
            page: pagination.page,
            limit: pagination.limit,
            has_more,
        },
    }))
}

/// PUT /notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    // A non-numeric id can't name a stored notification
    let id: NotificationId = id
        .parse()
        .map_err(|_| ApiError::not_found("Notification not found"))?;

    state.dispatcher.mark_read(id, claims.sub).await?;

    Ok(Json(MessageResponse::new("Notification marked as read")))
}

/// PUT /notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let changed = state.dispatcher.mark_all_read(claims.sub).await?;
    debug!("Marked {} notifications read for {}", changed, claims.sub);

    Ok(Json(MessageResponse::new("All notifications marked as read")))
}

/// GET /notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let unread_count = state.dispatcher.unread_count(claims.sub).await?;
    Ok(Json(UnreadCountResponse { unread_count }))
}
