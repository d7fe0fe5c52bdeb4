pub mod dispatcher;
pub mod error;
pub mod notifications;
pub mod routes;
pub mod session;
pub mod state;
pub mod users;

mod convert;

pub use dispatcher::{NotificationDispatcher, OutgoingNotification, Pagination};
pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, AppStateInner};

/// Run blocking store work off the async runtime.
///
/// The closure runs to completion even if the awaiting request is dropped,
/// so a write that has started is never abandoned halfway.
pub(crate) async fn blocking<F, T>(f: F) -> error::Result<T>
where
    F: FnOnce() -> error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))?
}
