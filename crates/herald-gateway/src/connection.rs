use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use herald_auth::TokenKeys;
use herald_types::events::ClientCommand;

use crate::registry::{ChannelHandle, ConnectionRegistry};

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Drive one gateway connection until either side goes away.
///
/// The connection starts anonymous. It is bound in the registry only once it
/// sends a valid `authenticate` command, and unbound by its own id on exit.
pub async fn handle_connection(socket: WebSocket, registry: ConnectionRegistry, keys: TokenKeys) {
    let (mut sender, mut receiver) = socket.split();
    let (handle, mut events_rx) = ChannelHandle::open();
    let conn_id = handle.conn_id();

    debug!("Gateway connection {} opened", conn_id);

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Forward queued events -> client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                event = events_rx.recv() => {
                    let Some(event) = event else { break };
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("Failed to encode gateway event: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("Heartbeat timeout on {} (missed {} pongs), dropping connection", conn_id, missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(Vec::<u8>::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read commands from client
    let recv_registry = registry.clone();
    let mut recv_task = tokio::spawn(async move {
        let mut bound = false;
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientCommand>(&text) {
                    Ok(cmd) => {
                        bound |= handle_command(&recv_registry, &keys, &handle, cmd).await;
                    }
                    Err(_) if is_tokenless_authenticate(&text) => {
                        warn!(
                            "{} sent authenticate without a token; send {{\"userId\", \"token\"}} with the token from /users/login",
                            conn_id
                        );
                    }
                    Err(e) => {
                        warn!(
                            "{} bad command: {} -- raw: {}",
                            conn_id,
                            e,
                            text.chars().take(200).collect::<String>()
                        );
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
        debug!("{} reader finished (ever bound: {})", conn_id, bound);
    });

    // Wait for either task to finish, then for the other to stop. The reader
    // can be between token verification and `bind` when aborted, so it must be
    // gone before `unbind` or it could bind a closed handle afterwards.
    tokio::select! {
        _ = &mut send_task => cancel(recv_task).await,
        _ = &mut recv_task => cancel(send_task).await,
    }

    match registry.unbind(&conn_id).await {
        Some(user_id) => info!("User {} disconnected from gateway ({})", user_id, conn_id),
        None => debug!("Anonymous gateway connection {} closed", conn_id),
    }
}

/// Abort `task` and wait until it has actually stopped running.
async fn cancel(task: JoinHandle<()>) {
    task.abort();
    let _ = task.await;
}

/// An `authenticate` frame that carries a `userId` but no `token`.
fn is_tokenless_authenticate(text: &str) -> bool {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        return false;
    };
    value["type"] == "authenticate" && value["data"].get("token").is_none()
}

/// Apply one client command. Returns whether this command bound the connection.
async fn handle_command(
    registry: &ConnectionRegistry,
    keys: &TokenKeys,
    handle: &ChannelHandle,
    cmd: ClientCommand,
) -> bool {
    match cmd {
        ClientCommand::Authenticate { user_id, token } => {
            let claims = match keys.verify(&token) {
                Ok(claims) => claims,
                Err(e) => {
                    warn!("{} failed to authenticate as {}: {}", handle.conn_id(), user_id, e);
                    return false;
                }
            };

            if claims.sub != user_id {
                warn!(
                    "{} tried to authenticate as {} with a token for {}",
                    handle.conn_id(),
                    user_id,
                    claims.sub
                );
                return false;
            }

            registry.bind(user_id, handle.clone()).await;
            info!("{} ({}) authenticated on {}", claims.username, user_id, handle.conn_id());
            true
        }
    }
}
