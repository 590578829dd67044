use actix_ws::{Message, MessageStream, Session};
use futures::StreamExt;
use tokio::sync::broadcast::error::RecvError;

use super::{EventPublisher, RelayHub};
use crate::api::metrics;
use crate::middleware::auth::Claims;
use crate::models::{ClientMessage, EdgeRequest, RelayEvent};
use crate::services::FollowService;

/// Handles one inbound frame. The returned event, if any, goes back to the
/// sending connection only.
pub(crate) async fn handle_frame(
    frame: &str,
    viewer: Option<&Claims>,
    follows: &FollowService,
    publisher: &dyn EventPublisher,
) -> Option<RelayEvent> {
    let message = match ClientMessage::from_frame(frame) {
        Ok(message) => message,
        Err(e) => {
            log::warn!("⚠️  Unrecognized relay frame: {}", e);
            return Some(RelayEvent::error("Unrecognized relay message"));
        }
    };

    match message {
        ClientMessage::CommentAdded(comment) => {
            publisher.publish(RelayEvent::CommentAdded(comment));
            None
        }
        ClientMessage::FollowUser(request) => {
            let actor = match authorize(viewer, &request) {
                Ok(actor) => actor,
                Err(notice) => return Some(notice),
            };
            // Sucesso já é anunciado pelo serviço
            follows
                .follow(actor, &request.followed_id)
                .await
                .err()
                .map(|e| RelayEvent::error(e.message()))
        }
        ClientMessage::UnfollowUser(request) => {
            let actor = match authorize(viewer, &request) {
                Ok(actor) => actor,
                Err(notice) => return Some(notice),
            };
            follows
                .unfollow(actor, &request.followed_id)
                .await
                .err()
                .map(|e| RelayEvent::error(e.message()))
        }
    }
}

fn authorize<'a>(viewer: Option<&'a Claims>, request: &EdgeRequest) -> Result<&'a str, RelayEvent> {
    let now = chrono::Utc::now().timestamp().max(0) as usize;
    match viewer {
        None => Err(RelayEvent::error("Authentication required.")),
        // Token validado no upgrade; a conexão pode durar mais que ele
        Some(claims) if claims.exp <= now => {
            log::info!("⏰ Relay trigger on expired session of {}", claims.sub);
            Err(RelayEvent::error("Session expired. Please log in again."))
        }
        Some(claims) if claims.sub != request.follower_id => {
            log::warn!(
                "🚫 Relay trigger for {} rejected on connection of {}",
                request.follower_id,
                claims.sub
            );
            Err(RelayEvent::error("You can only act on your own behalf."))
        }
        Some(claims) => Ok(claims.sub.as_str()),
    }
}

/// Drives one WebSocket connection until either side closes it.
pub async fn run(
    mut session: Session,
    mut stream: MessageStream,
    hub: RelayHub,
    follows: actix_web::web::Data<FollowService>,
    viewer: Option<Claims>,
) {
    let connection_id = uuid::Uuid::new_v4();
    let mut events = hub.subscribe();
    metrics::connection_opened();
    log::info!(
        "🔌 Relay connection {} opened ({})",
        connection_id,
        viewer.as_ref().map(|c| c.sub.as_str()).unwrap_or("anonymous")
    );

    let reason = loop {
        tokio::select! {
            inbound = stream.next() => {
                let message = match inbound {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        log::warn!("⚠️  Relay connection {} protocol error: {}", connection_id, e);
                        break None;
                    }
                    None => break None,
                };

                match message {
                    Message::Text(text) => {
                        if let Some(reply) = handle_frame(&text, viewer.as_ref(), &follows, &hub).await {
                            if send(&mut session, &reply).await.is_err() {
                                break None;
                            }
                        }
                    }
                    Message::Ping(bytes) => {
                        if session.pong(&bytes).await.is_err() {
                            break None;
                        }
                    }
                    Message::Close(reason) => break reason,
                    _ => {}
                }
            }
            outbound = events.recv() => {
                match outbound {
                    Ok(event) => {
                        if send(&mut session, &event).await.is_err() {
                            break None;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("⚠️  Relay connection {} lagged, {} event(s) skipped", connection_id, skipped);
                    }
                    Err(RecvError::Closed) => break None,
                }
            }
        }
    };

    let _ = session.close(reason).await;
    metrics::connection_closed();
    log::info!("🔌 Relay connection {} closed", connection_id);
}

async fn send(session: &mut Session, event: &RelayEvent) -> Result<(), ()> {
    let frame = event.to_frame().map_err(|e| {
        log::error!("❌ Could not encode relay event: {}", e);
    })?;
    session.text(frame).await.map_err(|_| ())
}
