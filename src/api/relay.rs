use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use serde::Deserialize;

use crate::middleware::auth::TokenVerifier;
use crate::relay::{session, RelayHub};
use crate::services::FollowService;

#[derive(Debug, Deserialize)]
pub struct RelayQuery {
    pub token: Option<String>,
}

/// GET /ws?token=<jwt> - Conexão WebSocket do relay
///
/// Without a token the connection only listens; follow triggers need one.
pub async fn connect(
    req: HttpRequest,
    body: web::Payload,
    query: web::Query<RelayQuery>,
    hub: web::Data<RelayHub>,
    follows: web::Data<FollowService>,
    verifier: web::Data<TokenVerifier>,
) -> Result<HttpResponse, actix_web::Error> {
    let viewer = match query.token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        None => None,
        Some(token) => match verifier.verify(token) {
            Ok(claims) => Some(claims),
            Err(e) => return Ok(e.error_response()),
        },
    };

    let (response, ws_session, stream) = actix_ws::handle(&req, body)?;

    actix_web::rt::spawn(session::run(
        ws_session,
        stream,
        hub.get_ref().clone(),
        follows,
        viewer,
    ));

    Ok(response)
}

#[cfg(test)]
mod tests {
    use crate::api::routes;
    use crate::database::UserStore;
    use crate::middleware::TokenVerifier;
    use crate::models::{CommentAdded, EdgePayload, RelayEvent};
    use crate::relay::RelayHub;
    use crate::services::FollowService;
    use crate::testing::{store_with, token_for, TEST_SECRET};
    use actix_web::{web, App, HttpServer};
    use futures::{SinkExt, StreamExt};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

    type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

    async fn next_message(socket: &mut Socket) -> Message {
        tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("relay frame in time")
            .expect("socket open")
            .expect("valid frame")
    }

    async fn next_event(socket: &mut Socket) -> RelayEvent {
        loop {
            if let Message::Text(text) = next_message(socket).await {
                return RelayEvent::from_frame(&text).unwrap();
            }
        }
    }

    async fn wait_for_connections(hub: &RelayHub, expected: usize) {
        for _ in 0..100 {
            if hub.connection_count() == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("expected {} relay connections, found {}", expected, hub.connection_count());
    }

    #[actix_web::test]
    async fn connected_clients_see_follows_and_disconnect_cleanly() {
        let (store, ids) = store_with(&["alice", "bob"]).await;
        let store: Arc<dyn UserStore> = store;
        let hub = RelayHub::new(16);
        let follows = web::Data::new(FollowService::new(store.clone(), Arc::new(hub.clone())));
        let store_data: web::Data<dyn UserStore> = web::Data::from(store);
        let hub_data = web::Data::new(hub.clone());
        let verifier = web::Data::new(TokenVerifier::new(TEST_SECRET));

        let server = HttpServer::new(move || {
            App::new()
                .app_data(store_data.clone())
                .app_data(follows.clone())
                .app_data(hub_data.clone())
                .app_data(verifier.clone())
                .configure(routes)
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        let (alice, bob) = (ids[0].to_hex(), ids[1].to_hex());
        let alice_token = token_for(&alice);

        let (mut alice_socket, _) = connect_async(format!("ws://{}/ws?token={}", addr, alice_token))
            .await
            .unwrap();
        let (mut listener, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
        wait_for_connections(&hub, 2).await;

        let res = reqwest::Client::new()
            .post(format!("http://{}/follow/{}", addr, bob))
            .bearer_auth(&alice_token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 200);

        let expected = RelayEvent::Follow(EdgePayload { user_id: bob.clone(), follower_id: alice.clone() });
        for socket in [&mut listener, &mut alice_socket] {
            assert!(matches!(next_event(socket).await, RelayEvent::UpdateFollowCounts(_)));
            assert_eq!(next_event(socket).await, expected);
        }

        // Trigger sem token: o erro volta só para quem enviou
        let trigger = serde_json::json!({
            "event": "followUser",
            "data": { "followerId": alice, "followedId": bob }
        });
        listener.send(Message::Text(trigger.to_string())).await.unwrap();
        assert_eq!(next_event(&mut listener).await, RelayEvent::error("Authentication required."));

        let comment = r#"{"event":"commentAdded","data":{"postId":"p-1"}}"#;
        listener.send(Message::Text(comment.to_string())).await.unwrap();
        let comment_event = RelayEvent::CommentAdded(CommentAdded { post_id: "p-1".into() });
        assert_eq!(next_event(&mut alice_socket).await, comment_event);
        assert_eq!(next_event(&mut listener).await, comment_event);

        alice_socket.send(Message::Ping(b"hi".to_vec())).await.unwrap();
        loop {
            match next_message(&mut alice_socket).await {
                Message::Pong(payload) => {
                    assert_eq!(payload, b"hi".to_vec());
                    break;
                }
                Message::Text(text) => panic!("unexpected frame {}", text),
                _ => {}
            }
        }

        alice_socket.close(None).await.unwrap();
        wait_for_connections(&hub, 1).await;
        listener.close(None).await.unwrap();
        wait_for_connections(&hub, 0).await;

        handle.stop(false).await;
    }
}
