//! Drives the session over real WebSocket connections against a local
//! Ynison lookalike serving both the redirector and the state service.

mod common;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use http::header::{HeaderValue, SEC_WEBSOCKET_PROTOCOL};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::{
        handshake::server::{ErrorResponse, Request, Response},
        Message,
    },
};
use url::Url;

use common::{snapshot, token, MockCatalog, REDIRECTOR_PATH, STATE_PATH};
use ynison_proxy::{config::Config, error::ErrorKind, websocket::Tungstenite, ynison};

/// Subprotocol the server answers the handshake with, if any.
#[derive(Clone, Copy)]
enum Accept {
    Bearer,
    Nothing,
}

/// Starts a server answering the redirector with `redirector_reply`, or
/// with a redirect to itself when `None`.
async fn start(accept: Accept, redirector_reply: Option<Value>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let redirector_reply = redirector_reply
        .unwrap_or_else(|| json!({"host": addr.to_string(), "redirect_ticket": "T1"}))
        .to_string();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(handle(stream, accept, redirector_reply.clone()));
        }
    });

    addr
}

async fn handle(stream: TcpStream, accept: Accept, redirector_reply: String) {
    let mut path = String::new();
    let callback = |request: &Request, mut response: Response| {
        path = request.uri().path().to_owned();
        if let Accept::Bearer = accept {
            response
                .headers_mut()
                .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static("Bearer"));
        }
        Ok::<_, ErrorResponse>(response)
    };

    // The client gives up on handshakes it does not accept.
    let Ok(mut ws) = accept_hdr_async(stream, callback).await else {
        return;
    };

    if path == STATE_PATH {
        let Some(Ok(Message::Text(announcement))) = ws.next().await else {
            return;
        };
        let announcement: Value = serde_json::from_str(announcement.as_str()).unwrap();
        assert_eq!(announcement["update_full_state"]["device"]["is_shadow"], true);

        let _ = ws.send(Message::text(snapshot(0, &["42"], false))).await;
    } else {
        assert_eq!(path, REDIRECTOR_PATH);
        let _ = ws.send(Message::text(redirector_reply)).await;
    }

    // Wait for the client to close.
    while let Some(Ok(_)) = ws.next().await {}
}

fn client(addr: SocketAddr) -> ynison::Client {
    let redirector_url = Url::parse(&format!("ws://{addr}{REDIRECTOR_PATH}")).unwrap();
    let mut config = Config::new(redirector_url, Url::parse("http://catalog.test/").unwrap());
    config.timeout = Duration::from_secs(5);
    ynison::Client::new(&config, Arc::new(Tungstenite)).unwrap()
}

fn rejection() -> Value {
    json!({
        "error": {
            "grpc_code": 16,
            "http_code": 401,
            "http_status": "Unauthorized",
            "message": "Invalid token",
            "details": {},
        }
    })
}

#[tokio::test]
async fn resolves_current_track_over_websockets() {
    let addr = start(Accept::Bearer, None).await;
    let catalog = MockCatalog::new().track("42", json!({"title": "X"}));

    let result = client(addr)
        .current_track(&catalog, &token())
        .await
        .unwrap();

    assert!(!result.paused);
    assert_eq!(result.duration_ms, 215_000);
    assert_eq!(result.track, Some(json!({"title": "X"})));
    assert_eq!(catalog.lookups(), vec!["42"]);
}

#[tokio::test]
async fn in_band_token_rejection_is_unauthenticated() {
    let addr = start(Accept::Bearer, Some(rejection())).await;

    let err = client(addr)
        .current_track(&MockCatalog::new(), &token())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Unauthenticated);
}

#[tokio::test]
async fn unaccepted_subprotocol_is_internal() {
    let addr = start(Accept::Nothing, Some(rejection())).await;

    let err = client(addr)
        .current_track(&MockCatalog::new(), &token())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Internal);
    assert!(err.to_string().contains("subprotocol"), "{err}");
}
