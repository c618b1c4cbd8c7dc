//! Recording doubles for the WebSocket transport and the catalog.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use http::HeaderMap;
use serde_json::Value;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use url::Url;

use ynison_proxy::{
    catalog::Catalog,
    config::Config,
    error::{Error, ErrorKind, Result},
    protocol::{catalog::Track, ynison::ProtocolHeader},
    token::Token,
    websocket::{Socket, Transport},
    ynison,
};

pub const REDIRECTOR_URL: &str =
    "ws://redirector.test/redirector.YnisonRedirectService/GetRedirectToYnison";
pub const REDIRECTOR_PATH: &str = "/redirector.YnisonRedirectService/GetRedirectToYnison";
pub const STATE_PATH: &str = "/ynison_state.YnisonStateService/PutYnisonState";

/// How a mocked endpoint behaves.
#[derive(Clone, Debug)]
pub enum Behavior {
    /// Accept the connection and answer with this frame.
    Reply(String),
    /// Fail the handshake.
    Refuse(ErrorKind),
    /// Accept the connection and never answer.
    Silent,
    /// Accept the connection and close it instead of answering.
    Close(ErrorKind),
}

#[derive(Clone, Debug)]
pub struct Connect {
    pub uri: String,
    pub path: String,
    pub headers: HeaderMap,
}

impl Connect {
    /// The JSON object carried in `Sec-WebSocket-Protocol`.
    pub fn protocol_header(&self) -> ProtocolHeader {
        let value = self.headers["sec-websocket-protocol"].to_str().unwrap();
        let json = value.strip_prefix("Bearer, v2, ").unwrap();
        serde_json::from_str(json).unwrap()
    }

    pub fn protocol_fields(&self) -> serde_json::Map<String, Value> {
        let value = self.headers["sec-websocket-protocol"].to_str().unwrap();
        let json = value.strip_prefix("Bearer, v2, ").unwrap();
        serde_json::from_str(json).unwrap()
    }
}

#[derive(Debug, Default)]
pub struct Recording {
    pub connects: Vec<Connect>,
    /// `(path, message)` of every frame sent.
    pub sent: Vec<(String, String)>,
    /// Path of every frame received.
    pub received: Vec<String>,
    /// Path of every socket closed.
    pub closed: Vec<String>,
}

impl Recording {
    pub fn connects_to(&self, path: &str) -> usize {
        self.connects.iter().filter(|c| c.path == path).count()
    }

    pub fn sent_to(&self, path: &str) -> Vec<&str> {
        self.sent
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, message)| message.as_str())
            .collect()
    }

    pub fn received_from(&self, path: &str) -> usize {
        self.received.iter().filter(|p| *p == path).count()
    }

    pub fn closes_of(&self, path: &str) -> usize {
        self.closed.iter().filter(|p| *p == path).count()
    }
}

/// Transport answering per URL path.
#[derive(Clone, Default)]
pub struct MockTransport {
    routes: HashMap<String, Behavior>,
    pub recording: Arc<Mutex<Recording>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, path: &str, behavior: Behavior) -> Self {
        self.routes.insert(path.to_owned(), behavior);
        self
    }

    pub fn recording(&self) -> std::sync::MutexGuard<'_, Recording> {
        self.recording.lock().unwrap()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, request: Request) -> Result<Box<dyn Socket>> {
        let path = request.uri().path().to_owned();
        self.recording.lock().unwrap().connects.push(Connect {
            uri: request.uri().to_string(),
            path: path.clone(),
            headers: request.headers().clone(),
        });

        let behavior = self
            .routes
            .get(&path)
            .cloned()
            .unwrap_or(Behavior::Refuse(ErrorKind::Unavailable));

        if let Behavior::Refuse(kind) = behavior {
            return Err(Error::new(kind, format!("{path} refused the connection")));
        }

        Ok(Box::new(MockSocket {
            path,
            behavior,
            recording: Arc::clone(&self.recording),
        }))
    }
}

struct MockSocket {
    path: String,
    behavior: Behavior,
    recording: Arc<Mutex<Recording>>,
}

#[async_trait]
impl Socket for MockSocket {
    async fn send(&mut self, text: String) -> Result<()> {
        self.recording
            .lock()
            .unwrap()
            .sent
            .push((self.path.clone(), text));
        Ok(())
    }

    async fn receive(&mut self) -> Result<String> {
        match self.behavior.clone() {
            Behavior::Reply(frame) => {
                self.recording
                    .lock()
                    .unwrap()
                    .received
                    .push(self.path.clone());
                Ok(frame)
            }
            Behavior::Silent => std::future::pending().await,
            Behavior::Close(kind) => Err(Error::new(kind, "connection closed by server")),
            Behavior::Refuse(_) => unreachable!("refused sockets are never opened"),
        }
    }

    async fn close(&mut self) {
        self.recording
            .lock()
            .unwrap()
            .closed
            .push(self.path.clone());
    }
}

/// Catalog serving a fixed set of tracks.
#[derive(Default)]
pub struct MockCatalog {
    tracks: HashMap<String, Track>,
    pub lookups: Mutex<Vec<String>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(mut self, id: &str, track: Track) -> Self {
        self.tracks.insert(id.to_owned(), track);
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    async fn lookup_track(&self, _token: &Token, id: &str) -> Result<Track> {
        self.lookups.lock().unwrap().push(id.to_owned());
        self.tracks
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("track {id} not found")))
    }
}

pub fn config(timeout: Duration) -> Config {
    let mut config = Config::new(
        Url::parse(REDIRECTOR_URL).unwrap(),
        Url::parse("http://catalog.test/").unwrap(),
    );
    config.timeout = timeout;
    config
}

pub fn client(transport: &MockTransport) -> ynison::Client {
    ynison::Client::new(
        &config(Duration::from_secs(5)),
        Arc::new(transport.clone()),
    )
    .unwrap()
}

pub fn token() -> Token {
    Token::new("test-token").unwrap()
}

/// Redirector reply pointing at `example.ynison`.
pub fn redirect() -> String {
    serde_json::json!({
        "host": "example.ynison",
        "redirect_ticket": "T1",
        "session_id": "1",
        "keep_alive_params": {"keep_alive_time_seconds": 60},
    })
    .to_string()
}

/// Player state frame as the service sends it: 64-bit numbers as strings.
pub fn snapshot(index: i64, ids: &[&str], paused: bool) -> String {
    let playable_list: Vec<Value> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "playable_id": id,
                "album_id_optional": "1",
                "playable_type": "TRACK",
                "from": "web-album",
            })
        })
        .collect();

    serde_json::json!({
        "player_state": {
            "status": {
                "duration_ms": "215000",
                "paused": paused,
                "playback_speed": 1,
                "progress_ms": "42000",
                "version": {"device_id": "x", "version": "1", "timestamp_ms": "0"},
            },
            "player_queue": {
                "current_playable_index": index,
                "entity_id": "album:1",
                "entity_type": "ALBUM",
                "playable_list": playable_list,
                "options": {"repeat_mode": "NONE"},
            },
        },
        "devices": [],
        "active_device_id_optional": "real-device",
        "timestamp_ms": "0",
        "rid": "r",
    })
    .to_string()
}
