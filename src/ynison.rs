//! Ynison session client.
//!
//! Reads the playback state of an account's active device by joining its
//! Ynison session as a *shadow* device: a participant that observes but
//! never plays. Every call runs the full handshake from scratch:
//!
//! ```text
//! Init ──redirect──> Redirected ──publish──> StatePublished ──project──> Projected
//! ```
//!
//! * **Init**: a fresh device identity and its protocol header
//! * **Redirected**: the session host and the header extended with the
//!   redirect ticket
//! * **StatePublished**: the snapshot broadcast back after announcing the
//!   shadow device
//! * **Projected**: the current queue entry, if any
//!
//! Each stage consumes the previous one, so the stages can only run in
//! this order. Nothing is shared between calls: no sessions, no caching,
//! no retries.
//!
//! # Sockets
//!
//! Both sockets are used for a single exchange and closed before the
//! stage returns, whatever its outcome. Connecting, sending and waiting
//! for the reply are each bounded by the configured timeout. When the
//! caller drops the future mid-exchange, the socket is dropped and with it
//! the underlying connection.

use std::{sync::Arc, time::Duration};

use http::header::{HeaderValue, AUTHORIZATION, ORIGIN, SEC_WEBSOCKET_PROTOCOL};
use serde::Serialize;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{client::IntoClientRequest, handshake::client::Request};
use url::Url;

use crate::{
    catalog::Catalog,
    config::Config,
    error::{Error, Result},
    protocol::{
        catalog::Track,
        ynison::{
            self, DeviceIdentity, PlayerStateSnapshot, ProtocolHeader, PutYnisonState, Redirect,
            Status,
        },
    },
    token::Token,
    websocket::{Socket, Transport},
};

/// What the active device is doing right now.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackResult {
    pub paused: bool,
    pub duration_ms: i64,
    pub progress_ms: i64,
    pub entity_id: String,
    pub entity_type: String,

    /// Catalog metadata of the current track, or `None` if nothing is
    /// queued at the current position.
    pub track: Option<Track>,
}

/// Client for the Ynison redirector and state service.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    redirector_url: Url,
    origin: HeaderValue,
    timeout: Duration,
}

/// A freshly generated device, not yet known to any Ynison service.
#[derive(Debug)]
struct Init {
    identity: DeviceIdentity,
    header: ProtocolHeader,
}

/// The device has been routed to the host serving the account's session.
#[derive(Debug)]
struct Redirected {
    identity: DeviceIdentity,
    header: ProtocolHeader,
    state_url: Url,
}

/// The shadow device has been announced and the session state received.
#[derive(Debug)]
struct StatePublished {
    snapshot: PlayerStateSnapshot,
}

/// The snapshot reduced to what the caller is interested in.
#[derive(Debug)]
struct Projected {
    status: Status,
    entity_id: String,
    entity_type: String,
    track_id: Option<String>,
}

impl Init {
    fn new() -> Self {
        let identity = DeviceIdentity::generate();
        let header = ProtocolHeader::new(&identity);
        Self { identity, header }
    }
}

impl StatePublished {
    fn project(self) -> Projected {
        let state = self.snapshot.player_state;
        let queue = state.player_queue;
        let track_id = queue.current().map(|playable| playable.playable_id.clone());

        Projected {
            status: state.status,
            entity_id: queue.entity_id,
            entity_type: queue.entity_type,
            track_id,
        }
    }
}

impl Client {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the configured origin is not a valid
    /// header value.
    pub fn new(config: &Config, transport: Arc<dyn Transport>) -> Result<Self> {
        Ok(Self {
            transport,
            redirector_url: config.redirector_url.clone(),
            origin: HeaderValue::from_str(&config.origin)?,
            timeout: config.timeout,
        })
    }

    /// Returns the current track of the account's active device.
    ///
    /// An empty queue or a current index outside of the queue is not an
    /// error: the result then carries no track.
    ///
    /// # Errors
    ///
    /// * `Unauthenticated` - the token was rejected
    /// * `Unavailable` - a service could not be reached or hung up
    /// * `Internal` - a service replied with something unexpected
    /// * `DeadlineExceeded` - a service did not reply in time
    /// * any kind returned by the catalog for the current track
    pub async fn current_track(&self, catalog: &dyn Catalog, token: &Token) -> Result<TrackResult> {
        let init = Init::new();
        debug!("device {}: resolving session host", init.identity.device_id);

        let redirected = self.redirect(init, token).await?;
        debug!(
            "device {}: redirected to {}",
            redirected.identity.device_id, redirected.state_url
        );

        let published = self.publish(redirected, token).await?;
        let projected = published.project();
        debug!(
            "projected current track: {}",
            projected.track_id.as_deref().unwrap_or("none")
        );

        self.resolve(projected, catalog, token).await
    }

    async fn redirect(&self, init: Init, token: &Token) -> Result<Redirected> {
        let request = self.request(self.redirector_url.as_str(), &init.header, token)?;
        let reply = self.exchange(request, None).await?;

        let redirect: Redirect = ynison::decode(&reply, "redirector")?;
        let state_url = redirect
            .state_url(self.redirector_url.scheme())
            .inspect_err(|e| {
                error!("redirector: {e}");
                error!("redirector: {reply}");
            })?;

        Ok(Redirected {
            header: init.header.with_redirect_ticket(&redirect.redirect_ticket),
            identity: init.identity,
            state_url,
        })
    }

    async fn publish(&self, redirected: Redirected, token: &Token) -> Result<StatePublished> {
        let announcement = PutYnisonState::shadow(&redirected.identity);
        let message = serde_json::to_string(&announcement)?;

        let request = self.request(redirected.state_url.as_str(), &redirected.header, token)?;
        let reply = self.exchange(request, Some(message)).await?;

        let snapshot = ynison::decode(&reply, "state service")?;
        debug!("device {}: received player state", redirected.identity.device_id);

        Ok(StatePublished { snapshot })
    }

    async fn resolve(
        &self,
        projected: Projected,
        catalog: &dyn Catalog,
        token: &Token,
    ) -> Result<TrackResult> {
        let track = match projected.track_id {
            Some(id) => {
                let track = catalog.lookup_track(token, &id).await.map_err(|e| {
                    Error::new(e.kind, format!("metadata unavailable for track {id}: {e}"))
                })?;
                Some(track)
            }
            None => None,
        };

        Ok(TrackResult {
            paused: projected.status.paused,
            duration_ms: projected.status.duration_ms,
            progress_ms: projected.status.progress_ms,
            entity_id: projected.entity_id,
            entity_type: projected.entity_type,
            track,
        })
    }

    /// Builds the WebSocket handshake request for `url`.
    fn request(&self, url: &str, header: &ProtocolHeader, token: &Token) -> Result<Request> {
        let mut request = url.into_client_request()?;
        let headers = request.headers_mut();
        headers.insert(
            SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_str(&header.to_subprotocol()?)?,
        );
        headers.insert(ORIGIN, self.origin.clone());
        headers.insert(AUTHORIZATION, token.authorization()?);
        Ok(request)
    }

    /// Connects, optionally sends `message`, and returns the first reply.
    ///
    /// The socket is closed before returning, on success and on failure.
    async fn exchange(&self, request: Request, message: Option<String>) -> Result<String> {
        let uri = request.uri().to_string();

        let mut socket = timeout(self.timeout, self.transport.connect(request))
            .await
            .map_err(|_| Error::deadline_exceeded(format!("connecting to {uri} timed out")))??;

        let reply = self.converse(socket.as_mut(), &uri, message).await;

        if timeout(self.timeout, socket.close()).await.is_err() {
            trace!("closing {uri} timed out");
        }

        reply
    }

    async fn converse(
        &self,
        socket: &mut dyn Socket,
        uri: &str,
        message: Option<String>,
    ) -> Result<String> {
        if let Some(message) = message {
            trace!("{uri} <- {message}");
            timeout(self.timeout, socket.send(message))
                .await
                .map_err(|_| Error::deadline_exceeded(format!("sending to {uri} timed out")))??;
        }

        let reply = timeout(self.timeout, socket.receive())
            .await
            .map_err(|_| Error::deadline_exceeded(format!("no reply from {uri} in time")))??;
        trace!("{uri} -> {reply}");

        Ok(reply)
    }
}
