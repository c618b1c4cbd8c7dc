//! WebSocket transport.
//!
//! The Ynison client only ever needs a socket for a single exchange: send
//! at most one text frame, read one text frame back, close. [`Transport`]
//! and [`Socket`] capture exactly that, so that the protocol logic can be
//! driven by something other than a real network connection.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    tungstenite::{
        self,
        error::ProtocolError,
        handshake::client::Request,
        protocol::{frame::coding::CloseCode, CloseFrame},
        Message,
    },
    MaybeTlsStream, WebSocketStream,
};

use crate::error::{Error, ErrorKind, Result};

/// Opens WebSocket connections.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs the opening handshake for `request`.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when the server rejects the handshake with
    /// 401 or 403, `Internal` when it completes the handshake without
    /// accepting any of the offered subprotocols, and `Unavailable` for any
    /// other connection or handshake failure.
    async fn connect(&self, request: Request) -> Result<Box<dyn Socket>>;
}

/// An open WebSocket connection.
#[async_trait]
pub trait Socket: Send {
    /// Sends a text frame.
    async fn send(&mut self, text: String) -> Result<()>;

    /// Waits for the next text frame.
    ///
    /// Control frames are skipped. A close frame or the end of the stream
    /// is an error: the caller expected a message.
    async fn receive(&mut self) -> Result<String>;

    /// Closes the connection. Never fails: there is nothing left to do
    /// with a socket that cannot be closed cleanly.
    async fn close(&mut self);
}

/// Transport over real TCP/TLS connections.
#[derive(Clone, Copy, Debug, Default)]
pub struct Tungstenite;

#[async_trait]
impl Transport for Tungstenite {
    async fn connect(&self, request: Request) -> Result<Box<dyn Socket>> {
        let uri = request.uri().clone();
        trace!("connecting to {uri}");

        match tokio_tungstenite::connect_async(request).await {
            Ok((stream, response)) => {
                debug!("connected to {uri} ({})", response.status());
                Ok(Box::new(TungsteniteSocket { stream }))
            }
            Err(tungstenite::Error::Protocol(ProtocolError::SecWebSocketSubProtocolError(e))) => {
                // The service authenticates through `Sec-WebSocket-Protocol`
                // and must accept one of the offered tokens.
                error!("{uri} did not accept the offered subprotocol: {e}");
                Err(Error::internal(format!(
                    "{uri} did not accept the offered subprotocol: {e}"
                )))
            }
            Err(e) => {
                let e = Error::from(e);
                Err(match e.kind {
                    ErrorKind::Unauthenticated | ErrorKind::PermissionDenied => {
                        Error::unauthenticated(format!("{uri} rejected the handshake: {e}"))
                    }
                    _ => Error::unavailable(format!("cannot connect to {uri}: {e}")),
                })
            }
        }
    }
}

struct TungsteniteSocket {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Socket for TungsteniteSocket {
    async fn send(&mut self, text: String) -> Result<()> {
        trace!("sending message: {text}");
        self.stream.send(Message::text(text)).await?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<String> {
        while let Some(message) = self.stream.next().await {
            match message? {
                Message::Text(text) => return Ok(text.as_str().to_owned()),
                Message::Binary(bytes) => {
                    return String::from_utf8(bytes.to_vec())
                        .map_err(|e| Error::internal(format!("binary message is not UTF-8: {e}")));
                }
                Message::Close(frame) => return Err(closed(frame.as_ref())),
                // Pings are answered by tungstenite on the next read.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {
                    trace!("skipping control frame");
                }
            }
        }

        Err(Error::unavailable("connection closed without a message"))
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            trace!("error closing websocket: {e}");
        }
    }
}

/// Classifies a close frame received while waiting for a message.
///
/// Policy violations and application-defined codes (4000-4999) are how the
/// service turns away a client; anything else is an outage.
fn closed(frame: Option<&CloseFrame>) -> Error {
    match frame {
        Some(frame) => {
            let code = u16::from(frame.code);
            let reason = frame.reason.as_str();
            if frame.code == CloseCode::Policy || (4000..=4999).contains(&code) {
                Error::unauthenticated(format!("connection closed by server ({code}): {reason}"))
            } else {
                Error::unavailable(format!("connection closed by server ({code}): {reason}"))
            }
        }
        None => Error::unavailable("connection closed by server"),
    }
}
