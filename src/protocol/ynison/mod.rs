//! Wire types of the Ynison real-time session protocol.
//!
//! Ynison is the protocol Yandex Music clients use to share playback state
//! between devices. A client talks to it over two WebSockets in sequence:
//!
//! 1. The redirector answers with a [`Redirect`]: the host that serves
//!    the account's session, plus a single-use ticket.
//! 2. The state service on that host receives a [`PutYnisonState`]
//!    announcement and broadcasts back a [`PlayerStateSnapshot`].
//!
//! Both sockets authenticate through the [`ProtocolHeader`] embedded in
//! `Sec-WebSocket-Protocol`. Every frame is a JSON text message; failures
//! are reported in-band as a [`ServiceError`] frame.
//!
//! # Submodules
//!
//! * [`device`] - Device identity and protocol header
//! * [`redirect`] - Redirector reply
//! * [`state`] - State announcement and snapshot

pub mod device;
pub mod redirect;
pub mod state;

pub use device::{DeviceId, DeviceIdentity, DeviceInfo, ProtocolHeader};
pub use redirect::Redirect;
pub use state::{PlayerQueue, PlayerStateSnapshot, PutYnisonState, Status};

use std::fmt::Debug;

use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use thiserror::Error;

use crate::error::{Error, ErrorKind, Result};

/// An error frame sent by a Ynison service instead of the expected reply.
///
/// ```json
/// {
///     "error": {
///         "grpc_code": 16,
///         "http_code": 401,
///         "http_status": "Unauthorized",
///         "message": "Invalid token",
///         "details": {}
///     }
/// }
/// ```
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Error)]
#[error("{} (grpc code {grpc_code:?}, http code {http_code:?})", .message.as_deref().unwrap_or("no message"))]
pub struct ServiceError {
    #[serde(default)]
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub grpc_code: Option<u32>,

    #[serde(default)]
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub http_code: Option<u16>,

    #[serde(default)]
    pub http_status: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

impl ServiceError {
    /// Classification by gRPC code, falling back to the HTTP code.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match (self.grpc_code, self.http_code) {
            (Some(code), _) => ErrorKind::from_grpc(code),
            (None, Some(status)) => ErrorKind::from_http(status),
            (None, None) => ErrorKind::Unknown,
        }
    }
}

impl From<ServiceError> for Error {
    fn from(e: ServiceError) -> Self {
        Self::new(e.kind(), e)
    }
}

#[derive(Deserialize)]
struct ErrorFrame {
    error: ServiceError,
}

/// Decodes a Ynison text frame into `T`.
///
/// Error frames are turned into an error of the kind the service reported.
/// Anything else that does not parse as `T` violates the protocol and
/// yields `Internal`, with the raw frame logged.
///
/// # Errors
///
/// See above.
pub fn decode<T>(frame: &str, origin: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de> + Debug,
{
    if let Ok(ErrorFrame { error }) = serde_json::from_str::<ErrorFrame>(frame) {
        debug!("{origin}: service replied with error frame: {frame}");
        return Err(error.into());
    }

    super::json(frame, origin)
}
