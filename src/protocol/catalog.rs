//! Response envelopes of the Yandex Music catalog REST API.
//!
//! Every response wraps its payload the same way:
//!
//! ```json
//! {
//!     "invocationInfo": {"hostname": "...", "req-id": "...", "exec-duration-millis": 7},
//!     "result": [ ... ]
//! }
//! ```
//!
//! Failed calls carry an `error` object instead of `result`:
//!
//! ```json
//! {
//!     "invocationInfo": { ... },
//!     "error": {"name": "not-found", "message": "Track not found"}
//! }
//! ```

use serde::Deserialize;
use thiserror::Error;

/// Metadata of a single track, as returned by the catalog.
///
/// The catalog owns this shape; it is passed through untouched.
pub type Track = serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response<T> {
    pub invocation_info: Option<InvocationInfo>,
    pub result: Option<T>,
    pub error: Option<ApiError>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct InvocationInfo {
    #[serde(rename = "req-id")]
    pub req_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Error)]
#[error("{name}: {}", .message.as_deref().unwrap_or("no message"))]
pub struct ApiError {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub message: Option<String>,
}
