//! Protocol types and structures for Yandex Music services.
//!
//! This module contains the wire types and parsing logic for the two
//! upstream protocols this crate speaks:
//!
//! # Submodules
//!
//! * [`ynison`] - Ynison real-time session protocol (WebSocket, JSON frames)
//! * [`catalog`] - Catalog REST API envelopes
//!
//! # Shared Functionality
//!
//! The module provides common utilities for protocol handling:
//!
//! * JSON parsing with consistent error handling
//! * Structured logging of upstream payloads
//!
//! # Usage Example
//!
//! ```
//! use ynison_proxy::protocol;
//!
//! // Parse and log JSON response
//! let response: MyType = protocol::json(&body, "redirector")?;
//!
//! // Response is logged at:
//! // - TRACE level if successful
//! // - ERROR level with the raw payload if parsing fails
//! ```

pub mod catalog;
pub mod ynison;

use crate::error::Result;
use serde::Deserialize;
use std::fmt::Debug;

/// Parses and logs JSON payloads from Yandex Music services.
///
/// # Arguments
///
/// * `body` - Payload text to parse
/// * `origin` - Description of the endpoint for logging
///
/// # Errors
///
/// Returns an `Internal` error if:
/// * Payload is not valid JSON
/// * JSON structure doesn't match type `T`
///
/// # Logging
///
/// * Success: Logs parsed structure at TRACE level
/// * Shape mismatch: Logs error and the raw JSON at ERROR level
/// * Invalid JSON: Logs error and raw text at ERROR level
pub fn json<T>(body: &str, origin: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de> + Debug,
{
    match serde_json::from_str(body) {
        Ok(result) => {
            trace!("{origin}: {result:#?}");
            Ok(result)
        }
        Err(e) => {
            // Upstream contract violations are rare and otherwise
            // impossible to diagnose, so the payload goes into the log.
            error!("{origin}: failed parsing response ({e})");
            error!("{origin}: {body}");
            Err(e.into())
        }
    }
}
