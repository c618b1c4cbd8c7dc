//! HTTP service reporting what an account is playing on Yandex Music.
//!
//! The current track is read from Ynison, the real-time protocol Yandex
//! Music clients use to share playback state. For every request the
//! service joins the account's session as a passive shadow device, takes
//! the player state the session broadcasts, and resolves the current queue
//! entry through the catalog.
//!
//! # Modules
//!
//! * [`ynison`] - Session handshake and queue projection
//! * [`websocket`] - WebSocket transport
//! * [`catalog`] - Track metadata lookup
//! * [`server`] - HTTP routes
//! * [`protocol`] - Wire types
//! * [`config`] - Runtime configuration
//! * [`error`] - Error kinds and HTTP mapping
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[macro_use]
extern crate log;

pub mod catalog;
pub mod config;
pub mod error;
pub mod http;
pub mod protocol;
pub mod server;
pub mod token;
pub mod websocket;
pub mod ynison;
