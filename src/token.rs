//! Caller-supplied OAuth tokens.
//!
//! Tokens are never obtained or refreshed by this crate: every request
//! carries its own token, which is passed through to the upstream services
//! as `Authorization: OAuth <token>`. The token is redacted from `Debug`
//! output so it cannot leak into the logs.

use std::str::FromStr;

use http::HeaderValue;
use serde::Deserialize;
use veil::Redact;

use crate::error::{Error, Result};

/// An opaque Yandex Music OAuth token.
#[derive(Clone, Eq, PartialEq, Hash, Deserialize, Redact)]
#[serde(try_from = "String")]
pub struct Token(#[redact] String);

impl Token {
    /// Scheme of the `Authorization` header.
    const SCHEME: &'static str = "OAuth";

    /// Creates a token after checking that it can be sent in a header.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the token is empty or contains
    /// whitespace or control characters.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::invalid_argument("token is empty"));
        }

        if token
            .chars()
            .any(|chr| chr.is_whitespace() || chr.is_control() || !chr.is_ascii())
        {
            return Err(Error::invalid_argument("token contains invalid characters"));
        }

        Ok(Self(token))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header, marked as sensitive.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the header value cannot be built.
    pub fn authorization(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(&format!("{} {}", Self::SCHEME, self.0))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl TryFrom<String> for Token {
    type Error = Error;

    fn try_from(token: String) -> Result<Self> {
        Self::new(token)
    }
}

impl FromStr for Token {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
