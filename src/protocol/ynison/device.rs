//! Device identity and the WebSocket protocol header derived from it.
//!
//! Ynison authenticates WebSocket clients through the
//! `Sec-WebSocket-Protocol` header. Besides the `Bearer` and `v2` tokens it
//! carries a JSON object naming the connecting device:
//!
//! ```json
//! {
//!     "Ynison-Device-Id": "qwertyuiopasdfgh",
//!     "Ynison-Device-Info": "{\"app_name\":\"Chrome\",\"type\":1}"
//! }
//! ```
//!
//! After the redirect, the same object is sent to the state service with
//! one more field, `Ynison-Redirect-Ticket`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_with::{json::JsonString, serde_as};

use crate::error::Result;

/// A random pseudo-device identifier of 16 lowercase ASCII letters.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Number of characters in a device id.
    pub const LENGTH: usize = 16;

    /// Draws a new identifier uniformly from `a..=z`.
    #[must_use]
    pub fn random() -> Self {
        let id = std::iter::repeat_with(fastrand::lowercase)
            .take(Self::LENGTH)
            .collect();
        Self(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Device descriptor sent as `Ynison-Device-Info`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub app_name: String,
    #[serde(rename = "type")]
    pub device_type: u32,
}

impl DeviceInfo {
    /// Application the shadow device poses as.
    pub const APP_NAME: &'static str = "Chrome";

    /// Device type of a web browser.
    pub const WEB: u32 = 1;
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            app_name: Self::APP_NAME.to_owned(),
            device_type: Self::WEB,
        }
    }
}

/// The identity a single request presents to Ynison.
///
/// Generated fresh for every request and dropped with it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeviceIdentity {
    pub device_id: DeviceId,
    pub info: DeviceInfo,
}

impl DeviceIdentity {
    #[must_use]
    pub fn generate() -> Self {
        Self {
            device_id: DeviceId::random(),
            info: DeviceInfo::default(),
        }
    }
}

/// The JSON object embedded in `Sec-WebSocket-Protocol`.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolHeader {
    #[serde(rename = "Ynison-Device-Id")]
    pub device_id: DeviceId,

    /// The wire format of this field is JSON embedded in a string.
    #[serde(rename = "Ynison-Device-Info")]
    #[serde_as(as = "JsonString")]
    pub device_info: DeviceInfo,

    #[serde(
        rename = "Ynison-Redirect-Ticket",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub redirect_ticket: Option<String>,
}

impl ProtocolHeader {
    /// Fixed subprotocol tokens preceding the JSON object.
    const PREFIX: &'static str = "Bearer, v2, ";

    /// Header for the redirector: identity only.
    #[must_use]
    pub fn new(identity: &DeviceIdentity) -> Self {
        Self {
            device_id: identity.device_id.clone(),
            device_info: identity.info.clone(),
            redirect_ticket: None,
        }
    }

    /// Header for the state service: this header plus the redirect ticket.
    #[must_use]
    pub fn with_redirect_ticket(&self, ticket: &str) -> Self {
        Self {
            redirect_ticket: Some(ticket.to_owned()),
            ..self.clone()
        }
    }

    /// Value of the `Sec-WebSocket-Protocol` header.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be serialized.
    pub fn to_subprotocol(&self) -> Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}{json}", Self::PREFIX))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value};

    use super::*;

    fn fields(header: &ProtocolHeader) -> Map<String, Value> {
        match serde_json::to_value(header).unwrap() {
            Value::Object(map) => map,
            other => panic!("header is not an object: {other}"),
        }
    }

    #[test]
    fn device_id_is_sixteen_lowercase_letters() {
        for _ in 0..100 {
            let id = DeviceId::random();
            assert_eq!(id.as_str().len(), DeviceId::LENGTH);
            assert!(id.as_str().chars().all(|chr| chr.is_ascii_lowercase()));
        }
    }

    #[test]
    fn device_ids_differ_between_identities() {
        let first = DeviceIdentity::generate();
        let second = DeviceIdentity::generate();
        assert_ne!(first.device_id, second.device_id);
    }

    #[test]
    fn device_info_is_embedded_as_json_string() {
        let identity = DeviceIdentity {
            device_id: DeviceId("abcdefghijklmnop".to_owned()),
            info: DeviceInfo::default(),
        };
        let header = ProtocolHeader::new(&identity);

        assert_eq!(
            header.to_subprotocol().unwrap(),
            r#"Bearer, v2, {"Ynison-Device-Id":"abcdefghijklmnop","Ynison-Device-Info":"{\"app_name\":\"Chrome\",\"type\":1}"}"#
        );
    }

    #[test]
    fn redirect_header_adds_exactly_the_ticket() {
        let identity = DeviceIdentity::generate();
        let first = ProtocolHeader::new(&identity);
        let second = first.with_redirect_ticket("T1");

        let before = fields(&first);
        let after = fields(&second);
        assert_eq!(after.len(), before.len() + 1);
        for (key, value) in &before {
            assert_eq!(after.get(key), Some(value), "field {key} changed");
        }
        assert_eq!(after["Ynison-Redirect-Ticket"], "T1");
        assert_eq!(after["Ynison-Device-Id"], identity.device_id.as_str());

        // The original header is left untouched.
        assert_eq!(first.redirect_ticket, None);
    }

    #[test]
    fn header_parses_back() {
        let header = ProtocolHeader::new(&DeviceIdentity::generate()).with_redirect_ticket("T1");
        let json = serde_json::to_string(&header).unwrap();
        assert_eq!(
            serde_json::from_str::<ProtocolHeader>(&json).unwrap(),
            header
        );
    }
}
