use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};

/// Reply of the redirector: where the account's session lives.
///
/// ```json
/// {
///     "host": "ynison-5.music.yandex.net",
///     "redirect_ticket": "...",
///     "session_id": "...",
///     "keep_alive_params": { ... }
/// }
/// ```
///
/// Fields other than `host` and `redirect_ticket` are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Redirect {
    pub host: String,
    pub redirect_ticket: String,
}

impl Redirect {
    /// Path of the state service on the redirected host.
    pub const STATE_PATH: &'static str = "/ynison_state.YnisonStateService/PutYnisonState";

    /// URL of the state service on the redirected host.
    ///
    /// `scheme` is normally `wss`.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the host or ticket is empty, or if the host
    /// is not a bare authority.
    pub fn state_url(&self, scheme: &str) -> Result<Url> {
        if self.redirect_ticket.is_empty() {
            return Err(Error::internal("redirector returned an empty ticket"));
        }

        if self.host.is_empty() || self.host.contains(['/', '?', '#', '@']) {
            return Err(Error::internal(format!(
                "redirector returned an invalid host: {:?}",
                self.host
            )));
        }

        let url = Url::parse(&format!("{scheme}://{}{}", self.host, Self::STATE_PATH))?;
        Ok(url)
    }
}
