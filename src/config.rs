use std::time::Duration;

use url::Url;

/// Immutable runtime configuration, built once at startup and injected
/// into the components that need it.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Config {
    pub app_name: String,
    pub app_version: String,

    pub user_agent: String,

    /// Ynison redirector endpoint.
    pub redirector_url: Url,

    /// `Origin` presented on both Ynison sockets.
    pub origin: String,

    /// Base URL of the catalog REST API.
    pub catalog_url: Url,

    /// Upper bound on every WebSocket connect and every awaited message.
    pub timeout: Duration,
}

impl Config {
    pub const REDIRECTOR_URL: &'static str =
        "wss://ynison.music.yandex.ru/redirector.YnisonRedirectService/GetRedirectToYnison";
    pub const ORIGIN: &'static str = "http://music.yandex.ru";
    pub const CATALOG_URL: &'static str = "https://api.music.yandex.net";
    pub const TIMEOUT: Duration = Duration::from_secs(5);

    #[must_use]
    pub fn new(redirector_url: Url, catalog_url: Url) -> Self {
        let app_name = env!("CARGO_PKG_NAME").to_owned();
        let app_version = env!("CARGO_PKG_VERSION").to_owned();

        let os_name = match std::env::consts::OS {
            "macos" => "osx",
            other => other,
        };
        let os_version = sysinfo::System::os_version()
            .filter(|version| !version.contains(['/', ';']))
            .unwrap_or_else(|| String::from("0"));

        let user_agent = format!("{app_name}/{app_version} (Rust; {os_name}/{os_version})");
        trace!("user agent: {user_agent}");

        Self {
            app_name,
            app_version,
            user_agent,
            redirector_url,
            origin: Self::ORIGIN.to_owned(),
            catalog_url,
            timeout: Self::TIMEOUT,
        }
    }
}

impl Default for Config {
    /// Configuration pointing at the production Yandex Music endpoints.
    fn default() -> Self {
        // Both are compile-time constants that are known to parse.
        let redirector_url = Url::parse(Self::REDIRECTOR_URL).expect("invalid redirector url");
        let catalog_url = Url::parse(Self::CATALOG_URL).expect("invalid catalog url");
        Self::new(redirector_url, catalog_url)
    }
}
