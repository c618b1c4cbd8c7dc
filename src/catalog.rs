//! Track metadata lookup.
//!
//! The catalog is an external collaborator: given a track id it returns
//! the track's full metadata. Lookups are idempotent and side-effect free.

use async_trait::async_trait;
use reqwest::{
    header::{HeaderValue, ACCEPT},
    Url,
};

use crate::{
    config::Config,
    error::{Error, ErrorKind, Result},
    http::Client as HttpClient,
    protocol::{
        self,
        catalog::{Response, Track},
    },
    token::Token,
};

/// Looks up track metadata by id.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Returns the metadata of the track with `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids and the kind of the upstream
    /// failure otherwise.
    async fn lookup_track(&self, token: &Token, id: &str) -> Result<Track>;
}

/// Catalog backed by the Yandex Music REST API.
pub struct YandexCatalog {
    http_client: HttpClient,
    base_url: Url,
}

impl YandexCatalog {
    /// Client identification the API expects from its own apps.
    const CLIENT_HEADER: &'static str = "x-yandex-music-client";
    const CLIENT: &'static str = "YandexMusicAndroid/24023621";

    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            http_client: HttpClient::new(config)?,
            base_url: config.catalog_url.clone(),
        })
    }
}

/// `{base}/tracks/{id}`, with `id` percent-encoded as a single segment.
fn track_url(base: &Url, id: &str) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| Error::internal(format!("catalog url {base} cannot be a base")))?
        .pop_if_empty()
        .push("tracks")
        .push(id);
    Ok(url)
}

#[async_trait]
impl Catalog for YandexCatalog {
    async fn lookup_track(&self, token: &Token, id: &str) -> Result<Track> {
        if id.is_empty() {
            return Err(Error::invalid_argument("track id is empty"));
        }

        let mut request = self.http_client.get(track_url(&self.base_url, id)?);
        let headers = request.headers_mut();
        headers.insert(reqwest::header::AUTHORIZATION, token.authorization()?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(Self::CLIENT_HEADER, HeaderValue::from_static(Self::CLIENT));

        let response = self.http_client.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;

        // Failed calls still answer with an envelope, but not always with
        // JSON (e.g. from a proxy in front of the API).
        let origin = format!("tracks/{id}");
        let envelope = protocol::json::<Response<Vec<Track>>>(&body, &origin);

        if !status.is_success() {
            let kind = ErrorKind::from_http(status.as_u16());
            return Err(match envelope {
                Ok(Response {
                    error: Some(error), ..
                }) => Error::new(kind, error),
                _ => Error::new(kind, format!("catalog replied with {status}")),
            });
        }

        let envelope = envelope?;
        if let Some(error) = envelope.error {
            return Err(Error::unavailable(error));
        }

        envelope
            .result
            .and_then(|tracks| tracks.into_iter().next())
            .ok_or_else(|| Error::not_found(format!("track {id} not found")))
    }
}
