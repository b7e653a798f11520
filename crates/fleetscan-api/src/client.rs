// Central REST client
//
// Wraps `reqwest::Client` with base-URL handling, bearer authentication
// and response decoding. Endpoint groups (monitoring, configuration,
// firmware, platform) are inherent methods in sibling modules so this
// file stays focused on transport mechanics.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{Authenticator, TokenStore};
use crate::credentials::{Endpoint, JsonDocument};
use crate::error::Error;
use crate::models::Page;
use crate::transport::TransportConfig;

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Parse `raw` and make sure the path ends with `/` so relative joins
/// append instead of replacing the last segment.
pub(crate) fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw.trim())?;
    let path = url.path().trim_end_matches('/').to_owned();
    url.set_path(&format!("{path}/"));
    Ok(url)
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the Aruba Central REST API.
///
/// Cheap to clone: the HTTP pool and token store are shared.
#[derive(Clone)]
pub struct CentralClient {
    http: reqwest::Client,
    base_url: Url,
    auth: Authenticator,
    timeout: Duration,
}

impl CentralClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Wrap an existing `reqwest::Client` and authenticator.
    pub fn new(
        base_url: &str,
        http: reqwest::Client,
        auth: Authenticator,
        timeout: Duration,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            auth,
            timeout,
        })
    }

    /// Build the full stack from the three credential documents.
    ///
    /// One HTTP client serves both the token endpoint and the API calls.
    pub fn from_documents(
        endpoint: &JsonDocument,
        client_id: &JsonDocument,
        credential: JsonDocument,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let endpoint = Endpoint::load(endpoint)?;
        let http = transport.build_client()?;
        let tokens = TokenStore::load(&endpoint.base_url, http.clone(), client_id, credential)?;
        Self::new(
            &endpoint.base_url,
            http,
            Authenticator::new(Arc::new(tokens)),
            transport.timeout,
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        self.auth.tokens()
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, Error> {
        self.auth.send(request).await.map_err(|e| match e {
            Error::Transport(ref inner) if inner.is_timeout() => Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            },
            other => other,
        })
    }

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.send(self.http.get(url).query(params)).await?;
        Self::handle_response(resp, None).await
    }

    /// POST a JSON body. Central answers some mutations with a decodable
    /// JSON body even on `500`; `tolerated` lets the caller accept that.
    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        tolerated: Option<StatusCode>,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.send(self.http.post(url).json(body)).await?;
        Self::handle_response(resp, tolerated).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<reqwest::Response, Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        self.send(self.http.delete(url)).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        resp: reqwest::Response,
        tolerated: Option<StatusCode>,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() || Some(status) == tolerated {
            let body = resp.text().await?;
            trace!(status = status.as_u16(), bytes = body.len(), "response body");
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    pub(crate) async fn parse_error(status: StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        let message = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|err| err.description.or(err.error_description).or(err.message))
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw.chars().take(200).collect()
                }
            });

        Error::Api {
            status: status.as_u16(),
            message,
        }
    }

    // ── Pagination helper ────────────────────────────────────────────

    /// Collect every page of an offset-paginated listing.
    ///
    /// The offset advances by `limit` until a page comes back empty, so
    /// `N` items at page size `P` cost `ceil(N / P) + 1` requests.
    pub async fn paginate_all<P, F, Fut>(limit: u32, fetch: F) -> Result<Vec<P::Item>, Error>
    where
        P: Page,
        F: Fn(u32, u32) -> Fut,
        Fut: Future<Output = Result<P, Error>>,
    {
        let mut all = Vec::new();
        let mut offset: u32 = 0;

        loop {
            let items = fetch(offset, limit).await?.into_items();
            if items.is_empty() {
                break;
            }
            trace!(offset, received = items.len(), "page received");
            all.extend(items);
            offset = offset.saturating_add(limit.max(1));
        }

        Ok(all)
    }
}
