// Bearer-token authentication
//
// `TokenStore` owns the live token pair and talks to the OAuth token
// endpoint. `Authenticator` wraps outbound requests: it attaches the
// bearer header and, on a 401, performs one refresh and one retry.
//
// Refreshes are single-flight. Each token carries a generation number;
// a caller that was rejected asks for a refresh of the generation it
// used, and if another caller already replaced that generation the
// request is answered with the newer token instead of a second call to
// the token endpoint.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::client::normalize_base_url;
use crate::credentials::{ClientCredential, Credential, JsonDocument};
use crate::error::Error;

// ── Token endpoint payload ───────────────────────────────────────────

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: u64,
}

// ── Access token handle ──────────────────────────────────────────────

/// Snapshot of the access token at a given generation.
#[derive(Clone)]
pub struct AccessToken {
    secret: SecretString,
    generation: u64,
}

impl AccessToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn expose(&self) -> &str {
        self.secret.expose_secret()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

// ── TokenStore ───────────────────────────────────────────────────────

struct TokenState {
    credential: Credential,
    generation: u64,
}

/// Holds the OAuth token pair and the client credentials.
///
/// Shared process-wide behind an `Arc`. Only a successful refresh
/// mutates the held credential; a failed refresh leaves it unchanged.
pub struct TokenStore {
    http: reqwest::Client,
    token_url: Url,
    client: ClientCredential,
    state: RwLock<TokenState>,
    refresh_lock: Mutex<()>,
    document: Option<JsonDocument>,
}

impl TokenStore {
    /// In-memory store; refreshed tokens are not persisted.
    pub fn new(
        base_url: &str,
        http: reqwest::Client,
        client: ClientCredential,
        credential: Credential,
    ) -> Result<Self, Error> {
        let token_url = normalize_base_url(base_url)?.join("oauth2/token")?;
        Ok(Self {
            http,
            token_url,
            client,
            state: RwLock::new(TokenState {
                credential,
                generation: 0,
            }),
            refresh_lock: Mutex::new(()),
            document: None,
        })
    }

    /// Load both credential documents, failing fast on either one.
    ///
    /// Refreshed tokens are written back into `credential_doc`.
    pub fn load(
        base_url: &str,
        http: reqwest::Client,
        client_doc: &JsonDocument,
        credential_doc: JsonDocument,
    ) -> Result<Self, Error> {
        let client = ClientCredential::load(client_doc)?;
        let credential = Credential::load(&credential_doc)?;
        Ok(Self::new(base_url, http, client, credential)?.with_document(credential_doc))
    }

    pub fn with_document(mut self, document: JsonDocument) -> Self {
        self.document = Some(document);
        self
    }

    /// The token to attach to the next request.
    pub fn current(&self) -> AccessToken {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        AccessToken {
            secret: state.credential.access_token.clone(),
            generation: state.generation,
        }
    }

    /// Number of successful refreshes since construction.
    pub fn generation(&self) -> u64 {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    /// Unconditionally exchange the refresh token for a new pair.
    pub async fn refresh(&self) -> Result<AccessToken, Error> {
        let _guard = self.refresh_lock.lock().await;
        self.exchange().await
    }

    /// Refresh only if `stale` is still the current generation.
    ///
    /// Concurrent callers rejected with the same token queue on the
    /// refresh lock; the first one performs the exchange and the rest
    /// receive its result.
    pub async fn refresh_stale(&self, stale: u64) -> Result<AccessToken, Error> {
        let _guard = self.refresh_lock.lock().await;
        let current = self.current();
        if current.generation != stale {
            debug!(
                generation = current.generation,
                "token already refreshed by another caller"
            );
            return Ok(current);
        }
        self.exchange().await
    }

    async fn exchange(&self) -> Result<AccessToken, Error> {
        let refresh_token = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            state.credential.refresh_token.expose_secret().to_owned()
        };

        debug!("POST {}", self.token_url);
        let resp = self
            .http
            .post(self.token_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("client_id", self.client.client_id.as_str()),
                ("client_secret", self.client.client_secret.expose_secret()),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "token refresh rejected");
            return Err(Error::RefreshFailed {
                status: status.as_u16(),
                message: if body.is_empty() {
                    status.to_string()
                } else {
                    body.chars().take(200).collect()
                },
            });
        }

        let body = resp.text().await?;
        let tokens: TokenResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("token response: {e}"),
                body: body.clone(),
            })?;

        let credential = Credential::new(
            tokens.access_token,
            tokens.refresh_token,
            tokens.expires_in,
            Utc::now().timestamp(),
        );
        let fields = credential.to_fields();

        let token = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.credential = credential;
            state.generation += 1;
            AccessToken {
                secret: state.credential.access_token.clone(),
                generation: state.generation,
            }
        };
        info!(generation = token.generation, "access token refreshed");

        if let Some(doc) = &self.document {
            if let Err(e) = doc.merge(fields) {
                warn!(error = %e, "refreshed token could not be persisted");
            }
        }

        Ok(token)
    }
}

// ── Authenticator ────────────────────────────────────────────────────

/// Attaches bearer tokens and recovers from one expired token per call.
#[derive(Clone)]
pub struct Authenticator {
    tokens: Arc<TokenStore>,
}

impl Authenticator {
    pub fn new(tokens: Arc<TokenStore>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Send `request` with the current bearer token.
    ///
    /// A 401 triggers exactly one refresh and one retry. A second 401 is
    /// returned as [`Error::Authentication`]; every other status is left
    /// for the caller to interpret.
    pub async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, Error> {
        let retry = request.try_clone().ok_or(Error::RequestNotRetryable)?;

        let token = self.tokens.current();
        let resp = request.bearer_auth(token.expose()).send().await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        debug!(url = %resp.url(), "unauthorized, refreshing token");
        let fresh = self.tokens.refresh_stale(token.generation()).await?;

        let resp = retry.bearer_auth(fresh.expose()).send().await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: format!("{} still unauthorized after token refresh", resp.url().path()),
            });
        }
        Ok(resp)
    }
}
