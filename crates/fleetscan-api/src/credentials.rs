// On-disk credential documents
//
// Three small JSON documents back the authenticator: the OAuth token
// pair, the API client credentials and the endpoint description. Writes
// go through `merge`, so keys this crate does not know about survive a
// token refresh untouched.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

// ── Document store ───────────────────────────────────────────────────

/// A JSON object stored in a single file.
#[derive(Debug, Clone)]
pub struct JsonDocument {
    path: PathBuf,
}

impl JsonDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the whole document.
    pub fn read<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let raw = fs::read_to_string(&self.path).map_err(|e| self.fail(e))?;
        serde_json::from_str(&raw).map_err(|e| self.fail(e))
    }

    /// Overwrite `fields` in the stored object, keeping every other key.
    ///
    /// The file is replaced through a sibling temp file so a crash mid-write
    /// never leaves a truncated document behind.
    pub fn merge(&self, fields: Map<String, Value>) -> Result<(), Error> {
        let mut current = match fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str::<Map<String, Value>>(&raw).map_err(|e| self.fail(e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(self.fail(e)),
        };
        current.extend(fields);

        let rendered = serde_json::to_string_pretty(&current).map_err(|e| self.fail(e))?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, rendered).map_err(|e| self.fail(e))?;
        fs::rename(&staging, &self.path).map_err(|e| self.fail(e))
    }

    fn fail(&self, reason: impl std::fmt::Display) -> Error {
        Error::CredentialStore {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

// ── Token pair ───────────────────────────────────────────────────────

/// OAuth access/refresh token pair issued by Central.
#[derive(Debug, Clone)]
pub struct Credential {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_in: u64,
    /// Unix epoch seconds at which the pair was issued.
    pub created_at: i64,
}

#[derive(Deserialize)]
struct CredentialFields {
    access_token: String,
    refresh_token: String,
    expires_in: u64,
    #[serde(default, deserialize_with = "epoch_seconds")]
    created_at: i64,
}

impl Credential {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in: u64,
        created_at: i64,
    ) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            refresh_token: SecretString::from(refresh_token.into()),
            expires_in,
            created_at,
        }
    }

    pub fn load(doc: &JsonDocument) -> Result<Self, Error> {
        let fields: CredentialFields = doc.read()?;
        Ok(Self::new(
            fields.access_token,
            fields.refresh_token,
            fields.expires_in,
            fields.created_at,
        ))
    }

    /// Moment the access token stops being valid.
    pub fn expiry(&self) -> DateTime<Utc> {
        let expires_in = i64::try_from(self.expires_in).unwrap_or(i64::MAX);
        let at = self.created_at.saturating_add(expires_in);
        Utc.timestamp_opt(at, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry()
    }

    /// The four token fields, in their on-disk representation.
    pub(crate) fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert(
            "access_token".into(),
            Value::String(self.access_token.expose_secret().to_owned()),
        );
        fields.insert(
            "refresh_token".into(),
            Value::String(self.refresh_token.expose_secret().to_owned()),
        );
        fields.insert("expires_in".into(), Value::from(self.expires_in));
        fields.insert("created_at".into(), Value::from(self.created_at));
        fields
    }
}

/// Accept integral or fractional epoch seconds.
#[allow(clippy::as_conversions, clippy::cast_possible_truncation)]
fn epoch_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(|| de::Error::custom("created_at out of range")),
        other => Err(de::Error::custom(format!(
            "created_at must be a number, got {other}"
        ))),
    }
}

// ── Client credentials ───────────────────────────────────────────────

/// API client id and secret used for the refresh grant.
#[derive(Debug, Clone)]
pub struct ClientCredential {
    pub client_id: String,
    pub client_secret: SecretString,
}

#[derive(Deserialize)]
struct ClientFields {
    client_id: String,
    client_secret: String,
}

impl ClientCredential {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
        }
    }

    pub fn load(doc: &JsonDocument) -> Result<Self, Error> {
        let fields: ClientFields = doc.read()?;
        Ok(Self::new(fields.client_id, fields.client_secret))
    }
}

// ── Endpoint ─────────────────────────────────────────────────────────

/// Which Central cluster to talk to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default)]
    pub name: Option<String>,
    pub base_url: String,
}

impl Endpoint {
    pub fn load(doc: &JsonDocument) -> Result<Self, Error> {
        doc.read()
    }
}
