//! Settings and credential documents for fleetscan.
//!
//! TOML settings layered with `FLEETSCAN_*` environment variables,
//! translation into the core's `RemediationConfig`, and the writers used
//! to bootstrap the three JSON documents Central access depends on.
//! The core never sees these types.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use fleetscan_api::{ClientCredential, Credential, Endpoint, JsonDocument, TransportConfig};
use fleetscan_core::{DecommissionPolicy, DeviceKind, RemediationConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error(transparent)]
    Document(#[from] fleetscan_api::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub central: CentralSettings,

    #[serde(default)]
    pub files: FileSettings,

    #[serde(default)]
    pub firmware: FirmwareSettings,

    #[serde(default)]
    pub decommission: DecommissionSettings,

    #[serde(default)]
    pub audit: AuditSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CentralSettings {
    /// Group every scanned device should end up in.
    #[serde(default = "default_group")]
    pub group: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Pause after a group move before the inventory is re-read.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for CentralSettings {
    fn default() -> Self {
        Self {
            group: default_group(),
            timeout: default_timeout(),
            page_size: default_page_size(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

fn default_group() -> String {
    "default".into()
}
fn default_timeout() -> u64 {
    60
}
fn default_page_size() -> u32 {
    1000
}
fn default_settle_delay_ms() -> u64 {
    2000
}

/// Locations of the three JSON documents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FileSettings {
    #[serde(default = "default_endpoint_file")]
    pub endpoint: PathBuf,

    #[serde(default = "default_client_id_file")]
    pub client_id: PathBuf,

    #[serde(default = "default_credential_file")]
    pub credential: PathBuf,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint_file(),
            client_id: default_client_id_file(),
            credential: default_credential_file(),
        }
    }
}

fn default_endpoint_file() -> PathBuf {
    "endpoint.json".into()
}
fn default_client_id_file() -> PathBuf {
    "client_id.json".into()
}
fn default_credential_file() -> PathBuf {
    "credential.json".into()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FirmwareSettings {
    /// Compliance versions keyed by device kind (`CONTROLLER`, `CX`, ...).
    #[serde(default)]
    pub targets: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DecommissionSettings {
    #[serde(default)]
    pub delete_after_unassign: bool,

    #[serde(default)]
    pub refresh_on_repeat: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuditSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_audit_dir")]
    pub dir: PathBuf,

    /// Keep the sheet on disk after the session ends.
    #[serde(default)]
    pub persist: bool,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_audit_dir(),
            persist: false,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_audit_dir() -> PathBuf {
    "out".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "fleetscan", "fleetscan").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("fleetscan");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load settings from `path` (missing is fine) and the environment.
///
/// Nested keys use a double underscore: `FLEETSCAN_CENTRAL__GROUP`.
pub fn load(path: &Path) -> Result<Settings, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FLEETSCAN_").split("__"));

    let settings: Settings = figment.extract()?;
    settings.validate()?;
    Ok(settings)
}

impl Settings {
    /// Write the settings as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.central.group.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "central.group".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.central.page_size == 0 {
            return Err(ConfigError::Validation {
                field: "central.page_size".into(),
                reason: "must be at least 1".into(),
            });
        }
        self.firmware_targets().map(drop)
    }

    /// Parsed `[firmware.targets]`.
    pub fn firmware_targets(&self) -> Result<HashMap<DeviceKind, String>, ConfigError> {
        self.firmware
            .targets
            .iter()
            .map(|(kind, version)| Ok((parse_kind(kind)?, version.clone())))
            .collect()
    }

    /// The engine-facing half of the settings.
    pub fn remediation(&self) -> Result<RemediationConfig, ConfigError> {
        Ok(RemediationConfig {
            group: self.central.group.clone(),
            page_size: self.central.page_size,
            settle_delay: Duration::from_millis(self.central.settle_delay_ms),
            firmware_targets: self.firmware_targets()?,
            decommission: DecommissionPolicy {
                delete_after_unassign: self.decommission.delete_after_unassign,
                refresh_on_repeat: self.decommission.refresh_on_repeat,
            },
        })
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig::default().with_timeout(Duration::from_secs(self.central.timeout))
    }

    pub fn documents(&self) -> Documents {
        Documents {
            endpoint: JsonDocument::new(&self.files.endpoint),
            client: JsonDocument::new(&self.files.client_id),
            credential: JsonDocument::new(&self.files.credential),
        }
    }
}

/// Parse a device kind as written in settings or on the command line.
pub fn parse_kind(raw: &str) -> Result<DeviceKind, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Validation {
        field: "firmware target".into(),
        reason: format!("unknown device kind '{raw}' (expected CONTROLLER, CX, HP or IAP)"),
    })
}

// ── Credential documents ────────────────────────────────────────────

/// Health of one document on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentState {
    Valid,
    Missing,
    Invalid(String),
}

impl DocumentState {
    fn of<T>(
        doc: &JsonDocument,
        load: impl FnOnce(&JsonDocument) -> Result<T, fleetscan_api::Error>,
    ) -> Self {
        if !doc.path().exists() {
            return Self::Missing;
        }
        match load(doc) {
            Ok(_) => Self::Valid,
            Err(e) => Self::Invalid(e.to_string()),
        }
    }
}

/// The endpoint, client and token documents.
#[derive(Debug, Clone)]
pub struct Documents {
    pub endpoint: JsonDocument,
    pub client: JsonDocument,
    pub credential: JsonDocument,
}

impl Documents {
    pub fn endpoint_state(&self) -> DocumentState {
        DocumentState::of(&self.endpoint, Endpoint::load)
    }

    pub fn client_state(&self) -> DocumentState {
        DocumentState::of(&self.client, ClientCredential::load)
    }

    pub fn credential_state(&self) -> DocumentState {
        DocumentState::of(&self.credential, Credential::load)
    }

    pub fn write_endpoint(&self, name: Option<&str>, base_url: &str) -> Result<(), ConfigError> {
        let base_url = base_url.trim();
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(ConfigError::Validation {
                field: "base_url".into(),
                reason: format!("expected an http(s) URL, got '{base_url}'"),
            });
        }
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        self.endpoint
            .merge(to_fields(&EndpointFields { name, base_url })?)?;
        Ok(())
    }

    pub fn write_client(
        &self,
        client_id: &str,
        client_secret: &SecretString,
    ) -> Result<(), ConfigError> {
        self.client.merge(to_fields(&ClientFields {
            client_id: client_id.trim(),
            client_secret: client_secret.expose_secret(),
        })?)?;
        Ok(())
    }

    /// Store a freshly issued token pair, stamped with the current time.
    pub fn write_credential(
        &self,
        access_token: &SecretString,
        refresh_token: &SecretString,
        expires_in: u64,
    ) -> Result<(), ConfigError> {
        self.credential.merge(to_fields(&CredentialFields {
            access_token: access_token.expose_secret(),
            refresh_token: refresh_token.expose_secret(),
            expires_in,
            created_at: chrono::Utc::now().timestamp(),
        })?)?;
        Ok(())
    }
}

#[derive(Serialize)]
struct EndpointFields<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    base_url: &'a str,
}

#[derive(Serialize)]
struct ClientFields<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Serialize)]
struct CredentialFields<'a> {
    access_token: &'a str,
    refresh_token: &'a str,
    expires_in: u64,
    created_at: i64,
}

fn to_fields(value: &impl Serialize) -> Result<Map<String, Value>, ConfigError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(ConfigError::Validation {
            field: "document".into(),
            reason: format!("expected a JSON object, got {other}"),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_apply_without_a_file() {
        Jail::expect_with(|jail| {
            let settings = load(&jail.directory().join("absent.toml")).unwrap();
            assert_eq!(settings, Settings::default());
            assert_eq!(settings.central.timeout, 60);
            assert_eq!(settings.audit.dir, PathBuf::from("out"));
            Ok(())
        });
    }

    #[test]
    fn file_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [central]
                group = "staging"
                page_size = 500

                [firmware.targets]
                CONTROLLER = "10.5.0.0"
                cx = "10.12.1000"

                [decommission]
                refresh_on_repeat = true
                "#,
            )?;
            jail.set_env("FLEETSCAN_CENTRAL__GROUP", "production");

            let settings = load(&jail.directory().join("config.toml")).unwrap();
            assert_eq!(settings.central.group, "production");
            assert_eq!(settings.central.page_size, 500);

            let config = settings.remediation().unwrap();
            assert_eq!(config.group, "production");
            assert_eq!(
                config.firmware_targets.get(&DeviceKind::Cx).map(String::as_str),
                Some("10.12.1000")
            );
            assert!(config.decommission.refresh_on_repeat);
            assert!(!config.decommission.delete_after_unassign);
            Ok(())
        });
    }

    #[test]
    fn unknown_target_kind_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[firmware.targets]\nROUTER = \"1.0\"\n")?;
            let err = load(&jail.directory().join("config.toml")).unwrap_err();
            assert!(matches!(err, ConfigError::Validation { .. }), "{err}");
            Ok(())
        });
    }

    #[test]
    fn save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut settings = Settings::default();
        settings.audit.persist = true;
        settings.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back: Settings = toml::from_str(&text).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn bootstrap_writes_loadable_documents() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.files = FileSettings {
            endpoint: dir.path().join("endpoint.json"),
            client_id: dir.path().join("client_id.json"),
            credential: dir.path().join("credential.json"),
        };
        let docs = settings.documents();
        assert_eq!(docs.credential_state(), DocumentState::Missing);

        docs.write_endpoint(Some("EU-1"), "https://eu-apigw.central.arubanetworks.com")
            .unwrap();
        docs.write_client("client", &SecretString::from("secret")).unwrap();
        docs.write_credential(
            &SecretString::from("access"),
            &SecretString::from("refresh"),
            7200,
        )
        .unwrap();

        assert_eq!(docs.endpoint_state(), DocumentState::Valid);
        assert_eq!(docs.client_state(), DocumentState::Valid);
        assert_eq!(docs.credential_state(), DocumentState::Valid);

        let endpoint = Endpoint::load(&docs.endpoint).unwrap();
        assert_eq!(endpoint.name.as_deref(), Some("EU-1"));
        let credential = Credential::load(&docs.credential).unwrap();
        assert!(!credential.is_expired(chrono::Utc::now()));
    }

    #[test]
    fn malformed_document_is_reported_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client_id.json");
        std::fs::write(&path, r#"{"client_id": "only"}"#).unwrap();

        let state = DocumentState::of(&JsonDocument::new(&path), ClientCredential::load);
        assert!(matches!(state, DocumentState::Invalid(_)));
    }

    #[test]
    fn endpoint_requires_http_url() {
        let dir = tempfile::tempdir().unwrap();
        let docs = Documents {
            endpoint: JsonDocument::new(dir.path().join("endpoint.json")),
            client: JsonDocument::new(dir.path().join("client_id.json")),
            credential: JsonDocument::new(dir.path().join("credential.json")),
        };
        assert!(docs.write_endpoint(None, "central.example").is_err());
        assert_eq!(docs.endpoint_state(), DocumentState::Missing);
    }
}
