//! Settings resolution for the binary: settings file and environment,
//! then command-line flags on top.
//!
//! The core receives only the finished `RemediationConfig` and a
//! connected `CentralClient`.

use std::path::PathBuf;

use fleetscan_api::CentralClient;
use fleetscan_config::{DocumentState, Documents, Settings};
use tracing::debug;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Path of the settings file in effect.
pub fn settings_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(fleetscan_config::config_path)
}

/// Load settings and apply every flag that overrides them.
pub fn load_settings(global: &GlobalOpts) -> Result<Settings, CliError> {
    let path = settings_path(global);
    debug!(path = %path.display(), "loading settings");
    let mut settings = fleetscan_config::load(&path)?;
    apply_overrides(&mut settings, global);
    Ok(settings)
}

fn apply_overrides(settings: &mut Settings, global: &GlobalOpts) {
    if let Some(group) = &global.group {
        settings.central.group.clone_from(group);
    }
    if let Some(timeout) = global.timeout {
        settings.central.timeout = timeout;
    }
    for (kind, version) in &global.firmware {
        let targets = &mut settings.firmware.targets;
        targets.retain(|key, _| fleetscan_config::parse_kind(key).ok() != Some(*kind));
        targets.insert(kind.to_string(), version.clone());
    }

    let files = &mut settings.files;
    if let Some(path) = &global.endpoint_file {
        files.endpoint.clone_from(path);
    }
    if let Some(path) = &global.client_id_file {
        files.client_id.clone_from(path);
    }
    if let Some(path) = &global.credential_file {
        files.credential.clone_from(path);
    }

    let audit = &mut settings.audit;
    if global.no_audit {
        audit.enabled = false;
    }
    if let Some(dir) = &global.audit_dir {
        audit.dir.clone_from(dir);
    }
    if global.audit_persist {
        audit.persist = true;
    }
}

/// Check the three documents, then build an authenticated client.
pub fn connect(settings: &Settings) -> Result<CentralClient, CliError> {
    let docs = settings.documents();
    require(&docs)?;
    let client = CentralClient::from_documents(
        &docs.endpoint,
        &docs.client,
        docs.credential.clone(),
        &settings.transport(),
    )?;
    debug!(base_url = %client.base_url(), "central client ready");
    Ok(client)
}

fn require(docs: &Documents) -> Result<(), CliError> {
    let checks = [
        ("Endpoint", "endpoint-file", &docs.endpoint, docs.endpoint_state()),
        ("Client", "client-id-file", &docs.client, docs.client_state()),
        ("Credential", "credential-file", &docs.credential, docs.credential_state()),
    ];

    for (what, flag, doc, state) in checks {
        let path = doc.path().display().to_string();
        match state {
            DocumentState::Valid => {}
            DocumentState::Missing => {
                return Err(CliError::MissingDocument { what, path, flag });
            }
            DocumentState::Invalid(reason) => {
                return Err(CliError::InvalidDocument { what, path, reason });
            }
        }
    }
    Ok(())
}
