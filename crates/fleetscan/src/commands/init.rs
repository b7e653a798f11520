//! Interactive bootstrap of the endpoint, client and credential documents.

use dialoguer::{Confirm, Input, Password};
use secrecy::SecretString;

use fleetscan_config::{DocumentState, Documents};

use crate::cli::{GlobalOpts, InitArgs};
use crate::config;
use crate::error::CliError;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Prompt {
        reason: e.to_string(),
    }
}

pub fn handle(args: &InitArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let settings = config::load_settings(global)?;
    let docs = settings.documents();

    if needs_entry("Endpoint", &docs.endpoint, docs.endpoint_state(), args.force) {
        prompt_endpoint(&docs)?;
    }
    if needs_entry("Client", &docs.client, docs.client_state(), args.force) {
        prompt_client(&docs)?;
    }
    if needs_entry(
        "Credential",
        &docs.credential,
        docs.credential_state(),
        args.force,
    ) {
        prompt_credential(&docs)?;
    }

    let path = config::settings_path(global);
    if !path.exists() {
        let write = Confirm::new()
            .with_prompt(format!("Write settings to {}?", path.display()))
            .default(true)
            .interact()
            .map_err(prompt_err)?;
        if write {
            settings.save(&path)?;
            eprintln!("Settings written to {}", path.display());
        }
    }

    eprintln!("Ready. Start a session with: fleetscan firmware");
    Ok(())
}

fn needs_entry(
    what: &str,
    doc: &fleetscan_api::JsonDocument,
    state: DocumentState,
    force: bool,
) -> bool {
    let path = doc.path().display();
    match state {
        DocumentState::Valid if !force => {
            eprintln!("{what} document {path} is valid, keeping it");
            false
        }
        DocumentState::Valid => true,
        DocumentState::Missing => {
            eprintln!("{what} document {path} does not exist yet");
            true
        }
        DocumentState::Invalid(reason) => {
            eprintln!("{what} document {path} is unusable: {reason}");
            true
        }
    }
}

fn prompt_endpoint(docs: &Documents) -> Result<(), CliError> {
    let name: String = Input::new()
        .with_prompt("Cluster name")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let base_url: String = Input::new()
        .with_prompt("API gateway URL")
        .default("https://eu-apigw.central.arubanetworks.com".into())
        .validate_with(|input: &String| {
            if input.starts_with("https://") || input.starts_with("http://") {
                Ok(())
            } else {
                Err("expected an http(s) URL")
            }
        })
        .interact_text()
        .map_err(prompt_err)?;

    docs.write_endpoint(Some(&name), &base_url)?;
    Ok(())
}

fn prompt_client(docs: &Documents) -> Result<(), CliError> {
    let client_id: String = Input::new()
        .with_prompt("Client ID")
        .interact_text()
        .map_err(prompt_err)?;
    let client_secret = Password::new()
        .with_prompt("Client secret")
        .interact()
        .map_err(prompt_err)?;

    docs.write_client(&client_id, &SecretString::from(client_secret))?;
    Ok(())
}

fn prompt_credential(docs: &Documents) -> Result<(), CliError> {
    let access_token = Password::new()
        .with_prompt("Access token")
        .interact()
        .map_err(prompt_err)?;
    let refresh_token = Password::new()
        .with_prompt("Refresh token")
        .interact()
        .map_err(prompt_err)?;
    let expires_in: u64 = Input::new()
        .with_prompt("Expires in (seconds)")
        .default(7200)
        .interact_text()
        .map_err(prompt_err)?;

    docs.write_credential(
        &SecretString::from(access_token),
        &SecretString::from(refresh_token),
        expires_in,
    )?;
    Ok(())
}
