//! Console scan sessions: one serial per stdin line.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use fleetscan_config::{AuditSettings, Settings};
use fleetscan_core::{
    AuditLayout, AuditLog, AuditSheet, DecommissionEngine, FirmwareEngine, Fleet, Reporter,
    ScanOptions, ScanSession, Workflow,
};

use crate::cli::{DecommissionArgs, GlobalOpts};
use crate::config;
use crate::console::Console;
use crate::error::CliError;

const QUIT: [&str; 3] = ["q", "quit", "exit"];

pub async fn firmware(global: &GlobalOpts) -> Result<(), CliError> {
    let (settings, fleet) = open(global)?;
    let engine = FirmwareEngine::new(fleet).await?;
    run(
        engine,
        &settings,
        global,
        AuditLayout::Firmware,
        ScanOptions::default(),
    )
    .await
}

pub async fn decommission(args: &DecommissionArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (settings, fleet) = open(global)?;
    let engine = DecommissionEngine::new(fleet);
    run(
        engine,
        &settings,
        global,
        AuditLayout::Decommission,
        ScanOptions {
            unlicense: args.unlicense,
        },
    )
    .await
}

fn open(global: &GlobalOpts) -> Result<(Settings, Fleet), CliError> {
    let settings = config::load_settings(global)?;
    let client = config::connect(&settings)?;
    let fleet = Fleet::new(client, settings.remediation()?);
    Ok((settings, fleet))
}

fn open_audit(
    settings: &AuditSettings,
    layout: AuditLayout,
) -> Result<Option<Arc<dyn AuditLog>>, CliError> {
    if !settings.enabled {
        return Ok(None);
    }
    let sheet: Arc<dyn AuditLog> =
        Arc::new(AuditSheet::create(layout, &settings.dir, settings.persist)?);
    Ok(Some(sheet))
}

async fn run<W: Workflow>(
    workflow: W,
    settings: &Settings,
    global: &GlobalOpts,
    layout: AuditLayout,
    defaults: ScanOptions,
) -> Result<(), CliError> {
    let console = Arc::new(Console::new(global.color));
    let audit = open_audit(&settings.audit, layout)?;
    let reporter = Reporter::new(console.clone(), audit);

    let mut session = ScanSession::new(Arc::new(workflow), reporter).with_defaults(defaults);
    session.connect().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    console.prompt();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if QUIT.contains(&input) {
            break;
        }
        if !input.is_empty() {
            session.scan(input).await;
        }
        console.prompt();
    }

    info!("scan session closed");
    Ok(())
}
