use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::json;
use tokio::io::{AsyncReadExt, BufReader};
use tracing::{info, warn};

use bdbridge::config::Config;
use bdbridge::host::{HostSession, drive_lines};
use bdbridge::protocol::Parser;
use bdbridge::sanitize::sanitize;
use bdbridge::settings::{
    FileSettings, MemorySettings, SettingsStore, load_debug_mode, save_debug_mode,
};

use crate::app::status::render_status;
use crate::cli::commands::{Cli, Commands};

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Replay {
            file,
            chunk_ms,
            url,
            debug,
            events,
        } => replay(&config, &file, chunk_ms, &url, debug, events).await,
        Commands::Watch { tick_ms, url } => watch(&config, tick_ms, &url).await,
        Commands::Sanitize { file } => {
            let input = read_input(file.as_deref()).await?;
            println!("{}", sanitize(&input));
            Ok(())
        }
        Commands::Scan { file } => {
            let input = read_input(file.as_deref()).await?;
            scan(&config, &input)
        }
        Commands::Debug { enable } => debug_mode(&config, enable),
        Commands::Status => {
            let store = open_settings(&config);
            println!("{}", render_status(&config, load_debug_mode(store.as_ref())));
            Ok(())
        }
    }
}

/// The file-backed store next to the config, or a throwaway one when that
/// file is unreadable.
fn open_settings(config: &Config) -> Box<dyn SettingsStore> {
    match FileSettings::open(&config.settings_path) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(path = %config.settings_path.display(), error = %e, "settings unavailable, using defaults");
            Box::new(MemorySettings::new())
        }
    }
}

async fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

async fn replay(
    config: &Config,
    file: &Path,
    chunk_ms: u64,
    url: &str,
    debug: bool,
    print_events: bool,
) -> Result<()> {
    let transcript = read_input(Some(file)).await?;
    let settings: Box<dyn SettingsStore> = if debug {
        let mut store = MemorySettings::new();
        save_debug_mode(&mut store, true)?;
        Box::new(store)
    } else {
        open_settings(config)
    };

    let mut session = HostSession::new(config, settings, url)?;
    let mut chunks = 0;
    for line in transcript.lines().filter(|line| !line.trim().is_empty()) {
        session.append_output(line)?;
        session.advance(chunk_ms);
        chunks += 1;
    }
    session.settle();
    info!(chunks, widgets = session.bridge().widgets().len(), "replay finished");

    println!("{}", session.visible_text());
    if let Some(html) = session.widget_bar_html() {
        println!("{html}");
    }
    if print_events {
        for event in session.take_events() {
            println!("{}", serde_json::to_string(&event)?);
        }
    }
    session.teardown();
    Ok(())
}

async fn watch(config: &Config, tick_ms: u64, url: &str) -> Result<()> {
    let mut session = HostSession::new(config, open_settings(config), url)?;
    let reader = BufReader::new(tokio::io::stdin());
    let mut written = 0usize;
    let fed = drive_lines(
        &mut session,
        reader,
        Duration::from_millis(tick_ms.max(1)),
        |event| match serde_json::to_string(event) {
            Ok(line) => {
                println!("{line}");
                written += 1;
            }
            Err(e) => warn!(error = %e, "could not serialize event"),
        },
    )
    .await?;
    info!(lines = fed, events = written, "watch finished");
    session.teardown();
    Ok(())
}

fn scan(config: &Config, input: &str) -> Result<()> {
    let parser = Parser::new(
        config.protocol.max_message_bytes,
        &config.protocol.supported_version,
    );
    for parsed in parser.parse_text(input) {
        let line = match &parsed.outcome {
            Ok(envelope) => json!({
                "start": parsed.span.range.start,
                "end": parsed.span.range.end,
                "fingerprint": parsed.fingerprint,
                "ok": true,
                "type": envelope.message.message_type(),
                "version": envelope.version,
            }),
            Err(e) => json!({
                "start": parsed.span.range.start,
                "end": parsed.span.range.end,
                "fingerprint": parsed.fingerprint,
                "ok": false,
                "error": e.kind(),
                "message": e.to_string(),
            }),
        };
        println!("{line}");
    }
    Ok(())
}

fn debug_mode(config: &Config, enable: Option<bool>) -> Result<()> {
    let enabled = match enable {
        Some(enabled) => store_debug_mode(&config.settings_path, enabled)?,
        None => load_debug_mode(open_settings(config).as_ref()),
    };
    println!("debug mode: {}", if enabled { "on" } else { "off" });
    Ok(())
}

/// Persist the flag to the settings file. Unlike reads, this never falls
/// back to a memory store.
fn store_debug_mode(path: &Path, enabled: bool) -> Result<bool> {
    let mut store = FileSettings::open(path)
        .with_context(|| format!("Failed to open settings at {}", path.display()))?;
    save_debug_mode(&mut store, enabled)
        .with_context(|| format!("Failed to save settings to {}", path.display()))?;
    info!(enabled, path = %path.display(), "debug mode saved");
    Ok(load_debug_mode(&store))
}
