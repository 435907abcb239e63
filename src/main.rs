//! CLI entry point — record one voice sample and print the base64 WAV.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create session channels (`command`, `event`).
//! 4. Spawn the [`SessionRunner`] on the tokio runtime.
//! 5. Send `Start`; Ctrl-C stops the recording early (the truncated clip is
//!    still encoded).
//! 6. On `SampleReady`, print the base64 payload to stdout and exit 0; on
//!    `Failed`, exit 1.

use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::sync::mpsc;

use voice_sample::audio::MicSource;
use voice_sample::config::AppConfig;
use voice_sample::session::{SessionCommand, SessionEvent, SessionRunner};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("voice-sample starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    let source = match &config.capture.device {
        Some(name) => MicSource::named(name.clone()),
        None => MicSource::default_device(),
    };

    // 3. Channel setup
    let (command_tx, command_rx) = mpsc::channel::<SessionCommand>(16);
    let (event_tx, mut event_rx) = mpsc::channel::<SessionEvent>(32);

    // 4. Session runner
    let runner = SessionRunner::new(Arc::new(source), config.capture.clone());
    tokio::spawn(runner.run(command_rx, event_tx));

    // 5. Start recording; Ctrl-C stops early.
    log::info!(
        "recording up to {} ms — press Ctrl-C to stop early",
        config.capture.duration_ms
    );
    command_tx.send(SessionCommand::Start).await?;

    let ctrl_c_tx = command_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Ctrl-C — stopping recording");
            let _ = ctrl_c_tx.send(SessionCommand::Stop).await;
        }
    });

    // 6. Wait for the outcome.
    while let Some(event) = event_rx.recv().await {
        match event {
            SessionEvent::RecordingStarted => {
                log::info!("recording…");
            }
            SessionEvent::RecordingStopped { duration_secs } => {
                log::info!("recording stopped after {duration_secs:.2}s");
            }
            SessionEvent::SampleReady(sample) => {
                log::info!(
                    "encoded {} samples @ {} Hz ({} base64 chars)",
                    sample.sample_count,
                    sample.sample_rate,
                    sample.base64.len()
                );
                println!("{}", sample.base64);
                return Ok(());
            }
            SessionEvent::Failed { message } => {
                bail!("capture failed: {message}");
            }
        }
    }

    bail!("session ended without producing a sample");
}
