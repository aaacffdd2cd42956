//! Shared helper functions for CLI commands.

use std::path::Path;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use nasha::config::Config;
use nasha::llm::LlmClient;
use nasha::services::{PipelineError, PipelineEvent};

use super::icons;

/// Build the LLM client, failing fast when it cannot be used.
pub fn connect(config: &Config) -> anyhow::Result<LlmClient> {
    let client = LlmClient::new(config.llm.clone()).map_err(PipelineError::from)?;
    if let Err(e) = client.ensure_ready() {
        println!("{} {}", icons::error(), e);
        println!("  {}", config.llm.availability_hint());
        return Err(PipelineError::from(e).into());
    }
    Ok(client)
}

/// Read an uploaded catalog file.
pub async fn read_upload(path: &Path) -> anyhow::Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Spawn a task that renders pipeline events as a progress bar.
pub fn spawn_progress(label: &'static str) -> (mpsc::Sender<PipelineEvent>, JoinHandle<()>) {
    let (event_tx, mut event_rx) = mpsc::channel::<PipelineEvent>(100);

    let handle = tokio::spawn(async move {
        let mut bar: Option<ProgressBar> = None;
        while let Some(event) = event_rx.recv().await {
            match event {
                PipelineEvent::Started { rows, .. } => {
                    let progress = ProgressBar::new(rows as u64);
                    if let Ok(style) = ProgressStyle::default_bar()
                        .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
                    {
                        progress.set_style(style.progress_chars("█▓░"));
                    }
                    progress.set_message(label);
                    bar = Some(progress);
                }
                PipelineEvent::BatchStarted {
                    batch, batches, ..
                } => {
                    if let Some(ref progress) = bar {
                        progress.set_message(format!("{} batch {}/{}", label, batch + 1, batches));
                    }
                }
                PipelineEvent::BatchCompleted { rows, .. } => {
                    if let Some(ref progress) = bar {
                        progress.inc(rows as u64);
                    }
                }
                PipelineEvent::Complete { .. } => {
                    if let Some(progress) = bar.take() {
                        progress.finish_and_clear();
                    }
                }
            }
        }
        if let Some(progress) = bar {
            progress.abandon();
        }
    });

    (event_tx, handle)
}
