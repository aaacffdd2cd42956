//! Catalog conversion commands.

use std::path::{Path, PathBuf};

use anyhow::Context;

use nasha::catalog::read_table_file;
use nasha::config::Config;
use nasha::platform::Platform;
use nasha::services::{Pipeline, TransformOutput};

use crate::cli::helpers::{connect, read_upload, spawn_progress};
use crate::cli::icons;

/// Convert a catalog for one platform.
pub async fn cmd_transform(
    config: &Config,
    file: &Path,
    platform_id: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    // Validate before touching the backend.
    let platform = Platform::parse(platform_id)?;
    let bytes = read_upload(file).await?;
    let client = connect(config)?;

    println!(
        "{} Converting {} for {} via {} ({})",
        icons::info(),
        file.display(),
        platform.display_name(),
        config.llm.provider_name(),
        config.llm.model()
    );

    let (event_tx, progress) = spawn_progress("Transforming");
    let pipeline = Pipeline::new(&client, config.pipeline_options()).with_events(event_tx);
    let result = pipeline.transform_csv(&bytes, platform.id()).await;
    drop(pipeline);
    let _ = progress.await;
    let converted = result?;

    let path = output.unwrap_or_else(|| config.output_dir().join(&converted.file_name));
    write_output(&converted, &path).await
}

/// Convert a catalog for every platform with one round of backend calls.
pub async fn cmd_transform_all(config: &Config, file: &Path) -> anyhow::Result<()> {
    let table = read_table_file(file).await?;
    let client = connect(config)?;

    let (event_tx, progress) = spawn_progress("Transforming");
    let pipeline = Pipeline::new(&client, config.pipeline_options()).with_events(event_tx);
    let result = pipeline.transform_all(&table).await;
    drop(pipeline);
    let _ = progress.await;

    let dir = config.output_dir();
    for converted in result? {
        write_output(&converted, &dir.join(&converted.file_name)).await?;
    }
    Ok(())
}

async fn write_output(converted: &TransformOutput, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, &converted.csv)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "{} Wrote {} {} rows to {}",
        icons::success(),
        converted.records.len(),
        converted.platform.display_name(),
        path.display()
    );
    Ok(())
}
