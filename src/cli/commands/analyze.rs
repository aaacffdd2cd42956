//! Catalog analysis command.

use std::path::Path;

use console::style;

use nasha::config::Config;
use nasha::services::Pipeline;

use crate::cli::helpers::{connect, read_upload, spawn_progress};
use crate::cli::icons;

/// Classify every row and print the subcategory histogram.
pub async fn cmd_analyze(config: &Config, file: &Path, json: bool) -> anyhow::Result<()> {
    let bytes = read_upload(file).await?;
    let client = connect(config)?;

    let (event_tx, progress) = spawn_progress("Classifying");
    let pipeline = Pipeline::new(&client, config.pipeline_options()).with_events(event_tx);
    let result = pipeline.analyze_csv(&bytes).await;
    drop(pipeline);
    let _ = progress.await;
    let summary = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "{} Analyzed {} products from {}",
        icons::success(),
        summary.total_count,
        file.display()
    );
    println!("\n{}", style("Subcategories").bold());
    println!("{}", "-".repeat(40));
    let mut counts: Vec<(&String, &usize)> = summary.categories.iter().collect();
    counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (label, count) in counts {
        println!("{} {:<32} {:>5}", icons::bullet(), label, count);
    }
    Ok(())
}
