//! Configuration commands.

use console::style;

use nasha::config::Config;

use crate::cli::icons;

/// Print the effective configuration as JSON.
///
/// Device settings come from the environment and are listed separately,
/// with the API key redacted.
pub fn cmd_config_show(config: &Config) -> anyhow::Result<()> {
    match config.source_path {
        Some(ref path) => println!("{} Loaded from {}", icons::info(), path.display()),
        None => println!("{} No config file found, using defaults", icons::warn()),
    }

    println!("\n{}", style("Config").bold());
    println!("{}", serde_json::to_string_pretty(&serde_json::json!({
        "llm": config.llm.app,
        "batch": config.batch,
        "brand": config.brand,
        "output_dir": config.output_dir().display().to_string(),
    }))?);

    let llm = &config.llm;
    println!("\n{}", style("LLM device (environment)").bold());
    println!("{:<20} {}", "Provider:", llm.provider_name());
    println!("{:<20} {}", "Endpoint:", llm.endpoint());
    println!("{:<20} {}", "Model:", llm.model());
    println!(
        "{:<20} {}",
        "API Key:",
        if llm.api_key().is_some() { "********" } else { "Not set" }
    );
    Ok(())
}
