//! LLM-related commands.

use console::style;

use nasha::config::Config;
use nasha::llm::LlmClient;

use crate::cli::icons;

/// Show the configured backend and whether it answers.
pub async fn cmd_llm_status(config: &Config) -> anyhow::Result<()> {
    let llm = &config.llm;

    println!("\n{}", style("LLM Configuration").bold());
    println!("{}", "-".repeat(40));
    println!("{:<20} {}", "Enabled:", if llm.enabled() { "Yes" } else { "No" });
    println!("{:<20} {}", "Provider:", llm.provider_name());
    println!("{:<20} {}", "Endpoint:", llm.endpoint());
    println!(
        "{:<20} {}",
        "API Key:",
        if llm.api_key().is_some() { "Set" } else { "Not set" }
    );
    println!("{:<20} {}", "Model:", llm.model());
    println!("{:<20} {}", "Max Tokens:", llm.app.max_tokens);
    println!("{:<20} {:.2}", "Temperature:", llm.temperature());

    let client = LlmClient::new(llm.clone())?;
    if client.is_available().await {
        println!("\n{} Backend reachable", icons::success());
    } else {
        println!("\n{} {}", icons::warn(), llm.availability_hint());
    }
    Ok(())
}
