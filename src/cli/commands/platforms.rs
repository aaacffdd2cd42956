//! Platform listing command.

use nasha::platform::Platform;

use crate::cli::icons;

/// List supported platforms, optionally with their column layouts.
pub fn cmd_platforms(columns: bool) -> anyhow::Result<()> {
    for platform in Platform::ALL {
        let schema = platform.schema();
        println!(
            "{} {:<12} {} ({} columns)",
            icons::bullet(),
            icons::platform(platform),
            platform.display_name(),
            schema.len()
        );
        if !columns {
            continue;
        }
        for column in schema.columns {
            println!("    {:<40} {}", column.name, icons::column_source(column.source));
        }
    }
    Ok(())
}
