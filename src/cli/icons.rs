//! Styled markers for console output.

use console::{style, StyledObject};

use nasha::platform::{ColumnSource, Platform};

pub fn success() -> StyledObject<&'static str> {
    style("✓").green()
}

pub fn info() -> StyledObject<&'static str> {
    style("→").cyan()
}

pub fn warn() -> StyledObject<&'static str> {
    style("!").yellow()
}

pub fn error() -> StyledObject<&'static str> {
    style("✗").red()
}

pub fn bullet() -> StyledObject<&'static str> {
    style("•").dim()
}

/// Platform id as typed on the command line.
pub fn platform(platform: Platform) -> StyledObject<&'static str> {
    style(platform.id()).bold()
}

/// Where an output column's value comes from: `= "CONST"` or the field name.
pub fn column_source(source: ColumnSource) -> StyledObject<String> {
    let text = match source {
        ColumnSource::Const(value) => format!("= {:?}", value),
        ColumnSource::Field(field) => format!("{:?}", field),
    };
    style(text).dim()
}
