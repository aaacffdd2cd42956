//! Target listing platforms and their import schemas.

mod mapper;
mod schema;

use std::fmt;

pub use mapper::{category_slug, product_url_slug, MappingInput, SchemaMapper};
pub use schema::{conform, Column, ColumnSource, Field, PlatformSchema, TargetRecord};

use crate::services::PipelineError;

/// A listing platform that accepts a fixed-column CSV import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Weedmaps,
    IHeartJane,
    Leafly,
    Squarespace,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Weedmaps,
        Platform::IHeartJane,
        Platform::Leafly,
        Platform::Squarespace,
    ];

    /// Stable identifier used on the command line and in file names.
    pub fn id(&self) -> &'static str {
        match self {
            Platform::Weedmaps => "weedmaps",
            Platform::IHeartJane => "iheartjane",
            Platform::Leafly => "leafly",
            Platform::Squarespace => "squarespace",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Weedmaps => "Weedmaps",
            Platform::IHeartJane => "I Heart Jane",
            Platform::Leafly => "Leafly",
            Platform::Squarespace => "Squarespace",
        }
    }

    /// Parse a platform identifier, case-insensitive.
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match normalized.as_str() {
            "weedmaps" => Some(Platform::Weedmaps),
            "iheartjane" | "jane" => Some(Platform::IHeartJane),
            "leafly" => Some(Platform::Leafly),
            "squarespace" => Some(Platform::Squarespace),
            _ => None,
        }
    }

    /// Resolve an identifier or fail with `UnknownPlatform`.
    pub fn parse(s: &str) -> Result<Self, PipelineError> {
        Self::from_str(s).ok_or_else(|| PipelineError::UnknownPlatform(s.to_string()))
    }

    pub fn schema(&self) -> &'static PlatformSchema {
        schema::schema_for(*self)
    }

    /// Output file name, e.g. `Nasha_weedmaps.csv`.
    pub fn output_file_name(&self, prefix: &str) -> String {
        format!("{}_{}.csv", prefix, self.id())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
