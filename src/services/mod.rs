//! Service layer for catalog conversion.
//!
//! This module contains domain logic separated from UI concerns.
//! Services report progress through events so the CLI can render it.

pub mod classify;
mod error;
pub mod extract;
pub mod pipeline;

pub use classify::{ClassificationResult, RowClassifier};
pub use error::PipelineError;
pub use extract::{DescriptionSections, ExtractedAttributes, FieldExtractor};
pub use pipeline::{AnalysisSummary, Pipeline, PipelineEvent, PipelineOptions, TransformOutput};
