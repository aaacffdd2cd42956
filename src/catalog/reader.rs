//! Upload decoding and CSV parsing.

use std::borrow::Cow;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use encoding_rs::{Encoding, UTF_8};
use tracing::{debug, warn};

use super::record::{CatalogTable, RawProductRecord};
use crate::services::PipelineError;

/// Decode uploaded bytes to text, honoring (and removing) a byte order mark.
///
/// UTF-8 is assumed when no BOM is present; invalid sequences are replaced
/// rather than rejected.
pub fn decode_table(bytes: &[u8]) -> Cow<'_, str> {
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .unwrap_or(UTF_8);
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!(
            "Upload contained invalid {} sequences; replaced with U+FFFD",
            used.name()
        );
    }
    text
}

/// Parse decoded CSV text into a catalog table.
///
/// Fails with `InvalidInput` when the header row is empty and with
/// `InputEmpty` when there are no data rows.
pub fn parse_table(text: &str) -> Result<CatalogTable, PipelineError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::Headers)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PipelineError::InvalidInput(format!("Failed to read CSV headers: {}", e)))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(PipelineError::InvalidInput(
            "CSV header row is empty".to_string(),
        ));
    }

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            PipelineError::InvalidInput(format!("Failed to parse CSV row {}: {}", index + 1, e))
        })?;

        // Blank lines inside flexible tables come through as a single empty field
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }

        rows.push(RawProductRecord::from_pairs(
            headers
                .iter()
                .enumerate()
                .filter(|(_, h)| !h.is_empty())
                .map(|(idx, h)| (h.clone(), record.get(idx).unwrap_or("").to_string())),
        ));
    }

    if rows.is_empty() {
        return Err(PipelineError::InputEmpty);
    }

    debug!("Parsed {} rows with {} columns", rows.len(), headers.len());
    Ok(CatalogTable::new(headers, rows))
}

/// Decode and parse an uploaded table.
pub fn read_table(bytes: &[u8]) -> Result<CatalogTable, PipelineError> {
    parse_table(&decode_table(bytes))
}

/// Read a table from disk.
pub async fn read_table_file(path: &Path) -> anyhow::Result<CatalogTable> {
    let bytes = tokio::fs::read(path).await?;
    Ok(read_table(&bytes)?)
}
