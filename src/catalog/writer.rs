//! Delimited output serialization.

use csv::{QuoteStyle, WriterBuilder};

use crate::services::PipelineError;

/// Serialize a header row plus data rows as CSV bytes.
///
/// Every row must already be ordered like `headers`; the writer does not
/// reorder or backfill.
pub fn write_table<'a, I>(headers: &[&str], rows: I) -> Result<Vec<u8>, PipelineError>
where
    I: IntoIterator<Item = Vec<&'a str>>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer
        .write_record(headers)
        .map_err(|e| PipelineError::Output(e.to_string()))?;

    for (index, row) in rows.into_iter().enumerate() {
        if row.len() != headers.len() {
            return Err(PipelineError::Output(format!(
                "row {} has {} fields, expected {}",
                index + 1,
                row.len(),
                headers.len()
            )));
        }
        writer
            .write_record(&row)
            .map_err(|e| PipelineError::Output(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| PipelineError::Output(e.to_string()))
}
