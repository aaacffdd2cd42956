use thiserror::Error;

use crate::llm::json_span::JsonSpanError;
use crate::llm::LlmError;

/// Errors surfaced by a pipeline request.
///
/// Any error aborts the whole request; no partial output is produced.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Upload has a header but no data rows
    #[error("No data found in CSV")]
    InputEmpty,
    /// Upload could not be parsed as delimited text
    #[error("Invalid CSV: {0}")]
    InvalidInput(String),
    /// Requested platform id is not registered
    #[error("Unsupported platform '{0}'. Available: weedmaps, iheartjane, leafly, squarespace")]
    UnknownPlatform(String),
    /// Text capability is not configured or disabled
    #[error("Text capability unavailable: {0}")]
    CapabilityUnavailable(String),
    /// Text capability call failed (network, quota, backend error)
    #[error("Text capability call failed: {0}")]
    CapabilityCallFailure(String),
    /// Response carried no JSON array matching the expected contract
    #[error("Unparsable {task} response for batch {batch}: {reason}")]
    ResponseUnparsable {
        task: &'static str,
        batch: usize,
        reason: String,
    },
    /// Output table could not be serialized
    #[error("Failed to write output: {0}")]
    Output(String),
}

impl PipelineError {
    pub(crate) fn unparsable(task: &'static str, batch: usize, err: JsonSpanError) -> Self {
        PipelineError::ResponseUnparsable {
            task,
            batch,
            reason: err.to_string(),
        }
    }
}

impl From<LlmError> for PipelineError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Disabled | LlmError::MissingCredentials(_) => {
                PipelineError::CapabilityUnavailable(err.to_string())
            }
            LlmError::Connection(_) | LlmError::Api(_) | LlmError::Parse(_) => {
                PipelineError::CapabilityCallFailure(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error_mapping() {
        assert!(matches!(
            PipelineError::from(LlmError::Disabled),
            PipelineError::CapabilityUnavailable(_)
        ));
        assert!(matches!(
            PipelineError::from(LlmError::MissingCredentials("ANTHROPIC_API_KEY".into())),
            PipelineError::CapabilityUnavailable(_)
        ));
        assert!(matches!(
            PipelineError::from(LlmError::Api("HTTP 500".into())),
            PipelineError::CapabilityCallFailure(_)
        ));
    }

    #[test]
    fn test_messages() {
        assert_eq!(PipelineError::InputEmpty.to_string(), "No data found in CSV");
        let err = PipelineError::unparsable("classify", 2, JsonSpanError::NoArray);
        assert_eq!(
            err.to_string(),
            "Unparsable classify response for batch 2: no JSON array found in response"
        );
        assert!(PipelineError::UnknownPlatform("myspace".into())
            .to_string()
            .contains("weedmaps"));
    }
}
