//! Locate and parse the JSON array embedded in free-form model output.
//!
//! Responses may wrap the array in prose or code fences. The greedy span from
//! the first `[` to the last `]` is tried first; when that does not parse
//! (e.g. trailing commentary containing brackets), each balanced `[...]` span
//! is tried in order.

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum JsonSpanError {
    #[error("no JSON array found in response")]
    NoArray,
    #[error("JSON array did not match the expected contract: {0}")]
    Invalid(String),
}

/// Return the first parseable `[...]` span as raw text.
pub fn find_array_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end > start {
        let greedy = &text[start..=end];
        if serde_json::from_str::<serde_json::Value>(greedy).is_ok() {
            return Some(greedy);
        }
    }

    text.match_indices('[')
        .filter_map(|(idx, _)| balanced_span(&text[idx..]))
        .find(|span| serde_json::from_str::<serde_json::Value>(span).is_ok())
}

/// Parse the first JSON array in `text` into `Vec<T>`.
pub fn extract_array<T: DeserializeOwned>(text: &str) -> Result<Vec<T>, JsonSpanError> {
    let span = match find_array_span(text) {
        Some(span) => span,
        None if text.contains('[') => {
            return Err(JsonSpanError::Invalid("array span is not valid JSON".to_string()))
        }
        None => return Err(JsonSpanError::NoArray),
    };
    serde_json::from_str(span).map_err(|e| JsonSpanError::Invalid(e.to_string()))
}

/// Span of a bracket-balanced array starting at the beginning of `text`,
/// ignoring brackets inside JSON strings.
fn balanced_span(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }
    None
}
