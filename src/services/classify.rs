//! Row classification into the product taxonomy.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::extract::{detect_weight, strain_type_from_name};
use super::PipelineError;
use crate::catalog::RawProductRecord;
use crate::llm::json_span::extract_array;
use crate::llm::prompts::CLASSIFY_PROMPT;
use crate::llm::{truncate_content, CapabilityRequest, CapabilityTask, TextCapability};
use crate::taxonomy::{self, MainCategory, StrainType};

/// Labels assigned to one input row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub main_category: MainCategory,
    /// Display name of a registry subcategory of `main_category`.
    pub subcategory: &'static str,
    pub strain_type: StrainType,
}

impl ClassificationResult {
    /// Keyword-only classification, used to pad short responses.
    pub fn guess(name: &str) -> Self {
        let (main_category, subcategory) = taxonomy::guess(name);
        Self {
            main_category,
            subcategory: subcategory.name,
            strain_type: strain_type_from_name(name),
        }
    }

    /// A five-pack name forces the five-pack category whatever the label.
    pub fn with_pack_override(self, name: &str) -> Self {
        let (_, is_five_pack) = detect_weight(name);
        if !is_five_pack || self.main_category == MainCategory::FivePackPreroll {
            return self;
        }
        let main = MainCategory::FivePackPreroll;
        Self {
            main_category: main,
            subcategory: taxonomy::resolve_subcategory(main, self.subcategory).name,
            ..self
        }
    }
}

/// One element of the classification response contract.
#[derive(Debug, Deserialize)]
struct RawLabel {
    #[serde(default)]
    category: String,
    #[serde(default)]
    subcategory: String,
    #[serde(default, rename = "type", alias = "strain_type")]
    strain_type: String,
}

impl RawLabel {
    /// Normalize free labels into registry values.
    ///
    /// Unknown categories fall back to the subcategory's owner, then to a
    /// keyword guess from the product name.
    fn resolve(&self, name: &str) -> ClassificationResult {
        let strain_type = StrainType::from_str(&self.strain_type)
            .unwrap_or_else(|| strain_type_from_name(name));

        let main = MainCategory::from_str(&self.category)
            .or_else(|| taxonomy::main_for_subcategory(&self.subcategory));
        let Some(main) = main else {
            debug!("Unknown category '{}' for '{}', guessing", self.category, name);
            return ClassificationResult {
                strain_type,
                ..ClassificationResult::guess(name)
            };
        };

        let label = if self.subcategory.trim().is_empty() {
            &self.category
        } else {
            &self.subcategory
        };
        ClassificationResult {
            main_category: main,
            subcategory: taxonomy::resolve_subcategory(main, label).name,
            strain_type,
        }
    }
}

/// Classifies batches of rows through the text capability.
pub struct RowClassifier<'a> {
    capability: &'a dyn TextCapability,
    max_tokens: u32,
    max_content_chars: usize,
}

impl<'a> RowClassifier<'a> {
    pub fn new(capability: &'a dyn TextCapability, max_tokens: u32, max_content_chars: usize) -> Self {
        Self {
            capability,
            max_tokens,
            max_content_chars,
        }
    }

    /// Classify one batch; output is index-aligned with `rows`.
    ///
    /// A short response is padded with keyword guesses and a long one is
    /// truncated, each with a warning. Names come from `name_column`, and a
    /// five-pack name overrides whatever category the label carried.
    pub async fn classify(
        &self,
        batch: usize,
        headers: &[String],
        rows: &[RawProductRecord],
        name_column: Option<&str>,
    ) -> Result<Vec<ClassificationResult>, PipelineError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let request = self.build_request(headers, rows)?;
        let response = self.capability.complete(&request).await?;
        let labels: Vec<RawLabel> = extract_array(&response)
            .map_err(|e| PipelineError::unparsable(CapabilityTask::Classify.as_str(), batch, e))?;

        if labels.len() != rows.len() {
            warn!(
                "Batch {}: expected {} classifications, got {}",
                batch,
                rows.len(),
                labels.len()
            );
        }

        let results = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let name = row.get_opt(name_column);
                let result = match labels.get(i) {
                    Some(label) => label.resolve(name),
                    None => ClassificationResult::guess(name),
                };
                result.with_pack_override(name)
            })
            .collect();
        Ok(results)
    }

    fn build_request(
        &self,
        headers: &[String],
        rows: &[RawProductRecord],
    ) -> Result<CapabilityRequest, PipelineError> {
        let products: Vec<serde_json::Map<String, serde_json::Value>> = rows
            .iter()
            .map(|row| {
                headers
                    .iter()
                    .map(|h| {
                        let value = truncate_content(row.get(h), self.max_content_chars);
                        (h.clone(), serde_json::Value::String(value.to_string()))
                    })
                    .collect()
            })
            .collect();
        let products = serde_json::to_string_pretty(&products)
            .map_err(|e| PipelineError::InvalidInput(e.to_string()))?;

        let prompt = CLASSIFY_PROMPT
            .replace("{taxonomy}", &taxonomy::describe())
            .replace("{headers}", &headers.join(", "))
            .replace("{count}", &rows.len().to_string())
            .replace("{products}", &products);

        Ok(CapabilityRequest {
            task: CapabilityTask::Classify,
            prompt,
            expected_items: rows.len(),
            max_tokens: self.max_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use async_trait::async_trait;

    struct Canned(Result<String, ()>);

    #[async_trait]
    impl TextCapability for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, request: &CapabilityRequest) -> Result<String, LlmError> {
            assert_eq!(request.task, CapabilityTask::Classify);
            self.0
                .clone()
                .map_err(|_| LlmError::Connection("refused".into()))
        }
    }

    fn rows(names: &[&str]) -> (Vec<String>, Vec<RawProductRecord>) {
        let headers = vec!["Product Name".to_string()];
        let rows = names
            .iter()
            .map(|n| RawProductRecord::from_pairs([("Product Name", *n)]))
            .collect();
        (headers, rows)
    }

    #[tokio::test]
    async fn test_classify_resolves_labels() {
        let capability = Canned(Ok(r#"```json
[{"category": "hash", "subcategory": "green unpressed hash", "type": "Sativa"}]
```"#
            .into()));
        let classifier = RowClassifier::new(&capability, 100, 4000);
        let (headers, rows) = rows(&["Jelly Donutz #117 Green Unpressed Hash (S)"]);
        let results = classifier
            .classify(0, &headers, &rows, Some("Product Name"))
            .await
            .unwrap();
        assert_eq!(
            results,
            vec![ClassificationResult {
                main_category: MainCategory::Hash,
                subcategory: "Green Unpressed Hash",
                strain_type: StrainType::Sativa,
            }]
        );
    }

    #[tokio::test]
    async fn test_short_response_is_padded() {
        let capability = Canned(Ok(
            r#"[{"category": "rosin", "subcategory": "Live Rosin", "type": "Indica"}]"#.into(),
        ));
        let classifier = RowClassifier::new(&capability, 100, 4000);
        let (headers, rows) = rows(&["Runtz Live Rosin 1g (I)", "Blue Dream Vape Cart 1g (S)"]);
        let results = classifier
            .classify(0, &headers, &rows, Some("Product Name"))
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].main_category, MainCategory::Vape);
        assert_eq!(results[1].strain_type, StrainType::Sativa);
    }

    #[tokio::test]
    async fn test_long_response_is_truncated() {
        let capability = Canned(Ok(r#"[{"category": "flower"}, {"category": "hash"}]"#.into()));
        let classifier = RowClassifier::new(&capability, 100, 4000);
        let (headers, rows) = rows(&["Runtz 3.5g"]);
        let results = classifier
            .classify(0, &headers, &rows, Some("Product Name"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].main_category, MainCategory::Flower);
        assert_eq!(results[0].subcategory, "Flower");
        assert_eq!(results[0].strain_type, StrainType::Hybrid);
    }

    #[tokio::test]
    async fn test_subcategory_slug_as_category() {
        let capability = Canned(Ok(r#"[{"category": "hash-bubble", "type": "hybrid"}]"#.into()));
        let classifier = RowClassifier::new(&capability, 100, 4000);
        let (headers, rows) = rows(&["Mystery"]);
        let results = classifier
            .classify(0, &headers, &rows, Some("Product Name"))
            .await
            .unwrap();
        assert_eq!(results[0].main_category, MainCategory::Hash);
        assert_eq!(results[0].subcategory, "Bubble Hash");
    }

    #[tokio::test]
    async fn test_unknown_category_guesses_from_name() {
        let capability = Canned(Ok(r#"[{"category": "edible", "subcategory": "gummy"}]"#.into()));
        let classifier = RowClassifier::new(&capability, 100, 4000);
        let (headers, rows) = rows(&["OG Pre-Roll 1g (I)"]);
        let results = classifier
            .classify(0, &headers, &rows, Some("Product Name"))
            .await
            .unwrap();
        assert_eq!(results[0].main_category, MainCategory::Preroll);
        assert_eq!(results[0].strain_type, StrainType::Indica);
    }

    #[tokio::test]
    async fn test_five_pack_name_overrides_label() {
        let capability = Canned(Ok(
            r#"[{"category": "preroll", "subcategory": "Infused Preroll", "type": "Hybrid"}]"#.into(),
        ));
        let classifier = RowClassifier::new(&capability, 100, 4000);
        let (headers, rows) = rows(&["5 Pack Live Rosin Prerolls 1g each"]);
        let results = classifier
            .classify(0, &headers, &rows, Some("Product Name"))
            .await
            .unwrap();
        assert_eq!(results[0].main_category, MainCategory::FivePackPreroll);
        assert_eq!(results[0].subcategory, "Infused Preroll 5-Pack");
        assert_eq!(results[0].strain_type, StrainType::Hybrid);
    }

    #[tokio::test]
    async fn test_prose_response_is_unparsable() {
        let capability = Canned(Ok("Sorry, I can't do that.".into()));
        let classifier = RowClassifier::new(&capability, 100, 4000);
        let (headers, rows) = rows(&["Runtz"]);
        let err = classifier
            .classify(4, &headers, &rows, Some("Product Name"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ResponseUnparsable { batch: 4, .. }
        ));
    }

    #[tokio::test]
    async fn test_call_failure_propagates() {
        let capability = Canned(Err(()));
        let classifier = RowClassifier::new(&capability, 100, 4000);
        let (headers, rows) = rows(&["Runtz"]);
        let err = classifier
            .classify(0, &headers, &rows, Some("Product Name"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::CapabilityCallFailure(_)));
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_call() {
        let capability = Canned(Err(()));
        let classifier = RowClassifier::new(&capability, 100, 4000);
        let results = classifier.classify(0, &[], &[], None).await.unwrap();
        assert!(results.is_empty());
    }
}
