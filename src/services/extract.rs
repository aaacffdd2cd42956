//! Attribute extraction from product names and descriptions.
//!
//! Names are handled with deterministic rules (strain markers, weights,
//! five-pack detection, vocabulary stripping). Descriptions that follow the
//! `LABEL: value` convention are split locally; anything else is handed to
//! the text capability in batches.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::PipelineError;
use crate::catalog::SECTION_LABEL;
use crate::llm::json_span::extract_array;
use crate::llm::prompts::EXTRACT_PROMPT;
use crate::llm::{truncate_content, CapabilityRequest, CapabilityTask, TextCapability};
use crate::taxonomy::{self, StrainType};

/// Recognized pack weights, matched in order of appearance.
static WEIGHT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|[^\d.])(0\.5|1|3\.5|7|14)\s?g\b").unwrap());

/// Any weight-like token, stripped from clean names.
static ANY_WEIGHT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b\d+(?:\.\d+)?\s?(?:g|mg|oz)\b").unwrap());

static FIVE_PACK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b5[ -]packs?\b").unwrap());

static STRAIN_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((?:S|I|H)\)").unwrap());

static VOCABULARY: LazyLock<Regex> = LazyLock::new(|| {
    let words: Vec<String> = taxonomy::product_vocabulary()
        .iter()
        .map(|w| regex::escape(w))
        .collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", words.join("|"))).unwrap()
});

static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

const FIVE_PACK_WEIGHT: &str = "2.5g";

const TRIM_CHARS: &[char] = &['-', '–', '—', '|', ',', ':', ';', '/', '.', '·', '+'];

/// Separators left dangling before the next label in flattened text.
const VALUE_TRIM: &[char] = &[',', ';', '|', '-', '*', '•'];

/// Labeled parts of a product description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptionSections {
    pub lineage: String,
    pub taste: String,
    pub feeling: String,
    pub farm: String,
    pub place_grown: String,
    /// Unlabeled remainder of the description.
    #[serde(alias = "marketing_text")]
    pub marketing: String,
}

impl DescriptionSections {
    /// Split a description following the `LABEL: value` convention.
    ///
    /// Labels may appear in any order and any case, one per line or run
    /// together on a single line. A value ends at the next label or at the
    /// end of its line; later lines without a label are marketing. Returns
    /// `None` when the text has no label at all.
    pub fn parse_labeled(text: &str) -> Option<Self> {
        let labels: Vec<(usize, usize, String)> = SECTION_LABEL
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let label = caps.get(1)?;
                Some((whole.start(), whole.end(), label.as_str().to_lowercase()))
            })
            .collect();
        let &(first, _, _) = labels.first()?;

        let mut sections = Self::default();
        let mut marketing = Vec::new();
        push_lines(&mut marketing, &text[..first]);

        for (i, (_, end, label)) in labels.iter().enumerate() {
            let stop = labels.get(i + 1).map_or(text.len(), |(start, _, _)| *start);
            let segment = &text[*end..stop];
            let (value, rest) = segment.split_once('\n').unwrap_or((segment, ""));
            let value = value
                .trim()
                .trim_end_matches(|c: char| c.is_whitespace() || VALUE_TRIM.contains(&c));

            let slot = match label.as_str() {
                "lineage" => &mut sections.lineage,
                "taste" => &mut sections.taste,
                "feeling" => &mut sections.feeling,
                "farm" => &mut sections.farm,
                _ => &mut sections.place_grown,
            };
            if slot.is_empty() {
                *slot = value.to_string();
            }
            push_lines(&mut marketing, rest);
        }

        sections.marketing = marketing.join("\n");
        Some(sections)
    }

    fn has_labels(&self) -> bool {
        [
            &self.lineage,
            &self.taste,
            &self.feeling,
            &self.farm,
            &self.place_grown,
        ]
        .iter()
        .any(|v| !v.is_empty())
    }

    /// Overlay non-empty values from a delegated extraction.
    ///
    /// When the delegated result decomposed the text into labels but left
    /// marketing empty, the raw text no longer counts as marketing.
    fn merge(&mut self, delegated: DescriptionSections) {
        let decomposed = delegated.has_labels();
        let overlay = |slot: &mut String, value: String| {
            let value = value.trim();
            if !value.is_empty() {
                *slot = value.to_string();
            }
        };
        overlay(&mut self.lineage, delegated.lineage);
        overlay(&mut self.taste, delegated.taste);
        overlay(&mut self.feeling, delegated.feeling);
        overlay(&mut self.farm, delegated.farm);
        overlay(&mut self.place_grown, delegated.place_grown);
        if !delegated.marketing.trim().is_empty() {
            self.marketing = delegated.marketing.trim().to_string();
        } else if decomposed {
            self.marketing.clear();
        }
    }
}

/// Non-empty lines of `text`, skipping bare bullet markers.
fn push_lines<'t>(out: &mut Vec<&'t str>, text: &'t str) {
    out.extend(
        text.lines()
            .map(str::trim)
            .filter(|line| !line.trim_matches(VALUE_TRIM).trim().is_empty()),
    );
}

/// Structured attributes derived from one product row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedAttributes {
    pub lineage: String,
    pub taste: String,
    pub feeling: String,
    pub farm: String,
    pub place_grown: String,
    pub marketing_text: String,
    pub clean_strain_name: String,
    /// Canonical weight such as `3.5g`, empty when none was found.
    pub weight: String,
    pub is_five_pack: bool,
    pub strain_type: StrainType,
    /// Description did not follow the labeled convention.
    #[serde(skip)]
    pub needs_delegation: bool,
}

impl ExtractedAttributes {
    /// Deterministic extraction from a name and description.
    pub fn from_local(name: &str, description: &str) -> Self {
        let (weight, is_five_pack) = detect_weight(name);
        let (sections, needs_delegation) = match DescriptionSections::parse_labeled(description) {
            Some(sections) => (sections, false),
            None => (
                DescriptionSections {
                    marketing: description.trim().to_string(),
                    ..Default::default()
                },
                !description.trim().is_empty(),
            ),
        };

        let mut attrs = Self {
            weight,
            is_five_pack,
            strain_type: strain_type_from_name(name),
            needs_delegation,
            ..Default::default()
        };
        attrs.apply_sections(name, sections);
        attrs
    }

    fn sections(&self) -> DescriptionSections {
        DescriptionSections {
            lineage: self.lineage.clone(),
            taste: self.taste.clone(),
            feeling: self.feeling.clone(),
            farm: self.farm.clone(),
            place_grown: self.place_grown.clone(),
            marketing: self.marketing_text.clone(),
        }
    }

    fn apply_sections(&mut self, name: &str, sections: DescriptionSections) {
        self.clean_strain_name = clean_strain_name(name, &sections.farm);
        self.lineage = sections.lineage;
        self.taste = sections.taste;
        self.feeling = sections.feeling;
        self.farm = sections.farm;
        self.place_grown = sections.place_grown;
        self.marketing_text = sections.marketing;
    }

    /// Merge a delegated extraction over the local result.
    pub fn merge_delegated(&mut self, name: &str, delegated: DescriptionSections) {
        let mut sections = self.sections();
        sections.merge(delegated);
        self.apply_sections(name, sections);
        self.needs_delegation = false;
    }
}

/// Strain type from the literal `(S)`, `(I)`, `(H)` markers.
///
/// Sativa wins over Indica, Indica over Hybrid; no marker means Hybrid.
pub fn strain_type_from_name(name: &str) -> StrainType {
    if name.contains("(S)") {
        StrainType::Sativa
    } else if name.contains("(I)") {
        StrainType::Indica
    } else {
        StrainType::Hybrid
    }
}

/// Detect the pack weight and five-pack flag from a product name.
///
/// A five-pack always weighs 2.5g; otherwise the first recognized weight
/// token by position is used.
pub fn detect_weight(name: &str) -> (String, bool) {
    if FIVE_PACK.is_match(name) {
        return (FIVE_PACK_WEIGHT.to_string(), true);
    }
    let weight = WEIGHT
        .captures(name)
        .map(|caps| format!("{}g", &caps[1]))
        .unwrap_or_default();
    (weight, false)
}

/// Strip markers, product vocabulary, weights, pack counts and the farm name.
pub fn clean_strain_name(name: &str, farm: &str) -> String {
    let mut cleaned = STRAIN_MARKER.replace_all(name, " ").into_owned();
    cleaned = FIVE_PACK.replace_all(&cleaned, " ").into_owned();
    cleaned = VOCABULARY.replace_all(&cleaned, " ").into_owned();
    cleaned = ANY_WEIGHT.replace_all(&cleaned, " ").into_owned();

    let farm = farm.trim();
    if !farm.is_empty() {
        // Whole words only, so farm "Sun" leaves "Sunset" alone.
        let edge = |c: Option<char>| match c {
            Some(c) if c.is_alphanumeric() || c == '_' => r"\b",
            _ => "",
        };
        let pattern = format!(
            r"(?i){}{}{}",
            edge(farm.chars().next()),
            regex::escape(farm),
            edge(farm.chars().last())
        );
        if let Ok(re) = Regex::new(&pattern) {
            cleaned = re.replace_all(&cleaned, " ").into_owned();
        }
    }

    cleaned = cleaned.replace("()", " ");
    let collapsed = SPACES.replace_all(&cleaned, " ");
    collapsed
        .trim_matches(|c: char| c.is_whitespace() || TRIM_CHARS.contains(&c))
        .to_string()
}

#[derive(Debug, Serialize)]
struct DelegatedItem<'a> {
    name: &'a str,
    description: &'a str,
}

/// Batched extraction over the text capability.
pub struct FieldExtractor<'a> {
    capability: &'a dyn TextCapability,
    max_tokens: u32,
    max_content_chars: usize,
}

impl<'a> FieldExtractor<'a> {
    pub fn new(capability: &'a dyn TextCapability, max_tokens: u32, max_content_chars: usize) -> Self {
        Self {
            capability,
            max_tokens,
            max_content_chars,
        }
    }

    /// Extract attributes for a batch of `(name, description)` rows.
    ///
    /// Only rows whose description deviates from the labeled convention are
    /// sent to the capability, in a single request. A response whose length
    /// differs from the number of delegated rows fails the batch.
    pub async fn extract_batch(
        &self,
        batch: usize,
        rows: &[(&str, &str)],
    ) -> Result<Vec<ExtractedAttributes>, PipelineError> {
        let mut attrs: Vec<ExtractedAttributes> = rows
            .iter()
            .map(|(name, description)| ExtractedAttributes::from_local(name, description))
            .collect();

        let pending: Vec<usize> = attrs
            .iter()
            .enumerate()
            .filter(|(_, a)| a.needs_delegation)
            .map(|(i, _)| i)
            .collect();
        if pending.is_empty() {
            return Ok(attrs);
        }

        debug!(
            "Batch {}: delegating {} of {} descriptions",
            batch,
            pending.len(),
            rows.len()
        );
        let items: Vec<DelegatedItem> = pending
            .iter()
            .map(|&i| DelegatedItem {
                name: rows[i].0,
                description: truncate_content(rows[i].1, self.max_content_chars),
            })
            .collect();
        let request = self.build_request(&items)?;
        let response = self.capability.complete(&request).await?;

        let delegated: Vec<DescriptionSections> = extract_array(&response)
            .map_err(|e| PipelineError::unparsable(CapabilityTask::Extract.as_str(), batch, e))?;
        if delegated.len() != pending.len() {
            warn!(
                "Batch {}: expected {} extractions, got {}",
                batch,
                pending.len(),
                delegated.len()
            );
            return Err(PipelineError::ResponseUnparsable {
                task: CapabilityTask::Extract.as_str(),
                batch,
                reason: format!(
                    "expected {} items, got {}",
                    pending.len(),
                    delegated.len()
                ),
            });
        }

        for (index, sections) in pending.into_iter().zip(delegated) {
            attrs[index].merge_delegated(rows[index].0, sections);
        }
        Ok(attrs)
    }

    fn build_request(&self, items: &[DelegatedItem<'_>]) -> Result<CapabilityRequest, PipelineError> {
        let products = serde_json::to_string_pretty(items)
            .map_err(|e| PipelineError::InvalidInput(e.to_string()))?;
        let prompt = EXTRACT_PROMPT
            .replace("{count}", &items.len().to_string())
            .replace("{products}", &products);
        Ok(CapabilityRequest {
            task: CapabilityTask::Extract,
            prompt,
            expected_items: items.len(),
            max_tokens: self.max_tokens,
        })
    }
}
