//! Request orchestration: read, classify, extract, map, write.
//!
//! Batches run sequentially and any batch failure aborts the request, so a
//! caller either gets a complete output table or an error.

use std::collections::BTreeMap;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{ClassificationResult, ExtractedAttributes, FieldExtractor, PipelineError, RowClassifier};
use crate::catalog::{read_table, write_table, CatalogTable, ColumnMap};
use crate::llm::TextCapability;
use crate::platform::{MappingInput, Platform, SchemaMapper, TargetRecord};

/// Events emitted while a request runs.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// Request accepted
    Started { rows: usize, batches: usize },
    /// Batch sent to the text capability
    BatchStarted {
        batch: usize,
        batches: usize,
        rows: usize,
    },
    /// Batch labeled and extracted
    BatchCompleted { batch: usize, rows: usize },
    /// All rows processed
    Complete { rows: usize },
}

/// Tunables for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Rows per classification request when analyzing.
    pub classify_batch_size: usize,
    /// Rows per classification + extraction round when transforming.
    pub transform_batch_size: usize,
    pub classify_max_tokens: u32,
    pub extract_max_tokens: u32,
    pub max_content_chars: usize,
    pub brand: String,
    pub file_prefix: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            classify_batch_size: 20,
            transform_batch_size: 10,
            classify_max_tokens: 1000,
            extract_max_tokens: 1500,
            max_content_chars: 4000,
            brand: "Nasha".to_string(),
            file_prefix: "Nasha".to_string(),
        }
    }
}

/// Frequency of subcategory labels across an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub total_count: usize,
    pub categories: BTreeMap<String, usize>,
}

/// One platform's converted table.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub platform: Platform,
    pub file_name: String,
    pub records: Vec<TargetRecord>,
    /// Serialized CSV, header row first.
    pub csv: Vec<u8>,
}

/// A classified and extracted product row.
struct Enriched {
    classification: ClassificationResult,
    attributes: ExtractedAttributes,
}

/// Drives analyze and transform requests against a text capability.
pub struct Pipeline<'a> {
    capability: &'a dyn TextCapability,
    options: PipelineOptions,
    events: Option<mpsc::Sender<PipelineEvent>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(capability: &'a dyn TextCapability, options: PipelineOptions) -> Self {
        Self {
            capability,
            options,
            events: None,
        }
    }

    /// Report progress on `events`.
    pub fn with_events(mut self, events: mpsc::Sender<PipelineEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    async fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }

    /// Analyze raw upload bytes.
    pub async fn analyze_csv(&self, bytes: &[u8]) -> Result<AnalysisSummary, PipelineError> {
        let table = read_table(bytes)?;
        self.analyze(&table).await
    }

    /// Convert raw upload bytes for the platform named `platform_id`.
    ///
    /// The platform is validated before the upload is read.
    pub async fn transform_csv(
        &self,
        bytes: &[u8],
        platform_id: &str,
    ) -> Result<TransformOutput, PipelineError> {
        let platform = Platform::parse(platform_id)?;
        let table = read_table(bytes)?;
        self.transform(&table, platform).await
    }

    /// Classify every row and count subcategory labels.
    pub async fn analyze(&self, table: &CatalogTable) -> Result<AnalysisSummary, PipelineError> {
        if table.is_empty() {
            return Err(PipelineError::InputEmpty);
        }
        let columns = table.columns();
        let classifier = self.classifier();
        let size = self.options.classify_batch_size.max(1);
        let batches = table.len().div_ceil(size);

        info!(
            "Analyzing {} rows in {} batches via {}",
            table.len(),
            batches,
            self.capability.name()
        );
        self.emit(PipelineEvent::Started {
            rows: table.len(),
            batches,
        })
        .await;

        let mut summary = AnalysisSummary {
            total_count: table.len(),
            categories: BTreeMap::new(),
        };
        for (batch, rows) in table.rows.chunks(size).enumerate() {
            self.emit(PipelineEvent::BatchStarted {
                batch,
                batches,
                rows: rows.len(),
            })
            .await;
            let results = classifier
                .classify(batch, &table.headers, rows, columns.name.as_deref())
                .await?;
            for result in results {
                *summary
                    .categories
                    .entry(result.subcategory.to_string())
                    .or_insert(0) += 1;
            }
            self.emit(PipelineEvent::BatchCompleted {
                batch,
                rows: rows.len(),
            })
            .await;
        }

        self.emit(PipelineEvent::Complete { rows: table.len() }).await;
        Ok(summary)
    }

    /// Convert a table into one platform's schema.
    pub async fn transform(
        &self,
        table: &CatalogTable,
        platform: Platform,
    ) -> Result<TransformOutput, PipelineError> {
        let columns = table.columns();
        let enriched = self.enrich(table, &columns).await?;
        self.render(table, &columns, &enriched, platform)
    }

    /// Convert a table into every platform's schema with one round of
    /// capability calls.
    pub async fn transform_all(
        &self,
        table: &CatalogTable,
    ) -> Result<Vec<TransformOutput>, PipelineError> {
        let columns = table.columns();
        let enriched = self.enrich(table, &columns).await?;
        Platform::ALL
            .iter()
            .map(|platform| self.render(table, &columns, &enriched, *platform))
            .collect()
    }

    fn classifier(&self) -> RowClassifier<'a> {
        RowClassifier::new(
            self.capability,
            self.options.classify_max_tokens,
            self.options.max_content_chars,
        )
    }

    async fn enrich(
        &self,
        table: &CatalogTable,
        columns: &ColumnMap,
    ) -> Result<Vec<Enriched>, PipelineError> {
        if table.is_empty() {
            return Err(PipelineError::InputEmpty);
        }
        debug!("Sniffed columns: {:?}", columns);

        let classifier = self.classifier();
        let extractor = FieldExtractor::new(
            self.capability,
            self.options.extract_max_tokens,
            self.options.max_content_chars,
        );
        let size = self.options.transform_batch_size.max(1);
        let batches = table.len().div_ceil(size);

        info!(
            "Transforming {} rows in {} batches via {}",
            table.len(),
            batches,
            self.capability.name()
        );
        self.emit(PipelineEvent::Started {
            rows: table.len(),
            batches,
        })
        .await;

        let mut enriched = Vec::with_capacity(table.len());
        for (batch, rows) in table.rows.chunks(size).enumerate() {
            self.emit(PipelineEvent::BatchStarted {
                batch,
                batches,
                rows: rows.len(),
            })
            .await;

            let classifications = classifier
                .classify(batch, &table.headers, rows, columns.name.as_deref())
                .await?;
            let texts: Vec<(&str, &str)> = rows
                .iter()
                .map(|row| {
                    (
                        row.get_opt(columns.name.as_deref()),
                        row.get_opt(columns.description.as_deref()),
                    )
                })
                .collect();
            let attributes = extractor.extract_batch(batch, &texts).await?;

            enriched.extend(
                classifications
                    .into_iter()
                    .zip(attributes)
                    .map(|(classification, attributes)| Enriched {
                        classification,
                        attributes,
                    }),
            );
            self.emit(PipelineEvent::BatchCompleted {
                batch,
                rows: rows.len(),
            })
            .await;
        }

        self.emit(PipelineEvent::Complete { rows: table.len() }).await;
        Ok(enriched)
    }

    fn render(
        &self,
        table: &CatalogTable,
        columns: &ColumnMap,
        enriched: &[Enriched],
        platform: Platform,
    ) -> Result<TransformOutput, PipelineError> {
        let mapper = SchemaMapper::new(self.options.brand.as_str());
        let records: Vec<TargetRecord> = table
            .rows
            .iter()
            .zip(enriched)
            .map(|(record, row)| {
                mapper.map(
                    platform,
                    &MappingInput {
                        record,
                        columns,
                        classification: &row.classification,
                        attributes: &row.attributes,
                    },
                )
            })
            .collect();

        let headers = platform.schema().column_names();
        let csv = write_table(&headers, records.iter().map(|r| r.values()))?;
        info!("Wrote {} {} rows", records.len(), platform.display_name());

        Ok(TransformOutput {
            platform,
            file_name: platform.output_file_name(&self.options.file_prefix),
            records,
            csv,
        })
    }
}
