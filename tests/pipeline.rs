//! End-to-end pipeline tests against a scripted text capability.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use nasha::catalog::read_table;
use nasha::llm::{CapabilityRequest, CapabilityTask, LlmError, TextCapability};
use nasha::platform::Platform;
use nasha::services::{Pipeline, PipelineError, PipelineOptions};

/// Replays queued responses in order and records every request.
struct Scripted {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<(CapabilityTask, usize)>>,
}

impl Scripted {
    fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl TextCapability for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CapabilityRequest) -> Result<String, LlmError> {
        self.requests
            .lock()
            .unwrap()
            .push((request.task, request.expected_items));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::Api("no scripted response left".into()))
    }
}

const CATALOG: &str = "\
Product Name,Description,SKU,Image URL,THC %,Batch ID
Jelly Donutz #117 Green Unpressed Hash (S),\"LINEAGE: Jelly Breath x Donutz
TASTE: Powdered sugar, berry
FEELING: Euphoric
FARM: Clear Water Farms
PLACE GROWN: Mendocino County

Washed fresh frozen and dried under cold air.\",JD-117,https://cdn.example.com/jd.png,68.2%,B-001
5 Pack Live Rosin Prerolls 1g each,\"LINEAGE: Papaya x Animal Mints
TASTE: Tropical
FEELING: Relaxed\",PR-5,https://cdn.example.com/pr.png,41%,B-002
";

const CLASSIFIED: &str = r#"Here you go:
```json
[
  {"category": "hash", "subcategory": "Green Unpressed Hash", "type": "Sativa"},
  {"category": "preroll", "subcategory": "Infused Preroll", "type": "Hybrid"}
]
```"#;

fn pipeline(capability: &Scripted) -> Pipeline<'_> {
    Pipeline::new(capability, PipelineOptions::default())
}

#[tokio::test]
async fn test_hash_row_across_platforms() {
    let capability = Scripted::new(&[CLASSIFIED]);
    let table = read_table(CATALOG.as_bytes()).unwrap();
    let outputs = pipeline(&capability).transform_all(&table).await.unwrap();

    // Labeled descriptions never need the extraction call.
    assert_eq!(capability.calls(), 1);
    assert_eq!(outputs.len(), 4);

    let weedmaps = &outputs[0];
    assert_eq!(weedmaps.platform, Platform::Weedmaps);
    assert_eq!(weedmaps.file_name, "Nasha_weedmaps.csv");
    let hash = &weedmaps.records[0];
    assert_eq!(hash.get("strain"), Some("Jelly Donutz #117"));
    assert_eq!(hash.get("genetics"), Some("Sativa"));
    assert_eq!(hash.get("external_id"), Some("JD-117"));
    assert_eq!(hash.get("thc_percentage"), Some("68.2"));
    for value in hash.values() {
        assert!(!value.contains("Clear Water Farms"));
        assert!(!value.contains("Mendocino"));
    }

    let squarespace = outputs
        .iter()
        .find(|o| o.platform == Platform::Squarespace)
        .unwrap();
    let hash = &squarespace.records[0];
    assert_eq!(hash.get("Title"), Some("Jelly Donutz #117"));
    let description = hash.get("Description").unwrap();
    assert!(description.contains("<strong>FARM:</strong> Clear Water Farms"));
    assert!(description.contains("<strong>PLACE GROWN:</strong> Mendocino County"));
    assert_eq!(hash.get("Product URL"), Some("jelly-donutz-117-clear-water-farms"));
}

#[tokio::test]
async fn test_five_pack_row() {
    let capability = Scripted::new(&[CLASSIFIED]);
    let table = read_table(CATALOG.as_bytes()).unwrap();
    let output = pipeline(&capability)
        .transform(&table, Platform::Weedmaps)
        .await
        .unwrap();

    let pack = &output.records[1];
    assert_eq!(pack.get("items_per_pack"), Some("5"));
    assert_eq!(pack.get("multipack"), Some("TRUE"));
    assert_eq!(pack.get("weight"), Some("2.5g"));
    assert_eq!(
        pack.get("categories"),
        Some("Infused Pre-Rolls, Pre-Roll Packs, Pre-Rolls")
    );
}

#[tokio::test]
async fn test_header_only_analyze_makes_no_call() {
    let capability = Scripted::new(&[]);
    let err = pipeline(&capability)
        .analyze_csv(b"Product Name,Description\n")
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InputEmpty));
    assert_eq!(err.to_string(), "No data found in CSV");
    assert_eq!(capability.calls(), 0);
}

#[tokio::test]
async fn test_prose_response_fails_transform() {
    let capability = Scripted::new(&["I'm sorry, I can't categorize these products."]);
    let err = pipeline(&capability)
        .transform_csv(CATALOG.as_bytes(), "leafly")
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::ResponseUnparsable { batch: 0, .. }));
}

#[tokio::test]
async fn test_call_failure_fails_transform() {
    let capability = Scripted::new(&[]);
    let err = pipeline(&capability)
        .transform_csv(CATALOG.as_bytes(), "squarespace")
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::CapabilityCallFailure(_)));
}

#[tokio::test]
async fn test_unlabeled_descriptions_are_delegated() {
    let csv = "\
Title,Details
Sunset Sherbet Flower 3.5g (I),Grown by Ridge Farms in Humboldt. Sweet citrus with a calm finish.
Blue Dream Flower 7g (S),Classic uplifting daytime flower.
";
    let extracted = r#"[
  {"lineage": "", "taste": "Sweet citrus", "feeling": "Calm", "farm": "Ridge Farms", "place_grown": "Humboldt", "marketing": "A sunset in a jar."},
  {"lineage": "Blueberry x Haze", "taste": "", "feeling": "Uplifting", "farm": "", "place_grown": "", "marketing": "Classic daytime flower."}
]"#;
    let capability = Scripted::new(&[
        r#"[{"category": "flower"}, {"category": "flower"}]"#,
        extracted,
    ]);
    let output = pipeline(&capability)
        .transform_csv(csv.as_bytes(), "iheartjane")
        .await
        .unwrap();

    let requests = capability.requests.lock().unwrap().clone();
    assert_eq!(
        requests,
        vec![(CapabilityTask::Classify, 2), (CapabilityTask::Extract, 2)]
    );

    let sherbet = &output.records[0];
    assert_eq!(sherbet.get("Strain"), Some("Sunset Sherbet"));
    assert_eq!(sherbet.get("Brand Category"), Some("Flower"));
    assert_eq!(
        sherbet.get("Enter Non-Standard Pack Size Here [g]"),
        Some("3.5")
    );
    assert_eq!(
        sherbet.get("Product Description"),
        Some("TASTE: Sweet citrus\nFEELING: Calm\n\nA sunset in a jar.")
    );
    assert_eq!(output.records[1].get("Lineage"), Some("Blueberry x Haze"));
}

#[tokio::test]
async fn test_outputs_conform_to_schema() {
    for platform in Platform::ALL {
        let capability = Scripted::new(&[CLASSIFIED]);
        let output = pipeline(&capability)
            .transform_csv(CATALOG.as_bytes(), platform.id())
            .await
            .unwrap();

        assert_eq!(output.records.len(), 2);
        let expected = platform.schema().column_names();
        for record in &output.records {
            assert_eq!(record.columns().collect::<Vec<_>>(), expected);
        }

        let written = read_table(&output.csv).unwrap();
        assert_eq!(written.headers, expected);
        assert_eq!(written.len(), 2);
    }
}

#[tokio::test]
async fn test_analyze_histogram() {
    let capability = Scripted::new(&[CLASSIFIED]);
    let summary = pipeline(&capability)
        .analyze_csv(CATALOG.as_bytes())
        .await
        .unwrap();
    assert_eq!(summary.total_count, 2);
    assert_eq!(summary.categories.get("Green Unpressed Hash"), Some(&1));
    // Same five-pack label the transform exports.
    assert_eq!(summary.categories.get("Infused Preroll 5-Pack"), Some(&1));
    assert_eq!(summary.categories.get("Infused Preroll"), None);
}

#[tokio::test]
async fn test_five_pack_category_matches_analyze() {
    let capability = Scripted::new(&[CLASSIFIED]);
    let output = pipeline(&capability)
        .transform_csv(CATALOG.as_bytes(), "iheartjane")
        .await
        .unwrap();
    assert_eq!(
        output.records[1].get("Brand Category"),
        Some("Infused Preroll 5-Pack")
    );
}

#[tokio::test]
async fn test_single_line_description_keeps_farm_private() {
    let csv = "\
Product Name,Description,Batch ID
Jelly Donutz #117 Green Unpressed Hash (S),LINEAGE: Jelly Breath x Donutz TASTE: Powdered sugar FARM: Clear Water Farms PLACE GROWN: Mendocino County,B-001
";
    let capability = Scripted::new(&[
        r#"[{"category": "hash", "subcategory": "Green Unpressed Hash", "type": "Sativa"}]"#,
    ]);
    let table = read_table(csv.as_bytes()).unwrap();
    let outputs = pipeline(&capability).transform_all(&table).await.unwrap();
    assert_eq!(capability.calls(), 1);

    for output in &outputs {
        if output.platform == Platform::Squarespace {
            continue;
        }
        for value in output.records[0].values() {
            assert!(!value.contains("FARM:"), "{}", output.platform);
            assert!(!value.contains("PLACE GROWN:"), "{}", output.platform);
            assert!(!value.contains("Clear Water Farms"), "{}", output.platform);
        }
    }

    let jane = &outputs[1];
    assert_eq!(jane.platform, Platform::IHeartJane);
    assert_eq!(jane.records[0].get("Lineage"), Some("Jelly Breath x Donutz"));

    let squarespace = &outputs[3].records[0];
    let description = squarespace.get("Description").unwrap();
    assert!(description.contains("<strong>TASTE:</strong> Powdered sugar<br>"));
    assert!(description.contains("<strong>FARM:</strong> Clear Water Farms<br>"));
    assert!(description.ends_with("<strong>PLACE GROWN:</strong> Mendocino County</p>"));
    assert_eq!(
        squarespace.get("Product URL"),
        Some("jelly-donutz-117-clear-water-farms")
    );
}

fn numbered_catalog(rows: usize) -> String {
    let mut csv = String::from("Product Name,Description\n");
    for i in 0..rows {
        csv.push_str(&format!("Cultivar {} Flower 3.5g,\n", i));
    }
    csv
}

fn flower_labels(count: usize) -> String {
    format!("[{}]", vec![r#"{"category": "flower"}"#; count].join(", "))
}

#[tokio::test]
async fn test_transform_spans_batches_in_order() {
    let responses = [flower_labels(10), flower_labels(10), flower_labels(5)];
    let responses: Vec<&str> = responses.iter().map(String::as_str).collect();
    let capability = Scripted::new(&responses);
    let output = pipeline(&capability)
        .transform_csv(numbered_catalog(25).as_bytes(), "weedmaps")
        .await
        .unwrap();

    let requests = capability.requests.lock().unwrap().clone();
    assert_eq!(
        requests,
        vec![
            (CapabilityTask::Classify, 10),
            (CapabilityTask::Classify, 10),
            (CapabilityTask::Classify, 5),
        ]
    );
    assert_eq!(output.records.len(), 25);
    for (i, record) in output.records.iter().enumerate() {
        assert_eq!(record.get("strain"), Some(format!("Cultivar {}", i).as_str()));
    }
    assert_eq!(read_table(&output.csv).unwrap().len(), 25);
}

#[tokio::test]
async fn test_later_batch_failure_yields_no_output() {
    let first = flower_labels(10);
    let capability = Scripted::new(&[first.as_str(), "Sorry, I lost track of the products."]);
    let err = pipeline(&capability)
        .transform_csv(numbered_catalog(25).as_bytes(), "leafly")
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::ResponseUnparsable { batch: 1, .. }));
    assert_eq!(capability.calls(), 2);
}
