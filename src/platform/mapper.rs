//! Fill platform columns from a classified, extracted product.

use std::collections::HashMap;

use super::schema::{conform, ColumnSource, Field, TargetRecord};
use super::Platform;
use crate::catalog::{ColumnMap, RawProductRecord};
use crate::services::extract::strain_type_from_name;
use crate::services::{ClassificationResult, ExtractedAttributes};
use crate::taxonomy::{self, MainCategory};

/// Weights Jane treats as standard pack sizes.
const STANDARD_PACK_SIZES: [&str; 2] = ["0.5g", "1g"];

/// Everything known about one product row.
#[derive(Debug, Clone, Copy)]
pub struct MappingInput<'a> {
    pub record: &'a RawProductRecord,
    pub columns: &'a ColumnMap,
    pub classification: &'a ClassificationResult,
    pub attributes: &'a ExtractedAttributes,
}

impl MappingInput<'_> {
    fn name(&self) -> &str {
        self.record.get_opt(self.columns.name.as_deref())
    }

    fn main_category(&self) -> MainCategory {
        self.classification.main_category
    }

    fn subcategory(&self) -> &'static str {
        self.classification.subcategory
    }
}

/// Maps products onto platform schemas.
#[derive(Debug, Clone)]
pub struct SchemaMapper {
    brand: String,
}

impl SchemaMapper {
    pub fn new(brand: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
        }
    }

    /// Build one target record in the platform's column order.
    pub fn map(&self, platform: Platform, input: &MappingInput<'_>) -> TargetRecord {
        let schema = platform.schema();
        let values: HashMap<&'static str, String> = schema
            .columns
            .iter()
            .map(|column| {
                let value = match column.source {
                    ColumnSource::Const(value) => value.to_string(),
                    ColumnSource::Field(field) => self.field_value(field, input),
                };
                (column.name, value)
            })
            .collect();
        conform(schema, values)
    }

    fn field_value(&self, field: Field, input: &MappingInput<'_>) -> String {
        let attrs = input.attributes;
        let key = input.main_category().key();
        match field {
            Field::Brand => self.brand.clone(),
            Field::DisplayName => display_name(input),
            Field::CleanName => attrs.clean_strain_name.clone(),
            Field::PlainDescription => plain_description(attrs),
            Field::HtmlDescription => html_description(attrs),
            Field::Lineage => attrs.lineage.clone(),
            Field::Subcategory => input.subcategory().to_string(),
            Field::WeedmapsCategories => taxonomy::weedmaps_categories(key).to_string(),
            Field::LeaflyCategory => taxonomy::leafly_category(key).category.to_string(),
            Field::LeaflySubcategory => taxonomy::leafly_category(key).subcategory.to_string(),
            Field::LibrarySlug => taxonomy::library_slug(key).to_string(),
            Field::CategorySlug => category_slug(&attrs.clean_strain_name),
            Field::ProductUrl => {
                let suffix = match input.main_category() {
                    MainCategory::Preroll | MainCategory::FivePackPreroll => input
                        .record
                        .get_opt(input.columns.batch_id.as_deref()),
                    _ => attrs.farm.as_str(),
                };
                product_url_slug(&attrs.clean_strain_name, suffix)
            }
            Field::Genetics => strain_type_from_name(input.name()).to_string(),
            Field::Weight => attrs.weight.clone(),
            Field::ItemsPerPack => pick(attrs.is_five_pack, "5", "1"),
            Field::Multipack => pick(attrs.is_five_pack, "TRUE", "FALSE"),
            Field::StandardPackSize => pick(is_standard_pack(&attrs.weight), "YES", "NO"),
            Field::NonStandardPackSize => {
                if is_standard_pack(&attrs.weight) {
                    String::new()
                } else {
                    attrs.weight.trim_end_matches(['g', 'G']).to_string()
                }
            }
            Field::Sku => input.record.get_opt(input.columns.sku.as_deref()).trim().to_string(),
            Field::ImageUrl => input
                .record
                .get_opt(input.columns.image.as_deref())
                .trim()
                .to_string(),
            Field::Thc => input
                .record
                .get_opt(input.columns.thc.as_deref())
                .trim()
                .trim_end_matches('%')
                .trim()
                .to_string(),
            Field::Tags => format!(
                "{}, {}",
                input.classification.strain_type,
                input.subcategory()
            ),
        }
    }
}

fn pick(flag: bool, yes: &str, no: &str) -> String {
    let value = if flag { yes } else { no };
    value.to_string()
}

fn is_standard_pack(weight: &str) -> bool {
    STANDARD_PACK_SIZES.contains(&weight)
}

fn join_nonempty(parts: &[&str], sep: &str) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Clean strain name, subcategory and weight, single-spaced.
fn display_name(input: &MappingInput<'_>) -> String {
    join_nonempty(
        &[
            input.attributes.clean_strain_name.as_str(),
            input.subcategory(),
            input.attributes.weight.as_str(),
        ],
        " ",
    )
}

/// Lineage, taste and feeling lines followed by the marketing paragraph.
///
/// Farm and place grown never appear here.
fn plain_description(attrs: &ExtractedAttributes) -> String {
    let labeled: Vec<String> = [
        ("LINEAGE", &attrs.lineage),
        ("TASTE", &attrs.taste),
        ("FEELING", &attrs.feeling),
    ]
    .iter()
    .filter(|(_, value)| !value.trim().is_empty())
    .map(|(label, value)| format!("{}: {}", label, value.trim()))
    .collect();

    let marketing = attrs.marketing_text.trim();
    match (labeled.is_empty(), marketing.is_empty()) {
        (true, _) => marketing.to_string(),
        (false, true) => labeled.join("\n"),
        (false, false) => format!("{}\n\n{}", labeled.join("\n"), marketing),
    }
}

/// Labeled sections as a `<p>` block with `<br>` separators, then the
/// marketing paragraph. Values are inserted verbatim.
fn html_description(attrs: &ExtractedAttributes) -> String {
    let labeled: Vec<String> = [
        ("LINEAGE", &attrs.lineage),
        ("TASTE", &attrs.taste),
        ("FEELING", &attrs.feeling),
        ("FARM", &attrs.farm),
        ("PLACE GROWN", &attrs.place_grown),
    ]
    .iter()
    .filter(|(_, value)| !value.trim().is_empty())
    .map(|(label, value)| format!("<strong>{}:</strong> {}", label, value.trim()))
    .collect();

    let mut html = String::new();
    if !labeled.is_empty() {
        html.push_str(&format!("<p>{}</p>", labeled.join("<br>")));
    }
    let marketing = attrs.marketing_text.trim();
    if !marketing.is_empty() {
        html.push_str(&format!("<p>{}</p>", marketing.replace('\n', "<br>")));
    }
    html
}

/// Lowercased hyphen-joined slug of the name and a suffix, keeping only
/// alphanumerics within each word.
pub fn product_url_slug(name: &str, suffix: &str) -> String {
    format!("{} {}", name, suffix)
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// `/` plus the lowercased first letter of the name, or `/category` when the
/// name does not start with a letter.
pub fn category_slug(name: &str) -> String {
    match name.trim().chars().next() {
        Some(c) if c.is_ascii_alphabetic() => format!("/{}", c.to_ascii_lowercase()),
        _ => "/category".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::StrainType;

    fn columns() -> ColumnMap {
        ColumnMap {
            name: Some("Product Name".into()),
            description: Some("Description".into()),
            sku: Some("SKU".into()),
            image: Some("Image".into()),
            thc: Some("THC".into()),
            batch_id: Some("Batch".into()),
        }
    }

    fn hash_product() -> (RawProductRecord, ClassificationResult, ExtractedAttributes) {
        let name = "Jelly Donutz #117 Green Unpressed Hash (S)";
        let description = "LINEAGE: Jelly Breath x Donutz\nTASTE: Sugar\nFEELING: Uplifted\nFARM: Moon Farms\nPLACE GROWN: Humboldt\nSmall batch.";
        let record = RawProductRecord::from_pairs([
            ("Product Name", name),
            ("Description", description),
            ("SKU", "JD-117"),
            ("Image", "https://cdn/jd.png"),
            ("THC", "72.4%"),
            ("Batch", "B-9"),
        ]);
        let classification = ClassificationResult {
            main_category: MainCategory::Hash,
            subcategory: "Green Unpressed Hash",
            strain_type: StrainType::Sativa,
        };
        let attrs = ExtractedAttributes::from_local(name, description);
        (record, classification, attrs)
    }

    fn map(platform: Platform) -> TargetRecord {
        let (record, classification, attrs) = hash_product();
        let columns = columns();
        let input = MappingInput {
            record: &record,
            columns: &columns,
            classification: &classification,
            attributes: &attrs,
        };
        SchemaMapper::new("Nasha").map(platform, &input)
    }

    #[test]
    fn test_weedmaps_hash() {
        let record = map(Platform::Weedmaps);
        assert_eq!(record.get("name"), Some("Jelly Donutz #117 Green Unpressed Hash"));
        assert_eq!(record.get("genetics"), Some("Sativa"));
        assert_eq!(
            record.get("categories"),
            Some("Ice Water Hash, Solventless, Concentrates")
        );
        assert_eq!(record.get("thc_percentage"), Some("72.4"));
        assert_eq!(record.get("tags"), Some("Sativa, Green Unpressed Hash"));
        assert_eq!(record.get("items_per_pack"), Some("1"));
        assert_eq!(record.get("multipack"), Some("FALSE"));
        assert_eq!(record.get("featured"), Some("FALSE"));
        assert_eq!(
            record.get("description"),
            Some("LINEAGE: Jelly Breath x Donutz\nTASTE: Sugar\nFEELING: Uplifted\n\nSmall batch.")
        );
    }

    #[test]
    fn test_plain_description_omits_farm() {
        for platform in [Platform::Weedmaps, Platform::IHeartJane, Platform::Leafly] {
            let record = map(platform);
            for value in record.values() {
                assert!(!value.contains("FARM:"), "{}", platform);
                assert!(!value.contains("PLACE GROWN:"), "{}", platform);
            }
        }
    }

    #[test]
    fn test_squarespace_html() {
        let record = map(Platform::Squarespace);
        assert_eq!(
            record.get("Description"),
            Some("<p><strong>LINEAGE:</strong> Jelly Breath x Donutz<br><strong>TASTE:</strong> Sugar<br><strong>FEELING:</strong> Uplifted<br><strong>FARM:</strong> Moon Farms<br><strong>PLACE GROWN:</strong> Humboldt</p><p>Small batch.</p>")
        );
        assert_eq!(record.get("Title"), Some("Jelly Donutz #117"));
        assert_eq!(record.get("Product URL"), Some("jelly-donutz-117-moon-farms"));
        assert_eq!(record.get("Categories"), Some("/j"));
        assert_eq!(record.get("Product Page"), Some("hash-library"));
        assert_eq!(record.get("Product Type [Non Editable]"), Some("PHYSICAL"));
    }

    #[test]
    fn test_jane_pack_size() {
        let record = map(Platform::IHeartJane);
        assert_eq!(record.get("Brand"), Some("Nasha"));
        assert_eq!(record.get("Status"), Some("NEW"));
        assert_eq!(record.get("Brand Category"), Some("Green Unpressed Hash"));
        assert_eq!(record.get("Lineage"), Some("Jelly Breath x Donutz"));
        assert_eq!(
            record.get("Does this Product Come in Standard Pack Sizes of 0.5g (500mg) or 1g (1000mg)?"),
            Some("NO")
        );
        assert_eq!(record.get("Enter Non-Standard Pack Size Here [g]"), Some(""));
    }

    #[test]
    fn test_five_pack_overrides_category() {
        let name = "Infused Preroll 5-Pack 2.5g";
        let record = RawProductRecord::from_pairs([("Product Name", name), ("Batch", "B-12")]);
        let classification = ClassificationResult {
            main_category: MainCategory::Preroll,
            subcategory: "Infused Preroll",
            strain_type: StrainType::Hybrid,
        }
        .with_pack_override(name);
        let attrs = ExtractedAttributes::from_local(name, "");
        let columns = columns();
        let input = MappingInput {
            record: &record,
            columns: &columns,
            classification: &classification,
            attributes: &attrs,
        };
        let mapper = SchemaMapper::new("Nasha");

        let weedmaps = mapper.map(Platform::Weedmaps, &input);
        assert_eq!(weedmaps.get("items_per_pack"), Some("5"));
        assert_eq!(weedmaps.get("multipack"), Some("TRUE"));
        assert_eq!(weedmaps.get("weight"), Some("2.5g"));
        assert_eq!(
            weedmaps.get("categories"),
            Some("Infused Pre-Rolls, Pre-Roll Packs, Pre-Rolls")
        );
        assert_eq!(weedmaps.get("name"), Some("Infused Preroll 5-Pack 2.5g"));

        let jane = mapper.map(Platform::IHeartJane, &input);
        assert_eq!(
            jane.get("Does this Product Come in Standard Pack Sizes of 0.5g (500mg) or 1g (1000mg)?"),
            Some("NO")
        );
        assert_eq!(jane.get("Enter Non-Standard Pack Size Here [g]"), Some("2.5"));

        let squarespace = mapper.map(Platform::Squarespace, &input);
        assert_eq!(squarespace.get("Product URL"), Some("b-12"));
        assert_eq!(squarespace.get("Categories"), Some("/category"));
    }

    #[test]
    fn test_product_url_slug() {
        assert_eq!(product_url_slug("Peach Rings!", "Sunny Acres"), "peach-rings-sunny-acres");
        assert_eq!(product_url_slug("", ""), "");
    }

    #[test]
    fn test_category_slug() {
        assert_eq!(category_slug("Runtz"), "/r");
        assert_eq!(category_slug("#1 OG"), "/category");
        assert_eq!(category_slug(""), "/category");
    }
}
