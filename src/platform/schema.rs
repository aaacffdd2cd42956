//! Per-platform column tables.
//!
//! Each schema is an ordered list of columns, each filled either with a
//! constant or with a derived product field. Column order is the output
//! order.

use std::collections::HashMap;

use tracing::debug;

use super::Platform;

/// A derived value computed from one product row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Configured brand name
    Brand,
    /// Clean strain name + subcategory + weight
    DisplayName,
    CleanName,
    /// Labeled lines and marketing copy, no farm or place grown
    PlainDescription,
    /// All labeled sections as HTML, including farm and place grown
    HtmlDescription,
    Lineage,
    Subcategory,
    WeedmapsCategories,
    LeaflyCategory,
    LeaflySubcategory,
    LibrarySlug,
    CategorySlug,
    ProductUrl,
    /// Strain type from the name marker only
    Genetics,
    Weight,
    ItemsPerPack,
    Multipack,
    StandardPackSize,
    NonStandardPackSize,
    Sku,
    ImageUrl,
    /// THC value with the trailing percent sign stripped
    Thc,
    Tags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSource {
    Const(&'static str),
    Field(Field),
}

/// One output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub source: ColumnSource,
}

const fn field(name: &'static str, field: Field) -> Column {
    Column {
        name,
        source: ColumnSource::Field(field),
    }
}

const fn fixed(name: &'static str, value: &'static str) -> Column {
    Column {
        name,
        source: ColumnSource::Const(value),
    }
}

/// Fixed ordered column list for one platform.
#[derive(Debug)]
pub struct PlatformSchema {
    pub platform: Platform,
    pub columns: &'static [Column],
}

impl PlatformSchema {
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

static WEEDMAPS: PlatformSchema = PlatformSchema {
    platform: Platform::Weedmaps,
    columns: &[
        field("name", Field::DisplayName),
        field("categories", Field::WeedmapsCategories),
        field("description", Field::PlainDescription),
        field("avatar_image", Field::ImageUrl),
        field("external_id", Field::Sku),
        field("tags", Field::Tags),
        field("thc_percentage", Field::Thc),
        field("genetics", Field::Genetics),
        field("strain", Field::CleanName),
        field("items_per_pack", Field::ItemsPerPack),
        field("multipack", Field::Multipack),
        field("weight", Field::Weight),
        fixed("featured", "FALSE"),
    ],
};

static IHEARTJANE: PlatformSchema = PlatformSchema {
    platform: Platform::IHeartJane,
    columns: &[
        field("Brand", Field::Brand),
        field("Strain", Field::CleanName),
        field("Brand Category", Field::Subcategory),
        field(
            "Does this Product Come in Standard Pack Sizes of 0.5g (500mg) or 1g (1000mg)?",
            Field::StandardPackSize,
        ),
        field("Enter Non-Standard Pack Size Here [g]", Field::NonStandardPackSize),
        field("Lineage", Field::Lineage),
        field("Product Name (Internal Use)", Field::DisplayName),
        field("Product Description", Field::PlainDescription),
        field("IMAGE LINK", Field::ImageUrl),
        fixed("Status", "NEW"),
    ],
};

static LEAFLY: PlatformSchema = PlatformSchema {
    platform: Platform::Leafly,
    columns: &[
        field("Name", Field::DisplayName),
        field("SKU", Field::Sku),
        field("Description", Field::PlainDescription),
        field("Category", Field::LeaflyCategory),
        field("Subcategory", Field::LeaflySubcategory),
        field("Strain", Field::CleanName),
        field("THC Content", Field::Thc),
        fixed("THC Unit", "PERCENTAGE"),
        fixed("Country Availability", "US"),
        fixed("State/Province Availability", "CA"),
        field("Image One URL", Field::ImageUrl),
    ],
};

static SQUARESPACE: PlatformSchema = PlatformSchema {
    platform: Platform::Squarespace,
    columns: &[
        fixed("Product Type [Non Editable]", "PHYSICAL"),
        field("Product Page", Field::LibrarySlug),
        field("Product URL", Field::ProductUrl),
        field("Title", Field::CleanName),
        field("Description", Field::HtmlDescription),
        field("SKU", Field::Sku),
        fixed("Price", "0.00"),
        fixed("Sale Price", "0.00"),
        fixed("On Sale", "No"),
        fixed("Stock", "Unlimited"),
        field("Categories", Field::CategorySlug),
        field("Tags", Field::Tags),
        fixed("Weight", "0.0"),
        fixed("Length", "0.0"),
        fixed("Width", "0.0"),
        fixed("Height", "0.0"),
        fixed("Visible", "Yes"),
        field("Hosted Image URLs", Field::ImageUrl),
    ],
};

pub(super) fn schema_for(platform: Platform) -> &'static PlatformSchema {
    match platform {
        Platform::Weedmaps => &WEEDMAPS,
        Platform::IHeartJane => &IHEARTJANE,
        Platform::Leafly => &LEAFLY,
        Platform::Squarespace => &SQUARESPACE,
    }
}

/// A row shaped for one platform, in that platform's column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRecord {
    fields: Vec<(&'static str, String)>,
}

impl TargetRecord {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }

    pub fn values(&self) -> Vec<&str> {
        self.fields.iter().map(|(_, value)| value.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Reorder a column→value map to the schema's order.
///
/// Missing columns are backfilled with empty strings and columns outside
/// the schema are dropped.
pub fn conform(schema: &PlatformSchema, mut values: HashMap<&'static str, String>) -> TargetRecord {
    let mut missing = Vec::new();
    let fields = schema
        .columns
        .iter()
        .map(|column| {
            let value = values.remove(column.name).unwrap_or_else(|| {
                missing.push(column.name);
                String::new()
            });
            (column.name, value)
        })
        .collect();

    if !missing.is_empty() {
        debug!(
            "{}: backfilled {} missing columns: {}",
            schema.platform,
            missing.len(),
            missing.join(", ")
        );
    }
    if !values.is_empty() {
        let mut extra: Vec<&str> = values.keys().copied().collect();
        extra.sort_unstable();
        debug!("{}: dropped extra columns: {}", schema.platform, extra.join(", "));
    }

    TargetRecord { fields }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_counts() {
        assert_eq!(WEEDMAPS.len(), 13);
        assert_eq!(IHEARTJANE.len(), 10);
        assert_eq!(LEAFLY.len(), 11);
        assert_eq!(SQUARESPACE.len(), 18);
    }

    #[test]
    fn test_column_names_unique() {
        for platform in Platform::ALL {
            let mut names = platform.schema().column_names();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), platform.schema().len(), "{}", platform);
        }
    }

    #[test]
    fn test_conform_backfills_and_orders() {
        let mut values = HashMap::new();
        values.insert("Image One URL", "https://img/1.png".to_string());
        values.insert("Name", "Runtz Flower 3.5g".to_string());
        values.insert("Bogus", "x".to_string());

        let record = conform(&LEAFLY, values);
        let columns: Vec<&str> = record.columns().collect();
        assert_eq!(columns, LEAFLY.column_names());
        assert_eq!(record.get("Name"), Some("Runtz Flower 3.5g"));
        assert_eq!(record.get("SKU"), Some(""));
        assert_eq!(record.get("Image One URL"), Some("https://img/1.png"));
        assert_eq!(record.get("Bogus"), None);
    }
}
