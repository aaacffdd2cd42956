//! Raw product records and content-sniffed column identities.

use std::collections::HashMap;

use regex::Regex;
use std::sync::LazyLock;

/// A description section label such as `LINEAGE:`, anywhere in the text.
///
/// Shared with the description splitter so sniffing and extraction agree on
/// what counts as labeled.
pub(crate) static SECTION_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(lineage|taste|feeling|farm|place[ _-]?grown)\s*:").unwrap()
});

/// One row of the uploaded table, keyed by header name.
///
/// Read once per request and never mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawProductRecord {
    values: HashMap<String, String>,
}

impl RawProductRecord {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Build a record from header/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of a column, empty when the column is absent.
    pub fn get(&self, column: &str) -> &str {
        self.values.get(column).map(String::as_str).unwrap_or("")
    }

    /// Value of an optional sniffed column.
    pub fn get_opt(&self, column: Option<&str>) -> &str {
        column.map(|c| self.get(c)).unwrap_or("")
    }

    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }
}

/// A parsed upload: header row plus data rows sharing that header set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawProductRecord>,
}

impl CatalogTable {
    pub fn new(headers: Vec<String>, rows: Vec<RawProductRecord>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sniff which headers carry which product attribute.
    pub fn columns(&self) -> ColumnMap {
        ColumnMap::sniff(&self.headers, &self.rows)
    }
}

/// Column identities discovered from header text and cell contents.
///
/// Header names are not fixed, so each attribute is located by keyword
/// first and by content shape second.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub image: Option<String>,
    pub thc: Option<String>,
    pub batch_id: Option<String>,
}

impl ColumnMap {
    pub fn sniff(headers: &[String], rows: &[RawProductRecord]) -> Self {
        let description = find_header(headers, &["desc", "detail"], &[])
            .or_else(|| {
                headers
                    .iter()
                    .find(|h| rows.iter().any(|r| SECTION_LABEL.is_match(r.get(h))))
                    .cloned()
            })
            .or_else(|| longest_column(headers, rows, true, &[]));

        let taken: Vec<&str> = description.iter().map(String::as_str).collect();
        let name = find_exact(headers, &["product name", "name", "title", "product"])
            .filter(|h| !taken.contains(&h.as_str()))
            .or_else(|| find_header(headers, &["product name", "name", "title", "product"], &taken))
            .or_else(|| longest_column(headers, rows, false, &taken));

        Self {
            sku: find_header(headers, &["sku", "external id", "external_id"], &[])
                .or_else(|| find_exact(headers, &["id", "product id"])),
            image: find_header(headers, &["image", "photo", "avatar", "url"], &[]),
            thc: find_header(headers, &["thc"], &[]),
            batch_id: find_header(headers, &["batch", "lot"], &[]),
            name,
            description,
        }
    }
}

/// First header containing any keyword (case-insensitive), skipping `exclude`.
fn find_header(headers: &[String], keywords: &[&str], exclude: &[&str]) -> Option<String> {
    keywords.iter().find_map(|kw| {
        headers
            .iter()
            .filter(|h| !exclude.contains(&h.as_str()))
            .find(|h| h.to_lowercase().contains(kw))
            .cloned()
    })
}

fn find_exact(headers: &[String], names: &[&str]) -> Option<String> {
    headers
        .iter()
        .find(|h| names.contains(&h.trim().to_lowercase().as_str()))
        .cloned()
}

/// Header whose cells carry the most text, optionally requiring line breaks.
fn longest_column(
    headers: &[String],
    rows: &[RawProductRecord],
    multiline: bool,
    exclude: &[&str],
) -> Option<String> {
    headers
        .iter()
        .filter(|h| !exclude.contains(&h.as_str()))
        .filter(|h| {
            rows.iter()
                .any(|r| r.get(h).contains('\n') == multiline && !r.get(h).trim().is_empty())
        })
        .map(|h| {
            let total: usize = rows.iter().map(|r| r.get(h).len()).sum();
            (h, total)
        })
        .filter(|(_, total)| *total > 0)
        .max_by_key(|(_, total)| *total)
        .map(|(h, _)| h.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_get_missing_column_is_empty() {
        let record = RawProductRecord::from_pairs([("Name", "Zkittlez")]);
        assert_eq!(record.get("Name"), "Zkittlez");
        assert_eq!(record.get("Description"), "");
        assert_eq!(record.get_opt(None), "");
    }

    #[test]
    fn test_sniff_by_header_keywords() {
        let hdrs = headers(&[
            "Product Name",
            "Long Description",
            "SKU",
            "Image Link",
            "THC %",
            "Batch #",
        ]);
        let map = ColumnMap::sniff(&hdrs, &[]);
        assert_eq!(map.name.as_deref(), Some("Product Name"));
        assert_eq!(map.description.as_deref(), Some("Long Description"));
        assert_eq!(map.sku.as_deref(), Some("SKU"));
        assert_eq!(map.image.as_deref(), Some("Image Link"));
        assert_eq!(map.thc.as_deref(), Some("THC %"));
        assert_eq!(map.batch_id.as_deref(), Some("Batch #"));
    }

    #[test]
    fn test_sniff_by_content() {
        let hdrs = headers(&["A", "B", "C"]);
        let rows = vec![RawProductRecord::from_pairs([
            ("A", "Jelly Donutz #117 Green Unpressed Hash (S)"),
            ("B", "LINEAGE: Jelly Donutz x Runtz\nTASTE: Sweet"),
            ("C", "x"),
        ])];
        let map = ColumnMap::sniff(&hdrs, &rows);
        assert_eq!(map.description.as_deref(), Some("B"));
        assert_eq!(map.name.as_deref(), Some("A"));
    }

    #[test]
    fn test_sniff_prefers_product_name_over_other_names() {
        let hdrs = headers(&["Brand Name", "Farm Name", "Product Name", "Description"]);
        let map = ColumnMap::sniff(&hdrs, &[]);
        assert_eq!(map.name.as_deref(), Some("Product Name"));

        let hdrs = headers(&["Brand Name", "Name"]);
        let map = ColumnMap::sniff(&hdrs, &[]);
        assert_eq!(map.name.as_deref(), Some("Name"));
    }

    #[test]
    fn test_sniff_flattened_labels() {
        let hdrs = headers(&["A", "B"]);
        let rows = vec![RawProductRecord::from_pairs([
            ("A", "Runtz Flower 3.5g"),
            ("B", "Lineage: Gelato x Zkittlez Place_Grown: Humboldt"),
        ])];
        let map = ColumnMap::sniff(&hdrs, &rows);
        assert_eq!(map.description.as_deref(), Some("B"));
        assert_eq!(map.name.as_deref(), Some("A"));
    }

    #[test]
    fn test_sniff_name_does_not_reuse_description() {
        // "Product Description" contains "product" but is already the description.
        let hdrs = headers(&["Product Description", "Item"]);
        let rows = vec![RawProductRecord::from_pairs([
            ("Product Description", "LINEAGE: a\nTASTE: b"),
            ("Item", "Gelato 41 Live Rosin 1g"),
        ])];
        let map = ColumnMap::sniff(&hdrs, &rows);
        assert_eq!(map.description.as_deref(), Some("Product Description"));
        assert_eq!(map.name.as_deref(), Some("Item"));
    }
}
