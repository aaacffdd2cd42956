//! Prompt templates for catalog classification and description extraction.

/// Classification prompt. Placeholders: {taxonomy}, {headers}, {count}, {products}.
pub const CLASSIFY_PROMPT: &str = r#"You are classifying cannabis products from a retail catalog export.

Product taxonomy (main category: subcategories):
{taxonomy}

CSV Headers: {headers}

Products ({count} rows, in order):
{products}

For EACH product, in the same order, determine:
1. category: the main category key (one of hash, rosin, flower, vape, preroll, five_pack_preroll)
2. subcategory: exactly one subcategory name listed for that category
3. type: "Sativa", "Indica", or "Hybrid" from markers like (S), (I), (H)

Return ONLY a JSON array with exactly {count} objects, one per product, in input order.
Format: [{"category": "...", "subcategory": "...", "type": "..."}, ...]"#;

/// Extraction prompt. Placeholders: {count}, {products}.
pub const EXTRACT_PROMPT: &str = r#"You are extracting structured attributes from cannabis product descriptions.

Products ({count} rows, in order):
{products}

For EACH product, in the same order, split its description into:
- lineage: parent strains / genetics
- taste: flavor and aroma notes
- feeling: effects
- farm: the farm or cultivator name
- place_grown: where it was grown (region, county, state)
- marketing: the remaining free marketing copy

Use an empty string for anything not present. Do not invent content.

Return ONLY a JSON array with exactly {count} objects, one per product, in input order.
Format: [{"lineage": "...", "taste": "...", "feeling": "...", "farm": "...", "place_grown": "...", "marketing": "..."}, ...]"#;
