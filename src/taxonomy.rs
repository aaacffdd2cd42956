//! Taxonomy registry: main categories, subcategories and per-platform
//! category names.
//!
//! Everything here is static data. Lookups never fail: an unrecognized key
//! yields an empty value so one ambiguous product cannot abort a batch.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level product type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MainCategory {
    Hash,
    Rosin,
    Flower,
    Vape,
    Preroll,
    FivePackPreroll,
}

impl MainCategory {
    pub const ALL: [MainCategory; 6] = [
        MainCategory::Hash,
        MainCategory::Rosin,
        MainCategory::Flower,
        MainCategory::Vape,
        MainCategory::Preroll,
        MainCategory::FivePackPreroll,
    ];

    /// Normalized key used by the per-platform mapping tables.
    pub fn key(&self) -> &'static str {
        match self {
            MainCategory::Hash => "hash",
            MainCategory::Rosin => "rosin",
            MainCategory::Flower => "flower",
            MainCategory::Vape => "vape",
            MainCategory::Preroll => "preroll",
            MainCategory::FivePackPreroll => "five_pack_preroll",
        }
    }

    /// Parse a category label as produced by the classifier.
    ///
    /// Accepts normalized keys, display names and subcategory slugs
    /// (`hash-green-unpressed` resolves to `Hash`).
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();

        if normalized.contains("5pack")
            || normalized.contains("5_pack")
            || normalized.contains("five_pack")
            || normalized == "fivepackpreroll"
        {
            return Some(MainCategory::FivePackPreroll);
        }

        let head = normalized.split('_').next().unwrap_or("");
        match head {
            "hash" => Some(MainCategory::Hash),
            "rosin" => Some(MainCategory::Rosin),
            "flower" => Some(MainCategory::Flower),
            "vape" | "cart" | "cartridge" => Some(MainCategory::Vape),
            "preroll" | "prerolls" => Some(MainCategory::Preroll),
            "pre" if normalized.starts_with("pre_roll") => Some(MainCategory::Preroll),
            _ => None,
        }
    }
}

impl fmt::Display for MainCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MainCategory::Hash => "Hash",
            MainCategory::Rosin => "Rosin",
            MainCategory::Flower => "Flower",
            MainCategory::Vape => "Vape",
            MainCategory::Preroll => "Preroll",
            MainCategory::FivePackPreroll => "Five-Pack Preroll",
        };
        f.write_str(name)
    }
}

/// Sativa / Indica / Hybrid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StrainType {
    Sativa,
    Indica,
    #[default]
    Hybrid,
}

impl StrainType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrainType::Sativa => "Sativa",
            StrainType::Indica => "Indica",
            StrainType::Hybrid => "Hybrid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sativa" | "s" => Some(StrainType::Sativa),
            "indica" | "i" => Some(StrainType::Indica),
            "hybrid" | "h" => Some(StrainType::Hybrid),
            _ => None,
        }
    }
}

impl fmt::Display for StrainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A platform-agnostic product variant within a main category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subcategory {
    /// Display name, e.g. "Green Unpressed Hash".
    pub name: &'static str,
    /// Stable slug, e.g. "hash-green-unpressed".
    pub slug: &'static str,
    /// Lowercase name fragments that point at this variant.
    cues: &'static [&'static str],
}

/// Leafly splits categories into a category/subcategory pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeaflyCategory {
    pub category: &'static str,
    pub subcategory: &'static str,
}

/// One row of the registry.
#[derive(Debug)]
pub struct CategoryEntry {
    pub main: MainCategory,
    pub subcategories: &'static [Subcategory],
    pub weedmaps: &'static str,
    pub leafly: LeaflyCategory,
    pub library_slug: &'static str,
}

const fn sub(
    name: &'static str,
    slug: &'static str,
    cues: &'static [&'static str],
) -> Subcategory {
    Subcategory { name, slug, cues }
}

static REGISTRY: [CategoryEntry; 6] = [
    CategoryEntry {
        main: MainCategory::Hash,
        subcategories: &[
            sub("Green Unpressed Hash", "hash-green-unpressed", &["unpressed"]),
            sub("Green Powder Hash", "hash-green-powder", &["powder"]),
            sub("Pressed Hash", "hash-pressed", &["pressed"]),
            sub("Bubble Hash", "hash-bubble", &["bubble"]),
            sub("Temple Ball Hash", "hash-temple-ball", &["temple"]),
        ],
        weedmaps: "Ice Water Hash, Solventless, Concentrates",
        leafly: LeaflyCategory {
            category: "Concentrates",
            subcategory: "Hash",
        },
        library_slug: "hash-library",
    },
    CategoryEntry {
        main: MainCategory::Rosin,
        subcategories: &[
            sub("Live Rosin", "rosin-live", &["live"]),
            sub("Cold Cure Rosin", "rosin-cold-cure", &["cold cure", "cold-cure"]),
            sub("Rosin Jar", "rosin-jar", &["jar"]),
        ],
        weedmaps: "Rosin, Solventless, Concentrates",
        leafly: LeaflyCategory {
            category: "Concentrates",
            subcategory: "Rosin",
        },
        library_slug: "rosin-library",
    },
    CategoryEntry {
        main: MainCategory::Vape,
        subcategories: &[
            sub("Live Rosin Cart", "vape-cart-live", &["live"]),
            sub("Cured Rosin Cart", "vape-cart-cured", &["cured", "cold cure"]),
            sub("Disposable Vape", "vape-disposable", &["disposable", "all-in-one"]),
        ],
        weedmaps: "Cartridges, Solventless, Vape Pens",
        leafly: LeaflyCategory {
            category: "Vaping",
            subcategory: "Cartridges",
        },
        library_slug: "vape-library",
    },
    CategoryEntry {
        main: MainCategory::Preroll,
        subcategories: &[
            sub("Infused Preroll", "preroll-infused", &["infused", "rosin", "hash"]),
            sub("Regular Preroll", "preroll-regular", &["regular", "classic"]),
        ],
        weedmaps: "Infused Pre-Rolls, Pre-Rolls",
        leafly: LeaflyCategory {
            category: "Pre-rolls",
            subcategory: "Infused Pre-rolls",
        },
        library_slug: "preroll-library",
    },
    CategoryEntry {
        main: MainCategory::FivePackPreroll,
        subcategories: &[sub(
            "Infused Preroll 5-Pack",
            "preroll-infused-5pack",
            &["5 pack", "5-pack"],
        )],
        weedmaps: "Infused Pre-Rolls, Pre-Roll Packs, Pre-Rolls",
        leafly: LeaflyCategory {
            category: "Pre-rolls",
            subcategory: "Pre-roll Packs",
        },
        library_slug: "preroll-library",
    },
    CategoryEntry {
        main: MainCategory::Flower,
        subcategories: &[sub("Flower", "flower", &["flower", "smalls", "buds"])],
        weedmaps: "Flower",
        leafly: LeaflyCategory {
            category: "Flower",
            subcategory: "",
        },
        library_slug: "flower-library",
    },
];

/// Product-type words stripped from names to obtain the clean strain name.
/// Ordered longest first so multi-word phrases win over their parts.
static PRODUCT_VOCABULARY: &[&str] = &[
    "Infused Preroll 5-Pack",
    "Green Unpressed Hash",
    "Green Powder Hash",
    "Temple Ball Hash",
    "Cured Rosin Cart",
    "Cold Cure Rosin",
    "Live Rosin Cart",
    "Ice Water Hash",
    "Disposable Vape",
    "Infused Preroll",
    "Regular Preroll",
    "Unpressed Hash",
    "Green Unpressed",
    "Green Powder",
    "Pressed Hash",
    "Bubble Hash",
    "Temple Ball",
    "Live Rosin",
    "Cold Cure",
    "Rosin Jar",
    "Cartridges",
    "Cartridge",
    "Pre-Rolls",
    "Pre-Roll",
    "Pre Rolls",
    "Pre Roll",
    "Prerolls",
    "Preroll",
    "Disposable",
    "Infused",
    "Carts",
    "Cart",
    "Vape",
    "Hash",
    "Rosin",
    "Flower",
    "each",
];

/// All registry entries, in display order.
pub fn entries() -> &'static [CategoryEntry] {
    &REGISTRY
}

/// Look up a registry entry by normalized key (or any label `MainCategory` accepts).
pub fn lookup(key: &str) -> Option<&'static CategoryEntry> {
    let main = MainCategory::from_str(key)?;
    Some(entry(main))
}

/// Registry entry for a known main category.
pub fn entry(main: MainCategory) -> &'static CategoryEntry {
    REGISTRY
        .iter()
        .find(|e| e.main == main)
        .unwrap_or(&REGISTRY[REGISTRY.len() - 1])
}

/// Weedmaps category string for a key; empty when unknown.
pub fn weedmaps_categories(key: &str) -> &'static str {
    lookup(key).map(|e| e.weedmaps).unwrap_or("")
}

/// Leafly category/subcategory pair for a key; empty pair when unknown.
pub fn leafly_category(key: &str) -> LeaflyCategory {
    lookup(key).map(|e| e.leafly).unwrap_or_default()
}

/// Squarespace library slug for a key; empty when unknown.
pub fn library_slug(key: &str) -> &'static str {
    lookup(key).map(|e| e.library_slug).unwrap_or("")
}

/// Resolve a classifier subcategory label within a main category.
///
/// Matches display names or slugs case-insensitively, then cue fragments,
/// and finally falls back to the main category's first subcategory.
pub fn resolve_subcategory(main: MainCategory, label: &str) -> &'static Subcategory {
    let subs = entry(main).subcategories;
    let wanted = label.trim().to_lowercase();

    if let Some(found) = subs
        .iter()
        .find(|s| s.name.to_lowercase() == wanted || s.slug == wanted)
    {
        return found;
    }

    if !wanted.is_empty() {
        if let Some(found) = subs
            .iter()
            .find(|s| s.cues.iter().any(|cue| wanted.contains(cue)))
        {
            return found;
        }
    }

    &subs[0]
}

/// Find the main category a subcategory label belongs to, if any.
pub fn main_for_subcategory(label: &str) -> Option<MainCategory> {
    let wanted = label.trim().to_lowercase();
    REGISTRY
        .iter()
        .find(|e| {
            e.subcategories
                .iter()
                .any(|s| s.name.to_lowercase() == wanted || s.slug == wanted)
        })
        .map(|e| e.main)
}

/// Keyword guess of main category and subcategory from a product name.
///
/// Used when the classifier returns an unknown category or too few rows.
/// Falls back to Flower.
pub fn guess(name: &str) -> (MainCategory, &'static Subcategory) {
    let lower = name.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    let main = if has(&["5 pack", "5-pack"]) {
        MainCategory::FivePackPreroll
    } else if has(&["preroll", "pre-roll", "pre roll", "joint"]) {
        MainCategory::Preroll
    } else if has(&["cart", "vape", "disposable", "pod"]) {
        MainCategory::Vape
    } else if has(&["hash", "temple ball"]) {
        MainCategory::Hash
    } else if has(&["rosin"]) {
        MainCategory::Rosin
    } else {
        MainCategory::Flower
    };

    let subs = entry(main).subcategories;
    let subcategory = subs
        .iter()
        .find(|s| lower.contains(&s.name.to_lowercase()))
        .or_else(|| subs.iter().find(|s| s.cues.iter().any(|cue| lower.contains(cue))))
        .unwrap_or(&subs[0]);

    (main, subcategory)
}

/// Product-type vocabulary removed when cleaning strain names.
pub fn product_vocabulary() -> &'static [&'static str] {
    PRODUCT_VOCABULARY
}

/// Render the registry as prompt text: one line per main category.
pub fn describe() -> String {
    REGISTRY
        .iter()
        .map(|e| {
            let subs: Vec<String> = e
                .subcategories
                .iter()
                .map(|s| format!("\"{}\"", s.name))
                .collect();
            format!("- {}: {}", e.main.key(), subs.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
