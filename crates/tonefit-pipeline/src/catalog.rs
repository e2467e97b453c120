//! The fixed color catalog and the rules that pick candidates from it.
//!
//! Both tables are `static` and read-only. Rules are evaluated top to
//! bottom; a candidate list is the union of every matching rule's colors,
//! deduplicated by name with the first occurrence kept.

use crate::tone::{Depth, Undertone};

/// A named reference color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogColor {
    /// Unique display name.
    pub name: &'static str,
    /// `#RRGGBB` display code.
    pub hex: &'static str,
}

const fn color(name: &'static str, hex: &'static str) -> CatalogColor {
    CatalogColor { name, hex }
}

/// Every color that can be recommended, in catalog order.
pub static CATALOG: [CatalogColor; 39] = [
    // Neutrals
    color("Pure White", "#FFFFFF"),
    color("Cream", "#FFFDD0"),
    color("Beige", "#F5F5DC"),
    color("Camel", "#C19A6B"),
    color("Tan", "#D2B48C"),
    color("Grey", "#808080"),
    color("Charcoal", "#36454F"),
    color("Black", "#000000"),
    // Blues
    color("Navy", "#000080"),
    color("Royal Blue", "#4169E1"),
    color("Sky Blue", "#87CEEB"),
    color("Teal", "#008080"),
    color("Cyan", "#00FFFF"),
    color("Indigo", "#4B0082"),
    // Greens
    color("Emerald", "#50C878"),
    color("Olive", "#808000"),
    color("Bottle Green", "#006A4E"),
    color("Mint", "#98FF98"),
    // Reds, pinks, purples
    color("Wine", "#722F37"),
    color("Burgundy", "#800020"),
    color("Maroon", "#800000"),
    color("Crimson", "#DC143C"),
    color("Baby Pink", "#F4C2C2"),
    color("Rose Pink", "#FF66CC"),
    color("Fuchsia", "#FF00FF"),
    color("Lavender", "#E6E6FA"),
    color("Deep Purple", "#36013F"),
    // Yellows, oranges
    color("Mustard", "#FFDB58"),
    color("Golden Yellow", "#FFDF00"),
    color("Pastel Yellow", "#FDFD96"),
    color("Rust", "#B7410E"),
    color("Burnt Orange", "#CC5500"),
    color("Peach", "#FFE5B4"),
    // Browns, metallics
    color("Chocolate Brown", "#7B3F00"),
    color("Coffee Brown", "#4B3621"),
    color("Bronze", "#CD7F32"),
    color("Gold", "#FFD700"),
    color("Silver", "#C0C0C0"),
    color("Rose Gold", "#B76E79"),
];

/// Look up a catalog entry and its position by name.
#[must_use]
pub fn lookup(name: &str) -> Option<(usize, &'static CatalogColor)> {
    CATALOG.iter().enumerate().find(|(_, c)| c.name == name)
}

/// When a rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCondition {
    /// Always applies.
    Always,
    /// Applies when the undertone is one of these.
    UndertoneIn(&'static [Undertone]),
    /// Applies when the depth is one of these. Never applies when depth
    /// is unknown (combined analyses).
    DepthIn(&'static [Depth]),
}

impl RuleCondition {
    /// Whether this condition holds. `depth` is `None` when selecting
    /// by undertone alone.
    #[must_use]
    pub fn matches(self, depth: Option<Depth>, undertone: Undertone) -> bool {
        match self {
            Self::Always => true,
            Self::UndertoneIn(set) => set.contains(&undertone),
            Self::DepthIn(set) => depth.is_some_and(|d| set.contains(&d)),
        }
    }
}

/// A condition and the color group it contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteRule {
    /// When the group is included.
    pub condition: RuleCondition,
    /// Catalog names, in priority order.
    pub colors: &'static [&'static str],
}

/// Recommendation rules in priority order.
pub static RULES: [PaletteRule; 6] = [
    PaletteRule {
        condition: RuleCondition::Always,
        colors: &[
            "Pure White",
            "Charcoal",
            "Black",
            "Navy",
            "Royal Blue",
            "Emerald",
            "Wine",
            "Burgundy",
        ],
    },
    PaletteRule {
        condition: RuleCondition::UndertoneIn(&[Undertone::Warm, Undertone::Olive]),
        colors: &["Cream", "Camel", "Tan", "Olive", "Mustard", "Gold"],
    },
    PaletteRule {
        condition: RuleCondition::UndertoneIn(&[Undertone::Cool, Undertone::Neutral]),
        colors: &["Grey", "Sky Blue", "Lavender", "Silver"],
    },
    PaletteRule {
        condition: RuleCondition::DepthIn(&[Depth::Wheatish, Depth::Dusky]),
        colors: &["Teal", "Indigo", "Rose Pink"],
    },
    PaletteRule {
        condition: RuleCondition::DepthIn(&[Depth::Dusky, Depth::Deep]),
        colors: &[
            "Bottle Green",
            "Crimson",
            "Deep Purple",
            "Burnt Orange",
            "Bronze",
        ],
    },
    PaletteRule {
        condition: RuleCondition::DepthIn(&[Depth::Fair]),
        colors: &["Baby Pink", "Mint", "Peach", "Pastel Yellow"],
    },
];

/// A candidate color with its catalog position (for tie-breaking).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Position in [`CATALOG`].
    pub catalog_index: usize,
    /// The catalog entry.
    pub color: &'static CatalogColor,
}

/// Union of the colors from every matching rule, in rule order, with
/// duplicates removed (first occurrence kept).
///
/// Pass `depth = None` to select by undertone alone.
#[must_use]
pub fn candidates(depth: Option<Depth>, undertone: Undertone) -> Vec<Candidate> {
    let mut out: Vec<Candidate> = Vec::new();
    let names = RULES
        .iter()
        .filter(|rule| rule.condition.matches(depth, undertone))
        .flat_map(|rule| rule.colors.iter().copied());
    for name in names {
        let Some((catalog_index, color)) = lookup(name) else {
            continue;
        };
        if out.iter().all(|c| c.catalog_index != catalog_index) {
            out.push(Candidate {
                catalog_index,
                color,
            });
        }
    }
    out
}
