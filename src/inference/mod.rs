//! Semantic-type inference from column names.
//!
//! A small ordered rule table maps a column name to its semantic category
//! (identifier, date, measure, boolean, text) with first-match-wins
//! semantics; anything unmatched is a dimension. Rule order is part of the
//! contract: `created_at` must classify as a date even though `_at` is not
//! an identifier suffix, and `order_id` must classify as an identifier
//! before the measure rule can see the `order` substring.

use crate::model::SemanticType;

/// A name predicate used by a type rule.
#[derive(Debug, Clone, Copy)]
enum NamePattern {
    /// Whole-name match.
    Exact(&'static [&'static str]),
    /// Name ends with any of these.
    Suffix(&'static [&'static str]),
    /// Name starts with any of these.
    Prefix(&'static [&'static str]),
    /// Name contains any of these.
    Contains(&'static [&'static str]),
}

impl NamePattern {
    fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(tokens) => tokens.contains(&name),
            Self::Suffix(tokens) => tokens.iter().any(|t| name.ends_with(t)),
            Self::Prefix(tokens) => tokens.iter().any(|t| name.starts_with(t)),
            Self::Contains(tokens) => tokens.iter().any(|t| name.contains(t)),
        }
    }
}

/// One inference rule: a semantic type plus the patterns that claim it.
#[derive(Debug, Clone, Copy)]
struct TypeRule {
    /// Rule identifier, for diagnostics.
    name: &'static str,
    result: SemanticType,
    /// Any matching pattern makes the rule match.
    patterns: &'static [NamePattern],
}

impl TypeRule {
    fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(name))
    }
}

/// The default rules, evaluated top to bottom.
static TYPE_RULES: &[TypeRule] = &[
    TypeRule {
        name: "identifier",
        result: SemanticType::Identifier,
        patterns: &[
            NamePattern::Exact(&["id", "pk", "fk", "uuid"]),
            NamePattern::Suffix(&["_id", "_key", "_code"]),
        ],
    },
    TypeRule {
        name: "date",
        result: SemanticType::Date,
        patterns: &[
            NamePattern::Contains(&["date", "time", "created", "updated", "timestamp"]),
            NamePattern::Suffix(&["_at"]),
            NamePattern::Prefix(&["dt_"]),
        ],
    },
    TypeRule {
        name: "measure",
        result: SemanticType::Measure,
        patterns: &[
            NamePattern::Contains(&[
                "amount", "price", "total", "sum", "revenue", "quantity", "sales", "cost",
            ]),
            NamePattern::Prefix(&["amt_", "val_"]),
        ],
    },
    TypeRule {
        name: "boolean",
        result: SemanticType::Boolean,
        patterns: &[NamePattern::Prefix(&["is_", "has_", "can_", "should_"])],
    },
    TypeRule {
        name: "text",
        result: SemanticType::Text,
        patterns: &[
            NamePattern::Contains(&["description", "comment", "text", "note"]),
            NamePattern::Exact(&["name"]),
            NamePattern::Suffix(&["_name"]),
        ],
    },
];

/// Infer the semantic type of a column from its name.
///
/// Deterministic and case-insensitive; always returns a value, with
/// [`SemanticType::Dimension`] as the default for unmatched names.
pub fn infer_semantic_type(field_name: &str) -> SemanticType {
    let name = field_name.to_lowercase();
    TYPE_RULES
        .iter()
        .find(|rule| rule.matches(&name))
        .map(|rule| rule.result)
        .unwrap_or(SemanticType::Dimension)
}

/// Name of the rule that classified a column, for diagnostics output.
pub fn matching_rule_name(field_name: &str) -> &'static str {
    let name = field_name.to_lowercase();
    TYPE_RULES
        .iter()
        .find(|rule| rule.matches(&name))
        .map(|rule| rule.name)
        .unwrap_or("dimension")
}
