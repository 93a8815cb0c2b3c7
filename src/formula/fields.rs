//! Required-field extraction from metric formulas.
//!
//! Tokenizes a formula, drops SQL keywords, and resolves the remaining
//! tokens against the known field list. The result is the formula's field
//! dependency set, used for impact analysis when the schema drifts.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Token pattern: identifiers with optional `table.field` qualification.
static FIELD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z_][A-Za-z0-9_.]*\b").unwrap());

/// Reserved words the extractor must never mistake for a field reference.
///
/// Covers aggregate names, clause keywords, and the window-function
/// vocabulary emitted by the time-intelligence rewriter.
static SQL_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "SUM",
        "COUNT",
        "AVG",
        "MIN",
        "MAX",
        "COUNT_DISTINCT",
        "IF",
        "AND",
        "OR",
        "NOT",
        "AS",
        "FROM",
        "WHERE",
        "GROUP",
        "ORDER",
        "BY",
        "HAVING",
        "DISTINCT",
        "CASE",
        "WHEN",
        "THEN",
        "ELSE",
        "END",
        "SELECT",
        "INSERT",
        "UPDATE",
        "DELETE",
        "JOIN",
        "LEFT",
        "RIGHT",
        "INNER",
        "OUTER",
        "ON",
        "BETWEEN",
        "IN",
        "LIKE",
        "IS",
        "NULL",
        "TRUE",
        "FALSE",
        "YEAR",
        "MONTH",
        "DAY",
        "LAG",
        "OVER",
        "PARTITION",
        "ROWS",
        "PRECEDING",
        "FOLLOWING",
        "CURRENT",
        "ROW",
        "YEAR_MONTH",
    ]
    .into_iter()
    .collect()
});

/// Extract the set of known fields a formula references.
///
/// Matching against `available_fields` is case-insensitive, but the
/// returned names carry the canonical casing from `available_fields`.
/// Duplicates collapse; first-seen order is preserved. An empty
/// `available_fields` yields an empty result without tokenizing.
pub fn extract_required_fields(formula: &str, available_fields: &[String]) -> Vec<String> {
    if available_fields.is_empty() {
        return Vec::new();
    }

    let mut found = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for token in FIELD_PATTERN.find_iter(formula) {
        let token = token.as_str();
        if SQL_KEYWORDS.contains(token.to_uppercase().as_str()) {
            continue;
        }

        let matching = available_fields
            .iter()
            .find(|field| field.eq_ignore_ascii_case(token));

        if let Some(field) = matching {
            if seen.insert(field.to_lowercase()) {
                found.push(field.clone());
            }
        }
    }

    found
}
