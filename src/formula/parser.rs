//! Metric formula validation.
//!
//! Formulas arrive in two styles: lightweight SQL-ish aggregate
//! expressions (`SUM(sales) - SUM(cost)`) and, rarely, Excel-style
//! expressions. A grammar built for spreadsheets would reject perfectly
//! good business formulas, so validation runs in two tiers: a pragmatic
//! SQL-shape heuristic first, then the strict spreadsheet grammar as a
//! fallback. Validation failures are data, never errors.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::fields::extract_required_fields;
use super::sheet;

/// Recognized aggregate-call openings (`SUM(`, `count_distinct (`, …).
static AGGREGATE_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(SUM|COUNT|AVG|MIN|MAX|COUNT_DISTINCT)\s*\(").unwrap());

/// Arithmetic/comparison operator characters that mark a formula as
/// SQL-style.
static OPERATOR_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[+\-*/()<>=]").unwrap());

/// A single bare identifier (a direct column reference).
static BARE_IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+$").unwrap());

/// Outcome of validating a formula: the original text, a validity
/// verdict, and the resolved field dependency set. Recomputed on every
/// edit, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedFormula {
    pub formula: String,
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub required_fields: Vec<String>,
}

impl ParsedFormula {
    fn invalid(formula: &str, error: impl Into<String>) -> Self {
        Self {
            formula: formula.to_string(),
            is_valid: false,
            error: Some(error.into()),
            required_fields: Vec::new(),
        }
    }

    fn valid(formula: &str, required_fields: Vec<String>) -> Self {
        Self {
            formula: formula.to_string(),
            is_valid: true,
            error: None,
            required_fields,
        }
    }
}

/// Validate a formula and resolve its field dependencies.
///
/// The decision ladder:
/// 1. empty input is invalid outright;
/// 2. fields are extracted before any validation (an invalid outcome
///    clears them);
/// 3. unbalanced parentheses are invalid;
/// 4. anything that looks like SQL (aggregate call, operators, a bare
///    identifier, or at least one resolved field) is accepted;
/// 5. everything else must survive the spreadsheet grammar.
pub fn parse_formula(formula: &str, available_fields: &[String]) -> ParsedFormula {
    if formula.trim().is_empty() {
        return ParsedFormula::invalid(formula, "Formula cannot be empty");
    }

    let required_fields = extract_required_fields(formula, available_fields);

    let mut paren_depth: i32 = 0;
    for ch in formula.chars() {
        match ch {
            '(' => paren_depth += 1,
            ')' => paren_depth -= 1,
            _ => {}
        }
        if paren_depth < 0 {
            return ParsedFormula::invalid(
                formula,
                "Unbalanced parentheses: closing parenthesis without opening",
            );
        }
    }
    if paren_depth != 0 {
        return ParsedFormula::invalid(
            formula,
            "Unbalanced parentheses: unclosed opening parenthesis",
        );
    }

    let looks_like_sql = AGGREGATE_CALL.is_match(formula)
        || OPERATOR_CHARS.is_match(formula)
        || BARE_IDENTIFIER.is_match(formula.trim())
        || !required_fields.is_empty();

    if looks_like_sql {
        return ParsedFormula::valid(formula, required_fields);
    }

    let result = sheet::parse(formula);
    match result.first_error() {
        Some(message) => ParsedFormula::invalid(formula, message),
        None => ParsedFormula::valid(formula, required_fields),
    }
}
