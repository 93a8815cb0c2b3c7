use neuronlink::formula::parse_formula;

fn fields(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn empty_formula_reports_exact_message() {
    let parsed = parse_formula("", &fields(&["sales"]));
    assert!(!parsed.is_valid);
    assert_eq!(parsed.error.as_deref(), Some("Formula cannot be empty"));
    assert!(parsed.required_fields.is_empty());
    assert_eq!(parsed.formula, "");
}

#[test]
fn whitespace_only_formula_is_empty() {
    let parsed = parse_formula("  \t ", &fields(&["sales"]));
    assert!(!parsed.is_valid);
    assert_eq!(parsed.error.as_deref(), Some("Formula cannot be empty"));
}

#[test]
fn unclosed_parenthesis_is_invalid_with_no_fields() {
    let parsed = parse_formula("SUM(sales", &fields(&["sales"]));
    assert!(!parsed.is_valid);
    assert_eq!(
        parsed.error.as_deref(),
        Some("Unbalanced parentheses: unclosed opening parenthesis")
    );
    assert!(parsed.required_fields.is_empty());
}

#[test]
fn closing_without_opening_is_invalid() {
    let parsed = parse_formula("sales)", &fields(&["sales"]));
    assert!(!parsed.is_valid);
    assert_eq!(
        parsed.error.as_deref(),
        Some("Unbalanced parentheses: closing parenthesis without opening")
    );
    assert!(parsed.required_fields.is_empty());
}

#[test]
fn aggregate_difference_is_valid() {
    let parsed = parse_formula("SUM(sales) - SUM(cost)", &fields(&["sales", "cost"]));
    assert!(parsed.is_valid);
    assert!(parsed.error.is_none());
    assert_eq!(parsed.required_fields, vec!["sales", "cost"]);
}

#[test]
fn comparison_operators_count_as_sql_shape() {
    let parsed = parse_formula("sales > cost", &fields(&["sales", "cost"]));
    assert!(parsed.is_valid);
    assert_eq!(parsed.required_fields, vec!["sales", "cost"]);
}

#[test]
fn single_bare_identifier_is_valid() {
    let parsed = parse_formula("margin", &fields(&["sales"]));
    assert!(parsed.is_valid);
    assert!(parsed.required_fields.is_empty());
}

#[test]
fn known_field_alone_is_valid_with_dependency() {
    let parsed = parse_formula("sales", &fields(&["sales"]));
    assert!(parsed.is_valid);
    assert_eq!(parsed.required_fields, vec!["sales"]);
}

#[test]
fn gibberish_without_sql_shape_falls_to_sheet_grammar() {
    let parsed = parse_formula("some random words", &fields(&["sales"]));
    assert!(!parsed.is_valid);
    assert!(parsed.error.is_some());
    assert!(parsed.required_fields.is_empty());
    assert_eq!(parsed.formula, "some random words");
}

#[test]
fn count_distinct_is_recognized() {
    let parsed = parse_formula("COUNT_DISTINCT(customer_id)", &fields(&["customer_id"]));
    assert!(parsed.is_valid);
    assert_eq!(parsed.required_fields, vec!["customer_id"]);
}

#[test]
fn nested_aggregates_with_arithmetic() {
    let parsed = parse_formula(
        "(SUM(sales) - SUM(cost)) / SUM(sales)",
        &fields(&["sales", "cost"]),
    );
    assert!(parsed.is_valid);
    assert_eq!(parsed.required_fields, vec!["sales", "cost"]);
}

#[test]
fn qualified_field_dependencies_survive() {
    let parsed = parse_formula(
        "SUM(orders.amount) / COUNT(orders.id)",
        &fields(&["orders.amount", "orders.id"]),
    );
    assert!(parsed.is_valid);
    assert_eq!(parsed.required_fields, vec!["orders.amount", "orders.id"]);
}
