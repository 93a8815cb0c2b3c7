use insta::assert_snapshot;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use neuronlink::model::{TimeIntelligenceConfig, TimeIntelligenceKind};
use neuronlink::timeintel::build_time_intelligence_sql;

fn config(kind: TimeIntelligenceKind) -> TimeIntelligenceConfig {
    TimeIntelligenceConfig {
        kind,
        base_metric_id: "revenue".to_string(),
        date_field: "o.created_at".to_string(),
        comparison_period: None,
    }
}

/// Every emitted template must parse as a SQL expression; the generated
/// text is persisted and executed downstream.
fn assert_parses_as_sql(expr: &str) {
    let sql = format!("SELECT {}", expr);
    Parser::parse_sql(&GenericDialect {}, &sql)
        .unwrap_or_else(|e| panic!("emitted SQL failed to parse: {}\n{}", e, expr));
}

#[test]
fn yoy_template() {
    let sql = build_time_intelligence_sql(&config(TimeIntelligenceKind::YearOverYear), "SUM(o.amount)");
    assert_snapshot!(sql, @"SUM(o.amount) - LAG(SUM(o.amount)) OVER (ORDER BY YEAR(o.created_at))");
    assert_parses_as_sql(&sql);
}

#[test]
fn mom_template() {
    let sql = build_time_intelligence_sql(&config(TimeIntelligenceKind::MonthOverMonth), "SUM(o.amount)");
    assert_snapshot!(sql, @"SUM(o.amount) - LAG(SUM(o.amount)) OVER (ORDER BY YEAR(o.created_at)*12 + MONTH(o.created_at))");
    assert_parses_as_sql(&sql);
}

#[test]
fn ytd_template() {
    let sql = build_time_intelligence_sql(&config(TimeIntelligenceKind::YearToDate), "SUM(o.amount)");
    assert_snapshot!(sql, @"SUM(SUM(o.amount)) OVER (PARTITION BY YEAR(o.created_at) ORDER BY o.created_at ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW)");
    assert_parses_as_sql(&sql);
}

#[test]
fn qtd_template() {
    let sql = build_time_intelligence_sql(&config(TimeIntelligenceKind::QuarterToDate), "SUM(o.amount)");
    assert_snapshot!(sql, @"SUM(SUM(o.amount)) OVER (PARTITION BY YEAR(o.created_at)*4 + QUARTER(o.created_at) ORDER BY o.created_at ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW)");
    assert_parses_as_sql(&sql);
}

#[test]
fn rolling_avg_templates() {
    let sql7 = build_time_intelligence_sql(&config(TimeIntelligenceKind::RollingAvg7d), "SUM(o.amount)");
    assert_snapshot!(sql7, @"AVG(SUM(o.amount)) OVER (ORDER BY o.created_at ROWS BETWEEN 6 PRECEDING AND CURRENT ROW)");
    assert_parses_as_sql(&sql7);

    let sql30 = build_time_intelligence_sql(&config(TimeIntelligenceKind::RollingAvg30d), "SUM(o.amount)");
    assert_snapshot!(sql30, @"AVG(SUM(o.amount)) OVER (ORDER BY o.created_at ROWS BETWEEN 29 PRECEDING AND CURRENT ROW)");
    assert_parses_as_sql(&sql30);
}

#[test]
fn none_kind_is_identity() {
    let sql = build_time_intelligence_sql(&config(TimeIntelligenceKind::None), "SUM(o.amount)");
    assert_eq!(sql, "SUM(o.amount)");
}

#[test]
fn base_formula_is_not_validated_here() {
    // Validation belongs to the formula compiler; the rewriter is a pure
    // template and happily substitutes whatever it is handed.
    let sql = build_time_intelligence_sql(&config(TimeIntelligenceKind::YearOverYear), "not sql at all");
    assert!(sql.contains("not sql at all - LAG(not sql at all)"));
}
