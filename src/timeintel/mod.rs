//! Time-intelligence SQL rewriting.
//!
//! Rewrites a base aggregate expression into a windowed SQL expression for
//! date-relative transforms: period-over-period deltas via `LAG`,
//! to-date cumulative sums partitioned on period boundaries, and rolling
//! averages over fixed frames. The emitted text is a compatibility
//! surface: it is persisted with the metric and executed downstream, so
//! the templates are exact.
//!
//! No validation of the base formula happens here; the formula compiler
//! runs earlier in the pipeline.

use crate::model::{Metric, TimeIntelligenceConfig, TimeIntelligenceKind};

/// Rewrite `base_formula` according to the config's transform kind.
///
/// `TimeIntelligenceKind::None` returns the base formula unchanged.
///
/// # Example
///
/// ```
/// use neuronlink::model::{TimeIntelligenceConfig, TimeIntelligenceKind};
/// use neuronlink::timeintel::build_time_intelligence_sql;
///
/// let config = TimeIntelligenceConfig {
///     kind: TimeIntelligenceKind::YearOverYear,
///     base_metric_id: "revenue".to_string(),
///     date_field: "orders.created_at".to_string(),
///     comparison_period: None,
/// };
/// assert_eq!(
///     build_time_intelligence_sql(&config, "SUM(orders.amount)"),
///     "SUM(orders.amount) - LAG(SUM(orders.amount)) OVER (ORDER BY YEAR(orders.created_at))"
/// );
/// ```
pub fn build_time_intelligence_sql(config: &TimeIntelligenceConfig, base_formula: &str) -> String {
    let date = &config.date_field;
    match config.kind {
        TimeIntelligenceKind::YearOverYear => format!(
            "{base} - LAG({base}) OVER (ORDER BY YEAR({date}))",
            base = base_formula,
            date = date
        ),
        // YEAR*12 + MONTH gives a monotonic ordering for LAG.
        TimeIntelligenceKind::MonthOverMonth => format!(
            "{base} - LAG({base}) OVER (ORDER BY YEAR({date})*12 + MONTH({date}))",
            base = base_formula,
            date = date
        ),
        TimeIntelligenceKind::YearToDate => format!(
            "SUM({base}) OVER (PARTITION BY YEAR({date}) ORDER BY {date} ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW)",
            base = base_formula,
            date = date
        ),
        // YEAR*4 + QUARTER partitions by unique quarter.
        TimeIntelligenceKind::QuarterToDate => format!(
            "SUM({base}) OVER (PARTITION BY YEAR({date})*4 + QUARTER({date}) ORDER BY {date} ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW)",
            base = base_formula,
            date = date
        ),
        // Current row plus the 6 preceding.
        TimeIntelligenceKind::RollingAvg7d => format!(
            "AVG({base}) OVER (ORDER BY {date} ROWS BETWEEN 6 PRECEDING AND CURRENT ROW)",
            base = base_formula,
            date = date
        ),
        // Current row plus the 29 preceding.
        TimeIntelligenceKind::RollingAvg30d => format!(
            "AVG({base}) OVER (ORDER BY {date} ROWS BETWEEN 29 PRECEDING AND CURRENT ROW)",
            base = base_formula,
            date = date
        ),
        TimeIntelligenceKind::None => base_formula.to_string(),
    }
}

/// Whether a metric carries a time-intelligence config at all.
pub fn requires_time_intelligence(metric: &Metric) -> bool {
    metric.time_intelligence.is_some()
}

/// Case-insensitive membership check for the date column, run before
/// rewriting so the emitted SQL never references a nonexistent column.
pub fn validate_date_field(date_field: &str, available_fields: &[String]) -> bool {
    available_fields
        .iter()
        .any(|field| field.eq_ignore_ascii_case(date_field))
}
