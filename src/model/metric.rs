use serde::{Deserialize, Serialize};

/// The fixed catalog of time-intelligence transforms.
///
/// Wire values match the persisted metric rows (`YoY`, `rolling_avg_7d`, …).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeIntelligenceKind {
    #[serde(rename = "YoY")]
    YearOverYear,
    #[serde(rename = "MoM")]
    MonthOverMonth,
    #[serde(rename = "YTD")]
    YearToDate,
    #[serde(rename = "QTD")]
    QuarterToDate,
    #[serde(rename = "rolling_avg_7d")]
    RollingAvg7d,
    #[serde(rename = "rolling_avg_30d")]
    RollingAvg30d,
    /// No transform; the base formula passes through unchanged.
    #[default]
    #[serde(rename = "none")]
    None,
}

impl TimeIntelligenceKind {
    /// Human-readable description shown in metric editors.
    pub fn description(&self) -> &'static str {
        match self {
            Self::YearOverYear => "Year-over-Year comparison (current year vs prior year)",
            Self::MonthOverMonth => "Month-over-Month comparison (current month vs prior month)",
            Self::YearToDate => "Year-to-Date cumulative total",
            Self::QuarterToDate => "Quarter-to-Date cumulative total",
            Self::RollingAvg7d => "7-day rolling average",
            Self::RollingAvg30d => "30-day rolling average",
            Self::None => "No time intelligence applied",
        }
    }
}

/// Configuration attached to a metric that requests a time-intelligence
/// transform. Ephemeral input to the rewriter; the rewritten SQL is what
/// gets persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeIntelligenceConfig {
    #[serde(rename = "type")]
    pub kind: TimeIntelligenceKind,
    pub base_metric_id: String,
    /// Qualified date column, e.g. `orders.created_at`.
    pub date_field: String,
    /// Reserved for custom rolling windows (days). Carried but unused by
    /// the rewriter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_period: Option<u32>,
}

/// A metric definition as persisted by the metrics store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub formula: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Display format hint (`number`, `currency`, `percent`).
    #[serde(default = "default_format")]
    pub format: String,
    /// Field identifiers the formula references, from the compiler.
    #[serde(default)]
    pub required_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub is_global: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_intelligence: Option<TimeIntelligenceConfig>,
}

fn default_format() -> String {
    "number".to_string()
}
