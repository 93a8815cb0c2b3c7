//! PostgREST-backed metric persistence.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::SourceCredentials;
use crate::model::{Metric, TimeIntelligenceConfig};
use crate::timeintel::{build_time_intelligence_sql, validate_date_field};

/// Global metrics table.
const LIBRARY_TABLE: &str = "metrics_library";
/// Per-configuration metrics table.
const MODEL_TABLE: &str = "model_metrics";

/// Errors from metric persistence. Saves and deletes are explicit user
/// commands, so they fail loudly; only loads degrade.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("metric request failed: {0}")]
    Transport(String),

    #[error("unexpected metric response: {0}")]
    InvalidResponse(String),

    #[error("time-intelligence date field is not a known column: {0}")]
    UnknownDateField(String),
}

/// Row shape shared by both metric tables.
#[derive(Debug, Serialize, Deserialize)]
struct MetricRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    formula: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    required_fields: Vec<String>,
    #[serde(default)]
    aggregation_type: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    is_global: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    config_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_intelligence: Option<TimeIntelligenceConfig>,
    /// Rewritten windowed SQL, present iff `time_intelligence` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_intelligence_sql: Option<String>,
}

impl MetricRow {
    fn into_metric(self) -> Metric {
        Metric {
            id: self.id,
            name: self.name,
            formula: self.formula,
            description: self.description,
            format: self.format.unwrap_or_else(|| "number".to_string()),
            required_fields: self.required_fields,
            aggregation_type: self.aggregation_type,
            category: self.category,
            is_global: self.is_global,
            time_intelligence: self.time_intelligence,
        }
    }
}

/// Build the row for a metric, rewriting time-intelligence SQL when the
/// metric declares a mode. The date field is checked against
/// `available_fields` first (skipped when the caller has no field list).
fn build_metric_row(
    metric: &Metric,
    config_id: &str,
    is_global: bool,
    available_fields: &[String],
) -> Result<MetricRow, MetricsError> {
    let time_intelligence_sql = match &metric.time_intelligence {
        Some(config) => {
            if !available_fields.is_empty()
                && !validate_date_field(&config.date_field, available_fields)
            {
                return Err(MetricsError::UnknownDateField(config.date_field.clone()));
            }
            Some(build_time_intelligence_sql(config, &metric.formula))
        }
        None => None,
    };

    Ok(MetricRow {
        id: metric.id.clone(),
        name: metric.name.clone(),
        formula: metric.formula.clone(),
        description: metric.description.clone(),
        format: Some(metric.format.clone()),
        required_fields: metric.required_fields.clone(),
        aggregation_type: metric.aggregation_type.clone(),
        category: metric.category.clone(),
        is_global,
        config_id: (!is_global).then(|| config_id.to_string()),
        time_intelligence: metric.time_intelligence.clone(),
        time_intelligence_sql,
    })
}

/// Metric store over a PostgREST endpoint.
pub struct MetricsStore {
    rest_base: String,
    anon_key: String,
    client: reqwest::Client,
}

impl MetricsStore {
    pub fn new(creds: &SourceCredentials) -> Self {
        Self {
            rest_base: creds.rest_base(),
            anon_key: creds.anon_key.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_base, table)
    }

    fn table_for(is_global: bool) -> &'static str {
        if is_global {
            LIBRARY_TABLE
        } else {
            MODEL_TABLE
        }
    }

    /// Create or update a metric.
    ///
    /// `available_fields` is the schema field list used to validate a
    /// time-intelligence date column before the rewrite; pass an empty
    /// slice to skip the check.
    pub async fn save_metric(
        &self,
        metric: &Metric,
        config_id: &str,
        is_global: bool,
        available_fields: &[String],
    ) -> Result<Metric, MetricsError> {
        let table = Self::table_for(is_global);
        let row = build_metric_row(metric, config_id, is_global, available_fields)?;

        let request = match &metric.id {
            // Update existing.
            Some(id) => self
                .client
                .patch(self.table_url(table))
                .query(&[("id", format!("eq.{}", id))]),
            // Create new.
            None => self.client.post(self.table_url(table)),
        };

        let response = request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(|e| MetricsError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MetricsError::Transport(format!(
                "save to {} returned status {}",
                table,
                response.status()
            )));
        }

        let mut rows: Vec<MetricRow> = response
            .json()
            .await
            .map_err(|e| MetricsError::InvalidResponse(e.to_string()))?;
        rows.pop()
            .map(MetricRow::into_metric)
            .ok_or_else(|| MetricsError::InvalidResponse("save returned no row".to_string()))
    }

    /// Load global metrics plus the metrics of one configuration.
    ///
    /// Either half failing is logged and tolerated; the other half is
    /// still returned.
    pub async fn load_metrics(&self, config_id: &str) -> Vec<Metric> {
        let mut all = Vec::new();

        match self.fetch(LIBRARY_TABLE, None).await {
            Ok(rows) => all.extend(rows.into_iter().map(MetricRow::into_metric)),
            Err(e) => warn!(%e, "failed to load global metrics"),
        }

        match self.fetch(MODEL_TABLE, Some(config_id)).await {
            Ok(rows) => all.extend(rows.into_iter().map(MetricRow::into_metric)),
            Err(e) => warn!(%e, "failed to load model metrics"),
        }

        all
    }

    /// Delete a metric by id.
    pub async fn delete_metric(&self, metric_id: &str, is_global: bool) -> Result<(), MetricsError> {
        let table = Self::table_for(is_global);
        let response = self
            .client
            .delete(self.table_url(table))
            .query(&[("id", format!("eq.{}", metric_id))])
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .send()
            .await
            .map_err(|e| MetricsError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MetricsError::Transport(format!(
                "delete from {} returned status {}",
                table,
                response.status()
            )));
        }
        Ok(())
    }

    async fn fetch(
        &self,
        table: &str,
        config_id: Option<&str>,
    ) -> Result<Vec<MetricRow>, MetricsError> {
        let mut request = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "*")]);
        if let Some(config_id) = config_id {
            request = request.query(&[("config_id", format!("eq.{}", config_id))]);
        }

        let response = request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .send()
            .await
            .map_err(|e| MetricsError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MetricsError::Transport(format!(
                "load from {} returned status {}",
                table,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| MetricsError::InvalidResponse(e.to_string()))
    }
}
