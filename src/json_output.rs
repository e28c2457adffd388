//! JSON output format for inspection results
//!
//! Mirrors the text report's content in a machine-readable shape so the
//! results can feed dashboards or CI gates.

use serde::{Deserialize, Serialize};

use crate::session::InspectionSession;

/// Whole-run totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSummary {
    /// Distinct factories observed
    pub total_factories: usize,
    /// Calls recorded across all factories
    pub total_calls: u64,
    /// Seconds observed across all factories
    pub total_time_secs: f64,
}

/// One distinct call site and how often it fired
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonGroupedCall {
    /// Formatted call chain, oldest caller first
    pub stack: String,
    pub occurrences: usize,
}

/// Distribution statistics over one factory's call durations, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonExtendedStats {
    pub mean: f32,
    pub stddev: f32,
    pub min: f32,
    pub max: f32,
    pub median: f32,
    pub p95: f32,
    pub p99: f32,
}

/// Per-factory aggregate, one entry per factory name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    pub factory_name: String,
    pub total_calls: usize,
    pub total_time_secs: f64,
    pub time_per_call_secs: f64,
    pub worst_time_secs: f64,
    /// Strategy tags observed, e.g. ["build", "create"]
    pub strategies: Vec<String>,
    /// Factories invoked from within this factory's calls
    pub factories_called: Vec<String>,
    pub grouped_calls: Vec<JsonGroupedCall>,
    /// Only present with --stats-extended
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_stats: Option<JsonExtendedStats>,
}

/// A collapsed build-calls-create warning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWarning {
    /// The in-memory build call, e.g. "post#build"
    pub caller: String,
    /// The persistence-hitting create call it triggered, e.g. "user#create"
    pub called: String,
    /// Call chain of the triggered create, oldest caller first
    pub call_site: String,
    pub occurrences: usize,
}

/// A measurement anomaly excluded from the timing aggregates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonAnalysisError {
    pub message: String,
    /// Frame identifiers, newest first as recorded
    pub call_stack: Vec<String>,
}

/// Top-level JSON document for one inspection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    pub summary: JsonSummary,
    /// Reports sorted slowest first by total time
    pub reports: Vec<JsonReport>,
    pub optimization_warnings: Vec<JsonWarning>,
    pub analysis_errors: Vec<JsonAnalysisError>,
}

impl JsonOutput {
    /// Snapshot a finalized session. `extended` adds per-factory
    /// distribution statistics.
    pub fn from_session(session: &InspectionSession, extended: bool) -> Self {
        let summary = session.summary();

        let reports = session
            .sorted_reports()
            .into_iter()
            .map(|report| JsonReport {
                factory_name: report.factory_name().to_string(),
                total_calls: report.number_of_calls(),
                total_time_secs: report.total_time(),
                time_per_call_secs: report.time_per_call(),
                worst_time_secs: report.worst_time(),
                strategies: report
                    .strategies_used()
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                factories_called: session
                    .factories_called(report.factory_name())
                    .iter()
                    .map(|name| name.to_string())
                    .collect(),
                grouped_calls: report
                    .all_calls_grouped()
                    .into_iter()
                    .map(|group| JsonGroupedCall {
                        stack: group.stack,
                        occurrences: group.occurrences,
                    })
                    .collect(),
                extended_stats: if extended {
                    report.extended_stats().map(|stats| JsonExtendedStats {
                        mean: stats.mean,
                        stddev: stats.stddev,
                        min: stats.min,
                        max: stats.max,
                        median: stats.median,
                        p95: stats.p95,
                        p99: stats.p99,
                    })
                } else {
                    None
                },
            })
            .collect();

        let optimization_warnings = session
            .optimization_warnings()
            .iter()
            .map(|warning| JsonWarning {
                caller: warning.caller.description(),
                called: warning.called.description(),
                call_site: warning.called.printable_stack(),
                occurrences: warning.occurrences,
            })
            .collect();

        let analysis_errors = session
            .analysis_errors()
            .iter()
            .map(|error| JsonAnalysisError {
                message: error.message.clone(),
                call_stack: error.call_stack.clone(),
            })
            .collect();

        Self {
            summary: JsonSummary {
                total_factories: summary.total_factories,
                total_calls: summary.total_calls,
                total_time_secs: summary.total_time,
            },
            reports,
            optimization_warnings,
            analysis_errors,
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
