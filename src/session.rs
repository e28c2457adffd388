//! Inspection session: the process-wide accumulation and finalize pass
//!
//! A session receives raw instrumentation events, grows one
//! [`FactoryReport`] per factory name, collects measurement anomalies, and
//! on [`InspectionSession::finalize`] runs the correlation engine over
//! everything recorded so far. Construct one session per run and pass it to
//! whatever drives the test run; there is no ambient global.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::correlation::{self, Correlation, OptimizationWarning};
use crate::events::FactoryEvent;
use crate::factory_call::Strategy;
use crate::report::FactoryReport;

/// Validation failure for a malformed instrumentation event
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("event has an empty factory name")]
    EmptyFactoryName,
    #[error("unknown strategy tag `{0}`")]
    UnknownStrategy(String),
}

/// A non-fatal measurement anomaly collected during recording
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalysisError {
    pub message: String,
    pub call_stack: Vec<String>,
}

impl AnalysisError {
    /// Call chain rendered oldest caller first
    pub fn printable_call_stack(&self) -> String {
        let mut frames: Vec<&str> = self.call_stack.iter().map(String::as_str).collect();
        frames.reverse();
        frames.join(" -> ")
    }
}

/// Whole-run aggregates for the report header
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub total_factories: usize,
    pub total_calls: u64,
    /// Seconds observed across all factories
    pub total_time: f64,
}

/// Accumulates factory call events and produces correlated reports
#[derive(Debug, Default)]
pub struct InspectionSession {
    reports: Vec<FactoryReport>,
    index: HashMap<String, usize>,
    analysis_errors: Vec<AnalysisError>,
    correlation: Option<Correlation>,
}

impl InspectionSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one instrumentation event.
    ///
    /// A zero or negative measured duration is an instrumentation anomaly
    /// (frozen or skewed clock), not a zero-cost call: it is collected as an
    /// [`AnalysisError`] and excluded from every timing aggregate. Malformed
    /// events fail fast without touching any report.
    pub fn record(&mut self, event: FactoryEvent) -> Result<(), EventError> {
        if event.factory.is_empty() {
            return Err(EventError::EmptyFactoryName);
        }
        let strategy = Strategy::from_tag(&event.strategy)
            .ok_or_else(|| EventError::UnknownStrategy(event.strategy.clone()))?;

        let duration = event.finish - event.start;
        if duration <= 0.0 {
            let anomaly = if duration == 0.0 {
                "took zero time; cannot analyse timing. Time may be frozen \
                 if the clock is stubbed by a time-travel test helper"
            } else {
                "finished before it started; the event clock is skewed"
            };
            self.analysis_errors.push(AnalysisError {
                message: format!("A call to {}#{} {}.", event.factory, strategy, anomaly),
                call_stack: event.call_stack,
            });
            return Ok(());
        }

        let slot = match self.index.get(&event.factory) {
            Some(&slot) => slot,
            None => {
                let slot = self.reports.len();
                self.index.insert(event.factory.clone(), slot);
                self.reports.push(FactoryReport::new(event.factory));
                slot
            }
        };
        self.reports[slot].update(duration, strategy, event.call_stack);
        Ok(())
    }

    /// Run the correlation engine over everything recorded so far.
    ///
    /// Replaces any previous outcome, so re-finalizing after late `record`
    /// calls reflects the new state and never duplicates warnings.
    pub fn finalize(&mut self) {
        debug!(factories = self.reports.len(), "finalizing inspection");
        self.correlation = Some(correlation::analyze(&self.reports));
    }

    /// Reports in first-seen order
    pub fn reports(&self) -> &[FactoryReport] {
        &self.reports
    }

    /// Reports sorted slowest first by total time
    pub fn sorted_reports(&self) -> Vec<&FactoryReport> {
        let mut sorted: Vec<&FactoryReport> = self.reports.iter().collect();
        sorted.sort_by(|a, b| b.total_time().total_cmp(&a.total_time()));
        sorted
    }

    pub fn report_for(&self, factory: &str) -> Option<&FactoryReport> {
        self.index.get(factory).map(|&slot| &self.reports[slot])
    }

    /// Factories observed being invoked from within `factory`'s calls.
    /// Empty until [`InspectionSession::finalize`] has run.
    pub fn factories_called(&self, factory: &str) -> Vec<&str> {
        self.correlation
            .as_ref()
            .and_then(|c| c.factories_called(factory))
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Collapsed `build`→`create` warnings from the last finalize
    pub fn optimization_warnings(&self) -> &[OptimizationWarning] {
        self.correlation
            .as_ref()
            .map(|c| c.warnings())
            .unwrap_or_default()
    }

    pub fn analysis_errors(&self) -> &[AnalysisError] {
        &self.analysis_errors
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Whole-run totals, summed with Trueno for SIMD acceleration
    pub fn summary(&self) -> SessionSummary {
        if self.reports.is_empty() {
            return SessionSummary {
                total_factories: 0,
                total_calls: 0,
                total_time: 0.0,
            };
        }

        let counts: Vec<f32> = self
            .reports
            .iter()
            .map(|r| r.number_of_calls() as f32)
            .collect();
        let times: Vec<f32> = self.reports.iter().map(|r| r.total_time() as f32).collect();

        let total_calls = trueno::Vector::from_slice(&counts).sum().unwrap_or(0.0) as u64;
        let total_time = trueno::Vector::from_slice(&times).sum().unwrap_or(0.0) as f64;

        SessionSummary {
            total_factories: self.reports.len(),
            total_calls,
            total_time,
        }
    }
}
