//! Per-factory aggregation of instrumented calls
//!
//! A `FactoryReport` owns every `FactoryCall` recorded for one factory name
//! and derives its timing metrics from that sequence on read. All times are
//! in seconds.

use std::collections::{BTreeSet, HashMap};

use crate::correlation::CorrelationMatch;
use crate::factory_call::{FactoryCall, Strategy};

/// One distinct call site and how often it fired
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedCalls {
    /// Formatted call chain, oldest caller first
    pub stack: String,
    /// How many recorded calls share this chain
    pub occurrences: usize,
}

/// Distribution statistics over one factory's call durations, in seconds
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedStats {
    pub mean: f32,
    pub stddev: f32,
    pub min: f32,
    pub max: f32,
    pub median: f32,
    pub p95: f32,
    pub p99: f32,
}

/// Report on how one factory was used across a test run
#[derive(Debug, Clone, Default)]
pub struct FactoryReport {
    factory_name: String,
    calls: Vec<FactoryCall>,
}

impl FactoryReport {
    pub fn new(factory_name: impl Into<String>) -> Self {
        Self {
            factory_name: factory_name.into(),
            calls: Vec::new(),
        }
    }

    pub fn factory_name(&self) -> &str {
        &self.factory_name
    }

    /// Record one more call of this factory
    pub fn update(&mut self, duration: f64, strategy: Strategy, call_stack: Vec<String>) {
        self.calls.push(FactoryCall::new(
            self.factory_name.clone(),
            strategy,
            duration,
            call_stack,
        ));
    }

    pub fn calls(&self) -> &[FactoryCall] {
        &self.calls
    }

    pub fn number_of_calls(&self) -> usize {
        self.calls.len()
    }

    pub fn total_time(&self) -> f64 {
        self.calls.iter().map(|call| call.duration).sum()
    }

    pub fn worst_time(&self) -> f64 {
        self.calls
            .iter()
            .map(|call| call.duration)
            .fold(0.0, f64::max)
    }

    pub fn time_per_call(&self) -> f64 {
        if self.calls.is_empty() {
            0.0
        } else {
            self.total_time() / self.calls.len() as f64
        }
    }

    /// Distinct strategies observed, in stable (enum) order
    pub fn strategies_used(&self) -> BTreeSet<Strategy> {
        self.calls.iter().map(|call| call.strategy).collect()
    }

    /// Group calls by their formatted call chain, most repeated first.
    ///
    /// Ties keep discovery order, so the first chain seen wins. The count of
    /// the top entry is the actionable signal: the same factory invoked the
    /// same way N times is a candidate for a shared fixture.
    pub fn all_calls_grouped(&self) -> Vec<GroupedCalls> {
        let mut first_seen: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<GroupedCalls> = Vec::new();

        for call in &self.calls {
            let stack = call.printable_stack();
            match first_seen.get(&stack) {
                Some(&slot) => groups[slot].occurrences += 1,
                None => {
                    first_seen.insert(stack.clone(), groups.len());
                    groups.push(GroupedCalls {
                        stack,
                        occurrences: 1,
                    });
                }
            }
        }

        groups.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
        groups
    }

    /// Probe whether any of `other`'s calls contained calls of this factory.
    ///
    /// For each of `other`'s recorded calls, collect every call of this
    /// report whose stack is fully contained in it. `None` means the two
    /// factories were never observed in a caller/callee relationship; a
    /// report is never called by itself.
    pub fn called_by(&self, other: &FactoryReport) -> Option<Vec<CorrelationMatch>> {
        if self.factory_name == other.factory_name {
            return None;
        }

        let mut matches = Vec::new();
        for outer in &other.calls {
            let called: Vec<FactoryCall> = self
                .calls
                .iter()
                .filter(|inner| outer.is_caller_of(inner))
                .cloned()
                .collect();
            if !called.is_empty() {
                matches.push(CorrelationMatch {
                    caller: outer.clone(),
                    called,
                });
            }
        }

        if matches.is_empty() {
            None
        } else {
            Some(matches)
        }
    }

    /// SIMD-accelerated distribution statistics over this factory's
    /// call durations. `None` for an empty report.
    pub fn extended_stats(&self) -> Option<ExtendedStats> {
        if self.calls.is_empty() {
            return None;
        }

        let durations: Vec<f32> = self.calls.iter().map(|call| call.duration as f32).collect();
        let v = trueno::Vector::from_slice(&durations);

        let mean = v.mean().unwrap_or(0.0);
        let stddev = v.stddev().unwrap_or(0.0);
        let min = v.min().unwrap_or(0.0);
        let max = v.max().unwrap_or(0.0);

        let mut sorted = durations;
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        Some(ExtendedStats {
            mean,
            stddev,
            min,
            max,
            median: percentile(&sorted, 50.0),
            p95: percentile(&sorted, 95.0),
            p99: percentile(&sorted, 99.0),
        })
    }
}

/// Linear-interpolated percentile over sorted data
fn percentile(sorted_data: &[f32], pct: f32) -> f32 {
    if sorted_data.is_empty() {
        return 0.0;
    }
    if sorted_data.len() == 1 {
        return sorted_data[0];
    }

    let index = (pct / 100.0) * (sorted_data.len() - 1) as f32;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted_data[lower]
    } else {
        let weight = index - lower as f32;
        sorted_data[lower] * (1.0 - weight) + sorted_data[upper] * weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(frames: &[&str]) -> Vec<String> {
        frames.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_new_report_is_empty() {
        let report = FactoryReport::new("user");
        assert_eq!(report.factory_name(), "user");
        assert_eq!(report.number_of_calls(), 0);
        assert_eq!(report.total_time(), 0.0);
        assert_eq!(report.worst_time(), 0.0);
        assert_eq!(report.time_per_call(), 0.0);
        assert!(report.strategies_used().is_empty());
    }

    #[test]
    fn test_update_appends_calls() {
        let mut report = FactoryReport::new("user");
        report.update(3.0, Strategy::Build, stack(&["a.rs:1"]));
        report.update(5.0, Strategy::Create, stack(&["b.rs:2"]));

        assert_eq!(report.number_of_calls(), 2);
        assert_eq!(report.total_time(), 8.0);
        assert_eq!(report.time_per_call(), 4.0);
        assert_eq!(report.worst_time(), 5.0);
    }

    #[test]
    fn test_update_called_n_times_counts_n() {
        let mut report = FactoryReport::new("user");
        for _ in 0..7 {
            report.update(0.1, Strategy::Build, stack(&["a.rs:1"]));
        }
        assert_eq!(report.number_of_calls(), 7);
    }

    #[test]
    fn test_total_is_sum_and_worst_is_max() {
        let mut report = FactoryReport::new("user");
        report.update(1.0, Strategy::Create, stack(&["a.rs:1"]));
        report.update(3.0, Strategy::Create, stack(&["a.rs:1"]));
        report.update(2.0, Strategy::Create, stack(&["a.rs:1"]));

        assert!((report.total_time() - 6.0).abs() < 1e-9);
        assert_eq!(report.worst_time(), 3.0);
    }

    #[test]
    fn test_strategies_used_are_distinct() {
        let mut report = FactoryReport::new("user");
        report.update(1.0, Strategy::Build, stack(&["a.rs:1"]));
        report.update(1.0, Strategy::Build, stack(&["a.rs:1"]));
        report.update(1.0, Strategy::Create, stack(&["a.rs:1"]));

        let strategies = report.strategies_used();
        assert_eq!(strategies.len(), 2);
        assert!(strategies.contains(&Strategy::Build));
        assert!(strategies.contains(&Strategy::Create));
    }

    #[test]
    fn test_all_calls_grouped_counts_repeated_sites() {
        let mut report = FactoryReport::new("user");
        report.update(0.1, Strategy::Build, stack(&["a.rs:1", "spec.rs:10"]));
        report.update(0.1, Strategy::Build, stack(&["a.rs:1", "spec.rs:10"]));
        report.update(0.1, Strategy::Build, stack(&["a.rs:1", "spec.rs:10"]));
        report.update(0.1, Strategy::Build, stack(&["b.rs:2", "spec.rs:20"]));

        let groups = report.all_calls_grouped();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].occurrences, 3);
        assert_eq!(groups[0].stack, "spec.rs:10 -> a.rs:1");
        assert_eq!(groups[1].occurrences, 1);
    }

    #[test]
    fn test_all_calls_grouped_ties_keep_discovery_order() {
        let mut report = FactoryReport::new("user");
        report.update(0.1, Strategy::Build, stack(&["first.rs:1"]));
        report.update(0.1, Strategy::Build, stack(&["second.rs:2"]));

        let groups = report.all_calls_grouped();
        assert_eq!(groups[0].stack, "first.rs:1");
        assert_eq!(groups[1].stack, "second.rs:2");
    }

    #[test]
    fn test_called_by_finds_contained_calls() {
        let mut user = FactoryReport::new("user");
        user.update(0.5, Strategy::Create, stack(&["factories.rs:12", "spec.rs:30"]));

        let mut post = FactoryReport::new("post");
        post.update(
            1.0,
            Strategy::Build,
            stack(&["factories.rs:12", "spec.rs:30", "suite.rs:5"]),
        );

        let matches = user.called_by(&post).expect("post calls user");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].caller.factory, "post");
        assert_eq!(matches[0].called.len(), 1);
        assert_eq!(matches[0].called[0].factory, "user");
    }

    #[test]
    fn test_called_by_none_when_unrelated() {
        let mut user = FactoryReport::new("user");
        user.update(0.5, Strategy::Create, stack(&["elsewhere.rs:1"]));

        let mut post = FactoryReport::new("post");
        post.update(1.0, Strategy::Build, stack(&["spec.rs:30", "suite.rs:5"]));

        assert!(user.called_by(&post).is_none());
    }

    #[test]
    fn test_called_by_self_is_none() {
        let mut user = FactoryReport::new("user");
        user.update(0.5, Strategy::Create, stack(&["a.rs:1", "b.rs:2"]));
        let same = user.clone();
        assert!(user.called_by(&same).is_none());
    }

    #[test]
    fn test_extended_stats_known_values() {
        let mut report = FactoryReport::new("user");
        report.update(1.0, Strategy::Create, stack(&["a.rs:1"]));
        report.update(2.0, Strategy::Create, stack(&["a.rs:1"]));
        report.update(3.0, Strategy::Create, stack(&["a.rs:1"]));

        let stats = report.extended_stats().unwrap();
        assert!((stats.mean - 2.0).abs() < 1e-4);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
        assert!((stats.median - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_extended_stats_empty_report() {
        let report = FactoryReport::new("user");
        assert!(report.extended_stats().is_none());
    }

    #[test]
    fn test_percentile_single_element() {
        assert_eq!(percentile(&[42.0], 99.0), 42.0);
    }

    #[test]
    fn test_percentile_interpolates() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&data, 50.0) - 2.5).abs() < 1e-6);
        assert_eq!(percentile(&data, 0.0), 1.0);
        assert_eq!(percentile(&data, 100.0), 4.0);
    }
}
