//! Cross-factory correlation and anti-pattern detection
//!
//! Given every factory report from an inspection, this module infers which
//! factories were invoked from within the execution of which other factories
//! (call-stack containment) and flags the one transition that is almost
//! always unintended: an in-memory `build` call whose execution window
//! contains a persistence-hitting `create` call, typically reached through
//! an association.
//!
//! The scan is O(F² · C) in factories F and calls C per factory. Test runs
//! see tens to low hundreds of factories and the scan runs once at session
//! finalization, so the quadratic pass stays cheap in practice.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::factory_call::FactoryCall;
use crate::report::FactoryReport;

/// One caller call paired with the calls observed inside its execution window
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatch {
    /// The containing (outer) call
    pub caller: FactoryCall,
    /// Calls of the analyzed factory contained in the caller's stack
    pub called: Vec<FactoryCall>,
}

/// A collapsed `build`→`create` occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationWarning {
    /// The in-memory `build` call that triggered persistence
    pub caller: FactoryCall,
    /// The `create` call observed inside it
    pub called: FactoryCall,
    /// How many times this exact (caller, called) pair fired
    pub occurrences: usize,
}

/// Output of one correlation pass, owned by the engine rather than written
/// back onto the reports it analyzed
#[derive(Debug, Clone, Default)]
pub struct Correlation {
    factories_called: HashMap<String, BTreeSet<String>>,
    warnings: Vec<OptimizationWarning>,
}

impl Correlation {
    /// Factories observed being invoked from within `factory`'s calls
    pub fn factories_called(&self, factory: &str) -> Option<&BTreeSet<String>> {
        self.factories_called.get(factory)
    }

    /// Collapsed `build`→`create` warnings, in first-detected order
    pub fn warnings(&self) -> &[OptimizationWarning] {
        &self.warnings
    }
}

/// Correlate all reports of an inspection.
///
/// Every ordered pair of reports is probed with
/// [`FactoryReport::called_by`]; pair order follows the slice, which the
/// session keeps in first-seen order, so one pass is deterministic. Warnings
/// are collapsed by full (caller, called) record identity with an occurrence
/// count so a hot `build`→`create` path does not flood the report.
pub fn analyze(reports: &[FactoryReport]) -> Correlation {
    let mut factories_called: HashMap<String, BTreeSet<String>> = HashMap::new();
    let mut warning_slots: HashMap<(FactoryCall, FactoryCall), usize> = HashMap::new();
    let mut warnings: Vec<OptimizationWarning> = Vec::new();

    for report in reports {
        for other in reports {
            let Some(matches) = report.called_by(other) else {
                continue;
            };

            debug!(
                caller = other.factory_name(),
                called = report.factory_name(),
                matches = matches.len(),
                "correlated factory pair"
            );

            factories_called
                .entry(other.factory_name().to_string())
                .or_default()
                .insert(report.factory_name().to_string());

            for m in &matches {
                if !m.caller.strategy.is_build() {
                    continue;
                }
                for called in m.called.iter().filter(|c| c.strategy.is_create()) {
                    let key = (m.caller.clone(), called.clone());
                    match warning_slots.get(&key) {
                        Some(&slot) => warnings[slot].occurrences += 1,
                        None => {
                            warning_slots.insert(key, warnings.len());
                            warnings.push(OptimizationWarning {
                                caller: m.caller.clone(),
                                called: called.clone(),
                                occurrences: 1,
                            });
                        }
                    }
                }
            }
        }
    }

    Correlation {
        factories_called,
        warnings,
    }
}
