//! Text rendering for the console summary and the on-disk reports
//!
//! The console shows only the slowest factories; the full report, the
//! optimization warnings, and the analysis errors each go to their own file
//! under the configured output directory. All rendering is pure string
//! building so it stays testable without touching the filesystem.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::config::Config;
use crate::session::{AnalysisError, InspectionSession, SessionSummary};

/// "once", "twice", "5 times"
pub fn human_count(number: usize) -> String {
    match number {
        1 => "once".to_string(),
        2 => "twice".to_string(),
        n => format!("{n} times"),
    }
}

/// Seconds rendered as "2 mins 5.25 secs"
pub fn pretty_duration(seconds: f64) -> String {
    let total = seconds.max(0.0);
    let hours = (total / 3600.0).floor() as u64;
    let minutes = ((total % 3600.0) / 60.0).floor() as u64;
    let secs = total % 60.0;

    let mut parts = Vec::new();
    if hours == 1 {
        parts.push("1 hr".to_string());
    } else if hours > 1 {
        parts.push(format!("{hours} hrs"));
    }
    if minutes == 1 {
        parts.push("1 min".to_string());
    } else if minutes > 1 {
        parts.push(format!("{minutes} mins"));
    }
    parts.push(format!("{secs:.2} secs"));
    parts.join(" ")
}

fn header_columns() -> String {
    concat!(
        "  FACTORY NAME                   TOTAL  TOTAL       TIME PER   LONGEST   STRATEGIES\n",
        "                                 CALLS  TIME (s)    CALL (s)   CALL (s)  USED\n",
    )
    .to_string()
}

fn report_row(report: &crate::report::FactoryReport) -> String {
    let strategies: Vec<String> = report
        .strategies_used()
        .iter()
        .map(|s| s.to_string())
        .collect();
    format!(
        "  {:<30.30} {:>5}  {:>9.4}   {:>8.5}  {:>8.4}  {}\n",
        report.factory_name(),
        report.number_of_calls(),
        report.total_time(),
        report.time_per_call(),
        report.worst_time(),
        strategies.join(", "),
    )
}

/// Colored console summary showing the `summary_size` slowest factories
pub fn render_summary(session: &InspectionSession, summary_size: usize) -> String {
    let summary = session.summary();
    let mut out = String::new();

    out.push('\n');
    out.push_str(&render_banner(&summary));
    out.push_str(&header_columns().bold().to_string());
    for report in session.sorted_reports().into_iter().take(summary_size) {
        out.push_str(&report_row(report));
    }
    out.push_str(&format!(
        "  (Slowest sorted by {}.)\n",
        "total time".cyan()
    ));
    out
}

fn render_banner(summary: &SessionSummary) -> String {
    format!(
        "{}{}{}{} {} {}\n\n",
        "FACTORY INSPECTION: ".bold(),
        summary.total_factories.to_string().cyan(),
        " factories used, ".bold(),
        summary.total_calls.to_string().cyan(),
        "calls made over".bold(),
        pretty_duration(summary.total_time).cyan(),
    )
}

/// The full plain-text report: every factory plus its caller information
pub fn render_report(session: &InspectionSession) -> String {
    let summary = session.summary();
    let mut out = format!(
        "FACTORY INSPECTION: {} factories used, {} calls made over {}\n\n",
        summary.total_factories,
        summary.total_calls,
        pretty_duration(summary.total_time),
    );
    out.push_str(&header_columns());

    let sorted = session.sorted_reports();
    for report in &sorted {
        out.push_str(&report_row(report));
    }

    out.push_str("\n\nComplete caller information for each factory:\n");
    for report in &sorted {
        out.push_str(&format!("\nFACTORY: '{}'\n", report.factory_name()));
        out.push_str(&format!(
            "  - Called {}\n",
            human_count(report.number_of_calls())
        ));

        let called = session.factories_called(report.factory_name());
        if called.is_empty() {
            out.push_str("  - Calls no other factories.\n");
        } else {
            let names: Vec<String> = called.iter().map(|name| format!("'{name}'")).collect();
            out.push_str(&format!("  - Calls factory {}\n", names.join(" and ")));
        }

        for group in report.all_calls_grouped() {
            out.push_str(&format!(
                "    {} ({})\n",
                group.stack,
                human_count(group.occurrences)
            ));
        }
    }
    out
}

/// Distribution statistics block for the slowest factories
pub fn render_extended_stats(session: &InspectionSession, summary_size: usize) -> String {
    let mut out = String::from("\n  Extended statistics (seconds):\n");
    for report in session.sorted_reports().into_iter().take(summary_size) {
        if let Some(stats) = report.extended_stats() {
            out.push_str(&format!(
                "  {:<30.30} mean={:.4} sd={:.4} min={:.4} med={:.4} p95={:.4} p99={:.4} max={:.4}\n",
                report.factory_name(),
                stats.mean,
                stats.stddev,
                stats.min,
                stats.median,
                stats.p95,
                stats.p99,
                stats.max,
            ));
        }
    }
    out
}

/// Collapsed `build`→`create` warnings, one bullet per distinct pair
pub fn render_warnings(session: &InspectionSession) -> String {
    let warnings = session.optimization_warnings();
    let total: usize = warnings.iter().map(|w| w.occurrences).sum();
    let mut out = format!(
        "{} optimization warning(s) - In-memory 'build' strategy calls are \
         calling DB-hitting 'create' calls; this is usually unintended and \
         triggered via associations in the factory or the model.\n\n",
        total
    );
    for warning in warnings {
        out.push_str(&format!(
            "  * {} calls {} {} due to {}\n",
            warning.caller.description(),
            warning.called.description(),
            human_count(warning.occurrences),
            warning.called.printable_stack(),
        ));
    }
    out
}

/// Measurement anomalies, collapsed by identical message and stack
pub fn render_analysis_errors(session: &InspectionSession) -> String {
    let mut slots: std::collections::HashMap<&AnalysisError, usize> =
        std::collections::HashMap::new();
    let mut collapsed: Vec<(&AnalysisError, usize)> = Vec::new();
    for error in session.analysis_errors() {
        match slots.get(error) {
            Some(&slot) => collapsed[slot].1 += 1,
            None => {
                slots.insert(error, collapsed.len());
                collapsed.push((error, 1));
            }
        }
    }

    let mut out = format!("{} analysis error(s)\n\n", session.analysis_errors().len());
    for (index, (error, count)) in collapsed.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", index + 1, error.message));
        let occurrences = if *count > 1 {
            format!(" ({} occurrences)", count)
        } else {
            String::new()
        };
        out.push_str(&format!(
            "    * {}{}\n",
            error.printable_call_stack(),
            occurrences
        ));
    }
    out
}

/// Write the report files for a finalized session and return their paths.
///
/// The full report is always written; the warnings and analysis error files
/// only exist when there is something to say.
pub fn write_reports(session: &InspectionSession, config: &Config) -> Result<Vec<PathBuf>> {
    config.ensure_report_directory()?;
    let mut written = Vec::new();

    let report_path = config.report_path();
    fs::write(&report_path, render_report(session))
        .with_context(|| format!("cannot write report to {}", report_path.display()))?;
    written.push(report_path);

    if !session.optimization_warnings().is_empty() {
        let warnings_path = config.warnings_path();
        fs::write(&warnings_path, render_warnings(session))
            .with_context(|| format!("cannot write warnings to {}", warnings_path.display()))?;
        written.push(warnings_path);
    }

    if !session.analysis_errors().is_empty() {
        let errors_path = config.analysis_errors_path();
        fs::write(&errors_path, render_analysis_errors(session)).with_context(|| {
            format!("cannot write analysis errors to {}", errors_path.display())
        })?;
        written.push(errors_path);
    }

    Ok(written)
}
