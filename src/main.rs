use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use fabrica::{
    cli::{Cli, OutputFormat},
    config::Config,
    events,
    frames::StackFilter,
    json_output::JsonOutput,
    session::InspectionSession,
    text_report,
};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    let mut events = events::read_events_from_path(&args.input)?;

    if let Some(root) = &args.local_root {
        let filter = StackFilter::new(root)?;
        for event in &mut events {
            event.call_stack = filter.normalize(&event.call_stack);
        }
    }

    let mut session = InspectionSession::new();
    for (number, event) in events.into_iter().enumerate() {
        let label = format!("{}#{}", event.factory, event.strategy);
        session
            .record(event)
            .with_context(|| format!("invalid event {} ({label})", number + 1))?;
    }

    if session.is_empty() {
        println!("No factory calls recorded.");
        return Ok(());
    }

    session.finalize();

    match args.format {
        OutputFormat::Json => {
            let output = JsonOutput::from_session(&session, args.stats_extended);
            println!("{}", output.to_json()?);
        }
        OutputFormat::Text => {
            print!("{}", text_report::render_summary(&session, args.summary_size));
            if args.stats_extended {
                print!(
                    "{}",
                    text_report::render_extended_stats(&session, args.summary_size)
                );
            }

            let config = Config::new(args.output_dir, args.summary_size);
            text_report::write_reports(&session, &config)?;

            println!(
                "\nFull report in '{}'",
                config.report_path().display().to_string().cyan()
            );
            let warnings = session.optimization_warnings();
            if !warnings.is_empty() {
                let total: usize = warnings.iter().map(|w| w.occurrences).sum();
                println!(
                    "{} optimization warning(s) in '{}'",
                    total,
                    config.warnings_path().display().to_string().cyan()
                );
            }
            if !session.analysis_errors().is_empty() {
                println!(
                    "{} analysis error(s) in '{}'",
                    session.analysis_errors().len(),
                    config.analysis_errors_path().display().to_string().cyan()
                );
            }
        }
    }

    Ok(())
}
