//! CLI argument parsing for Fabrica

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Output format for inspection results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Console summary plus report files (default)
    Text,
    /// JSON document on stdout for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "fabrica")]
#[command(version)]
#[command(about = "Test-data factory profiler with call correlation", long_about = None)]
pub struct Cli {
    /// JSONL event log to analyze, or `-` for stdin
    #[arg(value_name = "FILE", default_value = "-")]
    pub input: PathBuf,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Directory the report files are written to
    #[arg(short = 'o', long = "output-dir", value_name = "DIR", default_value = "tmp")]
    pub output_dir: PathBuf,

    /// How many of the slowest factories the console summary shows
    #[arg(long = "summary-size", value_name = "N", default_value = "3")]
    pub summary_size: usize,

    /// Project root for reducing raw backtrace lines to in-tree frames.
    /// Without it, call stacks are taken as already normalized.
    #[arg(long = "local-root", value_name = "DIR")]
    pub local_root: Option<PathBuf>,

    /// Include per-factory distribution statistics (percentiles, stddev)
    #[arg(long = "stats-extended")]
    pub stats_extended: bool,

    /// Enable debug logging to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["fabrica"]);
        assert_eq!(cli.input, PathBuf::from("-"));
        assert_eq!(cli.format, OutputFormat::Text);
        assert_eq!(cli.output_dir, PathBuf::from("tmp"));
        assert_eq!(cli.summary_size, 3);
        assert!(cli.local_root.is_none());
        assert!(!cli.stats_extended);
        assert!(!cli.debug);
    }

    #[test]
    fn test_parses_input_and_format() {
        let cli = Cli::parse_from(["fabrica", "--format", "json", "events.jsonl"]);
        assert_eq!(cli.input, PathBuf::from("events.jsonl"));
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_parses_output_options() {
        let cli = Cli::parse_from([
            "fabrica",
            "-o",
            "reports",
            "--summary-size",
            "10",
            "--local-root",
            "/home/dev/app",
            "--stats-extended",
        ]);
        assert_eq!(cli.output_dir, PathBuf::from("reports"));
        assert_eq!(cli.summary_size, 10);
        assert_eq!(cli.local_root, Some(PathBuf::from("/home/dev/app")));
        assert!(cli.stats_extended);
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["fabrica", "--format", "yaml"]).is_err());
    }
}
