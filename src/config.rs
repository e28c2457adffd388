//! Output configuration: report paths and console summary size

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

/// Prefix shared by every file this tool writes
pub const FILE_PREFIX: &str = "fabrica";

/// Where reports land and how much the console summary shows
#[derive(Debug, Clone)]
pub struct Config {
    output_dir: PathBuf,
    summary_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("tmp"),
            summary_size: 3,
        }
    }
}

impl Config {
    pub fn new(output_dir: impl Into<PathBuf>, summary_size: usize) -> Self {
        Self {
            output_dir: output_dir.into(),
            summary_size,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn summary_size(&self) -> usize {
        self.summary_size
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(format!("{FILE_PREFIX}.txt"))
    }

    pub fn warnings_path(&self) -> PathBuf {
        self.output_dir.join(format!("{FILE_PREFIX}_warnings.txt"))
    }

    pub fn analysis_errors_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{FILE_PREFIX}_analysis_errors.txt"))
    }

    /// Create the output directory and delete reports left over from a
    /// previous run. A file that cannot be deleted is logged and skipped,
    /// never fatal.
    pub fn ensure_report_directory(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("cannot create report directory {}", self.output_dir.display())
        })?;

        let entries = fs::read_dir(&self.output_dir).with_context(|| {
            format!("cannot list report directory {}", self.output_dir.display())
        })?;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let is_stale_report = name
                .to_str()
                .is_some_and(|name| name.starts_with(FILE_PREFIX));
            if is_stale_report {
                if let Err(error) = fs::remove_file(entry.path()) {
                    warn!(path = %entry.path().display(), %error, "could not delete stale report");
                }
            }
        }
        Ok(())
    }
}
