//! Call-stack normalization for hooks that ship raw backtrace lines
//!
//! Reduces full backtrace lines like
//! `/home/dev/app/spec/models/user_spec.rb:42:in 'block (2 levels)'`
//! to in-tree `file:line` frame identifiers relative to the project root.
//! Frames outside the root are library noise and are dropped; duplicates
//! keep their first occurrence so the chain stays readable.

use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;

/// Filters raw stack lines down to in-tree `file:line` identifiers
#[derive(Debug, Clone)]
pub struct StackFilter {
    pattern: Regex,
}

impl StackFilter {
    pub fn new(local_root: &Path) -> Result<Self> {
        let root = local_root.to_string_lossy();
        let root = root.trim_end_matches('/');
        let pattern = Regex::new(&format!(r"^{}/(.+:\d+)", regex::escape(root)))
            .context("invalid local root for stack filtering")?;
        Ok(Self { pattern })
    }

    /// Keep in-root frames, relativized, first occurrence wins
    pub fn normalize(&self, raw: &[String]) -> Vec<String> {
        let mut frames: Vec<String> = Vec::new();
        for line in raw {
            let Some(captures) = self.pattern.captures(line) else {
                continue;
            };
            let frame = captures[1].to_string();
            if !frames.contains(&frame) {
                frames.push(frame);
            }
        }
        frames
    }
}
