//! Record → canonical embedding text.
//!
//! The output is a block of `"Field: value"` lines in the configured field
//! order. A record missing any required field is skipped, not failed.

use crate::record::Record;

/// Values treated as absent after trimming (compared case-insensitively).
const MISSING_SENTINELS: [&str; 2] = ["nan", "none"];

/// Returns true for empty values and sentinel "missing" markers.
pub fn is_missing(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || MISSING_SENTINELS.iter().any(|s| v.eq_ignore_ascii_case(s))
}

/// Trims and collapses any whitespace run (newlines included) into one space,
/// so every field stays on its own line.
fn clean_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pure, deterministic normalizer over a fixed field list.
#[derive(Clone, Debug)]
pub struct Normalizer {
    required: Vec<String>,
    optional: Vec<String>,
}

impl Normalizer {
    pub fn new(required: Vec<String>, optional: Vec<String>) -> Self {
        Self { required, optional }
    }

    /// Builds the canonical text, or `None` when a required field is missing.
    pub fn normalize(&self, record: &Record) -> Option<String> {
        let mut lines = Vec::with_capacity(self.required.len() + self.optional.len());

        for name in &self.required {
            let value = record.get(name).filter(|v| !is_missing(v))?;
            lines.push(format!("{name}: {}", clean_value(value)));
        }

        for name in &self.optional {
            if let Some(value) = record.get(name).filter(|v| !is_missing(v)) {
                lines.push(format!("{name}: {}", clean_value(value)));
            }
        }

        Some(lines.join("\n"))
    }
}
