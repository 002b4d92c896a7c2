//! Lightweight progress reporting for the batch loop.
//!
//! Use `NoopProgress` for headless runs and tests, `IndicatifProgress` when
//! stderr is a terminal.

use indicatif::{ProgressBar, ProgressStyle};

/// Minimal progress interface used by the ingestion driver.
pub trait Progress: Send + Sync {
    /// Set known total steps (batches).
    fn set_total(&self, _n: u64) {}
    /// Advance by one batch and show a short message.
    fn step(&self, _msg: &str) {}
    /// Finish the UI.
    fn finish(&self, _msg: &str) {}
}

/// No-op reporter.
#[derive(Default, Clone, Copy)]
pub struct NoopProgress;
impl Progress for NoopProgress {}

/// Indicatif-based batch bar.
pub struct IndicatifProgress {
    pb: ProgressBar,
}

impl IndicatifProgress {
    /// Bounded bar; the length is usually reset by [`Progress::set_total`].
    pub fn bar(len: u64) -> Self {
        let pb = ProgressBar::new(len);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} batches ({eta}) {msg}",
        )
        .map(|s| s.progress_chars("##-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        Self { pb }
    }

    /// Shared handle to the bar, e.g. for a log writer that suspends it.
    pub fn handle(&self) -> ProgressBar {
        self.pb.clone()
    }
}

impl Progress for IndicatifProgress {
    fn set_total(&self, n: u64) {
        self.pb.set_length(n);
    }
    fn step(&self, msg: &str) {
        self.pb.inc(1);
        self.pb.set_message(msg.to_string());
    }
    fn finish(&self, msg: &str) {
        self.pb.finish_with_message(msg.to_string());
    }
}
