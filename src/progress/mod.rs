use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporting for transfers and long-running streams
pub trait ProgressReporter: Send + Sync {
    fn bar(&self) -> &ProgressBar;
    fn finish(&self, msg: &str);
}

/// Indicatif-based progress reporter
pub struct IndicatifProgress {
    bar: ProgressBar,
}

impl IndicatifProgress {
    /// Byte counter for a transfer of known size.
    pub fn transfer(file_name: &str, total: u64) -> Self {
        let bar = ProgressBar::new(total);
        let template = format!(
            "{{spinner:.green}} {} [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}})",
            file_name
        );
        if let Ok(style) = ProgressStyle::default_bar().template(&template) {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self { bar }
    }

    /// Spinner for a transfer or stream whose size is unknown up front.
    pub fn spinner(msg: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} {bytes}") {
            bar.set_style(style);
        }
        bar.set_message(msg.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }
}

impl ProgressReporter for IndicatifProgress {
    fn bar(&self) -> &ProgressBar {
        &self.bar
    }

    fn finish(&self, msg: &str) {
        self.bar.finish_with_message(msg.to_string());
    }
}

/// No-op progress reporter for when progress reporting is disabled
pub struct NoOpProgress {
    bar: ProgressBar,
}

impl NoOpProgress {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl ProgressReporter for NoOpProgress {
    fn bar(&self) -> &ProgressBar {
        &self.bar
    }

    fn finish(&self, _msg: &str) {}
}

/// Progress reporter factory
pub struct ProgressFactory {
    enabled: bool,
}

impl ProgressFactory {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// A bar when the size is known, a spinner otherwise.
    pub fn file_transfer(&self, file_name: &str, total: Option<u64>) -> Box<dyn ProgressReporter> {
        if !self.enabled {
            return Box::new(NoOpProgress::new());
        }
        match total {
            Some(total) => Box::new(IndicatifProgress::transfer(file_name, total)),
            None => Box::new(IndicatifProgress::spinner(file_name)),
        }
    }
}
