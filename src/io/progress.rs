//! Progress display for batch CLI operations

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::LazyLock;

static BAR_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Optional progress bar for long-running CLI work
///
/// Disabled reporters swallow every call, so call sites stay free of quiet
/// checks.
pub struct ProgressReporter {
    bar: Option<ProgressBar>,
}

impl ProgressReporter {
    /// Reporter over `len` steps; inert when `enabled` is false
    pub fn new(enabled: bool, len: u64, message: &'static str) -> Self {
        let bar = enabled.then(|| {
            let bar = ProgressBar::new(len);
            bar.set_style(BAR_STYLE.clone());
            bar.set_message(message);
            bar
        });
        Self { bar }
    }

    /// Advance by a number of steps
    pub fn advance(&self, delta: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(delta);
        }
    }

    /// Complete and clear the bar
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
