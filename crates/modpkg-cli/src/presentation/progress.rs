//! Package download progress rendering.
//!
//! Fed by `PackagingProgress` events. A terminal gets an indicatif bar (or a
//! spinner while the total size is unknown); anything else gets one plain
//! line per ten percent.

use std::io::{self, IsTerminal};
use std::time::Duration;

use indicatif::{HumanBytes, ProgressBar, ProgressDrawTarget, ProgressStyle};
use modpkg_core::AppEvent;

pub struct FetchProgress {
    bar: Option<ProgressBar>,
    determinate: bool,
    last_plain_decile: Option<u64>,
}

impl FetchProgress {
    /// Create a renderer, auto-detecting terminal capability.
    pub fn new() -> Self {
        let bar = io::stderr().is_terminal().then(|| {
            let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
            bar.set_style(Self::spinner_style());
            bar.set_message("Preparing package");
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        });
        Self {
            bar,
            determinate: false,
            last_plain_decile: None,
        }
    }

    /// Render one event. Returns `true` once the run has finished.
    pub fn handle(&mut self, event: &AppEvent) -> bool {
        match event {
            AppEvent::PackagingProgress {
                percent,
                bytes_downloaded,
            } => {
                if *percent < 0.0 {
                    self.indeterminate(*bytes_downloaded);
                } else {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    self.percent(percent.round() as u64, *bytes_downloaded);
                }
                false
            }
            AppEvent::PackagingFinished { .. } => {
                if let Some(bar) = self.bar.take() {
                    bar.finish_and_clear();
                }
                true
            }
            _ => false,
        }
    }

    fn indeterminate(&mut self, bytes: u64) {
        if let Some(bar) = &self.bar {
            if self.determinate {
                bar.set_style(Self::spinner_style());
                self.determinate = false;
            }
            bar.set_message(format!("Downloading ({})", HumanBytes(bytes)));
        }
    }

    fn percent(&mut self, percent: u64, bytes: u64) {
        match &self.bar {
            Some(bar) => {
                if !self.determinate {
                    bar.set_style(Self::bar_style());
                    bar.set_length(100);
                    self.determinate = true;
                }
                bar.set_message(HumanBytes(bytes).to_string());
                bar.set_position(percent);
            }
            None => {
                let decile = percent / 10;
                if self.last_plain_decile != Some(decile) {
                    self.last_plain_decile = Some(decile);
                    eprintln!("Downloading: {percent}% ({})", HumanBytes(bytes));
                }
            }
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░")
    }
}

impl Default for FetchProgress {
    fn default() -> Self {
        Self::new()
    }
}
