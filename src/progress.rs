//! Progress reporting
//!
//! Downloads report bytes, conversions report batches. Sinks are a side
//! channel only: nothing they do may change control flow.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

/// Receiver of progress events
///
/// All methods default to no-ops so implementors only override what they need.
pub trait ProgressSink: Send + Sync {
    /// A unit of work starts. `completed` is non-zero when resuming.
    fn start(&self, _label: &str, _total: Option<u64>, _completed: u64) {}

    /// `amount` more units are done
    fn advance(&self, _amount: u64) {}

    /// The unit of work ended (successfully or not)
    fn finish(&self) {}
}

/// Sink that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// What a progress bar counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressUnit {
    /// Transferred bytes
    Bytes,
    /// Discrete items such as batches
    Items,
}

impl ProgressUnit {
    fn template(self, bounded: bool) -> &'static str {
        match (self, bounded) {
            (Self::Bytes, true) => {
                "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})"
            }
            (Self::Bytes, false) => "{spinner} {msg} {bytes} ({bytes_per_sec})",
            (Self::Items, true) => "{msg} [{bar:40.cyan/blue}] {pos}/{len} ({elapsed})",
            (Self::Items, false) => "{spinner} {msg} {pos} ({elapsed})",
        }
    }

    fn style(self, bounded: bool) -> ProgressStyle {
        let fallback = if bounded {
            ProgressStyle::default_bar()
        } else {
            ProgressStyle::default_spinner()
        };
        ProgressStyle::with_template(self.template(bounded))
            .map(|style| style.progress_chars("=> "))
            .unwrap_or(fallback)
    }
}

/// Sink that draws an `indicatif` progress bar on stderr
///
/// Each `start` replaces the bar, so one sink serves a sequence of downloads
/// or batches. Start and finish are also logged through `tracing`. The bar is
/// not drawn when stderr is not a terminal.
pub struct BarProgress {
    unit: ProgressUnit,
    hidden: bool,
    state: Mutex<BarState>,
}

struct BarState {
    label: String,
    bar: ProgressBar,
}

impl BarProgress {
    /// Create a sink for the given unit
    pub fn new(unit: ProgressUnit) -> Self {
        Self {
            unit,
            hidden: false,
            state: Mutex::new(BarState {
                label: String::new(),
                bar: ProgressBar::hidden(),
            }),
        }
    }

    /// Sink counting bytes
    pub fn bytes() -> Self {
        Self::new(ProgressUnit::Bytes)
    }

    /// Sink counting items
    pub fn items() -> Self {
        Self::new(ProgressUnit::Items)
    }

    /// Never draw; events are still tracked and logged
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Units completed so far in the current unit of work
    pub fn position(&self) -> u64 {
        self.bar().map_or(0, |bar| bar.position())
    }

    /// Total of the current unit of work, if known
    pub fn length(&self) -> Option<u64> {
        self.bar().and_then(|bar| bar.length())
    }

    fn bar(&self) -> Option<ProgressBar> {
        self.state.lock().ok().map(|state| state.bar.clone())
    }

    fn draw_target(&self) -> ProgressDrawTarget {
        if self.hidden {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr()
        }
    }
}

impl fmt::Debug for BarProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BarProgress")
            .field("unit", &self.unit)
            .field("hidden", &self.hidden)
            .field("position", &self.position())
            .finish_non_exhaustive()
    }
}

impl ProgressSink for BarProgress {
    fn start(&self, label: &str, total: Option<u64>, completed: u64) {
        match total {
            Some(total) => info!("{label}: {completed}/{total}"),
            None => info!("{label}: started"),
        }

        let bar = ProgressBar::with_draw_target(total, self.draw_target());
        bar.set_style(self.unit.style(total.is_some()));
        bar.set_message(label.to_string());
        bar.set_position(completed);
        if total.is_none() && !self.hidden {
            bar.enable_steady_tick(Duration::from_millis(120));
        }

        if let Ok(mut state) = self.state.lock() {
            state.bar.finish_and_clear();
            state.label = label.to_string();
            state.bar = bar;
        }
    }

    fn advance(&self, amount: u64) {
        if let Some(bar) = self.bar() {
            bar.inc(amount);
        }
    }

    fn finish(&self) {
        let Ok(state) = self.state.lock() else {
            return;
        };
        let done = state.bar.position();
        state.bar.finish_and_clear();
        info!("{}: done ({done} total)", state.label);
    }
}
