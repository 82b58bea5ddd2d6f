//! Download progress display
//!
//! The downloader reports a completed fraction; this module turns it into
//! either an indicatif bar (interactive terminals) or the fixed-width text
//! bar written with carriage returns.
//!
//! # Examples
//!
//! ```rust,no_run
//! use rdams_client::app::ProgressSink;
//! use rdams_client::cli::ProgressDisplay;
//!
//! let mut display = ProgressDisplay::new("rda_request_123", false);
//! display.update(0.0);
//! display.update(0.5);
//! display.update(1.0);
//! ```

use std::io::{self, Write};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::app::ProgressSink;
use crate::constants::progress;

/// Resolution of the indicatif bar
const BAR_STEPS: u64 = 1000;

/// A progress fraction classified into its display state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressState {
    /// Between 0 and 1 exclusive of completion
    Running(f64),
    /// Negative (or not a number): the run stopped
    Halted,
    /// 1 or more
    Done,
}

impl ProgressState {
    pub fn from_fraction(fraction: f64) -> Self {
        if fraction.is_nan() || fraction < 0.0 {
            ProgressState::Halted
        } else if fraction >= 1.0 {
            ProgressState::Done
        } else {
            ProgressState::Running(fraction)
        }
    }

    /// Fraction to draw; a halted bar is drawn empty
    pub fn shown_fraction(&self) -> f64 {
        match self {
            ProgressState::Running(fraction) => *fraction,
            ProgressState::Halted => 0.0,
            ProgressState::Done => 1.0,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            ProgressState::Running(_) => "",
            ProgressState::Halted => progress::HALT_STATUS,
            ProgressState::Done => progress::DONE_STATUS,
        }
    }

    pub fn is_terminal_state(&self) -> bool {
        !matches!(self, ProgressState::Running(_))
    }
}

/// Render the text progress line for `fraction`
///
/// The line starts with a carriage return so repeated writes overwrite it.
pub fn render_progress(fraction: f64, directory: &str) -> String {
    let state = ProgressState::from_fraction(fraction);
    let shown = state.shown_fraction();
    let block = ((progress::BAR_LENGTH as f64) * shown).round() as usize;
    let block = block.min(progress::BAR_LENGTH);

    format!(
        "\rDownloading Request to './{}' directory.  Download Progress: [{}{}] {:.1}% {}",
        directory,
        "=".repeat(block),
        " ".repeat(progress::BAR_LENGTH - block),
        shown * 100.0,
        state.status()
    )
}

/// Progress output for one download run
#[derive(Debug)]
pub struct ProgressDisplay {
    directory: String,
    bar: Option<ProgressBar>,
}

impl ProgressDisplay {
    /// Create a display for downloads into `directory`
    ///
    /// An indicatif bar is used only when `enable_bars` is set and stdout is
    /// a terminal; otherwise the text bar is printed.
    pub fn new(directory: impl Into<String>, enable_bars: bool) -> Self {
        let directory = directory.into();
        let is_terminal = atty::is(atty::Stream::Stdout);
        let bar = if enable_bars && is_terminal {
            Self::build_bar(&directory)
        } else {
            debug!("Using text progress output");
            None
        };

        Self { directory, bar }
    }

    fn build_bar(directory: &str) -> Option<ProgressBar> {
        let style = match ProgressStyle::default_bar()
            .template("{msg} [{bar:20.cyan/blue}] {percent:>3}% [{elapsed_precise}]")
        {
            Ok(style) => style.progress_chars("=> "),
            Err(e) => {
                debug!("Progress bar template error, falling back to text: {}", e);
                return None;
            }
        };

        let bar = ProgressBar::new(BAR_STEPS);
        bar.set_style(style);
        bar.set_message(format!("Downloading Request to './{}' directory.", directory));
        Some(bar)
    }

    fn update_text(&self, fraction: f64) {
        let state = ProgressState::from_fraction(fraction);
        let mut stdout = io::stdout();
        // A closed or full stdout must not abort the download, so write errors are ignored
        let _ = write!(stdout, "{}", render_progress(fraction, &self.directory));
        if state.is_terminal_state() {
            let _ = writeln!(stdout);
        }
        let _ = stdout.flush();
    }
}

impl ProgressSink for ProgressDisplay {
    fn update(&mut self, fraction: f64) {
        let Some(bar) = &self.bar else {
            self.update_text(fraction);
            return;
        };

        match ProgressState::from_fraction(fraction) {
            ProgressState::Running(fraction) => {
                bar.set_position((fraction * BAR_STEPS as f64).round() as u64);
            }
            ProgressState::Halted => bar.abandon_with_message(progress::HALT_STATUS),
            ProgressState::Done => {
                bar.set_position(BAR_STEPS);
                bar.finish_with_message(progress::DONE_STATUS);
            }
        }
    }
}
