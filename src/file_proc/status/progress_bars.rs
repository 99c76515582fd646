use std::borrow::Cow;
use std::time::Duration;

use indicatif::MultiProgress;
use indicatif::{ProgressBar, ProgressStyle};

const STATUS_BAR_COUNT: usize = 4;

/// One slot per display line; spinners narrate, bars count.
#[derive(Debug, Copy, Clone)]
pub enum JobStatusBar {
    Scan,
    Hash,
    HashBar,
    FileBar,
}

impl JobStatusBar {
    fn to_index(self) -> usize {
        match self {
            JobStatusBar::Scan => 0,
            JobStatusBar::Hash => 1,
            JobStatusBar::HashBar => 2,
            JobStatusBar::FileBar => 3,
        }
    }
}

impl std::ops::Index<JobStatusBar> for [ProgressBar; STATUS_BAR_COUNT] {
    type Output = ProgressBar;

    fn index(&self, bar: JobStatusBar) -> &Self::Output {
        &self[bar.to_index()]
    }
}

pub struct JobStatusBars {}

const DEFAULT_SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner} {prefix:.bold.dim} {wide_msg}";
const DEFAULT_BAR_TEMPLATE: &str =
    "[{elapsed_precise}] {prefix:.bold}▕{bar:.blue}▏{pos}/{len} {wide_msg}";
const DEFAULT_FINISH_TEMPLATE: &str = "[{elapsed_precise}] {msg}";
const DEFAULT_STEADY_TICK_MS: u64 = 100;

impl JobStatusBars {
    fn new_spinner() -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        let spinner_style = ProgressStyle::with_template(DEFAULT_SPINNER_TEMPLATE)
            .unwrap()
            .tick_strings(&[".  ", ".. ", "...", " ..", "  .", "   "]);
        pb.set_style(spinner_style);
        pb
    }

    fn new_progress_bar() -> ProgressBar {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::with_template(DEFAULT_BAR_TEMPLATE)
                .unwrap()
                .progress_chars("█▓▒░  "),
        );
        pb
    }

    pub fn new_progress_bars() -> ([ProgressBar; STATUS_BAR_COUNT], MultiProgress) {
        let m = MultiProgress::new();

        let bars: [ProgressBar; STATUS_BAR_COUNT] = [
            m.add(JobStatusBars::new_spinner()),      // JobStatusBar::Scan
            m.add(JobStatusBars::new_spinner()),      // JobStatusBar::Hash
            m.add(JobStatusBars::new_progress_bar()), // JobStatusBar::HashBar
            m.add(JobStatusBars::new_progress_bar()), // JobStatusBar::FileBar
        ];

        (bars, m)
    }

    pub fn new_finish_style() -> ProgressStyle {
        ProgressStyle::with_template(DEFAULT_FINISH_TEMPLATE).unwrap()
    }
}

pub trait JobProgressBar {
    fn finish_with_finish_style(&self, message: impl Into<Cow<'static, str>>);
    fn enable_steady_tick_default(&self);
}

impl JobProgressBar for ProgressBar {
    fn finish_with_finish_style(&self, message: impl Into<Cow<'static, str>>) {
        self.set_style(JobStatusBars::new_finish_style());
        self.finish_with_message(message);
    }
    fn enable_steady_tick_default(&self) {
        self.enable_steady_tick(Duration::from_millis(DEFAULT_STEADY_TICK_MS));
    }
}
