// Library surface for the binary and for headless/integration tests.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod diff;
pub mod error;
pub mod keymap;
pub mod language;
pub mod logging;
pub mod mode;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod theme;
pub mod time_series;
pub mod ui;
pub mod word_source;

/// Interval between ticks: WPM samples, timer refresh and the time-limit check.
pub const TICK_RATE_MS: u64 = 1000;
