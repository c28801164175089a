use std::time::{Duration, Instant};

use crate::session::Session;

/// Derived numbers for the stats panel and the results view.
///
/// Always recomputed from the session; nothing here is stored back.
#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub total_chars: usize,
    pub total_words: usize,
    pub elapsed: Duration,
    pub wpm: f64,
    pub progress: f64,
    pub total_errors: usize,
    pub accuracy: f64,
    pub consistency: Option<f64>,
}

impl Stats {
    pub fn snapshot(session: &Session, now: Instant) -> Self {
        let total_chars = session
            .typed_words()
            .iter()
            .map(|w| w.chars().count())
            .sum();
        let total_words = session.typed_words().len();
        let elapsed = session.elapsed(now);

        Self {
            total_chars,
            total_words,
            elapsed,
            wpm: words_per_minute(total_words, elapsed),
            progress: session.progress(now),
            total_errors: session.total_errors(),
            accuracy: accuracy(session.keystrokes(), session.total_errors()),
            consistency: session.trace().consistency(),
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn wpm_label(&self) -> String {
        format!("{:.2} WPM", self.wpm)
    }
}

/// Words per minute; 0 until any time has passed.
pub fn words_per_minute(words: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        words as f64 * 60.0 / secs
    } else {
        0.0
    }
}

/// Share of keystrokes that landed on a fresh error position, as a rounded
/// percentage.
pub fn accuracy(keystrokes: usize, errors: usize) -> f64 {
    if keystrokes == 0 {
        return 100.0;
    }
    let correct = keystrokes.saturating_sub(errors);
    ((correct as f64 / keystrokes as f64) * 100.0).round()
}
