use std::time::Duration;

/// Session mode together with its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Mode {
    /// Type a fixed list of N words
    #[strum(to_string = "words")]
    WordCount(usize),
    /// Type as many words as possible before the deadline
    #[strum(to_string = "time")]
    TimeLimit(Duration),
}

/// When and how much to ask the word source for in open-ended sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Refill {
    /// Request more words once fewer than this many words remain ahead of the cursor
    pub low_water_mark: usize,
    pub batch_size: usize,
}

impl Default for Refill {
    fn default() -> Self {
        Self {
            low_water_mark: 10,
            batch_size: 30,
        }
    }
}

impl Mode {
    /// Size of the word list drawn when a session is created.
    pub fn initial_words(&self, refill: Refill) -> usize {
        match *self {
            Mode::WordCount(n) => n,
            Mode::TimeLimit(_) => refill.batch_size.max(refill.low_water_mark + 1),
        }
    }

    /// Completion fraction in `[0, 1]` for a started session.
    pub fn progress(&self, finalized_words: usize, elapsed: Duration) -> f64 {
        match *self {
            Mode::WordCount(0) => 1.0,
            Mode::WordCount(n) => (finalized_words.min(n) as f64) / n as f64,
            Mode::TimeLimit(limit) => {
                let limit = limit.as_secs_f64();
                if limit <= 0.0 {
                    return 0.0;
                }
                ((limit - elapsed.as_secs_f64()) / limit).clamp(0.0, 1.0)
            }
        }
    }

    /// Number of words to request after the cursor moves, given how many
    /// target words remain ahead of it.
    pub fn words_wanted(&self, remaining: usize, refill: Refill) -> Option<usize> {
        match *self {
            Mode::WordCount(_) => None,
            Mode::TimeLimit(_) if remaining < refill.low_water_mark => Some(refill.batch_size),
            Mode::TimeLimit(_) => None,
        }
    }

    pub fn time_limit(&self) -> Option<Duration> {
        match *self {
            Mode::TimeLimit(limit) => Some(limit),
            Mode::WordCount(_) => None,
        }
    }
}
