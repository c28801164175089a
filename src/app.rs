use std::time::Instant;

use crate::config::Config;
use crate::error::AppError;
use crate::keymap::{Command, Keymap};
use crate::runtime::AppEvent;
use crate::session::{Session, WordDemand};
use crate::stats::Stats;
use crate::theme::Theme;
use crate::word_source::{WordBatch, WordFeeder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Typing,
    Results,
}

/// Whether the event loop keeps going after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    config: Config,
    theme: Theme,
    keymap: Keymap,
    feeder: WordFeeder,
    session: Session,
    generation: u64,
    pub show_stats: bool,
}

impl App {
    pub fn new(config: Config, feeder: WordFeeder) -> Result<Self, AppError> {
        config.validate()?;
        let theme = config.theme()?;
        let keymap = Keymap::new(config.restart_binding()?);

        let session_config = config.session_config();
        let words = feeder.draw(session_config.mode.initial_words(session_config.refill));
        let session = Session::new(0, session_config, words);

        Ok(Self {
            config,
            theme,
            keymap,
            feeder,
            session,
            generation: 0,
            show_stats: false,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> AppState {
        if self.session.is_complete() {
            AppState::Results
        } else {
            AppState::Typing
        }
    }

    pub fn stats(&self, now: Instant) -> Stats {
        Stats::snapshot(&self.session, now)
    }

    /// Throws the current session away and starts a new one with fresh words.
    /// Batches still in flight for the old session are dropped on arrival.
    pub fn restart(&mut self) {
        self.generation += 1;
        let session_config = self.config.session_config();
        let words = self.feeder.draw_fresh(
            self.generation,
            session_config.mode.initial_words(session_config.refill),
        );
        self.session = Session::new(self.generation, session_config, words);
        tracing::info!(generation = self.generation, "session restarted");
    }

    pub fn handle(&mut self, event: AppEvent, now: Instant) -> Flow {
        match event {
            AppEvent::Key(key) => match self.keymap.resolve(&key) {
                Command::Quit => return Flow::Quit,
                Command::Restart => self.restart(),
                Command::ToggleStats => self.show_stats = !self.show_stats,
                Command::Type(keystroke) => {
                    if !self.session.is_complete() {
                        if let Some(demand) = self.session.apply(keystroke, now) {
                            self.request_words(demand);
                        }
                    }
                }
                Command::Ignore => {}
            },
            AppEvent::Tick => self.session.on_tick(now),
            AppEvent::Resize => {}
            AppEvent::Words(batch) => self.accept_words(batch, now),
        }
        Flow::Continue
    }

    fn accept_words(&mut self, batch: WordBatch, now: Instant) {
        let count = batch.words.len();
        match self
            .session
            .append_words(batch.generation, batch.words, now)
        {
            Ok(next) => {
                tracing::debug!(generation = batch.generation, count, "words appended");
                if let Some(demand) = next {
                    self.request_words(demand);
                }
            }
            Err(stale) => {
                tracing::debug!(
                    stale,
                    current = self.generation,
                    count,
                    "dropping words for an old session"
                );
            }
        }
    }

    fn request_words(&mut self, demand: WordDemand) {
        if !self.feeder.request(demand) {
            tracing::warn!(generation = demand.generation, "word feeder is gone");
            self.session.cancel_word_request();
        }
    }
}
