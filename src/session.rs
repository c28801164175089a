use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use crate::diff;
use crate::mode::{Mode, Refill};
use crate::stats::words_per_minute;
use crate::time_series::{TimeSeriesPoint, WpmTrace};

/// Insertion point into the typed-word sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub word: usize,
    pub char: usize,
}

impl Cursor {
    pub fn new(word: usize, char: usize) -> Self {
        Self { word, char }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Completed,
}

/// A keystroke after key-binding resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keystroke {
    Char(char),
    Boundary,
    Backspace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub mode: Mode,
    pub refill: Refill,
}

impl SessionConfig {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            refill: Refill::default(),
        }
    }
}

/// A request for more target words, tagged with the session generation so
/// answers that arrive after a restart can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordDemand {
    pub generation: u64,
    pub count: usize,
}

/// State of one typing test, from the first draw of words until restart.
///
/// All mutation goes through [`Session::apply`], [`Session::on_tick`] and
/// [`Session::append_words`]; the caller feeds them one event at a time.
#[derive(Debug)]
pub struct Session {
    generation: u64,
    config: SessionConfig,
    target_words: Vec<String>,
    typed_words: Vec<String>,
    cursor: Cursor,
    phase: Phase,
    started_at: Option<Instant>,
    completed_at: Option<Instant>,
    keystrokes: usize,
    total_errors: usize,
    error_positions: HashSet<(usize, usize)>,
    furthest_finalized: usize,
    // keystrokes held back while the cursor waits for more target words
    backlog: VecDeque<Keystroke>,
    awaiting_words: bool,
    trace: WpmTrace,
}

impl Session {
    pub fn new(generation: u64, config: SessionConfig, target_words: Vec<String>) -> Self {
        Self {
            generation,
            config,
            target_words: sanitize(target_words),
            typed_words: vec![String::new()],
            cursor: Cursor::default(),
            phase: Phase::Idle,
            started_at: None,
            completed_at: None,
            keystrokes: 0,
            total_errors: 0,
            error_positions: HashSet::new(),
            furthest_finalized: 0,
            backlog: VecDeque::new(),
            awaiting_words: false,
            trace: WpmTrace::default(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    pub fn target_words(&self) -> &[String] {
        &self.target_words
    }

    pub fn typed_words(&self) -> &[String] {
        &self.typed_words
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Completed
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn keystrokes(&self) -> usize {
        self.keystrokes
    }

    pub fn total_errors(&self) -> usize {
        self.total_errors
    }

    pub fn trace(&self) -> &WpmTrace {
        &self.trace
    }

    pub fn is_awaiting_words(&self) -> bool {
        self.awaiting_words
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Target word for slot `idx`, or `""` while the slot has no word yet.
    pub fn target_word(&self, idx: usize) -> &str {
        self.target_words.get(idx).map_or("", String::as_str)
    }

    /// Time since the first keystroke, frozen once the session completes.
    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.started_at {
            Some(start) => self
                .completed_at
                .unwrap_or(now)
                .saturating_duration_since(start),
            None => Duration::ZERO,
        }
    }

    /// Completion fraction: word-based in word-count mode, a countdown in
    /// time-limit mode, and 0 before the first keystroke.
    pub fn progress(&self, now: Instant) -> f64 {
        if !self.has_started() {
            return 0.0;
        }
        self.config
            .mode
            .progress(self.furthest_finalized, self.elapsed(now))
    }

    /// Applies one keystroke. Returns a word request when the session wants
    /// more target words; the caller forwards it without waiting for an answer.
    pub fn apply(&mut self, key: Keystroke, now: Instant) -> Option<WordDemand> {
        if self.is_complete() || self.check_deadline(now) {
            return None;
        }

        if !self.backlog.is_empty() {
            self.backlog.push_back(key);
            return self.pending_demand();
        }

        self.dispatch(key, now);
        self.pending_demand()
    }

    /// Periodic refresh: enforces the deadline and samples the WPM trace.
    pub fn on_tick(&mut self, now: Instant) {
        if self.phase != Phase::Running || self.check_deadline(now) {
            return;
        }

        let elapsed = self.elapsed(now);
        if elapsed > Duration::ZERO {
            let wpm = words_per_minute(self.typed_words.len(), elapsed);
            self.trace
                .push(TimeSeriesPoint::new(elapsed.as_secs_f64(), wpm));
        }
    }

    /// Appends words delivered by the word source and replays any keystrokes
    /// that were waiting for them. Batches from another generation are ignored
    /// and reported by returning `Err` with the stale generation.
    pub fn append_words(
        &mut self,
        generation: u64,
        words: Vec<String>,
        now: Instant,
    ) -> Result<Option<WordDemand>, u64> {
        if generation != self.generation {
            return Err(generation);
        }

        self.awaiting_words = false;
        self.target_words.extend(sanitize(words));

        if self.is_complete() || self.check_deadline(now) {
            return Ok(None);
        }

        while let Some(key) = self.backlog.pop_front() {
            if key == Keystroke::Boundary && !self.can_advance() {
                self.backlog.push_front(key);
                break;
            }
            self.dispatch(key, now);
            if self.is_complete() {
                break;
            }
        }

        Ok(self.pending_demand())
    }

    /// Clears the in-flight flag when a word request could not be delivered,
    /// so the next keystroke asks again.
    pub fn cancel_word_request(&mut self) {
        self.awaiting_words = false;
    }

    /// Completes a time-limited session whose deadline has passed.
    pub fn check_deadline(&mut self, now: Instant) -> bool {
        let (Some(limit), Some(start)) = (self.config.mode.time_limit(), self.started_at) else {
            return false;
        };
        if self.phase == Phase::Running && now.saturating_duration_since(start) >= limit {
            self.complete(start + limit);
            return true;
        }
        false
    }

    fn dispatch(&mut self, key: Keystroke, now: Instant) {
        match key {
            Keystroke::Char(c) => self.type_char(c, now),
            Keystroke::Boundary => self.boundary(now),
            Keystroke::Backspace => self.backspace(),
        }
    }

    fn start(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
            self.phase = Phase::Running;
            tracing::info!(
                generation = self.generation,
                mode = %self.config.mode,
                "session started"
            );
        }
    }

    fn type_char(&mut self, c: char, now: Instant) {
        self.start(now);

        let pos = (self.cursor.word, self.cursor.char);
        let class = diff::classify_at(self.target_word(pos.0), pos.1, c);
        self.keystrokes += 1;
        if class.is_error() && self.error_positions.insert(pos) {
            self.total_errors += 1;
        }

        self.typed_words[self.cursor.word].push(c);
        self.cursor.char += 1;

        if self.on_last_word() {
            let target_len = self.target_word(self.cursor.word).chars().count();
            if self.cursor.char >= target_len {
                self.complete(now);
            }
        }
    }

    fn boundary(&mut self, now: Instant) {
        self.start(now);

        if self.can_advance() {
            self.typed_words.push(String::new());
            self.cursor.word += 1;
            self.cursor.char = 0;
            self.furthest_finalized = self.furthest_finalized.max(self.cursor.word);
            return;
        }

        match self.config.mode {
            Mode::WordCount(_) => self.complete(now),
            Mode::TimeLimit(_) => {
                tracing::debug!(
                    generation = self.generation,
                    word = self.cursor.word,
                    "word boundary deferred until more words arrive"
                );
                self.backlog.push_back(Keystroke::Boundary);
            }
        }
    }

    fn backspace(&mut self) {
        if self.cursor.char == 0 {
            if self.cursor.word > 0 {
                self.typed_words.pop();
                self.cursor.word -= 1;
                self.cursor.char = self.typed_words[self.cursor.word].chars().count();
            }
            return;
        }

        self.cursor.char -= 1;
        let word = &mut self.typed_words[self.cursor.word];
        if let Some((byte_idx, _)) = word.char_indices().nth(self.cursor.char) {
            word.truncate(byte_idx);
        }
    }

    fn can_advance(&self) -> bool {
        self.cursor.word + 1 < self.target_words.len()
    }

    fn on_last_word(&self) -> bool {
        matches!(self.config.mode, Mode::WordCount(_))
            && self.cursor.word + 1 >= self.target_words.len()
    }

    fn pending_demand(&mut self) -> Option<WordDemand> {
        if self.awaiting_words || self.is_complete() {
            return None;
        }

        let refill = self.config.refill;
        let remaining = self
            .target_words
            .len()
            .saturating_sub(self.cursor.word + 1);
        let count = if self.backlog.is_empty() {
            self.config.mode.words_wanted(remaining, refill)?
        } else {
            refill.batch_size.max(1)
        };

        self.awaiting_words = true;
        tracing::debug!(
            generation = self.generation,
            remaining,
            count,
            "requesting more words"
        );
        Some(WordDemand {
            generation: self.generation,
            count,
        })
    }

    fn complete(&mut self, at: Instant) {
        if self.is_complete() {
            return;
        }
        self.phase = Phase::Completed;
        self.completed_at = Some(at);
        self.furthest_finalized = self.furthest_finalized.max(self.cursor.word + 1);
        self.backlog.clear();
        tracing::info!(
            generation = self.generation,
            words = self.typed_words.len(),
            errors = self.total_errors,
            "session completed"
        );
    }
}

/// Words must be non-empty and free of whitespace; anything else is split or
/// dropped.
fn sanitize(words: Vec<String>) -> Vec<String> {
    if words
        .iter()
        .all(|w| !w.is_empty() && !w.chars().any(char::is_whitespace))
    {
        return words;
    }
    words
        .iter()
        .flat_map(|w| w.split_whitespace())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::CharClass;
    use assert_matches::assert_matches;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    fn word_count_session(list: &[&str]) -> Session {
        Session::new(
            0,
            SessionConfig::new(Mode::WordCount(list.len())),
            words(list),
        )
    }

    fn timed_session(list: &[&str], secs: u64, refill: Refill) -> Session {
        Session::new(
            0,
            SessionConfig {
                mode: Mode::TimeLimit(Duration::from_secs(secs)),
                refill,
            },
            words(list),
        )
    }

    fn type_str(session: &mut Session, text: &str, now: Instant) -> Vec<WordDemand> {
        text.chars()
            .filter_map(|c| {
                let key = if c == ' ' {
                    Keystroke::Boundary
                } else {
                    Keystroke::Char(c)
                };
                session.apply(key, now)
            })
            .collect()
    }

    #[test]
    fn test_new_session_is_idle() {
        let s = word_count_session(&["the", "cat"]);
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.typed_words(), &[String::new()]);
        assert_eq!(s.cursor(), Cursor::new(0, 0));
        assert!(!s.has_started());
        assert!(!s.is_complete());
        assert_eq!(s.progress(Instant::now()), 0.0);
    }

    #[test]
    fn test_first_char_starts_session() {
        let now = Instant::now();
        let mut s = word_count_session(&["the", "cat"]);
        s.apply(Keystroke::Char('t'), now);
        assert_eq!(s.phase(), Phase::Running);
        assert_eq!(s.started_at(), Some(now));
    }

    #[test]
    fn test_backspace_does_not_start_session() {
        let mut s = word_count_session(&["the"]);
        s.apply(Keystroke::Backspace, Instant::now());
        assert!(!s.has_started());
    }

    #[test]
    fn test_the_cat_scenario() {
        let now = Instant::now();
        let mut s = word_count_session(&["the", "cat"]);
        type_str(&mut s, "the cat", now);

        assert_eq!(s.typed_words(), &words(&["the", "cat"]));
        assert_eq!(s.cursor(), Cursor::new(1, 3));
        assert!(s.is_complete());
        assert_eq!(s.progress(now), 1.0);
        for (target, typed) in s.target_words().iter().zip(s.typed_words()) {
            assert!(diff::classify_word(target, typed)
                .iter()
                .all(|c| c.class == CharClass::Correct));
        }
    }

    #[test]
    fn test_overflow_typing_is_kept() {
        let now = Instant::now();
        let mut s = word_count_session(&["cat", "dog"]);
        type_str(&mut s, "catx", now);
        assert_eq!(s.typed_words()[0], "catx");
        assert_eq!(s.cursor(), Cursor::new(0, 4));
        assert_eq!(s.total_errors(), 1);
    }

    #[test]
    fn test_backspace_inverts_insert() {
        let now = Instant::now();
        let mut s = word_count_session(&["hello", "world"]);
        type_str(&mut s, "he", now);
        let typed_before = s.typed_words().to_vec();
        let cursor_before = s.cursor();

        s.apply(Keystroke::Char('z'), now);
        s.apply(Keystroke::Backspace, now);

        assert_eq!(s.typed_words(), typed_before.as_slice());
        assert_eq!(s.cursor(), cursor_before);
    }

    #[test]
    fn test_backspace_at_origin_is_noop() {
        let now = Instant::now();
        let mut s = word_count_session(&["hello"]);
        for _ in 0..3 {
            s.apply(Keystroke::Backspace, now);
            assert_eq!(s.typed_words(), &[String::new()]);
            assert_eq!(s.cursor(), Cursor::new(0, 0));
        }
    }

    #[test]
    fn test_backspace_across_boundary_restores_previous_word() {
        let now = Instant::now();
        let mut s = word_count_session(&["hello", "world", "again"]);
        type_str(&mut s, "helo ", now);
        assert_eq!(s.cursor(), Cursor::new(1, 0));
        assert_eq!(s.typed_words().len(), 2);

        s.apply(Keystroke::Backspace, now);
        assert_eq!(s.typed_words(), &words(&["helo"]));
        assert_eq!(s.cursor(), Cursor::new(0, 4));

        // Editing continues from the end of the restored word
        s.apply(Keystroke::Backspace, now);
        assert_eq!(s.typed_words(), &words(&["hel"]));
        assert_eq!(s.cursor(), Cursor::new(0, 3));
    }

    #[test]
    fn test_backspace_handles_multibyte_chars() {
        let now = Instant::now();
        let mut s = word_count_session(&["café", "crème"]);
        type_str(&mut s, "café", now);
        // Last char of the first word does not complete a two-word session
        assert!(!s.is_complete());
        s.apply(Keystroke::Backspace, now);
        assert_eq!(s.typed_words()[0], "caf");
        assert_eq!(s.cursor(), Cursor::new(0, 3));
    }

    #[test]
    fn test_boundary_on_empty_word_is_accepted() {
        let now = Instant::now();
        let mut s = word_count_session(&["a", "b", "c"]);
        s.apply(Keystroke::Boundary, now);
        s.apply(Keystroke::Boundary, now);
        assert_eq!(s.typed_words(), &words(&["", "", ""]));
        assert_eq!(s.cursor(), Cursor::new(2, 0));
    }

    #[test]
    fn test_word_count_progress_after_k_boundaries() {
        let n = 5;
        let list = ["a", "b", "c", "d", "e"];
        for k in 0..=n {
            let now = Instant::now();
            let mut s = word_count_session(&list);
            s.apply(Keystroke::Char('a'), now);
            s.apply(Keystroke::Backspace, now);
            for _ in 0..k {
                s.apply(Keystroke::Boundary, now);
            }
            assert_eq!(s.progress(now), k as f64 / n as f64, "k = {k}");
        }
    }

    #[test]
    fn test_boundary_on_last_word_completes_without_advancing() {
        let now = Instant::now();
        let mut s = word_count_session(&["one", "two"]);
        type_str(&mut s, "one t ", now);
        assert!(s.is_complete());
        assert_eq!(s.cursor().word, 1);
        assert_eq!(s.typed_words().len(), 2);
    }

    #[test]
    fn test_word_count_progress_never_decreases() {
        let now = Instant::now();
        let mut s = word_count_session(&["a", "b", "c", "d"]);
        type_str(&mut s, "a b ", now);
        let before = s.progress(now);
        s.apply(Keystroke::Backspace, now);
        assert!(s.progress(now) >= before);
    }

    #[test]
    fn test_completed_session_ignores_input() {
        let now = Instant::now();
        let mut s = word_count_session(&["hi"]);
        type_str(&mut s, "hi", now);
        assert!(s.is_complete());

        s.apply(Keystroke::Char('x'), now);
        s.apply(Keystroke::Backspace, now);
        assert_eq!(s.typed_words(), &words(&["hi"]));
    }

    #[test]
    fn test_errors_counted_once_per_position() {
        let now = Instant::now();
        let mut s = word_count_session(&["cat", "dog"]);
        type_str(&mut s, "cx", now);
        assert_eq!(s.total_errors(), 1);

        s.apply(Keystroke::Backspace, now);
        assert_eq!(s.total_errors(), 1);

        s.apply(Keystroke::Char('y'), now);
        assert_eq!(s.total_errors(), 1);

        s.apply(Keystroke::Backspace, now);
        s.apply(Keystroke::Char('a'), now);
        assert_eq!(s.total_errors(), 1);

        s.apply(Keystroke::Char('z'), now);
        assert_eq!(s.total_errors(), 2);
        assert_eq!(s.keystrokes(), 5);
    }

    #[test]
    fn test_wpm_trace_sampled_on_tick() {
        let t0 = Instant::now();
        let mut s = word_count_session(&["a", "b", "c"]);
        s.on_tick(t0);
        assert!(s.trace().is_empty());

        type_str(&mut s, "a ", t0);
        s.on_tick(t0 + Duration::from_secs(1));
        s.on_tick(t0 + Duration::from_secs(2));
        let points = s.trace().points();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].t, 1.0);
        assert_eq!(points[0].wpm, 120.0);
        assert_eq!(points[1].wpm, 60.0);
    }

    #[test]
    fn test_time_limit_completes_at_deadline() {
        let t0 = Instant::now();
        let mut s = timed_session(&["a", "b", "c"], 10, Refill::default());
        s.apply(Keystroke::Char('a'), t0);

        s.on_tick(t0 + Duration::from_secs(9));
        assert!(!s.is_complete());
        assert!(s.progress(t0 + Duration::from_secs(9)) > 0.0);

        s.on_tick(t0 + Duration::from_secs(10));
        assert!(s.is_complete());
        assert_eq!(s.progress(t0 + Duration::from_secs(10)), 0.0);
        assert_eq!(s.elapsed(t0 + Duration::from_secs(30)), Duration::from_secs(10));
    }

    #[test]
    fn test_keystroke_after_deadline_is_dropped() {
        let t0 = Instant::now();
        let mut s = timed_session(&["ab", "cd"], 5, Refill::default());
        s.apply(Keystroke::Char('a'), t0);
        s.apply(Keystroke::Char('b'), t0 + Duration::from_secs(6));
        assert!(s.is_complete());
        assert_eq!(s.typed_words()[0], "a");
    }

    #[test]
    fn test_time_limit_requests_words_below_low_water_mark() {
        let now = Instant::now();
        let refill = Refill {
            low_water_mark: 2,
            batch_size: 4,
        };
        let mut s = timed_session(&["a", "b", "c", "d"], 60, refill);

        assert_eq!(s.apply(Keystroke::Boundary, now), None);
        let demand = s.apply(Keystroke::Boundary, now);
        assert_matches!(demand, Some(WordDemand { generation: 0, count: 4 }));
        assert!(s.is_awaiting_words());

        // Only one request in flight at a time
        assert_eq!(s.apply(Keystroke::Boundary, now), None);
    }

    #[test]
    fn test_word_count_never_requests_words() {
        let now = Instant::now();
        let mut s = word_count_session(&["a", "b", "c"]);
        assert!(type_str(&mut s, "a b c", now).is_empty());
    }

    #[test]
    fn test_starved_boundary_is_deferred_then_replayed() {
        let now = Instant::now();
        let refill = Refill {
            low_water_mark: 0,
            batch_size: 3,
        };
        let mut s = timed_session(&["ab"], 60, refill);

        let demand = s.apply(Keystroke::Boundary, now);
        assert_matches!(demand, Some(WordDemand { count: 3, .. }));
        assert_eq!(s.cursor(), Cursor::new(0, 0));
        assert_eq!(s.backlog_len(), 1);

        // Keystrokes typed while waiting are queued behind the boundary
        s.apply(Keystroke::Char('x'), now);
        s.apply(Keystroke::Char('y'), now);
        s.apply(Keystroke::Backspace, now);
        assert_eq!(s.typed_words(), &words(&[""]));

        let next = s.append_words(0, words(&["xz", "q", "r"]), now);
        assert_matches!(next, Ok(None));
        assert_eq!(s.typed_words(), &words(&["", "x"]));
        assert_eq!(s.cursor(), Cursor::new(1, 1));
        assert_eq!(s.backlog_len(), 0);
        assert!(s.cursor().word < s.target_words().len());
    }

    #[test]
    fn test_stale_batch_is_rejected() {
        let now = Instant::now();
        let mut s = Session::new(
            7,
            SessionConfig::new(Mode::TimeLimit(Duration::from_secs(30))),
            words(&["a"]),
        );
        assert_eq!(s.append_words(6, words(&["b"]), now), Err(6));
        assert_eq!(s.target_words().len(), 1);
    }

    #[test]
    fn test_appended_words_are_sanitized() {
        let now = Instant::now();
        let mut s = timed_session(&["a"], 30, Refill::default());
        let _ = s.append_words(0, words(&["b c", "", "d"]), now);
        assert_eq!(s.target_words(), &words(&["a", "b", "c", "d"]));
    }

    #[test]
    fn test_cancel_word_request_allows_retry() {
        let now = Instant::now();
        let refill = Refill {
            low_water_mark: 5,
            batch_size: 2,
        };
        let mut s = timed_session(&["a", "b"], 30, refill);
        assert!(s.apply(Keystroke::Boundary, now).is_some());
        assert!(s.apply(Keystroke::Char('b'), now).is_none());

        s.cancel_word_request();
        assert!(s.apply(Keystroke::Char('b'), now).is_some());
    }

    #[test]
    fn test_sanitize_keeps_clean_lists() {
        assert_eq!(sanitize(words(&["a", "b"])), words(&["a", "b"]));
        assert_eq!(sanitize(words(&[" a\tb "])), words(&["a", "b"]));
    }
}
