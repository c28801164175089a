use std::collections::VecDeque;
use std::io;
use std::sync::mpsc::{self, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use cgisf_lib::cgisf;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::language::Language;
use crate::runtime::AppEvent;
use crate::session::WordDemand;

/// Produces target words on request.
///
/// Words are non-empty and contain no whitespace.
pub trait WordSource: Send + 'static {
    fn next(&mut self, count: usize) -> Vec<String>;

    /// Start over for a new session. Only meaningful for fixed texts.
    fn rewind(&mut self) {}
}

impl<S: WordSource + ?Sized> WordSource for Box<S> {
    fn next(&mut self, count: usize) -> Vec<String> {
        (**self).next(count)
    }

    fn rewind(&mut self) {
        (**self).rewind()
    }
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Uniform draw with replacement from a word list, never repeating the
/// previous word when the list allows it.
pub struct RandomWords {
    words: Vec<String>,
    rng: StdRng,
    last: Option<usize>,
}

impl RandomWords {
    pub fn new(language: Language, seed: Option<u64>) -> Self {
        Self {
            words: language.words,
            rng: rng_from(seed),
            last: None,
        }
    }

    fn pick(&mut self) -> Option<String> {
        if self.words.is_empty() {
            return None;
        }
        let mut idx = self.rng.gen_range(0..self.words.len());
        if self.words.len() > 1 && Some(idx) == self.last {
            idx = (idx + 1) % self.words.len();
        }
        self.last = Some(idx);
        Some(self.words[idx].clone())
    }
}

impl WordSource for RandomWords {
    fn next(&mut self, count: usize) -> Vec<String> {
        (0..count).filter_map(|_| self.pick()).collect()
    }
}

/// Words taken from generated English sentences, punctuation included.
pub struct SentenceWords {
    buffered: VecDeque<String>,
    rng: StdRng,
}

impl SentenceWords {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            buffered: VecDeque::new(),
            rng: rng_from(seed),
        }
    }

    fn refill(&mut self) {
        let rng = &mut self.rng;
        let sentence = cgisf(
            rng.gen_range(1..3),
            rng.gen_range(1..3),
            rng.gen_range(1..5),
            rng.gen_bool(0.5),
            rng.gen_range(1..3),
            rng.gen_bool(0.5),
        );
        self.buffered
            .extend(sentence.split_whitespace().map(str::to_string));
    }
}

impl WordSource for SentenceWords {
    fn next(&mut self, count: usize) -> Vec<String> {
        // cgisf always yields at least a subject and a verb
        while self.buffered.len() < count {
            let before = self.buffered.len();
            self.refill();
            if self.buffered.len() == before {
                break;
            }
        }
        let take = count.min(self.buffered.len());
        self.buffered.drain(..take).collect()
    }
}

/// A fixed text, cycled from the start once exhausted.
pub struct FixedWords {
    words: Vec<String>,
    pos: usize,
}

impl FixedWords {
    pub fn from_text(text: &str) -> Option<Self> {
        let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        if words.is_empty() {
            return None;
        }
        Some(Self { words, pos: 0 })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl WordSource for FixedWords {
    fn next(&mut self, count: usize) -> Vec<String> {
        let out = self
            .words
            .iter()
            .cycle()
            .skip(self.pos)
            .take(count)
            .cloned()
            .collect();
        self.pos = (self.pos + count) % self.words.len();
        out
    }

    fn rewind(&mut self) {
        self.pos = 0;
    }
}

/// Words delivered back to the event loop for the session `generation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordBatch {
    pub generation: u64,
    pub words: Vec<String>,
}

type SharedSource = Arc<Mutex<Box<dyn WordSource>>>;

fn lock(source: &SharedSource) -> MutexGuard<'_, Box<dyn WordSource>> {
    source.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the word source and a worker thread that answers [`WordDemand`]s by
/// sending [`AppEvent::Words`] into the event queue.
pub struct WordFeeder {
    source: SharedSource,
    generation: Arc<AtomicU64>,
    requests: Sender<WordDemand>,
}

impl WordFeeder {
    pub fn spawn(source: Box<dyn WordSource>, events: Sender<AppEvent>) -> io::Result<Self> {
        let source: SharedSource = Arc::new(Mutex::new(source));
        let (requests, rx) = mpsc::channel::<WordDemand>();

        let generation = Arc::new(AtomicU64::new(0));

        let worker_source = Arc::clone(&source);
        let current = Arc::clone(&generation);
        thread::Builder::new()
            .name("word-feeder".to_string())
            .spawn(move || {
                for demand in rx {
                    let mut source = lock(&worker_source);
                    // a restart already rewound the source, so old demands must not advance it
                    if demand.generation < current.load(Ordering::SeqCst) {
                        tracing::debug!(generation = demand.generation, "skipping old demand");
                        continue;
                    }
                    let words = source.next(demand.count);
                    drop(source);
                    let batch = WordBatch {
                        generation: demand.generation,
                        words,
                    };
                    if events.send(AppEvent::Words(batch)).is_err() {
                        break;
                    }
                }
                tracing::debug!("word feeder stopped");
            })?;

        Ok(Self {
            source,
            generation,
            requests,
        })
    }

    /// Synchronous draw, used when a session is created.
    pub fn draw(&self, count: usize) -> Vec<String> {
        lock(&self.source).next(count)
    }

    /// Rewinds the source and draws the opening words of session `generation`.
    /// Demands from earlier sessions are skipped from here on.
    pub fn draw_fresh(&self, generation: u64, count: usize) -> Vec<String> {
        let mut source = lock(&self.source);
        self.generation.store(generation, Ordering::SeqCst);
        source.rewind();
        source.next(count)
    }

    /// Queues a request without waiting for the answer. Returns false when the
    /// worker is gone.
    pub fn request(&self, demand: WordDemand) -> bool {
        self.requests.send(demand).is_ok()
    }
}
