use std::io;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

use crate::word_source::WordBatch;

/// Everything the event loop reacts to, delivered one at a time.
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    Words(WordBatch),
}

/// Source of application events
pub trait AppEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Event source backed by the shared event channel
pub struct ChannelEventSource {
    rx: Receiver<AppEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl AppEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Forwards crossterm key presses and resizes into the event channel until
/// the receiving side hangs up.
pub fn spawn_terminal_reader(tx: Sender<AppEvent>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("terminal-reader".to_string())
        .spawn(move || loop {
            let evt = match event::read() {
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => AppEvent::Resize,
                Ok(_) => continue,
                Err(err) => {
                    tracing::error!(%err, "terminal read failed");
                    break;
                }
            };
            if tx.send(evt).is_err() {
                break;
            }
        })
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Sends [`AppEvent::Tick`] every interval. The ticker never touches session
/// state; it only enqueues.
pub fn spawn_ticker<T: Ticker>(ticker: T, tx: Sender<AppEvent>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("ticker".to_string())
        .spawn(move || loop {
            thread::sleep(ticker.interval());
            if tx.send(AppEvent::Tick).is_err() {
                break;
            }
        })
}

/// Pulls the next event for the single-threaded consumer
pub struct Runner<E: AppEventSource> {
    event_source: E,
    poll: Duration,
}

impl<E: AppEventSource> Runner<E> {
    pub fn new(event_source: E, poll: Duration) -> Self {
        Self { event_source, poll }
    }

    /// Blocks until an event arrives; `None` once every producer is gone.
    pub fn step(&self) -> Option<AppEvent> {
        loop {
            match self.event_source.recv_timeout(self.poll) {
                Ok(ev) => return Some(ev),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn step_passes_through_events_in_order() {
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Resize).unwrap();
        tx.send(AppEvent::Tick).unwrap();
        let runner = Runner::new(ChannelEventSource::new(rx), Duration::from_millis(10));

        assert!(matches!(runner.step(), Some(AppEvent::Resize)));
        assert!(matches!(runner.step(), Some(AppEvent::Tick)));
    }

    #[test]
    fn step_returns_none_when_producers_are_gone() {
        let (tx, rx) = mpsc::channel::<AppEvent>();
        drop(tx);
        let runner = Runner::new(ChannelEventSource::new(rx), Duration::from_millis(1));
        assert!(runner.step().is_none());
    }

    #[test]
    fn ticker_enqueues_ticks() {
        let (tx, rx) = mpsc::channel();
        let _handle = spawn_ticker(FixedTicker::new(Duration::from_millis(1)), tx).unwrap();

        for _ in 0..3 {
            match rx.recv_timeout(Duration::from_secs(5)) {
                Ok(AppEvent::Tick) => {}
                other => panic!("expected Tick, got {other:?}"),
            }
        }
    }

    #[test]
    fn ticker_stops_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel();
        let handle = spawn_ticker(FixedTicker::new(Duration::from_millis(1)), tx).unwrap();
        drop(rx);
        handle.join().unwrap();
    }
}
