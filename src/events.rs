//! Event types and the main event loop driver for skysearch.
//!
//! This module defines the [`Event`] enum (keyboard input, ticks, and the
//! completion events posted by fetch tasks) and the [`EventHandler`], which
//! runs a background task that polls crossterm for key events and emits
//! periodic [`Event::Tick`]s. The main loop in `main.rs` receives events via
//! [`EventHandler::next`]; fetch tasks send completions via a cloned
//! [`EventHandler::tx`]. Every network response re-enters the single loop
//! thread as one of these events, which is what keeps cache updates free of
//! locking.

use crate::models::{Airport, FlightSearchOutcome, SearchParams};
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Events processed by the application event loop.
pub enum Event {
    /// Periodic tick used for UI refresh, debounce expiry, and cache upkeep.
    Tick,
    /// User key press from the terminal.
    Input(KeyEvent),
    /// Geolocation fix resolved (or `None` if the lookup failed).
    LocationFix(Option<(f64, f64)>),
    /// Nearby-airport lookup completed; element 0 is the coordinate's own
    /// airport. Empty on API failure.
    NearbyResults(Vec<Airport>),
    /// Text search completed for the given dispatch term.
    AirportResults { term: String, airports: Vec<Airport> },
    /// Flight search completed for the given dispatch snapshot.
    FlightResults {
        params: SearchParams,
        outcome: FlightSearchOutcome,
    },
}

/// Multiplexes terminal input and ticks into a single event stream.
///
/// Holds an unbounded channel: the sender ([`tx`](EventHandler::tx)) can be
/// cloned and given to fetch tasks, while the receiver is consumed by
/// [`next`](EventHandler::next) in the main loop. A background task polls
/// crossterm with a timeout and sends [`Event::Input`] on key press and
/// [`Event::Tick`] at the configured interval.
pub struct EventHandler {
    /// Sender for posting events from fetch tasks.
    pub tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Creates a new event handler and spawns the input/tick task.
    ///
    /// The spawned task runs until the process exits. It polls crossterm
    /// with a timeout of `tick_rate_ms`; when a key is pressed it sends
    /// [`Event::Input`], and when the tick interval elapses it sends
    /// [`Event::Tick`]. The tick rate bounds how late a debounce deadline
    /// can fire, so it should stay well under the 300ms debounce window.
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        tokio::spawn(async move {
            let tick_rate = Duration::from_millis(tick_rate_ms);
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or(Duration::from_secs(0));
                if event::poll(timeout).expect("Poll failed") {
                    if let CrosstermEvent::Key(key) = event::read().expect("Read failed") {
                        event_tx.send(Event::Input(key)).ok();
                    }
                }
                if last_tick.elapsed() >= tick_rate {
                    event_tx.send(Event::Tick).ok();
                    last_tick = Instant::now();
                }
            }
        });

        Self { tx, rx }
    }

    /// Receives the next event from the channel. Returns `None` when all
    /// senders have been dropped.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}
