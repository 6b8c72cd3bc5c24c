//! Event sinks.
//!
//! The synchronization core reports what it does through an [`EventSink`]:
//! agents report state transitions, the pool reports ownership snapshots.
//! Sinks have no say in correctness. They must return promptly, since agents
//! call them between steps of their cycle.
//!
//! | Sink | Delivery |
//! |------|----------|
//! | [`TracingSink`] | `tracing` events on target `carafe::events` |
//! | [`ChannelSink`] | `tokio` channel, unbounded or bounded with drops |
//! | [`FanoutSink`] | Forwards to several sinks in order |
//! | [`NoopSink`] | Discards everything |
//! | [`RecordingSink`] | In-memory log for tests (`test-utils`) |
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use carafe_core::{AgentId, AgentState, EventSink, FanoutSink, NoopSink, TracingSink};
//!
//! let sink = FanoutSink::default()
//!     .with(Arc::new(TracingSink))
//!     .with(Arc::new(NoopSink));
//! sink.record_transition(AgentId::new(0), AgentState::Idle, "Started thinking");
//! ```

use crate::id::AgentId;
use crate::snapshot::OwnershipSnapshot;
use crate::state::AgentState;
use core::sync::atomic::{AtomicU64, Ordering};
use core::time::Duration;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Receiver of state transitions and pool snapshots.
///
/// Implementations must not block indefinitely. Anything slow belongs on the
/// other side of a channel (see [`ChannelSink`]).
pub trait EventSink: Send + Sync + 'static {
    /// Records that `agent` is in `state`, performing the described action.
    fn record_transition(&self, agent: AgentId, state: AgentState, message: &str);

    /// Records the pool's full ownership after a mutation.
    fn record_pool_snapshot(&self, snapshot: &OwnershipSnapshot);
}

// ─────────────────────────────────────────────────────────────────────────────
// Event records
// ─────────────────────────────────────────────────────────────────────────────

/// One entry of the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// An agent changed state or performed an action within a state.
    Transition {
        /// The agent.
        agent: AgentId,
        /// The agent's state when the action happened.
        state: AgentState,
        /// Free-text description of the action.
        message: String,
    },
    /// Ownership of every resource after a pool mutation.
    PoolSnapshot(OwnershipSnapshot),
}

/// An [`Event`] stamped with the time elapsed since its sink was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedEvent {
    /// Elapsed time since the sink's epoch.
    pub at: Duration,
    /// The event.
    pub event: Event,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingSink
// ─────────────────────────────────────────────────────────────────────────────

/// Sink that turns every event into a `tracing` event.
///
/// Timestamps and formatting come from the installed subscriber (see
/// [`TracingConfig`](crate::TracingConfig)).
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record_transition(&self, agent: AgentId, state: AgentState, message: &str) {
        tracing::info!(
            target: "carafe::events",
            agent = %agent,
            state = %state,
            "[{agent}] {state:>8} | {message}"
        );
    }

    fn record_pool_snapshot(&self, snapshot: &OwnershipSnapshot) {
        tracing::info!(
            target: "carafe::events",
            sequence = snapshot.sequence,
            free = snapshot.free_count(),
            "{snapshot}"
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ChannelSink
// ─────────────────────────────────────────────────────────────────────────────

/// Sink forwarding timed events over a `tokio` channel.
///
/// Sending never blocks. Once the receiver is dropped, events are discarded.
///
/// [`ChannelSink::new`] uses an unbounded channel: every event of the run is
/// buffered until the receiver drains it, so an undrained receiver grows for
/// as long as agents run. [`ChannelSink::bounded`] caps the buffer instead and
/// drops events that arrive while it is full, counting them in
/// [`dropped`](Self::dropped).
#[derive(Debug, Clone)]
pub struct ChannelSink {
    epoch: Instant,
    sender: ChannelSender,
    dropped: Arc<AtomicU64>,
}

#[derive(Debug, Clone)]
enum ChannelSender {
    Unbounded(mpsc::UnboundedSender<TimedEvent>),
    Bounded(mpsc::Sender<TimedEvent>),
}

impl ChannelSink {
    /// Creates a sink and the receiving half of an unbounded channel.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimedEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::with_sender(ChannelSender::Unbounded(sender)), receiver)
    }

    /// Creates a sink and the receiving half of a channel holding at most
    /// `capacity` undelivered events. A capacity of zero is treated as one.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<TimedEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self::with_sender(ChannelSender::Bounded(sender)), receiver)
    }

    fn with_sender(sender: ChannelSender) -> Self {
        Self {
            epoch: Instant::now(),
            sender,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns how many events a full bounded channel has refused so far.
    ///
    /// Always zero for unbounded sinks. Events lost to a closed receiver are
    /// not counted.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn send(&self, event: Event) {
        let timed = TimedEvent {
            at: self.epoch.elapsed(),
            event,
        };
        match &self.sender {
            // A closed receiver means nobody is listening any more.
            ChannelSender::Unbounded(sender) => {
                let _ = sender.send(timed);
            }
            ChannelSender::Bounded(sender) => {
                if let Err(mpsc::error::TrySendError::Full(_)) = sender.try_send(timed) {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }
}

impl EventSink for ChannelSink {
    fn record_transition(&self, agent: AgentId, state: AgentState, message: &str) {
        self.send(Event::Transition {
            agent,
            state,
            message: message.to_owned(),
        });
    }

    fn record_pool_snapshot(&self, snapshot: &OwnershipSnapshot) {
        self.send(Event::PoolSnapshot(snapshot.clone()));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FanoutSink / NoopSink
// ─────────────────────────────────────────────────────────────────────────────

/// Sink forwarding every event to each inner sink in order.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    /// Creates a fanout over the given sinks.
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }

    /// Adds another sink.
    #[must_use]
    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Returns the number of inner sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns true if there are no inner sinks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl EventSink for FanoutSink {
    fn record_transition(&self, agent: AgentId, state: AgentState, message: &str) {
        for sink in &self.sinks {
            sink.record_transition(agent, state, message);
        }
    }

    fn record_pool_snapshot(&self, snapshot: &OwnershipSnapshot) {
        for sink in &self.sinks {
            sink.record_pool_snapshot(snapshot);
        }
    }
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn record_transition(&self, _agent: AgentId, _state: AgentState, _message: &str) {}

    fn record_pool_snapshot(&self, _snapshot: &OwnershipSnapshot) {}
}

// ─────────────────────────────────────────────────────────────────────────────
// RecordingSink for Testing
// ─────────────────────────────────────────────────────────────────────────────

/// Sink keeping every event in memory for later assertions.
///
/// # Example
///
/// ```ignore
/// use carafe_core::{AgentId, AgentState, EventSink, RecordingSink};
///
/// let sink = RecordingSink::new();
/// sink.record_transition(AgentId::new(2), AgentState::Wanting, "Needs resources: 1");
///
/// let transitions = sink.transitions_of(AgentId::new(2));
/// assert_eq!(transitions, vec![(AgentState::Wanting, "Needs resources: 1".to_string())]);
/// ```
#[cfg(any(test, feature = "test-utils"))]
pub struct RecordingSink {
    epoch: Instant,
    events: parking_lot::Mutex<Vec<TimedEvent>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl RecordingSink {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            events: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Returns a copy of every recorded event.
    #[must_use]
    pub fn events(&self) -> Vec<TimedEvent> {
        self.events.lock().clone()
    }

    /// Returns the `(state, message)` pairs recorded for `agent`, in order.
    #[must_use]
    pub fn transitions_of(&self, agent: AgentId) -> Vec<(AgentState, String)> {
        self.events
            .lock()
            .iter()
            .filter_map(|timed| match &timed.event {
                Event::Transition {
                    agent: who,
                    state,
                    message,
                } if *who == agent => Some((*state, message.clone())),
                _ => None,
            })
            .collect()
    }

    /// Returns every recorded snapshot, sorted by sequence number.
    #[must_use]
    pub fn snapshots(&self) -> Vec<OwnershipSnapshot> {
        let mut snapshots: Vec<OwnershipSnapshot> = self
            .events
            .lock()
            .iter()
            .filter_map(|timed| match &timed.event {
                Event::PoolSnapshot(snapshot) => Some(snapshot.clone()),
                Event::Transition { .. } => None,
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.sequence);
        snapshots
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drops all recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn push(&self, event: Event) {
        let at = self.epoch.elapsed();
        self.events.lock().push(TimedEvent { at, event });
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl EventSink for RecordingSink {
    fn record_transition(&self, agent: AgentId, state: AgentState, message: &str) {
        self.push(Event::Transition {
            agent,
            state,
            message: message.to_owned(),
        });
    }

    fn record_pool_snapshot(&self, snapshot: &OwnershipSnapshot) {
        self.push(Event::PoolSnapshot(snapshot.clone()));
    }
}
