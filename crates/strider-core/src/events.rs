//! Step and landing notifications.
//!
//! The walk node never calls listeners directly. It pushes [`WalkEvent`]s onto
//! an [`EventQueue`]; the host drains the queue with an [`EventDispatcher`] on
//! whichever thread it designates for delivery.
//!
//! ```text
//! WalkNode ──emit──► EventQueue ──drain──► EventDispatcher ──► [EventSink, ...]
//! ```

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use nalgebra::Vector3;

use crate::types::GroundHit;

/// A step or landing notification.
#[derive(Debug, Clone, PartialEq)]
pub enum WalkEvent {
    /// `bone` is the leg's tip bone.
    FootDown {
        leg: usize,
        bone: String,
        location: Vector3<f32>,
        hit: Option<GroundHit>,
    },
    FootUp {
        leg: usize,
        bone: String,
        location: Vector3<f32>,
    },
    /// `location` is the average foot location of the group, `hit` the first
    /// member leg's last ground hit.
    GroupDown {
        group: usize,
        location: Vector3<f32>,
        hit: Option<GroundHit>,
    },
    GroupUp {
        group: usize,
        location: Vector3<f32>,
    },
    PawnLanded {
        location: Vector3<f32>,
    },
}

/// Listener for walk events. Every method defaults to a no-op.
pub trait EventSink: Send {
    fn on_foot_down(&mut self, _leg: usize, _bone: &str, _location: Vector3<f32>, _hit: Option<&GroundHit>) {}

    fn on_foot_up(&mut self, _leg: usize, _bone: &str, _location: Vector3<f32>) {}

    fn on_group_down(&mut self, _group: usize, _location: Vector3<f32>, _hit: Option<&GroundHit>) {}

    fn on_group_up(&mut self, _group: usize, _location: Vector3<f32>) {}

    fn on_pawn_landed(&mut self, _location: Vector3<f32>) {}
}

// ---------------------------------------------------------------------------
// EventQueue
// ---------------------------------------------------------------------------

/// Unbounded multi-producer queue of pending events.
///
/// Clones share the same channel, so a node and its host can each hold one.
#[derive(Debug, Clone)]
pub struct EventQueue {
    tx: Sender<WalkEvent>,
    rx: Receiver<WalkEvent>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    /// Push an event. Never blocks.
    pub fn emit(&self, event: WalkEvent) {
        // Both ends live in `self`, so the channel cannot be disconnected here.
        let _ = self.tx.send(event);
    }

    /// Pop the next pending event, if any.
    pub fn try_next(&self) -> Option<WalkEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Take every pending event.
    pub fn drain(&self) -> Vec<WalkEvent> {
        self.rx.try_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

// ---------------------------------------------------------------------------
// EventDispatcher
// ---------------------------------------------------------------------------

/// Observer list fanning each drained event out to every registered sink.
#[derive(Default)]
pub struct EventDispatcher {
    sinks: Vec<Box<dyn EventSink>>,
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, sink: impl EventSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Deliver one event to every sink.
    pub fn dispatch(&mut self, event: &WalkEvent) {
        for sink in &mut self.sinks {
            match event {
                WalkEvent::FootDown {
                    leg,
                    bone,
                    location,
                    hit,
                } => sink.on_foot_down(*leg, bone, *location, hit.as_ref()),
                WalkEvent::FootUp { leg, bone, location } => sink.on_foot_up(*leg, bone, *location),
                WalkEvent::GroupDown {
                    group,
                    location,
                    hit,
                } => sink.on_group_down(*group, *location, hit.as_ref()),
                WalkEvent::GroupUp { group, location } => sink.on_group_up(*group, *location),
                WalkEvent::PawnLanded { location } => sink.on_pawn_landed(*location),
            }
        }
    }

    /// Drain `queue` and deliver everything in it. Returns the number of
    /// events delivered.
    pub fn drain(&mut self, queue: &EventQueue) -> usize {
        let mut delivered = 0;
        while let Some(event) = queue.try_next() {
            self.dispatch(&event);
            delivered += 1;
        }
        delivered
    }
}
