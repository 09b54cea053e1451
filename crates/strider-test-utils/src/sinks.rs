//! Event sinks for assertions.

use std::sync::{Arc, Mutex};

use nalgebra::Vector3;

use strider_core::{EventSink, GroundHit, WalkEvent};

/// Records every delivered event. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    log: Arc<Mutex<Vec<WalkEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<WalkEvent> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Group indices of every group-down event, in delivery order.
    pub fn group_downs(&self) -> Vec<usize> {
        self.filter_groups(|event| match event {
            WalkEvent::GroupDown { group, .. } => Some(*group),
            _ => None,
        })
    }

    /// Group indices of every group-up event, in delivery order.
    pub fn group_ups(&self) -> Vec<usize> {
        self.filter_groups(|event| match event {
            WalkEvent::GroupUp { group, .. } => Some(*group),
            _ => None,
        })
    }

    pub fn landings(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, WalkEvent::PawnLanded { .. }))
            .count()
    }

    pub fn clear(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.clear();
        }
    }

    fn filter_groups(&self, pick: impl Fn(&WalkEvent) -> Option<usize>) -> Vec<usize> {
        self.events().iter().filter_map(pick).collect()
    }

    fn push(&self, event: WalkEvent) {
        if let Ok(mut log) = self.log.lock() {
            log.push(event);
        }
    }
}

impl EventSink for RecordingSink {
    fn on_foot_down(&mut self, leg: usize, bone: &str, location: Vector3<f32>, hit: Option<&GroundHit>) {
        self.push(WalkEvent::FootDown {
            leg,
            bone: bone.to_string(),
            location,
            hit: hit.cloned(),
        });
    }

    fn on_foot_up(&mut self, leg: usize, bone: &str, location: Vector3<f32>) {
        self.push(WalkEvent::FootUp {
            leg,
            bone: bone.to_string(),
            location,
        });
    }

    fn on_group_down(&mut self, group: usize, location: Vector3<f32>, hit: Option<&GroundHit>) {
        self.push(WalkEvent::GroupDown {
            group,
            location,
            hit: hit.cloned(),
        });
    }

    fn on_group_up(&mut self, group: usize, location: Vector3<f32>) {
        self.push(WalkEvent::GroupUp { group, location });
    }

    fn on_pawn_landed(&mut self, location: Vector3<f32>) {
        self.push(WalkEvent::PawnLanded { location });
    }
}
