//! Bevy integration for walk events.
//!
//! [`StriderWalkPlugin`] owns a shared [`WalkEventQueue`] resource. Nodes
//! created with [`WalkNode::with_events`](crate::WalkNode::with_events) and a
//! clone of that queue push their step and landing events onto it; a system
//! in `Update` drains the queue every frame into [`WalkEventMessage`]s.

use bevy::prelude::*;

use strider_core::{EventQueue, WalkEvent};

/// Bevy plugin forwarding queued walk events to the ECS.
pub struct StriderWalkPlugin;

impl Plugin for StriderWalkPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WalkEventQueue>()
            .add_event::<WalkEventMessage>()
            .add_systems(Update, drain_walk_events);
    }
}

/// The queue every walk node in the app should push onto.
#[derive(Resource, Debug, Clone, Default)]
pub struct WalkEventQueue(pub EventQueue);

/// A walk event delivered through bevy's event system.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct WalkEventMessage(pub WalkEvent);

fn drain_walk_events(queue: Res<WalkEventQueue>, mut writer: EventWriter<WalkEventMessage>) {
    for event in queue.0.drain() {
        writer.send(WalkEventMessage(event));
    }
}
