//! Leg-group gait scheduler.
//!
//! Every group cycles Planted → Unplanted → Planted. A single candidate
//! pointer round-robins over the groups: only the candidate may lift off, and
//! only once the group before it (cyclically) has planted or progressed past
//! `sequence_percent` of its own swing. Landing is independent per group and
//! happens the tick its phase reaches 1.

use strider_core::LegGroupConfig;

/// Swing state of one leg group.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupState {
    pub unplanted: bool,
    /// Swing progress in [0, 1]. Zero whenever the group is planted.
    pub phase: f32,
}

/// Round-robin scheduler over leg groups.
#[derive(Debug, Clone)]
pub struct GaitScheduler {
    /// Member legs per group.
    groups: Vec<Vec<usize>>,
    /// Runtime state per group.
    states: Vec<GroupState>,
    /// Group owning each leg, `None` for unassigned legs.
    leg_group: Vec<Option<usize>>,
    /// Group currently allowed to lift off.
    current: usize,
    /// Phase the previous group must reach before the candidate may lift off.
    sequence_percent: f32,
}

impl GaitScheduler {
    /// Build from validated group configs. Leg indices at or beyond
    /// `leg_count` are ignored.
    pub fn new(groups: &[LegGroupConfig], leg_count: usize, sequence_percent: f32) -> Self {
        let mut leg_group = vec![None; leg_count];
        let groups: Vec<Vec<usize>> = groups
            .iter()
            .enumerate()
            .map(|(group, config)| {
                let legs: Vec<usize> = config.legs.iter().copied().filter(|&leg| leg < leg_count).collect();
                for &leg in &legs {
                    leg_group[leg].get_or_insert(group);
                }
                legs
            })
            .collect();

        Self {
            states: vec![GroupState::default(); groups.len()],
            groups,
            leg_group,
            current: 0,
            sequence_percent,
        }
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn group_legs(&self, group: usize) -> &[usize] {
        self.groups.get(group).map_or(&[], Vec::as_slice)
    }

    pub fn state(&self, group: usize) -> GroupState {
        self.states.get(group).copied().unwrap_or_default()
    }

    pub fn states(&self) -> &[GroupState] {
        &self.states
    }

    /// The candidate group, `None` without groups.
    pub fn current_group(&self) -> Option<usize> {
        (!self.groups.is_empty()).then_some(self.current)
    }

    pub fn group_of(&self, leg: usize) -> Option<usize> {
        self.leg_group.get(leg).copied().flatten()
    }

    /// Swing state of the group owning `leg`. Unassigned legs read as planted.
    pub fn leg_state(&self, leg: usize) -> GroupState {
        self.group_of(leg).map(|group| self.states[group]).unwrap_or_default()
    }

    /// Whether `group` is the candidate, planted, and its predecessor has
    /// planted or swung far enough. Distance checks are the caller's.
    pub fn may_unplant(&self, group: usize) -> bool {
        if self.current_group() != Some(group) || self.states[group].unplanted {
            return false;
        }
        let previous = &self.states[(group + self.groups.len() - 1) % self.groups.len()];
        !previous.unplanted || previous.phase >= self.sequence_percent
    }

    /// Lift `group` off and move the candidate pointer on.
    pub fn unplant(&mut self, group: usize) {
        let Some(state) = self.states.get_mut(group) else {
            return;
        };
        state.unplanted = true;
        state.phase = 0.0;
        self.current = (group + 1) % self.groups.len();
        tracing::trace!(group, next = self.current, "group unplanted");
    }

    /// Advance an unplanted group's phase by `dt / duration`. Returns the new
    /// phase (unchanged for planted groups).
    pub fn advance(&mut self, group: usize, dt: f32, duration: f32) -> f32 {
        let Some(state) = self.states.get_mut(group) else {
            return 0.0;
        };
        if !state.unplanted {
            return state.phase;
        }
        let step = if duration > f32::EPSILON { dt / duration } else { 1.0 };
        state.phase = (state.phase + step).clamp(0.0, 1.0);
        state.phase
    }

    /// Unplanted groups whose swing has completed.
    pub fn landing_groups(&self) -> Vec<usize> {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, state)| state.unplanted && state.phase >= 1.0)
            .map(|(group, _)| group)
            .collect()
    }

    /// Put `group` back on the ground.
    pub fn plant(&mut self, group: usize) {
        if let Some(state) = self.states.get_mut(group) {
            *state = GroupState::default();
        }
    }

    /// All groups planted, candidate pointer back to the first group.
    pub fn reset(&mut self) {
        self.states.fill(GroupState::default());
        self.current = 0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
