/// Resource hazard barriers and the state tracker that derives them

use rustc_hash::FxHashMap;
use crate::device::{MeshletState, ResourceId, ResourceStates, TrackedResource};

/// Transition of one resource between two access states
#[derive(Debug, Clone)]
pub struct Barrier {
    pub resource: TrackedResource,
    pub state_before: ResourceStates,
    pub state_after: ResourceStates,
}

/// Hazard tracker driven by the command recorder
///
/// Barriers queue up until the recorder flushes them, which it only does
/// outside a render pass.
pub trait HazardTracker {
    /// Require the states implied by a meshlet draw's bindings,
    /// attachments and indirect arguments buffer
    fn track_meshlet_state(&mut self, state: &MeshletState);

    /// Require `resource` to be in `state` before the next draw
    fn require_state(&mut self, resource: TrackedResource, state: ResourceStates);

    fn has_pending(&self) -> bool;

    /// Remove and return all pending barriers
    fn take_pending(&mut self) -> Vec<Barrier>;

    /// Drop pending barriers without emitting them, putting each affected
    /// resource back in the state it had before the barrier was queued
    fn reset_pending(&mut self);

    /// Publish the states reached by this recording to the resources and
    /// forget them; called once the recording has ended
    fn commit_states(&mut self);
}

/// Default tracker keeping the state of every resource touched since the
/// last commit
///
/// A resource seen for the first time starts from its committed state.
#[derive(Debug, Default)]
pub struct ResourceStateTracker {
    known: FxHashMap<ResourceId, (TrackedResource, ResourceStates)>,
    pending: Vec<Barrier>,
}

impl ResourceStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// State tracked for `id` since the last commit (`UNKNOWN` if untouched)
    pub fn known_state(&self, id: ResourceId) -> ResourceStates {
        self.known.get(&id).map_or(ResourceStates::UNKNOWN, |(_, state)| *state)
    }

    /// Number of resources touched since the last commit
    pub fn tracked_count(&self) -> usize {
        self.known.len()
    }

    pub fn pending(&self) -> &[Barrier] {
        &self.pending
    }
}

impl HazardTracker for ResourceStateTracker {
    fn track_meshlet_state(&mut self, state: &MeshletState) {
        for binding_set in &state.bindings {
            for usage in binding_set.resource_usages() {
                self.require_state(usage.resource.clone(), usage.state);
            }
        }

        if let Some(framebuffer) = &state.framebuffer {
            for color in framebuffer.color_attachments() {
                self.require_state(TrackedResource::Texture(color.clone()), ResourceStates::RENDER_TARGET);
            }
            if let Some(depth) = framebuffer.depth_attachment() {
                self.require_state(TrackedResource::Texture(depth.clone()), ResourceStates::DEPTH_WRITE);
            }
        }

        if let Some(indirect) = &state.indirect_params {
            self.require_state(TrackedResource::Buffer(indirect.clone()), ResourceStates::INDIRECT_ARGUMENT);
        }
    }

    fn require_state(&mut self, resource: TrackedResource, state: ResourceStates) {
        let id = resource.resource_id();
        let before = match self.known.get(&id) {
            Some((_, known)) => *known,
            None => resource.committed_state().load(),
        };
        if before == state {
            return;
        }
        self.known.insert(id, (resource.clone(), state));

        let queued = self
            .pending
            .iter()
            .position(|barrier| barrier.resource.resource_id() == id);

        match queued {
            Some(index) if self.pending[index].state_before == state => {
                // Transition cancelled out before it was emitted
                self.pending.remove(index);
            }
            Some(index) => self.pending[index].state_after = state,
            None => self.pending.push(Barrier {
                resource,
                state_before: before,
                state_after: state,
            }),
        }
    }

    fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn take_pending(&mut self) -> Vec<Barrier> {
        std::mem::take(&mut self.pending)
    }

    fn reset_pending(&mut self) {
        for barrier in self.pending.drain(..) {
            let id = barrier.resource.resource_id();
            if barrier.state_before == barrier.resource.committed_state().load() {
                self.known.remove(&id);
            } else {
                self.known.insert(id, (barrier.resource, barrier.state_before));
            }
        }
    }

    fn commit_states(&mut self) {
        for (_, (resource, state)) in self.known.drain() {
            resource.committed_state().store(state);
        }
    }
}

#[cfg(test)]
#[path = "barrier_tests.rs"]
mod tests;
