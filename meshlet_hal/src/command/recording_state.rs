/// Per-recording cached state

use std::sync::Arc;
use crate::device::{BindingSet, Framebuffer, MeshletState, ShaderType};

/// Bound state of a pipeline kind other than meshlet
///
/// Only tracked so that switching kinds can clear it.
#[derive(Clone, Default)]
pub struct SiblingPipelineState {
    pub framebuffer: Option<Arc<dyn Framebuffer>>,
    pub bindings: Vec<Arc<dyn BindingSet>>,
}

/// The single pipeline kind active on a recording
#[derive(Clone, Default)]
pub enum PipelineKindState {
    #[default]
    None,
    Graphics(SiblingPipelineState),
    Compute(SiblingPipelineState),
    Meshlet(MeshletState),
    RayTracing(SiblingPipelineState),
}

impl PipelineKindState {
    pub fn meshlet(&self) -> Option<&MeshletState> {
        match self {
            PipelineKindState::Meshlet(state) => Some(state),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PipelineKindState::None => "none",
            PipelineKindState::Graphics(_) => "graphics",
            PipelineKindState::Compute(_) => "compute",
            PipelineKindState::Meshlet(_) => "meshlet",
            PipelineKindState::RayTracing(_) => "ray_tracing",
        }
    }
}

impl std::fmt::Debug for PipelineKindState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PipelineKindState::{}", self.name())
    }
}

/// Mutable state of one open recording
#[derive(Default)]
pub struct RecordingState {
    pub kind: PipelineKindState,
    /// Framebuffer of the currently open render pass
    pub render_pass: Option<Arc<dyn Framebuffer>>,
    /// A volatile buffer was written since binding sets were last bound
    pub any_volatile_buffer_writes: bool,
    /// Push-constant visibility of the cached pipeline layout
    pub push_constant_visibility: ShaderType,
}

impl RecordingState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn meshlet(&self) -> Option<&MeshletState> {
        self.kind.meshlet()
    }

    pub fn in_render_pass(&self) -> bool {
        self.render_pass.is_some()
    }
}
