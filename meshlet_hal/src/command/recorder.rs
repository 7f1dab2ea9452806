/// Meshlet command recorder
///
/// Caches the state bound on an open recording and emits only the native
/// commands needed to move from the cached state to a requested one.
/// Barriers are never recorded inside a render pass: a pending barrier
/// ends the current pass, the barriers are flushed, and a new pass begins.

use std::sync::Arc;
use crate::config::Config;
use crate::error::Result;
use crate::command::{
    CommandEncoder, HazardTracker, PipelineKindState, RecordingState, ResourceStateTracker,
};
use crate::device::{
    same_object, same_optional_object, BindingSet, Buffer, MeshletPipeline, MeshletState,
    NativeViewport, ResourceRef, ResourceStates, ScissorRect, Texture, TrackedResource,
};

const SOURCE: &str = "meshlet::recorder";

/// Records meshlet draws into a [`CommandEncoder`]
///
/// One recorder per recording context, owned by the thread recording it.
pub struct MeshletRecorder<E: CommandEncoder, H: HazardTracker = ResourceStateTracker> {
    encoder: E,
    tracker: H,
    config: Config,
    state: RecordingState,
    recording: bool,
}

impl<E: CommandEncoder> MeshletRecorder<E, ResourceStateTracker> {
    /// Recorder using the default resource-state tracker
    pub fn new(encoder: E, config: Config) -> Self {
        Self::with_tracker(encoder, ResourceStateTracker::new(), config)
    }
}

impl<E: CommandEncoder, H: HazardTracker> MeshletRecorder<E, H> {
    pub fn with_tracker(encoder: E, tracker: H, config: Config) -> Self {
        Self {
            encoder,
            tracker,
            config,
            state: RecordingState::default(),
            recording: false,
        }
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    pub fn encoder_mut(&mut self) -> &mut E {
        &mut self.encoder
    }

    pub fn tracker(&self) -> &H {
        &self.tracker
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn recording_state(&self) -> &RecordingState {
        &self.state
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn into_encoder(self) -> E {
        self.encoder
    }

    // ===== LIFECYCLE =====

    /// Begin recording and reset all cached state
    pub fn begin(&mut self) -> Result<()> {
        if self.recording {
            return Err(crate::hal_invalid!(SOURCE, "begin: already recording"));
        }
        self.encoder.begin()?;
        self.state.reset();
        self.tracker.reset_pending();
        self.recording = true;
        Ok(())
    }

    /// End any open render pass, flush barriers and end recording
    pub fn end(&mut self) -> Result<()> {
        self.require_recording("end")?;
        self.end_render_pass_if_open()?;
        self.flush_barriers()?;
        self.encoder.end()?;
        self.tracker.commit_states();
        self.recording = false;
        Ok(())
    }

    // ===== STATE =====

    /// Bind everything a meshlet draw needs, skipping unchanged state
    pub fn set_meshlet_state(&mut self, state: &MeshletState) -> Result<()> {
        self.require_recording("set_meshlet_state")?;
        let (pipeline, framebuffer) = match (&state.pipeline, &state.framebuffer) {
            (Some(pipeline), Some(framebuffer)) => (pipeline.clone(), framebuffer.clone()),
            (None, _) => return Err(crate::hal_invalid!(SOURCE, "set_meshlet_state: no pipeline")),
            (_, None) => return Err(crate::hal_invalid!(SOURCE, "set_meshlet_state: no framebuffer")),
        };

        if self.config.enable_automatic_barriers {
            self.tracker.track_meshlet_state(state);
        }
        let any_barriers = self.tracker.has_pending();

        let cached = self.state.meshlet();
        let pipeline_changed = !same_optional_object(
            cached.and_then(|c| c.pipeline.as_ref()),
            Some(&pipeline),
        );
        let framebuffer_changed = !same_optional_object(
            cached.and_then(|c| c.framebuffer.as_ref()),
            Some(&framebuffer),
        );
        let bindings_changed = !same_bindings(
            cached.map_or(&[][..], |c| c.bindings.as_slice()),
            &state.bindings,
        );
        let viewports = &state.viewport.viewports;
        let viewports_changed = !viewports.is_empty()
            && cached.map_or(true, |c| c.viewport.viewports != *viewports);
        let scissors = &state.viewport.scissor_rects;
        let scissors_changed = !scissors.is_empty()
            && cached.map_or(true, |c| c.viewport.scissor_rects != *scissors);
        let stencil_ref_changed = cached
            .map_or(true, |c| c.dynamic_stencil_ref_value != state.dynamic_stencil_ref_value);
        let blend_color_changed = cached
            .map_or(true, |c| c.blend_constant_color != state.blend_constant_color);

        if pipeline_changed {
            crate::hal_trace!(SOURCE, "Binding meshlet pipeline");
            self.encoder.bind_meshlet_pipeline(&pipeline)?;
            self.encoder.reference_resource(ResourceRef::Pipeline(pipeline.clone()));
        }

        if framebuffer_changed || any_barriers {
            self.end_render_pass_if_open()?;
        }

        self.flush_barriers()?;

        if !self.state.in_render_pass() {
            self.encoder.begin_render_pass(&framebuffer)?;
            self.encoder.reference_resource(ResourceRef::Framebuffer(framebuffer.clone()));
            self.state.render_pass = Some(framebuffer);
        }

        self.encoder.cache_pipeline_layout(&pipeline)?;
        self.state.push_constant_visibility = pipeline.push_constant_visibility();

        if bindings_changed || self.state.any_volatile_buffer_writes {
            self.bind_sets(&pipeline, &state.bindings)?;
        }

        if viewports_changed {
            let native: Vec<NativeViewport> = viewports.iter().map(NativeViewport::from).collect();
            self.encoder.set_viewports(&native)?;
        }

        if scissors_changed {
            let native: Vec<ScissorRect> = scissors.iter().map(ScissorRect::from).collect();
            self.encoder.set_scissors(&native)?;
        }

        let dynamic_stencil_ref = pipeline.desc().render_state.depth_stencil.dynamic_stencil_ref;
        if dynamic_stencil_ref && (pipeline_changed || stencil_ref_changed) {
            self.encoder.set_stencil_reference(state.dynamic_stencil_ref_value)?;
        }

        if pipeline.uses_blend_constants() && (pipeline_changed || blend_color_changed) {
            self.encoder.set_blend_constants(state.blend_constant_color)?;
        }

        if let Some(indirect) = &state.indirect_params {
            self.encoder.reference_resource(ResourceRef::Buffer(indirect.clone()));
        }

        self.state.kind = PipelineKindState::Meshlet(state.clone());
        self.state.any_volatile_buffer_writes = false;

        Ok(())
    }

    /// Rebind binding sets if a volatile buffer was written since the last bind
    pub fn update_meshlet_volatile_buffers(&mut self) -> Result<()> {
        if !self.state.any_volatile_buffer_writes {
            return Ok(());
        }
        let Some((pipeline, bindings)) = self
            .state
            .meshlet()
            .and_then(|m| m.pipeline.clone().map(|p| (p, m.bindings.clone())))
        else {
            return Ok(());
        };

        self.bind_sets(&pipeline, &bindings)?;
        self.state.any_volatile_buffer_writes = false;
        Ok(())
    }

    /// Dispatch `groups_x` mesh task groups
    ///
    /// Only one-dimensional dispatches are supported: `groups_y` and
    /// `groups_z` must be 1 (or 0).
    pub fn dispatch_mesh(&mut self, groups_x: u32, groups_y: u32, groups_z: u32) -> Result<()> {
        self.require_recording("dispatch_mesh")?;

        if groups_y > 1 || groups_z > 1 {
            return Err(crate::hal_unsupported!(
                SOURCE,
                "dispatch_mesh: only 1D dispatch is supported (got {} x {} x {})",
                groups_x,
                groups_y,
                groups_z
            ));
        }

        if self.state.meshlet().is_none() {
            return Err(crate::hal_invalid!(
                SOURCE,
                "dispatch_mesh: no meshlet state set (active kind: {})",
                self.state.kind.name()
            ));
        }

        self.update_meshlet_volatile_buffers()?;
        self.encoder.draw_mesh_tasks(groups_x, 0)
    }

    // ===== DATA =====

    /// Upload `data` into `buffer` at `offset`
    pub fn write_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64, data: &[u8]) -> Result<()> {
        self.require_recording("write_buffer")?;
        buffer.update(offset, data)?;
        if buffer.desc().is_volatile {
            self.state.any_volatile_buffer_writes = true;
        }
        self.encoder.reference_resource(ResourceRef::Buffer(buffer.clone()));
        Ok(())
    }

    /// Push constants against the pipeline layout of the current meshlet state
    pub fn set_push_constants(&mut self, data: &[u8]) -> Result<()> {
        self.require_recording("set_push_constants")?;
        if self.state.meshlet().is_none() {
            return Err(crate::hal_invalid!(SOURCE, "set_push_constants: no meshlet state set"));
        }
        if data.len() % 4 != 0 {
            return Err(crate::hal_invalid!(
                SOURCE,
                "set_push_constants: size {} is not a multiple of 4",
                data.len()
            ));
        }
        self.encoder.push_constants(self.state.push_constant_visibility, data)
    }

    /// Require `buffer` to be in `states`; the barrier is emitted at the next
    /// state change or at `end`
    pub fn set_buffer_state(&mut self, buffer: &Arc<dyn Buffer>, states: ResourceStates) -> Result<()> {
        self.require_recording("set_buffer_state")?;
        self.tracker.require_state(TrackedResource::Buffer(buffer.clone()), states);
        Ok(())
    }

    pub fn set_texture_state(&mut self, texture: &Arc<dyn Texture>, states: ResourceStates) -> Result<()> {
        self.require_recording("set_texture_state")?;
        self.tracker.require_state(TrackedResource::Texture(texture.clone()), states);
        Ok(())
    }

    /// Note a volatile buffer write made outside this recorder
    pub fn mark_volatile_buffer_write(&mut self) {
        self.state.any_volatile_buffer_writes = true;
    }

    // ===== INTERNALS =====

    fn require_recording(&self, operation: &str) -> Result<()> {
        if self.recording {
            Ok(())
        } else {
            Err(crate::hal_invalid!(SOURCE, "{}: not recording", operation))
        }
    }

    fn end_render_pass_if_open(&mut self) -> Result<()> {
        if self.state.render_pass.take().is_some() {
            self.encoder.end_render_pass()?;
        }
        Ok(())
    }

    fn flush_barriers(&mut self) -> Result<()> {
        let barriers = self.tracker.take_pending();
        if !barriers.is_empty() {
            crate::hal_trace!(SOURCE, "Flushing {} barriers", barriers.len());
            self.encoder.pipeline_barriers(&barriers)?;
        }
        Ok(())
    }

    fn bind_sets(
        &mut self,
        pipeline: &Arc<dyn MeshletPipeline>,
        bindings: &[Arc<dyn BindingSet>],
    ) -> Result<()> {
        if bindings.is_empty() {
            return Ok(());
        }
        for binding_set in bindings {
            self.encoder.reference_resource(ResourceRef::BindingSet(binding_set.clone()));
        }
        self.encoder.bind_binding_sets(pipeline, bindings)
    }

    #[cfg(test)]
    pub(crate) fn recording_state_mut(&mut self) -> &mut RecordingState {
        &mut self.state
    }
}

/// Element-wise identity comparison of binding-set arrays
fn same_bindings(a: &[Arc<dyn BindingSet>], b: &[Arc<dyn BindingSet>]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_object(x, y))
}

#[cfg(test)]
#[path = "recorder_tests.rs"]
mod tests;
