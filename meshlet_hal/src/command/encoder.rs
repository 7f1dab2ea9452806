/// CommandEncoder trait - native command emission driven by the recorder

use std::sync::Arc;
use crate::error::Result;
use crate::command::Barrier;
use crate::device::{
    BindingSet, Color, Framebuffer, MeshletPipeline, NativeViewport, ResourceRef,
    ScissorRect, ShaderType,
};

/// Backend command buffer as seen by [`MeshletRecorder`](crate::command::MeshletRecorder)
///
/// Each method maps to one native command (or none, for bookkeeping
/// methods). The recorder decides which calls are needed; encoders never
/// skip or reorder them.
pub trait CommandEncoder {
    /// Begin native recording
    fn begin(&mut self) -> Result<()>;

    /// End native recording
    fn end(&mut self) -> Result<()>;

    /// Bind a meshlet pipeline
    fn bind_meshlet_pipeline(&mut self, pipeline: &Arc<dyn MeshletPipeline>) -> Result<()>;

    /// Begin rendering into the framebuffer's attachments
    fn begin_render_pass(&mut self, framebuffer: &Arc<dyn Framebuffer>) -> Result<()>;

    /// End the current render pass
    fn end_render_pass(&mut self) -> Result<()>;

    /// Emit hazard barriers (never called inside a render pass)
    fn pipeline_barriers(&mut self, barriers: &[Barrier]) -> Result<()>;

    /// Remember the pipeline layout used by later binding and push-constant
    /// calls; records no native command
    fn cache_pipeline_layout(&mut self, pipeline: &Arc<dyn MeshletPipeline>) -> Result<()>;

    /// Bind all binding sets using the pipeline's descriptor-set mapping
    fn bind_binding_sets(
        &mut self,
        pipeline: &Arc<dyn MeshletPipeline>,
        bindings: &[Arc<dyn BindingSet>],
    ) -> Result<()>;

    fn set_viewports(&mut self, viewports: &[NativeViewport]) -> Result<()>;

    fn set_scissors(&mut self, scissors: &[ScissorRect]) -> Result<()>;

    /// Set the stencil reference for front and back faces
    fn set_stencil_reference(&mut self, reference: u8) -> Result<()>;

    fn set_blend_constants(&mut self, color: Color) -> Result<()>;

    /// Push constants against the cached pipeline layout
    ///
    /// # Arguments
    ///
    /// * `visibility` - Stages the push-constant range is visible to
    /// * `data` - Constant bytes, written at offset 0
    fn push_constants(&mut self, visibility: ShaderType, data: &[u8]) -> Result<()>;

    /// One-dimensional mesh task dispatch
    fn draw_mesh_tasks(&mut self, task_count: u32, first_task: u32) -> Result<()>;

    /// Keep `resource` alive until the command buffer has executed
    fn reference_resource(&mut self, resource: ResourceRef);
}
