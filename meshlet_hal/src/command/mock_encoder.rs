/// Recording command encoder for unit tests (no GPU required)

use std::sync::Arc;
use crate::error::Result;
use crate::command::{Barrier, CommandEncoder};
use crate::device::{
    BindingSet, Color, Framebuffer, MeshletPipeline, NativeViewport, ResourceRef,
    ScissorRect, ShaderType,
};

/// Logs every native command as a string
#[derive(Debug, Default)]
pub struct MockEncoder {
    pub commands: Vec<String>,
    pub referenced: Vec<ResourceRef>,
    /// Calls to cache_pipeline_layout (not a native command)
    pub layout_caches: u32,
    pub last_viewports: Vec<NativeViewport>,
    pub last_scissors: Vec<ScissorRect>,
    pub last_barriers: Vec<Barrier>,
}

impl MockEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything recorded so far
    pub fn clear(&mut self) {
        self.commands.clear();
        self.referenced.clear();
    }

    /// Number of commands whose name starts with `name`
    pub fn count(&self, name: &str) -> usize {
        self.commands.iter().filter(|c| c.starts_with(name)).count()
    }
}

impl CommandEncoder for MockEncoder {
    fn begin(&mut self) -> Result<()> {
        self.commands.push("begin".to_string());
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.commands.push("end".to_string());
        Ok(())
    }

    fn bind_meshlet_pipeline(&mut self, _pipeline: &Arc<dyn MeshletPipeline>) -> Result<()> {
        self.commands.push("bind_pipeline".to_string());
        Ok(())
    }

    fn begin_render_pass(&mut self, _framebuffer: &Arc<dyn Framebuffer>) -> Result<()> {
        self.commands.push("begin_render_pass".to_string());
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.commands.push("end_render_pass".to_string());
        Ok(())
    }

    fn pipeline_barriers(&mut self, barriers: &[Barrier]) -> Result<()> {
        self.commands.push(format!("barriers({})", barriers.len()));
        self.last_barriers = barriers.to_vec();
        Ok(())
    }

    fn cache_pipeline_layout(&mut self, _pipeline: &Arc<dyn MeshletPipeline>) -> Result<()> {
        self.layout_caches += 1;
        Ok(())
    }

    fn bind_binding_sets(
        &mut self,
        _pipeline: &Arc<dyn MeshletPipeline>,
        bindings: &[Arc<dyn BindingSet>],
    ) -> Result<()> {
        self.commands.push(format!("bind_binding_sets({})", bindings.len()));
        Ok(())
    }

    fn set_viewports(&mut self, viewports: &[NativeViewport]) -> Result<()> {
        self.commands.push(format!("set_viewports({})", viewports.len()));
        self.last_viewports = viewports.to_vec();
        Ok(())
    }

    fn set_scissors(&mut self, scissors: &[ScissorRect]) -> Result<()> {
        self.commands.push(format!("set_scissors({})", scissors.len()));
        self.last_scissors = scissors.to_vec();
        Ok(())
    }

    fn set_stencil_reference(&mut self, reference: u8) -> Result<()> {
        self.commands.push(format!("set_stencil_reference({})", reference));
        Ok(())
    }

    fn set_blend_constants(&mut self, color: Color) -> Result<()> {
        self.commands.push(format!("set_blend_constants({:?})", color.to_array()));
        Ok(())
    }

    fn push_constants(&mut self, visibility: ShaderType, data: &[u8]) -> Result<()> {
        self.commands.push(format!("push_constants({:?}, {})", visibility, data.len()));
        Ok(())
    }

    fn draw_mesh_tasks(&mut self, task_count: u32, first_task: u32) -> Result<()> {
        self.commands.push(format!("draw_mesh_tasks({}, {})", task_count, first_task));
        Ok(())
    }

    fn reference_resource(&mut self, resource: ResourceRef) {
        self.referenced.push(resource);
    }
}
