/// Meshlet pipeline description, pipeline trait and per-draw state

use std::any::Any;
use std::sync::Arc;
use crate::error::Result;
use crate::device::{
    BindingLayout, BindingSet, Buffer, Color, Framebuffer, FramebufferInfo,
    PrimitiveTopology, RenderState, Shader, ShaderType, ViewportState,
};

/// Pipeline state deferred to draw time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DynamicState {
    Viewport,
    Scissor,
    BlendConstants,
    StencilReference,
}

/// Descriptor for creating a meshlet pipeline
#[derive(Clone, Default)]
pub struct MeshletPipelineDesc {
    /// Optional amplification (task) shader
    pub amplification: Option<Arc<dyn Shader>>,
    pub mesh: Option<Arc<dyn Shader>>,
    /// Optional pixel shader (absent for depth-only passes)
    pub pixel: Option<Arc<dyn Shader>>,
    pub render_state: RenderState,
    pub topology: PrimitiveTopology,
    pub binding_layouts: Vec<Arc<dyn BindingLayout>>,
}

impl MeshletPipelineDesc {
    /// Present stages in linkage order: amplification, mesh, pixel
    pub fn stages(&self) -> Vec<(ShaderType, &Arc<dyn Shader>)> {
        [
            (ShaderType::AMPLIFICATION, self.amplification.as_ref()),
            (ShaderType::MESH, self.mesh.as_ref()),
            (ShaderType::PIXEL, self.pixel.as_ref()),
        ]
        .into_iter()
        .filter_map(|(stage, shader)| shader.map(|s| (stage, s)))
        .collect()
    }

    /// Mask of the present stages
    pub fn shader_mask(&self) -> ShaderType {
        self.stages()
            .iter()
            .fold(ShaderType::empty(), |mask, (stage, _)| mask | *stage)
    }

    /// Check that each shader was compiled for the slot it occupies
    pub fn validate(&self) -> Result<()> {
        for (stage, shader) in self.stages() {
            let declared = shader.desc().shader_type;
            if declared != stage {
                return Err(crate::hal_invalid!(
                    "meshlet::pipeline",
                    "Shader of type {:?} bound to the {:?} slot",
                    declared,
                    stage
                ));
            }
        }
        Ok(())
    }

    /// Dynamic states a pipeline built for `framebuffer_info` needs
    pub fn dynamic_states(&self, framebuffer_info: &FramebufferInfo) -> Vec<DynamicState> {
        let mut states = vec![DynamicState::Viewport, DynamicState::Scissor];
        if self.uses_blend_constants(framebuffer_info) {
            states.push(DynamicState::BlendConstants);
        }
        if self.render_state.depth_stencil.dynamic_stencil_ref {
            states.push(DynamicState::StencilReference);
        }
        states
    }

    pub fn uses_blend_constants(&self, framebuffer_info: &FramebufferInfo) -> bool {
        self.render_state
            .blend
            .uses_constant_color(framebuffer_info.color_formats.len())
    }
}

impl std::fmt::Debug for MeshletPipelineDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshletPipelineDesc")
            .field("stages", &self.shader_mask())
            .field("render_state", &self.render_state)
            .field("topology", &self.topology)
            .field("binding_layouts", &self.binding_layouts.len())
            .finish()
    }
}

/// Compiled meshlet pipeline
///
/// Shared through `Arc` across recorders; immutable after creation.
/// Native handles are released when the last reference drops.
pub trait MeshletPipeline: Send + Sync {
    fn desc(&self) -> &MeshletPipelineDesc;

    fn framebuffer_info(&self) -> &FramebufferInfo;

    fn shader_mask(&self) -> ShaderType;

    /// Any color target reads the dynamic blend constant color
    fn uses_blend_constants(&self) -> bool;

    /// Descriptor-set index to binding-set array index
    fn descriptor_set_mapping(&self) -> &[Option<usize>];

    /// Stages the push-constant range is visible to
    fn push_constant_visibility(&self) -> ShaderType;

    fn as_any(&self) -> &dyn Any;
}

/// Everything a meshlet draw binds
#[derive(Clone, Default)]
pub struct MeshletState {
    pub pipeline: Option<Arc<dyn MeshletPipeline>>,
    pub framebuffer: Option<Arc<dyn Framebuffer>>,
    pub viewport: ViewportState,
    pub blend_constant_color: Color,
    pub dynamic_stencil_ref_value: u8,
    pub bindings: Vec<Arc<dyn BindingSet>>,
    /// Buffer holding indirect dispatch arguments
    pub indirect_params: Option<Arc<dyn Buffer>>,
}

impl MeshletState {
    pub fn new(pipeline: Arc<dyn MeshletPipeline>, framebuffer: Arc<dyn Framebuffer>) -> Self {
        Self {
            pipeline: Some(pipeline),
            framebuffer: Some(framebuffer),
            ..Self::default()
        }
    }

    pub fn with_viewport(mut self, viewport: ViewportState) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_bindings(mut self, bindings: Vec<Arc<dyn BindingSet>>) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn with_blend_constant_color(mut self, color: Color) -> Self {
        self.blend_constant_color = color;
        self
    }

    pub fn with_stencil_ref(mut self, value: u8) -> Self {
        self.dynamic_stencil_ref_value = value;
        self
    }

    pub fn with_indirect_params(mut self, buffer: Arc<dyn Buffer>) -> Self {
        self.indirect_params = Some(buffer);
        self
    }
}

impl std::fmt::Debug for MeshletState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshletState")
            .field("has_pipeline", &self.pipeline.is_some())
            .field("has_framebuffer", &self.framebuffer.is_some())
            .field("viewport", &self.viewport)
            .field("blend_constant_color", &self.blend_constant_color)
            .field("dynamic_stencil_ref_value", &self.dynamic_stencil_ref_value)
            .field("bindings", &self.bindings.len())
            .field("has_indirect_params", &self.indirect_params.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "meshlet_pipeline_tests.rs"]
mod tests;
