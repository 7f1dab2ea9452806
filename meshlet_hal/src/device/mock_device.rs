/// Mock device objects for unit tests (no GPU required)

use std::any::Any;
use std::sync::{Arc, Mutex};
use crate::error::Result;
use crate::device::{
    descriptor_set_mapping, push_constant_range, BindingLayout, BindingLayoutDesc,
    BindingSet, Buffer, BufferDesc, Format, Framebuffer, FramebufferInfo, MeshletDevice,
    MeshletPipeline, MeshletPipelineDesc, ResourceId, ResourceStateCell, ResourceStates, ResourceUsage,
    Shader, ShaderDesc, ShaderType, SpecializationConstant, Texture, TextureDesc,
    TrackedResource,
};

// ============================================================================
// Mock Shader
// ============================================================================

#[derive(Debug)]
pub struct MockShader {
    pub desc: ShaderDesc,
    pub code: Vec<u32>,
}

impl MockShader {
    pub fn new(shader_type: ShaderType) -> Self {
        Self::with_constants(shader_type, Vec::new())
    }

    pub fn with_constants(shader_type: ShaderType, constants: Vec<SpecializationConstant>) -> Self {
        Self {
            desc: ShaderDesc::new(shader_type, "main").with_constants(constants),
            code: vec![0x0723_0203],
        }
    }
}

impl Shader for MockShader {
    fn desc(&self) -> &ShaderDesc {
        &self.desc
    }

    fn bytecode(&self) -> &[u32] {
        &self.code
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Buffer
// ============================================================================

#[derive(Debug)]
pub struct MockBuffer {
    pub desc: BufferDesc,
    pub id: ResourceId,
    /// (offset, length) of every update
    pub writes: Mutex<Vec<(u64, usize)>>,
    pub state: ResourceStateCell,
}

impl MockBuffer {
    pub fn new(size: u64, is_volatile: bool) -> Self {
        Self {
            desc: BufferDesc {
                size,
                is_volatile,
                ..BufferDesc::default()
            },
            id: ResourceId::next(),
            writes: Mutex::new(Vec::new()),
            state: ResourceStateCell::new(),
        }
    }
}

impl Buffer for MockBuffer {
    fn desc(&self) -> &BufferDesc {
        &self.desc
    }

    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        if offset + data.len() as u64 > self.desc.size {
            return Err(crate::hal_invalid!("meshlet::mock", "write past end of buffer"));
        }
        if let Ok(mut writes) = self.writes.lock() {
            writes.push((offset, data.len()));
        }
        Ok(())
    }

    fn committed_state(&self) -> &ResourceStateCell {
        &self.state
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Texture
// ============================================================================

#[derive(Debug)]
pub struct MockTexture {
    pub desc: TextureDesc,
    pub id: ResourceId,
    pub state: ResourceStateCell,
}

impl MockTexture {
    pub fn new(format: Format) -> Self {
        Self {
            desc: TextureDesc {
                width: 256,
                height: 256,
                format,
                sample_count: 1,
                debug_name: String::new(),
            },
            id: ResourceId::next(),
            state: ResourceStateCell::new(),
        }
    }
}

impl Texture for MockTexture {
    fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn committed_state(&self) -> &ResourceStateCell {
        &self.state
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Framebuffer
// ============================================================================

pub struct MockFramebuffer {
    pub info: FramebufferInfo,
    pub colors: Vec<Arc<dyn Texture>>,
    pub depth: Option<Arc<dyn Texture>>,
}

impl MockFramebuffer {
    pub fn new(info: FramebufferInfo) -> Self {
        let colors = info
            .color_formats
            .iter()
            .map(|&format| Arc::new(MockTexture::new(format)) as Arc<dyn Texture>)
            .collect();
        let depth = info
            .has_depth_attachment()
            .then(|| Arc::new(MockTexture::new(info.depth_format)) as Arc<dyn Texture>);
        Self { info, colors, depth }
    }

    /// One RGBA8 target plus D32 depth
    pub fn simple() -> Self {
        Self::new(FramebufferInfo::new(
            vec![Format::R8G8B8A8_UNORM],
            Format::D32_SFLOAT,
            1,
        ))
    }
}

impl Framebuffer for MockFramebuffer {
    fn info(&self) -> &FramebufferInfo {
        &self.info
    }

    fn color_attachments(&self) -> &[Arc<dyn Texture>] {
        &self.colors
    }

    fn depth_attachment(&self) -> Option<&Arc<dyn Texture>> {
        self.depth.as_ref()
    }

    fn extent(&self) -> (u32, u32) {
        (256, 256)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Binding Layout / Binding Set
// ============================================================================

#[derive(Debug)]
pub struct MockBindingLayout {
    pub desc: BindingLayoutDesc,
}

impl MockBindingLayout {
    pub fn new(visibility: ShaderType, descriptor_set_index: Option<u32>, push_constants_size: u32) -> Self {
        Self {
            desc: BindingLayoutDesc {
                visibility,
                descriptor_set_index,
                items: Vec::new(),
                push_constants_size,
            },
        }
    }
}

impl BindingLayout for MockBindingLayout {
    fn desc(&self) -> &BindingLayoutDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockBindingSet {
    pub layout: Arc<dyn BindingLayout>,
    pub usages: Vec<ResourceUsage>,
}

impl MockBindingSet {
    pub fn new(layout: Arc<dyn BindingLayout>) -> Self {
        Self { layout, usages: Vec::new() }
    }

    /// Binding set reading `buffer` as a constant buffer
    pub fn with_buffer(layout: Arc<dyn BindingLayout>, buffer: Arc<dyn Buffer>) -> Self {
        Self {
            layout,
            usages: vec![ResourceUsage {
                resource: TrackedResource::Buffer(buffer),
                state: ResourceStates::CONSTANT_BUFFER,
            }],
        }
    }
}

impl BindingSet for MockBindingSet {
    fn layout(&self) -> &Arc<dyn BindingLayout> {
        &self.layout
    }

    fn resource_usages(&self) -> &[ResourceUsage] {
        &self.usages
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Pipeline
// ============================================================================

pub struct MockPipeline {
    pub desc: MeshletPipelineDesc,
    pub framebuffer_info: FramebufferInfo,
    pub mapping: Vec<Option<usize>>,
    pub push_constant_visibility: ShaderType,
}

impl MockPipeline {
    pub fn new(desc: MeshletPipelineDesc, framebuffer_info: FramebufferInfo) -> Result<Self> {
        desc.validate()?;
        let mapping = descriptor_set_mapping(&desc.binding_layouts)?;
        let (push_constant_visibility, _) = push_constant_range(&desc.binding_layouts);
        Ok(Self { desc, framebuffer_info, mapping, push_constant_visibility })
    }

    /// Amplification + mesh + pixel pipeline with one binding layout
    pub fn simple(framebuffer_info: FramebufferInfo) -> Self {
        let desc = MeshletPipelineDesc {
            amplification: Some(Arc::new(MockShader::new(ShaderType::AMPLIFICATION))),
            mesh: Some(Arc::new(MockShader::new(ShaderType::MESH))),
            pixel: Some(Arc::new(MockShader::new(ShaderType::PIXEL))),
            binding_layouts: vec![Arc::new(MockBindingLayout::new(ShaderType::ALL_MESHLET, None, 16))],
            ..MeshletPipelineDesc::default()
        };
        Self {
            mapping: vec![Some(0)],
            push_constant_visibility: ShaderType::ALL_MESHLET,
            desc,
            framebuffer_info,
        }
    }
}

impl MeshletPipeline for MockPipeline {
    fn desc(&self) -> &MeshletPipelineDesc {
        &self.desc
    }

    fn framebuffer_info(&self) -> &FramebufferInfo {
        &self.framebuffer_info
    }

    fn shader_mask(&self) -> ShaderType {
        self.desc.shader_mask()
    }

    fn uses_blend_constants(&self) -> bool {
        self.desc.uses_blend_constants(&self.framebuffer_info)
    }

    fn descriptor_set_mapping(&self) -> &[Option<usize>] {
        &self.mapping
    }

    fn push_constant_visibility(&self) -> ShaderType {
        self.push_constant_visibility
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Device
// ============================================================================

pub struct MockDevice {
    pub mesh_shading: bool,
    pub pipelines_created: Mutex<u32>,
}

impl MockDevice {
    pub fn new(mesh_shading: bool) -> Self {
        Self { mesh_shading, pipelines_created: Mutex::new(0) }
    }
}

impl MeshletDevice for MockDevice {
    fn supports_mesh_shading(&self) -> bool {
        self.mesh_shading
    }

    fn create_meshlet_pipeline(
        &self,
        desc: MeshletPipelineDesc,
        framebuffer_info: &FramebufferInfo,
    ) -> Result<Arc<dyn MeshletPipeline>> {
        if !self.mesh_shading {
            return Err(crate::hal_unsupported!("meshlet::mock", "mesh shading not supported"));
        }
        let pipeline = MockPipeline::new(desc, framebuffer_info.clone())?;
        if let Ok(mut count) = self.pipelines_created.lock() {
            *count += 1;
        }
        Ok(Arc::new(pipeline))
    }
}

#[cfg(test)]
#[path = "mock_device_tests.rs"]
mod tests;
