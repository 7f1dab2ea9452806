/// Conversions from meshlet_hal enums and state blocks to Vulkan

use meshlet_hal::meshlet::{Result, Error};
use meshlet_hal::meshlet::device::{
    BindingType, BlendFactor, BlendOp, ColorWriteMask, CompareOp, CullMode, DepthStencilState,
    DynamicState, Format, FrontFace, PolygonMode, PrimitiveTopology, RasterState,
    ResourceStates, ShaderType, StencilOp, StencilOpState, TargetBlendState,
};
use meshlet_hal::{hal_invalid, hal_error, hal_backend_err};
use ash::vk;

// ===== FORMATS =====

pub fn format_to_vk(format: Format) -> vk::Format {
    match format {
        Format::UNKNOWN => vk::Format::UNDEFINED,
        Format::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        Format::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        Format::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        Format::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        Format::R16G16B16A16_SFLOAT => vk::Format::R16G16B16A16_SFLOAT,
        Format::R32G32B32A32_SFLOAT => vk::Format::R32G32B32A32_SFLOAT,
        Format::R10G10B10A2_UNORM => vk::Format::A2B10G10R10_UNORM_PACK32,
        Format::D16_UNORM => vk::Format::D16_UNORM,
        Format::D24_UNORM_S8_UINT => vk::Format::D24_UNORM_S8_UINT,
        Format::D32_SFLOAT => vk::Format::D32_SFLOAT,
        Format::D32_SFLOAT_S8_UINT => vk::Format::D32_SFLOAT_S8_UINT,
    }
}

/// Image aspects present in a format
pub fn format_aspect_mask(format: Format) -> vk::ImageAspectFlags {
    let mut aspect = vk::ImageAspectFlags::empty();
    if format.has_depth_component() {
        aspect |= vk::ImageAspectFlags::DEPTH;
    }
    if format.has_stencil_component() {
        aspect |= vk::ImageAspectFlags::STENCIL;
    }
    if aspect.is_empty() {
        aspect = vk::ImageAspectFlags::COLOR;
    }
    aspect
}

/// Sample count to Vulkan flags; only powers of two up to 64 are valid
pub fn sample_count_to_vk(count: u32) -> Result<vk::SampleCountFlags> {
    match count {
        1 => Ok(vk::SampleCountFlags::TYPE_1),
        2 => Ok(vk::SampleCountFlags::TYPE_2),
        4 => Ok(vk::SampleCountFlags::TYPE_4),
        8 => Ok(vk::SampleCountFlags::TYPE_8),
        16 => Ok(vk::SampleCountFlags::TYPE_16),
        32 => Ok(vk::SampleCountFlags::TYPE_32),
        64 => Ok(vk::SampleCountFlags::TYPE_64),
        other => Err(hal_invalid!("meshlet::vulkan", "Invalid sample count: {}", other)),
    }
}

// ===== SHADER STAGES =====

pub fn shader_stages_to_vk(stages: ShaderType) -> vk::ShaderStageFlags {
    let mut flags = vk::ShaderStageFlags::empty();
    if stages.contains(ShaderType::VERTEX) { flags |= vk::ShaderStageFlags::VERTEX; }
    if stages.contains(ShaderType::PIXEL) { flags |= vk::ShaderStageFlags::FRAGMENT; }
    if stages.contains(ShaderType::COMPUTE) { flags |= vk::ShaderStageFlags::COMPUTE; }
    if stages.contains(ShaderType::AMPLIFICATION) { flags |= vk::ShaderStageFlags::TASK_NV; }
    if stages.contains(ShaderType::MESH) { flags |= vk::ShaderStageFlags::MESH_NV; }
    flags
}

// ===== FIXED FUNCTION =====

pub fn topology_to_vk(topology: PrimitiveTopology) -> vk::PrimitiveTopology {
    match topology {
        PrimitiveTopology::PointList => vk::PrimitiveTopology::POINT_LIST,
        PrimitiveTopology::LineList => vk::PrimitiveTopology::LINE_LIST,
        PrimitiveTopology::LineStrip => vk::PrimitiveTopology::LINE_STRIP,
        PrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
        PrimitiveTopology::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
        PrimitiveTopology::TriangleFan => vk::PrimitiveTopology::TRIANGLE_FAN,
        PrimitiveTopology::TriangleListWithAdjacency => vk::PrimitiveTopology::TRIANGLE_LIST_WITH_ADJACENCY,
        PrimitiveTopology::TriangleStripWithAdjacency => vk::PrimitiveTopology::TRIANGLE_STRIP_WITH_ADJACENCY,
        PrimitiveTopology::PatchList => vk::PrimitiveTopology::PATCH_LIST,
    }
}

pub fn cull_mode_to_vk(mode: CullMode) -> vk::CullModeFlags {
    match mode {
        CullMode::None => vk::CullModeFlags::NONE,
        CullMode::Front => vk::CullModeFlags::FRONT,
        CullMode::Back => vk::CullModeFlags::BACK,
    }
}

pub fn front_face_to_vk(face: FrontFace) -> vk::FrontFace {
    match face {
        FrontFace::CounterClockwise => vk::FrontFace::COUNTER_CLOCKWISE,
        FrontFace::Clockwise => vk::FrontFace::CLOCKWISE,
    }
}

pub fn polygon_mode_to_vk(mode: PolygonMode) -> vk::PolygonMode {
    match mode {
        PolygonMode::Fill => vk::PolygonMode::FILL,
        PolygonMode::Line => vk::PolygonMode::LINE,
        PolygonMode::Point => vk::PolygonMode::POINT,
    }
}

pub fn compare_op_to_vk(op: CompareOp) -> vk::CompareOp {
    match op {
        CompareOp::Never => vk::CompareOp::NEVER,
        CompareOp::Less => vk::CompareOp::LESS,
        CompareOp::Equal => vk::CompareOp::EQUAL,
        CompareOp::LessOrEqual => vk::CompareOp::LESS_OR_EQUAL,
        CompareOp::Greater => vk::CompareOp::GREATER,
        CompareOp::NotEqual => vk::CompareOp::NOT_EQUAL,
        CompareOp::GreaterOrEqual => vk::CompareOp::GREATER_OR_EQUAL,
        CompareOp::Always => vk::CompareOp::ALWAYS,
    }
}

pub fn stencil_op_to_vk(op: StencilOp) -> vk::StencilOp {
    match op {
        StencilOp::Keep => vk::StencilOp::KEEP,
        StencilOp::Zero => vk::StencilOp::ZERO,
        StencilOp::Replace => vk::StencilOp::REPLACE,
        StencilOp::IncrementAndClamp => vk::StencilOp::INCREMENT_AND_CLAMP,
        StencilOp::DecrementAndClamp => vk::StencilOp::DECREMENT_AND_CLAMP,
        StencilOp::Invert => vk::StencilOp::INVERT,
        StencilOp::IncrementAndWrap => vk::StencilOp::INCREMENT_AND_WRAP,
        StencilOp::DecrementAndWrap => vk::StencilOp::DECREMENT_AND_WRAP,
    }
}

/// Per-face stencil state; masks and reference come from the shared block
pub fn stencil_op_state_to_vk(ds: &DepthStencilState, face: &StencilOpState) -> vk::StencilOpState {
    vk::StencilOpState {
        fail_op: stencil_op_to_vk(face.fail_op),
        pass_op: stencil_op_to_vk(face.pass_op),
        depth_fail_op: stencil_op_to_vk(face.depth_fail_op),
        compare_op: compare_op_to_vk(face.compare_op),
        compare_mask: ds.stencil_read_mask as u32,
        write_mask: ds.stencil_write_mask as u32,
        reference: ds.stencil_ref_value as u32,
    }
}

pub fn blend_factor_to_vk(factor: BlendFactor) -> vk::BlendFactor {
    match factor {
        BlendFactor::Zero => vk::BlendFactor::ZERO,
        BlendFactor::One => vk::BlendFactor::ONE,
        BlendFactor::SrcColor => vk::BlendFactor::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => vk::BlendFactor::ONE_MINUS_SRC_COLOR,
        BlendFactor::DstColor => vk::BlendFactor::DST_COLOR,
        BlendFactor::OneMinusDstColor => vk::BlendFactor::ONE_MINUS_DST_COLOR,
        BlendFactor::SrcAlpha => vk::BlendFactor::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstAlpha => vk::BlendFactor::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => vk::BlendFactor::ONE_MINUS_DST_ALPHA,
        BlendFactor::ConstantColor => vk::BlendFactor::CONSTANT_COLOR,
        BlendFactor::OneMinusConstantColor => vk::BlendFactor::ONE_MINUS_CONSTANT_COLOR,
        BlendFactor::SrcAlphaSaturate => vk::BlendFactor::SRC_ALPHA_SATURATE,
    }
}

pub fn blend_op_to_vk(op: BlendOp) -> vk::BlendOp {
    match op {
        BlendOp::Add => vk::BlendOp::ADD,
        BlendOp::Subtract => vk::BlendOp::SUBTRACT,
        BlendOp::ReverseSubtract => vk::BlendOp::REVERSE_SUBTRACT,
        BlendOp::Min => vk::BlendOp::MIN,
        BlendOp::Max => vk::BlendOp::MAX,
    }
}

pub fn color_write_mask_to_vk(mask: &ColorWriteMask) -> vk::ColorComponentFlags {
    let mut flags = vk::ColorComponentFlags::empty();
    if mask.r { flags |= vk::ColorComponentFlags::R; }
    if mask.g { flags |= vk::ColorComponentFlags::G; }
    if mask.b { flags |= vk::ColorComponentFlags::B; }
    if mask.a { flags |= vk::ColorComponentFlags::A; }
    flags
}

pub fn target_blend_to_vk(target: &TargetBlendState) -> vk::PipelineColorBlendAttachmentState {
    vk::PipelineColorBlendAttachmentState::default()
        .blend_enable(target.blend_enable)
        .src_color_blend_factor(blend_factor_to_vk(target.src_color_factor))
        .dst_color_blend_factor(blend_factor_to_vk(target.dst_color_factor))
        .color_blend_op(blend_op_to_vk(target.color_blend_op))
        .src_alpha_blend_factor(blend_factor_to_vk(target.src_alpha_factor))
        .dst_alpha_blend_factor(blend_factor_to_vk(target.dst_alpha_factor))
        .alpha_blend_op(blend_op_to_vk(target.alpha_blend_op))
        .color_write_mask(color_write_mask_to_vk(&target.color_write_mask))
}

pub fn raster_state_to_vk(raster: &RasterState) -> vk::PipelineRasterizationStateCreateInfo<'static> {
    let info = vk::PipelineRasterizationStateCreateInfo::default()
        .depth_clamp_enable(raster.depth_clamp_enable)
        .rasterizer_discard_enable(raster.rasterizer_discard_enable)
        .polygon_mode(polygon_mode_to_vk(raster.polygon_mode))
        .cull_mode(cull_mode_to_vk(raster.cull_mode))
        .front_face(front_face_to_vk(raster.front_face))
        .line_width(1.0);

    match raster.depth_bias {
        Some(bias) => info
            .depth_bias_enable(true)
            .depth_bias_constant_factor(bias.constant_factor)
            .depth_bias_slope_factor(bias.slope_factor)
            .depth_bias_clamp(bias.clamp),
        None => info.depth_bias_enable(false),
    }
}

pub fn depth_stencil_to_vk(ds: &DepthStencilState) -> vk::PipelineDepthStencilStateCreateInfo<'static> {
    vk::PipelineDepthStencilStateCreateInfo::default()
        .depth_test_enable(ds.depth_test_enable)
        .depth_write_enable(ds.depth_write_enable)
        .depth_compare_op(compare_op_to_vk(ds.depth_compare_op))
        .depth_bounds_test_enable(false)
        .stencil_test_enable(ds.stencil_test_enable)
        .front(stencil_op_state_to_vk(ds, &ds.front_face_stencil))
        .back(stencil_op_state_to_vk(ds, &ds.back_face_stencil))
}

pub fn dynamic_state_to_vk(state: DynamicState) -> vk::DynamicState {
    match state {
        DynamicState::Viewport => vk::DynamicState::VIEWPORT,
        DynamicState::Scissor => vk::DynamicState::SCISSOR,
        DynamicState::BlendConstants => vk::DynamicState::BLEND_CONSTANTS,
        DynamicState::StencilReference => vk::DynamicState::STENCIL_REFERENCE,
    }
}

// ===== BINDINGS =====

pub fn binding_type_to_vk(binding_type: BindingType) -> vk::DescriptorType {
    match binding_type {
        BindingType::ConstantBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        BindingType::VolatileConstantBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        BindingType::StructuredBuffer => vk::DescriptorType::STORAGE_BUFFER,
        BindingType::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
        BindingType::Texture => vk::DescriptorType::SAMPLED_IMAGE,
        BindingType::StorageTexture => vk::DescriptorType::STORAGE_IMAGE,
        BindingType::Sampler => vk::DescriptorType::SAMPLER,
    }
}

// ===== RESOURCE STATES =====

/// Pipeline stages and access mask covering every state in `states`
pub fn resource_states_to_access(states: ResourceStates) -> (vk::PipelineStageFlags, vk::AccessFlags) {
    let shader_stages = vk::PipelineStageFlags::TASK_SHADER_NV
        | vk::PipelineStageFlags::MESH_SHADER_NV
        | vk::PipelineStageFlags::FRAGMENT_SHADER;

    let mut stages = vk::PipelineStageFlags::empty();
    let mut access = vk::AccessFlags::empty();

    if states.contains(ResourceStates::CONSTANT_BUFFER) {
        stages |= shader_stages;
        access |= vk::AccessFlags::UNIFORM_READ;
    }
    if states.contains(ResourceStates::SHADER_RESOURCE) {
        stages |= shader_stages;
        access |= vk::AccessFlags::SHADER_READ;
    }
    if states.contains(ResourceStates::UNORDERED_ACCESS) {
        stages |= shader_stages;
        access |= vk::AccessFlags::SHADER_READ | vk::AccessFlags::SHADER_WRITE;
    }
    if states.contains(ResourceStates::RENDER_TARGET) {
        stages |= vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT;
        access |= vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE;
    }
    if states.contains(ResourceStates::DEPTH_WRITE) {
        stages |= vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS;
        access |= vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE;
    }
    if states.contains(ResourceStates::DEPTH_READ) {
        stages |= vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS;
        access |= vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ;
    }
    if states.contains(ResourceStates::INDIRECT_ARGUMENT) {
        stages |= vk::PipelineStageFlags::DRAW_INDIRECT;
        access |= vk::AccessFlags::INDIRECT_COMMAND_READ;
    }
    if states.contains(ResourceStates::COPY_DEST) {
        stages |= vk::PipelineStageFlags::TRANSFER;
        access |= vk::AccessFlags::TRANSFER_WRITE;
    }
    if states.contains(ResourceStates::COPY_SOURCE) {
        stages |= vk::PipelineStageFlags::TRANSFER;
        access |= vk::AccessFlags::TRANSFER_READ;
    }

    if stages.is_empty() {
        stages = vk::PipelineStageFlags::TOP_OF_PIPE;
    }
    (stages, access)
}

/// Image layout for a texture in `states`
pub fn resource_states_to_image_layout(states: ResourceStates) -> vk::ImageLayout {
    if states.is_empty() {
        vk::ImageLayout::UNDEFINED
    } else if states.contains(ResourceStates::RENDER_TARGET) {
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL
    } else if states.contains(ResourceStates::DEPTH_WRITE) {
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
    } else if states.contains(ResourceStates::DEPTH_READ) {
        vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL
    } else if states.contains(ResourceStates::UNORDERED_ACCESS) {
        vk::ImageLayout::GENERAL
    } else if states.contains(ResourceStates::COPY_DEST) {
        vk::ImageLayout::TRANSFER_DST_OPTIMAL
    } else if states.contains(ResourceStates::COPY_SOURCE) {
        vk::ImageLayout::TRANSFER_SRC_OPTIMAL
    } else {
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
    }
}

// ===== ERRORS =====

/// Convert a failed Vulkan call into a HAL error.
/// Out-of-memory results map to `Error::OutOfMemory`.
pub fn vk_error(result: vk::Result, what: &str) -> Error {
    match result {
        vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
            hal_error!("meshlet::vulkan", "{}: out of memory ({:?})", what, result);
            Error::OutOfMemory
        }
        other => hal_backend_err!("meshlet::vulkan", other.as_raw(), "{}: {:?}", what, other),
    }
}

#[cfg(test)]
#[path = "vulkan_convert_tests.rs"]
mod tests;
