//! Unit tests for Vulkan conversion functions
//!
//! Pure mappings only, no GPU required.

use super::*;
use meshlet_hal::meshlet::device::DepthBias;

// ============================================================================
// FORMAT TESTS
// ============================================================================

#[test]
fn test_format_to_vk_color_and_depth() {
    assert_eq!(format_to_vk(Format::UNKNOWN), vk::Format::UNDEFINED);
    assert_eq!(format_to_vk(Format::R8G8B8A8_UNORM), vk::Format::R8G8B8A8_UNORM);
    assert_eq!(format_to_vk(Format::R10G10B10A2_UNORM), vk::Format::A2B10G10R10_UNORM_PACK32);
    assert_eq!(format_to_vk(Format::D32_SFLOAT), vk::Format::D32_SFLOAT);
    assert_eq!(format_to_vk(Format::D24_UNORM_S8_UINT), vk::Format::D24_UNORM_S8_UINT);
}

#[test]
fn test_format_aspect_mask() {
    assert_eq!(format_aspect_mask(Format::R8G8B8A8_SRGB), vk::ImageAspectFlags::COLOR);
    assert_eq!(format_aspect_mask(Format::D32_SFLOAT), vk::ImageAspectFlags::DEPTH);
    assert_eq!(
        format_aspect_mask(Format::D32_SFLOAT_S8_UINT),
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
    );
}

#[test]
fn test_sample_count_valid_values() {
    assert_eq!(sample_count_to_vk(1).unwrap(), vk::SampleCountFlags::TYPE_1);
    assert_eq!(sample_count_to_vk(4).unwrap(), vk::SampleCountFlags::TYPE_4);
    assert_eq!(sample_count_to_vk(64).unwrap(), vk::SampleCountFlags::TYPE_64);
}

#[test]
fn test_sample_count_rejects_non_power_of_two() {
    assert!(matches!(sample_count_to_vk(0), Err(Error::InvalidArgument(_))));
    assert!(matches!(sample_count_to_vk(3), Err(Error::InvalidArgument(_))));
    assert!(matches!(sample_count_to_vk(128), Err(Error::InvalidArgument(_))));
}

// ============================================================================
// SHADER STAGE TESTS
// ============================================================================

#[test]
fn test_meshlet_stages_map_to_nv_stages() {
    assert_eq!(shader_stages_to_vk(ShaderType::AMPLIFICATION), vk::ShaderStageFlags::TASK_NV);
    assert_eq!(shader_stages_to_vk(ShaderType::MESH), vk::ShaderStageFlags::MESH_NV);
    assert_eq!(shader_stages_to_vk(ShaderType::PIXEL), vk::ShaderStageFlags::FRAGMENT);
    assert_eq!(
        shader_stages_to_vk(ShaderType::ALL_MESHLET),
        vk::ShaderStageFlags::TASK_NV | vk::ShaderStageFlags::MESH_NV | vk::ShaderStageFlags::FRAGMENT
    );
}

#[test]
fn test_empty_stage_mask() {
    assert!(shader_stages_to_vk(ShaderType::empty()).is_empty());
}

// ============================================================================
// FIXED FUNCTION TESTS
// ============================================================================

#[test]
fn test_raster_state_without_depth_bias() {
    let info = raster_state_to_vk(&RasterState::default());
    assert_eq!(info.depth_bias_enable, vk::FALSE);
    assert_eq!(info.polygon_mode, vk::PolygonMode::FILL);
    assert_eq!(info.cull_mode, vk::CullModeFlags::BACK);
    assert_eq!(info.front_face, vk::FrontFace::COUNTER_CLOCKWISE);
    assert_eq!(info.line_width, 1.0);
}

#[test]
fn test_raster_state_with_depth_bias() {
    let raster = RasterState {
        depth_bias: Some(DepthBias { constant_factor: 2.0, slope_factor: 1.5, clamp: 0.25 }),
        cull_mode: CullMode::None,
        ..Default::default()
    };
    let info = raster_state_to_vk(&raster);
    assert_eq!(info.depth_bias_enable, vk::TRUE);
    assert_eq!(info.depth_bias_constant_factor, 2.0);
    assert_eq!(info.depth_bias_slope_factor, 1.5);
    assert_eq!(info.depth_bias_clamp, 0.25);
    assert_eq!(info.cull_mode, vk::CullModeFlags::NONE);
}

#[test]
fn test_stencil_state_uses_shared_masks_and_reference() {
    let ds = DepthStencilState {
        stencil_test_enable: true,
        stencil_read_mask: 0x0F,
        stencil_write_mask: 0xF0,
        stencil_ref_value: 7,
        front_face_stencil: StencilOpState {
            fail_op: StencilOp::Zero,
            pass_op: StencilOp::Replace,
            depth_fail_op: StencilOp::Invert,
            compare_op: CompareOp::Equal,
        },
        ..Default::default()
    };
    let info = depth_stencil_to_vk(&ds);
    assert_eq!(info.stencil_test_enable, vk::TRUE);
    assert_eq!(info.front.compare_mask, 0x0F);
    assert_eq!(info.front.write_mask, 0xF0);
    assert_eq!(info.front.reference, 7);
    assert_eq!(info.front.pass_op, vk::StencilOp::REPLACE);
    assert_eq!(info.front.compare_op, vk::CompareOp::EQUAL);
    assert_eq!(info.back.reference, 7);
}

#[test]
fn test_target_blend_conversion() {
    let target = TargetBlendState {
        blend_enable: true,
        src_color_factor: BlendFactor::SrcAlpha,
        dst_color_factor: BlendFactor::OneMinusSrcAlpha,
        color_write_mask: ColorWriteMask { r: true, g: true, b: true, a: false },
        ..Default::default()
    };
    let att = target_blend_to_vk(&target);
    assert_eq!(att.blend_enable, vk::TRUE);
    assert_eq!(att.src_color_blend_factor, vk::BlendFactor::SRC_ALPHA);
    assert_eq!(att.dst_color_blend_factor, vk::BlendFactor::ONE_MINUS_SRC_ALPHA);
    assert_eq!(
        att.color_write_mask,
        vk::ColorComponentFlags::R | vk::ColorComponentFlags::G | vk::ColorComponentFlags::B
    );
}

#[test]
fn test_topology_and_dynamic_state() {
    assert_eq!(topology_to_vk(PrimitiveTopology::TriangleList), vk::PrimitiveTopology::TRIANGLE_LIST);
    assert_eq!(topology_to_vk(PrimitiveTopology::PatchList), vk::PrimitiveTopology::PATCH_LIST);
    assert_eq!(dynamic_state_to_vk(DynamicState::BlendConstants), vk::DynamicState::BLEND_CONSTANTS);
    assert_eq!(dynamic_state_to_vk(DynamicState::StencilReference), vk::DynamicState::STENCIL_REFERENCE);
}

// ============================================================================
// BINDING / STATE TESTS
// ============================================================================

#[test]
fn test_binding_type_to_descriptor_type() {
    assert_eq!(binding_type_to_vk(BindingType::VolatileConstantBuffer), vk::DescriptorType::UNIFORM_BUFFER);
    assert_eq!(binding_type_to_vk(BindingType::StructuredBuffer), vk::DescriptorType::STORAGE_BUFFER);
    assert_eq!(binding_type_to_vk(BindingType::Texture), vk::DescriptorType::SAMPLED_IMAGE);
}

#[test]
fn test_resource_states_access() {
    let (stages, access) = resource_states_to_access(ResourceStates::INDIRECT_ARGUMENT);
    assert_eq!(stages, vk::PipelineStageFlags::DRAW_INDIRECT);
    assert_eq!(access, vk::AccessFlags::INDIRECT_COMMAND_READ);

    let (stages, access) = resource_states_to_access(ResourceStates::UNKNOWN);
    assert_eq!(stages, vk::PipelineStageFlags::TOP_OF_PIPE);
    assert!(access.is_empty());

    let (stages, _) = resource_states_to_access(ResourceStates::CONSTANT_BUFFER);
    assert!(stages.contains(vk::PipelineStageFlags::MESH_SHADER_NV));
}

#[test]
fn test_resource_states_image_layout() {
    assert_eq!(resource_states_to_image_layout(ResourceStates::UNKNOWN), vk::ImageLayout::UNDEFINED);
    assert_eq!(
        resource_states_to_image_layout(ResourceStates::RENDER_TARGET),
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL
    );
    assert_eq!(
        resource_states_to_image_layout(ResourceStates::DEPTH_WRITE),
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
    );
    assert_eq!(
        resource_states_to_image_layout(ResourceStates::SHADER_RESOURCE),
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
    );
}

#[test]
fn test_vk_error_mapping() {
    assert_eq!(vk_error(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY, "alloc"), Error::OutOfMemory);
    match vk_error(vk::Result::ERROR_INITIALIZATION_FAILED, "create pipeline") {
        Error::BackendFailure { code, .. } => {
            assert_eq!(code, vk::Result::ERROR_INITIALIZATION_FAILED.as_raw())
        }
        other => panic!("unexpected error {:?}", other),
    }
}
