//! Unit tests for the pure meshlet pipeline builder helpers (no GPU)

use super::*;
use meshlet_hal::meshlet::device::{
    BlendFactor, Format, ShaderDesc, SpecializationConstant, SpecializationValue, TargetBlendState,
};

struct TestShader {
    desc: ShaderDesc,
}

impl HalShader for TestShader {
    fn desc(&self) -> &ShaderDesc {
        &self.desc
    }

    fn bytecode(&self) -> &[u32] {
        &[]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn shader(shader_type: ShaderType, constants: Vec<SpecializationConstant>) -> Arc<dyn HalShader> {
    Arc::new(TestShader {
        desc: ShaderDesc::new(shader_type, "main").with_constants(constants),
    })
}

fn constant(constant_id: u32, value: SpecializationValue) -> SpecializationConstant {
    SpecializationConstant { constant_id, value }
}

// ============================================================================
// SPECIALIZATION TESTS
// ============================================================================

#[test]
fn test_fill_specializations_mixed_stages() {
    let amplification = shader(ShaderType::AMPLIFICATION, vec![]);
    let mesh = shader(
        ShaderType::MESH,
        vec![constant(0, SpecializationValue::U32(64)), constant(3, SpecializationValue::Bool(true))],
    );
    let pixel = shader(ShaderType::PIXEL, vec![constant(1, SpecializationValue::F32(0.5))]);

    let (storage, stages) = fill_specializations(&[&amplification, &mesh, &pixel]).unwrap();

    assert_eq!(stages, vec![None, Some(0), Some(1)]);
    assert_eq!(storage.stage_count(), 2);
    assert_eq!(storage.capacity(), (3, 3));

    let mesh_stage = storage.stage(0).unwrap();
    let entries = storage.entries(mesh_stage);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].constant_id, 3);
    assert_eq!(entries[1].offset, 4);
    assert_eq!(storage.data(mesh_stage), &[64, 1]);

    let pixel_stage = storage.stage(1).unwrap();
    assert_eq!(storage.data(pixel_stage), &[0.5f32.to_bits()]);
}

#[test]
fn test_fill_specializations_no_constants() {
    let mesh = shader(ShaderType::MESH, vec![]);
    let (storage, stages) = fill_specializations(&[&mesh]).unwrap();
    assert_eq!(stages, vec![None]);
    assert_eq!(storage.stage_count(), 0);
    assert_eq!(storage.counts().stages, 1);
}

#[test]
fn test_specialization_bytes_are_little_endian_words() {
    let mesh = shader(ShaderType::MESH, vec![constant(0, SpecializationValue::I32(-1))]);
    let (storage, _) = fill_specializations(&[&mesh]).unwrap();
    let stage = storage.stage(0).unwrap();
    let bytes: &[u8] = bytemuck::cast_slice(storage.data(stage));
    assert_eq!(bytes, &[0xFF, 0xFF, 0xFF, 0xFF]);
}

// ============================================================================
// BLEND / FORMAT TESTS
// ============================================================================

#[test]
fn test_color_blend_attachment_count_matches_targets() {
    let mut blend = BlendState::default();
    blend.targets[1] = TargetBlendState {
        blend_enable: true,
        src_color_factor: BlendFactor::ConstantColor,
        ..Default::default()
    };

    assert!(color_blend_attachments(&blend, 0).is_empty());

    let attachments = color_blend_attachments(&blend, 2);
    assert_eq!(attachments.len(), 2);
    assert_eq!(attachments[0].blend_enable, vk::FALSE);
    assert_eq!(attachments[1].src_color_blend_factor, vk::BlendFactor::CONSTANT_COLOR);
}

#[test]
fn test_rendering_formats_depth_only() {
    let info = FramebufferInfo::new(vec![Format::R8G8B8A8_UNORM], Format::D32_SFLOAT, 1);
    let formats = RenderingFormats::from_info(&info);
    assert_eq!(formats.color, vec![vk::Format::R8G8B8A8_UNORM]);
    assert_eq!(formats.depth, vk::Format::D32_SFLOAT);
    assert_eq!(formats.stencil, vk::Format::UNDEFINED);
}

#[test]
fn test_rendering_formats_depth_stencil() {
    let info = FramebufferInfo::new(vec![], Format::D24_UNORM_S8_UINT, 4);
    let formats = RenderingFormats::from_info(&info);
    assert!(formats.color.is_empty());
    assert_eq!(formats.depth, vk::Format::D24_UNORM_S8_UINT);
    assert_eq!(formats.stencil, vk::Format::D24_UNORM_S8_UINT);
}

#[test]
fn test_rendering_formats_without_depth() {
    let info = FramebufferInfo::new(
        vec![Format::B8G8R8A8_SRGB, Format::R16G16B16A16_SFLOAT],
        Format::UNKNOWN,
        1,
    );
    let formats = RenderingFormats::from_info(&info);
    assert_eq!(formats.color.len(), 2);
    assert_eq!(formats.depth, vk::Format::UNDEFINED);
    assert_eq!(formats.stencil, vk::Format::UNDEFINED);
}
