/// Shader trait and shader descriptor

use std::any::Any;
use bitflags::bitflags;

bitflags! {
    /// Shader stage mask
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShaderType: u32 {
        const VERTEX = 1 << 0;
        const PIXEL = 1 << 1;
        const COMPUTE = 1 << 2;
        const AMPLIFICATION = 1 << 3;
        const MESH = 1 << 4;

        const ALL_MESHLET = Self::AMPLIFICATION.bits() | Self::MESH.bits() | Self::PIXEL.bits();
    }
}

/// Value of a specialization constant
///
/// Every variant occupies exactly one 32-bit word in the specialization data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpecializationValue {
    Bool(bool),
    U32(u32),
    I32(i32),
    F32(f32),
}

impl SpecializationValue {
    /// Raw 32-bit word as consumed by the backend
    pub fn to_bits(self) -> u32 {
        match self {
            SpecializationValue::Bool(v) => v as u32,
            SpecializationValue::U32(v) => v,
            SpecializationValue::I32(v) => v as u32,
            SpecializationValue::F32(v) => v.to_bits(),
        }
    }
}

/// A single specialization constant override
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecializationConstant {
    pub constant_id: u32,
    pub value: SpecializationValue,
}

/// Descriptor for creating a shader
#[derive(Debug, Clone)]
pub struct ShaderDesc {
    /// Stage this shader is compiled for (exactly one bit)
    pub shader_type: ShaderType,
    /// Entry point name (e.g., "main")
    pub entry_point: String,
    /// Specialization constants applied at pipeline creation
    pub specialization_constants: Vec<SpecializationConstant>,
}

impl ShaderDesc {
    pub fn new(shader_type: ShaderType, entry_point: &str) -> Self {
        Self {
            shader_type,
            entry_point: entry_point.to_string(),
            specialization_constants: Vec::new(),
        }
    }

    pub fn with_constants(mut self, constants: Vec<SpecializationConstant>) -> Self {
        self.specialization_constants = constants;
        self
    }
}

/// Shader module trait
///
/// Implemented by backend-specific shader types (e.g., VulkanShader).
pub trait Shader: Send + Sync {
    fn desc(&self) -> &ShaderDesc;

    /// SPIR-V words this shader was created from
    fn bytecode(&self) -> &[u32];

    fn as_any(&self) -> &dyn Any;
}
