/// Shader - Vulkan implementation of the Shader trait

use meshlet_hal::meshlet::device::{Shader as HalShader, ShaderDesc};
use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan shader implementation
///
/// Keeps the SPIR-V words next to the module so pipeline builders and
/// tooling can inspect the bytecode.
pub struct Shader {
    ctx: Arc<GpuContext>,
    /// Vulkan shader module
    pub(crate) module: vk::ShaderModule,
    desc: ShaderDesc,
    code: Vec<u32>,
}

impl Shader {
    pub(crate) fn new(ctx: Arc<GpuContext>, module: vk::ShaderModule, desc: ShaderDesc, code: Vec<u32>) -> Self {
        Self { ctx, module, desc, code }
    }
}

impl HalShader for Shader {
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

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_shader_module(self.module, None);
        }
    }
}
