/*!
# Meshlet HAL - Vulkan Backend

Vulkan implementation of the meshlet_hal device and encoder traits, using
ash for Vulkan bindings and gpu-allocator for memory management.

Meshlet pipelines are built on VK_NV_mesh_shader and render through
dynamic rendering (Vulkan 1.3), so no render pass or framebuffer objects
exist on the Vulkan side.

# Example

```no_run
use meshlet_hal::meshlet::Config;
use meshlet_hal::meshlet::device::MeshletDevice;
use meshlet_hal_vulkan::VulkanMeshletDevice;

let device = VulkanMeshletDevice::new(Config::default())?;
if !device.supports_mesh_shading() {
    // fall back to a vertex pipeline
}
# Ok::<(), meshlet_hal::meshlet::Error>(())
```
*/

mod vulkan_context;
mod vulkan_convert;
mod vulkan_shader;
mod vulkan_buffer;
mod vulkan_texture;
mod vulkan_framebuffer;
mod vulkan_binding;
mod vulkan_pipeline_layout;
mod vulkan_meshlet_pipeline;
mod vulkan_command_list;
mod vulkan_device;

pub use vulkan_context::GpuContext;
pub use vulkan_device::VulkanMeshletDevice;
pub use vulkan_binding::{BindingSetItem, BindingLayout as VulkanBindingLayout, BindingSet as VulkanBindingSet};
pub use vulkan_buffer::Buffer as VulkanBuffer;
pub use vulkan_texture::Texture as VulkanTexture;
pub use vulkan_shader::Shader as VulkanShader;
pub use vulkan_framebuffer::Framebuffer as VulkanFramebuffer;
pub use vulkan_meshlet_pipeline::MeshletPipeline as VulkanMeshletPipeline;
pub use vulkan_command_list::{CommandEncoder as VulkanCommandEncoder, CommandList as VulkanCommandList};
