/// Texture - Vulkan implementation of the Texture trait

use meshlet_hal::meshlet::device::{ResourceId, ResourceStateCell, Texture as HalTexture, TextureDesc};
use ash::vk;
use gpu_allocator::vulkan::Allocation;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan texture implementation
pub struct Texture {
    ctx: Arc<GpuContext>,
    /// Vulkan image
    pub(crate) image: vk::Image,
    /// Vulkan image view
    pub(crate) view: vk::ImageView,
    /// GPU memory allocation
    pub(crate) allocation: Option<Allocation>,
    desc: TextureDesc,
    id: ResourceId,
    state: ResourceStateCell,
}

impl Texture {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        image: vk::Image,
        view: vk::ImageView,
        allocation: Allocation,
        desc: TextureDesc,
    ) -> Self {
        Self {
            ctx,
            image,
            view,
            allocation: Some(allocation),
            desc,
            id: ResourceId::next(),
            state: ResourceStateCell::new(),
        }
    }
}

impl HalTexture for Texture {
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

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            // Destroy image view
            self.ctx.device.destroy_image_view(self.view, None);

            // Free GPU memory
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            // Destroy image
            self.ctx.device.destroy_image(self.image, None);
        }
    }
}
