/// Framebuffer - attachment set used with dynamic rendering
///
/// No VkFramebuffer or VkRenderPass is created: the attachments are handed
/// to vkCmdBeginRendering directly.

use meshlet_hal::meshlet::Result;
use meshlet_hal::meshlet::device::{
    Format, Framebuffer as HalFramebuffer, FramebufferInfo, Texture as HalTexture,
};
use meshlet_hal::hal_invalid;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_texture::Texture;

pub struct Framebuffer {
    info: FramebufferInfo,
    color_attachments: Vec<Arc<dyn HalTexture>>,
    depth_attachment: Option<Arc<dyn HalTexture>>,
    extent: (u32, u32),
}

impl Framebuffer {
    /// Build a framebuffer from Vulkan textures of identical size and sample count
    pub fn new(
        color_attachments: Vec<Arc<dyn HalTexture>>,
        depth_attachment: Option<Arc<dyn HalTexture>>,
    ) -> Result<Self> {
        let first = color_attachments
            .first()
            .or(depth_attachment.as_ref())
            .ok_or_else(|| hal_invalid!("meshlet::vulkan", "Framebuffer needs at least one attachment"))?;
        let extent = (first.desc().width, first.desc().height);
        let sample_count = first.desc().sample_count;

        for texture in color_attachments.iter().chain(depth_attachment.iter()) {
            if texture.as_any().downcast_ref::<Texture>().is_none() {
                return Err(hal_invalid!(
                    "meshlet::vulkan",
                    "Framebuffer attachment '{}' is not a Vulkan texture",
                    texture.desc().debug_name
                ));
            }
            let desc = texture.desc();
            if (desc.width, desc.height) != extent || desc.sample_count != sample_count {
                return Err(hal_invalid!(
                    "meshlet::vulkan",
                    "Framebuffer attachment '{}' is {}x{} with {} samples, expected {}x{} with {}",
                    desc.debug_name, desc.width, desc.height, desc.sample_count,
                    extent.0, extent.1, sample_count
                ));
            }
        }

        let info = FramebufferInfo::new(
            color_attachments.iter().map(|t| t.desc().format).collect(),
            depth_attachment.as_ref().map_or(Format::UNKNOWN, |t| t.desc().format),
            sample_count,
        );
        info.validate()?;

        Ok(Self { info, color_attachments, depth_attachment, extent })
    }
}

impl HalFramebuffer for Framebuffer {
    fn info(&self) -> &FramebufferInfo {
        &self.info
    }

    fn color_attachments(&self) -> &[Arc<dyn HalTexture>] {
        &self.color_attachments
    }

    fn depth_attachment(&self) -> Option<&Arc<dyn HalTexture>> {
        self.depth_attachment.as_ref()
    }

    fn extent(&self) -> (u32, u32) {
        self.extent
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
