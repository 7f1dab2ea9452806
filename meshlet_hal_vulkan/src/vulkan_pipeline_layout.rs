/// PipelineLayout - VkPipelineLayout built from a descriptor-set mapping

use meshlet_hal::meshlet::Result;
use meshlet_hal::meshlet::device::{push_constant_range, BindingLayout as HalBindingLayout, ShaderType};
use meshlet_hal::hal_invalid;
use ash::vk;
use std::sync::Arc;

use crate::vulkan_binding::BindingLayout;
use crate::vulkan_context::GpuContext;
use crate::vulkan_convert::{shader_stages_to_vk, vk_error};

/// Pipeline layout plus the empty set layouts it owns for mapping gaps
pub struct PipelineLayout {
    ctx: Arc<GpuContext>,
    pub(crate) layout: vk::PipelineLayout,
    empty_set_layouts: Vec<vk::DescriptorSetLayout>,
    /// Stages that see the push constants (empty when there are none)
    pub(crate) push_constant_visibility: ShaderType,
    pub(crate) push_constant_stages: vk::ShaderStageFlags,
    /// Size in bytes of the single push-constant range at offset 0
    pub(crate) push_constant_size: u32,
}

impl PipelineLayout {
    /// Create a layout whose set `n` is `layouts[mapping[n]]`, or an empty
    /// set layout where `mapping[n]` is `None`
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        layouts: &[Arc<dyn HalBindingLayout>],
        mapping: &[Option<usize>],
    ) -> Result<Self> {
        let (push_constant_visibility, push_constant_size) = push_constant_range(layouts);
        let push_constant_stages = shader_stages_to_vk(push_constant_visibility);

        // Owned early so a failure halfway still releases what was created
        let mut result = Self {
            ctx,
            layout: vk::PipelineLayout::null(),
            empty_set_layouts: Vec::new(),
            push_constant_visibility,
            push_constant_stages,
            push_constant_size,
        };

        let mut set_layouts: Vec<vk::DescriptorSetLayout> = Vec::with_capacity(mapping.len());
        for (set, entry) in mapping.iter().enumerate() {
            match entry {
                Some(layout_index) => {
                    let vk_layout = layouts
                        .get(*layout_index)
                        .and_then(|layout| layout.as_any().downcast_ref::<BindingLayout>())
                        .ok_or_else(|| hal_invalid!(
                            "meshlet::vulkan",
                            "Descriptor set {} maps to binding layout {} which is missing or not a Vulkan layout",
                            set, layout_index
                        ))?;
                    set_layouts.push(vk_layout.set_layout);
                }
                None => {
                    let info = vk::DescriptorSetLayoutCreateInfo::default();
                    let empty = unsafe {
                        result.ctx.device
                            .create_descriptor_set_layout(&info, None)
                            .map_err(|e| vk_error(e, "Failed to create empty descriptor set layout"))?
                    };
                    result.empty_set_layouts.push(empty);
                    set_layouts.push(empty);
                }
            }
        }

        let push_constant_ranges = if push_constant_size > 0 {
            vec![vk::PushConstantRange {
                stage_flags: push_constant_stages,
                offset: 0,
                size: push_constant_size,
            }]
        } else {
            Vec::new()
        };

        let layout_create_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(&set_layouts)
            .push_constant_ranges(&push_constant_ranges);

        result.layout = unsafe {
            result.ctx.device
                .create_pipeline_layout(&layout_create_info, None)
                .map_err(|e| vk_error(e, "Failed to create pipeline layout"))?
        };

        Ok(result)
    }
}

impl Drop for PipelineLayout {
    fn drop(&mut self) {
        unsafe {
            if self.layout != vk::PipelineLayout::null() {
                self.ctx.device.destroy_pipeline_layout(self.layout, None);
                self.layout = vk::PipelineLayout::null();
            }
            for set_layout in self.empty_set_layouts.drain(..) {
                self.ctx.device.destroy_descriptor_set_layout(set_layout, None);
            }
        }
    }
}
