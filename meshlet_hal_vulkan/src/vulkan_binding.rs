/// Binding layouts and binding sets - descriptor set layouts and descriptor sets

use meshlet_hal::meshlet::{Result, Error};
use meshlet_hal::meshlet::device::{
    BindingLayout as HalBindingLayout, BindingLayoutDesc, BindingSet as HalBindingSet,
    BindingType, ResourceStates, ResourceUsage, TrackedResource,
};
use meshlet_hal::{hal_info, hal_invalid, hal_unsupported};
use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_convert::{binding_type_to_vk, shader_stages_to_vk, vk_error};
use crate::vulkan_texture::Texture;

const SOURCE: &str = "meshlet::vulkan";

/// Create a descriptor pool with fixed capacity (1024 sets).
/// Called during init and when the current pool is exhausted.
pub(crate) fn create_descriptor_pool(device: &ash::Device) -> Result<vk::DescriptorPool> {
    let pool_sizes = [
        vk::DescriptorPoolSize { ty: vk::DescriptorType::UNIFORM_BUFFER, descriptor_count: 1024 },
        vk::DescriptorPoolSize { ty: vk::DescriptorType::STORAGE_BUFFER, descriptor_count: 1024 },
        vk::DescriptorPoolSize { ty: vk::DescriptorType::SAMPLED_IMAGE, descriptor_count: 1024 },
        vk::DescriptorPoolSize { ty: vk::DescriptorType::STORAGE_IMAGE, descriptor_count: 256 },
    ];
    let info = vk::DescriptorPoolCreateInfo::default()
        .pool_sizes(&pool_sizes)
        .max_sets(1024);

    unsafe {
        device
            .create_descriptor_pool(&info, None)
            .map_err(|e| vk_error(e, "Failed to create descriptor pool"))
    }
}

/// Resource state a binding slot of `binding_type` requires
pub fn binding_required_state(binding_type: BindingType) -> ResourceStates {
    match binding_type {
        BindingType::ConstantBuffer | BindingType::VolatileConstantBuffer => ResourceStates::CONSTANT_BUFFER,
        BindingType::StructuredBuffer | BindingType::Texture => ResourceStates::SHADER_RESOURCE,
        BindingType::StorageBuffer | BindingType::StorageTexture => ResourceStates::UNORDERED_ACCESS,
        BindingType::Sampler => ResourceStates::UNKNOWN,
    }
}

// ===== BINDING LAYOUT =====

/// Vulkan binding layout (one VkDescriptorSetLayout)
pub struct BindingLayout {
    ctx: Arc<GpuContext>,
    pub(crate) set_layout: vk::DescriptorSetLayout,
    desc: BindingLayoutDesc,
}

impl BindingLayout {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: BindingLayoutDesc) -> Result<Self> {
        let stage_flags = shader_stages_to_vk(desc.visibility);
        let bindings: Vec<vk::DescriptorSetLayoutBinding> = desc
            .items
            .iter()
            .map(|item| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(item.slot)
                    .descriptor_type(binding_type_to_vk(item.binding_type))
                    .descriptor_count(item.count.max(1))
                    .stage_flags(stage_flags)
            })
            .collect();

        let info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
        let set_layout = unsafe {
            ctx.device
                .create_descriptor_set_layout(&info, None)
                .map_err(|e| vk_error(e, "Failed to create descriptor set layout"))?
        };

        Ok(Self { ctx, set_layout, desc })
    }
}

impl HalBindingLayout for BindingLayout {
    fn desc(&self) -> &BindingLayoutDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for BindingLayout {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_descriptor_set_layout(self.set_layout, None);
        }
    }
}

// ===== BINDING SET =====

/// Resource written into one slot of a binding set
#[derive(Debug, Clone)]
pub struct BindingSetItem {
    pub slot: u32,
    pub resource: TrackedResource,
}

/// Vulkan binding set (one VkDescriptorSet)
///
/// The descriptor set is freed when its pool is destroyed.
/// Immutable after creation.
pub struct BindingSet {
    pub(crate) descriptor_set: vk::DescriptorSet,
    layout: Arc<dyn HalBindingLayout>,
    usages: Vec<ResourceUsage>,
}

impl BindingSet {
    pub(crate) fn new(
        ctx: &Arc<GpuContext>,
        layout: Arc<dyn HalBindingLayout>,
        items: Vec<BindingSetItem>,
    ) -> Result<Self> {
        let vk_layout = layout
            .as_any()
            .downcast_ref::<BindingLayout>()
            .ok_or_else(|| hal_invalid!(SOURCE, "Binding layout is not a Vulkan binding layout"))?;

        // Validate every item against the layout before touching the pool
        let mut usages = Vec::with_capacity(items.len());
        let mut typed_items = Vec::with_capacity(items.len());
        for item in &items {
            let layout_item = layout
                .desc()
                .items
                .iter()
                .find(|layout_item| layout_item.slot == item.slot)
                .ok_or_else(|| hal_invalid!(SOURCE, "Binding slot {} is not declared by the layout", item.slot))?;

            let is_buffer_slot = matches!(
                layout_item.binding_type,
                BindingType::ConstantBuffer
                    | BindingType::VolatileConstantBuffer
                    | BindingType::StructuredBuffer
                    | BindingType::StorageBuffer
            );
            match (&item.resource, layout_item.binding_type) {
                (_, BindingType::Sampler) => {
                    return Err(hal_unsupported!(SOURCE, "Sampler bindings are not supported (slot {})", item.slot));
                }
                (TrackedResource::Buffer(_), _) if is_buffer_slot => {}
                (TrackedResource::Texture(_), _) if !is_buffer_slot => {}
                _ => {
                    return Err(hal_invalid!(
                        SOURCE,
                        "Resource kind does not match binding type {:?} at slot {}",
                        layout_item.binding_type, item.slot
                    ));
                }
            }

            usages.push(ResourceUsage {
                resource: item.resource.clone(),
                state: binding_required_state(layout_item.binding_type),
            });
            typed_items.push((item, layout_item.binding_type));
        }

        let descriptor_set = allocate_descriptor_set(ctx, vk_layout.set_layout)?;

        // Infos are collected first so the writes can borrow them
        let mut buffer_infos: Vec<vk::DescriptorBufferInfo> = Vec::new();
        let mut image_infos: Vec<vk::DescriptorImageInfo> = Vec::new();
        for (item, binding_type) in &typed_items {
            match &item.resource {
                TrackedResource::Buffer(buffer) => {
                    let vk_buffer = buffer
                        .as_any()
                        .downcast_ref::<Buffer>()
                        .ok_or_else(|| hal_invalid!(SOURCE, "Buffer at slot {} is not a Vulkan buffer", item.slot))?;
                    buffer_infos.push(
                        vk::DescriptorBufferInfo::default()
                            .buffer(vk_buffer.buffer)
                            .offset(0)
                            .range(vk::WHOLE_SIZE),
                    );
                }
                TrackedResource::Texture(texture) => {
                    let vk_texture = texture
                        .as_any()
                        .downcast_ref::<Texture>()
                        .ok_or_else(|| hal_invalid!(SOURCE, "Texture at slot {} is not a Vulkan texture", item.slot))?;
                    let image_layout = if *binding_type == BindingType::StorageTexture {
                        vk::ImageLayout::GENERAL
                    } else {
                        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
                    };
                    image_infos.push(
                        vk::DescriptorImageInfo::default()
                            .image_view(vk_texture.view)
                            .image_layout(image_layout),
                    );
                }
            }
        }

        let mut writes: Vec<vk::WriteDescriptorSet> = Vec::with_capacity(typed_items.len());
        let mut buffer_idx = 0usize;
        let mut image_idx = 0usize;
        for (item, binding_type) in &typed_items {
            let write = vk::WriteDescriptorSet::default()
                .dst_set(descriptor_set)
                .dst_binding(item.slot)
                .dst_array_element(0)
                .descriptor_type(binding_type_to_vk(*binding_type));
            let write = match item.resource {
                TrackedResource::Buffer(_) => {
                    buffer_idx += 1;
                    write.buffer_info(std::slice::from_ref(&buffer_infos[buffer_idx - 1]))
                }
                TrackedResource::Texture(_) => {
                    image_idx += 1;
                    write.image_info(std::slice::from_ref(&image_infos[image_idx - 1]))
                }
            };
            writes.push(write);
        }

        unsafe {
            ctx.device.update_descriptor_sets(&writes, &[]);
        }

        Ok(Self { descriptor_set, layout, usages })
    }
}

/// Allocate from the last pool, growing the pool list when it is exhausted
fn allocate_descriptor_set(ctx: &GpuContext, set_layout: vk::DescriptorSetLayout) -> Result<vk::DescriptorSet> {
    let layouts = [set_layout];
    let mut pools = ctx
        .descriptor_pools
        .lock()
        .map_err(|_| hal_invalid!(SOURCE, "Descriptor pool lock poisoned"))?;
    let current_pool = *pools
        .last()
        .ok_or_else(|| hal_invalid!(SOURCE, "No descriptor pool available"))?;

    let allocate_info = vk::DescriptorSetAllocateInfo::default()
        .descriptor_pool(current_pool)
        .set_layouts(&layouts);

    let sets = unsafe {
        match ctx.device.allocate_descriptor_sets(&allocate_info) {
            Ok(sets) => sets,
            Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY) => {
                let new_pool = create_descriptor_pool(&ctx.device)?;
                pools.push(new_pool);
                hal_info!(SOURCE, "Descriptor pool exhausted, created new pool (total: {})", pools.len());
                let retry_info = vk::DescriptorSetAllocateInfo::default()
                    .descriptor_pool(new_pool)
                    .set_layouts(&layouts);
                ctx.device
                    .allocate_descriptor_sets(&retry_info)
                    .map_err(|e| vk_error(e, "Failed to allocate descriptor set after pool growth"))?
            }
            Err(e) => return Err(vk_error(e, "Failed to allocate descriptor set")),
        }
    };

    sets.into_iter().next().ok_or(Error::OutOfMemory)
}

impl HalBindingSet for BindingSet {
    fn layout(&self) -> &Arc<dyn HalBindingLayout> {
        &self.layout
    }

    fn resource_usages(&self) -> &[ResourceUsage] {
        &self.usages
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_required_state() {
        assert_eq!(binding_required_state(BindingType::ConstantBuffer), ResourceStates::CONSTANT_BUFFER);
        assert_eq!(binding_required_state(BindingType::VolatileConstantBuffer), ResourceStates::CONSTANT_BUFFER);
        assert_eq!(binding_required_state(BindingType::StructuredBuffer), ResourceStates::SHADER_RESOURCE);
        assert_eq!(binding_required_state(BindingType::StorageTexture), ResourceStates::UNORDERED_ACCESS);
        assert_eq!(binding_required_state(BindingType::Sampler), ResourceStates::UNKNOWN);
    }
}
