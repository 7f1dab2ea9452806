/// VulkanMeshletDevice - Vulkan implementation of the MeshletDevice trait
///
/// Headless device: no surface or swapchain. Rendering goes through
/// dynamic rendering (Vulkan 1.3) and meshlet dispatch through
/// VK_NV_mesh_shader when the GPU exposes it.

use meshlet_hal::meshlet::{Result, Error, Config};
use meshlet_hal::meshlet::device::{
    BindingLayout as HalBindingLayout, BindingLayoutDesc, BindingSet as HalBindingSet,
    Buffer as HalBuffer, BufferDesc, Framebuffer as HalFramebuffer, FramebufferInfo,
    MeshletDevice, MeshletPipeline as HalMeshletPipeline, MeshletPipelineDesc,
    Shader as HalShader, ShaderDesc, Texture as HalTexture, TextureDesc,
};
use meshlet_hal::{hal_backend_err, hal_error, hal_info, hal_invalid, hal_warn};
use ash::vk;
use gpu_allocator::vulkan::{AllocationCreateDesc, AllocationScheme, Allocator, AllocatorCreateDesc};
use gpu_allocator::MemoryLocation;
use std::ffi::CStr;
use std::sync::Arc;

use crate::vulkan_binding::{create_descriptor_pool, BindingLayout, BindingSet, BindingSetItem};
use crate::vulkan_buffer::Buffer;
use crate::vulkan_command_list::{CommandEncoder, CommandList};
use crate::vulkan_context::GpuContext;
use crate::vulkan_convert::{format_aspect_mask, format_to_vk, sample_count_to_vk, vk_error};
use crate::vulkan_framebuffer::Framebuffer;
use crate::vulkan_meshlet_pipeline::MeshletPipeline;
use crate::vulkan_shader::Shader;
use crate::vulkan_texture::Texture;

const SOURCE: &str = "meshlet::vulkan";

/// Vulkan meshlet device
pub struct VulkanMeshletDevice {
    ctx: Arc<GpuContext>,
    physical_device: vk::PhysicalDevice,
}

/// Physical device chosen at init
struct AdapterSelection {
    physical_device: vk::PhysicalDevice,
    graphics_queue_family: u32,
    has_mesh_shader: bool,
}

impl VulkanMeshletDevice {
    /// Create a headless Vulkan device
    ///
    /// A GPU without VK_NV_mesh_shader still yields a device; meshlet
    /// pipeline creation then fails with `UnsupportedFeature`.
    pub fn new(config: Config) -> Result<Self> {
        unsafe {
            // Create Vulkan Entry
            let entry = ash::Entry::load().map_err(|e| {
                hal_backend_err!(
                    SOURCE,
                    vk::Result::ERROR_INITIALIZATION_FAILED.as_raw(),
                    "Failed to load Vulkan library: {:?}", e
                )
            })?;

            // Application Info
            let app_info = vk::ApplicationInfo::default()
                .application_name(c"Meshlet HAL Application")
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"Meshlet HAL")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let create_info = vk::InstanceCreateInfo::default().application_info(&app_info);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| vk_error(e, "Failed to create Vulkan instance"))?;

            let adapter = match Self::select_adapter(&instance) {
                Ok(adapter) => adapter,
                Err(e) => {
                    instance.destroy_instance(None);
                    return Err(e);
                }
            };

            // Create Logical Device
            let queue_priorities = [1.0];
            let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(adapter.graphics_queue_family)
                .queue_priorities(&queue_priorities)];

            let mut device_extension_names = Vec::new();
            if adapter.has_mesh_shader {
                device_extension_names.push(ash::nv::mesh_shader::NAME.as_ptr());
            }

            let mut vulkan13_features = vk::PhysicalDeviceVulkan13Features::default()
                .dynamic_rendering(true);
            let mut mesh_shader_features = vk::PhysicalDeviceMeshShaderFeaturesNV::default()
                .task_shader(true)
                .mesh_shader(true);

            let mut device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names)
                .push_next(&mut vulkan13_features);
            if adapter.has_mesh_shader {
                device_create_info = device_create_info.push_next(&mut mesh_shader_features);
            }

            let device = match instance.create_device(adapter.physical_device, &device_create_info, None) {
                Ok(device) => device,
                Err(e) => {
                    instance.destroy_instance(None);
                    return Err(vk_error(e, "Failed to create logical device"));
                }
            };

            let graphics_queue = device.get_device_queue(adapter.graphics_queue_family, 0);

            let mesh_shader = adapter
                .has_mesh_shader
                .then(|| ash::nv::mesh_shader::Device::new(&instance, &device));

            // Create GPU allocator
            let allocator = match Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device: adapter.physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            }) {
                Ok(allocator) => allocator,
                Err(e) => {
                    device.destroy_device(None);
                    instance.destroy_instance(None);
                    hal_error!(SOURCE, "Failed to create GPU allocator: {:?}", e);
                    return Err(Error::OutOfMemory);
                }
            };

            let pipeline_cache = match device.create_pipeline_cache(&vk::PipelineCacheCreateInfo::default(), None) {
                Ok(cache) => cache,
                Err(e) => {
                    drop(allocator);
                    device.destroy_device(None);
                    instance.destroy_instance(None);
                    return Err(vk_error(e, "Failed to create pipeline cache"));
                }
            };

            let descriptor_pool = match create_descriptor_pool(&device) {
                Ok(pool) => pool,
                Err(e) => {
                    device.destroy_pipeline_cache(pipeline_cache, None);
                    drop(allocator);
                    device.destroy_device(None);
                    instance.destroy_instance(None);
                    return Err(e);
                }
            };

            // GpuContext owns device and instance destruction from here on
            let ctx = Arc::new(GpuContext::new(
                entry,
                instance,
                device,
                mesh_shader,
                allocator,
                graphics_queue,
                adapter.graphics_queue_family,
                pipeline_cache,
                descriptor_pool,
                config,
            ));

            hal_info!(
                SOURCE,
                "Vulkan meshlet device ready (mesh shading: {})",
                ctx.supports_mesh_shading()
            );

            Ok(Self { ctx, physical_device: adapter.physical_device })
        }
    }

    /// First physical device with Vulkan 1.3 and a graphics queue
    unsafe fn select_adapter(instance: &ash::Instance) -> Result<AdapterSelection> {
        let physical_devices = instance
            .enumerate_physical_devices()
            .map_err(|e| vk_error(e, "Failed to enumerate physical devices"))?;

        for physical_device in physical_devices {
            let properties = instance.get_physical_device_properties(physical_device);
            if properties.api_version < vk::API_VERSION_1_3 {
                continue;
            }

            let queue_families = instance.get_physical_device_queue_family_properties(physical_device);
            let Some(graphics_queue_family) = queue_families
                .iter()
                .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
            else {
                continue;
            };

            let extensions = instance
                .enumerate_device_extension_properties(physical_device)
                .map_err(|e| vk_error(e, "Failed to enumerate device extensions"))?;
            let has_mesh_shader = extensions.iter().any(|ext| {
                ext.extension_name_as_c_str()
                    .map_or(false, |name| name == ash::nv::mesh_shader::NAME)
            });

            if !has_mesh_shader {
                let name = properties
                    .device_name_as_c_str()
                    .map(CStr::to_string_lossy)
                    .unwrap_or_default();
                hal_warn!(SOURCE, "GPU '{}' does not expose VK_NV_mesh_shader", name);
            }

            return Ok(AdapterSelection {
                physical_device,
                graphics_queue_family: graphics_queue_family as u32,
                has_mesh_shader,
            });
        }

        Err(hal_backend_err!(
            SOURCE,
            vk::Result::ERROR_INCOMPATIBLE_DRIVER.as_raw(),
            "No Vulkan 1.3 GPU with a graphics queue found"
        ))
    }

    /// Shared GPU context
    pub fn context(&self) -> &Arc<GpuContext> {
        &self.ctx
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Create a shader from SPIR-V bytes
    pub fn create_shader(&self, desc: ShaderDesc, spirv: &[u8]) -> Result<Arc<dyn HalShader>> {
        if spirv.is_empty() || spirv.len() % 4 != 0 {
            return Err(hal_invalid!(
                SOURCE,
                "Shader code must be a non-empty multiple of 4 bytes (got {})",
                spirv.len()
            ));
        }

        let code = ash::util::read_spv(&mut std::io::Cursor::new(spirv))
            .map_err(|e| hal_invalid!(SOURCE, "Invalid SPIR-V: {}", e))?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);
        let module = unsafe {
            self.ctx.device
                .create_shader_module(&create_info, None)
                .map_err(|e| vk_error(e, "Failed to create shader module"))?
        };

        Ok(Arc::new(Shader::new(self.ctx.clone(), module, desc, code)))
    }

    /// Create a host-visible, persistently mapped buffer
    pub fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn HalBuffer>> {
        if desc.size == 0 {
            return Err(hal_invalid!(SOURCE, "Buffer '{}' has zero size", desc.debug_name));
        }

        let mut usage = vk::BufferUsageFlags::UNIFORM_BUFFER | vk::BufferUsageFlags::TRANSFER_DST;
        if desc.can_have_uavs {
            usage |= vk::BufferUsageFlags::STORAGE_BUFFER;
        }
        if desc.is_indirect_args {
            usage |= vk::BufferUsageFlags::INDIRECT_BUFFER;
        }

        unsafe {
            let buffer_create_info = vk::BufferCreateInfo::default()
                .size(desc.size)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = self.ctx.device
                .create_buffer(&buffer_create_info, None)
                .map_err(|e| vk_error(e, "Failed to create buffer"))?;

            let requirements = self.ctx.device.get_buffer_memory_requirements(buffer);

            let allocation = self
                .ctx
                .allocator
                .lock()
                .map_err(|_| hal_invalid!(SOURCE, "GPU allocator lock poisoned"))
                .and_then(|mut allocator| {
                    allocator
                        .allocate(&AllocationCreateDesc {
                            name: &desc.debug_name,
                            requirements,
                            location: MemoryLocation::CpuToGpu,
                            linear: true,
                            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                        })
                        .map_err(|_| {
                            let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                            hal_error!(SOURCE, "Out of GPU memory for buffer (required: {:.2} MB)", size_mb);
                            Error::OutOfMemory
                        })
                });
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(e) => {
                    self.ctx.device.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };

            // Wrapping first lets Drop release both on a bind failure
            let result = Buffer::new(self.ctx.clone(), buffer, allocation, desc);
            if let Some(allocation) = &result.allocation {
                self.ctx.device
                    .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
                    .map_err(|e| vk_error(e, "Failed to bind buffer memory"))?;
            }

            Ok(Arc::new(result))
        }
    }

    /// Create a GPU-only texture usable as attachment and shader resource
    pub fn create_texture(&self, desc: TextureDesc) -> Result<Arc<dyn HalTexture>> {
        if desc.width == 0 || desc.height == 0 {
            return Err(hal_invalid!(SOURCE, "Texture '{}' has zero extent", desc.debug_name));
        }

        let format = format_to_vk(desc.format);
        if format == vk::Format::UNDEFINED {
            return Err(hal_invalid!(SOURCE, "Texture '{}' has no format", desc.debug_name));
        }
        let samples = sample_count_to_vk(desc.sample_count)?;

        let usage = if desc.format.is_depth_stencil() {
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT | vk::ImageUsageFlags::SAMPLED
        } else {
            vk::ImageUsageFlags::COLOR_ATTACHMENT
                | vk::ImageUsageFlags::SAMPLED
                | vk::ImageUsageFlags::TRANSFER_SRC
        };

        unsafe {
            let image_create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(format)
                .extent(vk::Extent3D { width: desc.width, height: desc.height, depth: 1 })
                .mip_levels(1)
                .array_layers(1)
                .samples(samples)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = self.ctx.device
                .create_image(&image_create_info, None)
                .map_err(|e| vk_error(e, "Failed to create image"))?;

            let requirements = self.ctx.device.get_image_memory_requirements(image);

            let allocation = self
                .ctx
                .allocator
                .lock()
                .map_err(|_| hal_invalid!(SOURCE, "GPU allocator lock poisoned"))
                .and_then(|mut allocator| {
                    allocator
                        .allocate(&AllocationCreateDesc {
                            name: &desc.debug_name,
                            requirements,
                            location: MemoryLocation::GpuOnly,
                            linear: false,
                            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                        })
                        .map_err(|_| {
                            let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                            hal_error!(SOURCE, "Out of GPU memory for texture (required: {:.2} MB)", size_mb);
                            Error::OutOfMemory
                        })
                });
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(e) => {
                    self.ctx.device.destroy_image(image, None);
                    return Err(e);
                }
            };

            if let Err(e) = self.ctx.device.bind_image_memory(image, allocation.memory(), allocation.offset()) {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
                self.ctx.device.destroy_image(image, None);
                return Err(vk_error(e, "Failed to bind image memory"));
            }

            let view_create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: format_aspect_mask(desc.format),
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            let view = match self.ctx.device.create_image_view(&view_create_info, None) {
                Ok(view) => view,
                Err(e) => {
                    if let Ok(mut allocator) = self.ctx.allocator.lock() {
                        allocator.free(allocation).ok();
                    }
                    self.ctx.device.destroy_image(image, None);
                    return Err(vk_error(e, "Failed to create image view"));
                }
            };

            Ok(Arc::new(Texture::new(self.ctx.clone(), image, view, allocation, desc)))
        }
    }

    /// Group textures into a framebuffer for dynamic rendering
    pub fn create_framebuffer(
        &self,
        color_attachments: Vec<Arc<dyn HalTexture>>,
        depth_attachment: Option<Arc<dyn HalTexture>>,
    ) -> Result<Arc<dyn HalFramebuffer>> {
        Ok(Arc::new(Framebuffer::new(color_attachments, depth_attachment)?))
    }

    pub fn create_binding_layout(&self, desc: BindingLayoutDesc) -> Result<Arc<dyn HalBindingLayout>> {
        Ok(Arc::new(BindingLayout::new(self.ctx.clone(), desc)?))
    }

    pub fn create_binding_set(
        &self,
        layout: Arc<dyn HalBindingLayout>,
        items: Vec<BindingSetItem>,
    ) -> Result<Arc<dyn HalBindingSet>> {
        Ok(Arc::new(BindingSet::new(&self.ctx, layout, items)?))
    }

    /// Create a command list (meshlet recorder over a fresh command buffer)
    pub fn create_command_list(&self) -> Result<CommandList> {
        let encoder = CommandEncoder::new(self.ctx.clone())?;
        Ok(CommandList::new(encoder, self.ctx.config.clone()))
    }

    /// Submit a finished command list, wait for completion, then release
    /// the resources it referenced
    pub fn submit_and_wait(&self, command_list: &mut CommandList) -> Result<()> {
        if command_list.is_recording() {
            return Err(hal_invalid!(SOURCE, "submit_and_wait: command list is still recording"));
        }

        unsafe {
            let fence = self.ctx.device
                .create_fence(&vk::FenceCreateInfo::default(), None)
                .map_err(|e| vk_error(e, "Failed to create submit fence"))?;

            let command_buffers = [command_list.encoder().command_buffer()];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

            let result = self.ctx.device
                .queue_submit(self.ctx.graphics_queue, &[submit_info], fence)
                .map_err(|e| vk_error(e, "Failed to submit command buffer"))
                .and_then(|_| {
                    self.ctx.device
                        .wait_for_fences(&[fence], true, u64::MAX)
                        .map_err(|e| vk_error(e, "Failed to wait for submit fence"))
                });

            self.ctx.device.destroy_fence(fence, None);
            result?;
        }

        command_list.encoder_mut().take_referenced_resources();
        Ok(())
    }

    /// Wait for the GPU to be idle
    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.ctx.device
                .device_wait_idle()
                .map_err(|e| vk_error(e, "Failed to wait for device idle"))
        }
    }
}

impl MeshletDevice for VulkanMeshletDevice {
    fn supports_mesh_shading(&self) -> bool {
        self.ctx.supports_mesh_shading()
    }

    fn create_meshlet_pipeline(
        &self,
        desc: MeshletPipelineDesc,
        framebuffer_info: &FramebufferInfo,
    ) -> Result<Arc<dyn HalMeshletPipeline>> {
        MeshletPipeline::create(self.ctx.clone(), desc, framebuffer_info)
    }
}

impl Drop for VulkanMeshletDevice {
    fn drop(&mut self) {
        // Outstanding objects keep the context alive; only wait here
        self.wait_idle().ok();
    }
}
