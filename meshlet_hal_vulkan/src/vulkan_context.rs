/// GpuContext - Shared GPU state for all Vulkan meshlet objects
///
/// Every buffer, texture, binding set and pipeline keeps an `Arc<GpuContext>`,
/// so the device outlives all of them and is destroyed when the last one goes.

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use meshlet_hal::meshlet::Config;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// NV mesh shader entry points (None when the extension is missing)
    pub mesh_shader: Option<ash::nv::mesh_shader::Device>,

    /// GPU memory allocator (shared, requires mutex for thread safety)
    /// Wrapped in ManuallyDrop so it's dropped BEFORE the device is destroyed
    pub allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,

    /// Graphics queue for command submission
    pub graphics_queue: vk::Queue,

    /// Graphics queue family index
    pub graphics_queue_family: u32,

    /// Pipeline cache passed to every pipeline creation
    pub pipeline_cache: vk::PipelineCache,

    /// Descriptor pools for binding sets (a new one is pushed when the last is exhausted)
    pub descriptor_pools: Mutex<Vec<vk::DescriptorPool>>,

    pub config: Config,

    instance: ash::Instance,

    // Keeps the Vulkan loader alive as long as the instance
    _entry: ash::Entry,
}

impl GpuContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        entry: ash::Entry,
        instance: ash::Instance,
        device: ash::Device,
        mesh_shader: Option<ash::nv::mesh_shader::Device>,
        allocator: Allocator,
        graphics_queue: vk::Queue,
        graphics_queue_family: u32,
        pipeline_cache: vk::PipelineCache,
        descriptor_pool: vk::DescriptorPool,
        config: Config,
    ) -> Self {
        Self {
            device,
            mesh_shader,
            allocator: ManuallyDrop::new(Arc::new(Mutex::new(allocator))),
            graphics_queue,
            graphics_queue_family,
            pipeline_cache,
            descriptor_pools: Mutex::new(vec![descriptor_pool]),
            config,
            instance,
            _entry: entry,
        }
    }

    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    /// True when VK_NV_mesh_shader was enabled on the device
    pub fn supports_mesh_shading(&self) -> bool {
        self.mesh_shader.is_some()
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            // 1. Wait for GPU to finish all work
            self.device.device_wait_idle().ok();

            // 2. Destroy device-level objects
            if let Ok(pools) = self.descriptor_pools.lock() {
                for pool in pools.iter() {
                    self.device.destroy_descriptor_pool(*pool, None);
                }
            }
            self.device.destroy_pipeline_cache(self.pipeline_cache, None);

            // 3. Drop allocator (must happen before device destruction)
            ManuallyDrop::drop(&mut self.allocator);

            // 4. Destroy device
            self.device.destroy_device(None);

            // 5. Destroy instance
            self.instance.destroy_instance(None);
        }
    }
}
