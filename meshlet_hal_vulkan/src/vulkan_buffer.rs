/// Buffer - Vulkan implementation of the Buffer trait

use meshlet_hal::meshlet::{Result, Error};
use meshlet_hal::meshlet::device::{Buffer as HalBuffer, BufferDesc, ResourceId, ResourceStateCell};
use meshlet_hal::{hal_error, hal_invalid};
use ash::vk;
use gpu_allocator::vulkan::Allocation;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan buffer implementation (host-visible, persistently mapped)
pub struct Buffer {
    /// Shared GPU context (device, allocator, queue)
    ctx: Arc<GpuContext>,
    /// Vulkan buffer
    pub(crate) buffer: vk::Buffer,
    /// GPU memory allocation
    pub(crate) allocation: Option<Allocation>,
    desc: BufferDesc,
    id: ResourceId,
    /// State left by the last ended command list
    state: ResourceStateCell,
}

impl Buffer {
    pub(crate) fn new(ctx: Arc<GpuContext>, buffer: vk::Buffer, allocation: Allocation, desc: BufferDesc) -> Self {
        Self {
            ctx,
            buffer,
            allocation: Some(allocation),
            desc,
            id: ResourceId::next(),
            state: ResourceStateCell::new(),
        }
    }
}

impl HalBuffer for Buffer {
    fn desc(&self) -> &BufferDesc {
        &self.desc
    }

    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn committed_state(&self) -> &ResourceStateCell {
        &self.state
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let end = offset.checked_add(data.len() as u64);
        if end.map_or(true, |end| end > self.desc.size) {
            return Err(hal_invalid!(
                "meshlet::vulkan",
                "Write of {} bytes at offset {} overflows buffer '{}' ({} bytes)",
                data.len(), offset, self.desc.debug_name, self.desc.size
            ));
        }

        let Some(allocation) = &self.allocation else {
            hal_error!("meshlet::vulkan", "Buffer update failed: no GPU allocation");
            return Err(Error::OutOfMemory);
        };

        let mapped_ptr = allocation
            .mapped_ptr()
            .ok_or_else(|| hal_invalid!("meshlet::vulkan", "Buffer '{}' is not CPU-accessible", self.desc.debug_name))?
            .as_ptr() as *mut u8;

        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped_ptr.add(offset as usize), data.len());
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            // Free GPU memory
            if let Some(allocation) = self.allocation.take() {
                // Don't panic if lock fails - we still need to destroy the buffer
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
