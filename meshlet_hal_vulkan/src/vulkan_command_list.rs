/// CommandList - Vulkan command encoder driven by the meshlet recorder
///
/// `CommandEncoder` owns one primary command buffer and turns each encoder
/// call into a single vkCmd* call. `CommandList` wraps it in the
/// state-caching `MeshletRecorder`.

use meshlet_hal::meshlet::Result;
use meshlet_hal::meshlet::command::{Barrier, CommandEncoder as HalCommandEncoder, MeshletRecorder};
use meshlet_hal::meshlet::device::{
    descriptor_set_runs, BindingSet as HalBindingSet, Color, Framebuffer as HalFramebuffer,
    MeshletPipeline as HalMeshletPipeline, NativeViewport, ResourceRef, ScissorRect,
    ShaderType, Texture as HalTexture, TrackedResource,
};
use meshlet_hal::{hal_invalid, hal_unsupported};
use ash::vk;
use std::sync::Arc;

use crate::vulkan_binding::BindingSet;
use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_convert::{
    format_aspect_mask, resource_states_to_access, resource_states_to_image_layout,
    vk_error,
};
use crate::vulkan_framebuffer::Framebuffer;
use crate::vulkan_meshlet_pipeline::MeshletPipeline;
use crate::vulkan_texture::Texture;

const SOURCE: &str = "meshlet::vulkan";

/// Recorder over a Vulkan command buffer
pub type CommandList = MeshletRecorder<CommandEncoder>;

/// Vulkan command encoder
pub struct CommandEncoder {
    ctx: Arc<GpuContext>,
    /// Command pool for allocating the command buffer
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
    is_recording: bool,
    in_render_pass: bool,
    /// Layout cached by the last meshlet state (for bindings and push constants)
    bound_pipeline_layout: vk::PipelineLayout,
    /// Push-constant range of the cached layout
    bound_push_constant_stages: vk::ShaderStageFlags,
    bound_push_constant_size: u32,
    /// Objects the command buffer uses, released by the caller after execution
    referenced: Vec<ResourceRef>,
}

impl CommandEncoder {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        unsafe {
            let command_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(ctx.graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let command_pool = ctx.device
                .create_command_pool(&command_pool_create_info, None)
                .map_err(|e| vk_error(e, "Failed to create command pool"))?;

            let command_buffer_allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffer = match ctx.device.allocate_command_buffers(&command_buffer_allocate_info) {
                Ok(buffers) => buffers.into_iter().next().unwrap_or_default(),
                Err(e) => {
                    ctx.device.destroy_command_pool(command_pool, None);
                    return Err(vk_error(e, "Failed to allocate command buffer"));
                }
            };

            Ok(Self {
                ctx,
                command_pool,
                command_buffer,
                is_recording: false,
                in_render_pass: false,
                bound_pipeline_layout: vk::PipelineLayout::null(),
                bound_push_constant_stages: vk::ShaderStageFlags::empty(),
                bound_push_constant_size: 0,
                referenced: Vec::new(),
            })
        }
    }

    /// Get the underlying Vulkan command buffer
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    /// Hand back every object referenced since the last call
    ///
    /// Call once the GPU has finished executing the command buffer.
    pub fn take_referenced_resources(&mut self) -> Vec<ResourceRef> {
        std::mem::take(&mut self.referenced)
    }

    fn vulkan_pipeline(pipeline: &Arc<dyn HalMeshletPipeline>) -> Result<&MeshletPipeline> {
        pipeline
            .as_any()
            .downcast_ref::<MeshletPipeline>()
            .ok_or_else(|| hal_invalid!(SOURCE, "Pipeline is not a Vulkan meshlet pipeline"))
    }

    fn image_view(texture: &Arc<dyn HalTexture>) -> Result<vk::ImageView> {
        texture
            .as_any()
            .downcast_ref::<Texture>()
            .map(|texture| texture.view)
            .ok_or_else(|| hal_invalid!(SOURCE, "Attachment '{}' is not a Vulkan texture", texture.desc().debug_name))
    }
}

impl HalCommandEncoder for CommandEncoder {
    fn begin(&mut self) -> Result<()> {
        if self.is_recording {
            return Err(hal_invalid!(SOURCE, "Command buffer is already recording"));
        }
        unsafe {
            self.ctx.device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| vk_error(e, "Failed to reset command buffer"))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            self.ctx.device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| vk_error(e, "Failed to begin command buffer"))?;
        }
        self.is_recording = true;
        self.in_render_pass = false;
        self.bound_pipeline_layout = vk::PipelineLayout::null();
        self.bound_push_constant_stages = vk::ShaderStageFlags::empty();
        self.bound_push_constant_size = 0;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        if !self.is_recording {
            return Err(hal_invalid!(SOURCE, "Command buffer is not recording"));
        }
        unsafe {
            self.ctx.device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| vk_error(e, "Failed to end command buffer"))?;
        }
        self.is_recording = false;
        Ok(())
    }

    fn bind_meshlet_pipeline(&mut self, pipeline: &Arc<dyn HalMeshletPipeline>) -> Result<()> {
        let vk_pipeline = Self::vulkan_pipeline(pipeline)?;
        unsafe {
            self.ctx.device.cmd_bind_pipeline(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.pipeline,
            );
        }
        Ok(())
    }

    fn begin_render_pass(&mut self, framebuffer: &Arc<dyn HalFramebuffer>) -> Result<()> {
        if framebuffer.as_any().downcast_ref::<Framebuffer>().is_none() {
            return Err(hal_invalid!(SOURCE, "Framebuffer is not a Vulkan framebuffer"));
        }

        let color_attachments: Vec<vk::RenderingAttachmentInfo> = framebuffer
            .color_attachments()
            .iter()
            .map(|texture| -> Result<vk::RenderingAttachmentInfo<'static>> {
                Ok(vk::RenderingAttachmentInfo::default()
                    .image_view(Self::image_view(texture)?)
                    .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                    .load_op(vk::AttachmentLoadOp::LOAD)
                    .store_op(vk::AttachmentStoreOp::STORE))
            })
            .collect::<Result<_>>()?;

        let depth_texture = framebuffer.depth_attachment();
        let depth_attachment = depth_texture
            .map(|texture| -> Result<vk::RenderingAttachmentInfo<'static>> {
                Ok(vk::RenderingAttachmentInfo::default()
                    .image_view(Self::image_view(texture)?)
                    .image_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                    .load_op(vk::AttachmentLoadOp::LOAD)
                    .store_op(vk::AttachmentStoreOp::STORE))
            })
            .transpose()?;

        let (width, height) = framebuffer.extent();
        let mut rendering_info = vk::RenderingInfo::default()
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D { width, height },
            })
            .layer_count(1)
            .color_attachments(&color_attachments);

        if let (Some(texture), Some(attachment)) = (depth_texture, depth_attachment.as_ref()) {
            let format = texture.desc().format;
            if format.has_depth_component() {
                rendering_info = rendering_info.depth_attachment(attachment);
            }
            if format.has_stencil_component() {
                rendering_info = rendering_info.stencil_attachment(attachment);
            }
        }

        unsafe {
            self.ctx.device.cmd_begin_rendering(self.command_buffer, &rendering_info);
        }
        self.in_render_pass = true;
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        if !self.in_render_pass {
            return Err(hal_invalid!(SOURCE, "No render pass is open"));
        }
        unsafe {
            self.ctx.device.cmd_end_rendering(self.command_buffer);
        }
        self.in_render_pass = false;
        Ok(())
    }

    fn pipeline_barriers(&mut self, barriers: &[Barrier]) -> Result<()> {
        if barriers.is_empty() {
            return Ok(());
        }

        let mut src_stages = vk::PipelineStageFlags::empty();
        let mut dst_stages = vk::PipelineStageFlags::empty();
        let mut buffer_barriers: Vec<vk::BufferMemoryBarrier> = Vec::new();
        let mut image_barriers: Vec<vk::ImageMemoryBarrier> = Vec::new();

        for barrier in barriers {
            let (src_stage, src_access) = resource_states_to_access(barrier.state_before);
            let (dst_stage, dst_access) = resource_states_to_access(barrier.state_after);
            src_stages |= src_stage;
            dst_stages |= dst_stage;

            match &barrier.resource {
                TrackedResource::Buffer(buffer) => {
                    let vk_buffer = buffer
                        .as_any()
                        .downcast_ref::<Buffer>()
                        .ok_or_else(|| hal_invalid!(SOURCE, "Barrier on a non-Vulkan buffer"))?;
                    buffer_barriers.push(
                        vk::BufferMemoryBarrier::default()
                            .src_access_mask(src_access)
                            .dst_access_mask(dst_access)
                            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                            .buffer(vk_buffer.buffer)
                            .offset(0)
                            .size(vk::WHOLE_SIZE),
                    );
                }
                TrackedResource::Texture(texture) => {
                    let vk_texture = texture
                        .as_any()
                        .downcast_ref::<Texture>()
                        .ok_or_else(|| hal_invalid!(SOURCE, "Barrier on a non-Vulkan texture"))?;
                    image_barriers.push(
                        vk::ImageMemoryBarrier::default()
                            .src_access_mask(src_access)
                            .dst_access_mask(dst_access)
                            .old_layout(resource_states_to_image_layout(barrier.state_before))
                            .new_layout(resource_states_to_image_layout(barrier.state_after))
                            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                            .image(vk_texture.image)
                            .subresource_range(vk::ImageSubresourceRange {
                                aspect_mask: format_aspect_mask(texture.desc().format),
                                base_mip_level: 0,
                                level_count: 1,
                                base_array_layer: 0,
                                layer_count: 1,
                            }),
                    );
                }
            }
        }

        unsafe {
            self.ctx.device.cmd_pipeline_barrier(
                self.command_buffer,
                src_stages,
                dst_stages,
                vk::DependencyFlags::empty(),
                &[],
                &buffer_barriers,
                &image_barriers,
            );
        }
        Ok(())
    }

    fn cache_pipeline_layout(&mut self, pipeline: &Arc<dyn HalMeshletPipeline>) -> Result<()> {
        let pipeline = Self::vulkan_pipeline(pipeline)?;
        self.bound_pipeline_layout = pipeline.vk_layout();
        (self.bound_push_constant_stages, self.bound_push_constant_size) = pipeline.push_constant_range();
        Ok(())
    }

    fn bind_binding_sets(
        &mut self,
        pipeline: &Arc<dyn HalMeshletPipeline>,
        bindings: &[Arc<dyn HalBindingSet>],
    ) -> Result<()> {
        let vk_layout = Self::vulkan_pipeline(pipeline)?.vk_layout();
        let mapping = pipeline.descriptor_set_mapping();

        for run in descriptor_set_runs(mapping) {
            let mut descriptor_sets = Vec::with_capacity(run.len());
            for set in run.clone() {
                let layout_index = mapping[set as usize].unwrap_or_default();
                let binding = bindings.get(layout_index).ok_or_else(|| hal_invalid!(
                    SOURCE,
                    "Descriptor set {} needs binding set {} but only {} were given",
                    set, layout_index, bindings.len()
                ))?;
                let vk_set = binding
                    .as_any()
                    .downcast_ref::<BindingSet>()
                    .ok_or_else(|| hal_invalid!(SOURCE, "Binding set {} is not a Vulkan binding set", layout_index))?;
                descriptor_sets.push(vk_set.descriptor_set);
            }

            unsafe {
                self.ctx.device.cmd_bind_descriptor_sets(
                    self.command_buffer,
                    vk::PipelineBindPoint::GRAPHICS,
                    vk_layout,
                    run.start,
                    &descriptor_sets,
                    &[],
                );
            }
        }
        Ok(())
    }

    fn set_viewports(&mut self, viewports: &[NativeViewport]) -> Result<()> {
        let vk_viewports: Vec<vk::Viewport> = viewports
            .iter()
            .map(|vp| vk::Viewport {
                x: vp.x,
                y: vp.y,
                width: vp.width,
                height: vp.height,
                min_depth: vp.min_depth,
                max_depth: vp.max_depth,
            })
            .collect();
        unsafe {
            self.ctx.device.cmd_set_viewport(self.command_buffer, 0, &vk_viewports);
        }
        Ok(())
    }

    fn set_scissors(&mut self, scissors: &[ScissorRect]) -> Result<()> {
        let vk_scissors: Vec<vk::Rect2D> = scissors
            .iter()
            .map(|rect| vk::Rect2D {
                offset: vk::Offset2D { x: rect.x, y: rect.y },
                extent: vk::Extent2D { width: rect.width, height: rect.height },
            })
            .collect();
        unsafe {
            self.ctx.device.cmd_set_scissor(self.command_buffer, 0, &vk_scissors);
        }
        Ok(())
    }

    fn set_stencil_reference(&mut self, reference: u8) -> Result<()> {
        unsafe {
            self.ctx.device.cmd_set_stencil_reference(
                self.command_buffer,
                vk::StencilFaceFlags::FRONT_AND_BACK,
                reference as u32,
            );
        }
        Ok(())
    }

    fn set_blend_constants(&mut self, color: Color) -> Result<()> {
        unsafe {
            self.ctx.device.cmd_set_blend_constants(self.command_buffer, &color.to_array());
        }
        Ok(())
    }

    fn push_constants(&mut self, _visibility: ShaderType, data: &[u8]) -> Result<()> {
        if self.bound_pipeline_layout == vk::PipelineLayout::null() {
            return Err(hal_invalid!(SOURCE, "push_constants: no pipeline layout cached"));
        }
        let stages = push_constant_stages(self.bound_push_constant_stages, self.bound_push_constant_size, data.len())?;
        unsafe {
            self.ctx.device.cmd_push_constants(
                self.command_buffer,
                self.bound_pipeline_layout,
                stages,
                0,
                data,
            );
        }
        Ok(())
    }

    fn draw_mesh_tasks(&mut self, task_count: u32, first_task: u32) -> Result<()> {
        let mesh_shader = self
            .ctx
            .mesh_shader
            .as_ref()
            .ok_or_else(|| hal_unsupported!(SOURCE, "draw_mesh_tasks requires VK_NV_mesh_shader"))?;
        unsafe {
            mesh_shader.cmd_draw_mesh_tasks(self.command_buffer, task_count, first_task);
        }
        Ok(())
    }

    fn reference_resource(&mut self, resource: ResourceRef) {
        self.referenced.push(resource);
    }
}

impl Drop for CommandEncoder {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.free_command_buffers(self.command_pool, &[self.command_buffer]);
            self.ctx.device.destroy_command_pool(self.command_pool, None);
        }
    }
}

/// Stage flags for a push of `len` bytes into a layout's push-constant range
fn push_constant_stages(stages: vk::ShaderStageFlags, size: u32, len: usize) -> Result<vk::ShaderStageFlags> {
    if stages.is_empty() || size == 0 {
        return Err(hal_invalid!(SOURCE, "push_constants: pipeline layout has no push-constant range"));
    }
    if len > size as usize {
        return Err(hal_invalid!(
            SOURCE,
            "push_constants: {} bytes exceed the {}-byte push-constant range",
            len, size
        ));
    }
    Ok(stages)
}
