/// MeshletPipeline - Vulkan implementation of the MeshletPipeline trait
///
/// Built on VK_NV_mesh_shader with dynamic rendering: the pipeline is
/// created against attachment formats, not a render pass.

use meshlet_hal::meshlet::Result;
use meshlet_hal::meshlet::device::{
    descriptor_set_mapping, BlendState, FramebufferInfo, MeshletPipeline as HalMeshletPipeline,
    MeshletPipelineDesc, Shader as HalShader, ShaderType, SpecializationCounts,
    SpecializationStorage,
};
use meshlet_hal::{hal_debug, hal_invalid, hal_unsupported};
use ash::vk;
use std::any::Any;
use std::ffi::CString;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_convert::{
    depth_stencil_to_vk, dynamic_state_to_vk, format_to_vk, raster_state_to_vk,
    sample_count_to_vk, shader_stages_to_vk, target_blend_to_vk, topology_to_vk, vk_error,
};
use crate::vulkan_pipeline_layout::PipelineLayout;
use crate::vulkan_shader::Shader;

const SOURCE: &str = "meshlet::vulkan";

/// Vulkan meshlet pipeline
pub struct MeshletPipeline {
    ctx: Arc<GpuContext>,
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) layout: Option<PipelineLayout>,
    desc: MeshletPipelineDesc,
    framebuffer_info: FramebufferInfo,
    shader_mask: ShaderType,
    uses_blend_constants: bool,
    descriptor_set_mapping: Vec<Option<usize>>,
}

impl MeshletPipeline {
    /// Build a meshlet pipeline for the attachment formats of `framebuffer_info`
    pub(crate) fn create(
        ctx: Arc<GpuContext>,
        desc: MeshletPipelineDesc,
        framebuffer_info: &FramebufferInfo,
    ) -> Result<Arc<dyn HalMeshletPipeline>> {
        if !ctx.supports_mesh_shading() {
            return Err(hal_unsupported!(SOURCE, "Meshlet pipelines require VK_NV_mesh_shader"));
        }
        desc.validate()?;
        framebuffer_info.validate()?;

        // Resolve modules up front so nothing is created for a foreign shader
        let stages: Vec<(ShaderType, Arc<dyn HalShader>)> = desc
            .stages()
            .into_iter()
            .map(|(stage, shader)| (stage, shader.clone()))
            .collect();
        let mut modules = Vec::with_capacity(stages.len());
        let mut entry_points = Vec::with_capacity(stages.len());
        for (stage, shader) in &stages {
            let vk_shader = shader
                .as_any()
                .downcast_ref::<Shader>()
                .ok_or_else(|| hal_invalid!(SOURCE, "{:?} shader is not a Vulkan shader", stage))?;
            modules.push(vk_shader.module);
            entry_points.push(
                CString::new(shader.desc().entry_point.as_str())
                    .map_err(|_| hal_invalid!(SOURCE, "Entry point of {:?} shader contains a NUL byte", stage))?,
            );
        }

        let descriptor_set_mapping = descriptor_set_mapping(&desc.binding_layouts)?;
        let layout = PipelineLayout::new(ctx.clone(), &desc.binding_layouts, &descriptor_set_mapping)?;
        let vk_layout = layout.layout;

        // The object owns the layout from here on, so an early return drops it
        let mut pipeline = Self {
            ctx,
            pipeline: vk::Pipeline::null(),
            layout: Some(layout),
            uses_blend_constants: desc.uses_blend_constants(framebuffer_info),
            shader_mask: desc.shader_mask(),
            framebuffer_info: framebuffer_info.clone(),
            descriptor_set_mapping,
            desc,
        };

        // ===== SPECIALIZATION (two passes) =====
        let shaders: Vec<&Arc<dyn HalShader>> = stages.iter().map(|(_, shader)| shader).collect();
        let (storage, stage_specializations) = fill_specializations(&shaders)?;

        let vk_entries: Vec<Vec<vk::SpecializationMapEntry>> = (0..storage.stage_count())
            .filter_map(|index| storage.stage(index))
            .map(|stage| {
                storage
                    .entries(stage)
                    .iter()
                    .map(|entry| vk::SpecializationMapEntry {
                        constant_id: entry.constant_id,
                        offset: entry.offset,
                        size: entry.size as usize,
                    })
                    .collect()
            })
            .collect();
        let spec_infos: Vec<vk::SpecializationInfo> = (0..storage.stage_count())
            .filter_map(|index| storage.stage(index))
            .zip(vk_entries.iter())
            .map(|(stage, entries)| {
                vk::SpecializationInfo::default()
                    .map_entries(entries)
                    .data(bytemuck::cast_slice(storage.data(stage)))
            })
            .collect();

        // ===== SHADER STAGES =====
        let shader_stages: Vec<vk::PipelineShaderStageCreateInfo> = stages
            .iter()
            .enumerate()
            .map(|(i, (stage, _))| {
                let info = vk::PipelineShaderStageCreateInfo::default()
                    .stage(shader_stages_to_vk(*stage))
                    .module(modules[i])
                    .name(&entry_points[i]);
                match stage_specializations[i] {
                    Some(spec_index) => info.specialization_info(&spec_infos[spec_index]),
                    None => info,
                }
            })
            .collect();

        // ===== FIXED FUNCTION =====
        let render_state = &pipeline.desc.render_state;
        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(topology_to_vk(pipeline.desc.topology))
            .primitive_restart_enable(false);

        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization_state = raster_state_to_vk(&render_state.raster);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(sample_count_to_vk(framebuffer_info.sample_count)?)
            .sample_shading_enable(false)
            .alpha_to_coverage_enable(render_state.blend.alpha_to_coverage_enable);

        let depth_stencil_state = depth_stencil_to_vk(&render_state.depth_stencil);

        let color_blend_attachments =
            color_blend_attachments(&render_state.blend, framebuffer_info.color_formats.len());
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let dynamic_states: Vec<vk::DynamicState> = pipeline
            .desc
            .dynamic_states(framebuffer_info)
            .into_iter()
            .map(dynamic_state_to_vk)
            .collect();
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        // ===== DYNAMIC RENDERING FORMATS =====
        let formats = RenderingFormats::from_info(framebuffer_info);
        let mut rendering_info = vk::PipelineRenderingCreateInfo::default()
            .color_attachment_formats(&formats.color)
            .depth_attachment_format(formats.depth)
            .stencil_attachment_format(formats.stencil);

        let pipeline_create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .depth_stencil_state(&depth_stencil_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(vk_layout)
            .push_next(&mut rendering_info);

        let created = unsafe {
            pipeline.ctx.device.create_graphics_pipelines(
                pipeline.ctx.pipeline_cache,
                std::slice::from_ref(&pipeline_create_info),
                None,
            )
        };

        match created {
            Ok(handles) => {
                pipeline.pipeline = handles.into_iter().next().unwrap_or_default();
            }
            Err((_, e)) => {
                assert!(
                    !pipeline.ctx.config.assert_on_backend_failure,
                    "vkCreateGraphicsPipelines failed for meshlet pipeline: {:?}",
                    e
                );
                return Err(vk_error(e, "Failed to create meshlet pipeline"));
            }
        }

        hal_debug!(
            SOURCE,
            "Created meshlet pipeline: stages {:?}, {} color targets, {} specialized stages",
            pipeline.shader_mask,
            framebuffer_info.color_formats.len(),
            storage.stage_count()
        );

        Ok(Arc::new(pipeline))
    }

    pub(crate) fn vk_layout(&self) -> vk::PipelineLayout {
        self.layout.as_ref().map_or(vk::PipelineLayout::null(), |layout| layout.layout)
    }

    /// Stage flags and size of the layout's push-constant range
    pub(crate) fn push_constant_range(&self) -> (vk::ShaderStageFlags, u32) {
        self.layout.as_ref().map_or((vk::ShaderStageFlags::empty(), 0), |layout| {
            (layout.push_constant_stages, layout.push_constant_size)
        })
    }
}

/// Two-pass specialization fill over the present stages
///
/// Returns the filled storage and, per stage, the index of its
/// specialization record (`None` for stages without constants).
pub fn fill_specializations(
    shaders: &[&Arc<dyn HalShader>],
) -> Result<(SpecializationStorage, Vec<Option<usize>>)> {
    let counts = SpecializationCounts::count(shaders.iter().copied());
    let mut storage = SpecializationStorage::with_counts(counts);
    let mut stage_specializations = Vec::with_capacity(counts.stages);
    for shader in shaders {
        stage_specializations.push(storage.push_stage(&shader.desc().specialization_constants)?);
    }
    Ok((storage, stage_specializations))
}

/// One blend attachment per color target
pub fn color_blend_attachments(
    blend: &BlendState,
    num_targets: usize,
) -> Vec<vk::PipelineColorBlendAttachmentState> {
    blend.targets[..num_targets.min(blend.targets.len())]
        .iter()
        .map(target_blend_to_vk)
        .collect()
}

/// Attachment formats for VkPipelineRenderingCreateInfo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderingFormats {
    pub color: Vec<vk::Format>,
    /// UNDEFINED unless the depth format has a depth component
    pub depth: vk::Format,
    /// UNDEFINED unless the depth format has a stencil component
    pub stencil: vk::Format,
}

impl RenderingFormats {
    pub fn from_info(info: &FramebufferInfo) -> Self {
        let depth_format = format_to_vk(info.depth_format);
        Self {
            color: info.color_formats.iter().map(|format| format_to_vk(*format)).collect(),
            depth: if info.depth_format.has_depth_component() { depth_format } else { vk::Format::UNDEFINED },
            stencil: if info.depth_format.has_stencil_component() { depth_format } else { vk::Format::UNDEFINED },
        }
    }
}

impl HalMeshletPipeline for MeshletPipeline {
    fn desc(&self) -> &MeshletPipelineDesc {
        &self.desc
    }

    fn framebuffer_info(&self) -> &FramebufferInfo {
        &self.framebuffer_info
    }

    fn shader_mask(&self) -> ShaderType {
        self.shader_mask
    }

    fn uses_blend_constants(&self) -> bool {
        self.uses_blend_constants
    }

    fn descriptor_set_mapping(&self) -> &[Option<usize>] {
        &self.descriptor_set_mapping
    }

    fn push_constant_visibility(&self) -> ShaderType {
        self.layout
            .as_ref()
            .map_or(ShaderType::empty(), |layout| layout.push_constant_visibility)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MeshletPipeline {
    fn drop(&mut self) {
        unsafe {
            // Pipeline first, then its layout
            if self.pipeline != vk::Pipeline::null() {
                self.ctx.device.destroy_pipeline(self.pipeline, None);
                self.pipeline = vk::Pipeline::null();
            }
        }
        self.layout.take();
    }
}

#[cfg(test)]
#[path = "vulkan_meshlet_pipeline_tests.rs"]
mod tests;
