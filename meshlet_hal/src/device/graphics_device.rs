/// Device trait: factory for meshlet pipelines

use std::sync::Arc;
use crate::error::Result;
use crate::device::{Framebuffer, FramebufferInfo, MeshletPipeline, MeshletPipelineDesc};

/// Device capable of building meshlet pipelines
pub trait MeshletDevice: Send + Sync {
    /// True if the device exposes mesh shading
    fn supports_mesh_shading(&self) -> bool;

    /// Build a pipeline for the given attachment formats
    ///
    /// Fails with `UnsupportedFeature` (and no side effects) when mesh
    /// shading is not available.
    fn create_meshlet_pipeline(
        &self,
        desc: MeshletPipelineDesc,
        framebuffer_info: &FramebufferInfo,
    ) -> Result<Arc<dyn MeshletPipeline>>;

    /// Build a pipeline for the formats of an existing framebuffer
    fn create_meshlet_pipeline_for_framebuffer(
        &self,
        desc: MeshletPipelineDesc,
        framebuffer: Option<&Arc<dyn Framebuffer>>,
    ) -> Result<Arc<dyn MeshletPipeline>> {
        match framebuffer {
            Some(framebuffer) => self.create_meshlet_pipeline(desc, framebuffer.info()),
            None => Err(crate::hal_invalid!(
                "meshlet::device",
                "create_meshlet_pipeline_for_framebuffer: no framebuffer given"
            )),
        }
    }
}
