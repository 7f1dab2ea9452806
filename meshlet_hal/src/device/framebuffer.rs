/// Framebuffer trait and attachment format snapshot

use std::any::Any;
use std::sync::Arc;
use crate::error::Result;
use crate::device::{Format, Texture, MAX_RENDER_TARGETS};

/// Attachment formats and sample count a pipeline is built against
///
/// Pipelines are format-specific: a pipeline built for one
/// `FramebufferInfo` must not be used with a framebuffer of another.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FramebufferInfo {
    pub color_formats: Vec<Format>,
    /// `Format::UNKNOWN` when there is no depth/stencil attachment
    pub depth_format: Format,
    pub sample_count: u32,
}

impl FramebufferInfo {
    pub fn new(color_formats: Vec<Format>, depth_format: Format, sample_count: u32) -> Self {
        Self { color_formats, depth_format, sample_count }
    }

    pub fn validate(&self) -> Result<()> {
        if self.color_formats.len() > MAX_RENDER_TARGETS {
            return Err(crate::hal_invalid!(
                "meshlet::framebuffer",
                "{} color targets exceed the maximum of {}",
                self.color_formats.len(),
                MAX_RENDER_TARGETS
            ));
        }
        if self.depth_format != Format::UNKNOWN && !self.depth_format.is_depth_stencil() {
            return Err(crate::hal_invalid!(
                "meshlet::framebuffer",
                "{:?} is not a depth/stencil format",
                self.depth_format
            ));
        }
        Ok(())
    }

    pub fn has_depth_attachment(&self) -> bool {
        self.depth_format != Format::UNKNOWN
    }
}

/// Framebuffer trait
///
/// Wraps existing attachments; the backend begins rendering directly on
/// them.
pub trait Framebuffer: Send + Sync {
    fn info(&self) -> &FramebufferInfo;

    fn color_attachments(&self) -> &[Arc<dyn Texture>];

    fn depth_attachment(&self) -> Option<&Arc<dyn Texture>>;

    /// Render area in pixels
    fn extent(&self) -> (u32, u32);

    fn as_any(&self) -> &dyn Any;
}
