/// Device-level types: formats, fixed-function state, shaders, resources,
/// bindings, framebuffers and meshlet pipelines

pub mod format;
pub mod render_state;
pub mod shader;
pub mod specialization;
pub mod resource;
pub mod binding;
pub mod framebuffer;
pub mod viewport;
pub mod meshlet_pipeline;
pub mod graphics_device;

#[cfg(test)]
pub mod mock_device;

pub use format::*;
pub use render_state::*;
pub use shader::*;
pub use specialization::*;
pub use resource::*;
pub use binding::*;
pub use framebuffer::*;
pub use viewport::*;
pub use meshlet_pipeline::*;
pub use graphics_device::*;
