/*!
# Meshlet HAL

Backend-agnostic core of a mesh-shading pipeline abstraction.

This crate describes meshlet pipelines (amplification, mesh and pixel stages
plus fixed-function state) and records meshlet draws through a state cache
that only emits the native commands needed to reach each requested state.
Backends (Vulkan, ...) implement the device and encoder traits.

## Architecture

- **MeshletDevice**: Factory trait for meshlet pipelines
- **MeshletPipeline**: Compiled pipeline trait, shared through `Arc`
- **CommandEncoder**: Native command emission trait
- **MeshletRecorder**: State cache and dispatch emitter driving an encoder
- **HazardTracker**: Resource state tracking and barrier queueing
*/

// Internal modules
mod error;
pub mod config;
pub mod log;
pub mod device;
pub mod command;

pub use error::{Error, Result};
pub use config::Config;

// Main meshlet namespace module
pub mod meshlet {
    // Error types
    pub use crate::error::{Error, Result};

    pub use crate::config::Config;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, set_logger, reset_logger};
    }

    // Device sub-module with formats, state blocks, resources and pipelines
    pub mod device {
        pub use crate::device::*;
    }

    // Command recording sub-module
    pub mod command {
        pub use crate::command::*;
    }
}
