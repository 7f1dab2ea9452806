/// Command recording: encoder trait, hazard tracking and the meshlet recorder

pub mod encoder;
pub mod barrier;
pub mod recording_state;
pub mod recorder;

#[cfg(test)]
pub mod mock_encoder;

pub use encoder::*;
pub use barrier::*;
pub use recording_state::*;
pub use recorder::*;
