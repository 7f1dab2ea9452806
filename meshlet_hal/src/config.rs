//! HAL configuration

/// Configuration shared by the device context and every command recorder
#[derive(Debug, Clone)]
pub struct Config {
    /// Derive hazard barriers from the bindings of each state change
    pub enable_automatic_barriers: bool,
    /// Assert when a native object creation call fails, before the error is returned
    pub assert_on_backend_failure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_automatic_barriers: true,
            assert_on_backend_failure: cfg!(debug_assertions),
        }
    }
}
