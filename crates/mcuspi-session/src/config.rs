use mcuspi_frame::{CodecConfig, DEFAULT_QUEUE_CAPACITY};

/// Session behavior configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Label used in log events (e.g. `mcuspi0`).
    pub name: String,
    /// Receive-side frame validation.
    pub codec: CodecConfig,
    /// Number of inbound queue slots.
    pub queue_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "mcuspi0".to_string(),
            codec: CodecConfig::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Default configuration under a different name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}
