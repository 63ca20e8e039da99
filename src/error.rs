//! Error types for HandType

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum HandTypeError {
    /// The camera / landmark source could not be started. Fatal for the session.
    #[error("landmark source unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("text service failed: {0}")]
    TextService(String),

    #[error("text service timed out after {0} ms")]
    Timeout(u64),
}
