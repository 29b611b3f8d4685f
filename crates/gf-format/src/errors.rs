use gf_types::ConfigError;

/// Errors while reading a component document.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    #[error("failed to parse document: {0}")]
    Parse(String),

    #[error("unknown document format: {0}")]
    UnknownFormat(String),

    #[error("document version {file_version} is newer than supported version {supported_version}")]
    FutureVersion {
        file_version: u32,
        supported_version: u32,
    },

    #[error("migration failed from version {from} to {to}: {reason}")]
    MigrationFailed { from: u32, to: u32, reason: String },

    #[error("invalid component: {0}")]
    Invalid(#[from] ConfigError),
}

/// Errors while writing a component document.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SaveError {
    #[error("failed to serialize document: {0}")]
    Serialize(String),

    #[error("refusing to save an invalid component: {0}")]
    Invalid(#[from] ConfigError),
}
