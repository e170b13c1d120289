use thiserror::Error;

/// Errors emitted while synthesizing, saving or loading fixtures.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("generator '{0}' is not registered")]
    GeneratorNotFound(String),
    #[error("malformed placeholder: {0}")]
    PlaceholderGrammar(String),
    #[error("'{value}' is not a valid ordinal of enum '{type_name}'")]
    EnumOrdinal { value: String, type_name: String },
    #[error("unable to store aliases: {0}")]
    AliasWrite(String),
    #[error("generator '{generator}' failed: {message}")]
    Plugin { generator: String, message: String },
    #[error(transparent)]
    Core(#[from] instiller_core::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl GenerationError {
    pub(crate) fn plugin(generator: &str, message: impl Into<String>) -> Self {
        GenerationError::Plugin {
            generator: generator.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;
