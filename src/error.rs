/// Input problems reported back to the caller. Never fatal to the process.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("The provided image file is empty.")]
    EmptyImage,

    #[error("Invalid image format: {0}")]
    InvalidImage(String),
}

impl ValidationError {
    /// Short message used in HTTP error bodies.
    pub fn detail(&self) -> String {
        match self {
            ValidationError::EmptyImage => "Empty file".to_string(),
            ValidationError::InvalidImage(_) => self.to_string(),
        }
    }
}

/// Startup configuration problems. The binaries refuse to start on these.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("GROQ_API_KEY is not set in the environment or .env file")]
    MissingApiKey,

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}
