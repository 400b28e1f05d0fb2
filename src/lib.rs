//! Relay an image and a question to Groq's vision models and collect an
//! explanation plus medication suggestions.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod web; // Chat page and upload endpoint

pub use config::Config;
pub use error::{ConfigError, ValidationError};
pub use handlers::{ImageQueryRelay, RelayReport, ScriptOutput};
pub use models::{CallFailure, Category, CategoryOutcome, ChatEntry, FailureKind, QueryResponse};
