pub mod ai_service;
pub mod groq; // Groq chat completions client
pub mod history;
pub mod validation;

pub use ai_service::VisionModel;
pub use groq::{build_chat_request, ChatRequest, GroqClient};
pub use history::{ChatHistoryStore, InMemoryHistory};
pub use validation::{validate_image, ValidatedImage};
