use crate::models::CallFailure;
use crate::services::groq::ChatRequest;

/// Trait for vision-capable chat completion backends (Groq, OpenAI-compatible, mocks)
#[async_trait::async_trait]
pub trait VisionModel: Send + Sync {
    /// Send one chat request and return the first choice's text.
    async fn complete(&self, request: &ChatRequest) -> Result<String, CallFailure>;
}
