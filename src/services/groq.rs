use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::models::{CallFailure, FailureKind};
use crate::services::ai_service::VisionModel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentPart {
    Text {
        #[serde(rename = "type")]
        content_type: String,
        text: String,
    },
    ImageUrl {
        #[serde(rename = "type")]
        content_type: String,
        image_url: ImageData,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

impl ChatRequest {
    /// Text of the first text part, if any.
    pub fn prompt_text(&self) -> Option<&str> {
        self.parts().find_map(|part| match part {
            ContentPart::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// URL of the first image part, if any.
    pub fn image_url(&self) -> Option<&str> {
        self.parts().find_map(|part| match part {
            ContentPart::ImageUrl { image_url, .. } => Some(image_url.url.as_str()),
            _ => None,
        })
    }

    fn parts(&self) -> impl Iterator<Item = &ContentPart> {
        self.messages.iter().flat_map(|message| message.content.iter())
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    content: String,
}

/// Build the single-message request carrying `prompt` and the image as a data URI.
pub fn build_chat_request(
    model: &str,
    prompt: &str,
    encoded_image: &str,
    mime_type: &str,
    max_tokens: u32,
) -> ChatRequest {
    let data_url = format!("data:{};base64,{}", mime_type, encoded_image);

    ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: vec![
                ContentPart::Text {
                    content_type: "text".to_string(),
                    text: prompt.to_string(),
                },
                ContentPart::ImageUrl {
                    content_type: "image_url".to_string(),
                    image_url: ImageData { url: data_url },
                },
            ],
        }],
        max_tokens,
    }
}

/// Client for Groq's OpenAI-compatible chat completions endpoint.
pub struct GroqClient {
    api_key: String,
    api_url: String,
    client: reqwest::Client,
}

impl GroqClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl VisionModel for GroqClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, CallFailure> {
        log::info!("🤖 Sending request to Groq with model: {}", request.model);

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                log::error!("❌ API request failed: {}", e);
                CallFailure::new(FailureKind::Transport, format!("API request failed: {}", e))
            })?;

        let status = response.status();
        log::debug!("📥 Groq response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("❌ Groq API error ({}): {}", status, error_text);
            return Err(CallFailure::new(
                FailureKind::Status(status.as_u16()),
                format!("Groq API error ({}): {}", status, error_text),
            ));
        }

        let response_text = response.text().await.map_err(|e| {
            log::error!("❌ Failed to read Groq response body: {}", e);
            CallFailure::new(FailureKind::Transport, format!("Failed to read response: {}", e))
        })?;
        log::debug!("📄 Raw Groq response size: {} bytes", response_text.len());

        let chat_response: ChatResponse = serde_json::from_str(&response_text).map_err(|e| {
            log::error!("❌ Error parsing Groq response: {}", e);
            CallFailure::new(FailureKind::Parse, format!("Error parsing response: {}", e))
        })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                log::error!("❌ Groq response contained no choices");
                CallFailure::new(FailureKind::Parse, "Response contained no choices")
            })
    }
}
