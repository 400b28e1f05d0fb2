use base64::{engine::general_purpose, Engine};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::error::ValidationError;
use crate::models::{CallFailure, Category, CategoryOutcome, FailureKind, QueryResponse};
use crate::services::{build_chat_request, validate_image, ValidatedImage, VisionModel};

/// Per-category outcomes of one processed query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReport {
    pub explanation: CategoryOutcome,
    pub medications: CategoryOutcome,
}

impl RelayReport {
    pub fn outcome(&self, category: Category) -> &CategoryOutcome {
        match category {
            Category::Explanation => &self.explanation,
            Category::Medications => &self.medications,
        }
    }

    /// Flatten to the two-key mapping, replacing failures with placeholders.
    pub fn to_response(&self) -> QueryResponse {
        let text = |category: Category| match self.outcome(category) {
            Ok(answer) => answer.clone(),
            Err(failure) => failure.placeholder(category),
        };

        QueryResponse {
            explanation: text(Category::Explanation),
            medications: text(Category::Medications),
        }
    }

    /// First failure that produced no usable HTTP answer (transport or parse).
    pub fn unexpected_failure(&self) -> Option<(Category, &CallFailure)> {
        [Category::Explanation, Category::Medications]
            .into_iter()
            .find_map(|category| match self.outcome(category) {
                Err(failure) if !matches!(failure.kind, FailureKind::Status(_)) => {
                    Some((category, failure))
                }
                _ => None,
            })
    }
}

/// What the script surface prints: the response mapping or a single error entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ScriptOutput {
    Response(QueryResponse),
    Error { error: String },
}

/// Sends one image and query to the explanation and medication models.
pub struct ImageQueryRelay {
    model: Arc<dyn VisionModel>,
    explanation_model: String,
    medication_model: String,
    max_tokens: u32,
}

impl ImageQueryRelay {
    pub fn new(model: Arc<dyn VisionModel>, config: &Config) -> Self {
        Self {
            model,
            explanation_model: config.explanation_model.clone(),
            medication_model: config.medication_model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    pub fn model_for(&self, category: Category) -> &str {
        match category {
            Category::Explanation => &self.explanation_model,
            Category::Medications => &self.medication_model,
        }
    }

    /// Validate the image, then ask both questions in turn.
    pub async fn process(&self, image: &[u8], query: &str) -> Result<RelayReport, ValidationError> {
        let validated = validate_image(image)?;
        Ok(self.process_validated(image, validated, query).await)
    }

    /// Ask both questions about an image that already passed validation.
    pub async fn process_validated(
        &self,
        image: &[u8],
        validated: ValidatedImage,
        query: &str,
    ) -> RelayReport {
        let encoded_image = general_purpose::STANDARD.encode(image);
        log::debug!(
            "📊 Image size: {} bytes, base64 size: {} bytes",
            image.len(),
            encoded_image.len()
        );

        let mime_type = validated.mime_type();
        let explanation = self
            .ask(Category::Explanation, &encoded_image, mime_type, query)
            .await;
        let medications = self
            .ask(Category::Medications, &encoded_image, mime_type, query)
            .await;

        RelayReport {
            explanation,
            medications,
        }
    }

    async fn ask(
        &self,
        category: Category,
        encoded_image: &str,
        mime_type: &str,
        query: &str,
    ) -> CategoryOutcome {
        let request = build_chat_request(
            self.model_for(category),
            &category.prompt(query),
            encoded_image,
            mime_type,
            self.max_tokens,
        );

        match self.model.complete(&request).await {
            Ok(answer) => {
                log::info!("✅ Processed {}: {}...", category, preview(&answer));
                Ok(answer)
            }
            Err(failure) => {
                log::error!("❌ Error fetching {}: {}", category, failure);
                Err(failure)
            }
        }
    }

    /// Script surface: read `path` and process it, never failing.
    pub async fn process_image_file(&self, path: &Path, query: &str) -> ScriptOutput {
        let image = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("❌ Unexpected error reading {}: {}", path.display(), e);
                return ScriptOutput::Error {
                    error: format!("Unexpected error: {}", e),
                };
            }
        };

        match self.process(&image, query).await {
            Ok(report) => ScriptOutput::Response(report.to_response()),
            Err(e @ ValidationError::EmptyImage) => ScriptOutput::Error {
                error: format!("Unexpected error: {}", e),
            },
            Err(e) => ScriptOutput::Error {
                error: e.to_string(),
            },
        }
    }
}

/// First 100 characters, for log lines.
fn preview(text: &str) -> &str {
    match text.char_indices().nth(100) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::services::validation::tests::tiny_png;
    use crate::services::ChatRequest;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records every request and answers per model.
    pub(crate) struct RecordingModel {
        pub calls: Mutex<Vec<ChatRequest>>,
        responder: Box<dyn Fn(&ChatRequest) -> Result<String, CallFailure> + Send + Sync>,
    }

    impl RecordingModel {
        pub fn new<F>(responder: F) -> Self
        where
            F: Fn(&ChatRequest) -> Result<String, CallFailure> + Send + Sync + 'static,
        {
            Self {
                calls: Mutex::new(Vec::new()),
                responder: Box::new(responder),
            }
        }

        pub fn echo() -> Self {
            Self::new(|request| Ok(format!("answer from {}", request.model)))
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl VisionModel for RecordingModel {
        async fn complete(&self, request: &ChatRequest) -> Result<String, CallFailure> {
            self.calls.lock().unwrap().push(request.clone());
            (self.responder)(request)
        }
    }

    pub(crate) fn test_config() -> Config {
        Config {
            api_key: "gsk_test".to_string(),
            api_url: "http://127.0.0.1:1/unused".to_string(),
            explanation_model: "llama-3.2-11b-vision-preview".to_string(),
            medication_model: "llama-3.2-90b-vision-preview".to_string(),
            max_tokens: 1000,
            request_timeout: Duration::from_secs(30),
            bind_addr: "127.0.0.1:0".to_string(),
            history_limit: None,
        }
    }

    fn relay_with(model: Arc<RecordingModel>) -> ImageQueryRelay {
        ImageQueryRelay::new(model, &test_config())
    }

    #[tokio::test]
    async fn test_empty_image_makes_no_calls() {
        let model = Arc::new(RecordingModel::echo());
        let relay = relay_with(model.clone());

        let err = relay.process(&[], "anything").await.unwrap_err();

        assert_eq!(err, ValidationError::EmptyImage);
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_non_image_makes_no_calls() {
        let model = Arc::new(RecordingModel::echo());
        let relay = relay_with(model.clone());

        let err = relay.process(b"GIF89a but not really", "anything").await.unwrap_err();

        assert!(matches!(err, ValidationError::InvalidImage(_)));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_valid_image_makes_exactly_two_calls() {
        let model = Arc::new(RecordingModel::echo());
        let relay = relay_with(model.clone());
        let png = tiny_png();
        let query = "What condition is shown in this image?";

        let report = relay.process(&png, query).await.unwrap();

        let calls = model.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 2);

        assert_eq!(calls[0].model, "llama-3.2-11b-vision-preview");
        assert_eq!(calls[1].model, "llama-3.2-90b-vision-preview");
        assert_eq!(calls[0].prompt_text(), Some(Category::Explanation.prompt(query).as_str()));
        assert_eq!(calls[1].prompt_text(), Some(Category::Medications.prompt(query).as_str()));
        assert!(calls.iter().all(|c| c.prompt_text().unwrap().ends_with(query)));
        assert!(calls.iter().all(|c| c.max_tokens == 1000));

        let expected_url = format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(&png)
        );
        assert_eq!(calls[0].image_url(), Some(expected_url.as_str()));
        assert_eq!(calls[1].image_url(), Some(expected_url.as_str()));

        assert_eq!(
            report.to_response(),
            QueryResponse {
                explanation: "answer from llama-3.2-11b-vision-preview".to_string(),
                medications: "answer from llama-3.2-90b-vision-preview".to_string(),
            }
        );
        assert!(report.unexpected_failure().is_none());
    }

    #[tokio::test]
    async fn test_failures_are_isolated_per_category() {
        let model = Arc::new(RecordingModel::new(|request| {
            if request.model.contains("11b") {
                Err(CallFailure::new(FailureKind::Status(500), "boom"))
            } else {
                Ok("Try an antihistamine.".to_string())
            }
        }));
        let relay = relay_with(model.clone());

        let report = relay.process(&tiny_png(), "itchy spots").await.unwrap();
        let response = report.to_response();

        assert_eq!(model.call_count(), 2);
        assert_eq!(response.explanation, "Error fetching explanation: 500");
        assert_eq!(response.medications, "Try an antihistamine.");
        assert!(report.unexpected_failure().is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_is_unexpected() {
        let model = Arc::new(RecordingModel::new(|request| {
            if request.model.contains("90b") {
                Err(CallFailure::new(FailureKind::Transport, "timed out"))
            } else {
                Ok("fine".to_string())
            }
        }));
        let relay = relay_with(model);

        let report = relay.process(&tiny_png(), "q").await.unwrap();

        assert_eq!(
            report.to_response().medications,
            "Error fetching medications: No Response"
        );
        let (category, failure) = report.unexpected_failure().unwrap();
        assert_eq!(category, Category::Medications);
        assert_eq!(failure.kind, FailureKind::Transport);
    }

    #[tokio::test]
    async fn test_script_surface_reports_missing_file() {
        let relay = relay_with(Arc::new(RecordingModel::echo()));
        let dir = tempfile::tempdir().unwrap();

        let output = relay
            .process_image_file(&dir.path().join("missing.jpg"), "q")
            .await;

        match output {
            ScriptOutput::Error { error } => assert!(error.starts_with("Unexpected error: ")),
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_script_surface_reports_invalid_image() {
        let model = Arc::new(RecordingModel::echo());
        let relay = relay_with(model.clone());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.jpg");
        std::fs::write(&path, b"plain text").unwrap();

        let output = relay.process_image_file(&path, "q").await;
        let json = serde_json::to_value(&output).unwrap();

        assert!(json["error"].as_str().unwrap().starts_with("Invalid image format: "));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_script_surface_reports_empty_file() {
        let model = Arc::new(RecordingModel::echo());
        let relay = relay_with(model.clone());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.jpg");
        std::fs::write(&path, b"").unwrap();

        let output = relay.process_image_file(&path, "q").await;

        assert_eq!(
            output,
            ScriptOutput::Error {
                error: "Unexpected error: The provided image file is empty.".to_string()
            }
        );
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_script_surface_prints_mapping() {
        let relay = relay_with(Arc::new(RecordingModel::echo()));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic1.png");
        std::fs::write(&path, tiny_png()).unwrap();

        let output = relay.process_image_file(&path, "q").await;
        let json = serde_json::to_value(&output).unwrap();

        assert_eq!(json["explanation"], "answer from llama-3.2-11b-vision-preview");
        assert_eq!(json["medications"], "answer from llama-3.2-90b-vision-preview");
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let text = "é".repeat(150);
        assert_eq!(preview(&text).chars().count(), 100);
        assert_eq!(preview("short"), "short");
    }
}
