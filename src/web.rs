use serde::Serialize;

pub mod page;

pub use page::ChatPage;

/// JSON body of every error response: `{"detail": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

// Axum integration (optional - requires the web-server feature)
#[cfg(feature = "web-server")]
pub mod server {
    use super::*;
    use axum::{
        body::Bytes,
        extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
        http::StatusCode,
        response::{Html, IntoResponse, Response},
        routing::{get, post},
        Json, Router,
    };
    use std::sync::Arc;
    use tower::ServiceBuilder;
    use tower_http::services::ServeDir;

    use crate::error::ValidationError;
    use crate::handlers::ImageQueryRelay;
    use crate::models::{ChatEntry, QueryResponse};
    use crate::services::{validate_image, ChatHistoryStore};

    /// Largest accepted multipart body.
    pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

    /// Stylesheets and other assets, independent of the working directory.
    const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

    pub struct AppState {
        pub relay: Arc<ImageQueryRelay>,
        pub history: Arc<dyn ChatHistoryStore>,
        pub page: ChatPage,
    }

    /// Fails only if the embedded page template does not compile.
    pub fn create_router(
        relay: Arc<ImageQueryRelay>,
        history: Arc<dyn ChatHistoryStore>,
    ) -> Result<Router, minijinja::Error> {
        let state = Arc::new(AppState {
            relay,
            history,
            page: ChatPage::new()?,
        });

        let router = Router::new()
            .route("/", get(chat_page))
            .route("/upload_and_query", post(upload_and_query))
            .route("/history", get(history_handler))
            .route("/health", get(health_check))
            .nest_service("/static", ServeDir::new(STATIC_DIR))
            .layer(ServiceBuilder::new().layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)))
            .with_state(state);

        Ok(router)
    }

    #[derive(Debug)]
    pub struct ApiError {
        status: StatusCode,
        detail: String,
    }

    impl ApiError {
        fn new(status: StatusCode, detail: impl Into<String>) -> Self {
            Self {
                status,
                detail: detail.into(),
            }
        }

        fn internal(message: impl std::fmt::Display) -> Self {
            Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("An unexpected error occurred: {}", message),
            )
        }
    }

    impl From<ValidationError> for ApiError {
        fn from(e: ValidationError) -> Self {
            Self::new(StatusCode::BAD_REQUEST, e.detail())
        }
    }

    impl IntoResponse for ApiError {
        fn into_response(self) -> Response {
            log::error!("❌ Request failed ({}): {}", self.status, self.detail);
            (self.status, Json(ErrorBody { detail: self.detail })).into_response()
        }
    }

    struct UploadForm {
        image: Bytes,
        query: String,
    }

    async fn read_upload_form(multipart: &mut Multipart) -> Result<UploadForm, ApiError> {
        let mut image = None;
        let mut query = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?
        {
            match field.name() {
                Some("image") => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
                    image = Some(bytes);
                }
                Some("query") => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
                    query = Some(text);
                }
                other => log::debug!("Ignoring unexpected form field: {:?}", other),
            }
        }

        let image = image
            .ok_or_else(|| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "Field required: image"))?;
        let query = query
            .ok_or_else(|| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "Field required: query"))?;

        Ok(UploadForm { image, query })
    }

    async fn upload_and_query(
        State(state): State<Arc<AppState>>,
        multipart: Result<Multipart, MultipartRejection>,
    ) -> Result<Json<QueryResponse>, ApiError> {
        let mut multipart =
            multipart.map_err(|rejection| ApiError::new(rejection.status(), rejection.body_text()))?;
        let UploadForm { image, query } = read_upload_form(&mut multipart).await?;
        log::info!("📨 Upload received: {} bytes, query: '{}'", image.len(), query);

        let to_validate = image.clone();
        let validated = tokio::task::spawn_blocking(move || validate_image(&to_validate))
            .await
            .map_err(ApiError::internal)??;

        let report = state
            .relay
            .process_validated(&image, validated, &query)
            .await;

        if let Some((category, failure)) = report.unexpected_failure() {
            return Err(ApiError::internal(format!(
                "Error fetching {}: {}",
                category, failure
            )));
        }

        let response = report.to_response();
        state.history.append(ChatEntry::new(query, &response));

        log::info!("✅ Query processed successfully");
        Ok(Json(response))
    }

    async fn chat_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
        let html = state
            .page
            .render(&state.history.list())
            .map_err(ApiError::internal)?;
        Ok(Html(html))
    }

    async fn history_handler(State(state): State<Arc<AppState>>) -> Json<Vec<ChatEntry>> {
        Json(state.history.list())
    }

    async fn health_check() -> &'static str {
        "OK"
    }

}
