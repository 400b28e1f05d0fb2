use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two questions asked about every image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Explanation,
    Medications,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Category::Explanation => "explanation",
            Category::Medications => "medications",
        };
        write!(f, "{}", s)
    }
}

impl Category {
    /// Prompt sent to the model, with the user's query embedded verbatim.
    pub fn prompt(&self, query: &str) -> String {
        match self {
            Category::Explanation => {
                format!("Explain the issue shown in this image based on this query: {}", query)
            }
            Category::Medications => format!(
                "Suggest medications for the issue related to this image and query: {}",
                query
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No response at all: connection error or timeout.
    Transport,
    /// The API answered with a non-success status code.
    Status(u16),
    /// The body was not JSON or lacked `choices[0].message.content`.
    Parse,
}

/// Why a single outbound call did not produce text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl CallFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Text placed in the response mapping in place of the model's answer.
    pub fn placeholder(&self, category: Category) -> String {
        match self.kind {
            FailureKind::Status(code) => format!("Error fetching {}: {}", category, code),
            FailureKind::Transport => format!("Error fetching {}: No Response", category),
            FailureKind::Parse => "Error parsing API response.".to_string(),
        }
    }
}

impl std::fmt::Display for CallFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

pub type CategoryOutcome = Result<String, CallFailure>;

/// Body of a successful upload, and what the script prints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub explanation: String,
    pub medications: String,
}

/// One past exchange, kept in the chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEntry {
    pub query: String,
    pub explanation: String,
    pub medications: String,
    pub created_at: DateTime<Utc>,
}

impl ChatEntry {
    pub fn new(query: impl Into<String>, response: &QueryResponse) -> Self {
        Self {
            query: query.into(),
            explanation: response.explanation.clone(),
            medications: response.medications.clone(),
            created_at: Utc::now(),
        }
    }
}
