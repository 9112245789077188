use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A stored file as reported back to the uploader
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UploadedFile {
    /// Public download URL, `{base_url}/{generated name}`
    #[schema(example = "https://cdn.example.com/ab3f9.png")]
    pub url: String,
}

/// Successful upload response.
///
/// Always holds exactly one entry; the list shape matches what pomf-style upload clients expect.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UploadResponse {
    pub files: Vec<UploadedFile>,
}

impl UploadResponse {
    pub fn single(url: String) -> Self {
        Self {
            files: vec![UploadedFile { url }],
        }
    }
}

/// JSON error body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    /// Remote or local failure detail, only present for upstream failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }
}
