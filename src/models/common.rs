use serde::{Deserialize, Serialize};

/// Response envelope used by every contest API endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    /// Unwrap the envelope, turning a `success: false` body into the
    /// server-provided error message.
    pub fn into_data(self, context: &str) -> crate::error::AppResult<T> {
        if self.success {
            self.data.ok_or_else(|| {
                crate::error::AppError::ExternalApiError(format!("{context}: empty response body"))
            })
        } else {
            let detail = self
                .error
                .map(|e| format!("{}: {}", e.code, e.message))
                .or(self.message)
                .unwrap_or_else(|| "unknown error".to_string());
            Err(crate::error::AppError::ExternalApiError(format!(
                "{context}: {detail}"
            )))
        }
    }
}
