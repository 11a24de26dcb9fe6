use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid operation for current state: {0}")]
    InvalidState(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Payment error: {0}")]
    PaymentError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    /// Stable error code plus the message the UI layer may surface inline.
    pub fn user_message(&self) -> (&'static str, String) {
        match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                ("VALIDATION_ERROR", msg.clone())
            }
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone()),
            AppError::InvalidState(msg) => {
                log::warn!("Invalid state: {msg}");
                ("INVALID_STATE", msg.clone())
            }
            AppError::ExternalApiError(msg) => {
                log::error!("External API error: {msg}");
                ("EXTERNAL_API_ERROR", msg.clone())
            }
            AppError::PaymentError(msg) => {
                log::error!("Payment error: {msg}");
                ("PAYMENT_ERROR", msg.clone())
            }
            AppError::ConfigError(msg) => {
                log::error!("Config error: {msg}");
                ("CONFIG_ERROR", msg.clone())
            }
            AppError::ReqwestError(err) => {
                log::error!("HTTP request error: {err}");
                (
                    "NETWORK_ERROR",
                    crate::utils::messages::NETWORK_ERROR.to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                ("INTERNAL_ERROR", "Internal error".to_string())
            }
        }
    }
}
