use serde::Serialize;

/// Crate-wide error type.
///
/// Every variant is reachable from an operator action and none of them is
/// fatal: the wizard stays usable after any of these is returned.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Transport-level failure talking to an upstream API (connect, timeout, 5xx).
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// Upstream answered but rejected the request; carries its message.
    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Circuit breaker open")]
    CircuitBreakerOpen,

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::StorageError(err.to_string())
    }
}

impl ServiceError {
    /// Text suitable for a toast notification.
    /// Internal failures return generic messages to avoid leaking implementation details.
    pub fn user_message(&self) -> String {
        match self {
            Self::ValidationError(msg) | Self::InvalidOperation(msg) | Self::Conflict(msg) => {
                msg.clone()
            }
            Self::NotFound(msg) => format!("{} not found", msg),
            Self::ExternalApiError(msg) => msg.clone(),
            Self::ExternalServiceError(_) | Self::CircuitBreakerOpen => {
                "Service temporarily unavailable, please try again".to_string()
            }
            Self::SerializationError(_)
            | Self::StorageError(_)
            | Self::InternalError(_)
            | Self::Other(_) => "Something went wrong, please try again".to_string(),
        }
    }

    /// Whether the operator can fix the input and resubmit.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InternalError(_) | Self::Other(_))
    }

    /// True for failures raised before any network call was made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_) | Self::InvalidOperation(_) | Self::Conflict(_)
        )
    }

    /// True when the upstream could not be reached or refused to serve.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::ExternalServiceError(_) | Self::ExternalApiError(_) | Self::CircuitBreakerOpen
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_hides_internal_details() {
        assert_eq!(
            ServiceError::StorageError("disk full at /var/mirror".into()).user_message(),
            "Something went wrong, please try again"
        );
        assert_eq!(
            ServiceError::ExternalServiceError("connection refused".into()).user_message(),
            "Service temporarily unavailable, please try again"
        );
    }

    #[test]
    fn user_message_passes_server_text_through() {
        assert_eq!(
            ServiceError::ExternalApiError("DC number already used".into()).user_message(),
            "DC number already used"
        );
        assert_eq!(
            ServiceError::ValidationError("Customer is required".into()).user_message(),
            "Customer is required"
        );
    }

    #[test]
    fn classification_helpers() {
        assert!(ServiceError::Conflict("dup".into()).is_validation());
        assert!(ServiceError::CircuitBreakerOpen.is_upstream());
        assert!(!ServiceError::ValidationError("x".into()).is_upstream());
        assert!(ServiceError::ExternalApiError("x".into()).is_recoverable());
        assert!(!ServiceError::InternalError("x".into()).is_recoverable());
    }

    #[test]
    fn validator_errors_convert_to_validation_error() {
        let errors = validator::ValidationErrors::new();
        assert!(matches!(
            ServiceError::from(errors),
            ServiceError::ValidationError(_)
        ));
    }
}
