use poem::http::StatusCode;
use poem::web::Json;
use poem::{IntoResponse, Response};

/// Every error a report endpoint can surface. Client input errors are
/// rejected before any query runs; store errors are terminal per-request
/// and never retried.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Failed to connect to database.")]
    Connection(#[source] sqlx::Error),
    #[error("Database query error: {0}")]
    Query(#[from] sqlx::Error),
    #[error("Platform is required")]
    PlatformRequired,
    #[error("Invalid sort_by field")]
    InvalidSortField,
    #[error("Invalid sort_by. Use one of [\"total_cost\", \"total_jobs\"]")]
    InvalidSortChoice,
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),
}

impl poem::error::ResponseError for ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Connection(_) | ApiError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::PlatformRequired
            | ApiError::InvalidSortField
            | ApiError::InvalidSortChoice
            | ApiError::UnsupportedPlatform(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn as_response(&self) -> Response {
        (
            self.status(),
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_the_wire_format() {
        assert_eq!(
            ApiError::PlatformRequired.to_string(),
            "Platform is required"
        );
        assert_eq!(
            ApiError::InvalidSortField.to_string(),
            "Invalid sort_by field"
        );
        assert_eq!(
            ApiError::InvalidSortChoice.to_string(),
            "Invalid sort_by. Use one of [\"total_cost\", \"total_jobs\"]"
        );
        assert_eq!(
            ApiError::UnsupportedPlatform("svn".into()).to_string(),
            "Unsupported platform: svn"
        );
    }

    #[test]
    fn client_errors_are_400_store_errors_500() {
        use poem::error::ResponseError;

        assert_eq!(
            ApiError::PlatformRequired.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Query(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Connection(sqlx::Error::PoolClosed).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
