//! Mapping from core errors to HTTP responses.
//!
//! Every error leaves the service as a `{success:false, message}` JSON body
//! with the status the error taxonomy prescribes: validation failures 400,
//! visibility/ownership violations 403, absent records 404, generation and
//! storage failures 500. Storage error details are logged, not leaked.

use api_shared::ErrorRes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fable_core::TaleError;

/// Error type for REST handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Auth-required route called without a requester identity.
    Unauthorized,
    /// A core-domain failure.
    Tale(TaleError),
}

impl From<TaleError> for ApiError {
    fn from(err: TaleError) -> Self {
        ApiError::Tale(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "authentication required".to_string(),
            ),
            ApiError::Tale(err) => match &err {
                TaleError::InvalidInput(_) => (StatusCode::BAD_REQUEST, err.to_string()),
                TaleError::Forbidden => (StatusCode::FORBIDDEN, err.to_string()),
                TaleError::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
                TaleError::Generation(_) => {
                    tracing::error!("Generation error: {err}");
                    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
                }
                _ => {
                    tracing::error!("Storage error: {err:?}");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
                }
            },
        };

        (
            status,
            Json(ErrorRes {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_mapping_follows_taxonomy() {
        assert_eq!(
            status_of(ApiError::Tale(TaleError::InvalidInput("bad".into()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ApiError::Tale(TaleError::Forbidden)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(ApiError::Tale(TaleError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ApiError::Tale(TaleError::Generation("down".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_of(ApiError::Unauthorized), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_storage_details_are_not_leaked() {
        let err = ApiError::Tale(TaleError::FileRead(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "/secret/path",
        )));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
