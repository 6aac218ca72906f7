//! HTTP error envelope.
//!
//! Every failure leaves the server as `{"success": false, "error": "..."}`.
//! Caller mistakes are 400; everything else is 500.

use crate::demo::DemoError;
use crate::frame::DecodeError;
use crate::pose::PoseError;
use crate::sessions::SessionError;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Body(#[from] BytesRejection),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Failed to decode image: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Pose(#[from] PoseError),

    #[error(transparent)]
    Demo(#[from] DemoError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Body(rejection) => rejection.status(),
            ApiError::Session(SessionError::NotInitialized | SessionError::NotFound(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Session(SessionError::Analysis(_))
            | ApiError::Decode(_)
            | ApiError::Pose(_)
            | ApiError::Demo(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
        let body = Json(serde_json::json!({
            "success": false,
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}

/// JSON request body that tolerates a missing body or content type.
///
/// An empty body yields `T::default()`, so handlers can apply the same
/// field defaults whether the client sent `{}` or nothing at all.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonBody(T::default()));
        }
        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))
    }
}
