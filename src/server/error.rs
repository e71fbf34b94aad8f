//! HTTP error mapping.
//!
//! Every error body is `{"detail": "..."}`. Internal failures are logged in
//! full and reported with a generic detail.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::auth::MISSING_SECRET_DETAIL;
use crate::types::FinError;

pub const UNAUTHORIZED_DETAIL: &str = "Could not validate credentials";
const INTERNAL_DETAIL: &str = "Internal server error";

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, UNAUTHORIZED_DETAIL)
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<FinError> for ApiError {
    fn from(err: FinError) -> Self {
        match err {
            FinError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            FinError::Unauthorized(_) => Self::unauthorized(),
            FinError::Validation(detail) => Self::unprocessable(detail),
            FinError::Config(detail) if detail == MISSING_SECRET_DETAIL => {
                error!("{}", MISSING_SECRET_DETAIL);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
            }
            other => {
                error!(error = %other, "Request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_DETAIL)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(json!({ "detail": self.detail }))).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
