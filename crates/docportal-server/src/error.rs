use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docportal_core::{AuthError, QueryError, StoreError};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("unknown table '{0}'")]
    UnknownTable(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Query(QueryError::InvalidTableSpec { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Query(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(AuthError::MissingCredentials) => StatusCode::BAD_REQUEST,
            AppError::Auth(AuthError::Query(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(AuthError::Store(_)) | AppError::Store(_) => StatusCode::BAD_GATEWAY,
            AppError::UnknownTable(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
