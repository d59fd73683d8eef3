use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use database::persistence::storage::StorageError;
use serde::Serialize;
use thiserror::Error;

use crate::validation::ValidationError;

pub const NOT_FOUND_OR_DELETED: &str = "Participant not found or deleted";
pub const PARTICIPANT_NOT_FOUND: &str = "Participant not found";
pub const EMAIL_NOT_PROVIDED: &str = "Email not provided!";
const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Not Found")]
    UnknownRoute,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) | ApiError::UnknownRoute => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Storage failures are logged in full and answered with a generic message
    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ApiError::Storage(e) => {
                log::error!("Storage error: {:?}", e);
                INTERNAL_SERVER_ERROR.to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorBody { error: &message })
    }
}
