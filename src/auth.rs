use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    http::header::{HeaderValue, AUTHORIZATION},
    web, ResponseError,
};
use actix_web_lab::middleware::Next;
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::{error::ApiError, state::AppState};

const BASIC_SCHEME: &str = "Basic ";

/// Standard alphabet, padding optional
const CREDENTIALS_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Error, Debug, PartialEq)]
pub enum AuthError {
    #[error("authorization header is missing")]
    MissingHeader,

    #[error("authorization header does not use the Basic scheme")]
    UnsupportedScheme,

    #[error("authorization header credentials are malformed")]
    MalformedCredentials,

    #[error("credentials do not match")]
    InvalidCredentials,

    #[error("admin credentials are not configured")]
    NotConfigured,
}

#[derive(Debug, PartialEq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

/// Decodes `Basic <base64(username:password)>`. The password is everything after the first `:`,
/// so it may itself contain colons.
pub fn parse_basic_credentials(header: &str) -> Result<BasicCredentials, AuthError> {
    if !header.starts_with(BASIC_SCHEME) {
        return Err(AuthError::UnsupportedScheme);
    }

    let encoded = header.split(' ').nth(1).unwrap_or_default();

    let decoded = CREDENTIALS_ENGINE
        .decode(encoded)
        .map_err(|_| AuthError::MalformedCredentials)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::MalformedCredentials)?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or(AuthError::MalformedCredentials)?;

    Ok(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

#[derive(Clone)]
pub struct AdminCredentials {
    username: String,
    password: String,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Compares both halves in constant time
    pub fn matches(&self, credentials: &BasicCredentials) -> bool {
        let username = self
            .username
            .as_bytes()
            .ct_eq(credentials.username.as_bytes());
        let password = self
            .password
            .as_bytes()
            .ct_eq(credentials.password.as_bytes());

        (username & password).into()
    }

    pub fn authorize(&self, header: Option<&HeaderValue>) -> Result<(), AuthError> {
        // Empty secrets never authorize, not even `Basic Og==`
        if self.username.is_empty() || self.password.is_empty() {
            return Err(AuthError::NotConfigured);
        }

        let header = header
            .ok_or(AuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AuthError::MalformedCredentials)?;

        let credentials = parse_basic_credentials(header)?;

        if self.matches(&credentials) {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Gate for the participants scope. Rejected requests never reach a handler, so the store is
/// untouched.
pub async fn require_admin<B: MessageBody + 'static>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, actix_web::Error> {
    let authorized = match req.app_data::<web::Data<AppState>>() {
        Some(state) => state.admin.authorize(req.headers().get(AUTHORIZATION)),
        None => Err(AuthError::NotConfigured),
    };

    match authorized {
        Ok(()) => next
            .call(req)
            .await
            .map(|res| res.map_into_left_body()),
        Err(e) => {
            log::warn!("Rejected {} {}: {}", req.method(), req.path(), e);

            let response = ApiError::Unauthorized.error_response();

            Ok(req.into_response(response).map_into_right_body())
        }
    }
}
