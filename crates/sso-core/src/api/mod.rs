//! RPC transport for sso-core
//!
//! Each method of the auth service is exposed as a JSON `POST` endpoint.
//! Required fields are checked here before the service is invoked; service
//! errors are mapped to fixed codes, and internal details never reach the wire.

use axum::{
    Router,
    routing::{get, post},
    extract::{rejection::JsonRejection, FromRequest, State, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use validator::{Validate, ValidationErrors};

use crate::{AuthService, Error as SsoError};

// API State
#[derive(Clone)]
pub struct ApiState {
    pub auth_service: Arc<AuthService>,
}

/// JSON body extractor whose rejections use the service error body
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

// Request/Response types
//
// Missing fields deserialize to their empty value so that they are reported
// as invalid arguments instead of body rejections.

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    #[serde(default)]
    #[validate(range(min = 1, message = "app_id is required"))]
    pub app_id: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct IsAdminRequest {
    #[serde(default)]
    #[validate(range(min = 1, message = "user_id is required"))]
    pub user_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IsAdminResponse {
    pub is_admin: bool,
}

// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Create the RPC router
pub fn create_router(auth_service: Arc<AuthService>, request_timeout: Duration) -> Router {
    let state = ApiState { auth_service };

    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/is-admin", post(is_admin))
        .route("/health", get(health_check))
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn login(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    req.validate()?;

    let token = state.auth_service
        .login(&req.email, &req.password, req.app_id)
        .await?;

    Ok(Json(LoginResponse { token }))
}

async fn register(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    req.validate()?;

    let user_id = state.auth_service
        .register_new_user(&req.email, &req.password)
        .await?;

    Ok(Json(RegisterResponse { user_id }))
}

async fn is_admin(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<IsAdminRequest>,
) -> Result<Json<IsAdminResponse>, ApiError> {
    req.validate()?;

    let is_admin = state.auth_service.is_admin(req.user_id).await?;

    Ok(Json(IsAdminResponse { is_admin }))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "sso",
    }))
}

// Error handling

#[derive(Debug)]
pub enum ApiError {
    InvalidArgument(String),
    InvalidCredentials,
    UnknownApplication,
    UserAlreadyExists,
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::InvalidArgument(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", msg)
            },
            ApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", "invalid email or password".to_string())
            },
            ApiError::UnknownApplication => {
                (StatusCode::NOT_FOUND, "UNKNOWN_APPLICATION", "unknown application".to_string())
            },
            ApiError::UserAlreadyExists => {
                (StatusCode::CONFLICT, "USER_ALREADY_EXISTS", "user already exists".to_string())
            },
            ApiError::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", "internal error".to_string())
            },
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

impl From<SsoError> for ApiError {
    fn from(err: SsoError) -> Self {
        // Already logged by the service at the point of classification
        match err {
            SsoError::InvalidArgument(msg) => ApiError::InvalidArgument(msg),
            SsoError::InvalidCredentials => ApiError::InvalidCredentials,
            SsoError::UnknownApplication(_) => ApiError::UnknownApplication,
            SsoError::UserAlreadyExists => ApiError::UserAlreadyExists,
            SsoError::Internal { .. } | SsoError::Config(_) => ApiError::Internal,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(_rejection: JsonRejection) -> Self {
        ApiError::InvalidArgument("request body must be a JSON object with well-typed fields".to_string())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::InvalidArgument(validation_message(&errors))
    }
}

/// Join field messages in a stable order
fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}
