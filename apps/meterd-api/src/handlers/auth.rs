//! 认证 handlers
//!
//! - POST /api/auth/login
//! - GET  /api/auth/me

use crate::AppState;
use crate::middleware::require_user;
use crate::utils::response::{auth_error, internal_auth_error};
use api_contract::{ApiResponse, LoginRequest, LoginResponse, MeResponse};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use meterd_auth::AuthError;

pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    match state.auth.login(&req.email, &req.password) {
        Ok((user, token)) => {
            let response = LoginResponse {
                access_token: token,
                token_type: "bearer".to_string(),
                role: user.role,
            };
            (StatusCode::OK, Json(ApiResponse::success(response))).into_response()
        }
        Err(AuthError::InvalidCredentials) => auth_error(StatusCode::UNAUTHORIZED),
        Err(err) => internal_auth_error(err),
    }
}

pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let claims = match require_user(&state, &headers) {
        Ok(claims) => claims,
        Err(response) => return response,
    };
    let response = MeResponse {
        email: claims.email,
        role: claims.role,
        id: claims.sub,
    };
    (StatusCode::OK, Json(ApiResponse::success(response))).into_response()
}
