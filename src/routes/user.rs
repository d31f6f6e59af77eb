use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    auth::UserInfo,
    error::{AppError, AppResult},
    middleware::ip::ClientIp,
    state::{AppState, LOGIN_ENDPOINT},
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `POST /user/login`: exchanges credentials for a bearer token, returned as
/// the raw response body.
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    state.rate_limiter.check_endpoint_limit(LOGIN_ENDPOINT, ip).await?;
    let req = super::json_body(payload)?;

    let user = match state.auth.user_info_if_credentials_are_correct(&req.username, &req.password).await? {
        Some(user) => user,
        None => {
            state.metrics.inc_logins_failed();
            tracing::info!(%ip, username = %req.username, "Failed login");
            return Err(AppError::Unauthorized("Failed to login, invalid credentials".into()));
        }
    };

    let token = state.auth.token(&user.username)?;
    state.metrics.inc_logins_succeeded();
    tracing::debug!(username = %user.username, "Issued token");
    Ok((StatusCode::OK, token))
}

/// `GET /user/me`: the identity resolved by the auth middleware.
pub async fn me(Extension(user): Extension<UserInfo>) -> Json<UserInfo> {
    Json(user)
}
