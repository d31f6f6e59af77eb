use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::auth::{constant_time_eq, parse_authorization, AuthError, Credentials, UserInfo};
use crate::error::AppError;
use crate::state::AppState;

fn authorization_header(req: &Request) -> Option<&str> {
    req.headers().get(header::AUTHORIZATION).and_then(|h| h.to_str().ok())
}

/// Gate for user endpoints: accepts `Basic` credentials checked by the
/// configured provider or a `Bearer` token it issued. The authenticated
/// user is stored as a request extension.
pub async fn require_user(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, AppError> {
    let user = match parse_authorization(authorization_header(&req))? {
        Credentials::Basic { username, password } => state
            .auth
            .user_info_if_credentials_are_correct(&username, &password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?,
        Credentials::Bearer(token) => UserInfo { username: state.auth.validate_token(&token)?.sub },
    };
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Gate for agent endpoints: `Basic` credentials matching the data service
/// agent account.
pub async fn require_agent(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, AppError> {
    match parse_authorization(authorization_header(&req))? {
        Credentials::Basic { username, password } => {
            let cfg = &state.config.data_service;
            let user_ok = constant_time_eq(username.as_bytes(), cfg.agent_username.as_bytes());
            let pass_ok = constant_time_eq(password.as_bytes(), cfg.agent_password.as_bytes());
            if !(user_ok & pass_ok) {
                return Err(AuthError::InvalidCredentials.into());
            }
        }
        Credentials::Bearer(_) => return Err(AuthError::UnsupportedScheme.into()),
    }
    Ok(next.run(req).await)
}
