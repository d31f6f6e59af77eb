use async_trait::async_trait;

use super::{constant_time_eq, AuthError, AuthenticationProvider, TokenIssuer, UserInfo};

/// Authenticates against a single username/password pair from the config.
pub struct BasicAuthenticationProvider {
    username: String,
    password: String,
    tokens: TokenIssuer,
}

impl BasicAuthenticationProvider {
    pub fn new(username: String, password: String, tokens: TokenIssuer) -> Self {
        Self { username, password, tokens }
    }
}

#[async_trait]
impl AuthenticationProvider for BasicAuthenticationProvider {
    async fn init(&self) -> Result<(), AuthError> {
        if self.username.is_empty() {
            tracing::warn!("Basic authentication configured with an empty username");
        }
        Ok(())
    }

    async fn user_info_if_credentials_are_correct(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserInfo>, AuthError> {
        // Evaluate both so a wrong username costs the same as a wrong password.
        let user_ok = constant_time_eq(username.as_bytes(), self.username.as_bytes());
        let pass_ok = constant_time_eq(password.as_bytes(), self.password.as_bytes());
        if user_ok & pass_ok {
            Ok(Some(UserInfo { username: username.to_string() }))
        } else {
            Ok(None)
        }
    }

    fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }
}
