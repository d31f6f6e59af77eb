use async_trait::async_trait;
use ldap3::{ldap_escape, LdapConnAsync, Scope, SearchEntry};

use super::{AuthError, AuthenticationProvider, TokenIssuer, UserInfo};
use crate::config::LdapConfig;

/// LDAP result code for a rejected bind.
const LDAP_INVALID_CREDENTIALS: u32 = 49;

/// The directory operations the LDAP provider needs.
#[async_trait]
pub trait LdapClient: Send + Sync {
    /// Binds as `bind_dn` and returns the DN of the single entry matching
    /// `filter` under `base`, or `None` when there is no unique match.
    async fn find_user_dn(
        &self,
        bind_dn: &str,
        bind_password: &str,
        base: &str,
        filter: &str,
    ) -> Result<Option<String>, AuthError>;

    /// Attempts a simple bind. `Ok(false)` means the directory rejected the password.
    async fn check_password(&self, dn: &str, password: &str) -> Result<bool, AuthError>;
}

fn backend(e: ldap3::LdapError) -> AuthError {
    AuthError::Backend(e.to_string())
}

/// `ldap3` backed client; a fresh connection is opened per operation.
pub struct Ldap3Client {
    url: String,
}

impl Ldap3Client {
    pub fn new(cfg: &LdapConfig) -> Self {
        let scheme = if cfg.use_ssl { "ldaps" } else { "ldap" };
        Self { url: format!("{}://{}:{}", scheme, cfg.host, cfg.port) }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LdapClient for Ldap3Client {
    async fn find_user_dn(
        &self,
        bind_dn: &str,
        bind_password: &str,
        base: &str,
        filter: &str,
    ) -> Result<Option<String>, AuthError> {
        let (conn, mut ldap) = LdapConnAsync::new(&self.url).await.map_err(backend)?;
        ldap3::drive!(conn);

        ldap.simple_bind(bind_dn, bind_password).await.map_err(backend)?.success().map_err(backend)?;
        let (entries, _) = ldap
            .search(base, Scope::Subtree, filter, vec!["dn"])
            .await
            .map_err(backend)?
            .success()
            .map_err(backend)?;
        let _ = ldap.unbind().await;

        if entries.len() != 1 {
            tracing::debug!(count = entries.len(), filter, "LDAP user search did not return a unique entry");
            return Ok(None);
        }
        Ok(entries.into_iter().next().map(|e| SearchEntry::construct(e).dn))
    }

    async fn check_password(&self, dn: &str, password: &str) -> Result<bool, AuthError> {
        let (conn, mut ldap) = LdapConnAsync::new(&self.url).await.map_err(backend)?;
        ldap3::drive!(conn);

        let res = ldap.simple_bind(dn, password).await.map_err(backend)?;
        let _ = ldap.unbind().await;
        match res.rc {
            0 => Ok(true),
            LDAP_INVALID_CREDENTIALS => Ok(false),
            rc => Err(AuthError::Backend(format!("bind failed with result code {}: {}", rc, res.text))),
        }
    }
}

/// Authenticates users against an LDAP directory: bind as the service
/// account, look the user up with `user_filter`, then bind as the user.
pub struct LdapAuthenticationProvider<C: LdapClient> {
    config: LdapConfig,
    client: C,
    tokens: TokenIssuer,
}

impl<C: LdapClient> LdapAuthenticationProvider<C> {
    pub fn new(config: LdapConfig, client: C, tokens: TokenIssuer) -> Self {
        Self { config, client, tokens }
    }
}

#[async_trait]
impl<C: LdapClient> AuthenticationProvider for LdapAuthenticationProvider<C> {
    async fn init(&self) -> Result<(), AuthError> {
        if self.client.check_password(&self.config.bind_dn, &self.config.bind_password).await? {
            Ok(())
        } else {
            Err(AuthError::Backend(format!("the directory rejected the bind as {}", self.config.bind_dn)))
        }
    }

    async fn user_info_if_credentials_are_correct(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserInfo>, AuthError> {
        // An empty password would be an unauthenticated bind, which most directories accept.
        if username.is_empty() || password.is_empty() {
            return Ok(None);
        }

        let filter = self.config.user_filter.replace("%s", &ldap_escape(username));
        let Some(dn) = self
            .client
            .find_user_dn(&self.config.bind_dn, &self.config.bind_password, &self.config.base, &filter)
            .await?
        else {
            return Ok(None);
        };

        if self.client.check_password(&dn, password).await? {
            Ok(Some(UserInfo { username: username.to_string() }))
        } else {
            Ok(None)
        }
    }

    fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }
}
