//! Bearer token sources for the Blob service.

use std::sync::Arc;

#[cfg(feature = "config")]
use clap::Args;
use jiff::{SignedDuration, Timestamp};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use url::Url;

use super::TRACING_TARGET;
use crate::error::{Error, ErrorKind, Result};

/// OAuth scope granting access to Azure Storage data planes.
pub const STORAGE_SCOPE: &str = "https://storage.azure.com/.default";

/// Default Microsoft Entra ID authority.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Tokens closer than this to expiry are refreshed.
const REFRESH_MARGIN: SignedDuration = SignedDuration::from_mins(5);

/// Bearer token with its expiry.
#[derive(Clone)]
pub struct AccessToken {
    secret: String,
    expires_at: Timestamp,
}

impl AccessToken {
    /// Creates a token expiring at `expires_at`.
    pub fn new(secret: impl Into<String>, expires_at: Timestamp) -> Self {
        Self {
            secret: secret.into(),
            expires_at,
        }
    }

    /// Raw bearer token.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Token expiry.
    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    /// Whether the token remains usable past the refresh margin at `now`.
    pub fn is_fresh_at(&self, now: Timestamp) -> bool {
        now.checked_add(REFRESH_MARGIN)
            .map(|deadline| deadline < self.expires_at)
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Source of bearer tokens for a scope.
#[async_trait::async_trait]
pub trait TokenCredential: Send + Sync {
    /// Returns a token valid for `scope`.
    async fn get_token(&self, scope: &str) -> Result<AccessToken>;
}

/// Pre-acquired bearer token, e.g. from `az account get-access-token`.
#[derive(Debug, Clone)]
pub struct StaticTokenCredential {
    token: AccessToken,
}

impl StaticTokenCredential {
    /// Wraps a raw bearer token that never expires locally.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(secret, Timestamp::MAX),
        }
    }
}

#[async_trait::async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn get_token(&self, _scope: &str) -> Result<AccessToken> {
        Ok(self.token.clone())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Service principal credential using the OAuth client-credentials grant.
///
/// Tokens are cached per scope and refreshed shortly before expiry.
pub struct ClientSecretCredential {
    http: reqwest::Client,
    token_url: Url,
    client_id: String,
    client_secret: String,
    cache: Mutex<Option<(String, AccessToken)>>,
}

impl ClientSecretCredential {
    /// Creates a credential for `tenant_id` at `authority_host`.
    pub fn new(
        http: reqwest::Client,
        authority_host: &str,
        tenant_id: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self> {
        let mut token_url = Url::parse(authority_host)?;
        token_url
            .path_segments_mut()
            .map_err(|_| {
                Error::configuration().with_message(format!("invalid authority: {authority_host}"))
            })?
            .pop_if_empty()
            .extend([tenant_id, "oauth2", "v2.0", "token"]);

        Ok(Self {
            http,
            token_url,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            cache: Mutex::new(None),
        })
    }

    /// Token endpoint used by this credential.
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    async fn request_token(&self, scope: &str) -> Result<AccessToken> {
        tracing::debug!(
            target: TRACING_TARGET,
            token_url = %self.token_url,
            scope,
            "Requesting access token"
        );

        let response = self
            .http
            .post(self.token_url.clone())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", scope),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let kind = match status {
                StatusCode::TOO_MANY_REQUESTS => ErrorKind::ServiceUnavailable,
                s if s.is_server_error() => ErrorKind::ServiceUnavailable,
                _ => ErrorKind::Authentication,
            };
            let body = response.text().await.unwrap_or_default();
            return Err(Error::new(kind)
                .with_message(format!("token request returned {status}"))
                .with_context(body));
        }

        let body: TokenResponse = response.json().await?;
        let expires_at = Timestamp::now()
            .checked_add(SignedDuration::from_secs(body.expires_in))
            .map_err(|e| {
                Error::serialization()
                    .with_message("token expiry out of range")
                    .with_source(e)
            })?;

        Ok(AccessToken::new(body.access_token, expires_at))
    }
}

impl std::fmt::Debug for ClientSecretCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecretCredential")
            .field("token_url", &self.token_url.as_str())
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken> {
        let mut cache = self.cache.lock().await;
        if let Some((cached_scope, token)) = cache.as_ref()
            && cached_scope == scope
            && token.is_fresh_at(Timestamp::now())
        {
            return Ok(token.clone());
        }

        let token = self.request_token(scope).await?;
        *cache = Some((scope.to_owned(), token.clone()));
        Ok(token)
    }
}

/// Credential selection for the Blob service.
///
/// A static access token wins over service principal settings.
#[derive(Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct CredentialConfig {
    /// Pre-acquired bearer token for Azure Storage
    #[cfg_attr(
        feature = "config",
        arg(long = "access-token", env = "FERRY_ACCESS_TOKEN", hide_env_values = true)
    )]
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,

    /// Microsoft Entra tenant of the service principal
    #[cfg_attr(feature = "config", arg(long = "tenant-id", env = "AZURE_TENANT_ID"))]
    #[serde(default)]
    pub tenant_id: Option<String>,

    /// Application (client) id of the service principal
    #[cfg_attr(feature = "config", arg(long = "client-id", env = "AZURE_CLIENT_ID"))]
    #[serde(default)]
    pub client_id: Option<String>,

    /// Client secret of the service principal
    #[cfg_attr(
        feature = "config",
        arg(long = "client-secret", env = "AZURE_CLIENT_SECRET", hide_env_values = true)
    )]
    #[serde(default, skip_serializing)]
    pub client_secret: Option<String>,

    /// Authority host for token requests
    #[cfg_attr(
        feature = "config",
        arg(
            long = "authority-host",
            env = "AZURE_AUTHORITY_HOST",
            default_value = DEFAULT_AUTHORITY_HOST
        )
    )]
    #[serde(default = "default_authority_host")]
    pub authority_host: String,
}

fn default_authority_host() -> String {
    DEFAULT_AUTHORITY_HOST.to_owned()
}

impl CredentialConfig {
    /// Uses a pre-acquired bearer token.
    pub fn with_access_token(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
            authority_host: default_authority_host(),
            ..Self::default()
        }
    }

    /// Builds the configured credential.
    pub fn build(&self, http: reqwest::Client) -> Result<Arc<dyn TokenCredential>> {
        if let Some(token) = self.access_token.as_deref().filter(|t| !t.is_empty()) {
            return Ok(Arc::new(StaticTokenCredential::new(token)));
        }

        match (&self.tenant_id, &self.client_id, &self.client_secret) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => {
                let authority = if self.authority_host.is_empty() {
                    DEFAULT_AUTHORITY_HOST
                } else {
                    &self.authority_host
                };
                Ok(Arc::new(ClientSecretCredential::new(
                    http,
                    authority,
                    tenant_id,
                    client_id.clone(),
                    client_secret.clone(),
                )?))
            }
            _ => Err(Error::configuration().with_message(
                "no credential configured: set an access token or tenant, client id and client secret",
            )),
        }
    }
}

impl std::fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("authority_host", &self.authority_host)
            .finish()
    }
}
