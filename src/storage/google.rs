//! Google OAuth 2.0 installed-app flow and Google Drive v3 uploads.
//!
//! Both sides sit on the google-apis stack: consent and refresh go through
//! `yup_oauth2`, uploads through `google_drive3`'s resumable protocol.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use google_drive3 as drive3;

use drive3::common::GetToken;
use drive3::hyper_rustls::HttpsConnector;
use drive3::hyper_util::client::legacy::connect::HttpConnector;
use drive3::yup_oauth2::storage::{TokenInfo, TokenStorage};
use drive3::yup_oauth2::{self, ApplicationSecret, InstalledFlowAuthenticator, InstalledFlowReturnMethod};

use super::auth::{Credential, OAuthFlow, TokenSource};
use super::{ObjectMetadata, RemoteObject, RemoteStore};
use crate::error::{Error, Result};

const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Connector shared by the OAuth and Drive clients.
pub type DriveConnector = HttpsConnector<HttpConnector>;

/// Builds the TLS connector used for OAuth and Drive requests.
///
/// Plain `http` is accepted so endpoints can be pointed at a local server.
///
/// # Errors
///
/// Returns an error if the native root certificates cannot be loaded.
pub fn https_connector() -> Result<DriveConnector> {
    Ok(drive3::hyper_rustls::HttpsConnectorBuilder::new()
        .with_native_roots()?
        .https_or_http()
        .enable_http1()
        .build())
}

fn auth_err(e: impl std::fmt::Display) -> Error {
    Error::Auth(e.to_string())
}

/// Reads a `client_secrets.json` document (`installed` or `web` section).
///
/// # Errors
///
/// Returns [`Error::Config`] if the file is missing or malformed.
pub async fn read_client_secrets(path: &Path) -> Result<ApplicationSecret> {
    yup_oauth2::read_application_secret(path)
        .await
        .map_err(|e| Error::Config(format!("cannot read client secrets {}: {e}", path.display())))
}

/// Token storage handed to `yup_oauth2` so the issued token can be read back.
#[derive(Clone, Default)]
struct CapturedToken(Arc<Mutex<Option<TokenInfo>>>);

impl CapturedToken {
    fn seeded(token: TokenInfo) -> Self {
        Self(Arc::new(Mutex::new(Some(token))))
    }

    fn take(&self) -> Option<TokenInfo> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

#[async_trait]
impl TokenStorage for CapturedToken {
    async fn set(&self, _scopes: &[&str], token: TokenInfo) -> anyhow::Result<()> {
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(token);
        }
        Ok(())
    }

    async fn get(&self, _scopes: &[&str]) -> Option<TokenInfo> {
        self.0.lock().ok().and_then(|slot| slot.clone())
    }
}

/// Builds a credential, keeping `previous_refresh` if the provider sent none.
fn credential_from_token(
    token: TokenInfo,
    secret: &ApplicationSecret,
    previous_refresh: Option<&str>,
) -> Result<Credential> {
    let access_token = token
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::Auth("token endpoint returned no access token".to_string()))?;
    Ok(Credential {
        access_token,
        refresh_token: token
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string)),
        expires_at: token
            .expires_at
            .and_then(|at| DateTime::<Utc>::from_timestamp(at.unix_timestamp(), 0)),
        client_id: secret.client_id.clone(),
        client_secret: secret.client_secret.clone(),
        token_uri: secret.token_uri.clone(),
    })
}

/// Interactive consent through a loopback redirect, plus token refresh.
pub struct GoogleOAuth {
    secrets_path: PathBuf,
    port: u16,
}

impl GoogleOAuth {
    pub fn new(secrets_path: impl Into<PathBuf>, port: u16) -> Self {
        Self {
            secrets_path: secrets_path.into(),
            port,
        }
    }

    /// Runs `yup_oauth2`'s installed flow against `storage` and returns what it stored.
    async fn obtain(&self, secret: ApplicationSecret, storage: CapturedToken) -> Result<TokenInfo> {
        let client = drive3::hyper_util::client::legacy::Client::builder(
            drive3::hyper_util::rt::TokioExecutor::new(),
        )
        .build(https_connector()?);

        let auth = InstalledFlowAuthenticator::with_client(
            secret,
            InstalledFlowReturnMethod::HTTPPortRedirect(self.port),
            client,
        )
        .with_storage(Box::new(storage.clone()))
        .build()
        .await?;

        auth.token(&[DRIVE_SCOPE]).await.map_err(auth_err)?;
        storage
            .take()
            .ok_or_else(|| Error::Auth("authorization produced no token".to_string()))
    }
}

#[async_trait]
impl OAuthFlow for GoogleOAuth {
    async fn interactive_grant(&self) -> Result<Credential> {
        let secret = read_client_secrets(&self.secrets_path).await?;
        log::info!("Waiting for Google Drive consent on port {}", self.port);
        let token = self.obtain(secret.clone(), CapturedToken::default()).await?;
        credential_from_token(token, &secret, None)
    }

    async fn refresh(&self, credential: &Credential) -> Result<Credential> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or_else(|| Error::Auth("no refresh token".to_string()))?;
        let secret = ApplicationSecret {
            client_id: credential.client_id.clone(),
            client_secret: credential.client_secret.clone(),
            token_uri: credential.token_uri.clone(),
            auth_uri: DEFAULT_AUTH_URI.to_string(),
            ..ApplicationSecret::default()
        };
        // An already-expired token makes the authenticator take its refresh path
        let stale = TokenInfo {
            access_token: Some(credential.access_token.clone()),
            refresh_token: Some(refresh_token.to_string()),
            expires_at: Some(time::OffsetDateTime::UNIX_EPOCH),
            id_token: None,
        };
        let token = self.obtain(secret.clone(), CapturedToken::seeded(stale)).await?;
        credential_from_token(token, &secret, Some(refresh_token))
    }
}

impl<F: OAuthFlow + 'static> GetToken for TokenSource<F> {
    fn get_token<'a>(
        &'a self,
        _scopes: &'a [&str],
    ) -> Pin<
        Box<
            dyn Future<Output = std::result::Result<Option<String>, Box<dyn std::error::Error + Send + Sync>>>
                + Send
                + 'a,
        >,
    > {
        Box::pin(async move { Ok(Some(self.access_token().await?)) })
    }
}

/// Authenticated Google Drive handle.
pub struct DriveStore {
    hub: drive3::DriveHub<DriveConnector>,
}

impl DriveStore {
    /// Creates a store whose requests are authorized by `tokens`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS connector cannot be built.
    pub fn new<F: OAuthFlow + 'static>(tokens: TokenSource<F>) -> Result<Self> {
        let client = drive3::hyper_util::client::legacy::Client::builder(
            drive3::hyper_util::rt::TokioExecutor::new(),
        )
        .build(https_connector()?);
        Ok(Self {
            hub: drive3::DriveHub::new(client, tokens),
        })
    }

    /// Points uploads at another API root (must end with `/`).
    #[must_use]
    pub fn with_root_url(mut self, root_url: impl Into<String>) -> Self {
        self.hub.root_url(root_url.into());
        self
    }
}

#[async_trait]
impl RemoteStore for DriveStore {
    async fn create_object(&self, metadata: &ObjectMetadata, source: &Path) -> Result<RemoteObject> {
        let mime: mime::Mime = metadata
            .mime_type
            .parse()
            .map_err(|e| Error::Storage(format!("invalid MIME type {:?}: {e}", metadata.mime_type)))?;
        let request = drive3::api::File {
            name: Some(metadata.name.clone()),
            parents: (!metadata.parents.is_empty()).then(|| metadata.parents.clone()),
            mime_type: Some(metadata.mime_type.clone()),
            ..drive3::api::File::default()
        };
        let reader = std::fs::File::open(source)?;

        let (_response, created) = self
            .hub
            .files()
            .create(request)
            .supports_all_drives(true)
            .param("fields", "id,name")
            .upload_resumable(reader, mime)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;

        let id = created
            .id
            .ok_or_else(|| Error::Storage("created object has no id".to_string()))?;
        log::debug!("Created Drive object {id}");
        Ok(RemoteObject {
            id,
            name: created.name.unwrap_or_else(|| metadata.name.clone()),
        })
    }
}
