//! Storage credential lifecycle: load, grant or refresh, then persist.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{Error, Result};

/// Tokens are treated as expired this long before their stated expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Persisted authorization material for the storage account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// `None` means the provider gave no expiry; such tokens never count as expired.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub client_id: String,
    pub client_secret: String,
    pub token_uri: String,
}

impl Credential {
    /// Returns true if the access token is expired (or about to be) at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|at| at <= now + TimeDelta::seconds(EXPIRY_SKEW_SECS))
    }

    /// Loads a credential from `path`.
    ///
    /// Returns `Ok(None)` if the file does not exist or holds no usable
    /// credential material.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<Self>(&contents) {
            Ok(cred) if !cred.access_token.is_empty() => Ok(Some(cred)),
            Ok(_) => Ok(None),
            Err(e) => {
                log::warn!("Ignoring unreadable credential file {}: {e}", path.display());
                Ok(None)
            }
        }
    }

    /// Saves the credential to `path` atomically (write tmp + rename).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&tmp_path, json)?;

        // Tokens grant account access
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
        }

        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

/// How the returned credential was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from disk and still valid.
    Stored,
    /// Obtained through the interactive consent flow.
    Interactive,
    /// Loaded from disk and refreshed.
    Refreshed,
}

/// Result of [`StorageAuthenticator::authenticate`].
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub credential: Credential,
    pub source: CredentialSource,
}

/// The provider-specific halves of the credential lifecycle.
///
/// Swappable so headless runs and tests never open a browser.
#[async_trait]
pub trait OAuthFlow: Send + Sync {
    /// Runs the interactive consent flow. Blocks on the user.
    async fn interactive_grant(&self) -> Result<Credential>;

    /// Exchanges refresh material for a fresh access token.
    async fn refresh(&self, credential: &Credential) -> Result<Credential>;
}

/// Produces an authenticated storage credential, persisting it for next time.
pub struct StorageAuthenticator<F: OAuthFlow> {
    flow: F,
    credential_path: PathBuf,
}

impl<F: OAuthFlow> StorageAuthenticator<F> {
    pub fn new(flow: F, credential_path: impl Into<PathBuf>) -> Self {
        Self {
            flow,
            credential_path: credential_path.into(),
        }
    }

    #[must_use]
    pub fn credential_path(&self) -> &Path {
        &self.credential_path
    }

    /// Loads, grants or refreshes the credential, then writes it back to disk.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the credential path is empty, a directory, or
    ///   inside a directory that does not exist.
    /// - [`Error::Auth`] if an expired credential has no refresh token.
    /// - Whatever the flow returns for grant or refresh failures.
    pub async fn authenticate(&self) -> Result<Authenticated> {
        self.check_path()?;

        let (credential, source) = match Credential::load(&self.credential_path)? {
            None => {
                log::info!("No stored storage credential, starting interactive authorization");
                (self.flow.interactive_grant().await?, CredentialSource::Interactive)
            }
            Some(stored) if stored.is_expired(Utc::now()) => {
                if stored.refresh_token.is_none() {
                    return Err(Error::Auth(
                        "stored credential expired and has no refresh token".to_string(),
                    ));
                }
                log::info!("Storage credential expired, refreshing");
                (self.flow.refresh(&stored).await?, CredentialSource::Refreshed)
            }
            Some(stored) => (stored, CredentialSource::Stored),
        };

        credential.save(&self.credential_path)?;
        log::debug!("Saved storage credential to {}", self.credential_path.display());

        Ok(Authenticated { credential, source })
    }

    fn check_path(&self) -> Result<()> {
        let path = &self.credential_path;
        if path.as_os_str().is_empty() {
            return Err(Error::Config("credential path is empty".to_string()));
        }
        if path.is_dir() {
            return Err(Error::Config(format!(
                "credential path {} is a directory",
                path.display()
            )));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
            && !parent.is_dir()
        {
            return Err(Error::Config(format!(
                "credential directory {} does not exist",
                parent.display()
            )));
        }
        Ok(())
    }
}

impl<F: OAuthFlow> StorageAuthenticator<F> {
    /// Hands the flow over to a [`TokenSource`] that keeps `credential` fresh.
    #[must_use]
    pub fn into_token_source(self, credential: Credential) -> TokenSource<F> {
        TokenSource::new(self.flow, credential, self.credential_path)
    }
}

struct TokenState<F> {
    flow: F,
    credential: Mutex<Credential>,
    credential_path: PathBuf,
}

/// Shared access token provider for storage requests.
///
/// Refreshes the credential once it is expired and persists the renewed
/// credential, so runs outliving a single access token keep working.
pub struct TokenSource<F> {
    state: Arc<TokenState<F>>,
}

impl<F> Clone for TokenSource<F> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<F: OAuthFlow> TokenSource<F> {
    pub fn new(flow: F, credential: Credential, credential_path: impl Into<PathBuf>) -> Self {
        Self {
            state: Arc::new(TokenState {
                flow,
                credential: Mutex::new(credential),
                credential_path: credential_path.into(),
            }),
        }
    }

    /// Returns a currently valid access token, refreshing first if needed.
    ///
    /// # Errors
    ///
    /// - [`Error::Auth`] if the token expired and there is no refresh token.
    /// - Whatever the flow returns for refresh failures.
    /// - An I/O error if the renewed credential cannot be persisted.
    pub async fn access_token(&self) -> Result<String> {
        let mut credential = self.state.credential.lock().await;
        if credential.is_expired(Utc::now()) {
            if credential.refresh_token.is_none() {
                return Err(Error::Auth(
                    "access token expired and there is no refresh token".to_string(),
                ));
            }
            log::info!("Storage access token expired, refreshing");
            let renewed = self.state.flow.refresh(&credential).await?;
            renewed.save(&self.state.credential_path)?;
            *credential = renewed;
        }
        Ok(credential.access_token.clone())
    }

    /// Snapshot of the credential currently in use.
    pub async fn credential(&self) -> Credential {
        self.state.credential.lock().await.clone()
    }
}
