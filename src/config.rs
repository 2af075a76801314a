//! Configuration types, sourced from the environment.

use std::fmt;
use std::path::PathBuf;

use crate::checkpoint::Checkpoint;
use crate::error::{Error, Result};
use crate::resolver::GroupReference;

/// What the pipeline does when a single item fails to transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the whole run at the first failure.
    #[default]
    Abort,
    /// Record the failure, keep going, and report it at the end.
    Continue,
}

/// Configuration for the transfer pipeline.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Directory downloaded files are written to. Never cleaned up.
    pub download_dir: PathBuf,
    pub failure_policy: FailurePolicy,
    /// Ledger of transferred messages. `None` re-transfers everything.
    pub checkpoint: Option<PathBuf>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("downloads"),
            failure_policy: FailurePolicy::Abort,
            checkpoint: None,
        }
    }
}

impl TransferConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the local download directory.
    #[must_use]
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    /// Sets the per-item failure policy.
    #[must_use]
    pub const fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Enables the checkpoint ledger at `path`.
    #[must_use]
    pub fn with_checkpoint(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint = Some(path.into());
        self
    }
}

/// Messaging platform credentials and session location.
#[derive(Clone)]
pub struct TelegramConfig {
    pub api_id: i32,
    pub api_hash: String,
    pub session_path: PathBuf,
    /// Phone number for first login; prompted for if absent.
    pub phone: Option<String>,
    /// Two-step verification password; prompted for if absent and required.
    pub password: Option<String>,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_id", &self.api_id)
            .field("api_hash", &"<redacted>")
            .field("session_path", &self.session_path)
            .field("phone", &self.phone.as_ref().map(|_| "<redacted>"))
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Storage account settings.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// Where the OAuth credential is persisted.
    pub credential_path: PathBuf,
    /// Client registration used by the interactive consent flow.
    pub client_secrets_path: PathBuf,
    /// Destination folder. `None` uploads to the account root.
    pub folder_id: Option<String>,
    /// Loopback port the consent redirect lands on.
    pub oauth_port: u16,
}

/// Complete application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub group: GroupReference,
    pub drive: DriveConfig,
    pub transfer: TransferConfig,
}

const DEFAULT_SESSION_PATH: &str = "session_name.session";
const DEFAULT_CLIENT_SECRETS: &str = "client_secrets.json";
const DEFAULT_OAUTH_PORT: u16 = 8080;

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

impl AppConfig {
    /// Loads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| Error::Config(format!("{key} environment variable not set")))
        };

        let api_id = require("TELEGRAM_API_ID")?;
        let api_id = api_id
            .trim()
            .parse::<i32>()
            .map_err(|e| Error::Config(format!("TELEGRAM_API_ID {api_id:?} is not a number: {e}")))?;

        let telegram = TelegramConfig {
            api_id,
            api_hash: require("TELEGRAM_API_HASH")?,
            session_path: get("TELEGRAM_SESSION_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_SESSION_PATH), PathBuf::from),
            phone: get("TELEGRAM_PHONE"),
            password: get("TELEGRAM_PASSWORD"),
        };

        let group = GroupReference::new(require("TELEGRAM_GROUP_INVITE_LINK")?);

        let oauth_port = match get("TGDRIVE_OAUTH_PORT") {
            Some(port) => port
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("TGDRIVE_OAUTH_PORT {port:?}: {e}")))?,
            None => DEFAULT_OAUTH_PORT,
        };
        let drive = DriveConfig {
            credential_path: PathBuf::from(require("GOOGLE_AUTH_PATH")?),
            client_secrets_path: get("GOOGLE_CLIENT_SECRETS_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_CLIENT_SECRETS), PathBuf::from),
            folder_id: get("GOOGLE_DRIVE_FOLDER_ID").map(|id| id.trim().to_string()),
            oauth_port,
        };

        let mut transfer = TransferConfig::new();
        if let Some(dir) = get("TGDRIVE_DOWNLOAD_DIR") {
            transfer = transfer.with_download_dir(dir);
        }
        if let Some(flag) = get("TGDRIVE_CONTINUE_ON_ERROR") {
            match parse_flag(&flag) {
                Some(true) => transfer = transfer.with_failure_policy(FailurePolicy::Continue),
                Some(false) => {}
                None => {
                    return Err(Error::Config(format!(
                        "TGDRIVE_CONTINUE_ON_ERROR {flag:?} is not a boolean"
                    )));
                }
            }
        }
        if let Some(checkpoint) = get("TGDRIVE_CHECKPOINT") {
            match parse_flag(&checkpoint) {
                Some(true) => transfer = transfer.with_checkpoint(Checkpoint::default_path()),
                Some(false) => {}
                None => transfer = transfer.with_checkpoint(checkpoint),
            }
        }

        Ok(Self {
            telegram,
            group,
            drive,
            transfer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("TELEGRAM_API_ID", "12345"),
        ("TELEGRAM_API_HASH", "0123abcd"),
        ("TELEGRAM_GROUP_INVITE_LINK", "https://t.me/+abc"),
        ("GOOGLE_AUTH_PATH", "creds.json"),
    ];

    fn load(extra: &[(&str, &str)]) -> Result<AppConfig> {
        let pairs: Vec<(&str, &str)> = REQUIRED.iter().chain(extra).copied().collect();
        AppConfig::from_lookup(env(&pairs))
    }

    #[test]
    fn defaults_with_required_only() {
        let config = load(&[]).unwrap();
        assert_eq!(config.telegram.api_id, 12345);
        assert_eq!(config.telegram.session_path, PathBuf::from("session_name.session"));
        assert_eq!(config.group.as_str(), "https://t.me/+abc");
        assert_eq!(config.drive.credential_path, PathBuf::from("creds.json"));
        assert_eq!(config.drive.client_secrets_path, PathBuf::from("client_secrets.json"));
        assert_eq!(config.drive.folder_id, None);
        assert_eq!(config.drive.oauth_port, 8080);
        assert_eq!(config.transfer.download_dir, PathBuf::from("downloads"));
        assert_eq!(config.transfer.failure_policy, FailurePolicy::Abort);
        assert_eq!(config.transfer.checkpoint, None);
    }

    #[test]
    fn missing_required_is_config_error() {
        for (missing, _) in REQUIRED {
            let refs: Vec<(&str, &str)> = REQUIRED
                .iter()
                .filter(|(k, _)| k != missing)
                .copied()
                .collect();
            let err = AppConfig::from_lookup(env(&refs)).unwrap_err();
            assert!(matches!(err, Error::Config(ref msg) if msg.contains(*missing)), "{err}");
        }
    }

    #[test]
    fn bad_api_id_is_config_error() {
        let err = load(&[("TELEGRAM_API_ID", "abc")]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn empty_folder_means_root() {
        let config = load(&[("GOOGLE_DRIVE_FOLDER_ID", "  ")]).unwrap();
        assert_eq!(config.drive.folder_id, None);
        let config = load(&[("GOOGLE_DRIVE_FOLDER_ID", "F1")]).unwrap();
        assert_eq!(config.drive.folder_id.as_deref(), Some("F1"));
    }

    #[test]
    fn optional_transfer_settings() {
        let config = load(&[
            ("TGDRIVE_DOWNLOAD_DIR", "/tmp/media"),
            ("TGDRIVE_CONTINUE_ON_ERROR", "yes"),
            ("TGDRIVE_CHECKPOINT", "/tmp/ledger.toml"),
            ("TGDRIVE_OAUTH_PORT", "8090"),
        ])
        .unwrap();
        assert_eq!(config.transfer.download_dir, PathBuf::from("/tmp/media"));
        assert_eq!(config.transfer.failure_policy, FailurePolicy::Continue);
        assert_eq!(config.transfer.checkpoint, Some(PathBuf::from("/tmp/ledger.toml")));
        assert_eq!(config.drive.oauth_port, 8090);
    }

    #[test]
    fn checkpoint_flag_uses_default_location() {
        let config = load(&[("TGDRIVE_CHECKPOINT", "true")]).unwrap();
        assert_eq!(config.transfer.checkpoint, Some(Checkpoint::default_path()));
        let config = load(&[("TGDRIVE_CHECKPOINT", "off")]).unwrap();
        assert_eq!(config.transfer.checkpoint, None);
    }

    #[test]
    fn bad_flag_is_config_error() {
        assert!(matches!(
            load(&[("TGDRIVE_CONTINUE_ON_ERROR", "maybe")]),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = load(&[("TELEGRAM_PASSWORD", "hunter2")]).unwrap();
        let rendered = format!("{:?}", config.telegram);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("0123abcd"));
    }

    #[test]
    fn transfer_config_builder_pattern() {
        let config = TransferConfig::new()
            .with_download_dir("out")
            .with_failure_policy(FailurePolicy::Continue)
            .with_checkpoint("ledger.toml");
        assert_eq!(config.download_dir, PathBuf::from("out"));
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
        assert_eq!(config.checkpoint, Some(PathBuf::from("ledger.toml")));
    }
}
