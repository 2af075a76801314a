//! tgdrive - copy every photo, video and document posted in a Telegram group
//! into Google Drive.
//!
//! The pipeline is abstracted from the concrete platforms: it drives any
//! [`MessagingClient`] and any [`RemoteStore`]. The grammers-based Telegram
//! adapter and the Google Drive store are the production implementations.
//!
//! # Example
//!
//! ```no_run
//! use tgdrive::{
//!     AppConfig, DriveStore, GoogleOAuth, NoProgress, Pipeline, SessionManager,
//!     StorageAuthenticator, TelegramConnector, Uploader, resolve,
//! };
//!
//! # async fn example() -> tgdrive::Result<()> {
//! let config = AppConfig::from_env()?;
//!
//! // Obtain a Drive credential (stored, refreshed or freshly granted)
//! let flow = GoogleOAuth::new(&config.drive.client_secrets_path, 8080);
//! let authenticator = StorageAuthenticator::new(flow, &config.drive.credential_path);
//! let auth = authenticator.authenticate().await?;
//! // Expired access tokens are refreshed and persisted as uploads run
//! let store = DriveStore::new(authenticator.into_token_source(auth.credential))?;
//!
//! // Connect to Telegram and resolve the group
//! let mut session = SessionManager::new(TelegramConnector::new(config.telegram.clone()));
//! let client = session.connect().await?;
//! let group = resolve(client, &config.group).await?;
//!
//! // Photos, then videos, then documents
//! let uploader = Uploader::new(config.drive.folder_id.clone());
//! let report = Pipeline::new(client, uploader, config.transfer.clone())
//!     .run(&group, &store, &NoProgress)
//!     .await?;
//! println!("Transferred {} item(s)", report.stats.transferred());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod checkpoint;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod fs;
pub mod media;
pub mod messaging;
pub mod pipeline;
pub mod resolver;
pub mod session;
pub mod stats;
pub mod storage;
pub mod telegram;
pub mod upload;

// Re-export main types for convenience
pub use checkpoint::Checkpoint;
pub use config::{AppConfig, DriveConfig, FailurePolicy, TelegramConfig, TransferConfig};
pub use error::{Error, Result, TransferStage};
pub use format::{format_bytes, format_duration};
pub use fs::{FileSystem, TokioFileSystem};
pub use media::{GroupInfo, GroupKind, MediaKind, MediaMessage};
pub use messaging::{MessageCursor, MessagingClient, ResolvedEntity};
pub use pipeline::{
    NoProgress, Pipeline, TransferFailure, TransferOutcome, TransferProgress, TransferReport,
};
pub use resolver::{GroupReference, ReferenceKind, resolve};
pub use session::{Connector, SessionManager};
pub use stats::{PassStats, TransferStats};
pub use storage::{
    Credential, DriveStore, GoogleOAuth, ObjectMetadata, RemoteObject, RemoteStore,
    StorageAuthenticator, TokenSource,
};
pub use telegram::TelegramConnector;
pub use upload::Uploader;
