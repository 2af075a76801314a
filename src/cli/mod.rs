//! CLI mode: authenticate, connect, resolve, then run the three passes.

mod progress;

pub use progress::{CliProgress, make_pass_spinner, print_group, print_summary};

use crate::checkpoint::Checkpoint;
use crate::config::AppConfig;
use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::resolver::resolve;
use crate::session::SessionManager;
use crate::storage::{CredentialSource, DriveStore, GoogleOAuth, StorageAuthenticator};
use crate::telegram::TelegramConnector;
use crate::upload::Uploader;

/// Runs one full transfer with the given configuration.
///
/// # Errors
///
/// Any authentication, connection, resolution or transfer failure. Under the
/// continue-on-error policy, returns [`crate::Error::Incomplete`] after the
/// summary if any item failed.
pub async fn run(config: AppConfig) -> Result<()> {
    println!("Authenticating with Google Drive...");
    let flow = GoogleOAuth::new(&config.drive.client_secrets_path, config.drive.oauth_port);
    let authenticator = StorageAuthenticator::new(flow, &config.drive.credential_path);
    let authenticated = authenticator.authenticate().await?;
    match authenticated.source {
        CredentialSource::Stored => println!("Using stored Google Drive credential."),
        CredentialSource::Interactive => println!("Google Drive access granted."),
        CredentialSource::Refreshed => println!("Google Drive credential refreshed."),
    }
    let store = DriveStore::new(authenticator.into_token_source(authenticated.credential))?;

    println!("Connecting to Telegram...");
    let mut session = SessionManager::new(TelegramConnector::new(config.telegram.clone()));
    let client = session.connect().await?;
    println!("Connected.");

    println!("Resolving {}...", config.group);
    let group = resolve(client, &config.group).await?;
    print_group(&group);

    let uploader = Uploader::new(config.drive.folder_id.clone());
    let mut pipeline = Pipeline::new(client, uploader, config.transfer.clone());
    if let Some(path) = &config.transfer.checkpoint {
        let checkpoint = Checkpoint::open(path)?;
        println!("Using checkpoint {}", checkpoint.path().display());
        pipeline = pipeline.with_checkpoint(checkpoint);
    }

    println!("Transferring media...");
    let progress = CliProgress::new();
    let report = pipeline.run(&group, &store, &progress).await?;
    print_summary(&report);

    report.into_result().map(|_| ())
}
