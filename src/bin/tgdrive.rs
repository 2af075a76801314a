//! tgdrive CLI - copy a Telegram group's media into Google Drive.

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::env;

use tgdrive::AppConfig;

fn print_usage() {
    eprintln!("Usage: tgdrive [OPTIONS]");
    eprintln!();
    eprintln!("Copies every photo, video and document posted in a Telegram group");
    eprintln!("into Google Drive, one pass per media kind.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -h, --help                   Show this help");
    eprintln!();
    eprintln!("Environment (also read from .env):");
    eprintln!("  TELEGRAM_API_ID              Telegram API id (required)");
    eprintln!("  TELEGRAM_API_HASH            Telegram API hash (required)");
    eprintln!("  TELEGRAM_GROUP_INVITE_LINK   Invite link or @username of the group (required)");
    eprintln!("  GOOGLE_AUTH_PATH             Where the Drive credential is stored (required)");
    eprintln!("  GOOGLE_CLIENT_SECRETS_PATH   OAuth client secrets (default: client_secrets.json)");
    eprintln!("  GOOGLE_DRIVE_FOLDER_ID       Destination folder (default: Drive root)");
    eprintln!("  TELEGRAM_SESSION_PATH        Session file (default: session_name.session)");
    eprintln!("  TELEGRAM_PHONE               Phone number for first login");
    eprintln!("  TELEGRAM_PASSWORD            Two-step verification password");
    eprintln!("  TGDRIVE_DOWNLOAD_DIR         Local download directory (default: downloads)");
    eprintln!("  TGDRIVE_CONTINUE_ON_ERROR    Keep going after a failed item (default: false)");
    eprintln!("  TGDRIVE_CHECKPOINT           Skip already-transferred messages (true or a path)");
    eprintln!("  TGDRIVE_OAUTH_PORT           Loopback port for Drive consent (default: 8080)");
    eprintln!("  RUST_LOG                     Log filter (default: info)");
}

#[tokio::main]
async fn main() -> tgdrive::Result<()> {
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(2);
            }
        }
    }

    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("Warning: could not load .env: {e}");
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    log::debug!("Loaded configuration: {config:?}");

    #[cfg(feature = "cli")]
    {
        tgdrive::cli::run(config).await
    }
    #[cfg(not(feature = "cli"))]
    {
        let _ = config;
        eprintln!("CLI support not compiled in");
        std::process::exit(1);
    }
}
