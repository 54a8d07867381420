//! Terminal client entry point.

use clap::Parser;
use infinicraft_app::{Driver, Flow, HttpCraftService, Shell};
use infinicraft_core::profile::{FileProfileStore, MemoryProfileStore};
use infinicraft_core::{ClientConfig, ProfileStore, Session};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Parser)]
#[command(name = "infinicraft", version, about = "Combine elements to discover new ones")]
struct Cli {
    /// Base URL of the combination service.
    #[arg(long, env = "INFINICRAFT_URL")]
    url: Option<String>,
    /// Play as this user (saved to the profile).
    #[arg(long, env = "INFINICRAFT_USER")]
    user: Option<String>,
    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn profile_store() -> Box<dyn ProfileStore> {
    match FileProfileStore::default_location() {
        Ok(store) => {
            log::info!("Profile stored at {}", store.path().display());
            Box::new(store)
        }
        Err(e) => {
            log::warn!("Profile directory unavailable, username will not persist: {}", e);
            Box::new(MemoryProfileStore::new())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_json_file(path)?,
        None => ClientConfig::default(),
    };
    if let Some(url) = cli.url {
        config.base_url = url;
    }

    let profile = profile_store();
    if let Some(name) = &cli.user {
        profile.save_username(name)?;
    }
    let user = profile.user_id();
    log::info!("Starting Infinicraft as {} against {}", user, config.base_url);

    let service = Arc::new(HttpCraftService::new(config.base_url.clone()));
    let driver = Driver::new(Session::new(user, config), service);
    let mut shell = Shell::new(driver, profile);
    shell.start().await;

    let mut stdout = tokio::io::stdout();
    let (_, banner) = shell.run_line("ws").await;
    stdout.write_all(banner.as_bytes()).await?;
    stdout.write_all(b"Type `help` for commands.\n").await?;
    stdout.flush().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let (flow, out) = shell.run_line(&line).await;
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
        if flow == Flow::Quit {
            break;
        }
    }
    Ok(())
}
