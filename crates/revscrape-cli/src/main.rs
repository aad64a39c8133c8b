mod browser;
mod scrape;
mod session;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use revscrape_client::{AuthCoordinator, AuthSettings, ScrapeClient};
use revscrape_core::{AppConfig, Platform, Target};
use tracing_subscriber::EnvFilter;

use crate::scrape::ScrapeOptions;
use crate::session::AuthCommands;

#[derive(Debug, Parser)]
#[command(name = "revscrape")]
#[command(about = "Collect Google and Trustpilot reviews into spreadsheets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape Google reviews for one business
    Google {
        #[command(flatten)]
        target: GoogleTarget,
        /// Street address, narrows a search by business name
        #[arg(long, requires = "name")]
        address: Option<String>,
        #[command(flatten)]
        options: ScrapeOptions,
    },
    /// Scrape Trustpilot reviews for one company
    Trustpilot {
        /// Company review page, e.g. <https://www.trustpilot.com/review/example.com>
        #[arg(long)]
        url: String,
        #[command(flatten)]
        options: ScrapeOptions,
    },
    /// Manage the Google sign-in used for Drive uploads
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Upload an existing spreadsheet to Google Drive
    Upload {
        /// Spreadsheet to upload
        #[arg(long)]
        file: PathBuf,
    },
    /// Ask a question about a generated spreadsheet
    Ask {
        /// Question or instruction for the model
        #[arg(long)]
        prompt: String,
        /// Spreadsheet name as produced by the backend
        #[arg(long)]
        file: String,
    },
}

/// Exactly one way of identifying the Google business.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct GoogleTarget {
    /// Business name as shown on Google Maps
    #[arg(long)]
    name: Option<String>,
    /// Full Google Maps URL of the place
    #[arg(long)]
    maps_url: Option<String>,
    /// Google Place ID
    #[arg(long)]
    place_id: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = revscrape_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let client = Arc::new(ScrapeClient::from_config(&config)?);
    tracing::debug!(api_url = %config.api_url, env = %config.env, "configuration loaded");

    match cli.command {
        Commands::Google {
            target,
            address,
            options,
        } => {
            let target =
                scrape::google_target(target.name, address, target.maps_url, target.place_id);
            let auth = options.upload.then(|| coordinator(&config, &client));
            scrape::run_scrape(&config, &client, auth.as_ref(), Platform::Google, target, &options)
                .await
        }
        Commands::Trustpilot { url, options } => {
            let target = Target::CompanyUrl(url);
            let auth = options.upload.then(|| coordinator(&config, &client));
            let platform = Platform::Trustpilot;
            scrape::run_scrape(&config, &client, auth.as_ref(), platform, target, &options).await
        }
        Commands::Auth { command } => {
            session::run_auth(&coordinator(&config, &client), command).await
        }
        Commands::Upload { file } => {
            session::run_upload(&coordinator(&config, &client), &file).await
        }
        Commands::Ask { prompt, file } => {
            let answer = client.ask(&prompt, &file).await?;
            println!("{answer}");
            Ok(())
        }
    }
}

/// Sign-in coordinator that opens the system browser.
fn coordinator(config: &AppConfig, client: &Arc<ScrapeClient>) -> AuthCoordinator {
    AuthCoordinator::new(
        Arc::clone(client),
        Arc::new(browser::SystemBrowser),
        AuthSettings::from_config(config),
    )
}
