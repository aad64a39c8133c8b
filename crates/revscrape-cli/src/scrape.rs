//! `google` and `trustpilot` command handlers.
//!
//! A scrape runs through a [`ScrapeForm`], saves the spreadsheet, and with
//! `--upload` sends it to Google Drive. Sign-in runs alongside the scrape so
//! the user can finish it in the browser while the backend works.

use std::future::Future;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use revscrape_client::{AuthCoordinator, ScrapeClient, ScrapeForm};
use revscrape_core::{AppConfig, Filters, JobRequest, Platform, Target};

use crate::session;

/// Options shared by every scrape command.
#[derive(Debug, Args)]
pub(crate) struct ScrapeOptions {
    /// Comma-separated keywords a review must mention
    #[arg(long)]
    pub keywords: Option<String>,
    /// Comma-separated star ratings to keep, each 1-5
    #[arg(long)]
    pub ratings: Option<String>,
    /// File or directory to save the spreadsheet to [default: REVSCRAPE_DOWNLOAD_DIR]
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    /// Upload the spreadsheet to Google Drive, signing in first if needed
    #[arg(long)]
    pub upload: bool,
}

/// Builds the Google target from whichever identifier was given.
///
/// Clap guarantees exactly one of the three; a missing one falls through to
/// an empty place ID, which validation rejects.
pub(crate) fn google_target(
    name: Option<String>,
    address: Option<String>,
    maps_url: Option<String>,
    place_id: Option<String>,
) -> Target {
    match (name, maps_url, place_id) {
        (Some(name), _, _) => Target::Business { name, address },
        (None, Some(url), _) => Target::MapsUrl(url),
        (None, None, place_id) => Target::PlaceId(place_id.unwrap_or_default()),
    }
}

/// Runs one scrape and saves the spreadsheet.
///
/// With `auth`, sign-in starts alongside the scrape and the spreadsheet is
/// uploaded once both finish. A sign-in failure never stops the scrape; it is
/// reported after the spreadsheet has been saved.
pub(crate) async fn run_scrape(
    config: &AppConfig,
    client: &Arc<ScrapeClient>,
    auth: Option<&AuthCoordinator>,
    platform: Platform,
    target: Target,
    options: &ScrapeOptions,
) -> anyhow::Result<()> {
    let filters = Filters::parse(options.keywords.as_deref(), options.ratings.as_deref())?;
    let request = JobRequest::new(platform, target).with_filters(filters);
    let form = ScrapeForm::new(platform, Arc::clone(client));

    let sign_in = async {
        match auth {
            Some(auth) => Some(session::start_sign_in(auth, platform.login_page()).await),
            None => None,
        }
    };
    let (sign_in, submitted) = tokio::join!(sign_in, with_progress(form.submit(&request)));
    if let Some(Err(e)) = &sign_in {
        tracing::warn!(error = %e, "Google sign-in could not start");
    }

    let download = submitted.map_err(|failure| anyhow::anyhow!("{failure}"))?;
    tracing::debug!(staged = %download.staged_path.display(), "spreadsheet staged");

    let dest = options.output.as_ref().unwrap_or(&config.download_dir);
    let saved = form
        .save_download(dest)?
        .ok_or_else(|| anyhow::anyhow!("the spreadsheet is no longer available"))?;
    println!("Saved {} ({} bytes)", saved.display(), download.size);

    if let (Some(auth), Some(started)) = (auth, sign_in) {
        started.map_err(|e| e.context("spreadsheet saved but not uploaded"))?;
        session::finish_sign_in(auth).await?;
        let message = form.upload(auth).await?;
        println!("{message}");
    }
    Ok(())
}

/// Drives `task` while animating a "Scraping..." line on a terminal.
///
/// Falls back to a plain await once the terminal stops accepting writes.
async fn with_progress<F: Future>(task: F) -> F::Output {
    let mut stderr = std::io::stderr();
    if !stderr.is_terminal() {
        return task.await;
    }

    tokio::pin!(task);
    let mut ticker = tokio::time::interval(Duration::from_millis(500));
    let mut dots = 0;
    loop {
        tokio::select! {
            output = &mut task => {
                if write!(stderr, "\r{:12}\r", "").is_err() {
                    tracing::debug!("could not clear the progress line");
                }
                return output;
            }
            _ = ticker.tick() => {
                dots = dots % 3 + 1;
                let drawn = write!(stderr, "\rScraping{:<3}", ".".repeat(dots))
                    .and_then(|()| stderr.flush());
                if drawn.is_err() {
                    return task.await;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "scrape_test.rs"]
mod tests;
