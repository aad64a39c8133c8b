//! Google sign-in and Drive upload commands.

use std::path::Path;

use clap::Subcommand;
use revscrape_client::{Artifact, AuthCoordinator, AuthError, POPUP_BLOCKED_MESSAGE};

/// Sub-commands available under `auth`.
#[derive(Debug, Subcommand)]
pub(crate) enum AuthCommands {
    /// Sign in with Google in the browser
    Login {
        /// Page the backend redirects to after sign-in
        #[arg(long, default_value = "google")]
        page: String,
    },
    /// Show whether the backend holds a Google session
    Status,
}

pub(crate) async fn run_auth(
    auth: &AuthCoordinator,
    command: AuthCommands,
) -> anyhow::Result<()> {
    match command {
        AuthCommands::Login { page } => {
            start_sign_in(auth, &page).await?;
            finish_sign_in(auth).await
        }
        AuthCommands::Status => {
            if auth.refresh().await? {
                println!("Signed in with Google.");
            } else {
                println!("Not signed in. Run `revscrape auth login` to sign in.");
            }
            Ok(())
        }
    }
}

pub(crate) async fn run_upload(auth: &AuthCoordinator, file: &Path) -> anyhow::Result<()> {
    let artifact = Artifact::from_path(file)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", file.display()))?;

    start_sign_in(auth, "google").await?;
    finish_sign_in(auth).await?;

    let message = auth.upload(&artifact).await?;
    println!("{message}");
    Ok(())
}

/// Opens the sign-in page unless the backend already holds a session.
///
/// Returns as soon as the browser is open; [`finish_sign_in`] waits for the
/// outcome.
pub(crate) async fn start_sign_in(auth: &AuthCoordinator, page: &str) -> anyhow::Result<()> {
    if auth.refresh().await? {
        tracing::debug!("reusing existing Google session");
        return Ok(());
    }

    match auth.begin_auth(page).await {
        Ok(()) => {
            eprintln!("Finish signing in with Google in your browser, then press Enter here.");
            Ok(())
        }
        Err(AuthError::PopupBlocked { url, .. }) => {
            anyhow::bail!("{POPUP_BLOCKED_MESSAGE}\nSign in at {url} and run the command again.")
        }
        Err(e) => Err(e.into()),
    }
}

/// Waits for the sign-in started by [`start_sign_in`] to settle.
pub(crate) async fn finish_sign_in(auth: &AuthCoordinator) -> anyhow::Result<()> {
    if auth.wait_settled().await.is_authenticated() {
        eprintln!("Signed in with Google.");
        Ok(())
    } else {
        anyhow::bail!("Google sign-in did not complete. Run the command again to retry.")
    }
}
