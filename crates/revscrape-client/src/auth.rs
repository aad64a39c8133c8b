//! OAuth side-channel for the Google Drive upload.
//!
//! Sign-in happens in a separate window the user interacts with directly.
//! [`AuthCoordinator::begin_auth`] opens that window and returns; a watcher
//! task then settles [`UploadState`] from two signals:
//!
//! - a message posted back from the window's callback page
//!   ([`AuthCoordinator::post_message`]), which is authoritative;
//! - polling the window every `poll_interval`, followed by a single
//!   `/auth-status` check once the window is found closed.
//!
//! An overall timeout bounds the wait. Only the first signal counts: once the
//! watcher settles, its message channel is dropped and later messages are
//! ignored.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use reqwest::Url;
use revscrape_core::AppConfig;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::artifact::Artifact;
use crate::client::ScrapeClient;
use crate::error::{AuthError, UploadError};

/// A window showing the third-party sign-in page.
pub trait PopupWindow: Send + Sync {
    fn is_closed(&self) -> bool;
    fn close(&self);
}

pub type PopupHandle = Arc<dyn PopupWindow>;

/// Opens sign-in windows. A failure means the window was blocked.
pub trait PopupLauncher: Send + Sync {
    /// # Errors
    ///
    /// Returns the I/O error reported by the platform when no window could be
    /// opened.
    fn open(&self, url: &Url) -> std::io::Result<PopupHandle>;
}

/// Message posted by the sign-in window's callback page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMessage {
    Success,
    Denied,
}

/// Whether the upload action may run.
#[derive(Clone)]
pub enum UploadState {
    NotAuthenticated,
    AuthPending(PopupHandle),
    Authenticated,
}

impl UploadState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, UploadState::Authenticated)
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, UploadState::AuthPending(_))
    }
}

impl std::fmt::Debug for UploadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadState::NotAuthenticated => write!(f, "NotAuthenticated"),
            UploadState::AuthPending(window) => {
                write!(f, "AuthPending(closed={})", window.is_closed())
            }
            UploadState::Authenticated => write!(f, "Authenticated"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AuthSettings {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl AuthSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.auth_poll_interval_ms),
            timeout: Duration::from_secs(config.auth_timeout_secs),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(300),
        }
    }
}

/// How a watched sign-in attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settled {
    Confirmed,
    Denied,
    ClosedWithoutSession,
    TimedOut,
}

/// Drives [`UploadState`] for one process.
///
/// State is not persisted; call [`AuthCoordinator::refresh`] at start-up to
/// pick up a session the backend already holds.
pub struct AuthCoordinator {
    client: Arc<ScrapeClient>,
    launcher: Arc<dyn PopupLauncher>,
    settings: AuthSettings,
    state: Arc<watch::Sender<UploadState>>,
    outbox: Mutex<Option<mpsc::UnboundedSender<AuthMessage>>>,
    watcher: Mutex<Option<JoinHandle<()>>>,
    begin_lock: tokio::sync::Mutex<()>,
}

impl AuthCoordinator {
    pub fn new(
        client: Arc<ScrapeClient>,
        launcher: Arc<dyn PopupLauncher>,
        settings: AuthSettings,
    ) -> Self {
        let (state, _) = watch::channel(UploadState::NotAuthenticated);
        Self {
            client,
            launcher,
            settings,
            state: Arc::new(state),
            outbox: Mutex::new(None),
            watcher: Mutex::new(None),
            begin_lock: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn state(&self) -> UploadState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Receiver that observes every state transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state.subscribe()
    }

    /// Whether a watcher task is still polling a sign-in window.
    #[must_use]
    pub fn is_watching(&self) -> bool {
        lock(&self.watcher)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Starts a sign-in attempt for the form identified by `page`.
    ///
    /// Returns once the window is open; the outcome arrives later as a state
    /// transition. Does nothing when already authenticated.
    ///
    /// # Errors
    ///
    /// - [`AuthError::AlreadyPending`] if a sign-in window is already open.
    /// - [`AuthError::PopupBlocked`] if the window could not be opened. The
    ///   state stays `NotAuthenticated` and no watcher is started.
    /// - [`AuthError::Client`] if the backend did not supply a login URL.
    pub async fn begin_auth(&self, page: &str) -> Result<(), AuthError> {
        let _guard = self.begin_lock.lock().await;

        match &*self.state.borrow() {
            UploadState::Authenticated => return Ok(()),
            UploadState::AuthPending(_) => return Err(AuthError::AlreadyPending),
            UploadState::NotAuthenticated => {}
        }

        let auth_url = self.client.login_url(page).await?;

        let window = match self.launcher.open(&auth_url) {
            Ok(window) => window,
            Err(source) => {
                tracing::warn!(url = %auth_url, error = %source, "sign-in window was blocked");
                self.state.send_replace(UploadState::NotAuthenticated);
                return Err(AuthError::PopupBlocked {
                    url: auth_url.to_string(),
                    source,
                });
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        *lock(&self.outbox) = Some(tx);
        self.state
            .send_replace(UploadState::AuthPending(Arc::clone(&window)));
        tracing::info!(page, "sign-in window opened");

        let handle = tokio::spawn(watch_window(
            Arc::clone(&self.client),
            window,
            rx,
            Arc::clone(&self.state),
            self.settings,
        ));
        if let Some(previous) = lock(&self.watcher).replace(handle) {
            previous.abort();
        }
        Ok(())
    }

    /// Delivers a message from the sign-in window's callback page.
    ///
    /// Messages arriving when no attempt is being watched are dropped.
    pub fn post_message(&self, message: AuthMessage) {
        let delivered = lock(&self.outbox)
            .as_ref()
            .is_some_and(|tx| tx.send(message).is_ok());
        if !delivered {
            tracing::debug!(?message, "ignoring auth message outside a sign-in attempt");
        }
    }

    /// Waits until the current attempt settles and returns the final state.
    pub async fn wait_settled(&self) -> UploadState {
        let mut rx = self.state.subscribe();
        let settled = rx.wait_for(|state| !state.is_pending()).await;
        match settled {
            Ok(state) => state.clone(),
            Err(_) => UploadState::NotAuthenticated,
        }
    }

    /// Reconciles with the backend's session, e.g. after a restart.
    ///
    /// Leaves a pending attempt alone.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Client`] if the status check fails.
    pub async fn refresh(&self) -> Result<bool, AuthError> {
        if self.state.borrow().is_pending() {
            return Ok(false);
        }
        let authenticated = self.client.auth_status().await?;
        // An attempt may have started while the check was in flight.
        self.state.send_if_modified(|state| {
            if state.is_pending() || state.is_authenticated() == authenticated {
                return false;
            }
            *state = if authenticated {
                UploadState::Authenticated
            } else {
                UploadState::NotAuthenticated
            };
            true
        });
        Ok(authenticated)
    }

    /// Abandons a pending attempt: stops the watcher, closes the window and
    /// returns to `NotAuthenticated`.
    pub fn cancel(&self) {
        if let Some(handle) = lock(&self.watcher).take() {
            handle.abort();
        }
        lock(&self.outbox).take();
        self.state.send_if_modified(|state| {
            let UploadState::AuthPending(window) = state else {
                return false;
            };
            if !window.is_closed() {
                window.close();
            }
            *state = UploadState::NotAuthenticated;
            true
        });
    }

    /// Uploads `artifact` if signed in.
    ///
    /// # Errors
    ///
    /// - [`UploadError::AuthRequired`] without contacting the backend when not
    ///   authenticated, or when the backend rejects the session (the state is
    ///   then reset so the next attempt prompts a new sign-in).
    /// - Any other [`UploadError`] from [`ScrapeClient::upload`].
    pub async fn upload(&self, artifact: &Artifact) -> Result<String, UploadError> {
        if !self.is_authenticated() {
            return Err(UploadError::AuthRequired);
        }
        match self.client.upload(artifact).await {
            Err(UploadError::AuthRequired) => {
                tracing::warn!("backend rejected the Google session; sign-in required");
                self.state.send_if_modified(|state| {
                    if state.is_authenticated() {
                        *state = UploadState::NotAuthenticated;
                        true
                    } else {
                        false
                    }
                });
                Err(UploadError::AuthRequired)
            }
            other => other,
        }
    }
}

impl Drop for AuthCoordinator {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.watcher).take() {
            handle.abort();
        }
    }
}

/// Watches one sign-in attempt until it settles, then publishes the result.
async fn watch_window(
    client: Arc<ScrapeClient>,
    window: PopupHandle,
    mut inbox: mpsc::UnboundedReceiver<AuthMessage>,
    state: Arc<watch::Sender<UploadState>>,
    settings: AuthSettings,
) {
    let deadline = tokio::time::sleep(settings.timeout);
    tokio::pin!(deadline);

    let mut poll = tokio::time::interval(settings.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    poll.tick().await;

    let mut inbox_open = true;
    let outcome = loop {
        tokio::select! {
            message = inbox.recv(), if inbox_open => match message {
                Some(AuthMessage::Success) => break Settled::Confirmed,
                Some(AuthMessage::Denied) => break Settled::Denied,
                None => inbox_open = false,
            },
            _ = poll.tick() => {
                if window.is_closed() {
                    break check_session(&client).await;
                }
            }
            () = &mut deadline => break Settled::TimedOut,
        }
    };
    // Dropping the receiver makes later messages for this attempt no-ops.
    drop(inbox);

    if !window.is_closed() {
        window.close();
    }

    let next = if outcome == Settled::Confirmed {
        tracing::info!("Google sign-in confirmed");
        UploadState::Authenticated
    } else {
        tracing::warn!(outcome = ?outcome, "Google sign-in did not complete");
        UploadState::NotAuthenticated
    };
    state.send_if_modified(|current| {
        if !current.is_pending() {
            return false;
        }
        *current = next;
        true
    });
}

async fn check_session(client: &ScrapeClient) -> Settled {
    match client.auth_status().await {
        Ok(true) => Settled::Confirmed,
        Ok(false) => Settled::ClosedWithoutSession,
        Err(e) => {
            tracing::warn!(error = %e, "auth status check failed after window closed");
            Settled::ClosedWithoutSession
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
