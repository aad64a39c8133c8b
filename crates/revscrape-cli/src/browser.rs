//! Sign-in windows backed by the user's default browser.
//!
//! A terminal cannot observe a browser tab, so the tab counts as closed once
//! the user presses Enter. The coordinator then asks the backend whether the
//! sign-in went through.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reqwest::Url;
use revscrape_client::{PopupHandle, PopupLauncher, PopupWindow};

pub(crate) struct SystemBrowser;

impl PopupLauncher for SystemBrowser {
    fn open(&self, url: &Url) -> std::io::Result<PopupHandle> {
        open::that(url.as_str())?;

        let tab = Arc::new(BrowserTab::default());
        let watched = Arc::clone(&tab);
        // A plain thread: a blocking stdin read must not hold up runtime shutdown.
        std::thread::Builder::new()
            .name("sign-in-enter".to_string())
            .spawn(move || {
                let mut line = String::new();
                if let Err(e) = std::io::stdin().lock().read_line(&mut line) {
                    tracing::debug!(error = %e, "stdin closed while waiting for sign-in");
                }
                watched.close();
            })?;
        Ok(tab)
    }
}

#[derive(Debug, Default)]
pub(crate) struct BrowserTab {
    closed: AtomicBool,
}

impl PopupWindow for BrowserTab {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
