//! The controller's visible location.
//!
//! A browser controller would rewrite `window.location` with
//! `history.replaceState`.  The native controller keeps the URL it was
//! launched with (from `--url`) in a [`LaunchUrl`] and rewrites that
//! instead; the binary logs the rewritten value so the pairing token never
//! appears after the first line of output.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tracing::debug;
use url::Url;

use crate::application::auth_session::LocationBar;

/// In-process location bar with history *replacement* semantics.
#[derive(Debug)]
pub struct LaunchUrl {
    url: Mutex<Url>,
    replacements: AtomicUsize,
}

impl LaunchUrl {
    pub fn new(url: Url) -> Self {
        Self {
            url: Mutex::new(url),
            replacements: AtomicUsize::new(0),
        }
    }

    /// Number of times the URL has been replaced.
    pub fn replacements(&self) -> usize {
        self.replacements.load(Ordering::Relaxed)
    }
}

impl LocationBar for LaunchUrl {
    fn current(&self) -> Url {
        match self.url.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn replace(&self, url: Url) {
        debug!("location replaced with {url}");
        match self.url.lock() {
            Ok(mut guard) => *guard = url,
            Err(poisoned) => *poisoned.into_inner() = url,
        }
        self.replacements.fetch_add(1, Ordering::Relaxed);
    }
}
