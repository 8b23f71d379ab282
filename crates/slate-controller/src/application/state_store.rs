//! Application state store.
//!
//! Holds the controller's [`AppState`] behind a `tokio::sync::watch`
//! channel.  The network service is the only writer; any number of
//! readers (a UI, the log task in `main.rs`, tests) subscribe and see each
//! change in the order it was applied.
//!
//! Subscribers are only woken when a mutation actually changed something,
//! so a host that re-sends identical `SYSTEM_STATS` does not cause redraws.

use std::sync::Arc;

use slate_core::{AppState, StateMutation};
use tokio::sync::watch;
use tracing::{debug, error};

use super::auth_session::TokenStore;

/// Single-writer store for [`AppState`] with change notification.
pub struct StateStore {
    state: watch::Sender<AppState>,
    tokens: Arc<dyn TokenStore>,
}

impl StateStore {
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(AppState::default());
        Self { state, tokens }
    }

    /// Returns a receiver that observes every future change.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> AppState {
        self.state.borrow().clone()
    }

    /// Applies mutations in order and notifies subscribers once if any of
    /// them changed the view.
    ///
    /// Credential mutations go to the token store.  A storage failure is
    /// logged; the remaining mutations are still applied.
    pub fn apply<'a, I>(&self, mutations: I)
    where
        I: IntoIterator<Item = &'a StateMutation>,
    {
        let mutations: Vec<&StateMutation> = mutations.into_iter().collect();

        for mutation in mutations.iter().filter(|m| m.is_credential()) {
            self.apply_credential(mutation);
        }

        self.state.send_if_modified(|state| {
            let mut changed = false;
            for mutation in mutations.iter().filter(|m| !m.is_credential()) {
                changed |= state.apply(mutation);
            }
            changed
        });
    }

    /// Applies a single mutation.
    pub fn apply_one(&self, mutation: StateMutation) {
        self.apply([&mutation]);
    }

    fn apply_credential(&self, mutation: &StateMutation) {
        let result = match mutation {
            StateMutation::StoreSessionToken(token) => {
                debug!("persisting session token issued by host");
                self.tokens.store(token)
            }
            StateMutation::ForgetSessionToken => {
                debug!("host requires authentication; forgetting session token");
                self.tokens.erase()
            }
            _ => Ok(()),
        };
        if let Err(e) = result {
            error!("failed to update session token: {e}");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::token_store::MemoryTokenStore;
    use slate_core::domain::model::SystemStats;
    use slate_core::{AuthStatus, ConnectionStatus};

    fn store_with_tokens() -> (StateStore, Arc<MemoryTokenStore>) {
        let tokens = Arc::new(MemoryTokenStore::default());
        (StateStore::new(Arc::clone(&tokens) as Arc<dyn TokenStore>), tokens)
    }

    #[test]
    fn test_apply_updates_snapshot() {
        // Arrange
        let (store, _) = store_with_tokens();

        // Act
        store.apply(&[
            StateMutation::SetConnection(ConnectionStatus::Connected),
            StateMutation::SetAuth(AuthStatus::Authenticated),
        ]);

        // Assert
        let state = store.snapshot();
        assert_eq!(state.connection, ConnectionStatus::Connected);
        assert_eq!(state.auth, AuthStatus::Authenticated);
    }

    #[test]
    fn test_subscriber_is_notified_only_on_change() {
        let (store, _) = store_with_tokens();
        let mut rx = store.subscribe();
        let stats = SystemStats {
            cpu: 1.0,
            ram: 2.0,
            gpu: None,
        };

        store.apply_one(StateMutation::ReplaceSystemStats(stats));
        assert!(rx.has_changed().unwrap());
        rx.mark_unchanged();

        store.apply_one(StateMutation::ReplaceSystemStats(stats));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_credential_mutations_reach_token_store() {
        // Arrange
        let (store, tokens) = store_with_tokens();

        // Act / Assert – store
        store.apply_one(StateMutation::StoreSessionToken("S".to_string()));
        assert_eq!(tokens.load().unwrap().as_deref(), Some("S"));

        // Act / Assert – forget
        store.apply_one(StateMutation::ForgetSessionToken);
        assert_eq!(tokens.load().unwrap(), None);
    }

    #[test]
    fn test_credential_mutations_do_not_notify_view() {
        let (store, _) = store_with_tokens();
        let mut rx = store.subscribe();
        rx.mark_unchanged();

        store.apply_one(StateMutation::StoreSessionToken("S".to_string()));

        assert!(!rx.has_changed().unwrap());
    }
}
