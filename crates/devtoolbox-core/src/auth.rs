//! Auth provider collaborator.
//!
//! Mirrors the three operations the site needs from its OAuth provider:
//! start a sign-in, sign out, and observe the current user. Listeners are
//! called with the new identity (or `None`) after every change, and once
//! immediately on subscription with the current value.

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::models::User;

/// Callback invoked on every current-user change.
pub type AuthListener = Arc<dyn Fn(Option<&User>) + Send + Sync>;

/// Handle returned by [`AuthProvider::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Sign in through `provider` (e.g. `"google"`, `"github"`).
    async fn sign_in(&self, provider: &str) -> Result<User>;

    async fn sign_out(&self) -> Result<()>;

    fn current_user(&self) -> Option<User>;

    fn subscribe(&self, listener: AuthListener) -> Subscription;

    fn unsubscribe(&self, subscription: Subscription);
}

#[derive(Default)]
struct AuthState {
    current: Option<User>,
    listeners: Vec<(Subscription, AuthListener)>,
    next_id: u64,
}

/// Auth provider that signs in one configured identity.
///
/// Used by the CLI and tests in place of a hosted OAuth flow.
pub struct LocalAuth {
    identity: User,
    providers: Vec<String>,
    state: Mutex<AuthState>,
}

impl LocalAuth {
    pub fn new(identity: User) -> Self {
        Self {
            identity,
            providers: vec!["google".to_string(), "github".to_string(), "local".to_string()],
            state: Mutex::new(AuthState::default()),
        }
    }

    /// Start already signed in, as when a session is restored.
    pub fn signed_in(identity: User) -> Self {
        let auth = Self::new(identity.clone());
        if let Ok(mut state) = auth.state.lock() {
            state.current = Some(identity);
        }
        auth
    }

    fn set_current(&self, user: Option<User>) -> Result<()> {
        let listeners: Vec<AuthListener> = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| anyhow!("auth state lock poisoned"))?;
            state.current = user.clone();
            state.listeners.iter().map(|(_, l)| l.clone()).collect()
        };
        // Listeners run outside the lock so they may call back into the provider.
        for listener in listeners {
            listener(user.as_ref());
        }
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for LocalAuth {
    async fn sign_in(&self, provider: &str) -> Result<User> {
        if !self.providers.iter().any(|p| p == provider) {
            bail!("unsupported sign-in provider: {}", provider);
        }
        tracing::info!(provider, uid = %self.identity.uid, "signed in");
        self.set_current(Some(self.identity.clone()))?;
        Ok(self.identity.clone())
    }

    async fn sign_out(&self) -> Result<()> {
        tracing::info!("signed out");
        self.set_current(None)
    }

    fn current_user(&self) -> Option<User> {
        self.state.lock().ok().and_then(|s| s.current.clone())
    }

    fn subscribe(&self, listener: AuthListener) -> Subscription {
        let (subscription, current) = match self.state.lock() {
            Ok(mut state) => {
                state.next_id += 1;
                let subscription = Subscription(state.next_id);
                state.listeners.push((subscription, listener.clone()));
                (subscription, state.current.clone())
            }
            Err(_) => (Subscription(0), None),
        };
        listener(current.as_ref());
        subscription
    }

    fn unsubscribe(&self, subscription: Subscription) {
        if let Ok(mut state) = self.state.lock() {
            state.listeners.retain(|(id, _)| *id != subscription);
        }
    }
}
