use std::fmt;

use tokio::sync::watch;

use crate::models::User;

/// Callback invoked with the current identity on every auth-state change
pub type AuthListener = Box<dyn Fn(Option<User>) + Send + Sync + 'static>;

/// Handle returned when registering an auth-state listener
///
/// Releasing the handle, explicitly through [`AuthSubscription::unsubscribe`] or by
/// dropping it, runs the teardown exactly once.
pub struct AuthSubscription {
    teardown: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl AuthSubscription {
    pub fn new(teardown: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// Subscription with nothing to release
    pub fn noop() -> Self {
        Self { teardown: None }
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for AuthSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSubscription")
            .field("active", &self.teardown.is_some())
            .finish()
    }
}

/// Current identity of a provider, fanned out to listeners
///
/// Each subscription runs a forwarding task on the tokio runtime; releasing the
/// subscription aborts it.
#[derive(Debug)]
pub struct AuthState {
    tx: watch::Sender<Option<User>>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthState {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn current(&self) -> Option<User> {
        self.tx.borrow().clone()
    }

    /// Publishes a transition to every subscriber
    pub fn set(&self, user: Option<User>) {
        tracing::debug!(uid = ?user.as_ref().map(|u| u.uid.as_str()), "Auth state changed");
        self.tx.send_replace(user);
    }

    pub fn subscribe(&self, listener: AuthListener) -> AuthSubscription {
        let mut rx = self.tx.subscribe();
        let task = tokio::spawn(async move {
            let initial = rx.borrow_and_update().clone();
            listener(initial);
            while rx.changed().await.is_ok() {
                let user = rx.borrow_and_update().clone();
                listener(user);
            }
        });
        AuthSubscription::new(move || task.abort())
    }
}
