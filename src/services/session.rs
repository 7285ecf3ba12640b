use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::watch;

use crate::{
    models::User,
    services::providers::{AuthSubscription, IdentityProvider},
};

/// Authentication state as seen by route guards
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub user: Option<User>,
    /// True until the identity provider reported for the first time
    pub resolving: bool,
}

impl SessionState {
    fn initial() -> Self {
        Self {
            user: None,
            resolving: true,
        }
    }
}

/// Outcome of guarding a protected view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAccess {
    Resolving,
    Granted(User),
    RedirectToLogin,
}

/// Adapter exposing the identity provider's session to the rest of the application
///
/// Subscribes once on construction. [`SessionGate::shutdown`] releases the subscription;
/// dropping the gate releases it as well.
pub struct SessionGate {
    state: watch::Receiver<SessionState>,
    subscription: Mutex<Option<AuthSubscription>>,
}

impl SessionGate {
    pub fn new(provider: &dyn IdentityProvider) -> Self {
        let (tx, state) = watch::channel(SessionState::initial());

        let subscription = provider.subscribe(Box::new(move |user: Option<User>| {
            tx.send_replace(SessionState {
                user,
                resolving: false,
            });
        }));

        tracing::info!(provider = provider.name(), "Session gate subscribed");

        Self {
            state,
            subscription: Mutex::new(Some(subscription)),
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn is_resolving(&self) -> bool {
        self.state.borrow().resolving
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every session transition
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Waits for the provider's first report.
    ///
    /// Returns the current state immediately if the gate was already shut down.
    pub async fn wait_until_resolved(&self) -> SessionState {
        let mut rx = self.state.clone();
        let resolved = match rx.wait_for(|state| !state.resolving).await {
            Ok(state) => state.clone(),
            Err(_) => self.snapshot(),
        };
        resolved
    }

    pub fn access(&self) -> RouteAccess {
        let state = self.state.borrow();
        match (&state.user, state.resolving) {
            (_, true) => RouteAccess::Resolving,
            (Some(user), false) => RouteAccess::Granted(user.clone()),
            (None, false) => RouteAccess::RedirectToLogin,
        }
    }

    /// Releases the provider subscription. Later calls do nothing.
    pub fn shutdown(&self) {
        let subscription = match self.subscription.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
            tracing::info!("Session gate unsubscribed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::local::LocalIdentity;
    use crate::services::providers::MockIdentityProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_resolving_until_first_report() {
        let identity = LocalIdentity::new();
        let gate = SessionGate::new(&identity);

        assert!(gate.is_resolving());
        assert_eq!(gate.access(), RouteAccess::Resolving);

        let state = gate.wait_until_resolved().await;
        assert!(!state.resolving);
        assert!(state.user.is_none());
        assert_eq!(gate.access(), RouteAccess::RedirectToLogin);
    }

    #[tokio::test]
    async fn test_follows_sign_in_and_sign_out() {
        let identity = LocalIdentity::new();
        let gate = SessionGate::new(&identity);
        gate.wait_until_resolved().await;

        let user = identity.sign_up("mina@example.com", "secret1").await.unwrap();
        let mut rx = gate.watch();
        rx.wait_for(|state| state.user.is_some()).await.unwrap();
        assert_eq!(gate.current_user(), Some(user.clone()));
        assert_eq!(gate.access(), RouteAccess::Granted(user));

        identity.sign_out().await.unwrap();
        rx.wait_for(|state| state.user.is_none()).await.unwrap();
        assert_eq!(gate.access(), RouteAccess::RedirectToLogin);
    }

    #[tokio::test]
    async fn test_shutdown_stops_updates() {
        let identity = LocalIdentity::new();
        let gate = SessionGate::new(&identity);
        gate.wait_until_resolved().await;

        gate.shutdown();
        gate.shutdown();
        identity.sign_up("mina@example.com", "secret1").await.unwrap();
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }

        assert!(gate.current_user().is_none());
        assert!(!gate.is_resolving());
    }

    #[test]
    fn test_subscribes_once_and_releases_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();

        let mut provider = MockIdentityProvider::new();
        provider.expect_name().return_const("mock");
        provider.expect_subscribe().times(1).returning(move |listener| {
            listener(None);
            let counter = counter.clone();
            AuthSubscription::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        });

        let gate = SessionGate::new(&provider);
        assert_eq!(gate.access(), RouteAccess::RedirectToLogin);

        gate.shutdown();
        drop(gate);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}
