//! Push subscription lifecycle.
//!
//! Three sources of truth are kept consistent here: the notification
//! permission, the platform push subscription and the server record. The
//! manager mirrors the platform subscription in [`SubscriptionState`] and
//! reports every failure as a [`LifecycleEvent`] instead of returning it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::dto::DemoPushRequest;
use crate::application::services::{EventChannel, PermissionWatcher, PushApi};
use crate::domain::entities::{
    LifecycleEvent, ManagerPhase, PermissionTransition, PushSubscription, ServerKey,
    SubscriptionState,
};
use crate::domain::errors::PlatformError;
use crate::domain::ports::{PermissionPort, PushRegistryPort};

/// Static inputs of the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSettings {
    /// Application server public key, base64url.
    pub server_key: String,
    /// Service worker script path.
    pub worker_script: String,
    /// Service worker scope.
    pub worker_scope: String,
    /// How long an ephemeral demo subscription lives.
    pub demo_teardown: Duration,
}

impl Default for SubscriptionSettings {
    fn default() -> Self {
        Self {
            server_key: String::new(),
            worker_script: "/service-worker.js".to_string(),
            worker_scope: "/".to_string(),
            demo_teardown: Duration::from_secs(60),
        }
    }
}

/// How a user-triggered operation ended. Failures travel through the event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The operation ran; its result was queued as an event.
    Completed,
    /// Nothing to do: already in the requested state.
    Skipped,
    /// Another subscribe, unsubscribe or demo is in flight.
    Busy,
    /// `initialize()` has not finished.
    NotReady,
    /// Push is not available on this platform.
    Unsupported,
    /// The manager was disposed mid-flight; state was left untouched.
    Cancelled,
}

/// Resets `is_toggling` however the operation exits.
struct ToggleGuard<'a> {
    state: &'a Mutex<SubscriptionState>,
}

impl Drop for ToggleGuard<'_> {
    fn drop(&mut self) {
        self.state.lock().is_toggling = false;
    }
}

struct Inner {
    registry: Arc<dyn PushRegistryPort>,
    permission: Arc<dyn PermissionPort>,
    api: PushApi,
    events: Arc<EventChannel>,
    settings: SubscriptionSettings,
    state: Mutex<SubscriptionState>,
    initialized: AtomicBool,
    reconcile_pending: AtomicBool,
    cancel: Mutex<CancellationToken>,
    watcher: Mutex<Option<PermissionWatcher>>,
    reaction: Mutex<Option<JoinHandle<()>>>,
    ephemeral: Mutex<Option<PushSubscription>>,
    teardown: Mutex<Option<JoinHandle<()>>>,
}

/// Owner of the push subscription state machine.
///
/// Cheap to clone; clones share one state.
#[derive(Clone)]
pub struct SubscriptionManager {
    inner: Arc<Inner>,
}

impl SubscriptionManager {
    /// Creates an uninitialized manager.
    #[must_use]
    pub fn new(
        registry: Arc<dyn PushRegistryPort>,
        permission: Arc<dyn PermissionPort>,
        api: PushApi,
        events: Arc<EventChannel>,
        settings: SubscriptionSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                permission,
                api,
                events,
                settings,
                state: Mutex::new(SubscriptionState::default()),
                initialized: AtomicBool::new(false),
                reconcile_pending: AtomicBool::new(false),
                cancel: Mutex::new(CancellationToken::new()),
                watcher: Mutex::new(None),
                reaction: Mutex::new(None),
                ephemeral: Mutex::new(None),
                teardown: Mutex::new(None),
            }),
        }
    }

    /// Checks support, registers the service worker, starts the permission
    /// watcher and mirrors any existing subscription. Loading always ends.
    pub async fn initialize(&self) {
        self.inner.initialize().await;
        self.inner.reconcile_deferred().await;
    }

    /// Subscribes, registering with the server and rolling back on failure.
    pub async fn subscribe(&self) -> ToggleOutcome {
        let outcome = self.inner.subscribe().await;
        self.inner.reconcile_deferred().await;
        outcome
    }

    /// Unsubscribes. Local state is cleared even when the server call fails.
    pub async fn unsubscribe(&self) -> ToggleOutcome {
        let outcome = self.inner.unsubscribe().await;
        self.inner.reconcile_deferred().await;
        outcome
    }

    /// Pushes `message` through the demo route, creating a temporary subscription if needed.
    pub async fn send_demo(&self, message: &str) -> ToggleOutcome {
        let outcome = self.inner.send_demo(message).await;
        self.inner.reconcile_deferred().await;
        outcome
    }

    /// Stops the watcher, cancels in-flight work and removes a pending demo subscription.
    pub async fn dispose(&self) {
        self.inner.dispose().await;
    }

    /// Snapshot of the observable state.
    #[must_use]
    pub fn state(&self) -> SubscriptionState {
        self.inner.state.lock().clone()
    }

    #[must_use]
    pub fn phase(&self) -> ManagerPhase {
        if !self.inner.initialized.load(Ordering::SeqCst) {
            return ManagerPhase::Uninitialized;
        }
        ManagerPhase::of(&self.inner.state.lock())
    }

    /// Current endpoint, if subscribed.
    #[must_use]
    pub fn endpoint(&self) -> Option<String> {
        self.inner.state.lock().endpoint().map(str::to_string)
    }

    /// Removes and returns the oldest lifecycle event.
    #[must_use]
    pub fn consume_event(&self) -> Option<LifecycleEvent> {
        self.inner.events.consume()
    }

    #[must_use]
    pub fn events(&self) -> &Arc<EventChannel> {
        &self.inner.events
    }
}

impl Inner {
    fn token(&self) -> CancellationToken {
        self.cancel.lock().clone()
    }

    fn begin_toggle(&self) -> Result<ToggleGuard<'_>, ToggleOutcome> {
        let mut state = self.state.lock();
        if state.is_unsupported {
            return Err(ToggleOutcome::Unsupported);
        }
        if !self.initialized.load(Ordering::SeqCst) || state.is_loading {
            return Err(ToggleOutcome::NotReady);
        }
        if state.is_toggling {
            return Err(ToggleOutcome::Busy);
        }

        state.is_toggling = true;
        Ok(ToggleGuard { state: &self.state })
    }

    async fn initialize(self: &Arc<Self>) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("Subscription manager already initialized");
            return;
        }

        let cancel = CancellationToken::new();
        *self.cancel.lock() = cancel.clone();
        {
            let mut state = self.state.lock();
            *state = SubscriptionState::default();
            state.permission = self.permission.current();
        }

        if !self.registry.is_supported() || !self.permission.is_supported() {
            warn!("Push notifications are not supported on this platform");
            let mut state = self.state.lock();
            state.is_unsupported = true;
            state.is_loading = false;
            return;
        }

        self.load_initial(&cancel).await;
        self.state.lock().is_loading = false;
        info!(phase = %ManagerPhase::of(&self.state.lock()), "Subscription manager ready");
    }

    async fn load_initial(self: &Arc<Self>, cancel: &CancellationToken) {
        let registered = match self
            .registry
            .register_service_worker(&self.settings.worker_script, &self.settings.worker_scope)
            .await
        {
            Ok(()) => {
                debug!(script = %self.settings.worker_script, "Service worker registered");
                true
            }
            Err(e) => {
                error!(error = %e, "Service worker registration failed");
                false
            }
        };

        self.start_watcher(cancel);

        let permission = self.permission.current();
        self.state.lock().permission = permission;

        if registered && !permission.is_denied() {
            self.load_subscription(cancel).await;
        }
    }

    /// Mirrors the platform subscription without creating one.
    async fn load_subscription(&self, cancel: &CancellationToken) {
        let subscription = match self.registry.get_subscription().await {
            Ok(subscription) => subscription,
            Err(e) => {
                warn!(error = %e, "Failed to load push subscription");
                return;
            }
        };

        if cancel.is_cancelled() {
            return;
        }

        let subscription =
            subscription.filter(|s| self.ephemeral.lock().as_ref() != Some(s));
        if let Some(s) = &subscription {
            debug!(endpoint = %s.fingerprint(), "Loaded existing push subscription");
        }
        self.state.lock().set_subscription(subscription);
    }

    fn start_watcher(self: &Arc<Self>, cancel: &CancellationToken) {
        let (watcher, mut transitions) = PermissionWatcher::spawn(self.permission.watch());
        let weak: Weak<Self> = Arc::downgrade(self);
        let cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            loop {
                let transition = tokio::select! {
                    () = cancel.cancelled() => break,
                    transition = transitions.recv() => match transition {
                        Some(t) => t,
                        None => break,
                    },
                };

                let Some(inner) = weak.upgrade() else { break };
                inner.on_permission_change(transition, &cancel).await;
            }
        });

        *self.watcher.lock() = Some(watcher);
        if let Some(previous) = self.reaction.lock().replace(handle) {
            previous.abort();
        }
    }

    async fn on_permission_change(&self, transition: PermissionTransition, cancel: &CancellationToken) {
        {
            let mut state = self.state.lock();
            state.permission = transition.to;
            // Set under the state lock so the releasing operation cannot miss it.
            if state.is_toggling || state.is_loading {
                self.reconcile_pending.store(true, Ordering::SeqCst);
                debug!(to = %transition.to, "Operation in flight, permission reaction deferred");
                return;
            }
        }

        self.react_to_permission(cancel).await;
    }

    /// Brings the subscription in line with the last known permission.
    async fn react_to_permission(&self, cancel: &CancellationToken) {
        let (permission, subscribed) = {
            let state = self.state.lock();
            (state.permission, state.is_subscribed())
        };

        if !permission.is_granted() && subscribed {
            info!(to = %permission, "Permission withdrawn, unsubscribing");
            self.unsubscribe().await;
        } else if permission.is_granted() && !subscribed {
            self.load_subscription(cancel).await;
        }
    }

    /// Replays a permission reaction that arrived while an operation held the toggle.
    /// Left pending if another operation still holds it; that one replays it on release.
    async fn reconcile_deferred(&self) {
        loop {
            {
                let state = self.state.lock();
                if state.is_toggling || state.is_loading {
                    return;
                }
                if !self.reconcile_pending.swap(false, Ordering::SeqCst) {
                    return;
                }
            }

            let cancel = self.token();
            if cancel.is_cancelled() {
                return;
            }
            debug!("Applying deferred permission reaction");
            self.react_to_permission(&cancel).await;
        }
    }

    async fn subscribe(&self) -> ToggleOutcome {
        let _guard = match self.begin_toggle() {
            Ok(guard) => guard,
            Err(outcome) => return outcome,
        };
        if self.state.lock().is_subscribed() {
            debug!("Already subscribed");
            return ToggleOutcome::Skipped;
        }
        let cancel = self.token();

        let permission = match self.permission.request().await {
            Ok(permission) => permission,
            Err(e) => {
                warn!(error = %e, "Permission request failed");
                self.events.push(LifecycleEvent::subscribe_failed(e.to_string()));
                return ToggleOutcome::Completed;
            }
        };
        if cancel.is_cancelled() {
            return ToggleOutcome::Cancelled;
        }

        self.state.lock().permission = permission;
        if !permission.is_granted() {
            info!(%permission, "Notification permission not granted");
            self.events.push(LifecycleEvent::PermissionDenied);
            return ToggleOutcome::Completed;
        }

        let subscription = match self.obtain_subscription().await {
            Ok(subscription) => subscription,
            Err(e) => {
                if cancel.is_cancelled() {
                    return ToggleOutcome::Cancelled;
                }
                error!(error = %e, "Platform subscribe failed");
                self.events.push(LifecycleEvent::subscribe_failed(e.to_string()));
                return ToggleOutcome::Completed;
            }
        };

        match self.api.register(&subscription, &cancel).await {
            Ok(()) if cancel.is_cancelled() => {
                self.roll_back(&subscription, "Subscribe cancelled after server registration")
                    .await;
                return ToggleOutcome::Cancelled;
            }
            Ok(()) => {
                info!(endpoint = %subscription.fingerprint(), "Subscribed to push notifications");
                self.state.lock().set_subscription(Some(subscription));
                self.events.push(LifecycleEvent::Subscribed);
            }
            Err(e) if e.is_cancelled() => {
                self.roll_back(&subscription, "Subscribe cancelled during server registration")
                    .await;
                return ToggleOutcome::Cancelled;
            }
            Err(e) => {
                warn!(error = %e, "Server registration failed");
                self.roll_back(&subscription, "Rolling back platform subscription").await;
                self.state.lock().clear_subscription();
                self.events.push(LifecycleEvent::subscribe_failed(e.message));
            }
        }

        ToggleOutcome::Completed
    }

    /// Best-effort removal of the platform subscription after a failed or cancelled registration.
    async fn roll_back(&self, subscription: &PushSubscription, reason: &str) {
        warn!(endpoint = %subscription.fingerprint(), "{reason}");
        if let Err(e) = self.registry.unsubscribe(subscription).await {
            warn!(error = %e, "Rollback unsubscribe failed");
        }
    }

    /// Reuses the platform subscription if there is one, otherwise creates one.
    async fn obtain_subscription(&self) -> Result<PushSubscription, PlatformError> {
        if let Some(existing) = self.registry.get_subscription().await? {
            let mut ephemeral = self.ephemeral.lock();
            if ephemeral.as_ref() == Some(&existing) {
                debug!("Adopting demo subscription");
                *ephemeral = None;
            }
            return Ok(existing);
        }

        let key = ServerKey::from_base64url(&self.settings.server_key)?;
        self.registry.subscribe(&key).await
    }

    async fn unsubscribe(&self) -> ToggleOutcome {
        if !self.state.lock().is_subscribed() {
            debug!("Not subscribed, nothing to unsubscribe");
            return ToggleOutcome::Skipped;
        }

        let _guard = match self.begin_toggle() {
            Ok(guard) => guard,
            Err(outcome) => return outcome,
        };
        let Some(subscription) = self.state.lock().subscription.clone() else {
            return ToggleOutcome::Skipped;
        };
        let cancel = self.token();

        match self.api.unregister(&subscription, &cancel).await {
            Ok(()) => debug!(endpoint = %subscription.fingerprint(), "Server subscription removed"),
            Err(e) if e.is_cancelled() => return ToggleOutcome::Cancelled,
            Err(e) => warn!(
                error = %e,
                endpoint = %subscription.fingerprint(),
                "Server unsubscribe failed, continuing with local teardown"
            ),
        }

        let failure = match self.registry.unsubscribe(&subscription).await {
            Ok(removed) => {
                debug!(removed, "Platform subscription removed");
                None
            }
            Err(e) => {
                warn!(error = %e, "Platform unsubscribe failed");
                Some(e.to_string())
            }
        };

        if cancel.is_cancelled() {
            return ToggleOutcome::Cancelled;
        }

        self.state.lock().clear_subscription();
        match failure {
            None => {
                info!("Unsubscribed from push notifications");
                self.events.push(LifecycleEvent::Unsubscribed);
            }
            Some(error) => self.events.push(LifecycleEvent::unsubscribe_failed(error)),
        }

        ToggleOutcome::Completed
    }

    async fn send_demo(self: &Arc<Self>, message: &str) -> ToggleOutcome {
        let _guard = match self.begin_toggle() {
            Ok(guard) => guard,
            Err(outcome) => return outcome,
        };
        let cancel = self.token();

        let (subscription, ephemeral) = match self.demo_subscription().await {
            Ok(Some(found)) => found,
            Ok(None) => {
                self.events.push(LifecycleEvent::PermissionDenied);
                return ToggleOutcome::Completed;
            }
            Err(e) => {
                warn!(error = %e, "No subscription available for demo push");
                self.events.push(LifecycleEvent::demo_failed(e.to_string()));
                return ToggleOutcome::Completed;
            }
        };

        let request = DemoPushRequest::new(&subscription, message);
        match self.api.demo(&request, &cancel).await {
            Ok(()) => {
                info!(ephemeral, "Demo push sent");
                if ephemeral {
                    self.schedule_teardown(subscription);
                }
            }
            Err(e) => {
                if ephemeral {
                    self.teardown_ephemeral(&subscription).await;
                }
                if e.is_cancelled() {
                    return ToggleOutcome::Cancelled;
                }
                warn!(error = %e, "Demo push failed");
                self.events.push(LifecycleEvent::demo_failed(e.message));
            }
        }

        ToggleOutcome::Completed
    }

    /// Picks the subscription for a demo push and whether it is ephemeral.
    /// `None` means permission was not granted.
    async fn demo_subscription(&self) -> Result<Option<(PushSubscription, bool)>, PlatformError> {
        if let Some(current) = self.state.lock().subscription.clone() {
            return Ok(Some((current, false)));
        }

        if let Some(existing) = self.registry.get_subscription().await? {
            let ephemeral = self.ephemeral.lock().as_ref() == Some(&existing);
            return Ok(Some((existing, ephemeral)));
        }

        let permission = self.permission.request().await?;
        self.state.lock().permission = permission;
        if !permission.is_granted() {
            return Ok(None);
        }

        let key = ServerKey::from_base64url(&self.settings.server_key)?;
        let subscription = self.registry.subscribe(&key).await?;
        debug!(endpoint = %subscription.fingerprint(), "Created demo subscription");
        *self.ephemeral.lock() = Some(subscription.clone());
        Ok(Some((subscription, true)))
    }

    fn schedule_teardown(self: &Arc<Self>, subscription: PushSubscription) {
        let weak = Arc::downgrade(self);
        let cancel = self.token();
        let delay = self.settings.demo_teardown;
        debug!(delay_secs = delay.as_secs(), "Scheduling demo subscription teardown");

        let handle = tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => return,
                () = tokio::time::sleep(delay) => {}
            }

            let Some(inner) = weak.upgrade() else { return };
            match inner.begin_toggle() {
                Ok(_guard) => inner.teardown_ephemeral(&subscription).await,
                Err(outcome) => debug!(?outcome, "Demo teardown deferred"),
            }
            inner.reconcile_deferred().await;
        });

        if let Some(previous) = self.teardown.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Removes the demo subscription from the platform unless it was adopted meanwhile.
    async fn teardown_ephemeral(&self, subscription: &PushSubscription) {
        {
            let mut ephemeral = self.ephemeral.lock();
            if ephemeral.as_ref() != Some(subscription) {
                return;
            }
            *ephemeral = None;
        }

        if self.state.lock().subscription.as_ref() == Some(subscription) {
            debug!("Demo subscription was adopted, keeping it");
            return;
        }

        match self.registry.unsubscribe(subscription).await {
            Ok(_) => info!(endpoint = %subscription.fingerprint(), "Demo subscription removed"),
            Err(e) => warn!(error = %e, "Failed to remove demo subscription"),
        }
    }

    async fn dispose(&self) {
        if !self.initialized.swap(false, Ordering::SeqCst) {
            return;
        }

        self.cancel.lock().cancel();
        if let Some(mut watcher) = self.watcher.lock().take() {
            watcher.stop();
        }
        if let Some(reaction) = self.reaction.lock().take() {
            reaction.abort();
        }
        if let Some(teardown) = self.teardown.lock().take() {
            teardown.abort();
        }

        let pending = self.ephemeral.lock().clone();
        if let Some(subscription) = pending {
            self.teardown_ephemeral(&subscription).await;
        }

        debug!("Subscription manager disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::application::routes::ApiRoutes;
    use crate::application::services::ApiClient;
    use crate::domain::entities::Permission;
    use crate::domain::entities::push_subscription::fixtures;
    use crate::domain::ports::mocks::{
        MockPermission, MockPushRegistry, MockReply, MockSession, MockTransport,
    };
    use crate::domain::ports::{HttpMethod, MockToastPort};

    struct Harness {
        manager: SubscriptionManager,
        registry: Arc<MockPushRegistry>,
        permission: Arc<MockPermission>,
        transport: Arc<MockTransport>,
    }

    impl Harness {
        fn new(registry: MockPushRegistry, permission: MockPermission) -> Self {
            let registry = Arc::new(registry);
            let permission = Arc::new(permission);
            let transport = Arc::new(MockTransport::new());
            let mut toast = MockToastPort::new();
            toast.expect_show().never();

            let client = ApiClient::new(
                transport.clone(),
                Arc::new(MockSession::new()),
                Arc::new(toast),
                ApiRoutes::new("https://api.example", "https://app.example"),
                Duration::from_secs(5),
            );
            let settings = SubscriptionSettings {
                server_key: fixtures::server_key().to_base64url(),
                ..SubscriptionSettings::default()
            };
            let manager = SubscriptionManager::new(
                registry.clone(),
                permission.clone(),
                PushApi::new(client),
                Arc::new(EventChannel::default()),
                settings,
            );

            Self {
                manager,
                registry,
                permission,
                transport,
            }
        }

        fn server_accepts(&self) -> &Self {
            self.transport
                .on(HttpMethod::Post, "/subscriptions", MockReply::ok(&json!(null)))
                .on(HttpMethod::Post, "/subscriptions/unsubscribe", MockReply::ok(&json!(null)))
                .on(HttpMethod::Post, "/api/push-demo", MockReply::ok(&json!(null)));
            self
        }

        fn events(&self) -> Vec<LifecycleEvent> {
            self.manager.events().drain()
        }

        fn assert_consistent(&self) {
            let state = self.manager.state();
            assert_eq!(state.is_subscribed(), state.subscription.is_some());
            assert!(!state.is_toggling);
        }
    }

    async fn eventually(mut condition: impl FnMut() -> bool) {
        for _ in 0..1000 {
            if condition() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("condition never became true");
    }

    #[tokio::test]
    async fn test_initialize_mirrors_existing_subscription() {
        let h = Harness::new(
            MockPushRegistry::with_subscription("https://push.example/existing"),
            MockPermission::granted(),
        );
        assert_eq!(h.manager.phase(), ManagerPhase::Uninitialized);

        h.manager.initialize().await;

        assert_eq!(h.manager.phase(), ManagerPhase::Subscribed);
        assert_eq!(h.manager.endpoint().as_deref(), Some("https://push.example/existing"));
        assert!(!h.manager.state().is_loading);
        assert!(h.events().is_empty());
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_skips_load_when_denied() {
        let h = Harness::new(
            MockPushRegistry::with_subscription("https://push.example/existing"),
            MockPermission::new(Permission::Denied, Permission::Denied),
        );
        h.manager.initialize().await;

        assert_eq!(h.manager.phase(), ManagerPhase::Unsubscribed);
        assert_eq!(h.manager.state().permission, Permission::Denied);
    }

    #[tokio::test]
    async fn test_unsupported_platform_is_permanent() {
        let h = Harness::new(MockPushRegistry::unsupported(), MockPermission::granted());
        h.manager.initialize().await;

        assert_eq!(h.manager.phase(), ManagerPhase::Unsupported);
        assert!(!h.manager.state().is_loading);
        assert_eq!(h.manager.subscribe().await, ToggleOutcome::Unsupported);
        assert_eq!(h.manager.send_demo("hi").await, ToggleOutcome::Unsupported);
        assert_eq!(h.registry.subscribe_calls(), 0);
    }

    #[tokio::test]
    async fn test_operations_before_initialize_are_rejected() {
        let h = Harness::new(MockPushRegistry::new(), MockPermission::granted());
        assert_eq!(h.manager.subscribe().await, ToggleOutcome::NotReady);
        assert_eq!(h.registry.subscribe_calls(), 0);
    }

    #[tokio::test]
    async fn test_subscribe_happy_path() {
        let h = Harness::new(
            MockPushRegistry::new(),
            MockPermission::new(Permission::Default, Permission::Granted),
        );
        h.server_accepts();
        h.manager.initialize().await;

        assert_eq!(h.manager.subscribe().await, ToggleOutcome::Completed);

        assert_eq!(h.manager.phase(), ManagerPhase::Subscribed);
        assert_eq!(h.manager.state().permission, Permission::Granted);
        assert_eq!(h.events(), vec![LifecycleEvent::Subscribed]);
        assert_eq!(h.registry.subscribe_calls(), 1);
        assert_eq!(h.transport.count(HttpMethod::Post, "/subscriptions"), 1);
        assert_eq!(h.manager.state().subscription, h.registry.current());
        h.assert_consistent();
    }

    #[tokio::test]
    async fn test_subscribe_denied_has_no_side_effects() {
        let h = Harness::new(
            MockPushRegistry::new(),
            MockPermission::new(Permission::Default, Permission::Denied),
        );
        h.manager.initialize().await;

        assert_eq!(h.manager.subscribe().await, ToggleOutcome::Completed);

        assert_eq!(h.registry.subscribe_calls(), 0);
        assert!(h.transport.requests().is_empty());
        assert_eq!(h.events(), vec![LifecycleEvent::PermissionDenied]);
        assert_eq!(h.manager.phase(), ManagerPhase::Unsubscribed);
    }

    #[tokio::test]
    async fn test_server_failure_rolls_back_platform() {
        let h = Harness::new(MockPushRegistry::new(), MockPermission::granted());
        h.transport.on(
            HttpMethod::Post,
            "/subscriptions",
            MockReply::json(500, &json!({ "message": "db down" })),
        );
        h.manager.initialize().await;

        assert_eq!(h.manager.subscribe().await, ToggleOutcome::Completed);

        assert!(h.registry.current().is_none());
        assert_eq!(h.registry.unsubscribe_calls(), 1);
        assert_eq!(h.manager.phase(), ManagerPhase::Unsubscribed);
        assert_eq!(h.events(), vec![LifecycleEvent::subscribe_failed("db down")]);
        h.assert_consistent();
    }

    #[tokio::test]
    async fn test_platform_failure_skips_server() {
        let h = Harness::new(MockPushRegistry::new(), MockPermission::granted());
        h.registry.set_fail_subscribe(true);
        h.manager.initialize().await;

        h.manager.subscribe().await;

        assert!(h.transport.requests().is_empty());
        let events = h.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], LifecycleEvent::SubscribeFailed { .. }));
    }

    #[tokio::test]
    async fn test_subscribe_reuses_platform_subscription() {
        let h = Harness::new(MockPushRegistry::new(), MockPermission::granted());
        h.server_accepts();
        h.manager.initialize().await;

        let existing = h.registry.subscribe(&fixtures::server_key()).await.unwrap();
        assert_eq!(h.manager.subscribe().await, ToggleOutcome::Completed);

        assert_eq!(h.manager.state().subscription, Some(existing));
        assert_eq!(h.registry.subscribe_calls(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_when_subscribed_is_skipped() {
        let h = Harness::new(
            MockPushRegistry::with_subscription("https://push.example/a"),
            MockPermission::granted(),
        );
        h.manager.initialize().await;

        assert_eq!(h.manager.subscribe().await, ToggleOutcome::Skipped);
        assert!(h.transport.requests().is_empty());
        assert_eq!(h.permission.requests(), 0);
        h.assert_consistent();
    }

    #[tokio::test]
    async fn test_concurrent_toggle_is_rejected() {
        let h = Harness::new(MockPushRegistry::new(), MockPermission::granted());
        h.server_accepts();
        let gate = h.registry.gate_subscribe();
        h.manager.initialize().await;

        let first = tokio::spawn({
            let manager = h.manager.clone();
            async move { manager.subscribe().await }
        });
        eventually(|| h.registry.subscribe_calls() == 1).await;

        assert_eq!(h.manager.phase(), ManagerPhase::Toggling);
        assert_eq!(h.manager.subscribe().await, ToggleOutcome::Busy);
        assert_eq!(h.manager.send_demo("hi").await, ToggleOutcome::Busy);

        gate.add_permits(1);
        assert_eq!(first.await.unwrap(), ToggleOutcome::Completed);
        assert_eq!(h.registry.subscribe_calls(), 1);
        assert_eq!(h.events(), vec![LifecycleEvent::Subscribed]);
        h.assert_consistent();
    }

    #[tokio::test]
    async fn test_unsubscribe_when_unsubscribed_is_noop() {
        let h = Harness::new(MockPushRegistry::new(), MockPermission::granted());
        h.manager.initialize().await;
        let before = h.manager.state();

        assert_eq!(h.manager.unsubscribe().await, ToggleOutcome::Skipped);

        assert_eq!(h.manager.state(), before);
        assert!(h.transport.requests().is_empty());
        assert_eq!(h.registry.unsubscribe_calls(), 0);
        assert!(h.events().is_empty());
    }

    #[tokio::test]
    async fn test_unsubscribe_survives_server_failure() {
        let h = Harness::new(
            MockPushRegistry::with_subscription("https://push.example/a"),
            MockPermission::granted(),
        );
        h.transport
            .on(HttpMethod::Post, "/subscriptions/unsubscribe", MockReply::empty(502));
        h.manager.initialize().await;

        assert_eq!(h.manager.unsubscribe().await, ToggleOutcome::Completed);

        assert_eq!(h.manager.phase(), ManagerPhase::Unsubscribed);
        assert!(h.registry.current().is_none());
        assert_eq!(h.events(), vec![LifecycleEvent::Unsubscribed]);
    }

    #[tokio::test]
    async fn test_unsubscribe_platform_failure_still_resets_state() {
        let h = Harness::new(
            MockPushRegistry::with_subscription("https://push.example/a"),
            MockPermission::granted(),
        );
        h.server_accepts();
        h.registry.set_fail_unsubscribe(true);
        h.manager.initialize().await;

        h.manager.unsubscribe().await;

        assert_eq!(h.manager.phase(), ManagerPhase::Unsubscribed);
        let events = h.events();
        assert!(matches!(events.as_slice(), [LifecycleEvent::UnsubscribeFailed { .. }]));
        h.assert_consistent();
    }

    #[tokio::test]
    async fn test_permission_revocation_unsubscribes() {
        let h = Harness::new(
            MockPushRegistry::with_subscription("https://push.example/a"),
            MockPermission::granted(),
        );
        h.server_accepts();
        h.manager.initialize().await;

        h.permission.set(Permission::Denied);
        eventually(|| h.manager.phase() == ManagerPhase::Unsubscribed).await;

        assert_eq!(h.manager.state().permission, Permission::Denied);
        assert!(h.registry.current().is_none());
        assert_eq!(h.transport.count(HttpMethod::Post, "/subscriptions/unsubscribe"), 1);
        assert_eq!(h.events(), vec![LifecycleEvent::Unsubscribed]);
    }

    #[tokio::test]
    async fn test_permission_grant_reloads_subscription() {
        let h = Harness::new(
            MockPushRegistry::with_subscription("https://push.example/a"),
            MockPermission::new(Permission::Denied, Permission::Denied),
        );
        h.manager.initialize().await;
        assert_eq!(h.manager.phase(), ManagerPhase::Unsubscribed);

        h.permission.set(Permission::Granted);
        eventually(|| h.manager.phase() == ManagerPhase::Subscribed).await;

        assert!(h.transport.requests().is_empty());
        assert!(h.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_subscription_is_torn_down_after_delay() {
        let h = Harness::new(MockPushRegistry::new(), MockPermission::granted());
        h.server_accepts();
        h.manager.initialize().await;

        assert_eq!(h.manager.send_demo("hello").await, ToggleOutcome::Completed);

        assert!(h.registry.current().is_some());
        assert_eq!(h.manager.phase(), ManagerPhase::Unsubscribed);
        assert_eq!(h.transport.count(HttpMethod::Post, "/api/push-demo"), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(h.registry.current().is_some());

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(h.registry.current().is_none());
        assert_eq!(h.transport.count(HttpMethod::Post, "/subscriptions/unsubscribe"), 0);
        assert!(h.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_never_removes_existing_subscription() {
        let h = Harness::new(
            MockPushRegistry::with_subscription("https://push.example/a"),
            MockPermission::granted(),
        );
        h.server_accepts();
        h.manager.initialize().await;

        h.manager.send_demo("hello").await;
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert!(h.registry.current().is_some());
        assert_eq!(h.manager.phase(), ManagerPhase::Subscribed);
        assert_eq!(h.registry.unsubscribe_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_demo_removes_ephemeral_immediately() {
        let h = Harness::new(MockPushRegistry::new(), MockPermission::granted());
        h.transport
            .on(HttpMethod::Post, "/api/push-demo", MockReply::json(500, &json!({ "message": "no vapid" })));
        h.manager.initialize().await;

        h.manager.send_demo("hello").await;

        assert!(h.registry.current().is_none());
        assert_eq!(h.events(), vec![LifecycleEvent::demo_failed("no vapid")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_adopts_demo_subscription() {
        let h = Harness::new(MockPushRegistry::new(), MockPermission::granted());
        h.server_accepts();
        h.manager.initialize().await;

        h.manager.send_demo("hello").await;
        h.manager.subscribe().await;
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(h.registry.subscribe_calls(), 1);
        assert!(h.registry.current().is_some());
        assert_eq!(h.manager.phase(), ManagerPhase::Subscribed);
    }

    #[tokio::test]
    async fn test_dispose_cancels_in_flight_subscribe() {
        let h = Harness::new(MockPushRegistry::new(), MockPermission::granted());
        h.server_accepts();
        let _gate = h.transport.gate("/subscriptions");
        h.manager.initialize().await;

        let pending = tokio::spawn({
            let manager = h.manager.clone();
            async move { manager.subscribe().await }
        });
        eventually(|| h.transport.count(HttpMethod::Post, "/subscriptions") == 1).await;

        h.manager.dispose().await;

        assert_eq!(pending.await.unwrap(), ToggleOutcome::Cancelled);
        assert!(!h.manager.state().is_subscribed());
        assert!(h.events().is_empty());
        assert_eq!(h.manager.phase(), ManagerPhase::Uninitialized);
        assert!(h.registry.current().is_none());
        assert_eq!(h.registry.unsubscribe_calls(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_subscribe_is_not_mirrored_after_restart() {
        let h = Harness::new(MockPushRegistry::new(), MockPermission::granted());
        h.server_accepts();
        let _gate = h.transport.gate("/subscriptions");
        h.manager.initialize().await;

        let pending = tokio::spawn({
            let manager = h.manager.clone();
            async move { manager.subscribe().await }
        });
        eventually(|| h.transport.count(HttpMethod::Post, "/subscriptions") == 1).await;
        h.manager.dispose().await;
        assert_eq!(pending.await.unwrap(), ToggleOutcome::Cancelled);

        h.manager.initialize().await;

        assert_eq!(h.manager.phase(), ManagerPhase::Unsubscribed);
        assert!(h.manager.endpoint().is_none());
    }

    #[tokio::test]
    async fn test_revocation_during_demo_unsubscribes_afterwards() {
        let h = Harness::new(
            MockPushRegistry::with_subscription("https://push.example/a"),
            MockPermission::granted(),
        );
        h.server_accepts();
        let gate = h.transport.gate("/api/push-demo");
        h.manager.initialize().await;

        let demo = tokio::spawn({
            let manager = h.manager.clone();
            async move { manager.send_demo("hello").await }
        });
        eventually(|| h.transport.count(HttpMethod::Post, "/api/push-demo") == 1).await;

        h.permission.set(Permission::Denied);
        eventually(|| h.manager.state().permission == Permission::Denied).await;
        assert_eq!(h.manager.phase(), ManagerPhase::Toggling);

        gate.add_permits(1);
        assert_eq!(demo.await.unwrap(), ToggleOutcome::Completed);

        assert_eq!(h.manager.phase(), ManagerPhase::Unsubscribed);
        assert!(h.registry.current().is_none());
        assert_eq!(h.transport.count(HttpMethod::Post, "/subscriptions/unsubscribe"), 1);
        assert_eq!(h.events(), vec![LifecycleEvent::Unsubscribed]);
        h.assert_consistent();
    }

    #[tokio::test]
    async fn test_dispose_removes_pending_demo_subscription() {
        let h = Harness::new(MockPushRegistry::new(), MockPermission::granted());
        h.server_accepts();
        h.manager.initialize().await;

        h.manager.send_demo("hello").await;
        assert!(h.registry.current().is_some());

        h.manager.dispose().await;
        assert!(h.registry.current().is_none());
    }
}
