//! Observable push-subscription state.

use super::{Permission, PushSubscription};

/// Snapshot of the subscription lifecycle as seen by the UI.
///
/// `is_subscribed` is derived from `subscription`, so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionState {
    /// Initial load has not finished yet.
    pub is_loading: bool,
    /// A subscribe or unsubscribe is in flight.
    pub is_toggling: bool,
    /// Platform capability is missing; permanent once set.
    pub is_unsupported: bool,
    /// Mirror of the platform subscription, if any.
    pub subscription: Option<PushSubscription>,
    /// Last known notification permission.
    pub permission: Permission,
}

impl Default for SubscriptionState {
    fn default() -> Self {
        Self {
            is_loading: true,
            is_toggling: false,
            is_unsupported: false,
            subscription: None,
            permission: Permission::Default,
        }
    }
}

impl SubscriptionState {
    /// Returns whether a subscription is currently mirrored.
    #[must_use]
    pub const fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Current endpoint, if subscribed.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.subscription.as_ref().map(PushSubscription::endpoint)
    }

    /// Replaces the mirrored subscription.
    pub fn set_subscription(&mut self, subscription: Option<PushSubscription>) {
        self.subscription = subscription;
    }

    /// Drops the mirrored subscription.
    pub fn clear_subscription(&mut self) {
        self.subscription = None;
    }
}

/// Lifecycle phase derived from [`SubscriptionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManagerPhase {
    /// `initialize()` has not been called.
    #[default]
    Uninitialized,
    /// Initial load in progress.
    Loading,
    /// No subscription.
    Unsubscribed,
    /// Subscription registered.
    Subscribed,
    /// Subscribe or unsubscribe in flight.
    Toggling,
    /// Platform lacks service-worker or notification support.
    Unsupported,
}

impl ManagerPhase {
    /// Derives the phase of an initialized manager from its state.
    #[must_use]
    pub const fn of(state: &SubscriptionState) -> Self {
        if state.is_unsupported {
            Self::Unsupported
        } else if state.is_loading {
            Self::Loading
        } else if state.is_toggling {
            Self::Toggling
        } else if state.is_subscribed() {
            Self::Subscribed
        } else {
            Self::Unsubscribed
        }
    }
}

impl std::fmt::Display for ManagerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Loading => write!(f, "Loading"),
            Self::Unsubscribed => write!(f, "Unsubscribed"),
            Self::Subscribed => write!(f, "Subscribed"),
            Self::Toggling => write!(f, "Toggling"),
            Self::Unsupported => write!(f, "Unsupported"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::push_subscription::fixtures;

    #[test]
    fn test_default_state_is_loading() {
        let state = SubscriptionState::default();
        assert!(state.is_loading);
        assert!(!state.is_subscribed());
        assert_eq!(ManagerPhase::of(&state), ManagerPhase::Loading);
    }

    #[test]
    fn test_phase_precedence() {
        let mut state = SubscriptionState {
            is_loading: false,
            ..SubscriptionState::default()
        };
        assert_eq!(ManagerPhase::of(&state), ManagerPhase::Unsubscribed);

        state.set_subscription(Some(fixtures::subscription("https://push.example/a")));
        assert_eq!(ManagerPhase::of(&state), ManagerPhase::Subscribed);
        assert_eq!(state.endpoint(), Some("https://push.example/a"));

        state.is_toggling = true;
        assert_eq!(ManagerPhase::of(&state), ManagerPhase::Toggling);

        state.is_unsupported = true;
        assert_eq!(ManagerPhase::of(&state), ManagerPhase::Unsupported);
    }

    #[test]
    fn test_clear_subscription() {
        let mut state = SubscriptionState::default();
        state.set_subscription(Some(fixtures::subscription("https://push.example/a")));
        state.clear_subscription();
        assert!(!state.is_subscribed());
        assert!(state.endpoint().is_none());
    }
}
