//! Domain entity definitions.

mod lifecycle_event;
mod permission;
mod push_payload;
pub(crate) mod push_subscription;
mod session;
mod subscription_state;

pub use lifecycle_event::LifecycleEvent;
pub use permission::{Permission, PermissionTransition};
pub use push_payload::PushPayload;
pub use push_subscription::{PushSubscription, ServerKey, SubscriptionKeys, endpoint_fingerprint};
pub use session::{SessionCookie, UserInfo};
pub use subscription_state::{ManagerPhase, SubscriptionState};
