//! Domain layer with core entities, errors and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{LifecycleEvent, Permission, PushSubscription, SubscriptionState};
pub use errors::{ApiError, PlatformError};
pub use ports::{HttpTransport, PermissionPort, PushRegistryPort};
