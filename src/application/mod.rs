//! Application layer with services, use cases and DTOs.

/// Composition root.
pub mod context;
/// Data transfer objects.
pub mod dto;
/// Server route table.
pub mod routes;
/// Stateful application services.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use context::{ClientContext, ClientPorts, ClientSettings};
pub use dto::{CallOptions, ToastPolicy};
pub use routes::ApiRoutes;
pub use services::{
    ApiClient, AuthSession, DEFAULT_TOAST_KEY, EventChannel, PushApi, SessionStatus,
    SubscriptionManager, SubscriptionSettings, ToggleOutcome,
};
pub use use_cases::DeliverPushUseCase;
