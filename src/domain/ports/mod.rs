mod http_transport_port;
mod notification_port;
mod permission_port;
mod push_registry_port;
mod session_port;
mod toast_port;

pub use http_transport_port::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
pub use notification_port::NotificationPort;
pub use permission_port::PermissionPort;
pub use push_registry_port::PushRegistryPort;
pub use session_port::SessionPort;
pub use toast_port::{ToastLevel, ToastPort};

#[cfg(test)]
pub use toast_port::MockToastPort;

#[cfg(test)]
pub mod mocks {
    pub use super::http_transport_port::mock::{MockReply, MockTransport};
    pub use super::notification_port::mock::MockNotificationPort;
    pub use super::permission_port::mock::MockPermission;
    pub use super::push_registry_port::mock::MockPushRegistry;
    pub use super::session_port::mock::MockSession;
}
