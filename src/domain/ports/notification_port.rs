use crate::domain::entities::PushPayload;

/// Port for system notifications.
pub trait NotificationPort: Send + Sync {
    /// Shows a system notification for a received push message.
    fn display(&self, payload: &PushPayload);
}
