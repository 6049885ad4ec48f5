//! Session teardown port definition.

/// Port invoked when the session can no longer be refreshed.
pub trait SessionPort: Send + Sync {
    /// Drops all local session state. Called once per failed refresh.
    fn force_logout(&self);
}
