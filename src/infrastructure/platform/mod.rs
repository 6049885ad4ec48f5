//! Native stand-ins for the browser push platform.

mod local_registry;
mod stored_permission;

pub use local_registry::LocalPushRegistry;
pub use stored_permission::{PermissionPrompt, StoredPermission};
