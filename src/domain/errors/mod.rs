//! Domain error types.

mod api_error;
mod platform_error;

pub use api_error::{ApiError, ApiErrorKind};
pub use platform_error::PlatformError;
