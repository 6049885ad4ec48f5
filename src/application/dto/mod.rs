//! Data transfer objects for the application layer.

mod call_options;
mod envelope;
mod push_dto;

pub use call_options::{CallOptions, ToastPolicy};
pub use envelope::{ApiEnvelope, ErrorDetail, parse_error_body};
pub use push_dto::{CheckSubscriptionResponse, DemoPushRequest, EndpointRequest};
