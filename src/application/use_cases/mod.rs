//! Use case implementations.

mod deliver_push_use_case;

pub use deliver_push_use_case::DeliverPushUseCase;
