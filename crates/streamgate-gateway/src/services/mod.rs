//! Request services behind the HTTP boundary.

pub mod access;
pub mod publish;

pub use access::{AccessOutcome, AccessRequest, AccessService};
pub use publish::PublishService;
