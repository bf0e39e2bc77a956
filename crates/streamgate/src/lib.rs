//! Top-level facade crate for streamgate.
//!
//! Re-exports the decision core and the gateway library so users can depend on a single crate.

pub mod core {
    pub use streamgate_core::*;
}

pub mod gateway {
    pub use streamgate_gateway::*;
}
