//! streamgate gateway library entry.
//!
//! This crate wires config, the ledger collaborators, the access and publish
//! services, metrics, and the HTTP transport into one gateway. It is consumed
//! by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod ledger;
pub mod obs;
pub mod ops;
pub mod router;
pub mod services;
pub mod transport;
