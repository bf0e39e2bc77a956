//! HTTP transport: JSON codecs and stream handlers.

pub mod codec;
pub mod http;
