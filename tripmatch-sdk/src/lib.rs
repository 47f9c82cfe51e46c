//! Shared wire types for the Tripmatch service.
//!
//! The server and every client speak the types in [`objects`]. The typed
//! HTTP / WebSocket client lives in [`client`] behind the `client` feature.

#![forbid(unsafe_code)]

#[cfg(feature = "client")]
pub mod client;
pub mod identity;
pub mod objects;
