//! The protocol server: envelope types, connection framing, and the
//! poll/accept loop.
//!
//! Submodules:
//!
//! - [`protocol`] — JSON-RPC 2.0 envelope and tool-result types
//! - [`connection`] — one-line-in/one-line-out framing over an accepted
//!   TCP stream
//! - [`server`] — lifecycle, authentication gate, dispatch and the
//!   cooperative tick loop

pub mod connection;
pub mod protocol;
pub mod server;
