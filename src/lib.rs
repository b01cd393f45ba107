//! scene-bridge: loopback TCP bridge for AI-assisted control of a live
//! 3D modelling session.
//!
//! The bridge bolts a line-framed JSON-RPC request/response protocol onto a
//! single-threaded host application. It never spawns its own worker thread:
//! the host (or the bundled driver) calls
//! [`bridge::server::BridgeServer::tick`] periodically, and each tick
//! services at most one pending connection from start to finish.
//!
//! # Architecture
//!
//! - **Transport**: one newline-terminated JSON document per message, one
//!   request/response exchange per connection, loopback TCP (port 9876 by
//!   convention).
//! - **Tools**: three remote operations — `execute_code`, `describe_model`,
//!   `export_scene` — invoked via `tools/call`. Tool-level failures are data
//!   (`isError` results), never protocol errors.
//! - **Host facade**: the modelling application's scene graph, scripting
//!   engine and renderer are consumed through the traits in [`host`]; an
//!   in-memory reference host backs the dev binary and the test suite.
//!
//! # Modules
//!
//! - [`bridge`] — protocol envelope, connection framing, poll/accept server
//! - [`config`] — configuration loading and validation
//! - [`error`] — error types
//! - [`host`] — the Host Model Facade and the in-memory reference host
//! - [`tools`] — the three tool handlers

pub mod bridge;
pub mod config;
pub mod error;
pub mod host;
pub mod tools;
