// ABOUTME: Library root for berth - exposes the pipeline, reconciler and commands.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod manifest;
pub mod network;
pub mod output;
pub mod pipeline;
pub mod ssh;
pub mod types;
