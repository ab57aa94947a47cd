//! HTTP sidecar that launches porklock uploads and downloads and tracks the
//! status of every request.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod run_gate;
pub mod scheduler;
pub mod server;
pub mod transfer_objects;
pub mod worker;
