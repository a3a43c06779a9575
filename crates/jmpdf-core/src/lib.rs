pub mod config;
pub mod logging;

pub mod album;
pub mod bridge;
pub mod client;
pub mod discovery;
pub mod error;
pub mod option;
pub mod orchestrator;
pub mod output_guard;
pub mod report;
pub mod session;
