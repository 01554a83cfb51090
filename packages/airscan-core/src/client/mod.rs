//! Scanner client module.
//!
//! Provides the blocking eSCL client and its configuration.

mod scan_client;
pub mod config;

pub use scan_client::{ScanClient, ScanJob};
pub use config::{load_client_config, ClientConfig, ConfigSource};
