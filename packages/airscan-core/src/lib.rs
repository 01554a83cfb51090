//! AirScan Core Library
//!
//! This crate provides a blocking client for the eSCL (AirScan) scanning
//! protocol spoken by most network scanners:
//! - Capability discovery (color modes, resolutions, formats, scan area)
//! - Flatbed scan job submission
//! - Status polling (scanner state, job age, images ready for transfer)
//! - Retrieval of the finished document
//!
//! A [`ScanClient`] tracks at most one outstanding job. Callers drive the
//! polling loop themselves.
//!
//! # Example
//!
//! ```no_run
//! use airscan_core::{ScanClient, ScanSettings};
//! use std::{thread, time::Duration};
//!
//! fn main() -> airscan_core::Result<()> {
//!     let mut client = ScanClient::new("192.168.1.11")?;
//!
//!     let settings = ScanSettings::full_platen(client.capabilities(), 200)?;
//!     client.submit_scan(&settings)?;
//!
//!     while !client.job_ended()? {
//!         println!("Job age: {}", client.job_age()?);
//!         thread::sleep(Duration::from_millis(500));
//!     }
//!
//!     if let Some(document) = client.get_file()? {
//!         std::fs::write("scan.jpg", document).expect("write scan");
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod protocol;

// Re-export commonly used types
pub use client::{ClientConfig, ConfigSource, ScanClient, ScanJob};
pub use error::{EsclError, Result};
pub use protocol::{Capabilities, JobInfo, ScanRegion, ScanSettings, ScannerStatus};
