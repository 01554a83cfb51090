//! eSCL document model.
//!
//! Parsing of the capabilities and status documents a scanner serves, and
//! encoding of the scan settings document it accepts.

pub(crate) mod capabilities;
mod settings;
pub(crate) mod status;
pub mod xml;

pub use capabilities::Capabilities;
pub use settings::{ScanRegion, ScanSettings, DEFAULT_INPUT_SOURCE, REGION_UNITS, SETTINGS_VERSION};
pub use status::{JobInfo, ScannerStatus};
