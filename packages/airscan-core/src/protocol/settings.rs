use super::capabilities::Capabilities;
use super::xml::{self, PWG_NS, SCAN_NS};
use crate::error::{EsclError, Result};
use serde::Serialize;

/// `pwg:Version` written into every request
pub const SETTINGS_VERSION: &str = "2.63";

/// Unit of the scan region, matching the capability Min/Max values
pub const REGION_UNITS: &str = "escl:ThreeHundredthsOfInches";

/// Flatbed only
pub const DEFAULT_INPUT_SOURCE: &str = "Platen";

/// Area of the platen to scan, in three-hundredths of an inch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRegion {
    pub x_offset: u32,
    pub y_offset: u32,
    pub width: u32,
    pub height: u32,
}

/// Parameters of a single flatbed scan job.
///
/// Values are sent as given. [`ScanSettings::validate`] checks them against
/// a scanner's capabilities when the caller wants that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSettings {
    pub region: ScanRegion,
    /// MIME type, one of [`Capabilities::document_formats`]
    pub document_format: String,
    pub x_resolution: u32,
    pub y_resolution: u32,
    /// One of [`Capabilities::color_modes`]
    pub color_mode: String,
}

impl ScanSettings {
    pub fn new(
        region: ScanRegion,
        document_format: impl Into<String>,
        x_resolution: u32,
        y_resolution: u32,
        color_mode: impl Into<String>,
    ) -> Self {
        Self {
            region,
            document_format: document_format.into(),
            x_resolution,
            y_resolution,
            color_mode: color_mode.into(),
        }
    }

    /// Whole platen at `resolution` DPI with the first advertised format
    /// and color mode.
    pub fn full_platen(caps: &Capabilities, resolution: u32) -> Result<Self> {
        let document_format = caps
            .document_formats()
            .first()
            .ok_or_else(|| EsclError::InvalidSettings("scanner advertises no document format".into()))?;
        let color_mode = caps
            .color_modes()
            .first()
            .ok_or_else(|| EsclError::InvalidSettings("scanner advertises no color mode".into()))?;
        let (width, height) = caps.max_size();

        Ok(Self::new(
            ScanRegion {
                x_offset: 0,
                y_offset: 0,
                width,
                height,
            },
            document_format.clone(),
            resolution,
            resolution,
            color_mode.clone(),
        ))
    }

    /// Check the settings against what the scanner advertises.
    pub fn validate(&self, caps: &Capabilities) -> Result<()> {
        if !caps.document_formats().iter().any(|f| f == &self.document_format) {
            return Err(EsclError::InvalidSettings(format!(
                "unsupported document format {}",
                self.document_format
            )));
        }
        if !caps.color_modes().iter().any(|m| m == &self.color_mode) {
            return Err(EsclError::InvalidSettings(format!(
                "unsupported color mode {}",
                self.color_mode
            )));
        }
        if !caps.resolutions().contains(&(self.x_resolution, self.y_resolution)) {
            return Err(EsclError::InvalidSettings(format!(
                "unsupported resolution {}x{}",
                self.x_resolution, self.y_resolution
            )));
        }

        let (min_w, min_h) = caps.min_size();
        let (max_w, max_h) = caps.max_size();
        let region = &self.region;
        if region.width < min_w || region.height < min_h {
            return Err(EsclError::InvalidSettings(format!(
                "region {}x{} is below the minimum {}x{}",
                region.width, region.height, min_w, min_h
            )));
        }
        let right = u64::from(region.x_offset) + u64::from(region.width);
        let bottom = u64::from(region.y_offset) + u64::from(region.height);
        if right > u64::from(max_w) || bottom > u64::from(max_h) {
            return Err(EsclError::InvalidSettings(format!(
                "region extends past the platen ({}x{})",
                max_w, max_h
            )));
        }
        Ok(())
    }

    /// Encode as an `escl:ScanSettings` request body.
    pub fn to_xml(&self) -> String {
        let r = &self.region;
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<escl:ScanSettings xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:pwg="{pwg}" xmlns:escl="{scan}">
  <pwg:Version>{version}</pwg:Version>
  <pwg:ScanRegions pwg:MustHonor="false">
    <pwg:ScanRegion>
      <pwg:ContentRegionUnits>{units}</pwg:ContentRegionUnits>
      <pwg:XOffset>{x}</pwg:XOffset>
      <pwg:YOffset>{y}</pwg:YOffset>
      <pwg:Width>{width}</pwg:Width>
      <pwg:Height>{height}</pwg:Height>
    </pwg:ScanRegion>
  </pwg:ScanRegions>
  <escl:DocumentFormatExt>{format}</escl:DocumentFormatExt>
  <pwg:InputSource>{source}</pwg:InputSource>
  <escl:XResolution>{x_res}</escl:XResolution>
  <escl:YResolution>{y_res}</escl:YResolution>
  <escl:ColorMode>{color}</escl:ColorMode>
</escl:ScanSettings>"#,
            pwg = PWG_NS,
            scan = SCAN_NS,
            version = SETTINGS_VERSION,
            units = REGION_UNITS,
            x = r.x_offset,
            y = r.y_offset,
            width = r.width,
            height = r.height,
            format = xml::escape(&self.document_format),
            source = DEFAULT_INPUT_SOURCE,
            x_res = self.x_resolution,
            y_res = self.y_resolution,
            color = xml::escape(&self.color_mode),
        )
    }
}
