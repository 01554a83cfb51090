use super::xml::{self, PWG_NS, SCAN_NS};
use crate::error::{EsclError, Result};
use serde::Serialize;

/// What a scanner advertises in its `ScannerCapabilities` document.
///
/// Lists keep document order. Sizes are `(width, height)` in
/// three-hundredths of an inch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    make_and_model: Option<String>,
    version: Option<String>,
    color_modes: Vec<String>,
    resolutions: Vec<(u32, u32)>,
    document_formats: Vec<String>,
    min_size: (u32, u32),
    max_size: (u32, u32),
}

impl Capabilities {
    /// Parse a `ScannerCapabilities` document.
    pub fn parse(body: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(body)?;
        let root = doc.root_element();

        let color_modes = xml::descendants(root, SCAN_NS, "ColorMode")
            .map(|n| xml::text(n).to_string())
            .collect();

        let resolutions = xml::descendants(root, SCAN_NS, "DiscreteResolution")
            .map(|entry| -> Result<(u32, u32)> {
                let x = xml::child(entry, SCAN_NS, "XResolution")
                    .ok_or_else(|| EsclError::malformed("DiscreteResolution without XResolution"))?;
                let y = xml::child(entry, SCAN_NS, "YResolution")
                    .ok_or_else(|| EsclError::malformed("DiscreteResolution without YResolution"))?;
                Ok((xml::number(x)?, xml::number(y)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let document_formats = xml::descendants(root, SCAN_NS, "DocumentFormatExt")
            .map(|n| xml::text(n).to_string())
            .collect();

        let min_size = (
            xml::required_number(root, SCAN_NS, "MinWidth")?,
            xml::required_number(root, SCAN_NS, "MinHeight")?,
        );
        let max_size = (
            xml::required_number(root, SCAN_NS, "MaxWidth")?,
            xml::required_number(root, SCAN_NS, "MaxHeight")?,
        );

        Ok(Self {
            make_and_model: xml::child(root, PWG_NS, "MakeAndModel").map(|n| xml::text(n).to_string()),
            version: xml::child(root, PWG_NS, "Version").map(|n| xml::text(n).to_string()),
            color_modes,
            resolutions,
            document_formats,
            min_size,
            max_size,
        })
    }

    pub fn make_and_model(&self) -> Option<&str> {
        self.make_and_model.as_deref()
    }

    /// eSCL schema version the scanner reports
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn color_modes(&self) -> &[String] {
        &self.color_modes
    }

    /// Discrete `(x, y)` resolution pairs in DPI
    pub fn resolutions(&self) -> &[(u32, u32)] {
        &self.resolutions
    }

    /// Supported output formats (MIME types)
    pub fn document_formats(&self) -> &[String] {
        &self.document_formats
    }

    pub fn min_size(&self) -> (u32, u32) {
        self.min_size
    }

    pub fn max_size(&self) -> (u32, u32) {
        self.max_size
    }
}

#[cfg(test)]
pub(crate) const SAMPLE_CAPABILITIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<scan:ScannerCapabilities xmlns:pwg="http://www.pwg.org/schemas/2010/12/sm" xmlns:scan="http://schemas.hp.com/imaging/escl/2011/05/03">
  <pwg:Version>2.63</pwg:Version>
  <pwg:MakeAndModel>HP ENVY 5540 series</pwg:MakeAndModel>
  <scan:Platen>
    <scan:PlatenInputCaps>
      <scan:MinWidth>638</scan:MinWidth>
      <scan:MaxWidth>2550</scan:MaxWidth>
      <scan:MinHeight>10</scan:MinHeight>
      <scan:MaxHeight>3507</scan:MaxHeight>
      <scan:SettingProfiles>
        <scan:SettingProfile>
          <scan:ColorModes>
            <scan:ColorMode>Grayscale8</scan:ColorMode>
            <scan:ColorMode>RGB24</scan:ColorMode>
          </scan:ColorModes>
          <scan:DocumentFormats>
            <pwg:DocumentFormat>application/pdf</pwg:DocumentFormat>
            <pwg:DocumentFormat>image/jpeg</pwg:DocumentFormat>
            <scan:DocumentFormatExt>application/pdf</scan:DocumentFormatExt>
            <scan:DocumentFormatExt>image/jpeg</scan:DocumentFormatExt>
          </scan:DocumentFormats>
          <scan:SupportedResolutions>
            <scan:DiscreteResolutions>
              <scan:DiscreteResolution>
                <scan:XResolution>75</scan:XResolution>
                <scan:YResolution>75</scan:YResolution>
              </scan:DiscreteResolution>
              <scan:DiscreteResolution>
                <scan:XResolution>200</scan:XResolution>
                <scan:YResolution>200</scan:YResolution>
              </scan:DiscreteResolution>
              <scan:DiscreteResolution>
                <scan:XResolution>300</scan:XResolution>
                <scan:YResolution>600</scan:YResolution>
              </scan:DiscreteResolution>
            </scan:DiscreteResolutions>
          </scan:SupportedResolutions>
        </scan:SettingProfile>
      </scan:SettingProfiles>
    </scan:PlatenInputCaps>
  </scan:Platen>
</scan:ScannerCapabilities>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sample() {
        let caps = Capabilities::parse(SAMPLE_CAPABILITIES).unwrap();

        assert_eq!(caps.make_and_model(), Some("HP ENVY 5540 series"));
        assert_eq!(caps.version(), Some("2.63"));
        assert_eq!(caps.color_modes(), ["Grayscale8", "RGB24"]);
        assert_eq!(caps.document_formats(), ["application/pdf", "image/jpeg"]);
        assert_eq!(caps.min_size(), (638, 10));
        assert_eq!(caps.max_size(), (2550, 3507));
    }

    #[test]
    fn test_resolutions_keep_document_order() {
        let caps = Capabilities::parse(SAMPLE_CAPABILITIES).unwrap();
        assert_eq!(caps.resolutions(), [(75, 75), (200, 200), (300, 600)]);
    }

    #[test]
    fn test_missing_size_is_malformed() {
        let body = SAMPLE_CAPABILITIES.replace("<scan:MaxHeight>3507</scan:MaxHeight>", "");
        let err = Capabilities::parse(&body).unwrap_err();
        assert!(matches!(err, EsclError::MalformedResponse(_)));
    }

    #[test]
    fn test_not_xml() {
        let err = Capabilities::parse("<html><body>404").unwrap_err();
        assert!(matches!(err, EsclError::Xml(_)));
    }
}
