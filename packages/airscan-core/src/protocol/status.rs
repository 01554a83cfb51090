use super::xml::{self, PWG_NS, SCAN_NS};
use crate::error::{EsclError, Result};
use serde::{Serialize, Serializer};

/// Snapshot of a `ScannerStatus` document. Never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannerStatus {
    /// Global scanner state, e.g. `Idle`, `Processing`, `Testing`
    pub state: String,
    pub jobs: Vec<JobInfo>,
}

/// One `scan:JobInfo` entry.
///
/// Numeric fields are kept as sent and only parsed when read, so a bad
/// value on one job does not affect the others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    pub uuid: String,
    #[serde(serialize_with = "serialize_u64")]
    age: Option<String>,
    #[serde(serialize_with = "serialize_u32")]
    images_to_transfer: Option<String>,
    pub job_state: Option<String>,
}

// JSON output shows unparseable numbers as null
fn serialize_u64<S: Serializer>(
    raw: &Option<String>,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    raw.as_deref().and_then(|v| v.parse::<u64>().ok()).serialize(s)
}

fn serialize_u32<S: Serializer>(
    raw: &Option<String>,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    raw.as_deref().and_then(|v| v.parse::<u32>().ok()).serialize(s)
}

impl ScannerStatus {
    pub fn parse(body: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(body)?;
        let root = doc.root_element();

        let state = xml::find(root, PWG_NS, "State")
            .map(|n| xml::text(n).to_string())
            .ok_or_else(|| EsclError::malformed("missing <State>"))?;

        // Entries without a UUID can never match a tracked job
        let jobs = xml::descendants(root, SCAN_NS, "JobInfo")
            .filter_map(JobInfo::from_node)
            .collect();

        Ok(Self { state, jobs })
    }

    /// Job entry whose UUID equals `uuid`.
    pub fn job(&self, uuid: &str) -> Option<&JobInfo> {
        self.jobs.iter().find(|j| j.uuid == uuid)
    }
}

impl JobInfo {
    fn from_node(node: roxmltree::Node<'_, '_>) -> Option<Self> {
        let field = |ns: &'static str, name: &'static str| {
            xml::child(node, ns, name).map(|n| xml::text(n).to_string())
        };

        Some(Self {
            uuid: field(PWG_NS, "JobUuid")?,
            age: field(SCAN_NS, "Age"),
            images_to_transfer: field(PWG_NS, "ImagesToTransfer"),
            job_state: field(PWG_NS, "JobState"),
        })
    }

    /// Seconds since the job started
    pub fn age(&self) -> Result<Option<u64>> {
        self.age
            .as_deref()
            .map(|raw| xml::parse_number(raw, "Age"))
            .transpose()
    }

    pub fn images_to_transfer(&self) -> Result<Option<u32>> {
        self.images_to_transfer
            .as_deref()
            .map(|raw| xml::parse_number(raw, "ImagesToTransfer"))
            .transpose()
    }

    /// A finished image is waiting to be downloaded.
    pub fn has_images(&self) -> Result<bool> {
        Ok(self.images_to_transfer()?.unwrap_or(0) > 0)
    }
}

#[cfg(test)]
pub(crate) fn sample_status(state: &str, jobs: &[(&str, u64, u32)]) -> String {
    let mut body = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<scan:ScannerStatus xmlns:pwg="http://www.pwg.org/schemas/2010/12/sm" xmlns:scan="http://schemas.hp.com/imaging/escl/2011/05/03">
  <pwg:Version>2.63</pwg:Version>
  <pwg:State>{}</pwg:State>
  <scan:Jobs>"#,
        state
    );
    for (uuid, age, images) in jobs {
        body.push_str(&format!(
            r#"
    <scan:JobInfo>
      <pwg:JobUri>/eSCL/ScanJobs/{uuid}</pwg:JobUri>
      <pwg:JobUuid>{uuid}</pwg:JobUuid>
      <scan:Age>{age}</scan:Age>
      <pwg:ImagesCompleted>0</pwg:ImagesCompleted>
      <pwg:ImagesToTransfer>{images}</pwg:ImagesToTransfer>
      <pwg:JobState>Processing</pwg:JobState>
    </scan:JobInfo>"#
        ));
    }
    body.push_str("\n  </scan:Jobs>\n</scan:ScannerStatus>");
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_state_and_jobs() {
        let body = sample_status("Processing", &[("old-job", 300, 0), ("abc-123", 7, 1)]);
        let status = ScannerStatus::parse(&body).unwrap();

        assert_eq!(status.state, "Processing");
        assert_eq!(status.jobs.len(), 2);

        let job = status.job("abc-123").unwrap();
        assert_eq!(job.age().unwrap(), Some(7));
        assert_eq!(job.images_to_transfer().unwrap(), Some(1));
        assert_eq!(job.job_state.as_deref(), Some("Processing"));
        assert!(job.has_images().unwrap());
        assert!(!status.job("old-job").unwrap().has_images().unwrap());
    }

    #[test]
    fn test_job_state_is_not_global_state() {
        // pwg:JobState inside JobInfo must not be mistaken for pwg:State
        let body = sample_status("Idle", &[("abc-123", 1, 0)]);
        assert_eq!(ScannerStatus::parse(&body).unwrap().state, "Idle");
    }

    #[test]
    fn test_unknown_job() {
        let body = sample_status("Idle", &[]);
        let status = ScannerStatus::parse(&body).unwrap();
        assert!(status.jobs.is_empty());
        assert!(status.job("abc-123").is_none());
    }

    #[test]
    fn test_missing_state() {
        let body = sample_status("Idle", &[]).replace("<pwg:State>Idle</pwg:State>", "");
        assert!(matches!(
            ScannerStatus::parse(&body),
            Err(EsclError::MalformedResponse(_))
        ));
    }

    fn with_extra_job(body: &str, entry: &str) -> String {
        body.replace("</scan:Jobs>", &format!("{}\n  </scan:Jobs>", entry))
    }

    #[test]
    fn test_bad_numbers_on_other_jobs_are_isolated() {
        let body = with_extra_job(
            &sample_status("Processing", &[("abc-123", 9, 1)]),
            "<scan:JobInfo><pwg:JobUuid>other</pwg:JobUuid><scan:Age></scan:Age>\
             <pwg:ImagesToTransfer>lots</pwg:ImagesToTransfer></scan:JobInfo>",
        );
        let status = ScannerStatus::parse(&body).unwrap();

        assert_eq!(status.state, "Processing");
        let job = status.job("abc-123").unwrap();
        assert!(job.has_images().unwrap());
        assert_eq!(job.age().unwrap(), Some(9));

        let other = status.job("other").unwrap();
        assert!(matches!(other.age(), Err(EsclError::MalformedResponse(_))));
        assert!(other.has_images().is_err());
    }

    #[test]
    fn test_job_without_uuid_is_skipped() {
        let body = with_extra_job(
            &sample_status("Idle", &[("abc-123", 1, 0)]),
            "<scan:JobInfo><scan:Age>3</scan:Age></scan:JobInfo>",
        );
        let status = ScannerStatus::parse(&body).unwrap();
        assert_eq!(status.jobs.len(), 1);
        assert_eq!(status.jobs[0].uuid, "abc-123");
    }

    #[test]
    fn test_json_shows_numbers() {
        let body = sample_status("Idle", &[("abc-123", 4, 2)]);
        let status = ScannerStatus::parse(&body).unwrap();
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["jobs"][0]["age"], 4);
        assert_eq!(json["jobs"][0]["imagesToTransfer"], 2);
    }
}
