use super::config::{normalize_base_path, ClientConfig};
use crate::error::{EsclError, Result};
use crate::protocol::{Capabilities, ScanSettings, ScannerStatus};
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{StatusCode, Url};
use serde::Serialize;
use std::net::Ipv6Addr;
use std::sync::OnceLock;

const CAPABILITIES_ENDPOINT: &str = "ScannerCapabilities";
const STATUS_ENDPOINT: &str = "ScannerStatus";
const JOBS_ENDPOINT: &str = "ScanJobs";
const NEXT_DOCUMENT: &str = "NextDocument";

/// Job id is the last path segment of `.../ScanJobs/<id>`
fn job_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/ScanJobs/([A-Za-z0-9-]+)$").expect("valid job id pattern"))
}

/// `http://host:port/` for a bare host name or IP address.
///
/// The port always comes from the configuration, so an address that
/// carries its own port is rejected.
fn scanner_origin(host: &str, port: u16) -> Result<Url> {
    let host = host.trim();
    let is_bare_ipv6 = host
        .split('%')
        .next()
        .is_some_and(|addr| addr.parse::<Ipv6Addr>().is_ok());
    let authority = if is_bare_ipv6 {
        format!("[{}]", host)
    } else {
        host.to_string()
    };

    let has_port = if authority.starts_with('[') {
        authority.contains("]:")
    } else {
        authority.contains(':')
    };
    if host.is_empty() || has_port || authority.contains('/') {
        return Err(EsclError::InvalidHost(format!(
            "{:?} (give a host name or IP address without scheme or port)",
            host
        )));
    }

    let mut origin = Url::parse(&format!("http://{}/", authority))
        .map_err(|e| EsclError::InvalidHost(format!("{}: {}", host, e)))?;
    origin
        .set_port(Some(port))
        .map_err(|_| EsclError::InvalidHost(host.to_string()))?;
    Ok(origin)
}

/// A scan job accepted by the scanner and not yet retrieved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanJob {
    id: String,
    download_url: String,
}

impl ScanJob {
    /// Build from the `Location` header of a `201 Created` answer.
    ///
    /// Relative locations are resolved against `origin`. Absolute ones are
    /// kept as sent.
    fn from_location(origin: &Url, location: &str) -> Result<Self> {
        let location = location.trim();
        let resolved = match Url::parse(location) {
            Ok(_) => location.to_string(),
            Err(_) => origin
                .join(location)
                .map_err(|e| EsclError::InvalidLocation(format!("{}: {}", location, e)))?
                .to_string(),
        };
        let job_url = resolved.trim_end_matches('/');

        let id = job_id_pattern()
            .captures(job_url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| EsclError::InvalidLocation(location.to_string()))?;

        Ok(Self {
            id,
            download_url: format!("{}/{}", job_url, NEXT_DOCUMENT),
        })
    }

    /// Scanner-assigned job UUID
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn download_url(&self) -> &str {
        &self.download_url
    }
}

/// Blocking eSCL client for one scanner.
///
/// Capabilities are fetched once on construction. The client tracks a
/// single job at a time: submit, poll [`job_ended`](Self::job_ended), then
/// [`get_file`](Self::get_file). It is not meant to be shared between
/// concurrent callers.
#[derive(Debug)]
pub struct ScanClient {
    http: Client,
    /// `http://host:port/`
    origin: Url,
    /// `http://host:port/eSCL/`
    base_url: Url,
    config: ClientConfig,
    capabilities: Capabilities,
    job: Option<ScanJob>,
}

impl ScanClient {
    /// Connect to the scanner at `host` with default settings.
    pub fn new(host: &str) -> Result<Self> {
        Self::with_config(host, ClientConfig::default())
    }

    /// Connect to the scanner at `host` and fetch its capabilities.
    pub fn with_config(host: &str, config: ClientConfig) -> Result<Self> {
        // Scanners live on the local network
        let http = Client::builder()
            .no_proxy()
            .timeout(config.timeout)
            .build()?;

        let origin = scanner_origin(host, config.port)?;
        let base_url = origin
            .join(&normalize_base_path(&config.base_path))
            .map_err(|e| EsclError::InvalidHost(format!("{}: {}", config.base_path, e)))?;

        tracing::debug!("Connecting to eSCL scanner at {}", base_url);

        let mut client = Self {
            http,
            origin,
            base_url,
            config,
            capabilities: Capabilities::default(),
            job: None,
        };
        client.refresh_capabilities()?;
        Ok(client)
    }

    fn endpoint(&self, name: &str) -> Result<Url> {
        self.base_url
            .join(name)
            .map_err(|e| EsclError::InvalidHost(format!("{}{}: {}", self.base_url, name, e)))
    }

    fn get_text(&self, endpoint: &str) -> Result<String> {
        let url = self.endpoint(endpoint)?;
        tracing::debug!("GET {}", url);

        let body = self.http.get(url).send()?.error_for_status()?.text()?;
        Ok(body)
    }

    /// Re-fetch the capabilities document, replacing the cached copy.
    pub fn refresh_capabilities(&mut self) -> Result<&Capabilities> {
        let body = self.get_text(CAPABILITIES_ENDPOINT)?;
        self.capabilities = Capabilities::parse(&body)?;

        tracing::debug!(
            "Scanner supports {} color modes, {} resolutions, {} formats",
            self.capabilities.color_modes().len(),
            self.capabilities.resolutions().len(),
            self.capabilities.document_formats().len()
        );
        Ok(&self.capabilities)
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn color_modes(&self) -> &[String] {
        self.capabilities.color_modes()
    }

    pub fn resolutions(&self) -> &[(u32, u32)] {
        self.capabilities.resolutions()
    }

    pub fn document_formats(&self) -> &[String] {
        self.capabilities.document_formats()
    }

    pub fn min_size(&self) -> (u32, u32) {
        self.capabilities.min_size()
    }

    pub fn max_size(&self) -> (u32, u32) {
        self.capabilities.max_size()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The job currently tracked, if any
    pub fn current_job(&self) -> Option<&ScanJob> {
        self.job.as_ref()
    }

    /// Stop tracking the current job without retrieving it.
    pub fn forget_job(&mut self) -> Option<ScanJob> {
        let job = self.job.take();
        if let Some(job) = &job {
            tracing::info!("Dropped scan job {}", job.id);
        }
        job
    }

    /// Submit a flatbed scan job.
    ///
    /// Fails with [`EsclError::JobInProgress`] while a previous job is
    /// still tracked, and with [`EsclError::ScannerUnavailable`] when the
    /// scanner answers anything but `201 Created`. The tracked job is only
    /// set on success.
    pub fn submit_scan(&mut self, settings: &ScanSettings) -> Result<&ScanJob> {
        if let Some(job) = &self.job {
            return Err(EsclError::JobInProgress(job.id.clone()));
        }
        if self.config.validate_settings {
            settings.validate(&self.capabilities)?;
        }

        let url = self.endpoint(JOBS_ENDPOINT)?;
        tracing::debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "text/xml")
            .body(settings.to_xml())
            .send()?;

        let status = resp.status();
        if status != StatusCode::CREATED {
            tracing::warn!("Scanner rejected scan job: {}", status);
            return Err(EsclError::ScannerUnavailable {
                status: status.as_u16(),
            });
        }

        let location = resp
            .headers()
            .get(LOCATION)
            .ok_or_else(|| EsclError::InvalidLocation("missing Location header".to_string()))?
            .to_str()
            .map_err(|_| EsclError::InvalidLocation("Location header is not text".to_string()))?;

        let job = ScanJob::from_location(&self.origin, location)?;
        tracing::info!("Scan job {} accepted", job.id);
        Ok(&*self.job.insert(job))
    }

    /// Fresh scanner status snapshot.
    pub fn status(&self) -> Result<ScannerStatus> {
        let body = self.get_text(STATUS_ENDPOINT)?;
        ScannerStatus::parse(&body)
    }

    /// Global scanner state as reported, e.g. `Idle` or `Processing`.
    pub fn state(&self) -> Result<String> {
        Ok(self.status()?.state)
    }

    pub fn is_scanning(&self) -> Result<bool> {
        Ok(self.state()? == "Processing")
    }

    pub fn is_idle(&self) -> Result<bool> {
        Ok(self.state()? == "Idle")
    }

    /// Seconds since the tracked job started, or 0 without a job.
    ///
    /// Fails with [`EsclError::JobNotFound`] when the scanner no longer
    /// lists the job.
    pub fn job_age(&self) -> Result<u64> {
        let Some(job) = &self.job else {
            return Ok(0);
        };

        let status = self.status()?;
        let info = status
            .job(&job.id)
            .ok_or_else(|| EsclError::JobNotFound(job.id.clone()))?;
        info.age()?
            .ok_or_else(|| EsclError::malformed(format!("job {} has no Age", job.id)))
    }

    /// Whether the tracked job has a finished image waiting for transfer.
    ///
    /// `false` without a job, or when the scanner does not list the job.
    /// This does not mean the job terminated.
    pub fn job_ended(&self) -> Result<bool> {
        let Some(job) = &self.job else {
            return Ok(false);
        };

        let status = self.status()?;
        match status.job(&job.id) {
            Some(info) => info.has_images(),
            None => Ok(false),
        }
    }

    /// Download the finished document and clear the tracked job.
    ///
    /// Returns `Ok(None)` while [`job_ended`](Self::job_ended) is false.
    /// On a failed download the job stays tracked.
    pub fn get_file(&mut self) -> Result<Option<Vec<u8>>> {
        if !self.job_ended()? {
            return Ok(None);
        }
        let Some(job) = &self.job else {
            return Ok(None);
        };

        tracing::debug!("GET {}", job.download_url);
        let document = self
            .http
            .get(&job.download_url)
            .send()?
            .error_for_status()?
            .bytes()?;

        tracing::info!("Retrieved {} bytes for scan job {}", document.len(), job.id);
        self.job = None;
        Ok(Some(document.to_vec()))
    }
}
