use thiserror::Error;

/// eSCL client errors
#[derive(Debug, Error)]
pub enum EsclError {
    /// An HTTP exchange with the scanner could not be completed
    #[error("Failed to reach scanner: {0}")]
    Transport(#[from] reqwest::Error),

    /// The scanner answered with a body that is not well-formed XML
    #[error("Invalid XML from scanner: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Well-formed XML that lacks an expected element or value
    #[error("Unexpected scanner response: {0}")]
    MalformedResponse(String),

    /// The scanner refused the scan job
    #[error("Scanner unavailable (HTTP {status})")]
    ScannerUnavailable { status: u16 },

    /// The scanner address cannot form an eSCL URL
    #[error("Invalid scanner address: {0}")]
    InvalidHost(String),

    /// The job was accepted but its Location header is unusable
    #[error("Invalid job location: {0}")]
    InvalidLocation(String),

    /// The tracked job is missing from the scanner status
    #[error("Job {0} not found in scanner status")]
    JobNotFound(String),

    /// A job is already outstanding on this client
    #[error("Job {0} is still in progress")]
    JobInProgress(String),

    /// Scan settings rejected against the scanner capabilities
    #[error("Invalid scan settings: {0}")]
    InvalidSettings(String),
}

impl EsclError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        EsclError::MalformedResponse(msg.into())
    }

    /// Get user-friendly description and hints
    pub fn user_message(&self) -> String {
        match self {
            EsclError::Transport(e) => {
                format!(
                    "Could not talk to the scanner: {}\n\nCheck that the scanner is powered on and reachable on the network.",
                    e
                )
            }
            EsclError::Xml(_) | EsclError::MalformedResponse(_) => {
                format!(
                    "{}\n\nThe device may not implement eSCL, or the base path is wrong.",
                    self
                )
            }
            EsclError::ScannerUnavailable { status } => {
                format!(
                    "The scanner rejected the job (HTTP {}).\n\nIt may be busy, in an error state, or the settings are unsupported.",
                    status
                )
            }
            EsclError::JobInProgress(id) => {
                format!(
                    "Job {} has not been retrieved yet.\n\nWait for it to finish and fetch the document before starting another scan.",
                    id
                )
            }
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EsclError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scanner_unavailable_message() {
        let err = EsclError::ScannerUnavailable { status: 503 };
        assert_eq!(err.to_string(), "Scanner unavailable (HTTP 503)");
        assert!(err.user_message().contains("HTTP 503"));
    }

    #[test]
    fn test_job_not_found_message() {
        let err = EsclError::JobNotFound("abc-123".to_string());
        assert_eq!(err.to_string(), "Job abc-123 not found in scanner status");
        assert_eq!(err.user_message(), err.to_string());
    }
}
