use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default eSCL HTTP port
pub const DEFAULT_PORT: u16 = 8080;

/// Default eSCL resource root
pub const DEFAULT_BASE_PATH: &str = "/eSCL/";

/// Environment variable names for overrides
const ENV_HOST: &str = "AIRSCAN_HOST";
const ENV_PORT: &str = "AIRSCAN_PORT";
const ENV_TIMEOUT_SECS: &str = "AIRSCAN_TIMEOUT_SECS";

/// Configuration file structure
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    scanner: Option<ScannerConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct ScannerConfig {
    /// Scanner address (e.g., "192.168.1.11")
    host: Option<String>,
    port: Option<u16>,
    base_path: Option<String>,
    /// Per-request timeout; unset means wait indefinitely
    timeout_secs: Option<u64>,
    validate_settings: Option<bool>,
}

/// Runtime client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Scanner address used when the caller does not name one
    pub host: Option<String>,
    pub port: u16,
    /// Resource root, always starting and ending with `/`
    pub base_path: String,
    /// Per-request timeout. `None` blocks until the scanner answers.
    pub timeout: Option<Duration>,
    /// Check scan settings against the capabilities before submitting
    pub validate_settings: bool,
    /// Source of the configuration (for logging)
    pub source: ConfigSource,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_PORT,
            base_path: DEFAULT_BASE_PATH.to_string(),
            timeout: None,
            validate_settings: false,
            source: ConfigSource::Default,
        }
    }
}

/// Where the configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Using default hardcoded values
    Default,
    /// Loaded from environment variables
    Environment,
    /// Loaded from config file
    ConfigFile,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::ConfigFile => write!(f, "config file"),
        }
    }
}

/// Ensure the base path starts and ends with a slash
pub(crate) fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

/// Get the path to the configuration file
fn get_config_file_path() -> Option<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .map(|p| p.join("airscan").join("config.toml"))
}

fn parse_config_file(content: &str) -> Result<ConfigFile, toml::de::Error> {
    toml::from_str(content)
}

/// Load configuration from a specific file
fn load_config_file_at(path: &Path) -> Option<ConfigFile> {
    if !path.exists() {
        return None;
    }

    match fs::read_to_string(path) {
        Ok(content) => match parse_config_file(&content) {
            Ok(config) => {
                tracing::debug!("Loaded config from {:?}", path);
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config file {:?}: {}", path, e);
                None
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read config file {:?}: {}", path, e);
            None
        }
    }
}

/// Apply the `[scanner]` table over the defaults. A file without one still
/// counts as the source.
fn from_file(config: ConfigFile) -> ClientConfig {
    let scanner = config.scanner.unwrap_or_default();
    let defaults = ClientConfig::default();

    ClientConfig {
        host: scanner
            .host
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty()),
        port: scanner.port.unwrap_or(defaults.port),
        base_path: scanner
            .base_path
            .map(|p| normalize_base_path(&p))
            .unwrap_or(defaults.base_path),
        timeout: scanner.timeout_secs.map(Duration::from_secs),
        validate_settings: scanner.validate_settings.unwrap_or(false),
        source: ConfigSource::ConfigFile,
    }
}

/// Load configuration from the file at `path`, falling back to defaults
pub fn load_client_config_from(path: &Path) -> ClientConfig {
    load_config_file_at(path)
        .map(from_file)
        .unwrap_or_default()
}

/// Overlay environment variables; returns whether any were applied
fn apply_env(config: &mut ClientConfig, lookup: impl Fn(&str) -> Option<String>) -> bool {
    let mut applied = false;

    if let Some(host) = lookup(ENV_HOST) {
        let host = host.trim();
        if !host.is_empty() {
            tracing::info!("Using scanner host from environment variable: {}", host);
            config.host = Some(host.to_string());
            applied = true;
        }
    }

    if let Some(port) = lookup(ENV_PORT) {
        match port.trim().parse() {
            Ok(port) => {
                config.port = port;
                applied = true;
            }
            Err(e) => tracing::warn!("Ignoring {}={:?}: {}", ENV_PORT, port, e),
        }
    }

    if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
        match secs.trim().parse() {
            Ok(secs) => {
                config.timeout = Some(Duration::from_secs(secs));
                applied = true;
            }
            Err(e) => tracing::warn!("Ignoring {}={:?}: {}", ENV_TIMEOUT_SECS, secs, e),
        }
    }

    applied
}

/// Load client configuration with priority:
/// 1. Environment variables (AIRSCAN_HOST, AIRSCAN_PORT, AIRSCAN_TIMEOUT_SECS)
/// 2. Config file (~/.config/airscan/config.toml)
/// 3. Default values
pub fn load_client_config() -> ClientConfig {
    load_layered(get_config_file_path().as_deref(), |name| {
        std::env::var(name).ok()
    })
}

/// Config file at `path` (if any) overlaid with variables from `lookup`
fn load_layered(path: Option<&Path>, lookup: impl Fn(&str) -> Option<String>) -> ClientConfig {
    let mut config = path.map(load_client_config_from).unwrap_or_default();

    if apply_env(&mut config, lookup) {
        config.source = ConfigSource::Environment;
    }

    tracing::debug!(
        "Scanner config from {}: port {}, base path {}",
        config.source,
        config.port,
        config.base_path
    );
    config
}

/// Get the path to the config file for documentation purposes
pub fn get_config_file_path_string() -> String {
    get_config_file_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "~/.config/airscan/config.toml".to_string())
}

/// Generate example config file content
pub fn generate_example_config() -> String {
    r#"# AirScan Configuration
# Place this file at: ~/.config/airscan/config.toml

[scanner]
# Scanner address used when --host is not given
# host = "192.168.1.11"

# eSCL port and resource root
# port = 8080
# base_path = "/eSCL/"

# Per-request timeout in seconds (default: wait indefinitely)
# timeout_secs = 30

# Check scan settings against the scanner capabilities before submitting
# validate_settings = false
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_normalize_base_path() {
        assert_eq!(normalize_base_path("eSCL"), "/eSCL/");
        assert_eq!(normalize_base_path("/eSCL/"), "/eSCL/");
        assert_eq!(normalize_base_path(" /scanner/eSCL "), "/scanner/eSCL/");
        assert_eq!(normalize_base_path(""), "/");
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.base_path, "/eSCL/");
        assert_eq!(config.timeout, None);
        assert!(!config.validate_settings);
        assert_eq!(config.source, ConfigSource::Default);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[scanner]
host = " 10.0.0.5 "
port = 80
base_path = "eSCL"
timeout_secs = 15
validate_settings = true
"#
        )
        .unwrap();

        let config = load_client_config_from(file.path());
        assert_eq!(config.host.as_deref(), Some("10.0.0.5"));
        assert_eq!(config.port, 80);
        assert_eq!(config.base_path, "/eSCL/");
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
        assert!(config.validate_settings);
        assert_eq!(config.source, ConfigSource::ConfigFile);
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[scanner\nport = ").unwrap();
        assert_eq!(load_client_config_from(file.path()), ClientConfig::default());
    }

    #[test]
    fn test_example_config_parses() {
        let parsed = parse_config_file(&generate_example_config()).unwrap();
        assert!(parsed.scanner.is_some());
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    fn config_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        assert_eq!(load_layered(None, env(&[])), ClientConfig::default());
    }

    #[test]
    fn test_env_overrides_file() {
        let file = config_file(
            "[scanner]\nhost = \"10.0.0.5\"\nport = 80\nbase_path = \"/scan/\"\ntimeout_secs = 15\n",
        );
        let config = load_layered(
            Some(file.path()),
            env(&[("AIRSCAN_HOST", "10.0.0.9"), ("AIRSCAN_PORT", "9090")]),
        );

        assert_eq!(config.host.as_deref(), Some("10.0.0.9"));
        assert_eq!(config.port, 9090);
        // Values the environment does not name still come from the file
        assert_eq!(config.base_path, "/scan/");
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.source, ConfigSource::Environment);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = config_file("[scanner]\nport = 80\n");
        let config = load_layered(Some(file.path()), env(&[]));
        assert_eq!(config.port, 80);
        assert_eq!(config.base_path, DEFAULT_BASE_PATH);
        assert_eq!(config.source, ConfigSource::ConfigFile);
    }

    #[test]
    fn test_env_timeout_over_defaults() {
        let config = load_layered(None, env(&[("AIRSCAN_TIMEOUT_SECS", " 5 ")]));
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.source, ConfigSource::Environment);
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let file = config_file("[scanner]\nport = 80\ntimeout_secs = 15\n");
        let config = load_layered(
            Some(file.path()),
            env(&[
                ("AIRSCAN_PORT", "eighty"),
                ("AIRSCAN_TIMEOUT_SECS", "-1"),
                ("AIRSCAN_HOST", "   "),
            ]),
        );

        assert_eq!(config.port, 80);
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.host, None);
        assert_eq!(config.source, ConfigSource::ConfigFile);
    }

    #[test]
    fn test_file_without_scanner_table() {
        let file = config_file("# nothing configured yet\n");
        let config = load_client_config_from(file.path());
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.source, ConfigSource::ConfigFile);
    }
}
