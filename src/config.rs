use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub scan: ScanConfig,
    pub web_scan: WebScanConfig,
    pub reporting: ReportingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub threads: usize,
    pub request_timeout: u64, // seconds
    #[serde(default)]
    pub scan_timeout: Option<u64>, // seconds, whole probing phase
    pub user_agent: String,
    #[serde(default)]
    pub disabled_probes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebScanConfig {
    pub follow_redirects: bool,
    pub max_redirects: u32,
    pub verify_ssl: bool,
    #[serde(default)]
    pub custom_headers: HashMap<String, String>,
    /// Compare scheme+host+port instead of the substring test when filtering crawled links.
    #[serde(default)]
    pub strict_origin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingConfig {
    pub output_dir: PathBuf,
    pub formats: Vec<OutputFormat>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
    Text,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan: ScanConfig {
                threads: 10,
                request_timeout: 10,
                scan_timeout: None,
                user_agent: DEFAULT_USER_AGENT.to_string(),
                disabled_probes: Vec::new(),
            },
            web_scan: WebScanConfig {
                follow_redirects: true,
                max_redirects: 5,
                verify_ssl: false,
                custom_headers: HashMap::new(),
                strict_origin: false,
            },
            reporting: ReportingConfig {
                output_dir: PathBuf::from("./reports"),
                formats: vec![OutputFormat::Json],
            },
        }
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> crate::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn save_to_file(&self, path: &str) -> crate::Result<()> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| {
                crate::ScanError::InvalidInput(format!("Failed to serialize config: {}", e))
            })?;

        std::fs::write(path, toml_string)?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.scan.request_timeout)
    }

    pub fn scan_timeout(&self) -> Option<Duration> {
        self.scan.scan_timeout.map(Duration::from_secs)
    }

    pub fn is_probe_enabled(&self, name: &str) -> bool {
        !self
            .scan
            .disabled_probes
            .iter()
            .any(|disabled| disabled.eq_ignore_ascii_case(name))
    }
}
