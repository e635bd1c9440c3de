use super::ProbeModule;
use crate::crawler::CrawlResult;
use crate::http::HttpClient;
use crate::orchestrator::FindingCollector;
use crate::types::{Finding, Target, VulnerabilityClass};
use crate::Result;
use async_trait::async_trait;
use log::{debug, info};

pub const TRAVERSAL_PAYLOADS: &[&str] = &[
    "../../../../etc/passwd",
    "../../../../windows/win.ini",
    "%2e%2e%2f%2e%2e%2f%2e%2e%2fetc%2fpasswd",
    "..%2F..%2F..%2Fetc%2Fpasswd",
    "....//....//etc/passwd",
];

const TRAVERSAL_MARKERS: &[&str] = &["root:", "[extensions]"];

pub const SENSITIVE_FILES: &[&str] = &[
    "robots.txt",
    ".git/",
    ".env",
    "config.php",
    "wp-config.php",
    "phpinfo.php",
    "admin/",
    "backup/",
    "phpmyadmin/",
    ".htaccess",
    ".DS_Store",
    "web.config",
    "server-status",
    "debug.log",
    "package.json",
    "composer.json",
    "yarn.lock",
    "Gemfile.lock",
    "config.yml",
    "settings.py",
    "secrets.yml",
    "credentials.json",
];

/// Extensions reported even when served as HTML: a 200 there usually means
/// the source or config was served or executed.
const ALWAYS_SENSITIVE_EXTENSIONS: &[&str] = &[".php", ".json", ".yml", ".py"];

/// `/etc/passwd` or `win.ini` content after appending traversal sequences to
/// the base URL. Every payload is tried; each hit is its own finding.
pub struct DirectoryTraversalProbe;

#[async_trait]
impl ProbeModule for DirectoryTraversalProbe {
    fn name(&self) -> &'static str {
        "traversal"
    }

    fn class(&self) -> VulnerabilityClass {
        VulnerabilityClass::DirectoryTraversal
    }

    async fn run(
        &self,
        target: &Target,
        _crawl: &CrawlResult,
        client: &dyn HttpClient,
        findings: &FindingCollector,
    ) -> Result<()> {
        info!("Testing for Directory Traversal vulnerabilities");
        for payload in TRAVERSAL_PAYLOADS {
            let test_url = target.url_for(payload);
            match client.get(&test_url).await {
                Ok(response) => {
                    if TRAVERSAL_MARKERS.iter().any(|m| response.body.contains(m)) {
                        info!("Potential Directory Traversal at: {}", test_url);
                        findings.push(Finding::new(
                            self.class(),
                            test_url.as_str(),
                            *payload,
                            response.url,
                        ));
                    }
                }
                Err(e) => debug!("Traversal probe {} failed: {}", test_url, e),
            }
        }

        Ok(())
    }
}

pub struct SensitiveFileProbe;

impl SensitiveFileProbe {
    /// A 200 counts when the body is not an HTML page (soft-404s usually are)
    /// or when the file type is one that should never be served at all.
    pub fn is_exposed(file: &str, status: u16, content_type: &str) -> bool {
        status == 200
            && (!content_type.to_ascii_lowercase().contains("text/html")
                || ALWAYS_SENSITIVE_EXTENSIONS.iter().any(|ext| file.ends_with(ext)))
    }
}

#[async_trait]
impl ProbeModule for SensitiveFileProbe {
    fn name(&self) -> &'static str {
        "sensitive_files"
    }

    fn class(&self) -> VulnerabilityClass {
        VulnerabilityClass::SensitiveFileExposure
    }

    async fn run(
        &self,
        target: &Target,
        _crawl: &CrawlResult,
        client: &dyn HttpClient,
        findings: &FindingCollector,
    ) -> Result<()> {
        info!("Testing for sensitive files");
        for file in SENSITIVE_FILES {
            let test_url = target.url_for(file);
            match client.get(&test_url).await {
                Ok(response) => {
                    if Self::is_exposed(file, response.status, response.content_type()) {
                        info!("Sensitive file found: {}", test_url);
                        let detail =
                            format!("Exposed file: {} ({})", file, response.content_type());
                        findings.push(Finding::new(
                            self.class(),
                            test_url.as_str(),
                            detail,
                            response.url,
                        ));
                    }
                }
                Err(e) => debug!("Sensitive file probe {} failed: {}", test_url, e),
            }
        }

        Ok(())
    }
}
