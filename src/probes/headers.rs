use super::ProbeModule;
use crate::crawler::CrawlResult;
use crate::http::HttpClient;
use crate::orchestrator::FindingCollector;
use crate::types::{Finding, Target, VulnerabilityClass};
use crate::Result;
use async_trait::async_trait;
use log::{debug, info};

pub const EVIL_ORIGIN: &str = "https://evil.com";

pub const REQUIRED_SECURITY_HEADERS: &[&str] = &[
    "X-Content-Type-Options",
    "X-Frame-Options",
    "Content-Security-Policy",
    "X-XSS-Protection",
    "Strict-Transport-Security",
];

/// Headers that leak the server stack, with the label used in the finding.
const DISCLOSURE_HEADERS: &[(&str, &str)] = &[
    ("Server", "Server"),
    ("X-Powered-By", "Powered By"),
    ("X-AspNet-Version", "ASP.NET Version"),
];

/// Reflects an arbitrary `Origin` or allows every origin.
pub struct CorsProbe;

#[async_trait]
impl ProbeModule for CorsProbe {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn class(&self) -> VulnerabilityClass {
        VulnerabilityClass::CorsMisconfiguration
    }

    async fn run(
        &self,
        target: &Target,
        _crawl: &CrawlResult,
        client: &dyn HttpClient,
        findings: &FindingCollector,
    ) -> Result<()> {
        info!("Testing for CORS misconfigurations");
        let headers = [("Origin", EVIL_ORIGIN), ("Access-Control-Request-Method", "GET")];

        let response = match client.get_with_headers(target.base_url(), &headers).await {
            Ok(response) => response,
            Err(e) => {
                debug!("CORS probe failed: {}", e);
                return Ok(());
            }
        };

        let allow_origin = response.header("access-control-allow-origin").unwrap_or("");
        if allow_origin == "*" || allow_origin.contains("evil.com") {
            info!("Insecure CORS configuration at: {}", target.base_url());
            findings.push(Finding::new(
                self.class(),
                target.base_url(),
                format!("Access-Control-Allow-Origin: {}", allow_origin),
                target.base_url(),
            ));
        }
        Ok(())
    }
}

/// One finding listing every missing hardening header.
pub struct SecurityHeadersProbe;

#[async_trait]
impl ProbeModule for SecurityHeadersProbe {
    fn name(&self) -> &'static str {
        "security_headers"
    }

    fn class(&self) -> VulnerabilityClass {
        VulnerabilityClass::MissingSecurityHeaders
    }

    async fn run(
        &self,
        target: &Target,
        _crawl: &CrawlResult,
        client: &dyn HttpClient,
        findings: &FindingCollector,
    ) -> Result<()> {
        info!("Testing for missing security headers");
        let response = match client.get(target.base_url()).await {
            Ok(response) => response,
            Err(e) => {
                debug!("Security header probe failed: {}", e);
                return Ok(());
            }
        };

        let missing: Vec<&str> = REQUIRED_SECURITY_HEADERS
            .iter()
            .copied()
            .filter(|header| !response.has_header(header))
            .collect();

        if missing.is_empty() {
            return Ok(());
        }
        info!("Missing security headers at: {}", target.base_url());
        findings.push(Finding::new(
            self.class(),
            target.base_url(),
            format!("Missing headers: {}", missing.join(", ")),
            target.base_url(),
        ));
        Ok(())
    }
}

pub struct ClickjackingProbe;

#[async_trait]
impl ProbeModule for ClickjackingProbe {
    fn name(&self) -> &'static str {
        "clickjacking"
    }

    fn class(&self) -> VulnerabilityClass {
        VulnerabilityClass::Clickjacking
    }

    async fn run(
        &self,
        target: &Target,
        _crawl: &CrawlResult,
        client: &dyn HttpClient,
        findings: &FindingCollector,
    ) -> Result<()> {
        info!("Testing for Clickjacking vulnerabilities");
        match client.get(target.base_url()).await {
            Ok(response) if !response.has_header("x-frame-options") => {
                info!("Potential Clickjacking vulnerability at: {}", target.base_url());
                findings.push(Finding::new(
                    self.class(),
                    target.base_url(),
                    "Missing X-Frame-Options header",
                    target.base_url(),
                ));
            }
            Ok(_) => {}
            Err(e) => debug!("Clickjacking probe failed: {}", e),
        }
        Ok(())
    }
}

pub struct ServerInfoProbe;

#[async_trait]
impl ProbeModule for ServerInfoProbe {
    fn name(&self) -> &'static str {
        "info_disclosure"
    }

    fn class(&self) -> VulnerabilityClass {
        VulnerabilityClass::ServerInfoDisclosure
    }

    async fn run(
        &self,
        target: &Target,
        _crawl: &CrawlResult,
        client: &dyn HttpClient,
        findings: &FindingCollector,
    ) -> Result<()> {
        info!("Testing for server information disclosure");
        let response = match client.get(target.base_url()).await {
            Ok(response) => response,
            Err(e) => {
                debug!("Server info probe failed: {}", e);
                return Ok(());
            }
        };

        let disclosed: Vec<String> = DISCLOSURE_HEADERS
            .iter()
            .filter_map(|(header, label)| {
                response.header(header).map(|value| format!("{}: {}", label, value))
            })
            .collect();

        if disclosed.is_empty() {
            return Ok(());
        }
        info!("Server information disclosure at: {}", target.base_url());
        findings.push(Finding::new(
            self.class(),
            target.base_url(),
            format!("Disclosed: {}", disclosed.join(", ")),
            target.base_url(),
        ));
        Ok(())
    }
}
