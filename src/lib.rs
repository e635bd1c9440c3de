//! rwebscan - Web Application Vulnerability Scanner
//!
//! Discovers the reachable surface of a web site (links, forms, script-referenced
//! endpoints), runs a battery of independent vulnerability probes against it
//! concurrently and aggregates the findings into a structured report.
//!
//! Detection is heuristic: every finding is a candidate weakness inferred from
//! response content, headers or status codes, not proof of exploitability.
//!
//! # Warning
//! This tool is designed for ethical penetration testing and security assessment
//! purposes only. Users are responsible for ensuring they have proper authorization
//! before scanning any site.

pub mod cli;
pub mod config;
pub mod crawler;
pub mod display;
pub mod error;
pub mod fingerprint;
pub mod http;
pub mod orchestrator;
pub mod probes;
pub mod reporting;
pub mod utils;

pub use error::{Result, ScanError};
pub use orchestrator::{CancelToken, ScanOrchestrator};
pub use reporting::Report;

use crate::config::Config;
use crate::types::{Credentials, Target};

/// Scan `target_url` with the default configuration and return the report.
///
/// Configuration problems (bad URL, zero threads) are reported before any
/// request is sent. Network failures during the scan never fail the call.
pub async fn run_scan(
    target_url: &str,
    max_threads: usize,
    auth: Option<Credentials>,
) -> Result<Report> {
    let mut config = Config::default();
    config.scan.threads = max_threads;
    let target = Target::new(target_url, max_threads, auth)?;
    let orchestrator = ScanOrchestrator::new(config)?;
    orchestrator.run(target).await
}

/// Common types shared by the crawler, the probes and the report
pub mod types {
    use crate::{Result, ScanError};
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use url::Url;

    /// A free-text technology label, e.g. "Server: nginx/1.18" or "WordPress".
    pub type Technology = String;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Credentials {
        pub username: String,
        pub password: String,
    }

    impl Credentials {
        pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
            Self {
                username: username.into(),
                password: password.into(),
            }
        }

        /// Parse a `user:pass` pair. Exactly one colon is accepted.
        pub fn parse(raw: &str) -> Result<Self> {
            let mut parts = raw.split(':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(username), Some(password), None) => Ok(Self::new(username, password)),
                _ => Err(ScanError::InvalidCredentials(raw.to_string())),
            }
        }
    }

    /// The site under test. Immutable for the lifetime of a scan.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Target {
        base_url: String,
        auth: Option<Credentials>,
        max_threads: usize,
    }

    impl Target {
        pub fn new(url: &str, max_threads: usize, auth: Option<Credentials>) -> Result<Self> {
            let trimmed = url.trim();
            let parsed = Url::parse(trimmed)
                .map_err(|e| ScanError::InvalidTarget(format!("{}: {}", trimmed, e)))?;

            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ScanError::InvalidTarget(format!(
                    "{}: unsupported scheme '{}'",
                    trimmed,
                    parsed.scheme()
                )));
            }
            if parsed.host_str().map_or(true, str::is_empty) {
                return Err(ScanError::InvalidTarget(format!("{}: missing host", trimmed)));
            }
            if max_threads == 0 {
                return Err(ScanError::InvalidInput("thread count must be at least 1".to_string()));
            }

            // Same normalization `Url::join` applies to crawled links:
            // lowercase host, default port dropped.
            Ok(Self {
                base_url: parsed.as_str().trim_end_matches('/').to_string(),
                auth,
                max_threads,
            })
        }

        /// Base URL without trailing slash.
        pub fn base_url(&self) -> &str {
            &self.base_url
        }

        pub fn auth(&self) -> Option<&Credentials> {
            self.auth.as_ref()
        }

        pub fn max_threads(&self) -> usize {
            self.max_threads
        }

        /// `base_url` joined with a relative suffix using a single slash.
        pub fn url_for(&self, suffix: &str) -> String {
            format!("{}/{}", self.base_url, suffix)
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct FormField {
        /// Absent when the `<input>` carries no `name` attribute.
        pub name: Option<String>,
        pub input_type: String,
        pub default_value: String,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Form {
        pub action: String,
        pub method: FormMethod,
        pub fields: Vec<FormField>,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum FormMethod {
        Get,
        Post,
    }

    impl FormMethod {
        /// Anything other than POST (case-insensitive) submits as GET, like a browser.
        pub fn parse(raw: Option<&str>) -> Self {
            match raw {
                Some(method) if method.trim().eq_ignore_ascii_case("post") => FormMethod::Post,
                _ => FormMethod::Get,
            }
        }

        pub fn as_str(&self) -> &'static str {
            match self {
                FormMethod::Get => "GET",
                FormMethod::Post => "POST",
            }
        }
    }

    impl fmt::Display for FormMethod {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum VulnerabilityClass {
        SqlInjection,
        CrossSiteScripting,
        DirectoryTraversal,
        SensitiveFileExposure,
        CommandInjection,
        Ssrf,
        Idor,
        Csrf,
        InsecureHttpMethods,
        CorsMisconfiguration,
        MissingSecurityHeaders,
        JwtIssues,
        Clickjacking,
        ServerInfoDisclosure,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
    pub enum Severity {
        High,
        Medium,
        Low,
        Info,
    }

    impl VulnerabilityClass {
        pub fn label(&self) -> &'static str {
            match self {
                VulnerabilityClass::SqlInjection => "SQL Injection",
                VulnerabilityClass::CrossSiteScripting => "Cross-Site Scripting (XSS)",
                VulnerabilityClass::DirectoryTraversal => "Directory Traversal",
                VulnerabilityClass::SensitiveFileExposure => "Sensitive File Exposure",
                VulnerabilityClass::CommandInjection => "Command Injection",
                VulnerabilityClass::Ssrf => "SSRF Potential",
                VulnerabilityClass::Idor => "Insecure Direct Object Reference",
                VulnerabilityClass::Csrf => "Potential CSRF (Missing Token)",
                VulnerabilityClass::InsecureHttpMethods => "Insecure HTTP Method Allowed",
                VulnerabilityClass::CorsMisconfiguration => "CORS Misconfiguration",
                VulnerabilityClass::MissingSecurityHeaders => "Missing Security Headers",
                VulnerabilityClass::JwtIssues => "JWT Issues",
                VulnerabilityClass::Clickjacking => "Clickjacking Potential",
                VulnerabilityClass::ServerInfoDisclosure => "Information Disclosure",
            }
        }

        pub fn severity(&self) -> Severity {
            match self {
                VulnerabilityClass::SqlInjection
                | VulnerabilityClass::CommandInjection
                | VulnerabilityClass::DirectoryTraversal => Severity::High,
                VulnerabilityClass::CrossSiteScripting
                | VulnerabilityClass::Ssrf
                | VulnerabilityClass::SensitiveFileExposure
                | VulnerabilityClass::Idor
                | VulnerabilityClass::JwtIssues
                | VulnerabilityClass::CorsMisconfiguration => Severity::Medium,
                VulnerabilityClass::Csrf
                | VulnerabilityClass::InsecureHttpMethods
                | VulnerabilityClass::Clickjacking => Severity::Low,
                VulnerabilityClass::MissingSecurityHeaders
                | VulnerabilityClass::ServerInfoDisclosure => Severity::Info,
            }
        }
    }

    impl fmt::Display for VulnerabilityClass {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.label())
        }
    }

    /// One candidate vulnerability. Immutable once created.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Finding {
        pub class: VulnerabilityClass,
        pub location: String,
        pub detail: String,
        pub tested_url: String,
    }

    impl Finding {
        pub fn new(
            class: VulnerabilityClass,
            location: impl Into<String>,
            detail: impl Into<String>,
            tested_url: impl Into<String>,
        ) -> Self {
            Self {
                class,
                location: location.into(),
                detail: detail.into(),
                tested_url: tested_url.into(),
            }
        }
    }
}
