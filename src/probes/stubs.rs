use super::ProbeModule;
use crate::crawler::CrawlResult;
use crate::http::HttpClient;
use crate::orchestrator::FindingCollector;
use crate::types::{Target, VulnerabilityClass};
use crate::Result;
use async_trait::async_trait;
use log::debug;

// IDOR and JWT testing need application-specific context (object ids, issued
// tokens) that a generic crawl does not provide. Both register so the class
// shows up in probe listings, and report nothing.

pub struct IdorProbe;

#[async_trait]
impl ProbeModule for IdorProbe {
    fn name(&self) -> &'static str {
        "idor"
    }

    fn class(&self) -> VulnerabilityClass {
        VulnerabilityClass::Idor
    }

    async fn run(
        &self,
        _target: &Target,
        _crawl: &CrawlResult,
        _client: &dyn HttpClient,
        _findings: &FindingCollector,
    ) -> Result<()> {
        debug!("IDOR probe has no generic test cases, skipping");
        Ok(())
    }
}

pub struct JwtProbe;

#[async_trait]
impl ProbeModule for JwtProbe {
    fn name(&self) -> &'static str {
        "jwt"
    }

    fn class(&self) -> VulnerabilityClass {
        VulnerabilityClass::JwtIssues
    }

    async fn run(
        &self,
        _target: &Target,
        _crawl: &CrawlResult,
        _client: &dyn HttpClient,
        _findings: &FindingCollector,
    ) -> Result<()> {
        debug!("JWT probe has no generic test cases, skipping");
        Ok(())
    }
}
