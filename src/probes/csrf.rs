use super::ProbeModule;
use crate::crawler::CrawlResult;
use crate::http::HttpClient;
use crate::orchestrator::FindingCollector;
use crate::types::{Finding, Form, Target, VulnerabilityClass};
use crate::Result;
use async_trait::async_trait;
use log::info;

const TOKEN_MARKERS: &[&str] = &["csrf", "csrftoken", "_token"];

/// Static check over the crawled forms; sends no requests.
pub struct CsrfProbe;

impl CsrfProbe {
    /// A field protects the form when its lowercased name contains one of
    /// the token markers, so `csrf_token`, `csrfmiddlewaretoken` and
    /// `_token` all count.
    pub fn has_token_field(form: &Form) -> bool {
        form.fields.iter().any(|field| {
            field.name.as_deref().map_or(false, |name| {
                let name = name.to_lowercase();
                TOKEN_MARKERS.iter().any(|marker| name.contains(marker))
            })
        })
    }
}

#[async_trait]
impl ProbeModule for CsrfProbe {
    fn name(&self) -> &'static str {
        "csrf"
    }

    fn class(&self) -> VulnerabilityClass {
        VulnerabilityClass::Csrf
    }

    async fn run(
        &self,
        _target: &Target,
        crawl: &CrawlResult,
        _client: &dyn HttpClient,
        findings: &FindingCollector,
    ) -> Result<()> {
        info!("Testing for CSRF vulnerabilities");
        for form in crawl.forms.iter().filter(|form| !Self::has_token_field(form)) {
            info!("Potential CSRF vulnerability in form at: {}", form.action);
            findings.push(Finding::new(
                self.class(),
                form.action.as_str(),
                format!("{} form missing CSRF token", form.method),
                form.action.as_str(),
            ));
        }
        Ok(())
    }
}
