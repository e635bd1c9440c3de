//! Vulnerability probes.
//!
//! Each probe tests one vulnerability class against the crawled surface and
//! reports zero or more [`Finding`]s. Detection is heuristic (substring,
//! header and status checks on responses): a finding is a candidate weakness,
//! not proof of exploitability.
//!
//! A probe never fails because of a single request: transport errors are
//! logged and treated as "no finding from this attempt".

mod csrf;
mod files;
mod headers;
mod injection;
mod methods;
mod stubs;

pub use csrf::CsrfProbe;
pub use files::{DirectoryTraversalProbe, SensitiveFileProbe};
pub use headers::{ClickjackingProbe, CorsProbe, SecurityHeadersProbe, ServerInfoProbe};
pub use injection::{CommandInjectionProbe, SqlInjectionProbe, SsrfProbe, XssProbe};
pub use methods::HttpMethodsProbe;
pub use stubs::{IdorProbe, JwtProbe};

use crate::crawler::CrawlResult;
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use crate::orchestrator::FindingCollector;
use crate::types::{Finding, Form, FormMethod, Target, VulnerabilityClass};
use crate::Result;
use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;

#[async_trait]
pub trait ProbeModule: Send + Sync {
    /// Short identifier used in configuration and logs, e.g. `sqli`.
    fn name(&self) -> &'static str;

    fn class(&self) -> VulnerabilityClass;

    /// Run the probe, pushing each finding into `findings` as soon as it is
    /// detected. The crawl result is shared with every other probe and must be
    /// treated as read-only.
    async fn run(
        &self,
        target: &Target,
        crawl: &CrawlResult,
        client: &dyn HttpClient,
        findings: &FindingCollector,
    ) -> Result<()>;

    /// Run to completion and return the findings in detection order.
    async fn collect_findings(
        &self,
        target: &Target,
        crawl: &CrawlResult,
        client: &dyn HttpClient,
    ) -> Result<Vec<Finding>> {
        let findings = FindingCollector::new();
        self.run(target, crawl, client, &findings).await?;
        Ok(findings.take())
    }
}

/// Every known probe, in the order they are scheduled. New classes register here.
pub fn registry() -> Vec<Arc<dyn ProbeModule>> {
    vec![
        Arc::new(SqlInjectionProbe),
        Arc::new(XssProbe),
        Arc::new(DirectoryTraversalProbe),
        Arc::new(SensitiveFileProbe),
        Arc::new(CommandInjectionProbe),
        Arc::new(SsrfProbe),
        Arc::new(IdorProbe),
        Arc::new(CsrfProbe),
        Arc::new(HttpMethodsProbe),
        Arc::new(CorsProbe),
        Arc::new(SecurityHeadersProbe),
        Arc::new(JwtProbe),
        Arc::new(ClickjackingProbe),
        Arc::new(ServerInfoProbe),
    ]
}

pub fn probe_names() -> Vec<&'static str> {
    registry().iter().map(|probe| probe.name()).collect()
}

/// Insert `payload` right after the first `=` of `url`.
/// Returns `None` when the URL has no `=`.
pub fn inject_first_param(url: &str, payload: &str) -> Option<String> {
    if !url.contains('=') {
        return None;
    }
    Some(url.replacen('=', &format!("={}", payload), 1))
}

/// For every crawled URL carrying a parameter, try each payload in turn and
/// stop at the first one `detect` accepts. One finding per vulnerable URL.
pub async fn probe_url_params<F>(
    client: &dyn HttpClient,
    crawl: &CrawlResult,
    class: VulnerabilityClass,
    payloads: &[&str],
    detect: F,
    findings: &FindingCollector,
) where
    F: Fn(&HttpResponse, &str) -> bool + Send + Sync,
{
    for url in crawl.urls() {
        for &payload in payloads {
            let Some(test_url) = inject_first_param(url, payload) else { break };
            let response = match client.get(&test_url).await {
                Ok(response) => response,
                Err(e) => {
                    debug!("{} probe request {} failed: {}", class, test_url, e);
                    continue;
                }
            };
            if detect(&response, payload) {
                info!("Potential {} at: {}", class, url);
                findings.push(Finding::new(class, url.as_str(), payload, response.url));
                break;
            }
        }
    }
}

/// Parameters for one submission of `form`: fields whose type is in
/// `injectable` get the payload, the rest keep their default value.
/// Fields without a name cannot be submitted and are skipped.
pub fn build_form_params(form: &Form, payload: &str, injectable: &[&str]) -> Vec<(String, String)> {
    form.fields
        .iter()
        .filter_map(|field| {
            let name = field.name.as_ref()?;
            let value = if injectable.contains(&field.input_type.as_str()) {
                payload.to_string()
            } else {
                field.default_value.clone()
            };
            Some((name.clone(), value))
        })
        .collect()
}

pub async fn submit_form(
    client: &dyn HttpClient,
    form: &Form,
    params: Vec<(String, String)>,
) -> Result<HttpResponse> {
    match form.method {
        FormMethod::Post => client.post_form(&form.action, params).await,
        FormMethod::Get => {
            client
                .send(HttpRequest::get(form.action.as_str()).with_query(params))
                .await
        }
    }
}

/// Submit every crawled form once per payload and stop at the first payload
/// `detect` accepts. One finding per vulnerable form.
pub async fn probe_forms<F>(
    client: &dyn HttpClient,
    crawl: &CrawlResult,
    class: VulnerabilityClass,
    payloads: &[&str],
    injectable: &[&str],
    detect: F,
    findings: &FindingCollector,
) where
    F: Fn(&HttpResponse, &str) -> bool + Send + Sync,
{
    for form in &crawl.forms {
        for &payload in payloads {
            let params = build_form_params(form, payload, injectable);
            let response = match submit_form(client, form, params).await {
                Ok(response) => response,
                Err(e) => {
                    debug!("{} form submission to {} failed: {}", class, form.action, e);
                    continue;
                }
            };
            if detect(&response, payload) {
                info!("Potential {} in form at: {}", class, form.action);
                findings.push(Finding::new(
                    class,
                    form.action.as_str(),
                    format!("Form parameter with payload: {}", payload),
                    response.url,
                ));
                break;
            }
        }
    }
}

/// Case-insensitive "body contains any of" check; `needles` must be lowercase.
pub(crate) fn body_contains_any(response: &HttpResponse, needles: &[&str]) -> bool {
    let body = response.body.to_lowercase();
    needles.iter().any(|needle| body.contains(needle))
}
