use super::ProbeModule;
use crate::crawler::CrawlResult;
use crate::http::HttpClient;
use crate::orchestrator::FindingCollector;
use crate::types::{Finding, Target, VulnerabilityClass};
use crate::Result;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Method;

/// Crawled URLs (links, then script endpoints) tested in addition to the base URL.
const MAX_LINKS: usize = 10;

/// A method is considered refused only on 405 or 501.
const REFUSED_STATUSES: &[u16] = &[405, 501];

pub fn risky_methods() -> [Method; 4] {
    [Method::OPTIONS, Method::TRACE, Method::PUT, Method::DELETE]
}

pub struct HttpMethodsProbe;

#[async_trait]
impl ProbeModule for HttpMethodsProbe {
    fn name(&self) -> &'static str {
        "http_methods"
    }

    fn class(&self) -> VulnerabilityClass {
        VulnerabilityClass::InsecureHttpMethods
    }

    async fn run(
        &self,
        target: &Target,
        crawl: &CrawlResult,
        client: &dyn HttpClient,
        findings: &FindingCollector,
    ) -> Result<()> {
        info!("Testing for insecure HTTP methods");
        let urls = std::iter::once(target.base_url())
            .chain(crawl.urls().take(MAX_LINKS).map(String::as_str));

        for url in urls {
            for method in risky_methods() {
                match client.request(method.clone(), url).await {
                    Ok(response) if !REFUSED_STATUSES.contains(&response.status) => {
                        info!("{} method allowed at: {} ({})", method, url, response.status);
                        findings.push(Finding::new(
                            self.class(),
                            url,
                            format!("Method: {}", method),
                            url,
                        ));
                    }
                    Ok(_) => {}
                    Err(e) => debug!("{} {} failed: {}", method, url, e),
                }
            }
        }

        Ok(())
    }
}
