mod common;

use async_trait::async_trait;
use common::{canned_site, target_with_threads, MockClient, SITE};
use mockito::Matcher;
use rwebscan::config::Config;
use rwebscan::crawler::CrawlResult;
use rwebscan::http::{HttpClient, HttpRequest, HttpResponse};
use rwebscan::orchestrator::{FindingCollector, ScanPhase};
use rwebscan::probes::{ProbeModule, SensitiveFileProbe};
use rwebscan::types::{Finding, Target, VulnerabilityClass};
use rwebscan::{Result, ScanError, ScanOrchestrator};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn config_with_threads(threads: usize) -> Config {
    let mut config = Config::default();
    config.scan.threads = threads;
    config
}

/// Records how many instances run at the same time.
struct GaugeProbe {
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

#[async_trait]
impl ProbeModule for GaugeProbe {
    fn name(&self) -> &'static str {
        "gauge"
    }

    fn class(&self) -> VulnerabilityClass {
        VulnerabilityClass::Idor
    }

    async fn run(
        &self,
        target: &Target,
        _crawl: &CrawlResult,
        _client: &dyn HttpClient,
        findings: &FindingCollector,
    ) -> Result<()> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        self.running.fetch_sub(1, Ordering::SeqCst);
        findings.push(Finding::new(self.class(), target.base_url(), "", target.base_url()));
        Ok(())
    }
}

struct FailingProbe;

#[async_trait]
impl ProbeModule for FailingProbe {
    fn name(&self) -> &'static str {
        "failing"
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
        Err(ScanError::Probe {
            module: "failing".to_string(),
            message: "boom".to_string(),
        })
    }
}

struct PanickingProbe;

#[async_trait]
impl ProbeModule for PanickingProbe {
    fn name(&self) -> &'static str {
        "panicking"
    }

    fn class(&self) -> VulnerabilityClass {
        VulnerabilityClass::Ssrf
    }

    async fn run(
        &self,
        _target: &Target,
        _crawl: &CrawlResult,
        _client: &dyn HttpClient,
        _findings: &FindingCollector,
    ) -> Result<()> {
        panic!("probe bug");
    }
}

struct SlowProbe;

#[async_trait]
impl ProbeModule for SlowProbe {
    fn name(&self) -> &'static str {
        "slow"
    }

    fn class(&self) -> VulnerabilityClass {
        VulnerabilityClass::CommandInjection
    }

    async fn run(
        &self,
        _target: &Target,
        _crawl: &CrawlResult,
        _client: &dyn HttpClient,
        _findings: &FindingCollector,
    ) -> Result<()> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    }
}

fn slow_probe() -> Arc<dyn ProbeModule> {
    Arc::new(SlowProbe)
}

/// Serves `robots.txt` as plain text and never answers for `.git/`.
struct StallingClient;

#[async_trait]
impl HttpClient for StallingClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        if request.url.ends_with("/.git/") {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        if request.url.ends_with("/robots.txt") {
            return Ok(HttpResponse::new(200, request.url.as_str())
                .with_header("Content-Type", "text/plain")
                .with_body("User-agent: *\nDisallow: /admin"));
        }
        Ok(HttpResponse::new(404, request.url.as_str()))
    }
}

#[tokio::test]
async fn test_orchestrator_rejects_zero_threads() {
    assert!(ScanOrchestrator::new(config_with_threads(0)).is_err());
}

#[tokio::test]
async fn test_disabled_probes_are_skipped() -> Result<()> {
    let mut config = Config::default();
    config.scan.disabled_probes =
        vec!["SQLI".to_string(), "cors".to_string(), "nonexistent".to_string()];

    let orchestrator = ScanOrchestrator::new(config)?;
    let enabled = orchestrator.enabled_probes();

    assert_eq!(enabled.len(), 12);
    assert!(!enabled.contains(&"sqli"));
    assert!(!enabled.contains(&"cors"));
    assert_eq!(orchestrator.phase(), ScanPhase::Idle);
    Ok(())
}

#[tokio::test]
async fn test_canned_site_scan() -> Result<()> {
    let orchestrator =
        ScanOrchestrator::new(config_with_threads(4))?.with_client(Arc::new(canned_site()));

    let report = orchestrator.run(target_with_threads(4)).await?;

    assert_eq!(orchestrator.phase(), ScanPhase::Done);
    assert!(!report.cancelled);
    assert_eq!(report.links_discovered, 2);
    assert_eq!(report.forms_discovered, 1);
    assert_eq!(report.findings_for(VulnerabilityClass::SqlInjection).len(), 1);
    assert_eq!(report.findings_for(VulnerabilityClass::CrossSiteScripting).len(), 1);
    assert_eq!(report.findings_for(VulnerabilityClass::Csrf).len(), 1);
    assert_eq!(report.findings_for(VulnerabilityClass::MissingSecurityHeaders).len(), 1);
    assert_eq!(report.total_findings, report.findings().count());
    assert!(report.completed_at.is_some());
    Ok(())
}

#[tokio::test]
async fn test_concurrent_and_sequential_scans_agree() -> Result<()> {
    let sequential = ScanOrchestrator::new(config_with_threads(1))?
        .with_client(Arc::new(canned_site()))
        .run(target_with_threads(1))
        .await?;
    let concurrent = ScanOrchestrator::new(config_with_threads(14))?
        .with_client(Arc::new(canned_site()))
        .run(target_with_threads(14))
        .await?;

    assert_eq!(sequential.total_findings, concurrent.total_findings);
    for group in &sequential.findings_by_class {
        let mut expected = group.findings.clone();
        let mut actual = concurrent.findings_for(group.class).to_vec();
        expected.sort_by(|a, b| a.location.cmp(&b.location).then(a.detail.cmp(&b.detail)));
        actual.sort_by(|a, b| a.location.cmp(&b.location).then(a.detail.cmp(&b.detail)));
        assert_eq!(expected, actual, "{} differs", group.class);
    }
    Ok(())
}

#[tokio::test]
async fn test_concurrency_bound_is_respected() -> Result<()> {
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let probes: Vec<Arc<dyn ProbeModule>> = (0..8)
        .map(|_| {
            Arc::new(GaugeProbe {
                running: running.clone(),
                peak: peak.clone(),
            }) as Arc<dyn ProbeModule>
        })
        .collect();

    let report = ScanOrchestrator::new(config_with_threads(2))?
        .with_client(Arc::new(MockClient::unreachable()))
        .with_probes(probes)
        .run(target_with_threads(2))
        .await?;

    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert!(peak.load(Ordering::SeqCst) >= 1);
    assert_eq!(report.total_findings, 8);
    Ok(())
}

#[tokio::test]
async fn test_failing_probes_are_isolated() -> Result<()> {
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let probes: Vec<Arc<dyn ProbeModule>> = vec![
        Arc::new(FailingProbe),
        Arc::new(PanickingProbe),
        Arc::new(GaugeProbe { running, peak }),
    ];

    let report = ScanOrchestrator::new(config_with_threads(3))?
        .with_client(Arc::new(MockClient::unreachable()))
        .with_probes(probes)
        .run(target_with_threads(3))
        .await?;

    assert_eq!(report.total_findings, 1);
    assert_eq!(report.findings_for(VulnerabilityClass::Idor).len(), 1);
    assert!(!report.cancelled);
    let failure_note = report
        .notes
        .iter()
        .find(|note| note.contains("failing"))
        .expect("failed probes are noted");
    assert!(failure_note.contains("panicking"));
    Ok(())
}

#[tokio::test]
async fn test_cancellation_returns_partial_report() -> Result<()> {
    let orchestrator = ScanOrchestrator::new(config_with_threads(2))?
        .with_client(Arc::new(MockClient::unreachable()))
        .with_probes(vec![slow_probe(), slow_probe()]);

    let cancel = orchestrator.cancel_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    let started = Instant::now();
    let report = orchestrator.run(target_with_threads(2)).await?;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(report.cancelled);
    assert_eq!(report.total_findings, 0);
    assert!(report.notes.iter().any(|note| note.contains("cancelled")));
    Ok(())
}

#[tokio::test]
async fn test_scan_timeout_cancels_probes() -> Result<()> {
    let mut config = config_with_threads(1);
    config.scan.scan_timeout = Some(1);

    let report = ScanOrchestrator::new(config)?
        .with_client(Arc::new(MockClient::unreachable()))
        .with_probes(vec![slow_probe()])
        .run(target_with_threads(1))
        .await?;

    assert!(report.cancelled);
    assert!(report.duration_seconds < 10.0);
    Ok(())
}

#[tokio::test]
async fn test_findings_recorded_before_timeout_are_kept() -> Result<()> {
    let mut config = config_with_threads(1);
    config.scan.scan_timeout = Some(1);
    let probes: Vec<Arc<dyn ProbeModule>> = vec![Arc::new(SensitiveFileProbe)];

    let report = ScanOrchestrator::new(config)?
        .with_client(Arc::new(StallingClient))
        .with_probes(probes)
        .run(target_with_threads(1))
        .await?;

    assert!(report.cancelled);
    assert_eq!(report.total_findings, 1);
    let exposed = report.findings_for(VulnerabilityClass::SensitiveFileExposure);
    assert_eq!(exposed.len(), 1);
    assert_eq!(exposed[0].location, format!("{}/robots.txt", SITE));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_home_page_yields_empty_report() -> Result<()> {
    let report = ScanOrchestrator::new(config_with_threads(4))?
        .with_client(Arc::new(MockClient::unreachable()))
        .run(target_with_threads(4))
        .await?;

    assert_eq!(report.target, SITE);
    assert_eq!(report.links_discovered, 0);
    assert_eq!(report.forms_discovered, 0);
    assert_eq!(report.total_findings, 0);
    assert!(report.technologies.is_empty());
    assert!(report.notes.iter().any(|note| note.contains("Home page unreachable")));
    Ok(())
}

#[tokio::test]
async fn test_scan_against_http_server() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let home = r#"<html><body>
        <a href="/about">About</a>
        <form action="/login" method="post">
            <input type="text" name="username">
            <input type="password" name="password">
            <input type="submit" value="Login">
        </form>
    </body></html>"#;

    let _home = server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(home)
        .create_async()
        .await;
    let _login = server
        .mock("POST", "/login")
        .match_body(Matcher::UrlEncoded("username".into(), "' OR '1'='1".into()))
        .with_status(500)
        .with_body("You have an error in your SQL syntax")
        .create_async()
        .await;

    let report = rwebscan::run_scan(&server.url(), 4, None).await?;
    let login_url = format!("{}/login", server.url());

    assert_eq!(report.links_discovered, 1);
    assert_eq!(report.forms_discovered, 1);

    let csrf = report.findings_for(VulnerabilityClass::Csrf);
    assert_eq!(csrf.len(), 1);
    assert_eq!(csrf[0].location, login_url);

    let sqli = report.findings_for(VulnerabilityClass::SqlInjection);
    assert_eq!(sqli.len(), 1);
    assert_eq!(sqli[0].location, login_url);
    assert!(sqli[0].detail.contains("' OR '1'='1"));
    Ok(())
}

#[tokio::test]
async fn test_run_scan_rejects_bad_input_before_scanning() {
    assert!(matches!(
        rwebscan::run_scan("ftp://site.test", 4, None).await,
        Err(ScanError::InvalidTarget(_))
    ));
    assert!(matches!(
        rwebscan::run_scan("http://site.test", 0, None).await,
        Err(ScanError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_run_scan_against_closed_port() -> Result<()> {
    let report = rwebscan::run_scan("http://127.0.0.1:1", 4, None).await?;

    assert_eq!(report.links_discovered, 0);
    assert_eq!(report.forms_discovered, 0);
    assert_eq!(report.total_findings, 0);
    assert!(!report.notes.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_cancelled_token_refuses_new_scan() -> Result<()> {
    let orchestrator = ScanOrchestrator::new(config_with_threads(2))?
        .with_client(Arc::new(MockClient::unreachable()));
    orchestrator.cancel_token().cancel();

    let result = orchestrator.run(target_with_threads(2)).await;

    assert!(matches!(result, Err(ScanError::Cancelled)));
    assert_eq!(orchestrator.phase(), ScanPhase::Idle);
    Ok(())
}
