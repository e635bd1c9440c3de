use crate::config::Config;
use crate::crawler::{CrawlResult, SiteCrawler};
use crate::fingerprint::TechnologyFingerprinter;
use crate::http::{HttpClient, ReqwestClient};
use crate::probes::{self, ProbeModule};
use crate::reporting::{Report, ReportAggregator};
use crate::types::{Finding, Target, Technology};
use crate::utils::time::now_utc;
use crate::{Result, ScanError};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Semaphore};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanPhase {
    Idle,
    Discovering,
    Probing,
    Aggregating,
    Done,
}

/// Cooperative cancellation shared between the caller and every probe task.
/// Once cancelled it stays cancelled.
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once `cancel` has been called.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        while !*receiver.borrow_and_update() {
            if receiver.changed().await.is_err() {
                // The sender lives as long as any token clone; unreachable in practice.
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Append-only finding list safe for concurrent writers.
#[derive(Debug, Clone, Default)]
pub struct FindingCollector {
    inner: Arc<Mutex<Vec<Finding>>>,
}

impl FindingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a whole batch under one lock, so a probe's findings stay contiguous
    /// and in the order the probe produced them.
    pub fn extend(&self, findings: Vec<Finding>) {
        if findings.is_empty() {
            return;
        }
        self.inner.lock().extend(findings);
    }

    /// Record one finding the moment it is detected.
    pub fn push(&self, finding: Finding) {
        self.inner.lock().push(finding);
    }

    /// Drain everything collected so far.
    pub fn take(&self) -> Vec<Finding> {
        std::mem::take(&mut *self.inner.lock())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<Finding> {
        self.inner.lock().clone()
    }
}

/// State of one scan from discovery to report. Not persisted.
pub struct ScanSession {
    pub scan_id: Uuid,
    pub target: Target,
    pub crawl: Arc<CrawlResult>,
    pub technologies: Vec<Technology>,
    pub findings: FindingCollector,
    pub started_at: DateTime<Utc>,
    pub cancelled: bool,
    pub failed_probes: Vec<String>,
    pub notes: Vec<String>,
    started: Instant,
    completed_at: Option<DateTime<Utc>>,
    elapsed: Option<Duration>,
}

impl ScanSession {
    pub fn new(target: Target) -> Self {
        Self {
            scan_id: Uuid::new_v4(),
            target,
            crawl: Arc::new(CrawlResult::default()),
            technologies: Vec::new(),
            findings: FindingCollector::new(),
            started_at: now_utc(),
            cancelled: false,
            failed_probes: Vec::new(),
            notes: Vec::new(),
            started: Instant::now(),
            completed_at: None,
            elapsed: None,
        }
    }

    /// Record the end time. Only the first call has an effect.
    pub fn finish(&mut self) {
        if self.completed_at.is_some() {
            debug!("Scan {} already finished", self.scan_id);
            return;
        }
        self.elapsed = Some(self.started.elapsed());
        self.completed_at = Some(now_utc());
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Time from start to `finish`, or to now while the scan is running.
    pub fn duration(&self) -> Duration {
        self.elapsed.unwrap_or_else(|| self.started.elapsed())
    }
}

enum ProbeOutcome {
    Completed(usize),
    Failed(String),
    /// Cancelled after recording this many findings.
    Cancelled(usize),
}

/// Runs discovery, then every enabled probe concurrently, then aggregation.
pub struct ScanOrchestrator {
    config: Config,
    probes: Vec<Arc<dyn ProbeModule>>,
    client: Option<Arc<dyn HttpClient>>,
    cancel: CancelToken,
    phase: Arc<RwLock<ScanPhase>>,
}

impl ScanOrchestrator {
    pub fn new(config: Config) -> Result<Self> {
        if config.scan.threads == 0 {
            return Err(ScanError::InvalidInput("thread count must be at least 1".to_string()));
        }

        let known = probes::probe_names();
        for name in &config.scan.disabled_probes {
            if !known.iter().any(|k| k.eq_ignore_ascii_case(name)) {
                warn!("Unknown probe '{}' in disabled list (known: {})", name, known.join(", "));
            }
        }

        let probes = probes::registry()
            .into_iter()
            .filter(|probe| config.is_probe_enabled(probe.name()))
            .collect();

        Ok(Self {
            config,
            probes,
            client: None,
            cancel: CancelToken::new(),
            phase: Arc::new(RwLock::new(ScanPhase::Idle)),
        })
    }

    /// Use `client` instead of building a `reqwest` session from the config.
    pub fn with_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Replace the probe set.
    pub fn with_probes(mut self, probes: Vec<Arc<dyn ProbeModule>>) -> Self {
        self.probes = probes;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn phase(&self) -> ScanPhase {
        *self.phase.read()
    }

    pub fn enabled_probes(&self) -> Vec<&'static str> {
        self.probes.iter().map(|probe| probe.name()).collect()
    }

    fn set_phase(&self, phase: ScanPhase) {
        debug!("Scan phase: {:?}", phase);
        *self.phase.write() = phase;
    }

    /// Scan `target` and return the aggregated report.
    ///
    /// Only a failure to build the HTTP session, or a token cancelled before the
    /// scan starts, is an error; every network or probe failure during the scan
    /// degrades the report instead.
    pub async fn run(&self, target: Target) -> Result<Report> {
        if self.cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let client: Arc<dyn HttpClient> = match &self.client {
            Some(client) => client.clone(),
            None => Arc::new(ReqwestClient::new(&self.config, target.auth().cloned())?),
        };

        info!("Starting scan for: {}", target.base_url());
        let mut session = ScanSession::new(target);

        self.set_phase(ScanPhase::Discovering);
        tokio::select! {
            (technologies, crawl) = self.discover(&session.target, client.as_ref()) => {
                session.technologies = technologies;
                session.crawl = Arc::new(crawl);
            }
            _ = self.cancel.cancelled() => {
                warn!("Scan cancelled during discovery");
                session.cancelled = true;
                session
                    .notes
                    .push("Scan cancelled during discovery; no probes were run".to_string());
            }
        }

        if let Some(error) = &session.crawl.fetch_error {
            session.notes.push(format!(
                "Home page unreachable ({}); 0 links and 0 forms discovered",
                error
            ));
        }

        self.set_phase(ScanPhase::Probing);
        if !session.cancelled {
            self.probe(&mut session, client).await;
        }
        session.finish();

        self.set_phase(ScanPhase::Aggregating);
        let report = ReportAggregator::new().aggregate(&session);

        self.set_phase(ScanPhase::Done);
        info!(
            "Scan completed in {:.2}s with {} findings",
            report.duration_seconds, report.total_findings
        );
        Ok(report)
    }

    /// Fetch the home page once; fingerprint it, probe the well-known paths,
    /// then crawl it.
    async fn discover(
        &self,
        target: &Target,
        client: &dyn HttpClient,
    ) -> (Vec<Technology>, CrawlResult) {
        info!("Discovering technologies");
        let fingerprinter = TechnologyFingerprinter::new();
        let crawler = SiteCrawler::new(self.config.web_scan.strict_origin);

        match client.get(target.base_url()).await {
            Ok(home) => {
                let mut technologies = fingerprinter.inspect(&home);
                technologies.extend(fingerprinter.probe_paths(client, target).await);
                let crawl = crawler.crawl_response(&home, target);
                (technologies, crawl)
            }
            Err(e) => {
                warn!("Error fetching {}: {}", target.base_url(), e);
                let technologies = fingerprinter.probe_paths(client, target).await;
                let crawl = CrawlResult {
                    fetch_error: Some(e.to_string()),
                    ..CrawlResult::default()
                };
                (technologies, crawl)
            }
        }
    }

    async fn probe(&self, session: &mut ScanSession, client: Arc<dyn HttpClient>) {
        let semaphore = Arc::new(Semaphore::new(session.target.max_threads()));
        let target = Arc::new(session.target.clone());
        let mut handles = Vec::with_capacity(self.probes.len());

        info!(
            "Running {} probes with up to {} in parallel",
            self.probes.len(),
            session.target.max_threads()
        );

        for probe in &self.probes {
            let probe = probe.clone();
            let name = probe.name();
            let semaphore = semaphore.clone();
            let target = target.clone();
            let crawl = session.crawl.clone();
            let client = client.clone();
            let findings = session.findings.clone();
            let cancel = self.cancel.clone();

            let handle = tokio::spawn(async move {
                let permit = tokio::select! {
                    permit = semaphore.acquire_owned() => permit,
                    _ = cancel.cancelled() => return ProbeOutcome::Cancelled(0),
                };
                let Ok(_permit) = permit else { return ProbeOutcome::Cancelled(0) };

                // A cancelled probe keeps what it recorded, a failed one contributes nothing.
                let local = FindingCollector::new();
                tokio::select! {
                    result = probe.run(&target, &crawl, client.as_ref(), &local) => match result {
                        Ok(()) => {
                            let found = local.take();
                            let count = found.len();
                            findings.extend(found);
                            ProbeOutcome::Completed(count)
                        }
                        Err(e) => ProbeOutcome::Failed(e.to_string()),
                    },
                    _ = cancel.cancelled() => {
                        let found = local.take();
                        let count = found.len();
                        findings.extend(found);
                        ProbeOutcome::Cancelled(count)
                    }
                }
            });
            handles.push((name, handle));
        }

        let watchdog = self.config.scan_timeout().map(|limit| {
            let cancel = self.cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                warn!("Scan timeout of {:?} reached, cancelling remaining probes", limit);
                cancel.cancel();
            })
        });

        let outcomes = join_all(
            handles
                .into_iter()
                .map(|(name, handle)| async move { (name, handle.await) }),
        )
        .await;

        for (name, outcome) in outcomes {
            match outcome {
                Ok(ProbeOutcome::Completed(count)) => {
                    debug!("Probe {} completed with {} findings", name, count);
                }
                Ok(ProbeOutcome::Failed(message)) => {
                    warn!("Error in probe {}: {}", name, message);
                    session.failed_probes.push(name.to_string());
                }
                Ok(ProbeOutcome::Cancelled(count)) => {
                    debug!("Probe {} cancelled after {} findings", name, count);
                    session.cancelled = true;
                }
                Err(e) => {
                    let message = if e.is_panic() { "panicked".to_string() } else { e.to_string() };
                    warn!("Error in probe {}: {}", name, message);
                    session.failed_probes.push(name.to_string());
                }
            }
        }

        if let Some(watchdog) = watchdog {
            watchdog.abort();
        }
        if self.cancel.is_cancelled() {
            session.cancelled = true;
            session.notes.push("Scan cancelled before all probes completed".to_string());
        }
        if !session.failed_probes.is_empty() {
            session.notes.push(format!(
                "Probes failed and contributed no findings: {}",
                session.failed_probes.join(", ")
            ));
        }
    }
}
