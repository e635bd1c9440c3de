use crate::config::{Config, OutputFormat};
use crate::orchestrator::ScanSession;
use crate::types::{Finding, Technology, VulnerabilityClass};
use crate::{Result, ScanError};
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingGroup {
    pub class: VulnerabilityClass,
    pub findings: Vec<Finding>,
}

/// Final scan result handed to the caller. Rendering and export are up to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub scan_id: String,
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: f64,
    pub technologies: Vec<Technology>,
    pub links_discovered: usize,
    pub forms_discovered: usize,
    pub endpoints_discovered: usize,
    /// Grouped by class, classes in first-seen order.
    pub findings_by_class: Vec<FindingGroup>,
    pub total_findings: usize,
    pub cancelled: bool,
    pub notes: Vec<String>,
}

impl Report {
    pub fn findings_for(&self, class: VulnerabilityClass) -> &[Finding] {
        self.findings_by_class
            .iter()
            .find(|group| group.class == class)
            .map(|group| group.findings.as_slice())
            .unwrap_or(&[])
    }

    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.findings_by_class.iter().flat_map(|group| group.findings.iter())
    }

    /// Plain-text rendering: summary lines, then one block per class.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "Target: {}", self.target);
        let _ = writeln!(out, "Scan duration: {:.2} seconds", self.duration_seconds);
        let technologies = if self.technologies.is_empty() {
            "None detected".to_string()
        } else {
            self.technologies.join(", ")
        };
        let _ = writeln!(out, "Technologies detected: {}", technologies);
        let _ = writeln!(
            out,
            "Surface: {} links, {} forms, {} endpoints",
            self.links_discovered, self.forms_discovered, self.endpoints_discovered
        );
        for note in &self.notes {
            let _ = writeln!(out, "Note: {}", note);
        }
        let _ = writeln!(out, "Found {} potential vulnerabilities", self.total_findings);

        if self.total_findings == 0 {
            let _ = writeln!(out, "\nNo vulnerabilities found!");
            return out;
        }

        for group in &self.findings_by_class {
            let _ = writeln!(out, "\n=== {} ({} found) ===", group.class, group.findings.len());
            for (i, finding) in group.findings.iter().enumerate() {
                let _ = writeln!(out, "\n{}. URL: {}", i + 1, finding.location);
                if !finding.detail.is_empty() {
                    let _ = writeln!(out, "   Payload/Details: {}", finding.detail);
                }
                let _ = writeln!(out, "   Tested URL: {}", finding.tested_url);
            }
            let _ = writeln!(out, "{}", "-".repeat(60));
        }

        out
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportAggregator;

impl ReportAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(&self, session: &ScanSession) -> Report {
        let findings = session.findings.snapshot();
        let findings_by_class = group_by_class(findings);
        let total_findings = findings_by_class.iter().map(|g| g.findings.len()).sum();

        Report {
            scan_id: session.scan_id.to_string(),
            target: session.target.base_url().to_string(),
            started_at: session.started_at,
            completed_at: session.completed_at(),
            duration_seconds: session.duration().as_secs_f64(),
            technologies: session.technologies.clone(),
            links_discovered: session.crawl.links.len(),
            forms_discovered: session.crawl.forms.len(),
            endpoints_discovered: session.crawl.endpoints.len(),
            findings_by_class,
            total_findings,
            cancelled: session.cancelled,
            notes: session.notes.clone(),
        }
    }
}

/// Stable grouping: classes in first-seen order, findings in arrival order.
pub fn group_by_class(findings: Vec<Finding>) -> Vec<FindingGroup> {
    let mut groups: Vec<FindingGroup> = Vec::new();
    for finding in findings {
        match groups.iter_mut().find(|group| group.class == finding.class) {
            Some(group) => group.findings.push(finding),
            None => groups.push(FindingGroup {
                class: finding.class,
                findings: vec![finding],
            }),
        }
    }
    groups
}

/// Writes a report to disk in each configured format.
pub struct ReportWriter {
    config: Config,
}

impl ReportWriter {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn write(&self, report: &Report) -> Result<Vec<PathBuf>> {
        let mut generated_files = Vec::new();

        fs::create_dir_all(&self.config.reporting.output_dir)
            .await
            .map_err(|e| {
                ScanError::Reporting(format!("Failed to create output directory: {}", e))
            })?;

        let timestamp = report.started_at.format("%Y%m%d_%H%M%S");
        let base_filename = format!("rwebscan_report_{}", timestamp);

        for format in &self.config.reporting.formats {
            let (extension, contents) = match format {
                OutputFormat::Json => ("json", serde_json::to_string_pretty(report)?),
                OutputFormat::Csv => ("csv", render_csv(report)?),
                OutputFormat::Text => ("txt", report.render_text()),
            };
            let path = self
                .config
                .reporting
                .output_dir
                .join(format!("{}.{}", base_filename, extension));
            write_file(&path, contents).await?;
            generated_files.push(path);
        }

        info!("Generated {} report files", generated_files.len());
        Ok(generated_files)
    }
}

async fn write_file(path: &Path, contents: String) -> Result<()> {
    debug!("Writing report: {}", path.display());
    fs::write(path, contents)
        .await
        .map_err(|e| ScanError::Reporting(format!("Failed to write {}: {}", path.display(), e)))
}

pub fn render_csv(report: &Report) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Vulnerability", "Severity", "URL", "Details", "Tested URL"])?;
    for finding in report.findings() {
        let severity = format!("{:?}", finding.class.severity());
        writer.write_record([
            finding.class.label(),
            severity.as_str(),
            finding.location.as_str(),
            finding.detail.as_str(),
            finding.tested_url.as_str(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ScanError::Reporting(format!("Failed to flush CSV: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| ScanError::Reporting(format!("CSV is not UTF-8: {}", e)))
}
