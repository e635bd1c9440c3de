use crate::reporting::Report;
use crate::types::{Finding, Severity, VulnerabilityClass};
use crate::utils::{time, urls};
use colored::*;
use std::time::Duration;

/// Terminal output for scan progress and results
pub struct DisplayManager {
    use_colors: bool,
    quiet_mode: bool,
}

impl DisplayManager {
    pub fn new() -> Self {
        Self::with_quiet(false)
    }

    pub fn with_quiet(quiet: bool) -> Self {
        let use_colors = std::env::var("NO_COLOR").is_err()
            && std::env::var("TERM").map_or(true, |term| term != "dumb");

        Self {
            use_colors,
            quiet_mode: quiet,
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet_mode
    }

    /// Print one finding under its class header
    pub fn print_finding(&self, index: usize, finding: &Finding) {
        if self.quiet_mode {
            return;
        }

        if self.use_colors {
            println!(
                "  {} {}",
                format!("{}.", index).bright_black(),
                urls::truncate(&finding.location, 100).bright_white().bold()
            );
            if !finding.detail.is_empty() {
                println!(
                    "    └─ {}: {}",
                    "Payload/Details".blue().bold(),
                    finding.detail.cyan()
                );
            }
            println!("    └─ {}: {}", "Tested URL".blue().bold(), finding.tested_url.white());
        } else {
            println!("  {}. URL: {}", index, finding.location);
            if !finding.detail.is_empty() {
                println!("     Payload/Details: {}", finding.detail);
            }
            println!("     Tested URL: {}", finding.tested_url);
        }
    }

    /// Print the full report: surface summary, then findings grouped by class
    pub fn print_report(&self, report: &Report) {
        if self.quiet_mode {
            return;
        }

        self.print_section_header("📋 SCAN REPORT");
        self.print_info(&format!("Target: {}", report.target));
        self.print_info(&format!(
            "Scan duration: {}",
            time::format_duration(Duration::from_secs_f64(report.duration_seconds))
        ));

        if report.technologies.is_empty() {
            self.print_info("Technologies detected: None detected");
        } else {
            self.print_info(&format!("Technologies detected: {}", report.technologies.join(", ")));
        }
        self.print_info(&format!(
            "Surface: {} links, {} forms, {} endpoints",
            report.links_discovered, report.forms_discovered, report.endpoints_discovered
        ));
        for note in &report.notes {
            self.print_warning(note);
        }
        println!();

        for group in &report.findings_by_class {
            self.print_class_header(group.class, group.findings.len());
            for (i, finding) in group.findings.iter().enumerate() {
                self.print_finding(i + 1, finding);
            }
            println!();
        }

        self.print_scan_summary(report);
    }

    fn print_class_header(&self, class: VulnerabilityClass, count: usize) {
        let severity = class.severity();
        if self.use_colors {
            println!(
                "  {} {} {}",
                self.get_severity_icon(severity),
                class.label().color(self.get_severity_color(severity)).bold(),
                format!("({} found)", count).bright_black()
            );
        } else {
            println!("=== {} ({} found) ===", class.label(), count);
        }
    }

    /// Print the finding count per severity
    pub fn print_scan_summary(&self, report: &Report) {
        if self.quiet_mode {
            return;
        }

        let count = |severity: Severity| {
            report
                .findings_by_class
                .iter()
                .filter(|group| group.class.severity() == severity)
                .map(|group| group.findings.len())
                .sum::<usize>()
        };
        let rows = [
            ("High", count(Severity::High), Color::Red, "⚠️"),
            ("Medium", count(Severity::Medium), Color::Yellow, "⚡"),
            ("Low", count(Severity::Low), Color::Green, "ℹ️"),
            ("Info", count(Severity::Info), Color::Blue, "💡"),
        ];

        if self.use_colors {
            self.print_section_header("📊 SCAN RESULTS SUMMARY");
            if report.total_findings == 0 {
                println!("  ✨ {}", "No vulnerabilities found!".bright_green().bold());
                return;
            }
            println!(
                "  🔍 {}: {}",
                "Potential vulnerabilities".bright_white().bold(),
                report.total_findings.to_string().yellow().bold()
            );
            println!();
            println!("  ┌─────────────┬───────┐");
            println!(
                "  │ {} │ {} │",
                "Severity".bright_white().bold(),
                "Count".bright_white().bold()
            );
            println!("  ├─────────────┼───────┤");
            for (name, count, color, icon) in rows.iter().filter(|(_, count, _, _)| *count > 0) {
                println!(
                    "  │ {} {} │ {:>5} │",
                    icon,
                    format!("{:<8}", name).color(*color).bold(),
                    count.to_string().color(*color).bold()
                );
            }
            println!("  └─────────────┴───────┘");
        } else {
            println!("\n=== SCAN RESULTS SUMMARY ===");
            if report.total_findings == 0 {
                println!("No vulnerabilities found!");
                return;
            }
            println!("Found {} potential vulnerabilities", report.total_findings);
            for (name, count, _, _) in &rows {
                println!("{}: {}", name, count);
            }
        }
        println!();
    }

    pub fn print_section_header(&self, title: &str) {
        if self.quiet_mode {
            return;
        }

        if self.use_colors {
            println!("{}", title.bright_cyan().bold());
            println!("{}", "─".repeat(title.chars().count()).bright_cyan());
        } else {
            println!("{}", title);
            println!("{}", "=".repeat(title.len()));
        }
    }

    pub fn print_success(&self, message: &str) {
        if self.quiet_mode {
            return;
        }

        if self.use_colors {
            println!("  {} {}", "✓".bright_green().bold(), message.green());
        } else {
            println!("[✓] {}", message);
        }
    }

    pub fn print_warning(&self, message: &str) {
        if self.quiet_mode {
            return;
        }

        if self.use_colors {
            println!("  {} {}", "!".bright_yellow().bold(), message.yellow());
        } else {
            println!("[!] {}", message);
        }
    }

    /// Errors are printed even in quiet mode
    pub fn print_error(&self, message: &str) {
        if self.use_colors {
            eprintln!("  {} {}", "✗".bright_red().bold(), message.red().bold());
        } else {
            eprintln!("[✗] {}", message);
        }
    }

    pub fn print_info(&self, message: &str) {
        if self.quiet_mode {
            return;
        }

        if self.use_colors {
            println!("  {} {}", "i".bright_blue().bold(), message.blue());
        } else {
            println!("[i] {}", message);
        }
    }

    fn get_severity_icon(&self, severity: Severity) -> &'static str {
        match severity {
            Severity::High => "⚠️",
            Severity::Medium => "⚡",
            Severity::Low => "ℹ️",
            Severity::Info => "💡",
        }
    }

    fn get_severity_color(&self, severity: Severity) -> Color {
        match severity {
            Severity::High => Color::Red,
            Severity::Medium => Color::Yellow,
            Severity::Low => Color::Green,
            Severity::Info => Color::Blue,
        }
    }

    pub fn print_banner(&self, title: &str, subtitle: Option<&str>) {
        if self.quiet_mode {
            return;
        }

        if self.use_colors {
            println!();
            let rule = "─".repeat(title.len() + 2);
            println!("  {}{}{}", "┌─".bright_cyan(), rule.bright_cyan(), "─┐".bright_cyan());
            println!(
                "  {} {} {}",
                "│".bright_cyan(),
                title.bright_white().bold(),
                "│".bright_cyan()
            );
            if let Some(sub) = subtitle {
                println!(
                    "  {} {} {}",
                    "│".bright_cyan(),
                    format!("{:^width$}", sub, width = title.len()).bright_black(),
                    "│".bright_cyan()
                );
            }
            println!("  {}{}{}", "└─".bright_cyan(), rule.bright_cyan(), "─┘".bright_cyan());
            println!();
        } else {
            let border = "=".repeat(title.len() + 4);
            println!("\n{}", border);
            println!("  {}  ", title);
            if let Some(sub) = subtitle {
                println!("  {}  ", sub);
            }
            println!("{}\n", border);
        }
    }
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}
