use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rwebscan")]
#[command(about = "Web application vulnerability scanner for authorized security assessment")]
#[command(long_about = r#"
rwebscan crawls a web site, fingerprints its technology stack and runs a set of
heuristic vulnerability probes (SQLi, XSS, traversal, CSRF, CORS, headers...)
against everything it discovered.

WARNING: This tool should only be used on applications you own or have explicit
permission to test. Unauthorized scanning may be illegal.

Usage Examples:
  rwebscan -u http://testsite.local                     # Scan with defaults
  rwebscan -u http://testsite.local -t 20               # 20 probes in parallel
  rwebscan -u http://testsite.local -a admin:secret     # HTTP basic auth
  rwebscan -u http://testsite.local --skip http_methods # Skip a probe
  rwebscan -u http://testsite.local --format json --format csv -o ./out
  rwebscan --list-probes
"#)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Target base URL (http or https)
    #[arg(short, long, value_name = "URL", required_unless_present = "list_probes")]
    pub url: Option<String>,

    /// Maximum number of probes running at once
    #[arg(short, long, default_value = "10")]
    pub threads: usize,

    /// Basic auth credentials as user:pass
    #[arg(short, long, value_name = "USER:PASS", env = "RWEBSCAN_AUTH")]
    pub auth: Option<String>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Cancel remaining probes after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub scan_timeout: Option<u64>,

    /// Probe to skip (repeatable), e.g. --skip methods --skip cors
    #[arg(long = "skip", value_name = "PROBE")]
    pub skip: Vec<String>,

    /// Keep only links with exactly the target's scheme, host and port
    #[arg(long)]
    pub strict_origin: bool,

    /// Output directory for report files
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report file format (repeatable)
    #[arg(long, value_enum)]
    pub format: Vec<OutputFormat>,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress output)
    #[arg(short, long)]
    pub quiet: bool,

    /// List the available probes and exit
    #[arg(long)]
    pub list_probes: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
    Text,
}

impl From<OutputFormat> for crate::config::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => crate::config::OutputFormat::Json,
            OutputFormat::Csv => crate::config::OutputFormat::Csv,
            OutputFormat::Text => crate::config::OutputFormat::Text,
        }
    }
}

impl Cli {
    /// Log filter derived from -q and -v
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Apply command line overrides on top of a loaded configuration
    pub fn apply_to(&self, config: &mut crate::config::Config) {
        config.scan.threads = self.threads;
        if let Some(timeout) = self.timeout {
            config.scan.request_timeout = timeout;
        }
        if self.scan_timeout.is_some() {
            config.scan.scan_timeout = self.scan_timeout;
        }
        config.scan.disabled_probes.extend(self.skip.iter().cloned());
        if self.strict_origin {
            config.web_scan.strict_origin = true;
        }
        if let Some(output) = &self.output {
            config.reporting.output_dir = output.clone();
        }
        if !self.format.is_empty() {
            config.reporting.formats = self.format.iter().copied().map(Into::into).collect();
        }
    }
}
