use clap::Parser;
use env_logger::Env;
use log::{debug, warn};
use rwebscan::{
    cli::Cli,
    config::Config,
    display::DisplayManager,
    probes,
    reporting::ReportWriter,
    types::{Credentials, Target},
    utils::{progress, time},
    Result, ScanOrchestrator,
};
use std::process;
use std::time::Instant;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_level()))
        .format_timestamp_secs()
        .init();

    let display = DisplayManager::with_quiet(cli.quiet);

    if cli.list_probes {
        list_probes(&display);
        return;
    }

    if !cli.quiet {
        display.print_banner(
            "🔒 RWEBSCAN - Web Vulnerability Scanner",
            Some("Authorized Testing Only"),
        );
        display.print_warning("Ensure you have proper permission before scanning any site.");
        println!();
    }

    let mut config = if let Some(config_path) = &cli.config {
        match Config::load_from_file(&config_path.to_string_lossy()) {
            Ok(config) => {
                display.print_success(&format!(
                    "Loaded configuration from {}",
                    config_path.display()
                ));
                config
            }
            Err(e) => {
                display.print_warning(&format!(
                    "Failed to load configuration: {}, using defaults",
                    e
                ));
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    cli.apply_to(&mut config);

    let start_time = Instant::now();

    match execute_scan(&cli, config, &display).await {
        Ok(()) => {
            display.print_success(&format!(
                "Scan completed in {}",
                time::format_duration(start_time.elapsed())
            ));
        }
        Err(e) => {
            display.print_error(&format!("Scan failed: {}", e));
            process::exit(1);
        }
    }
}

async fn execute_scan(cli: &Cli, config: Config, display: &DisplayManager) -> Result<()> {
    let auth = cli.auth.as_deref().map(Credentials::parse).transpose()?;
    let url = cli.url.as_deref().unwrap_or_default();
    let target = Target::new(url, config.scan.threads, auth)?;

    let orchestrator = ScanOrchestrator::new(config.clone())?;
    debug!("Enabled probes: {}", orchestrator.enabled_probes().join(", "));

    let cancel = orchestrator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling scan");
            cancel.cancel();
        }
    });

    display.print_section_header("🌐 WEB APPLICATION SCAN");
    display.print_info(&format!("Scanning {}", target.base_url()));

    let spinner =
        (!display.is_quiet()).then(|| progress::create_spinner("Crawling and probing..."));
    let result = orchestrator.run(target).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let report = result?;

    if cli.quiet {
        println!("{}", report.render_text());
    } else {
        display.print_report(&report);
    }
    if report.cancelled {
        display.print_warning("Scan was cancelled; the report is partial");
    }

    let files = ReportWriter::new(config).write(&report).await?;
    for file in files {
        display.print_success(&format!("Report written to {}", file.display()));
    }

    Ok(())
}

fn list_probes(display: &DisplayManager) {
    display.print_section_header("Available probes");
    for probe in probes::registry() {
        println!("  {:<18} {}", probe.name(), probe.class());
    }
}
