use anyhow::{Context, Result};
use clap::Parser;
use proxy_checker::{
    CancellationController, CheckerConfig, Error, HttpProber, ProxyParser, ResultAggregator,
    Scheduler, StatusSink, DEFAULT_TEST_URL,
};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Test proxies inside a proxy list
#[derive(Parser)]
#[command(name = "proxy-checker")]
#[command(about = "Test proxies inside a proxy list", version)]
struct Cli {
    /// Proxy list, one HOST:PORT or HOST:PORT:USER:PASS per line
    proxylist: PathBuf,

    /// URL to test
    #[arg(long, default_value = DEFAULT_TEST_URL)]
    url: String,

    /// Timeout in milliseconds
    #[arg(long, default_value_t = 2000)]
    timeout: u64,

    /// Number of proxies tested at the same time
    #[arg(short, long, default_value_t = 20)]
    workers: usize,

    /// Export working proxies to this file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Export proxies that failed to this file
    #[arg(long)]
    bad: Option<PathBuf>,

    /// Write a JSON report of the run to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Disable coloured status lines
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let color = !cli.no_color && std::io::stdout().is_terminal();
    let sink = StatusSink::stdout(color);

    let parsed = ProxyParser::parse_file(&cli.proxylist)
        .with_context(|| format!("failed to read proxy list {:?}", cli.proxylist))?;

    for ignored in &parsed.ignored {
        if let Error::MalformedLine { line, .. } = ignored {
            sink.notice(&format!("Ignoring line '{}'", line));
        }
    }

    println!(
        "Loaded {} proxies from {:?} ({} lines ignored)",
        parsed.proxies.len(),
        cli.proxylist,
        parsed.ignored.len()
    );
    println!(
        "Checking with {} workers, timeout: {}ms",
        cli.workers.max(1),
        cli.timeout
    );
    println!("Test URL: {}", cli.url);
    println!();

    let config = CheckerConfig::new()
        .with_concurrency(cli.workers)
        .with_timeout(Duration::from_millis(cli.timeout))
        .with_test_url(cli.url);

    let workers = config.concurrency;
    let scheduler = Scheduler::new(HttpProber::with_config(config), workers, sink.clone());
    let controller = CancellationController::new(sink);
    let token = controller.token();

    let results = controller
        .supervise(scheduler.run(&parsed.proxies, &token))
        .await;

    let summary = ResultAggregator::summarize(&results);
    println!();
    println!(
        "Results: {} tested, {} working, {} failed ({} proxy, {} network, {} timed out), {} cancelled",
        summary.tested,
        summary.working,
        summary.failed,
        summary.proxy_failures,
        summary.network_failures,
        summary.timeouts,
        summary.cancelled
    );
    if summary.was_interrupted() {
        println!("Run was interrupted; only completed checks are kept.");
    }

    // An empty path means no export, as with no flag at all
    if let Some(path) = cli.export.filter(|p| !p.as_os_str().is_empty()) {
        let working = ResultAggregator::working(&results);
        ProxyParser::save_to_file(&working, &path)
            .with_context(|| format!("failed to write {:?}", path))?;
        println!("Saved {} working proxies to {:?}", working.len(), path);
    }

    if let Some(path) = cli.bad.filter(|p| !p.as_os_str().is_empty()) {
        let failed = ResultAggregator::failed(&results);
        ProxyParser::save_to_file(&failed, &path)
            .with_context(|| format!("failed to write {:?}", path))?;
        println!("Saved {} failed proxies to {:?}", failed.len(), path);
    }

    if let Some(path) = cli.report {
        let report = serde_json::to_string_pretty(&ResultAggregator::report(&results))?;
        std::fs::write(&path, report).with_context(|| format!("failed to write {:?}", path))?;
        println!("Saved report to {:?}", path);
    }

    Ok(())
}
