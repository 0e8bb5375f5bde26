use anyhow::{bail, Context};
use clap::Parser;
use printframe::source::load_source;
use printframe::{
    HostDocument, MemoryDocument, PrintConfig, PrintOutcome, PrintRecord, PrintRenderer,
    PrintRequest, StyleSource, TokioScheduler,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Preview the document a container print would send to the printer
#[derive(Parser, Debug)]
#[command(name = "printframe", version, about)]
struct Cli {
    /// Host page: a file path or an http(s) URL
    source: String,

    /// Id of the container to print
    #[arg(long)]
    id: String,

    /// Print scale in percent (clamped to 10..=100)
    #[arg(long, default_value_t = 100, allow_negative_numbers = true)]
    scale: i64,

    /// Selector to hide in the printed output (repeatable)
    #[arg(long = "hide")]
    hide: Vec<String>,

    /// Selector to force visible in the printed output (repeatable)
    #[arg(long = "show")]
    show: Vec<String>,

    /// JSON file with renderer configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the delay before printing, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Timeout for fetching a remote source, in milliseconds
    #[arg(long, default_value_t = 30000)]
    timeout_ms: u64,

    /// Write the printed document here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a JSON report instead of the document
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct Report {
    outcome: PrintOutcome,
    effective_scale: f64,
    base_href: Option<String>,
    style_sources: Vec<StyleSource>,
    printed_bytes: Option<usize>,
    output: Option<PathBuf>,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<PrintConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            PrintConfig::from_json_str(&text)?
        }
        None => PrintConfig::default(),
    };
    if let Some(ms) = cli.delay_ms {
        config.print_delay_ms = ms;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut config = load_config(&cli)?;
    // Blocking fetch happens before the runtime exists
    let page = load_source(&cli.source, Duration::from_millis(cli.timeout_ms))?;
    if config.base_href.is_none() {
        config.base_href = page.base_href.clone();
    }
    config.validate()?;

    let request = PrintRequest::new(cli.id.clone())
        .scale(cli.scale)
        .hide(cli.hide.clone())
        .show(cli.show.clone());

    let host = Arc::new(MemoryDocument::parse(page.html));
    let printed: Arc<Mutex<Option<PrintRecord>>> = Arc::new(Mutex::new(None));
    let sink = printed.clone();
    host.on_print(move |record| {
        if let Ok(mut slot) = sink.lock() {
            *slot = Some(record.clone());
        }
    });

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("building runtime")?;
    let local = tokio::task::LocalSet::new();
    let renderer = PrintRenderer::with_config(host.clone(), TokioScheduler, config);
    let outcome = local.block_on(&runtime, async { renderer.render(&request) });
    // Drive the deferred print to completion
    runtime.block_on(local);

    let record = printed.lock().ok().and_then(|slot| slot.clone());
    if let Some(record) = &record {
        match &cli.output {
            Some(path) => std::fs::write(path, &record.html)
                .with_context(|| format!("writing {}", path.display()))?,
            None if !cli.json => println!("{}", record.html),
            None => {}
        }
    }

    if cli.json {
        let report = Report {
            effective_scale: request.effective_scale().value(),
            base_href: renderer.config().base_href.clone(),
            style_sources: renderer.host().style_sources()?,
            printed_bytes: record.as_ref().map(|r| r.html.len()),
            output: cli.output.clone(),
            outcome: outcome.clone(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    match outcome {
        PrintOutcome::Scheduled(_) if record.is_some() => Ok(()),
        PrintOutcome::Scheduled(id) => bail!("{} was scheduled but never printed", id),
        PrintOutcome::LookupFailed(id) => bail!("container '{}' not found in {}", id, cli.source),
        PrintOutcome::SetupFailed(msg) => bail!("print setup failed: {}", msg),
    }
}
