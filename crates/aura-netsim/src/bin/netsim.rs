//! Netsim probe
//!
//! Fires a batch of simulated calls through a configured network behavior and
//! reports how they resolved. Useful for eyeballing a behavior file before
//! pointing a test suite at it.

use anyhow::Result;
use aura_netsim::{
    BehaviorSettings, CallError, CannedOutcome, MockNetwork, NetworkBehavior, TokioExecutor,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::info;

#[derive(Parser)]
#[command(name = "aura-netsim")]
#[command(about = "Probe simulated network behavior with a batch of mock calls", long_about = None)]
struct Cli {
    /// Behavior file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base delay in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Delay variance in percent
    #[arg(long)]
    variance: Option<u32>,

    /// Injected failure rate in percent
    #[arg(long)]
    failure: Option<u32>,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Number of calls to issue
    #[arg(short = 'n', long, default_value = "10")]
    calls: usize,

    /// Cancel every outstanding call after this many milliseconds
    #[arg(long)]
    cancel_after_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Default)]
struct Summary {
    completed: usize,
    failed: usize,
    injected: usize,
    canceled: usize,
    total_elapsed: Duration,
}

impl Summary {
    fn record(&mut self, result: &Result<(), CallError>, elapsed: Duration) {
        match result {
            Ok(()) => self.completed += 1,
            Err(CallError::Canceled) => self.canceled += 1,
            Err(CallError::Injected(_)) => self.injected += 1,
            Err(CallError::Failed(_) | CallError::AlreadyExecuted) => self.failed += 1,
        }
        self.total_elapsed += elapsed;
    }

    fn total(&self) -> usize {
        self.completed + self.failed + self.injected + self.canceled
    }

    fn mean_elapsed(&self) -> Duration {
        match u32::try_from(self.total()) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(total) => self.total_elapsed / total,
        }
    }
}

fn load_settings(cli: &Cli) -> Result<BehaviorSettings> {
    let mut settings = match &cli.config {
        Some(path) => BehaviorSettings::load_from_file(path)?,
        None => BehaviorSettings::default(),
    };
    settings.merge_with_env()?;

    if let Some(delay_ms) = cli.delay_ms {
        settings.delay_ms = delay_ms;
    }
    if let Some(variance) = cli.variance {
        settings.variance_percent = variance;
    }
    if let Some(failure) = cli.failure {
        settings.failure_percent = failure;
    }
    if cli.seed.is_some() {
        settings.seed = cli.seed;
    }
    settings.validate()?;
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let settings = load_settings(&cli)?;
    let behavior = Arc::new(NetworkBehavior::from_settings(&settings)?);
    let executor = TokioExecutor::current()
        .ok_or_else(|| anyhow::anyhow!("no tokio runtime available"))?;
    let network = MockNetwork::new(behavior, Arc::new(executor));
    let probe = network.bind("probe", || CannedOutcome::response(()));

    info!(calls = cli.calls, ?settings, "issuing simulated calls");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut cancel_handles = Vec::with_capacity(cli.calls);
    for _ in 0..cli.calls {
        let call = probe.call();
        let tx = tx.clone();
        let started = Instant::now();
        cancel_handles.push(call.cancel_handle());
        call.enqueue(move |result| {
            let _ = tx.send((result, started.elapsed()));
        })?;
    }
    drop(tx);

    if let Some(cancel_after_ms) = cli.cancel_after_ms {
        tokio::time::sleep(Duration::from_millis(cancel_after_ms)).await;
        for handle in &cancel_handles {
            handle.cancel();
        }
        info!("cancel issued to outstanding calls");
    }

    let mut summary = Summary::default();
    while let Some((result, elapsed)) = rx.recv().await {
        summary.record(&result, elapsed);
    }

    println!("calls:     {}", summary.total());
    println!("completed: {}", summary.completed);
    println!("failed:    {}", summary.failed);
    println!("injected:  {}", summary.injected);
    println!("canceled:  {}", summary.canceled);
    println!("mean:      {:?}", summary.mean_elapsed());
    Ok(())
}
