use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use rand::Rng;
use serde_json::{Value, json};
use tokio::time::{Duration, sleep};
use tracing::info;
use tracing_subscriber::EnvFilter;

use surge_core::app::SurgeClientBuilder;
use surge_core::impls::{FibonacciSleeper, FixedSleeper};
use surge_core::ports::RemoteCaller;
use surge_core::{ApiCategory, BatchRange, CallError, HookError, Operation, SurgeClient, SurgeOptions};

/// Drive the batch engine against simulated flaky backends.
#[derive(Parser, Debug)]
#[command(name = "surge", about = "Adaptive batch execution demo")]
struct Args {
    /// Number of operations to enqueue (spread over all categories).
    #[arg(long, default_value_t = 40)]
    items: usize,

    /// Probability that a simulated call fails.
    #[arg(long, default_value_t = 0.2)]
    failure_rate: f64,

    /// Share of failures reported as 404 (not retried).
    #[arg(long, default_value_t = 0.1)]
    not_found_rate: f64,

    #[arg(long, env = "SURGE_MAX_SPAWN")]
    max_spawn: Option<usize>,

    #[arg(long, env = "SURGE_INITIAL_SPAWN")]
    initial_spawn: Option<usize>,

    /// JSON file with `maxSpawn` / `initialSpawn`; flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Retry passes while failures remain.
    #[arg(long, default_value_t = 3)]
    retries: usize,

    /// Fixed backoff in ms instead of the Fibonacci backoff.
    #[arg(long)]
    backoff_ms: Option<u64>,

    /// Fibonacci step in ms.
    #[arg(long, default_value_t = 100)]
    backoff_unit_ms: u64,

    /// Simulated call latency in ms.
    #[arg(long, default_value_t = 20)]
    latency_ms: u64,
}

/// A backend that answers after `latency` and fails at random.
struct FlakyBackend {
    category: ApiCategory,
    failure_rate: f64,
    not_found_rate: f64,
    latency: Duration,
}

#[async_trait]
impl RemoteCaller for FlakyBackend {
    async fn call(&self, query: &str, variables: &Value) -> Result<Value, CallError> {
        // ThreadRng は Send ではないので await の前に引き切る
        let (fails, not_found) = {
            let mut rng = rand::thread_rng();
            (
                rng.gen_bool(self.failure_rate),
                rng.gen_bool(self.not_found_rate),
            )
        };
        sleep(self.latency).await;

        match (fails, not_found) {
            (false, _) => Ok(json!({
                "category": self.category.as_str(),
                "query": query,
                "echo": variables,
            })),
            (true, true) => Err(CallError::new("resource not found").with_status(404, "Not Found")),
            (true, false) => Err(CallError::new("upstream timed out")
                .with_status(503, "Service Unavailable")
                .with_errors(json!([{ "message": "upstream timed out" }]))),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn load_options(args: &Args) -> anyhow::Result<SurgeOptions> {
    let mut options = match &args.config {
        Some(path) => SurgeOptions::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SurgeOptions::default(),
    };
    if let Some(max_spawn) = args.max_spawn {
        options.max_spawn = max_spawn;
    }
    if let Some(initial_spawn) = args.initial_spawn {
        options.initial_spawn = initial_spawn;
    }
    Ok(options)
}

fn build_client(args: &Args, options: SurgeOptions) -> anyhow::Result<SurgeClient> {
    anyhow::ensure!(
        (0.0..=1.0).contains(&args.failure_rate) && (0.0..=1.0).contains(&args.not_found_rate),
        "rates must be within 0.0..=1.0"
    );

    let mut builder: SurgeClientBuilder = SurgeClient::builder().options(options);
    for category in ApiCategory::ALL {
        let backend = FlakyBackend {
            category,
            failure_rate: args.failure_rate,
            not_found_rate: args.not_found_rate,
            latency: Duration::from_millis(args.latency_ms),
        };
        builder = builder.register(category, Arc::new(backend))?;
    }

    builder = match args.backoff_ms {
        Some(ms) => builder.sleeper(FixedSleeper::new(Duration::from_millis(ms))),
        None => builder.sleeper(FibonacciSleeper::with_unit(Duration::from_millis(
            args.backoff_unit_ms,
        ))),
    };

    let client = builder
        // 404 はリトライしても変わらない
        .on_failure(|range: BatchRange, error: CallError, op: Operation| async move {
            if error.code == Some(404) {
                info!(key = %op.key(), %range, "dropping operation, not found");
                return Ok::<bool, HookError>(false);
            }
            Ok(true)
        })
        .expect_categories(&ApiCategory::ALL)
        .build()?;
    Ok(client)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let options = load_options(&args)?;
    let mut client = build_client(&args, options)?;

    for i in 0..args.items {
        let category = ApiCategory::ALL[i % ApiCategory::ALL.len()];
        client.enqueue_for(category, "query Item($id: Int!)", json!({ "id": i }))?;
    }

    let mut results = client.execute().await?;
    print_summary(&client)?;

    let mut pass = 0;
    while client.has_failed() && pass < args.retries {
        pass += 1;
        info!(pass, failed = client.failure_count(), "retrying failures");
        results.merge(client.retry().await?);
        print_summary(&client)?;
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "enqueued": args.items,
            "succeeded": results.len(),
            "still_failed": client.failure_count(),
            "counts": client.counts(),
        }))?
    );
    Ok(())
}

fn print_summary(client: &SurgeClient) -> anyhow::Result<()> {
    if let Some(summary) = client.last_summary() {
        println!("{}", serde_json::to_string_pretty(summary)?);
    }
    Ok(())
}
