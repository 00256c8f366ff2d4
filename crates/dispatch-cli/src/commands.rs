//! Command handlers for CLI subcommands.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use dispatch_models::{ActionKind, ActionMessage, Priority};
use dispatch_queue::{ConcurrentPriorityQueue, PriorityQueue};
use dispatch_worker::{
    DispatchStats, Dispatcher, DispatcherConfig, HandlerError, MessageHandler,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::cli::{Commands, OutputFormat};
use crate::error::{CliError, Result};

/// How long `simulate` waits for the pool to drain.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(60);

/// Execute a CLI command.
pub fn execute(command: Commands, workers: Option<usize>) -> Result<()> {
    match command {
        Commands::Simulate {
            count,
            seed,
            tenant,
        } => {
            let mut config = DispatcherConfig::from_env()?;
            if let Some(n) = workers {
                config = config.with_worker_count(n);
            }
            let stats = cmd_simulate(config, count, seed, &tenant)?;
            write_summary(&mut io::stdout().lock(), &stats)?;
            Ok(())
        }
        Commands::Order { file, format } => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            if file == Path::new("-") {
                let stdin = io::stdin();
                cmd_order(stdin.lock(), &mut out, format)?;
            } else {
                let reader = BufReader::new(File::open(&file)?);
                cmd_order(reader, &mut out, format)?;
            }
            Ok(())
        }
    }
}

/// Handler used by `simulate`: logs each action and rejects generation
/// jobs that name no artifacts.
struct SimulationHandler;

impl MessageHandler for SimulationHandler {
    fn handle(&self, message: &ActionMessage) -> std::result::Result<(), HandlerError> {
        if message.kind != ActionKind::Notification && message.artifact_ids.is_empty() {
            return Err(HandlerError::Failed(format!(
                "{} needs at least one artifact",
                message.kind
            )));
        }

        info!(
            message_id = %message.id,
            tenant_id = %message.tenant_id,
            kind = %message.kind,
            priority = %message.priority,
            artifacts = message.artifact_ids.len(),
            "processed action"
        );
        Ok(())
    }
}

/// Deterministic mix of actions for a seed.
fn generate_actions(count: usize, seed: u64, tenant: &str) -> Vec<ActionMessage> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..count)
        .map(|i| {
            let kind = ActionKind::ALL[rng.gen_range(0..ActionKind::ALL.len())];
            let artifact_count = rng.gen_range(0..4);
            let base = i as i32 * 10;
            ActionMessage::new(tenant, kind)
                .with_artifacts((0..artifact_count).map(|a| base + a))
                .with_revision(i as i32 + 1)
        })
        .collect()
}

/// Submits generated actions, drains them with a worker pool and returns
/// the final counters.
pub fn cmd_simulate(
    config: DispatcherConfig,
    count: usize,
    seed: u64,
    tenant: &str,
) -> Result<DispatchStats> {
    let queue = Arc::new(ConcurrentPriorityQueue::new());
    let mut dispatcher = Dispatcher::new(config, queue, Arc::new(SimulationHandler))?;

    // Queue the whole batch first so priority order is visible in the logs.
    for action in generate_actions(count, seed, tenant) {
        dispatcher.submit(action);
    }
    debug!(queue = ?dispatcher.queue(), "batch queued");

    dispatcher.start()?;
    let drained = dispatcher.wait_idle(DRAIN_TIMEOUT);
    let remaining = dispatcher.shutdown()?;

    let stats = dispatcher.stats();
    if !drained {
        return Err(CliError::Timeout(stats.submitted - stats.processed()));
    }
    debug!(remaining, "simulation finished");

    Ok(stats)
}

/// Writes handled and failed counts per priority level.
fn write_summary(out: &mut impl Write, stats: &DispatchStats) -> io::Result<()> {
    writeln!(out, "Processed {} of {} actions", stats.processed(), stats.submitted)?;
    writeln!(out, "  {:<7} {:>8} {:>8}", "", "HANDLED", "FAILED")?;
    for priority in Priority::ALL {
        writeln!(
            out,
            "  {:<7} {:>8} {:>8}",
            priority.as_str(),
            stats.handled_at(priority),
            stats.failed_at(priority)
        )?;
    }
    writeln!(out, "  {:<7} {:>8} {:>8}", "total", stats.handled, stats.failed)
}

/// Reads JSON-line actions and writes them in dispatch order.
///
/// Blank lines are skipped. Returns the number of actions written.
pub fn cmd_order(reader: impl BufRead, out: &mut impl Write, format: OutputFormat) -> Result<usize> {
    let mut queue = PriorityQueue::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let action: ActionMessage = serde_json::from_str(&line).map_err(|source| CliError::Parse {
            line: index + 1,
            source,
        })?;
        queue.enqueue(action.priority, action);
    }

    let total = queue.count();

    if format == OutputFormat::Table && total > 0 {
        writeln!(out, "{:<8} {:<22} {:<16} ID", "PRIORITY", "KIND", "TENANT")?;
    }

    while let Ok(action) = queue.dequeue() {
        match format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, &action)?;
                writeln!(out)?;
            }
            OutputFormat::Table => {
                writeln!(
                    out,
                    "{:<8} {:<22} {:<16} {}",
                    action.priority.as_str(),
                    action.kind.as_str(),
                    action.tenant_id.as_str(),
                    action.id
                )?;
            }
        }
    }

    Ok(total)
}
