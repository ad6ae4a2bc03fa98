mod config;
mod telemetry;

use std::io::{self, BufWriter, Write};
use std::thread;

use anyhow::{Context, bail};
use clap::Parser;
use config::{AllocatorConfig, CliArgs, ClockKind, Command, Format};
use keyflake::{IdAllocator, MonotonicClock, SnowflakeId, SystemClock, TimeSource};
use telemetry::init_telemetry;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

type Clock = Box<dyn TimeSource + Send + Sync>;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    init_telemetry()?;

    match &args.command {
        Command::Generate {
            count,
            threads,
            format,
        } => {
            let config = AllocatorConfig::try_from(&args)?;
            tracing::debug!("Starting allocator with config: {:#?}", config);
            let allocator = build_allocator(&config);
            let ids = generate(&allocator, *count, *threads)?;
            print_ids(&ids, *format)
        }
        Command::Inspect { ids } => inspect(ids),
    }
}

fn build_allocator(config: &AllocatorConfig) -> IdAllocator<Clock> {
    let clock: Clock = match config.clock {
        ClockKind::System => Box::new(SystemClock),
        ClockKind::Monotonic => Box::new(MonotonicClock::new()),
    };
    IdAllocator::with_policy(config.identity, clock, config.policy)
}

/// Splits `count` across `threads` callers sharing one allocator and returns
/// the IDs in ascending order.
fn generate<T>(
    allocator: &IdAllocator<T>,
    count: usize,
    threads: usize,
) -> anyhow::Result<Vec<SnowflakeId>>
where
    T: TimeSource + Sync,
{
    if threads == 0 {
        bail!("--threads must be greater than 0");
    }

    let per_thread = count / threads;
    let remainder = count % threads;

    let batches = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let n = per_thread + usize::from(i < remainder);
                s.spawn(move || {
                    (0..n)
                        .map(|_| allocator.try_next_id())
                        .collect::<keyflake::Result<Vec<_>>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join())
            .collect::<Vec<_>>()
    });

    let mut ids = Vec::new();
    for batch in batches {
        let Ok(batch) = batch else {
            bail!("generator thread panicked");
        };
        match batch {
            Ok(batch) => ids.extend(batch),
            Err(e) => {
                if e.is_clock_error() {
                    tracing::error!("Clock anomaly, operator attention required: {e}");
                }
                return Err(e).context("ID generation failed");
            }
        }
    }
    ids.sort_unstable();
    Ok(ids)
}

fn print_ids(ids: &[SnowflakeId], format: Format) -> anyhow::Result<()> {
    let mut out = BufWriter::new(io::stdout().lock());
    for id in ids {
        match format {
            Format::Decimal => writeln!(out, "{id}")?,
            Format::Padded => writeln!(out, "{}", id.to_padded_string())?,
            Format::Verbose => writeln!(out, "{}", describe(id))?,
        }
    }
    out.flush()?;
    Ok(())
}

fn inspect(raw_ids: &[String]) -> anyhow::Result<()> {
    let mut out = BufWriter::new(io::stdout().lock());
    for raw in raw_ids {
        let id: SnowflakeId = raw
            .parse()
            .with_context(|| format!("failed to parse id {raw:?}"))?;
        if !id.is_valid() {
            bail!("id {raw} has the reserved sign bit set");
        }
        writeln!(out, "{}", describe(&id))?;
    }
    out.flush()?;
    Ok(())
}

fn describe(id: &SnowflakeId) -> String {
    format!(
        "{id} unix_ms={} datacenter={} worker={} sequence={}",
        id.unix_millis(),
        id.datacenter_id(),
        id.worker_id(),
        id.sequence()
    )
}
