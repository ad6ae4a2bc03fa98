use anyhow::bail;
use clap::{Parser, Subcommand, ValueEnum};
use keyflake::{Identity, RollbackPolicy};

/// Runtime configuration for the `keyflake` binary.
///
/// Identity and rollback policy are read from CLI arguments or environment
/// variables (a `.env` file is loaded first). The defaults match the library
/// defaults, so a bare invocation behaves like an embedded allocator with
/// `DATACENTER_ID=0` and a host-derived worker id.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "keyflake",
    version,
    about = "Generate and decode Snowflake-style 64-bit IDs"
)]
pub struct CliArgs {
    /// Datacenter id stamped into every ID (0-31).
    ///
    /// Environment variable: `DATACENTER_ID`
    #[arg(long, env = "DATACENTER_ID", default_value_t = 0, allow_negative_numbers = true)]
    pub datacenter_id: i64,

    /// Worker id stamped into every ID (0-31).
    ///
    /// When unset, it is derived from the node name, or drawn at random if no
    /// node name is available.
    ///
    /// Environment variable: `WORKER_ID`
    #[arg(long, env = "WORKER_ID", allow_negative_numbers = true)]
    pub worker_id: Option<i64>,

    /// Stable node identifier used to derive the worker id.
    ///
    /// Defaults to `HOSTNAME` / `COMPUTERNAME`.
    ///
    /// Environment variable: `NODE_NAME`
    #[arg(long, env = "NODE_NAME")]
    pub node_name: Option<String>,

    /// Largest backward clock jump, in milliseconds, that is waited out
    /// instead of failing.
    ///
    /// Environment variable: `MAX_BACKWARD_MS`
    #[arg(long, env = "MAX_BACKWARD_MS", default_value_t = RollbackPolicy::DEFAULT_MAX_BACKWARD_MS)]
    pub max_backward_ms: u64,

    /// Multiplier applied to the observed drift to get the wait duration.
    ///
    /// Environment variable: `WAIT_FACTOR`
    #[arg(long, env = "WAIT_FACTOR", default_value_t = RollbackPolicy::DEFAULT_WAIT_FACTOR)]
    pub wait_factor: u64,

    /// Clock re-reads after waiting before reporting a rollback error.
    ///
    /// Environment variable: `MAX_RETRIES`
    #[arg(long, env = "MAX_RETRIES", default_value_t = RollbackPolicy::DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Clock source backing the allocator.
    ///
    /// Environment variable: `CLOCK`
    #[arg(long, env = "CLOCK", value_enum, default_value_t = ClockKind::System)]
    pub clock: ClockKind,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Generate IDs and print them one per line.
    Generate {
        /// Number of IDs to generate.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Threads sharing one allocator. IDs are printed in sorted order.
        #[arg(short, long, default_value_t = 1)]
        threads: usize,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = Format::Decimal)]
        format: Format,
    },
    /// Decode IDs into their timestamp, datacenter, worker and sequence.
    Inspect {
        /// Decimal IDs to decode.
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockKind {
    /// Operating system wall clock; can observe NTP rollbacks.
    System,
    /// Wall clock anchored once at startup, then advanced monotonically.
    Monotonic,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Plain decimal integer.
    Decimal,
    /// Zero-padded 19-digit decimal, sorts lexicographically.
    Padded,
    /// Decimal followed by the decoded fields.
    Verbose,
}

#[derive(Debug, Clone)]
pub struct AllocatorConfig {
    pub identity: Identity,
    pub policy: RollbackPolicy,
    pub clock: ClockKind,
}

impl TryFrom<&CliArgs> for AllocatorConfig {
    type Error = anyhow::Error;

    fn try_from(args: &CliArgs) -> Result<Self, Self::Error> {
        if args.max_backward_ms > 0 && args.wait_factor == 0 {
            bail!("WAIT_FACTOR must be greater than 0 when MAX_BACKWARD_MS is set");
        }

        let identity = match &args.node_name {
            Some(node) => Identity::resolve_with_node(
                args.datacenter_id,
                args.worker_id,
                Some(node.as_str()),
            )?,
            None => Identity::resolve(args.datacenter_id, args.worker_id)?,
        };

        let policy = RollbackPolicy::new()
            .with_max_backward_ms(args.max_backward_ms)
            .with_wait_factor(args.wait_factor)
            .with_max_retries(args.max_retries);

        Ok(Self {
            identity,
            policy,
            clock: args.clock,
        })
    }
}
