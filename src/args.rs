use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about = "In-memory expiring key-value cache served over RESP")]
pub struct ServiceArguments {
    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long)]
    pub bind: Option<String>,

    /// TTL applied to SET commands without PX/EX, in milliseconds.
    #[arg(long)]
    pub default_ttl_ms: Option<u64>,

    /// Periodically purge expired entries. Off unless given.
    #[arg(long)]
    pub sweep_interval_ms: Option<u64>,

    #[arg(long, default_value = "info")]
    pub log_level: String,
}
