use std::path::PathBuf;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use ip2asn::{
    lookup_ips, serialize_batch, Ip2asnConfig, LookupConfig, OutputFormat, ProviderKind,
};
use tracing::{info, Level};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Single IP address to look up
    #[clap(long)]
    ip: Option<String>,

    /// Path to a file with IP addresses, one per line
    #[clap(long)]
    file: Option<PathBuf>,

    /// Output format
    #[clap(long, default_value = "json")]
    format: OutputFormat,

    /// Path to write the output to (default: stdout)
    #[clap(long)]
    output: Option<PathBuf>,

    /// Lookup provider
    #[clap(long, default_value = "routeviews")]
    provider: ProviderKind,

    /// Snapshot date in YYYY-MM-DD format (default: today)
    #[clap(long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// configuration file path, by default $HOME/.ip2asn.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format: {}. Use YYYY-MM-DD", s))
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Ip2asnConfig::new(&cli.config)?;

    let config = LookupConfig {
        provider: cli.provider,
        snapshot_date: cli.date.unwrap_or_else(|| Utc::now().date_naive()),
        input_file: cli.file,
        single_ip: cli.ip,
        output_format: cli.format,
        output_file: cli.output,
    };
    config.validate()?;

    let ips = config.input_ips()?;
    info!(
        "looking up {} IP address(es) using the {} provider",
        ips.len(),
        config.provider
    );

    let batch = lookup_ips(&ips, &config, &settings)?;
    let rendered = serialize_batch(&batch, config.output_format);

    match &config.output_file {
        Some(path) => std::fs::write(path, &rendered)?,
        None => println!("{rendered}"),
    }

    info!(
        "processed {} IPs with snapshot {}: {} found, {} not found",
        batch.total,
        batch.snapshot_date,
        batch.successful,
        batch.total - batch.successful
    );
    Ok(())
}
