#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! ip2asn - historical IP-to-ASN mapping
//!
//! Maps IP addresses to Autonomous System Numbers using dated CAIDA
//! RouteViews prefix-to-AS snapshots. Given a target date, ip2asn finds the
//! best-matching published snapshot (searching backwards across month
//! boundaries within a six-month window when the exact date is absent),
//! loads it into an in-memory longest-prefix-match table, and resolves each
//! input IP, memoizing results so every distinct IP hits the table at most
//! once per run.
//!
//! # Architecture
//!
//! - **[`archive`]**: snapshot locator — month listings of the remote
//!   archive and the backward date-resolution algorithm
//! - **[`provider`]**: the [`AsnProvider`] trait, the RouteViews provider
//!   with its prefix table engine, and the per-run lookup cache
//! - **[`lookup`]**: batch orchestration and run configuration
//! - **[`output`]**: result serialization (JSON, CSV, table)
//! - **[`config`]**: application settings (archive URL, HTTP timeout)
//!
//! # Quick start
//!
//! ```rust,ignore
//! use chrono::NaiveDate;
//! use ip2asn::{lookup_ips, Ip2asnConfig, LookupConfig};
//!
//! let config = LookupConfig {
//!     snapshot_date: NaiveDate::from_ymd_opt(2023, 5, 15).unwrap(),
//!     single_ip: Some("8.8.8.8".to_string()),
//!     ..Default::default()
//! };
//!
//! let ips = config.input_ips()?;
//! let batch = lookup_ips(&ips, &config, &Ip2asnConfig::default())?;
//! println!("{} of {} IPs resolved", batch.successful, batch.total);
//! ```

pub mod archive;
pub mod config;
pub mod errors;
pub mod lookup;
pub mod output;
pub mod provider;

pub use config::Ip2asnConfig;
pub use errors::LookupError;

pub use archive::{
    locate_snapshot, CaidaArchive, SnapshotArchive, SnapshotEntry, SnapshotReference,
    CAIDA_PFX2AS_BASE, LOOKBACK_MONTHS,
};

pub use provider::{
    create_provider, AsnProvider, CachedProvider, Pfx2asTable, ProviderKind, RouteViewsProvider,
};

pub use lookup::{
    lookup_ips, read_ips_from_file, run_batch, AsnResult, BatchResult, LookupConfig,
};

pub use output::{serialize_batch, OutputFormat};
