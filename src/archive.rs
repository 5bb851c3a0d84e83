//! Snapshot locator for the CAIDA RouteViews prefix-to-AS archive
//!
//! The archive publishes dated snapshot files under `{base}/{year}/{month}/`,
//! one directory listing per month. Given a requested date, the locator finds
//! the best-matching snapshot:
//!
//! 1. Probe the requested month for an exact date match and return it
//!    immediately if present.
//! 2. Otherwise walk backwards month by month, up to [`LOOKBACK_MONTHS`]
//!    months inclusive of the requested one, and keep the candidate dated
//!    closest to (and not after) the requested date.
//!
//! A month whose listing cannot be fetched counts as empty; only exhausting
//! the whole window is fatal.

use std::time::Duration;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::LookupError;

/// Default base URL of CAIDA's RouteViews prefix2as dataset.
pub const CAIDA_PFX2AS_BASE: &str = "http://data.caida.org/datasets/routing/routeviews-prefix2as";

/// How many calendar months the backward search visits, requested month included.
pub const LOOKBACK_MONTHS: u32 = 6;

// =============================================================================
// Types
// =============================================================================

/// One dated snapshot file discovered in a month listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Full URL (or local path) of the snapshot file
    pub url: String,
    /// Date embedded in the file name
    pub date: NaiveDate,
}

/// The snapshot chosen for a run. Immutable once constructed; consumed by the
/// provider exactly once, on initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotReference {
    /// Where to load the snapshot from
    pub url: String,
    /// The actual date the snapshot corresponds to (may differ from the
    /// requested date)
    pub date: NaiveDate,
}

// =============================================================================
// Archive listing
// =============================================================================

/// A directory-like archive of dated snapshot files, listable by month.
///
/// This is the seam between the locator algorithm and HTTP; tests provide
/// in-memory implementations.
pub trait SnapshotArchive {
    /// List all snapshot entries published in the given year/month.
    fn list_month(&self, year: i32, month: u32) -> Result<Vec<SnapshotEntry>>;
}

/// HTTP-backed archive for CAIDA's RouteViews prefix2as dataset.
pub struct CaidaArchive {
    agent: ureq::Agent,
    base_url: String,
}

impl CaidaArchive {
    /// Create an archive client with the given base URL and per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for CaidaArchive {
    fn default() -> Self {
        Self::new(CAIDA_PFX2AS_BASE, Duration::from_secs(15))
    }
}

impl SnapshotArchive for CaidaArchive {
    fn list_month(&self, year: i32, month: u32) -> Result<Vec<SnapshotEntry>> {
        let url = format!("{}/{}/{:02}/", self.base_url, year, month);
        let body = self.agent.get(&url).call()?.body_mut().read_to_string()?;
        parse_listing(&url, &body)
    }
}

/// Extract dated snapshot entries from an HTML directory listing.
///
/// Any linked name containing an 8-digit `YYYYMMDD` substring becomes an
/// entry; names with malformed dates are discarded silently.
pub fn parse_listing(listing_url: &str, html: &str) -> Result<Vec<SnapshotEntry>> {
    let re = Regex::new(r#"href="([^"]*?(\d{8})[^"]*)""#)?;
    let mut entries = Vec::new();
    for caps in re.captures_iter(html) {
        let name = &caps[1];
        let Ok(date) = NaiveDate::parse_from_str(&caps[2], "%Y%m%d") else {
            continue;
        };
        let url = if name.contains("://") {
            name.to_string()
        } else {
            format!("{}{}", listing_url, name)
        };
        entries.push(SnapshotEntry { url, date });
    }
    Ok(entries)
}

// =============================================================================
// Snapshot resolution
// =============================================================================

/// Find the snapshot best matching `requested`.
///
/// Returns the exact-date snapshot when one exists. Otherwise searches
/// backwards across up to [`LOOKBACK_MONTHS`] months for the closest snapshot
/// dated on or before `requested`, warning about the day difference. Fails
/// with [`LookupError::SnapshotNotFound`] when the window is exhausted.
pub fn locate_snapshot(
    archive: &dyn SnapshotArchive,
    requested: NaiveDate,
) -> Result<SnapshotReference, LookupError> {
    // Exact-date probe in the requested month. A failed fetch here is not
    // fatal; the backward search below revisits this month.
    if let Ok(entries) = archive.list_month(requested.year(), requested.month()) {
        if let Some(entry) = entries.iter().find(|e| e.date == requested) {
            debug!("found exact snapshot for {}: {}", requested, entry.url);
            return Ok(SnapshotReference {
                url: entry.url.clone(),
                date: entry.date,
            });
        }
    }

    info!(
        "no snapshot published on {}, searching backwards for the closest available",
        requested
    );

    let mut best: Option<(SnapshotEntry, i64)> = None;
    let mut cursor = requested;
    for _ in 0..LOOKBACK_MONTHS {
        let entries = match archive.list_month(cursor.year(), cursor.month()) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(
                    "listing failed for {}-{:02}, treating as empty: {}",
                    cursor.year(),
                    cursor.month(),
                    e
                );
                Vec::new()
            }
        };

        for entry in entries {
            // Never select a snapshot newer than the requested date
            if entry.date > requested {
                continue;
            }
            let diff = requested.signed_duration_since(entry.date).num_days();
            // Strict comparison keeps the first-seen candidate on ties
            if best.as_ref().is_none_or(|(_, d)| diff < *d) {
                best = Some((entry, diff));
            }
        }

        cursor = previous_month(cursor);
    }

    match best {
        Some((entry, diff)) => {
            warn!(
                "using closest available snapshot from {} ({} days before {})",
                entry.date, diff, requested
            );
            Ok(SnapshotReference {
                url: entry.url,
                date: entry.date,
            })
        }
        None => Err(LookupError::SnapshotNotFound {
            date: requested,
            months: LOOKBACK_MONTHS,
        }),
    }
}

/// Step back one calendar month, landing on the first day of that month so
/// day-of-month overflow can never occur across boundaries like Jan 31.
fn previous_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = match date.month() {
        1 => (date.year() - 1, 12),
        m => (date.year(), m - 1),
    };
    // day 1 of a valid month always exists
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

// =============================================================================
// Tests
// =============================================================================
