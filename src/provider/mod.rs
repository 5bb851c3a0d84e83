//! Lookup providers
//!
//! A provider turns an IP address string into an ASN using a loaded snapshot.
//! The [`AsnProvider`] trait is the seam between the batch orchestrator and a
//! concrete lookup engine; [`CachedProvider`] decorates any provider with
//! per-IP memoization. Provider selection is a pure mapping from
//! [`ProviderKind`] to a constructor.

pub mod cache;
pub mod pfx2as;
pub mod routeviews;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::Ip2asnConfig;
use crate::errors::LookupError;

pub use cache::CachedProvider;
pub use pfx2as::Pfx2asTable;
pub use routeviews::RouteViewsProvider;

// =============================================================================
// Provider trait
// =============================================================================

/// An IP-to-ASN lookup capability backed by a dated snapshot.
pub trait AsnProvider {
    /// Short provider identifier used in results (e.g. "routeviews").
    fn name(&self) -> &'static str;

    /// The snapshot date in effect: the requested date before initialization,
    /// the actual snapshot date after.
    fn snapshot_date(&self) -> NaiveDate;

    /// Locate and load the snapshot. Idempotent: repeated calls after a
    /// success are no-ops.
    fn initialize(&mut self) -> Result<(), LookupError>;

    /// Resolve one IP address to an ASN, `0` meaning "not found". Initializes
    /// on demand when called before [`AsnProvider::initialize`].
    fn lookup_raw(&mut self, ip: &str) -> Result<u32, LookupError>;
}

impl AsnProvider for Box<dyn AsnProvider> {
    fn name(&self) -> &'static str {
        self.as_ref().name()
    }

    fn snapshot_date(&self) -> NaiveDate {
        self.as_ref().snapshot_date()
    }

    fn initialize(&mut self) -> Result<(), LookupError> {
        self.as_mut().initialize()
    }

    fn lookup_raw(&mut self, ip: &str) -> Result<u32, LookupError> {
        self.as_mut().lookup_raw(ip)
    }
}

// =============================================================================
// Provider selection
// =============================================================================

/// Available lookup providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ProviderKind {
    /// CAIDA RouteViews prefix2as snapshots (default)
    #[default]
    #[cfg_attr(feature = "cli", value(name = "routeviews"))]
    RouteViews,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::RouteViews => write!(f, "routeviews"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "routeviews" | "route-views" => Ok(ProviderKind::RouteViews),
            other => Err(LookupError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Construct a provider for the given kind and snapshot date.
pub fn create_provider(
    kind: ProviderKind,
    snapshot_date: NaiveDate,
    settings: &Ip2asnConfig,
) -> Box<dyn AsnProvider> {
    match kind {
        ProviderKind::RouteViews => {
            Box::new(RouteViewsProvider::with_settings(snapshot_date, settings))
        }
    }
}
