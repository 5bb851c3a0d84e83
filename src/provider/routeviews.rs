//! RouteViews snapshot provider
//!
//! Adapts the in-memory [`Pfx2asTable`] engine to the [`AsnProvider`] trait:
//! locates the best snapshot for the requested date, loads it exactly once,
//! and answers per-IP lookups against it.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::archive::{locate_snapshot, CaidaArchive, SnapshotArchive};
use crate::config::Ip2asnConfig;
use crate::errors::LookupError;
use crate::provider::{AsnProvider, Pfx2asTable};

/// Provider backed by CAIDA RouteViews prefix2as snapshots.
pub struct RouteViewsProvider {
    requested_date: NaiveDate,
    archive: Box<dyn SnapshotArchive>,
    table: Option<Pfx2asTable>,
    snapshot_date: NaiveDate,
}

impl RouteViewsProvider {
    /// Create a provider over an arbitrary snapshot archive.
    pub fn new(snapshot_date: NaiveDate, archive: Box<dyn SnapshotArchive>) -> Self {
        Self {
            requested_date: snapshot_date,
            archive,
            table: None,
            snapshot_date,
        }
    }

    /// Create a provider talking to the archive configured in `settings`.
    pub fn with_settings(snapshot_date: NaiveDate, settings: &Ip2asnConfig) -> Self {
        let archive = CaidaArchive::new(&settings.archive_base_url, settings.http_timeout());
        Self::new(snapshot_date, Box::new(archive))
    }

    /// Whether the snapshot has been loaded.
    pub fn is_initialized(&self) -> bool {
        self.table.is_some()
    }
}

impl AsnProvider for RouteViewsProvider {
    fn name(&self) -> &'static str {
        "routeviews"
    }

    fn snapshot_date(&self) -> NaiveDate {
        self.snapshot_date
    }

    fn initialize(&mut self) -> Result<(), LookupError> {
        if self.table.is_some() {
            return Ok(());
        }

        let reference = locate_snapshot(self.archive.as_ref(), self.requested_date)?;
        info!("loading prefix-to-AS snapshot from {}", reference.url);

        let table = Pfx2asTable::load(&reference.url).map_err(|e| {
            LookupError::EngineUnavailable(format!(
                "failed to load snapshot {}: {}; check network access to the \
                 archive or point archive_base_url at a reachable mirror",
                reference.url, e
            ))
        })?;

        self.snapshot_date = reference.date;
        self.table = Some(table);
        Ok(())
    }

    fn lookup_raw(&mut self, ip: &str) -> Result<u32, LookupError> {
        if self.table.is_none() {
            self.initialize()?;
        }
        let Ok(addr) = ip.parse::<std::net::IpAddr>() else {
            debug!("unparsable IP address {:?}, treating as not found", ip);
            return Ok(0);
        };
        let asn = self
            .table
            .as_ref()
            .and_then(|table| table.lookup(addr))
            // multi-origin prefixes resolve to the last listed ASN
            .and_then(|asns| asns.last().copied())
            .unwrap_or(0);
        Ok(asn)
    }
}
