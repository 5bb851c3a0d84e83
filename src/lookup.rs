//! Batch lookup orchestration
//!
//! Drives a [`CachedProvider`] across an ordered list of IP addresses and
//! assembles a [`BatchResult`]. Lookups run strictly in input order; the
//! aggregate counters are recomputed from the assembled sequence so the
//! `total == results.len()` and `successful == count(asn != 0)` invariants
//! hold by construction.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::config::Ip2asnConfig;
use crate::errors::LookupError;
use crate::output::OutputFormat;
use crate::provider::{create_provider, AsnProvider, CachedProvider, ProviderKind};

// =============================================================================
// Types
// =============================================================================

/// Result of one IP-to-ASN lookup.
#[derive(Debug, Clone, Serialize, Deserialize, Tabled)]
pub struct AsnResult {
    /// The queried IP address, as given
    pub ip: String,
    /// The Autonomous System Number, `0` when not found
    pub asn: u32,
    /// When the result was created
    pub timestamp: DateTime<Utc>,
    /// Provider that produced the result
    pub provider: String,
}

/// All results of one batch run, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    /// Per-IP results, ordered by input order
    pub results: Vec<AsnResult>,
    /// Number of lookups performed
    pub total: usize,
    /// Number of lookups that resolved to a non-zero ASN
    pub successful: usize,
    /// The snapshot date actually used
    pub snapshot_date: NaiveDate,
}

/// Configuration of one lookup run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Lookup provider to use
    pub provider: ProviderKind,
    /// Requested snapshot date
    pub snapshot_date: NaiveDate,
    /// Path to an input file with one IP per line
    pub input_file: Option<PathBuf>,
    /// Single IP address to look up
    pub single_ip: Option<String>,
    /// Output format
    pub output_format: OutputFormat,
    /// Output file path, stdout when absent
    pub output_file: Option<PathBuf>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            snapshot_date: Utc::now().date_naive(),
            input_file: None,
            single_ip: None,
            output_format: OutputFormat::default(),
            output_file: None,
        }
    }
}

impl LookupConfig {
    /// Validate the configuration before any network or engine activity.
    pub fn validate(&self) -> Result<(), LookupError> {
        match (&self.single_ip, &self.input_file) {
            (Some(_), Some(_)) => {
                return Err(LookupError::InvalidInput(
                    "specify either a single IP or an input file, not both".to_string(),
                ));
            }
            (None, None) => {
                return Err(LookupError::InvalidInput(
                    "specify a single IP or an input file".to_string(),
                ));
            }
            _ => {}
        }
        if self.snapshot_date > Utc::now().date_naive() {
            return Err(LookupError::InvalidInput(
                "snapshot date cannot be in the future".to_string(),
            ));
        }
        Ok(())
    }

    /// Collect the IPs to process, from the single IP or the input file.
    pub fn input_ips(&self) -> Result<Vec<String>, LookupError> {
        if let Some(ip) = &self.single_ip {
            return Ok(vec![ip.clone()]);
        }
        match &self.input_file {
            Some(path) => read_ips_from_file(path),
            None => Err(LookupError::InvalidInput(
                "specify a single IP or an input file".to_string(),
            )),
        }
    }
}

// =============================================================================
// Orchestration
// =============================================================================

/// Look up a list of IPs according to `config`.
///
/// Validates the configuration, builds and initializes the provider once,
/// and runs the batch through a fresh per-run cache.
pub fn lookup_ips(
    ips: &[String],
    config: &LookupConfig,
    settings: &Ip2asnConfig,
) -> Result<BatchResult, LookupError> {
    config.validate()?;
    let provider = create_provider(config.provider, config.snapshot_date, settings);
    let mut cached = CachedProvider::new(provider);
    run_batch(ips, &mut cached)
}

/// Drive a cached provider across `ips` in input order.
pub fn run_batch<P: AsnProvider>(
    ips: &[String],
    provider: &mut CachedProvider<P>,
) -> Result<BatchResult, LookupError> {
    provider.initialize()?;
    let name = provider.name();

    let mut results = Vec::with_capacity(ips.len());
    for ip in ips {
        let asn = provider.lookup(ip)?;
        results.push(AsnResult {
            ip: ip.clone(),
            asn,
            timestamp: Utc::now(),
            provider: name.to_string(),
        });
    }

    let total = results.len();
    let successful = results.iter().filter(|r| r.asn != 0).count();
    Ok(BatchResult {
        results,
        total,
        successful,
        snapshot_date: provider.snapshot_date(),
    })
}

/// Read IP addresses from a file, one per line, skipping blank lines.
pub fn read_ips_from_file(path: &Path) -> Result<Vec<String>, LookupError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        LookupError::InvalidInput(format!("cannot read input file {}: {}", path.display(), e))
    })?;
    let ips: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if ips.is_empty() {
        return Err(LookupError::InvalidInput(format!(
            "no IP addresses found in {}",
            path.display()
        )));
    }
    Ok(ips)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    struct MockProvider {
        answers: HashMap<&'static str, u32>,
        raw_calls: usize,
        init_calls: usize,
    }

    impl MockProvider {
        fn new(answers: &[(&'static str, u32)]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                raw_calls: 0,
                init_calls: 0,
            }
        }
    }

    impl AsnProvider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn snapshot_date(&self) -> NaiveDate {
            NaiveDate::from_ymd_opt(2023, 5, 15).unwrap()
        }

        fn initialize(&mut self) -> Result<(), LookupError> {
            self.init_calls += 1;
            Ok(())
        }

        fn lookup_raw(&mut self, ip: &str) -> Result<u32, LookupError> {
            self.raw_calls += 1;
            Ok(self.answers.get(ip).copied().unwrap_or(0))
        }
    }

    fn ips(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_batch_end_to_end() {
        let mut provider =
            CachedProvider::new(MockProvider::new(&[("8.8.8.8", 15169)]));
        let batch = run_batch(&ips(&["8.8.8.8", "8.8.8.8", "0.0.0.0"]), &mut provider).unwrap();

        assert_eq!(batch.total, 3);
        assert_eq!(batch.successful, 2);
        assert_eq!(batch.results.len(), 3);
        // duplicate IP is served from the cache
        assert_eq!(provider.inner().raw_calls, 2);
    }

    #[test]
    fn test_results_preserve_input_order() {
        let mut provider = CachedProvider::new(MockProvider::new(&[
            ("1.1.1.1", 13335),
            ("8.8.8.8", 15169),
        ]));
        let input = ips(&["8.8.8.8", "1.1.1.1", "8.8.8.8"]);
        let batch = run_batch(&input, &mut provider).unwrap();

        let order: Vec<&str> = batch.results.iter().map(|r| r.ip.as_str()).collect();
        assert_eq!(order, vec!["8.8.8.8", "1.1.1.1", "8.8.8.8"]);
        assert_eq!(batch.results[0].asn, 15169);
        assert_eq!(batch.results[1].asn, 13335);
    }

    #[test]
    fn test_aggregate_invariant() {
        let mut provider = CachedProvider::new(MockProvider::new(&[("8.8.8.8", 15169)]));
        let batch = run_batch(&ips(&["8.8.8.8", "10.0.0.1", "10.0.0.2"]), &mut provider).unwrap();

        assert_eq!(batch.total, batch.results.len());
        assert_eq!(
            batch.successful,
            batch.results.iter().filter(|r| r.asn != 0).count()
        );
        assert_eq!(batch.snapshot_date, NaiveDate::from_ymd_opt(2023, 5, 15).unwrap());
    }

    #[test]
    fn test_provider_initialized_once() {
        let mut provider = CachedProvider::new(MockProvider::new(&[]));
        run_batch(&ips(&["10.0.0.1"]), &mut provider).unwrap();
        assert_eq!(provider.inner().init_calls, 1);
    }

    #[test]
    fn test_validate_rejects_both_inputs() {
        let config = LookupConfig {
            single_ip: Some("8.8.8.8".to_string()),
            input_file: Some(PathBuf::from("ips.txt")),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LookupError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_rejects_neither_input() {
        let config = LookupConfig::default();
        assert!(matches!(
            config.validate(),
            Err(LookupError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_rejects_future_date() {
        let config = LookupConfig {
            single_ip: Some("8.8.8.8".to_string()),
            snapshot_date: Utc::now().date_naive() + chrono::Duration::days(30),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LookupError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_accepts_single_ip_today() {
        let config = LookupConfig {
            single_ip: Some("8.8.8.8".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_read_ips_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "8.8.8.8").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  1.1.1.1  ").unwrap();
        file.flush().unwrap();

        let ips = read_ips_from_file(file.path()).unwrap();
        assert_eq!(ips, vec!["8.8.8.8".to_string(), "1.1.1.1".to_string()]);
    }

    #[test]
    fn test_read_ips_from_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            read_ips_from_file(file.path()),
            Err(LookupError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_read_ips_from_missing_file() {
        assert!(matches!(
            read_ips_from_file(Path::new("/nonexistent/ips.txt")),
            Err(LookupError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_input_ips_prefers_single_ip() {
        let config = LookupConfig {
            single_ip: Some("8.8.8.8".to_string()),
            ..Default::default()
        };
        assert_eq!(config.input_ips().unwrap(), vec!["8.8.8.8".to_string()]);
    }
}
