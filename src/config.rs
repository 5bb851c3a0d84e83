use anyhow::{anyhow, Result};
use config::Config;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::archive::CAIDA_PFX2AS_BASE;

/// Application settings, loaded from a TOML file and environment overrides.
#[derive(Debug, Clone)]
pub struct Ip2asnConfig {
    /// Base URL of the snapshot archive
    pub archive_base_url: String,

    /// Per-request HTTP timeout in seconds (default: 15)
    pub http_timeout_secs: u64,
}

const EMPTY_CONFIG: &str = r#"### ip2asn configuration file

### base URL of the RouteViews prefix2as archive
# archive_base_url = "http://data.caida.org/datasets/routing/routeviews-prefix2as"

### per-request HTTP timeout in seconds
# http_timeout_secs = 15
"#;

impl Default for Ip2asnConfig {
    fn default() -> Self {
        Self {
            archive_base_url: CAIDA_PFX2AS_BASE.to_string(),
            http_timeout_secs: 15,
        }
    }
}

impl Ip2asnConfig {
    /// Load configuration, creating a commented template file when absent.
    ///
    /// By default `$HOME/.ip2asn.toml` is used; a commented template is
    /// written there on first run. Environment variables prefixed with
    /// `IP2ASN_` override file settings, e.g. `IP2ASN_HTTP_TIMEOUT_SECS=30`.
    pub fn new(path: &Option<String>) -> Result<Ip2asnConfig> {
        let mut builder = Config::builder();

        let file_path = match path {
            Some(p) => p.clone(),
            None => {
                let home_dir = dirs::home_dir()
                    .ok_or_else(|| anyhow!("Could not find home directory"))?
                    .to_str()
                    .ok_or_else(|| anyhow!("Could not convert home directory path to string"))?
                    .to_owned();
                format!("{}/.ip2asn.toml", home_dir)
            }
        };

        if Path::new(file_path.as_str()).exists() {
            builder = builder.add_source(config::File::with_name(file_path.as_str()));
        } else {
            std::fs::write(file_path.as_str(), EMPTY_CONFIG).map_err(|e| {
                anyhow!("Unable to create config file {}: {}", file_path.as_str(), e)
            })?;
        }

        // Add in settings from the environment (with a prefix of IP2ASN)
        builder = builder.add_source(config::Environment::with_prefix("IP2ASN"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        let archive_base_url = config
            .get("archive_base_url")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| CAIDA_PFX2AS_BASE.to_string());

        let http_timeout_secs = config
            .get("http_timeout_secs")
            .and_then(|s| s.parse().ok())
            .unwrap_or(15);

        Ok(Ip2asnConfig {
            archive_base_url,
            http_timeout_secs,
        })
    }

    /// Get the HTTP timeout as a Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Ip2asnConfig::default();
        assert_eq!(settings.archive_base_url, CAIDA_PFX2AS_BASE);
        assert_eq!(settings.http_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_new_creates_template_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ip2asn.toml");
        let path_str = path.to_str().unwrap().to_string();

        let settings = Ip2asnConfig::new(&Some(path_str)).unwrap();
        assert!(path.exists());
        assert_eq!(settings.archive_base_url, CAIDA_PFX2AS_BASE);
    }

    #[test]
    fn test_new_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ip2asn.toml");
        std::fs::write(
            &path,
            "archive_base_url = \"http://mirror.test/pfx2as/\"\nhttp_timeout_secs = \"30\"\n",
        )
        .unwrap();

        let settings = Ip2asnConfig::new(&Some(path.to_str().unwrap().to_string())).unwrap();
        assert_eq!(settings.archive_base_url, "http://mirror.test/pfx2as");
        assert_eq!(settings.http_timeout_secs, 30);
    }
}
