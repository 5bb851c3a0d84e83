//! Result presentation
//!
//! Serializes a [`BatchResult`] into the supported output formats. The batch
//! orchestrator has no knowledge of formats; it hands a value here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tabled::settings::Style;
use tabled::Table;

use crate::lookup::BatchResult;

/// Output format for batch results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    /// Compact JSON (default)
    #[default]
    Json,
    /// Pretty-printed JSON with indentation
    JsonPretty,
    /// JSON Lines, one result object per line
    JsonLine,
    /// Comma-separated values with header
    Csv,
    /// Pretty table with borders
    Table,
}

impl OutputFormat {
    /// Get a list of all format names for help text
    pub fn all_names() -> &'static [&'static str] {
        &["json", "json-pretty", "json-line", "csv", "table"]
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::JsonPretty => write!(f, "json-pretty"),
            Self::JsonLine => write!(f, "json-line"),
            Self::Csv => write!(f, "csv"),
            Self::Table => write!(f, "table"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "json-pretty" | "jsonpretty" => Ok(Self::JsonPretty),
            "json-line" | "jsonline" | "jsonl" | "ndjson" => Ok(Self::JsonLine),
            "csv" => Ok(Self::Csv),
            "table" | "pretty" => Ok(Self::Table),
            _ => Err(format!(
                "Unknown output format '{}'. Valid formats: {}",
                s,
                Self::all_names().join(", ")
            )),
        }
    }
}

/// Render a batch result in the requested format.
pub fn serialize_batch(result: &BatchResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(result).unwrap_or_default(),
        OutputFormat::JsonPretty => serde_json::to_string_pretty(result).unwrap_or_default(),
        OutputFormat::JsonLine => result
            .results
            .iter()
            .map(|r| serde_json::to_string(r).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Csv => to_csv(result),
        OutputFormat::Table => Table::new(&result.results)
            .with(Style::rounded())
            .to_string(),
    }
}

// Fields contain no commas or quotes by construction (IPs, integers,
// RFC 3339 timestamps, provider identifiers), so no quoting is needed.
fn to_csv(result: &BatchResult) -> String {
    let mut out = String::from("ip,asn,timestamp,provider\n");
    for r in &result.results {
        out.push_str(&format!(
            "{},{},{},{}\n",
            r.ip,
            r.asn,
            r.timestamp.to_rfc3339(),
            r.provider
        ));
    }
    out
}
