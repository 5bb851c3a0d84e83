//! In-memory prefix-to-AS lookup table
//!
//! Parses RouteViews pfx2as snapshot files into per-prefix-length maps and
//! answers longest-prefix-match queries for both IPv4 and IPv6 addresses.
//!
//! Snapshot lines have the form `prefix<TAB>length<TAB>origins`, where
//! `origins` is one ASN, several joined by `_` (multi-origin prefixes), or a
//! comma-separated AS set. Malformed lines are skipped silently.

use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;

use anyhow::{bail, Result};
use ipnet::{Ipv4Net, Ipv6Net};
use tracing::info;

/// Longest-prefix-match table mapping prefixes to their origin ASN lists.
#[derive(Debug, Default)]
pub struct Pfx2asTable {
    // keyed by prefix length so lookups probe from most to least specific
    v4: BTreeMap<u8, HashMap<Ipv4Net, Vec<u32>>>,
    v6: BTreeMap<u8, HashMap<Ipv6Net, Vec<u32>>>,
}

impl Pfx2asTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a table from a pfx2as snapshot file.
    ///
    /// `path` is anything `oneio` can open: an http(s) URL or a local path,
    /// gzip-compressed or plain.
    pub fn load(path: &str) -> Result<Self> {
        let mut table = Self::new();
        for line in oneio::read_lines(path)?.map_while(Result::ok) {
            table.insert_line(&line);
        }
        if table.is_empty() {
            bail!("no prefix records parsed from {}", path);
        }
        info!(
            "loaded {} prefix-to-AS records from {}",
            table.prefix_count(),
            path
        );
        Ok(table)
    }

    /// Parse one snapshot line and insert it. Returns false for lines that do
    /// not parse as a prefix record.
    pub fn insert_line(&mut self, line: &str) -> bool {
        let mut fields = line.split_whitespace();
        let (Some(addr), Some(len), Some(origins)) =
            (fields.next(), fields.next(), fields.next())
        else {
            return false;
        };
        let (Ok(addr), Ok(len)) = (addr.parse::<IpAddr>(), len.parse::<u8>()) else {
            return false;
        };
        let asns: Vec<u32> = origins
            .split(['_', ','])
            .filter_map(|s| s.trim_matches(['{', '}']).parse::<u32>().ok())
            .collect();
        if asns.is_empty() {
            return false;
        }
        self.insert(addr, len, asns)
    }

    /// Insert a prefix with its origin ASN list.
    pub fn insert(&mut self, addr: IpAddr, len: u8, asns: Vec<u32>) -> bool {
        match addr {
            IpAddr::V4(a) => {
                let Ok(net) = Ipv4Net::new(a, len) else {
                    return false;
                };
                self.v4.entry(len).or_default().insert(net.trunc(), asns);
            }
            IpAddr::V6(a) => {
                let Ok(net) = Ipv6Net::new(a, len) else {
                    return false;
                };
                self.v6.entry(len).or_default().insert(net.trunc(), asns);
            }
        }
        true
    }

    /// Longest-prefix-match lookup. Returns the origin ASN list of the most
    /// specific covering prefix, or `None` when no prefix covers the address.
    pub fn lookup(&self, ip: IpAddr) -> Option<&[u32]> {
        match ip {
            IpAddr::V4(a) => self.v4.iter().rev().find_map(|(len, nets)| {
                let net = Ipv4Net::new(a, *len).ok()?.trunc();
                nets.get(&net).map(|asns| asns.as_slice())
            }),
            IpAddr::V6(a) => self.v6.iter().rev().find_map(|(len, nets)| {
                let net = Ipv6Net::new(a, *len).ok()?.trunc();
                nets.get(&net).map(|asns| asns.as_slice())
            }),
        }
    }

    /// Whether the table holds no prefixes at all.
    pub fn is_empty(&self) -> bool {
        self.prefix_count() == 0
    }

    /// Number of prefixes stored.
    pub fn prefix_count(&self) -> usize {
        self.v4.values().map(HashMap::len).sum::<usize>()
            + self.v6.values().map(HashMap::len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut table = Pfx2asTable::new();
        assert!(table.insert_line("8.8.8.0\t24\t15169"));
        assert!(table.insert_line("1.0.0.0\t24\t13335"));

        assert_eq!(table.lookup(ip("8.8.8.8")), Some(&[15169][..]));
        assert_eq!(table.lookup(ip("1.0.0.1")), Some(&[13335][..]));
        assert_eq!(table.lookup(ip("9.9.9.9")), None);
    }

    #[test]
    fn test_longest_prefix_wins() {
        let mut table = Pfx2asTable::new();
        table.insert_line("10.0.0.0\t8\t100");
        table.insert_line("10.1.0.0\t16\t200");
        table.insert_line("10.1.2.0\t24\t300");

        assert_eq!(table.lookup(ip("10.1.2.3")), Some(&[300][..]));
        assert_eq!(table.lookup(ip("10.1.9.9")), Some(&[200][..]));
        assert_eq!(table.lookup(ip("10.9.9.9")), Some(&[100][..]));
    }

    #[test]
    fn test_multi_origin_and_as_set_parsing() {
        let mut table = Pfx2asTable::new();
        table.insert_line("192.0.2.0\t24\t64496_64497");
        table.insert_line("198.51.100.0\t24\t64500,64501");

        assert_eq!(table.lookup(ip("192.0.2.1")), Some(&[64496, 64497][..]));
        assert_eq!(
            table.lookup(ip("198.51.100.1")),
            Some(&[64500, 64501][..])
        );
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let mut table = Pfx2asTable::new();
        assert!(!table.insert_line(""));
        assert!(!table.insert_line("not-an-ip\t24\t15169"));
        assert!(!table.insert_line("8.8.8.0\tyes\t15169"));
        assert!(!table.insert_line("8.8.8.0\t24"));
        assert!(!table.insert_line("8.8.8.0\t24\tAS15169"));
        assert!(!table.insert_line("8.8.8.0\t64\t15169"));
        assert!(table.is_empty());
    }

    #[test]
    fn test_ipv6_lookup() {
        let mut table = Pfx2asTable::new();
        table.insert_line("2001:db8::\t32\t64496");

        assert_eq!(table.lookup(ip("2001:db8::1")), Some(&[64496][..]));
        assert_eq!(table.lookup(ip("2001:db9::1")), None);
    }

    #[test]
    fn test_load_from_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "8.8.8.0\t24\t15169").unwrap();
        writeln!(file, "1.1.1.0\t24\t13335").unwrap();
        writeln!(file, "garbage line").unwrap();
        file.flush().unwrap();

        let table = Pfx2asTable::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(table.prefix_count(), 2);
        assert_eq!(table.lookup(ip("8.8.8.8")), Some(&[15169][..]));
    }

    #[test]
    fn test_load_empty_file_fails() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(Pfx2asTable::load(file.path().to_str().unwrap()).is_err());
    }
}
