use std::cmp::Ordering;
use std::fmt;

use crate::model::DnsRecord;

pub const KNOWN_TYPES: [&str; 21] = [
    "A", "AAAA", "CNAME", "TXT", "MX", "NS", "CAA", "SRV", "LOC", "SPF", "CERT", "DNSKEY", "DS",
    "NAPTR", "SMIMEA", "SSHFP", "TLSA", "URI", "PTR", "HTTPS", "SVCB",
];

pub const WORKER: &str = "WORKER";

const WORKER_PLACEHOLDER_V4: [&str; 3] = ["192.0.2.1", "198.51.100.1", "203.0.113.1"];
const WORKER_PLACEHOLDER_V6: &str = "100::";

/// Type a record is displayed, sorted and filtered under.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EffectiveType {
    /// Placeholder address Cloudflare creates in front of a Worker.
    Worker,
    Record(String),
}

impl EffectiveType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Worker => WORKER,
            Self::Record(kind) => kind,
        }
    }
}

impl fmt::Display for EffectiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Ord for EffectiveType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for EffectiveType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub fn raw_type(record: &DnsRecord) -> String {
    if record.record_type.is_empty() {
        "UNKNOWN".to_string()
    } else {
        record.record_type.to_uppercase()
    }
}

pub fn classify(record: &DnsRecord) -> EffectiveType {
    if is_worker_placeholder(record) {
        EffectiveType::Worker
    } else {
        EffectiveType::Record(raw_type(record))
    }
}

/// Heuristic over fixed documentation-range addresses; the API carries no
/// flag for these records.
pub fn is_worker_placeholder(record: &DnsRecord) -> bool {
    if record.record_type.is_empty() || record.content.is_empty() {
        return false;
    }
    let content = record.content.trim();
    match record.record_type.to_uppercase().as_str() {
        "AAAA" => content == WORKER_PLACEHOLDER_V6,
        "A" => WORKER_PLACEHOLDER_V4.contains(&content),
        _ => false,
    }
}

pub fn is_known_type(kind: &str) -> bool {
    let upper = kind.to_uppercase();
    upper == WORKER || KNOWN_TYPES.contains(&upper.as_str())
}

pub fn can_be_proxied(kind: &str) -> bool {
    matches!(kind.to_uppercase().as_str(), "A" | "AAAA" | "CNAME")
}

pub fn requires_priority(kind: &str) -> bool {
    matches!(kind.to_uppercase().as_str(), "MX" | "SRV")
}
