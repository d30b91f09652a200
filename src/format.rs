//! Human-readable rendering of records for the records table and dialogs.

use chrono::DateTime;
use serde_json::{Map, Value};

use crate::classify::EffectiveType;
use crate::model::DnsRecord;

const TXT_DISPLAY_LIMIT: usize = 100;

pub fn format_content(record: &DnsRecord, effective: &EffectiveType) -> String {
    let kind = match effective {
        EffectiveType::Worker => {
            return format!(
                "Managed by Cloudflare Workers (placeholder {} {})",
                record.record_type.to_uppercase(),
                record.content
            );
        }
        EffectiveType::Record(kind) => kind.as_str(),
    };

    if kind == "MX" {
        return format!("{} {}", record.priority.unwrap_or(0), record.content);
    }
    if kind == "TXT" {
        return quote_txt(&record.content);
    }

    let Some(data) = record.data.as_ref() else {
        return record.content.clone();
    };

    match kind {
        "SRV" => format!(
            "{} {} {} {}",
            field_or(data, "priority", "0"),
            field_or(data, "weight", "0"),
            field_or(data, "port", "0"),
            field_or(data, "target", &record.content),
        ),
        "CAA" => format!(
            "{} {} \"{}\"",
            field_or(data, "flags", "0"),
            field_or(data, "tag", ""),
            field_or(data, "value", ""),
        ),
        "CERT" | "DNSKEY" | "DS" | "NAPTR" | "SMIMEA" | "SSHFP" | "TLSA" => {
            let joined = format_record_data(data);
            if joined.is_empty() {
                record.content.clone()
            } else {
                joined
            }
        }
        "LOC" => format!(
            "{}° {}' {}\" {} {}° {}' {}\" {} {}m",
            field_or(data, "lat_degrees", "0"),
            field_or(data, "lat_minutes", "0"),
            field_or(data, "lat_seconds", "0"),
            field_or(data, "lat_direction", "N"),
            field_or(data, "long_degrees", "0"),
            field_or(data, "long_minutes", "0"),
            field_or(data, "long_seconds", "0"),
            field_or(data, "long_direction", "E"),
            field_or(data, "altitude", "0"),
        ),
        "URI" => format!(
            "{} {} \"{}\"",
            field_or(data, "priority", "0"),
            field_or(data, "weight", "0"),
            field_or(data, "target", &record.content),
        ),
        "HTTPS" | "SVCB" => format!(
            "{} {} {}",
            field_or(data, "priority", "0"),
            field_or(data, "target", "."),
            field_or(data, "value", ""),
        ),
        _ => record.content.clone(),
    }
}

fn quote_txt(content: &str) -> String {
    if content.chars().count() > TXT_DISPLAY_LIMIT {
        let head: String = content.chars().take(TXT_DISPLAY_LIMIT).collect();
        format!("\"{head}...\"")
    } else {
        format!("\"{content}\"")
    }
}

/// Non-null entries of a record's structured data as `key: value` pairs.
pub fn format_record_data(data: &Map<String, Value>) -> String {
    data.iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| format!("{key}: {}", scalar(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Field value, or `default` when the field is missing, null, false, zero or empty.
fn field_or(data: &Map<String, Value>, key: &str, default: &str) -> String {
    match data.get(key) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => default.to_string(),
        Some(Value::String(s)) if s.is_empty() => default.to_string(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => default.to_string(),
        Some(value) => scalar(value),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn format_ttl(ttl: u32) -> String {
    match ttl {
        1 => "automatic".to_string(),
        0..60 => plural(ttl, "second"),
        60..3600 => plural(ttl / 60, "minute"),
        3600..86400 => plural(ttl / 3600, "hour"),
        _ => plural(ttl / 86400, "day"),
    }
}

fn plural(count: u32, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

/// Record name relative to the zone apex.
pub fn format_name(name: &str, zone_name: &str) -> String {
    if name == zone_name {
        return "@".to_string();
    }
    let suffix = format!(".{zone_name}");
    match name.strip_suffix(&suffix) {
        Some(relative) if !zone_name.is_empty() => relative.to_string(),
        _ => name.to_string(),
    }
}

pub fn format_modified(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.naive_utc().format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}
