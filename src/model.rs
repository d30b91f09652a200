use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: String,
}

impl Zone {
    /// Zone name with its status appended when the zone is not active.
    pub fn label(&self) -> String {
        if self.status.is_empty() || self.status == "active" {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.status)
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub record_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default = "automatic_ttl", deserialize_with = "null_as_automatic_ttl")]
    pub ttl: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxiable: Option<bool>,
    /// Structured fields of SRV, CAA, LOC and friends, in API order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<String>,
}

fn automatic_ttl() -> u32 {
    1
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_automatic_ttl<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or_else(automatic_ttl))
}

impl DnsRecord {
    pub fn is_proxied(&self) -> bool {
        self.proxied.unwrap_or(false)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRoute {
    pub pattern: String,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl WorkerRoute {
    pub fn is_enabled(&self) -> bool {
        self.enabled != Some(false)
    }
}

/// Body sent on create and update.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecordWrite {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub ttl: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_tolerates_missing_optional_fields() {
        let record: DnsRecord = serde_json::from_value(json!({
            "id": "r1",
            "name": "example.com"
        }))
        .unwrap();
        assert_eq!(record.record_type, "");
        assert_eq!(record.content, "");
        assert_eq!(record.ttl, 1);
        assert!(record.data.is_none());
        assert!(!record.is_proxied());
    }

    #[test]
    fn record_tolerates_null_fields() {
        let record: DnsRecord = serde_json::from_value(json!({
            "id": "r2",
            "type": null,
            "name": null,
            "content": null,
            "ttl": null
        }))
        .unwrap();
        assert_eq!(record.record_type, "");
        assert_eq!(record.name, "");
        assert_eq!(record.content, "");
        assert_eq!(record.ttl, 1);
    }

    #[test]
    fn record_data_keeps_api_order() {
        let record: DnsRecord = serde_json::from_value(json!({
            "id": "r1",
            "type": "SSHFP",
            "name": "host.example.com",
            "content": "",
            "ttl": 300,
            "data": {"fingerprint": "abc", "algorithm": 4, "type": 2}
        }))
        .unwrap();
        let keys: Vec<_> = record.data.unwrap().keys().cloned().collect();
        assert_eq!(keys, ["fingerprint", "algorithm", "type"]);
    }

    #[test]
    fn zone_label_marks_inactive_zones() {
        let mut zone = Zone {
            id: "z".into(),
            name: "example.com".into(),
            status: "active".into(),
        };
        assert_eq!(zone.label(), "example.com");
        zone.status = "pending".into();
        assert_eq!(zone.label(), "example.com (pending)");
    }

    #[test]
    fn route_without_enabled_flag_counts_as_enabled() {
        let route: WorkerRoute = serde_json::from_value(json!({"pattern": "example.com/*"})).unwrap();
        assert!(route.is_enabled());
        assert!(route.script.is_none());
    }

    #[test]
    fn write_body_omits_absent_fields() {
        let body = RecordWrite {
            record_type: "A".into(),
            name: "example.com".into(),
            content: "192.0.2.10".into(),
            ttl: 1,
            priority: None,
            proxied: None,
            data: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({"type": "A", "name": "example.com", "content": "192.0.2.10", "ttl": 1})
        );
    }
}
