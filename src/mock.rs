use std::collections::HashMap;

use serde_json::json;

use crate::api::DnsBackend;
use crate::error::{DnsError, Result};
use crate::model::{DnsRecord, RecordWrite, WorkerRoute, Zone};

/// In-memory stand-in for the Cloudflare API, used offline and in tests.
#[derive(Default)]
pub struct MockBackend {
    pub zones: Vec<Zone>,
    pub records: HashMap<String, Vec<DnsRecord>>,
    pub routes: HashMap<String, Vec<WorkerRoute>>,
    /// Returned (once) by the next call instead of its normal result.
    pub fail_next: Option<DnsError>,
    /// Returned (once) by the next record listing only.
    pub fail_listing: Option<DnsError>,
    next_id: usize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            zones: vec![
                Zone {
                    id: "demo-01".to_string(),
                    name: "example.com".to_string(),
                    status: "active".to_string(),
                },
                Zone {
                    id: "demo-02".to_string(),
                    name: "staging.dev".to_string(),
                    status: "pending".to_string(),
                },
            ],
            ..Self::default()
        }
    }

    fn take_failure(&mut self) -> Result<()> {
        match self.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn ensure_zone(&mut self, zone: &Zone) {
        self.records
            .entry(zone.id.clone())
            .or_insert_with(|| sample_records(zone));
        self.routes.entry(zone.id.clone()).or_insert_with(|| {
            vec![WorkerRoute {
                pattern: format!("{}/api/*", zone.name),
                script: Some("api-gateway".to_string()),
                enabled: Some(true),
            }]
        });
    }
}

fn sample_records(zone: &Zone) -> Vec<DnsRecord> {
    let record = |suffix: &str, kind: &str, name: &str, content: &str, ttl: u32| DnsRecord {
        id: format!("{}-{suffix}", zone.id),
        record_type: kind.to_string(),
        name: if name == "@" {
            zone.name.clone()
        } else {
            format!("{name}.{}", zone.name)
        },
        content: content.to_string(),
        ttl,
        proxiable: Some(matches!(kind, "A" | "AAAA" | "CNAME")),
        modified_on: Some("2024-05-01T09:30:00Z".to_string()),
        ..DnsRecord::default()
    };

    let mut mx = record("mx", "MX", "@", &format!("mail.{}", zone.name), 3600);
    mx.priority = Some(10);

    let mut srv = record("srv", "SRV", "_sip._tcp", "", 86400);
    srv.priority = Some(10);
    srv.data = json!({"priority": 10, "weight": 5, "port": 5060, "target": format!("sip.{}", zone.name)})
        .as_object()
        .cloned();

    let mut caa = record("caa", "CAA", "@", "", 1);
    caa.data = json!({"flags": 0, "tag": "issue", "value": "letsencrypt.org"})
        .as_object()
        .cloned();

    let mut www = record("www", "A", "www", "203.0.113.10", 1);
    www.proxied = Some(true);

    vec![
        www,
        record("api", "A", "api", "192.0.2.1", 1),
        record("api6", "AAAA", "api", "100::", 1),
        record("cdn", "CNAME", "cdn", "edge.service.net", 120),
        mx,
        srv,
        caa,
        record(
            "spf",
            "TXT",
            "@",
            "v=spf1 include:_spf.example.net ~all",
            300,
        ),
    ]
}

fn apply_write(record: &mut DnsRecord, write: &RecordWrite) {
    record.record_type = write.record_type.clone();
    record.name = write.name.clone();
    record.content = write.content.clone();
    record.ttl = write.ttl;
    record.priority = write.priority;
    record.proxied = write.proxied;
    record.data = write.data.clone();
}

impl DnsBackend for MockBackend {
    fn list_zones(&mut self, _token: &str) -> Result<Vec<Zone>> {
        self.take_failure()?;
        Ok(self.zones.clone())
    }

    fn list_records(&mut self, _token: &str, zone: &Zone) -> Result<Vec<DnsRecord>> {
        self.take_failure()?;
        if let Some(err) = self.fail_listing.take() {
            return Err(err);
        }
        self.ensure_zone(zone);
        Ok(self.records.get(&zone.id).cloned().unwrap_or_default())
    }

    fn list_worker_routes(&mut self, _token: &str, zone: &Zone) -> Result<Vec<WorkerRoute>> {
        self.take_failure()?;
        self.ensure_zone(zone);
        Ok(self.routes.get(&zone.id).cloned().unwrap_or_default())
    }

    fn create_record(&mut self, _token: &str, zone: &Zone, write: &RecordWrite) -> Result<()> {
        self.take_failure()?;
        self.ensure_zone(zone);
        self.next_id += 1;
        let mut record = DnsRecord {
            id: format!("{}-new-{}", zone.id, self.next_id),
            proxiable: Some(matches!(write.record_type.as_str(), "A" | "AAAA" | "CNAME")),
            ..DnsRecord::default()
        };
        apply_write(&mut record, write);
        self.records.entry(zone.id.clone()).or_default().push(record);
        Ok(())
    }

    fn update_record(
        &mut self,
        _token: &str,
        zone: &Zone,
        record_id: &str,
        write: &RecordWrite,
    ) -> Result<()> {
        self.take_failure()?;
        self.ensure_zone(zone);
        let existing = self
            .records
            .get_mut(&zone.id)
            .and_then(|records| records.iter_mut().find(|r| r.id == record_id))
            .ok_or_else(|| DnsError::Api {
                context: "Update".to_string(),
                message: "Record does not exist.".to_string(),
            })?;
        apply_write(existing, write);
        Ok(())
    }

    fn delete_record(&mut self, _token: &str, zone: &Zone, record_id: &str) -> Result<()> {
        self.take_failure()?;
        if let Some(records) = self.records.get_mut(&zone.id) {
            records.retain(|r| r.id != record_id);
        }
        Ok(())
    }
}
