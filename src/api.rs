use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::{debug, warn};

use crate::error::{DnsError, Result};
use crate::mock::MockBackend;
use crate::model::{DnsRecord, RecordWrite, WorkerRoute, Zone};
use crate::pagination::{Page, RECORDS_PER_PAGE, collect_pages};

pub const CF_API_BASE: &str = "https://api.cloudflare.com/client/v4";
const ZONES_PER_PAGE: u32 = 50;

pub trait DnsBackend {
    fn list_zones(&mut self, token: &str) -> Result<Vec<Zone>>;
    fn list_records(&mut self, token: &str, zone: &Zone) -> Result<Vec<DnsRecord>>;
    fn list_worker_routes(&mut self, token: &str, zone: &Zone) -> Result<Vec<WorkerRoute>>;
    fn create_record(&mut self, token: &str, zone: &Zone, record: &RecordWrite) -> Result<()>;
    fn update_record(
        &mut self,
        token: &str,
        zone: &Zone,
        record_id: &str,
        record: &RecordWrite,
    ) -> Result<()>;
    fn delete_record(&mut self, token: &str, zone: &Zone, record_id: &str) -> Result<()>;
}

pub enum Backend {
    Cloudflare(CloudflareBackend),
    Mock(MockBackend),
}

impl DnsBackend for Backend {
    fn list_zones(&mut self, token: &str) -> Result<Vec<Zone>> {
        match self {
            Backend::Cloudflare(client) => client.list_zones(token),
            Backend::Mock(mock) => mock.list_zones(token),
        }
    }

    fn list_records(&mut self, token: &str, zone: &Zone) -> Result<Vec<DnsRecord>> {
        match self {
            Backend::Cloudflare(client) => client.list_records(token, zone),
            Backend::Mock(mock) => mock.list_records(token, zone),
        }
    }

    fn list_worker_routes(&mut self, token: &str, zone: &Zone) -> Result<Vec<WorkerRoute>> {
        match self {
            Backend::Cloudflare(client) => client.list_worker_routes(token, zone),
            Backend::Mock(mock) => mock.list_worker_routes(token, zone),
        }
    }

    fn create_record(&mut self, token: &str, zone: &Zone, record: &RecordWrite) -> Result<()> {
        match self {
            Backend::Cloudflare(client) => client.create_record(token, zone, record),
            Backend::Mock(mock) => mock.create_record(token, zone, record),
        }
    }

    fn update_record(
        &mut self,
        token: &str,
        zone: &Zone,
        record_id: &str,
        record: &RecordWrite,
    ) -> Result<()> {
        match self {
            Backend::Cloudflare(client) => client.update_record(token, zone, record_id, record),
            Backend::Mock(mock) => mock.update_record(token, zone, record_id, record),
        }
    }

    fn delete_record(&mut self, token: &str, zone: &Zone, record_id: &str) -> Result<()> {
        match self {
            Backend::Cloudflare(client) => client.delete_record(token, zone, record_id),
            Backend::Mock(mock) => mock.delete_record(token, zone, record_id),
        }
    }
}

pub struct CloudflareBackend {
    client: Client,
    base_url: String,
}

impl CloudflareBackend {
    pub fn new_with_base(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("flaredns/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| DnsError::network("HTTP client", e))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn records_url(&self, zone: &Zone) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, zone.id)
    }

    /// Sends the request and unwraps the Cloudflare envelope. A non-2xx
    /// status is a network error, `success: false` an API error, and
    /// 401/403 always an authentication error.
    fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        token: &str,
        context: &str,
    ) -> Result<CfResponse<T>> {
        let response = request
            .bearer_auth(token)
            .send()
            .map_err(|e| DnsError::network(context, e))?;

        let status = response.status();
        let text = response.text().unwrap_or_default();
        debug!(context, %status, bytes = text.len(), "response");
        let parsed = serde_json::from_str::<CfResponse<T>>(&text);

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            let message = parsed
                .as_ref()
                .ok()
                .and_then(CfResponse::first_error)
                .unwrap_or_else(|| format!("HTTP {status}"));
            warn!(context, %status, "credentials rejected");
            return Err(DnsError::Auth {
                context: context.to_string(),
                message,
            });
        }

        if !status.is_success() {
            let message = parsed
                .as_ref()
                .ok()
                .and_then(CfResponse::first_error)
                .unwrap_or_else(|| truncate_body(&text));
            return Err(DnsError::network(context, format!("HTTP {status}: {message}")));
        }

        let parsed = parsed.map_err(|e| {
            warn!(context, body = %truncate_body(&text), "undecodable response");
            DnsError::network(context, format!("malformed response: {e}"))
        })?;

        if !parsed.success {
            return Err(DnsError::Api {
                context: context.to_string(),
                message: parsed
                    .first_error()
                    .unwrap_or_else(|| "Unknown Cloudflare API error".to_string()),
            });
        }

        Ok(parsed)
    }

    fn records_page(&self, token: &str, zone: &Zone, page: u32) -> Result<Page<DnsRecord>> {
        debug!(zone = %zone.name, page, "listing records");
        let request = self
            .client
            .get(self.records_url(zone))
            .query(&[("page", page), ("per_page", RECORDS_PER_PAGE)]);
        let parsed: CfResponse<Vec<DnsRecord>> = self.execute(request, token, "Records")?;
        let info = parsed.result_info.unwrap_or_default();
        Ok(Page {
            items: parsed.result.unwrap_or_default(),
            page: info.page.unwrap_or(page),
            total_pages: info.total_pages,
        })
    }
}

impl DnsBackend for CloudflareBackend {
    fn list_zones(&mut self, token: &str) -> Result<Vec<Zone>> {
        let url = format!("{}/zones", self.base_url);
        debug!(%url, "listing zones");
        let request = self.client.get(url).query(&[("per_page", ZONES_PER_PAGE)]);
        let parsed: CfResponse<Vec<Zone>> = self.execute(request, token, "Zones")?;
        Ok(parsed.result.unwrap_or_default())
    }

    fn list_records(&mut self, token: &str, zone: &Zone) -> Result<Vec<DnsRecord>> {
        collect_pages(|page| self.records_page(token, zone, page))
    }

    fn list_worker_routes(&mut self, token: &str, zone: &Zone) -> Result<Vec<WorkerRoute>> {
        let url = format!("{}/zones/{}/workers/routes", self.base_url, zone.id);
        let parsed: CfResponse<Vec<WorkerRoute>> =
            self.execute(self.client.get(url), token, "Worker routes")?;
        Ok(parsed.result.unwrap_or_default())
    }

    fn create_record(&mut self, token: &str, zone: &Zone, record: &RecordWrite) -> Result<()> {
        let request = self.client.post(self.records_url(zone)).json(record);
        self.execute::<IgnoredAny>(request, token, "Create")?;
        Ok(())
    }

    fn update_record(
        &mut self,
        token: &str,
        zone: &Zone,
        record_id: &str,
        record: &RecordWrite,
    ) -> Result<()> {
        let url = format!("{}/{}", self.records_url(zone), record_id);
        let request = self.client.put(url).json(record);
        self.execute::<IgnoredAny>(request, token, "Update")?;
        Ok(())
    }

    fn delete_record(&mut self, token: &str, zone: &Zone, record_id: &str) -> Result<()> {
        let url = format!("{}/{}", self.records_url(zone), record_id);
        self.execute::<IgnoredAny>(self.client.delete(url), token, "Delete")?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct CfResponse<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<CfError>,
    result: Option<T>,
    result_info: Option<CfResultInfo>,
}

impl<T> CfResponse<T> {
    fn first_error(&self) -> Option<String> {
        self.errors.first().map(|e| e.message.clone())
    }
}

#[derive(Deserialize)]
struct CfError {
    message: String,
}

#[derive(Deserialize, Default)]
struct CfResultInfo {
    page: Option<u32>,
    #[serde(default)]
    total_pages: u32,
}

fn truncate_body(text: &str) -> String {
    const LIMIT: usize = 200;
    if text.chars().count() > LIMIT {
        format!("{}...", text.chars().take(LIMIT).collect::<String>())
    } else {
        text.to_string()
    }
}
