use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::api::DnsBackend;
use crate::classify::{
    EffectiveType, KNOWN_TYPES, WORKER, can_be_proxied, classify, is_known_type, raw_type,
    requires_priority,
};
use crate::config::State;
use crate::error::{DnsError, Result};
use crate::format::{format_content, format_modified, format_name, format_record_data, format_ttl};
use crate::model::{DnsRecord, RecordWrite, WorkerRoute, Zone};

const MESSAGE_TTL: Duration = Duration::from_secs(5);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Focus {
    Zones,
    Records,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Mode {
    Normal,
    TokenEntry(String),
    RecordForm(RecordForm),
    ConfirmDelete(ConfirmDelete),
    Searching(String),
}

/// Network work queued by a key press; the loop draws the loading banner
/// before running it.
#[derive(Clone, Debug, PartialEq)]
pub enum Task {
    Startup,
    SaveToken(String),
    LoadZones,
    SelectZone(usize),
    Reload,
    Create(RecordWrite),
    Update { id: String, write: RecordWrite },
    Delete(String),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug)]
pub struct StatusMessage {
    pub text: String,
    pub tone: Tone,
    shown_at: Instant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Type,
    Name,
    Content,
    Ttl,
    Priority,
    Proxied,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::Type => "Type",
            Field::Name => "Name",
            Field::Content => "Content",
            Field::Ttl => "TTL (1 = automatic)",
            Field::Priority => "Priority",
            Field::Proxied => "Proxied",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordDraft {
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub ttl: String,
    pub priority: String,
    pub proxied: bool,
}

impl Default for RecordDraft {
    fn default() -> Self {
        Self {
            record_type: "A".to_string(),
            name: String::new(),
            content: String::new(),
            ttl: "1".to_string(),
            priority: String::new(),
            proxied: false,
        }
    }
}

impl RecordDraft {
    pub fn from_record(record: &DnsRecord) -> Self {
        Self {
            record_type: raw_type(record),
            name: record.name.clone(),
            content: record.content.clone(),
            ttl: record.ttl.to_string(),
            priority: record.priority.map(|p| p.to_string()).unwrap_or_default(),
            proxied: record.is_proxied(),
        }
    }

    pub fn cycle_type(&mut self, step: isize) {
        let len = KNOWN_TYPES.len() as isize;
        let current = KNOWN_TYPES
            .iter()
            .position(|kind| *kind == self.record_type)
            .map_or(0, |i| i as isize);
        let next = (current + step).rem_euclid(len) as usize;
        self.record_type = KNOWN_TYPES[next].to_string();
    }

    /// Validates the draft and builds the request body. An empty name or
    /// `@` means the zone apex; an empty or unparsable TTL means automatic.
    pub fn to_write(
        &self,
        zone_name: &str,
        data: Option<Map<String, Value>>,
        allow_proxy: bool,
    ) -> Result<RecordWrite> {
        let record_type = self.record_type.trim().to_uppercase();
        let priority = if requires_priority(&record_type) {
            let text = self.priority.trim();
            if text.is_empty() {
                return Err(DnsError::validation("MX and SRV records need a priority"));
            }
            Some(
                text.parse::<u16>()
                    .map_err(|_| DnsError::validation("Priority must be a number (0-65535)"))?,
            )
        } else {
            None
        };

        if self.content.trim().is_empty() {
            return Err(DnsError::validation("Record content is required"));
        }

        let name = match self.name.trim() {
            "" | "@" => zone_name.to_string(),
            other => other.to_string(),
        };
        let ttl = match self.ttl.trim().parse::<u32>() {
            Ok(0) | Err(_) => 1,
            Ok(ttl) => ttl,
        };
        let proxied = (allow_proxy && can_be_proxied(&record_type)).then_some(self.proxied);

        Ok(RecordWrite {
            record_type,
            name,
            content: self.content.clone(),
            ttl,
            priority,
            proxied,
            data,
        })
    }
}

/// Record being edited in place, with what the update must carry over.
#[derive(Clone, Debug, PartialEq)]
pub struct EditTarget {
    pub id: String,
    pub data: Option<Map<String, Value>>,
    pub proxiable: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordForm {
    pub draft: RecordDraft,
    pub field_index: usize,
    pub target: Option<EditTarget>,
}

impl RecordForm {
    pub fn is_edit(&self) -> bool {
        self.target.is_some()
    }

    pub fn fields(&self) -> Vec<Field> {
        let mut fields = Vec::with_capacity(6);
        if !self.is_edit() {
            fields.push(Field::Type);
        }
        fields.extend([Field::Name, Field::Content, Field::Ttl]);
        if requires_priority(&self.draft.record_type) {
            fields.push(Field::Priority);
        }
        if self.proxy_allowed() {
            fields.push(Field::Proxied);
        }
        fields
    }

    pub fn proxy_allowed(&self) -> bool {
        can_be_proxied(&self.draft.record_type) && self.target.as_ref().is_none_or(|t| t.proxiable)
    }

    pub fn active_field(&self) -> Field {
        let fields = self.fields();
        fields[self.field_index.min(fields.len() - 1)]
    }

    pub fn is_last_field(&self) -> bool {
        self.field_index + 1 >= self.fields().len()
    }

    pub fn next_field(&mut self) {
        self.field_index = (self.field_index + 1).min(self.fields().len() - 1);
    }

    pub fn previous_field(&mut self) {
        self.field_index = self.field_index.saturating_sub(1);
    }

    fn active_text_mut(&mut self) -> Option<&mut String> {
        match self.active_field() {
            Field::Name => Some(&mut self.draft.name),
            Field::Content => Some(&mut self.draft.content),
            Field::Ttl => Some(&mut self.draft.ttl),
            Field::Priority => Some(&mut self.draft.priority),
            Field::Type | Field::Proxied => None,
        }
    }

    pub fn insert_char(&mut self, c: char) {
        match self.active_field() {
            Field::Proxied if c == ' ' => self.draft.proxied = !self.draft.proxied,
            Field::Type if c == ' ' => self.cycle_type(1),
            _ => {
                if let Some(text) = self.active_text_mut() {
                    text.push(c);
                }
            }
        }
    }

    pub fn backspace(&mut self) {
        if let Some(text) = self.active_text_mut() {
            text.pop();
        }
    }

    /// Changing the type can add or remove fields; keep the cursor on Type.
    pub fn cycle_type(&mut self, step: isize) {
        if self.active_field() == Field::Type {
            self.draft.cycle_type(step);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmDelete {
    pub record_id: String,
    pub record_type: String,
    pub name: String,
    pub content: String,
}

/// A record as displayed: the raw record plus its effective type.
#[derive(Clone, Debug)]
pub struct RecordRow<'a> {
    pub record: &'a DnsRecord,
    pub effective: EffectiveType,
}

pub struct App<B: DnsBackend> {
    state_path: PathBuf,
    backend: B,
    pub token: String,
    pub zones: Vec<Zone>,
    pub selected_zone: usize,
    pub current_zone: Option<Zone>,
    pub records: Vec<DnsRecord>,
    pub routes: Vec<WorkerRoute>,
    pub selected_record: usize,
    pub focus: Focus,
    pub mode: Mode,
    pub search: String,
    pub type_filter: Option<String>,
    pub record_page: usize,
    pub record_page_size: usize,
    pending: Option<Task>,
    message: Option<StatusMessage>,
}

impl<B: DnsBackend> App<B> {
    pub fn new(state_path: impl Into<PathBuf>, state: State, backend: B) -> Self {
        Self {
            state_path: state_path.into(),
            backend,
            token: state.api_token.unwrap_or_default(),
            zones: Vec::new(),
            selected_zone: 0,
            current_zone: state.current_zone,
            records: Vec::new(),
            routes: Vec::new(),
            selected_record: 0,
            focus: Focus::Zones,
            mode: Mode::Normal,
            search: String::new(),
            type_filter: None,
            record_page: 0,
            record_page_size: 10,
            pending: None,
            message: None,
        }
    }

    // ---- task queue ----

    pub fn queue(&mut self, task: Task) {
        self.pending = Some(task);
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn run_pending(&mut self) {
        let Some(task) = self.pending.take() else {
            return;
        };
        debug!(?task, "running task");
        match task {
            Task::Startup => self.startup(),
            Task::SaveToken(token) => self.save_token(&token),
            Task::LoadZones => self.load_zones(),
            Task::SelectZone(index) => self.select_zone(index),
            Task::Reload => self.reload(),
            Task::Create(write) => self.create_record(write),
            Task::Update { id, write } => self.update_record(&id, write),
            Task::Delete(id) => self.delete_record(&id),
        }
    }

    // ---- messages ----

    pub fn set_message(&mut self, tone: Tone, text: impl Into<String>) {
        let text = text.into();
        info!(?tone, %text, "status");
        self.message = Some(StatusMessage {
            text,
            tone,
            shown_at: Instant::now(),
        });
    }

    /// Current message, if it has not expired yet.
    pub fn message(&self) -> Option<&StatusMessage> {
        self.message
            .as_ref()
            .filter(|m| m.shown_at.elapsed() < MESSAGE_TTL)
    }

    fn fail(&mut self, action: &str, err: DnsError) {
        error!(action, error = %err, "operation failed");
        if err.is_auth() {
            self.token.clear();
            if let Err(save_err) = self.save_state() {
                warn!(path = %self.state_path.display(), error = %save_err, "could not forget rejected token");
            }
            self.mode = Mode::TokenEntry(String::new());
            self.set_message(
                Tone::Error,
                format!("{action} failed: {err}. The API token was rejected, enter a new one"),
            );
        } else {
            self.set_message(Tone::Error, format!("{action} failed: {err}"));
        }
    }

    fn save_state(&self) -> anyhow::Result<()> {
        State {
            api_token: (!self.token.is_empty()).then(|| self.token.clone()),
            current_zone: self.current_zone.clone(),
        }
        .save(&self.state_path)
    }

    fn persist(&mut self) {
        if let Err(err) = self.save_state() {
            warn!(path = %self.state_path.display(), error = %err, "could not save state");
            self.set_message(Tone::Error, format!("Could not save settings: {err:#}"));
        }
    }

    // ---- operations ----

    pub fn startup(&mut self) {
        if self.token.is_empty() {
            self.mode = Mode::TokenEntry(String::new());
            self.set_message(Tone::Info, "Paste a Cloudflare API token to get started");
            return;
        }

        self.load_zones();
        if self.token.is_empty() {
            return;
        }
        if let Some(zone) = self.current_zone.clone() {
            if let Some(index) = self.zones.iter().position(|z| z.id == zone.id) {
                self.selected_zone = index;
            }
            self.focus = Focus::Records;
            self.reload();
        }
    }

    pub fn save_token(&mut self, token: &str) {
        let token = token.trim();
        if token.is_empty() {
            self.fail(
                "Save token",
                DnsError::validation("Enter an API token"),
            );
            self.mode = Mode::TokenEntry(String::new());
            return;
        }
        info!(length = token.len(), "saving API token");
        self.token = token.to_string();
        self.mode = Mode::Normal;
        self.persist();
        self.load_zones();
    }

    pub fn load_zones(&mut self) {
        if self.token.is_empty() {
            return;
        }
        match self.backend.list_zones(&self.token) {
            Ok(zones) => {
                self.zones = zones;
                if self.selected_zone >= self.zones.len() {
                    self.selected_zone = 0;
                }
                let count = self.zones.len();
                self.set_message(Tone::Success, format!("Loaded {count} zone(s)"));
            }
            Err(err) => self.fail("Loading zones", err.promote_auth()),
        }
    }

    pub fn select_zone(&mut self, index: usize) {
        let Some(zone) = self.zones.get(index).cloned() else {
            return;
        };
        info!(zone = %zone.name, "selected zone");
        self.selected_zone = index;
        self.current_zone = Some(zone);
        self.records.clear();
        self.routes.clear();
        self.focus = Focus::Records;
        self.persist();
        self.reload();
    }

    /// Leaves the current zone and goes back to the zone list.
    pub fn change_zone(&mut self) {
        self.current_zone = None;
        self.records.clear();
        self.routes.clear();
        self.selected_record = 0;
        self.record_page = 0;
        self.focus = Focus::Zones;
    }

    pub fn reload(&mut self) {
        self.load_records();
        self.load_routes();
    }

    /// Replaces the record list. Returns `false` when nothing was loaded.
    pub fn load_records(&mut self) -> bool {
        let Some(zone) = self.current_zone.clone() else {
            self.set_message(Tone::Error, "Select a zone first");
            return false;
        };
        match self.backend.list_records(&self.token, &zone) {
            Ok(records) => {
                log_type_distribution(&records);
                self.records = records;
                let total = self.visible_records().len();
                self.selected_record = self.selected_record.min(total.saturating_sub(1));
                self.ensure_record_visible(total);
                let count = self.records.len();
                self.set_message(
                    Tone::Success,
                    format!("Loaded {count} DNS record(s) for {}", zone.name),
                );
                true
            }
            Err(err) => {
                self.fail("Loading records", err);
                false
            }
        }
    }

    /// Routes are informational; a failure only leaves them unchanged.
    pub fn load_routes(&mut self) {
        let Some(zone) = self.current_zone.clone() else {
            return;
        };
        match self.backend.list_worker_routes(&self.token, &zone) {
            Ok(routes) => {
                debug!(count = routes.len(), zone = %zone.name, "loaded worker routes");
                self.routes = routes;
            }
            Err(err) => warn!(zone = %zone.name, error = %err, "could not load worker routes"),
        }
    }

    pub fn create_record(&mut self, write: RecordWrite) {
        let Some(zone) = self.current_zone.clone() else {
            return;
        };
        match self.backend.create_record(&self.token, &zone, &write) {
            Ok(()) => {
                info!(name = %write.name, kind = %write.record_type, "record created");
                self.mode = Mode::Normal;
                if self.load_records() {
                    self.set_message(Tone::Success, "Record added");
                }
            }
            Err(err) => self.fail("Adding record", err),
        }
    }

    pub fn update_record(&mut self, record_id: &str, write: RecordWrite) {
        let Some(zone) = self.current_zone.clone() else {
            return;
        };
        match self.backend.update_record(&self.token, &zone, record_id, &write) {
            Ok(()) => {
                info!(record_id, "record updated");
                self.mode = Mode::Normal;
                if self.load_records() {
                    self.set_message(Tone::Success, "Record updated");
                }
            }
            Err(err) => self.fail("Updating record", err),
        }
    }

    pub fn delete_record(&mut self, record_id: &str) {
        let Some(zone) = self.current_zone.clone() else {
            return;
        };
        self.mode = Mode::Normal;
        match self.backend.delete_record(&self.token, &zone, record_id) {
            Ok(()) => {
                info!(record_id, "record deleted");
                if self.load_records() {
                    self.set_message(Tone::Success, "Record deleted");
                }
            }
            Err(err) => self.fail("Deleting record", err),
        }
    }

    // ---- forms ----

    pub fn start_token_entry(&mut self) {
        self.mode = Mode::TokenEntry(self.token.clone());
    }

    pub fn start_create(&mut self) {
        if self.current_zone.is_none() {
            self.set_message(Tone::Error, "Select a zone first");
            return;
        }
        self.mode = Mode::RecordForm(RecordForm {
            draft: RecordDraft::default(),
            field_index: 0,
            target: None,
        });
    }

    /// Opens the edit form for `record_id`, or closes it when that record's
    /// form is already open.
    pub fn toggle_edit(&mut self, record_id: &str) {
        if let Mode::RecordForm(form) = &self.mode
            && form.target.as_ref().is_some_and(|t| t.id == record_id)
        {
            self.mode = Mode::Normal;
            return;
        }
        let Some(record) = self.records.iter().find(|r| r.id == record_id) else {
            warn!(record_id, "edit requested for unknown record");
            return;
        };
        self.mode = Mode::RecordForm(RecordForm {
            draft: RecordDraft::from_record(record),
            field_index: 0,
            target: Some(EditTarget {
                id: record.id.clone(),
                data: record.data.clone(),
                proxiable: record.proxiable != Some(false),
            }),
        });
    }

    pub fn edit_selected(&mut self) {
        if let Some(id) = self.current_record().map(|r| r.id.clone()) {
            self.toggle_edit(&id);
        }
    }

    /// Validates the open form and queues the write. Validation failures
    /// keep the form open.
    pub fn submit_form(&mut self) {
        let Mode::RecordForm(form) = &self.mode else {
            return;
        };
        let Some(zone_name) = self.current_zone.as_ref().map(|z| z.name.clone()) else {
            return;
        };
        let data = form.target.as_ref().and_then(|t| t.data.clone());
        let task = form
            .draft
            .to_write(&zone_name, data, form.proxy_allowed())
            .map(|write| match &form.target {
                Some(target) => Task::Update {
                    id: target.id.clone(),
                    write,
                },
                None => Task::Create(write),
            });
        match task {
            Ok(task) => self.queue(task),
            Err(err) => self.fail("Saving record", err),
        }
    }

    pub fn ask_delete(&mut self) {
        let Some(row) = self.current_row() else {
            return;
        };
        let zone_name = self.zone_name();
        let confirm = ConfirmDelete {
            record_id: row.record.id.clone(),
            record_type: raw_type(row.record),
            name: format_name(&row.record.name, zone_name),
            content: format_content(row.record, &row.effective),
        };
        self.mode = Mode::ConfirmDelete(confirm);
    }

    // ---- view ----

    pub fn zone_name(&self) -> &str {
        self.current_zone.as_ref().map_or("", |z| z.name.as_str())
    }

    /// Records after search and type filtering, sorted by effective type
    /// then name.
    pub fn visible_records(&self) -> Vec<RecordRow<'_>> {
        let needle = self.search.trim().to_lowercase();
        let mut rows: Vec<RecordRow<'_>> = self
            .records
            .iter()
            .map(|record| RecordRow {
                record,
                effective: classify(record),
            })
            .filter(|row| {
                needle.is_empty()
                    || row.record.name.to_lowercase().contains(&needle)
                    || row.record.content.to_lowercase().contains(&needle)
            })
            .filter(|row| {
                self.type_filter
                    .as_deref()
                    .is_none_or(|kind| row.effective.as_str() == kind)
            })
            .collect();
        rows.sort_by(|a, b| {
            a.effective
                .cmp(&b.effective)
                .then_with(|| a.record.name.cmp(&b.record.name))
        });
        rows
    }

    pub fn cycle_type_filter(&mut self, step: isize) {
        let options: Vec<&str> = KNOWN_TYPES.iter().copied().chain([WORKER]).collect();
        let len = options.len() as isize + 1;
        let current = self
            .type_filter
            .as_deref()
            .and_then(|kind| options.iter().position(|o| *o == kind))
            .map_or(0, |i| i as isize + 1);
        let next = (current + step).rem_euclid(len);
        self.type_filter = if next == 0 {
            None
        } else {
            Some(options[next as usize - 1].to_string())
        };
        self.reset_record_cursor();
    }

    pub fn apply_search(&mut self, text: String) {
        self.search = text;
        self.reset_record_cursor();
    }

    fn reset_record_cursor(&mut self) {
        self.record_page = 0;
        self.selected_record = 0;
    }

    pub fn current_row(&self) -> Option<RecordRow<'_>> {
        self.visible_records().into_iter().nth(self.selected_record)
    }

    pub fn current_record(&self) -> Option<&DnsRecord> {
        self.current_row().map(|row| row.record)
    }

    /// TTL, priority, structured data and modification time of the
    /// selected record.
    pub fn detail_line(&self) -> Option<String> {
        let record = self.current_record()?;
        let mut parts = vec![format!("TTL: {}", format_ttl(record.ttl))];
        if let Some(priority) = record.priority {
            parts.push(format!("Priority: {priority}"));
        }
        if let Some(data) = record.data.as_ref().filter(|d| !d.is_empty()) {
            parts.push(format!("Data: {}", format_record_data(data)));
        }
        if let Some(modified) = &record.modified_on {
            parts.push(format!("Modified: {}", format_modified(modified)));
        }
        if record.proxiable == Some(false) && !record.is_proxied() {
            parts.push("not proxiable".to_string());
        }
        Some(parts.join(" | "))
    }

    pub fn next_zone(&mut self) {
        if !self.zones.is_empty() {
            self.selected_zone = (self.selected_zone + 1) % self.zones.len();
        }
    }

    pub fn previous_zone(&mut self) {
        if self.zones.is_empty() {
            return;
        }
        self.selected_zone = if self.selected_zone == 0 {
            self.zones.len() - 1
        } else {
            self.selected_zone - 1
        };
    }

    pub fn next_record(&mut self) {
        let total = self.visible_records().len();
        if total == 0 {
            return;
        }
        self.selected_record = (self.selected_record + 1).min(total - 1);
        self.ensure_record_visible(total);
    }

    pub fn previous_record(&mut self) {
        let total = self.visible_records().len();
        if total == 0 {
            return;
        }
        self.selected_record = self.selected_record.saturating_sub(1);
        self.ensure_record_visible(total);
    }

    pub fn next_page(&mut self) {
        let page_count = self.record_page_count(self.visible_records().len());
        if page_count == 0 {
            return;
        }
        self.record_page = (self.record_page + 1) % page_count;
        self.selected_record = self.record_page * self.page_size();
    }

    pub fn previous_page(&mut self) {
        let page_count = self.record_page_count(self.visible_records().len());
        if page_count == 0 {
            return;
        }
        self.record_page = if self.record_page == 0 {
            page_count - 1
        } else {
            self.record_page - 1
        };
        self.selected_record = self.record_page * self.page_size();
    }

    pub fn update_record_page_size(&mut self, area_height: u16) {
        // Table uses one row for the header and two for borders.
        let new_size = (area_height as usize).saturating_sub(3).max(1);
        if new_size != self.record_page_size {
            self.record_page_size = new_size;
            let total = self.visible_records().len();
            let page_count = self.record_page_count(total);
            self.record_page = self.record_page.min(page_count.saturating_sub(1));
            self.selected_record = self.selected_record.min(total.saturating_sub(1));
            self.ensure_record_visible(total);
        }
    }

    pub fn page_size(&self) -> usize {
        self.record_page_size.max(1)
    }

    pub fn record_page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size())
    }

    pub fn paged_records(&self) -> Vec<RecordRow<'_>> {
        let start = self.record_page * self.page_size();
        self.visible_records()
            .into_iter()
            .skip(start)
            .take(self.page_size())
            .collect()
    }

    fn ensure_record_visible(&mut self, total: usize) {
        if total == 0 {
            self.record_page = 0;
            self.selected_record = 0;
            return;
        }
        let page = self.selected_record / self.page_size();
        self.record_page = page.min(self.record_page_count(total).saturating_sub(1));
    }

    pub fn status_line(&self) -> String {
        let zone = self
            .current_zone
            .as_ref()
            .map_or_else(|| "no zone".to_string(), Zone::label);
        let shown = self.visible_records().len();
        let page_count = self.record_page_count(shown).max(1);
        let mut filters = Vec::new();
        if !self.search.trim().is_empty() {
            filters.push(format!("search \"{}\"", self.search.trim()));
        }
        if let Some(kind) = &self.type_filter {
            filters.push(format!("type {kind}"));
        }
        let filter_suffix = if filters.is_empty() {
            String::new()
        } else {
            format!(" | filtered by {}", filters.join(", "))
        };
        format!(
            "Zone: {zone} | Records: {shown}/{} | page {}/{page_count}{filter_suffix}",
            self.records.len(),
            self.record_page + 1,
        )
    }
}

fn log_type_distribution(records: &[DnsRecord]) {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(raw_type(record)).or_default() += 1;
        if !is_known_type(&record.record_type) {
            warn!(
                kind = %record.record_type,
                name = %record.name,
                "unknown record type"
            );
        }
    }
    debug!(?counts, total = records.len(), "record type distribution");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;
    use serde_json::json;
    use std::env;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_state_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        env::temp_dir().join(format!("flaredns_app_test_{name}_{nanos}.json"))
    }

    fn zone() -> Zone {
        Zone {
            id: "demo-01".to_string(),
            name: "example.com".to_string(),
            status: "active".to_string(),
        }
    }

    fn record(id: &str, name: &str, kind: &str, content: &str) -> DnsRecord {
        DnsRecord {
            id: id.to_string(),
            record_type: kind.to_string(),
            name: name.to_string(),
            content: content.to_string(),
            ttl: 300,
            ..DnsRecord::default()
        }
    }

    fn app_with_records(test_name: &str, records: Vec<DnsRecord>) -> App<MockBackend> {
        let mut backend = MockBackend::new();
        backend.records.insert("demo-01".to_string(), records.clone());
        backend.routes.insert("demo-01".to_string(), Vec::new());
        let state = State {
            api_token: Some("token".to_string()),
            current_zone: Some(zone()),
        };
        let mut app = App::new(temp_state_path(test_name), state, backend);
        app.zones = vec![zone()];
        app.records = records;
        app
    }

    fn visible(app: &App<MockBackend>) -> Vec<(String, String)> {
        app.visible_records()
            .iter()
            .map(|row| (row.effective.to_string(), row.record.name.clone()))
            .collect()
    }

    fn open_form(app: &App<MockBackend>) -> &RecordForm {
        match &app.mode {
            Mode::RecordForm(form) => form,
            other => panic!("expected record form, got {other:?}"),
        }
    }

    #[test]
    fn display_order_is_type_then_name() {
        let app = app_with_records(
            "sort",
            vec![
                record("1", "b", "AAAA", "2001:db8::1"),
                record("2", "z", "A", "192.0.2.10"),
                record("3", "a", "A", "192.0.2.11"),
            ],
        );
        assert_eq!(
            visible(&app),
            [
                ("A".to_string(), "a".to_string()),
                ("A".to_string(), "z".to_string()),
                ("AAAA".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn search_matches_content_only_records() {
        let mut app = app_with_records(
            "search",
            vec![
                record("1", "www.example.com", "CNAME", "edge.provider.net"),
                record("2", "api.example.com", "A", "192.0.2.10"),
            ],
        );
        app.apply_search("PROVIDER".to_string());
        assert_eq!(visible(&app), [("CNAME".to_string(), "www.example.com".to_string())]);
    }

    #[test]
    fn type_filter_uses_effective_type() {
        let mut app = app_with_records(
            "type_filter",
            vec![
                record("1", "example.com", "MX", "mail.example.com"),
                record("2", "www.example.com", "A", "192.0.2.1"),
                record("3", "api.example.com", "A", "192.0.2.10"),
            ],
        );

        app.type_filter = Some("MX".to_string());
        assert_eq!(visible(&app), [("MX".to_string(), "example.com".to_string())]);

        app.type_filter = Some("A".to_string());
        assert_eq!(visible(&app), [("A".to_string(), "api.example.com".to_string())]);

        app.type_filter = Some(WORKER.to_string());
        assert_eq!(
            visible(&app),
            [("WORKER".to_string(), "www.example.com".to_string())]
        );
    }

    #[test]
    fn type_filter_cycles_through_all_and_worker() {
        let mut app = app_with_records("cycle", vec![]);
        app.cycle_type_filter(1);
        assert_eq!(app.type_filter.as_deref(), Some("A"));
        app.cycle_type_filter(-1);
        assert_eq!(app.type_filter, None);
        app.cycle_type_filter(-1);
        assert_eq!(app.type_filter.as_deref(), Some("WORKER"));
    }

    #[test]
    fn edit_toggles_closed_on_same_record() {
        let mut app = app_with_records(
            "toggle",
            vec![
                record("1", "a.example.com", "A", "192.0.2.10"),
                record("2", "b.example.com", "A", "192.0.2.11"),
            ],
        );
        app.toggle_edit("1");
        assert_eq!(open_form(&app).target.as_ref().unwrap().id, "1");

        app.toggle_edit("2");
        assert_eq!(open_form(&app).target.as_ref().unwrap().id, "2");

        app.toggle_edit("2");
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn mx_without_priority_is_rejected_locally() {
        let mut app = app_with_records("mx_validation", vec![]);
        app.start_create();
        if let Mode::RecordForm(form) = &mut app.mode {
            form.draft.record_type = "MX".to_string();
            form.draft.content = "mail.example.com".to_string();
        }
        app.submit_form();

        assert!(!app.is_loading(), "nothing should be queued");
        assert!(matches!(app.mode, Mode::RecordForm(_)), "form stays open");
        let message = app.message().unwrap();
        assert_eq!(message.tone, Tone::Error);
        assert!(message.text.contains("priority"), "{}", message.text);
    }

    #[test]
    fn empty_content_is_rejected_locally() {
        let draft = RecordDraft {
            content: "   ".to_string(),
            ..RecordDraft::default()
        };
        let err = draft.to_write("example.com", None, true).unwrap_err();
        assert!(matches!(err, DnsError::Validation(_)));
    }

    #[test]
    fn draft_defaults_name_and_ttl() {
        let draft = RecordDraft {
            record_type: "txt".to_string(),
            name: "@".to_string(),
            content: "hello".to_string(),
            ttl: "soon".to_string(),
            proxied: true,
            ..RecordDraft::default()
        };
        let write = draft.to_write("example.com", None, true).unwrap();
        assert_eq!(write.record_type, "TXT");
        assert_eq!(write.name, "example.com");
        assert_eq!(write.ttl, 1);
        assert_eq!(write.proxied, None, "TXT records are never proxied");
    }

    #[test]
    fn create_reloads_records() {
        let mut app = app_with_records("create", vec![]);
        app.start_create();
        if let Mode::RecordForm(form) = &mut app.mode {
            form.draft.name = "www".to_string();
            form.draft.content = "192.0.2.44".to_string();
            form.draft.proxied = true;
        }
        app.submit_form();
        assert!(app.is_loading());
        app.run_pending();

        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.records.len(), 1);
        assert_eq!(app.records[0].content, "192.0.2.44");
        assert_eq!(app.records[0].proxied, Some(true));
        assert_eq!(app.message().unwrap().text, "Record added");
    }

    #[test]
    fn failed_reload_after_write_is_reported() {
        let mut app = app_with_records("reload_error", vec![]);
        app.backend.fail_listing = Some(DnsError::network("Records", "connection reset"));
        app.create_record(RecordWrite {
            record_type: "A".to_string(),
            name: "www.example.com".to_string(),
            content: "192.0.2.44".to_string(),
            ttl: 1,
            priority: None,
            proxied: None,
            data: None,
        });

        let message = app.message().unwrap();
        assert_eq!(message.tone, Tone::Error);
        assert!(message.text.contains("connection reset"));
        assert!(app.records.is_empty());
    }

    #[test]
    fn auth_failure_on_reload_after_write_asks_for_token() {
        let mut app = app_with_records("reload_auth", vec![record("1", "a.example.com", "TXT", "x")]);
        app.backend.fail_listing = Some(DnsError::Auth {
            context: "Records".into(),
            message: "HTTP 403".into(),
        });
        app.delete_record("1");

        assert_eq!(app.mode, Mode::TokenEntry(String::new()));
        assert!(app.token.is_empty());
        assert_eq!(app.message().unwrap().tone, Tone::Error);
    }

    #[test]
    fn auth_message_survives_unwritable_state_file() {
        let mut app = app_with_records("auth_unwritable", vec![]);
        app.state_path = env::temp_dir();
        app.backend.fail_next = Some(DnsError::Auth {
            context: "Zones".into(),
            message: "HTTP 401".into(),
        });
        app.load_zones();

        assert_eq!(app.mode, Mode::TokenEntry(String::new()));
        assert!(app.message().unwrap().text.contains("API token was rejected"));
    }

    #[test]
    fn content_is_sent_as_typed() {
        let draft = RecordDraft {
            record_type: "TXT".to_string(),
            content: "  padded value ".to_string(),
            ..RecordDraft::default()
        };
        let write = draft.to_write("example.com", None, false).unwrap();
        assert_eq!(write.content, "  padded value ");

        let blank = RecordDraft {
            content: "   ".to_string(),
            ..RecordDraft::default()
        };
        assert!(blank.to_write("example.com", None, true).is_err());
    }

    #[test]
    fn update_preserves_type_and_data() {
        let mut srv = record("srv", "_sip._tcp.example.com", "SRV", "10 5060 sip.example.com");
        srv.priority = Some(10);
        srv.data = json!({"priority": 10, "weight": 5, "port": 5060, "target": "sip.example.com"})
            .as_object()
            .cloned();
        let mut app = app_with_records("update", vec![srv]);

        app.toggle_edit("srv");
        if let Mode::RecordForm(form) = &mut app.mode {
            assert!(!form.fields().contains(&Field::Type));
            assert!(form.fields().contains(&Field::Priority));
            assert!(!form.fields().contains(&Field::Proxied));
            form.draft.ttl = "3600".to_string();
        }
        app.submit_form();
        app.run_pending();

        let updated = &app.records[0];
        assert_eq!(updated.record_type, "SRV");
        assert_eq!(updated.ttl, 3600);
        assert_eq!(updated.data.as_ref().unwrap()["port"], json!(5060));
    }

    #[test]
    fn unproxiable_record_hides_proxy_toggle() {
        let mut rec = record("1", "a.example.com", "A", "10.0.0.1");
        rec.proxiable = Some(false);
        let mut app = app_with_records("unproxiable", vec![rec]);
        app.toggle_edit("1");
        assert!(!open_form(&app).fields().contains(&Field::Proxied));
    }

    #[test]
    fn delete_confirms_then_reloads() {
        let mut app = app_with_records(
            "delete",
            vec![
                record("1", "a.example.com", "TXT", "hello"),
                record("2", "b.example.com", "TXT", "bye"),
            ],
        );
        app.ask_delete();
        let Mode::ConfirmDelete(confirm) = app.mode.clone() else {
            panic!("expected delete confirmation");
        };
        assert_eq!(confirm.name, "a");
        assert_eq!(confirm.content, "\"hello\"");

        app.queue(Task::Delete(confirm.record_id));
        app.run_pending();

        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.records.len(), 1);
        assert_eq!(app.records[0].id, "2");
    }

    #[test]
    fn failed_write_keeps_records_and_reports() {
        let mut app = app_with_records("write_error", vec![record("1", "a.example.com", "A", "192.0.2.10")]);
        app.backend.fail_next = Some(DnsError::Api {
            context: "Delete".into(),
            message: "Record does not exist.".into(),
        });
        app.delete_record("1");

        assert_eq!(app.records.len(), 1);
        let message = app.message().unwrap();
        assert_eq!(message.tone, Tone::Error);
        assert!(message.text.contains("Record does not exist."));
        assert_eq!(app.token, "token", "non-auth errors keep the token");
    }

    #[test]
    fn auth_failure_on_zone_load_evicts_token() {
        let mut app = app_with_records("auth", vec![]);
        app.backend.fail_next = Some(DnsError::Api {
            context: "Zones".into(),
            message: "Invalid API Token".into(),
        });
        app.load_zones();

        assert!(app.token.is_empty());
        assert!(matches!(app.mode, Mode::TokenEntry(_)));
        let saved = State::load(&app.state_path).unwrap();
        assert_eq!(saved.api_token, None);
        assert_eq!(saved.current_zone, Some(zone()));
    }

    #[test]
    fn startup_restores_zone_and_loads_everything() {
        let state = State {
            api_token: Some("token".to_string()),
            current_zone: Some(Zone {
                id: "demo-02".to_string(),
                name: "staging.dev".to_string(),
                status: "pending".to_string(),
            }),
        };
        let mut app = App::new(temp_state_path("startup"), state, MockBackend::new());
        app.queue(Task::Startup);
        app.run_pending();

        assert_eq!(app.zones.len(), 2);
        assert_eq!(app.selected_zone, 1);
        assert_eq!(app.focus, Focus::Records);
        assert!(!app.records.is_empty());
        assert_eq!(app.routes.len(), 1);
    }

    #[test]
    fn startup_without_token_asks_for_one() {
        let mut app = App::new(temp_state_path("no_token"), State::default(), MockBackend::new());
        app.startup();
        assert!(matches!(app.mode, Mode::TokenEntry(_)));
        assert!(app.zones.is_empty());
    }

    #[test]
    fn save_token_persists_and_loads_zones() {
        let path = temp_state_path("save_token");
        let mut app = App::new(&path, State::default(), MockBackend::new());
        app.save_token("  fresh-token  ");

        assert_eq!(app.token, "fresh-token");
        assert_eq!(app.zones.len(), 2);
        assert_eq!(
            State::load(&path).unwrap().api_token.as_deref(),
            Some("fresh-token")
        );
    }

    #[test]
    fn blank_token_is_rejected() {
        let mut app = App::new(temp_state_path("blank"), State::default(), MockBackend::new());
        app.save_token("   ");
        assert!(app.token.is_empty());
        assert_eq!(app.message().unwrap().tone, Tone::Error);
    }

    #[test]
    fn selecting_zone_persists_it() {
        let path = temp_state_path("select");
        let mut app = App::new(&path, State {
            api_token: Some("token".to_string()),
            current_zone: None,
        }, MockBackend::new());
        app.load_zones();
        app.select_zone(1);

        assert_eq!(app.zone_name(), "staging.dev");
        assert_eq!(
            State::load(&path).unwrap().current_zone.map(|z| z.id),
            Some("demo-02".to_string())
        );
        assert!(!app.records.is_empty());
    }

    #[test]
    fn route_failure_is_not_surfaced() {
        let mut app = app_with_records("routes", vec![]);
        app.routes = vec![WorkerRoute {
            pattern: "example.com/*".to_string(),
            script: None,
            enabled: None,
        }];
        app.backend.fail_next = Some(DnsError::network("Worker routes", "timeout"));
        app.load_routes();
        assert_eq!(app.routes.len(), 1);
        assert!(app.message().is_none());
    }

    #[test]
    fn change_zone_clears_records() {
        let mut app = app_with_records("change", vec![record("1", "a.example.com", "A", "192.0.2.10")]);
        app.change_zone();
        assert!(app.current_zone.is_none());
        assert!(app.records.is_empty());
        assert_eq!(app.focus, Focus::Zones);
        app.load_records();
        assert_eq!(app.message().unwrap().text, "Select a zone first");
    }

    #[test]
    fn detail_line_lists_metadata() {
        let mut rec = record("1", "example.com", "MX", "mail.example.com");
        rec.ttl = 3600;
        rec.priority = Some(5);
        rec.proxiable = Some(false);
        rec.modified_on = Some("2024-01-02T03:04:05Z".to_string());
        let app = app_with_records("detail", vec![rec]);
        assert_eq!(
            app.detail_line().unwrap(),
            "TTL: 1 hour | Priority: 5 | Modified: 2024-01-02 03:04 UTC | not proxiable"
        );
    }

    #[test]
    fn paged_records_respects_page_and_size() {
        let records = (1..=5)
            .map(|i| record(&i.to_string(), &format!("r{i}.example.com"), "A", "192.0.2.10"))
            .collect();
        let mut app = app_with_records("paging", records);

        app.update_record_page_size(5); // yields a page size of 2

        app.record_page = 0;
        let first_page = app.paged_records();
        assert_eq!(first_page.len(), 2);
        assert_eq!(first_page[0].record.name, "r1.example.com");

        app.record_page = 2;
        let final_page = app.paged_records();
        assert_eq!(final_page.len(), 1);
        assert_eq!(final_page[0].record.name, "r5.example.com");
    }

    #[test]
    fn moving_selection_follows_pages() {
        let records = (1..=5)
            .map(|i| record(&i.to_string(), &format!("rec-{i}.example.com"), "A", "192.0.2.10"))
            .collect();
        let mut app = app_with_records("visible", records);
        app.update_record_page_size(6); // page size 3

        for _ in 0..4 {
            app.next_record();
        }
        assert_eq!(app.selected_record, 4);
        assert_eq!(app.record_page, 1);

        app.next_page();
        assert_eq!(app.record_page, 0);
        assert_eq!(app.selected_record, 0);
    }

    #[test]
    fn status_line_reports_filters() {
        let mut app = app_with_records(
            "status",
            vec![
                record("1", "a.example.com", "A", "192.0.2.10"),
                record("2", "b.example.com", "TXT", "x"),
            ],
        );
        app.type_filter = Some("TXT".to_string());
        let status = app.status_line();
        assert!(status.contains("Records: 1/2"), "{status}");
        assert!(status.contains("type TXT"), "{status}");
    }
}
