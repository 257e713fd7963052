//! Table rendering for the operator console.

use fleetwatch_core::model::{Entity, MeasurementSample, Status};
use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

// ── Rows ────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Type")]
    category: String,
    #[tabled(rename = "Load %")]
    value: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Last Update")]
    last_update: String,
}

impl From<&Entity> for EntityRow {
    fn from(e: &Entity) -> Self {
        Self {
            id: e.id.to_string(),
            name: e.name.clone(),
            address: e.address.as_str().to_owned(),
            category: e.category.to_string(),
            value: format!("{:.1}", e.last_value),
            status: status_label(e.status()),
            last_update: e.last_update.format("%H:%M:%S").to_string(),
        }
    }
}

#[derive(Tabled)]
struct SampleRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "In Band")]
    valid: String,
}

impl From<&MeasurementSample> for SampleRow {
    fn from(s: &MeasurementSample) -> Self {
        Self {
            time: s.timestamp.format("%H:%M:%S").to_string(),
            value: format!("{:.1}", s.value),
            valid: if s.is_valid { "yes".into() } else { "no".into() },
        }
    }
}

// ── Renderers ───────────────────────────────────────────────────────

pub fn status_label(status: Status) -> String {
    match status {
        Status::Online => status.green().to_string(),
        Status::Warning => status.yellow().to_string(),
        Status::Offline => status.red().to_string(),
    }
}

pub fn entity_table(entities: &[Entity]) -> String {
    if entities.is_empty() {
        return "(no entities)".into();
    }
    let rows: Vec<EntityRow> = entities.iter().map(EntityRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn history_table(samples: &[MeasurementSample]) -> String {
    if samples.is_empty() {
        return "(no measurements recorded)".into();
    }
    let rows: Vec<SampleRow> = samples.iter().map(SampleRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}
