// ── Core entity types ──
//
// EntityId, HostAddress, and Category form the foundation of every
// domain type. Status is always derived from the last reported load,
// never stored on its own.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumString};

use crate::error::CoreError;
use crate::model::measurement::VALID_BAND;

// ── EntityId ────────────────────────────────────────────────────────

/// Identifier of a monitored entity. Positive, unique within the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// Construct an id, rejecting zero.
    pub fn new(raw: u32) -> Result<Self, CoreError> {
        if raw == 0 {
            return Err(CoreError::InvalidId);
        }
        Ok(Self(raw))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Zero-padded to three digits, matching list/log output everywhere.
        write!(f, "{:03}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u32 = s.parse().map_err(|_| CoreError::InvalidId)?;
        Self::new(raw)
    }
}

// ── HostAddress ─────────────────────────────────────────────────────

/// Dotted-quad address string, validated on construction:
/// four octets, each 0-255.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostAddress(String);

impl HostAddress {
    pub fn new(raw: impl Into<String>) -> Result<Self, CoreError> {
        let raw = raw.into();
        let octets: Vec<&str> = raw.split('.').collect();
        let valid = octets.len() == 4
            && octets
                .iter()
                .all(|o| !o.is_empty() && o.parse::<u16>().is_ok_and(|n| n <= 255));
        if valid {
            Ok(Self(raw))
        } else {
            Err(CoreError::InvalidAddress(raw))
        }
    }

    /// Address synthesized for an entity first seen via telemetry.
    pub fn synthesized(id: EntityId) -> Self {
        Self(format!("192.168.1.{}", 10 + id.get()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HostAddress {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ── Category ────────────────────────────────────────────────────────

/// Closed set of entity categories, each with a display hint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, StrumDisplay, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Category {
    Web,
    #[strum(to_string = "Database", serialize = "db")]
    Database,
    File,
}

impl Category {
    /// Deterministic category for entities synthesized from telemetry,
    /// keyed on `id mod 10`: 1/4/7 Web, 2/5/8 Database, 3/6/9/0 File.
    pub fn for_id(id: EntityId) -> Self {
        match id.get() % 10 {
            1 | 4 | 7 => Self::Web,
            2 | 5 | 8 => Self::Database,
            _ => Self::File,
        }
    }

    /// Display hint for presentation layers that render category icons.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Web => "icons/web_server.png",
            Self::Database => "icons/database_server.png",
            Self::File => "icons/file_server.png",
        }
    }
}

// ── Status ──────────────────────────────────────────────────────────

/// Operational status, a pure function of the last reported load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, StrumDisplay)]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    Online,
    Warning,
    Offline,
}

impl Status {
    /// `0 -> offline`; inside the inclusive valid band `-> online`;
    /// anything else `-> warning`.
    pub fn from_value(value: f64) -> Self {
        if value == 0.0 {
            Self::Offline
        } else if (VALID_BAND.0..=VALID_BAND.1).contains(&value) {
            Self::Online
        } else {
            Self::Warning
        }
    }
}

// ── Entity ──────────────────────────────────────────────────────────

/// A monitored server. Owned exclusively by the [`Registry`](crate::Registry);
/// slots and connections refer to it by id only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub address: HostAddress,
    pub category: Category,
    pub last_value: f64,
    pub last_update: DateTime<Utc>,
}

impl Entity {
    /// Entity synthesized for an id first seen via telemetry.
    pub fn synthesized(id: EntityId, value: f64, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: format!("Server {id}"),
            address: HostAddress::synthesized(id),
            category: Category::for_id(id),
            last_value: value,
            last_update: now,
        }
    }

    /// Derived status; recomputed on every read, never cached.
    pub fn status(&self) -> Status {
        Status::from_value(self.last_value)
    }
}

// ── EntityDraft ─────────────────────────────────────────────────────

/// Unvalidated entity fields as entered by an operator.
///
/// [`validate`](Self::validate) applies every entry rule, reporting the
/// first failure as a structured reason.
#[derive(Debug, Clone, Default)]
pub struct EntityDraft {
    pub id: u32,
    pub name: String,
    pub address: String,
    pub category: Option<Category>,
}

impl EntityDraft {
    /// Validate the draft into a full [`Entity`] with zero load.
    ///
    /// Duplicate-id checking is the registry's job, not the draft's.
    pub fn validate(self, now: DateTime<Utc>) -> Result<Entity, CoreError> {
        let id = EntityId::new(self.id)?;
        if self.name.trim().is_empty() {
            return Err(CoreError::MissingName);
        }
        let address = HostAddress::new(self.address)?;
        let category = self.category.unwrap_or(Category::Web);
        Ok(Entity {
            id,
            name: self.name,
            address,
            category,
            last_value: 0.0,
            last_update: now,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_rejects_zero() {
        assert_eq!(EntityId::new(0), Err(CoreError::InvalidId));
        assert!(EntityId::new(1).is_ok());
    }

    #[test]
    fn entity_id_display_is_zero_padded() {
        assert_eq!(EntityId::new(7).unwrap().to_string(), "007");
        assert_eq!(EntityId::new(123).unwrap().to_string(), "123");
    }

    #[test]
    fn host_address_accepts_dotted_quad() {
        assert!(HostAddress::new("192.168.1.1").is_ok());
        assert!(HostAddress::new("0.0.0.0").is_ok());
        assert!(HostAddress::new("255.255.255.255").is_ok());
    }

    #[test]
    fn host_address_rejects_bad_input() {
        for bad in ["", "192.168.1", "1.2.3.4.5", "192.168.1.256", "a.b.c.d", "1..2.3"] {
            assert!(HostAddress::new(bad).is_err(), "{bad:?} should be invalid");
        }
    }

    #[test]
    fn category_mod_ten_table() {
        let cat = |n: u32| Category::for_id(EntityId::new(n).unwrap());
        assert_eq!(cat(1), Category::Web);
        assert_eq!(cat(4), Category::Web);
        assert_eq!(cat(17), Category::Web);
        assert_eq!(cat(2), Category::Database);
        assert_eq!(cat(25), Category::Database);
        assert_eq!(cat(3), Category::File);
        assert_eq!(cat(9), Category::File);
        assert_eq!(cat(10), Category::File);
    }

    #[test]
    fn status_derivation() {
        assert_eq!(Status::from_value(0.0), Status::Offline);
        assert_eq!(Status::from_value(45.0), Status::Online);
        assert_eq!(Status::from_value(75.0), Status::Online);
        assert_eq!(Status::from_value(60.0), Status::Online);
        assert_eq!(Status::from_value(44.9), Status::Warning);
        assert_eq!(Status::from_value(75.1), Status::Warning);
        assert_eq!(Status::from_value(100.0), Status::Warning);
    }

    #[test]
    fn synthesized_entity_fields() {
        let id = EntityId::new(3).unwrap();
        let e = Entity::synthesized(id, 60.0, Utc::now());
        assert_eq!(e.name, "Server 003");
        assert_eq!(e.address.as_str(), "192.168.1.13");
        assert_eq!(e.category, Category::File);
        assert_eq!(e.status(), Status::Online);
    }

    #[test]
    fn draft_validation_reports_first_failure() {
        let now = Utc::now();
        let draft = |id, name: &str, addr: &str| EntityDraft {
            id,
            name: name.into(),
            address: addr.into(),
            category: Some(Category::Web),
        };
        assert_eq!(
            draft(0, "x", "1.2.3.4").validate(now).unwrap_err(),
            CoreError::InvalidId
        );
        assert_eq!(
            draft(1, "  ", "1.2.3.4").validate(now).unwrap_err(),
            CoreError::MissingName
        );
        assert!(matches!(
            draft(1, "x", "nope").validate(now).unwrap_err(),
            CoreError::InvalidAddress(_)
        ));
        assert!(draft(1, "x", "1.2.3.4").validate(now).is_ok());
    }

    #[test]
    fn category_icons_are_distinct() {
        assert_eq!(Category::Web.icon(), "icons/web_server.png");
        assert_eq!(Category::Database.icon(), "icons/database_server.png");
        assert_eq!(Category::File.icon(), "icons/file_server.png");
    }

    #[test]
    fn category_parses_case_insensitive() {
        assert_eq!("web".parse::<Category>().unwrap(), Category::Web);
        assert_eq!("db".parse::<Category>().unwrap(), Category::Database);
        assert_eq!("File".parse::<Category>().unwrap(), Category::File);
    }
}
