//! Record domain model.
//!
//! # Responsibility
//! - Define the canonical record shared by all domain variants.
//! - Own identity generation, timestamp formatting and reconstruction.
//!
//! # Invariants
//! - `identity` is generated once and never reassigned, except when a
//!   record is rebuilt verbatim from snapshot data.
//! - `updated_at >= created_at` at all times.
//! - Variant default fields are seeded per instance; no defaults are
//!   shared between instances.

use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Wire format for both persisted timestamps, microsecond precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Reserved snapshot key carrying the variant name of an entry.
///
/// The double-underscore prefix keeps it outside the identifier-style
/// namespace used by legitimate attributes.
pub const KIND_KEY: &str = "__kind__";

/// Fixed fields that can never be written through the attribute bag.
const RESERVED_FIELDS: &[&str] = &["identity", "created_at", "updated_at"];

pub type ModelResult<T> = Result<T, ModelError>;

/// Validation and reconstruction errors for a single record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    MissingField {
        field: &'static str,
    },
    InvalidIdentity {
        value: String,
    },
    InvalidTimestamp {
        field: &'static str,
        value: String,
    },
    InvalidTimestampOrder {
        created_at: String,
        updated_at: String,
    },
    ReservedAttribute {
        name: String,
    },
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { field } => {
                write!(f, "missing required field `{field}` in reconstruction data")
            }
            Self::InvalidIdentity { value } => {
                write!(f, "identity must be a string, got `{value}`")
            }
            Self::InvalidTimestamp { field, value } => write!(
                f,
                "invalid timestamp `{value}` in field `{field}`; expected {TIMESTAMP_FORMAT}"
            ),
            Self::InvalidTimestampOrder {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at ({updated_at}) must be >= created_at ({created_at})"
            ),
            Self::ReservedAttribute { name } => {
                write!(f, "attribute name `{name}` is reserved")
            }
        }
    }
}

impl Error for ModelError {}

/// Closed set of persisted record variants.
///
/// This enum is the dispatch table used when reloading a snapshot:
/// every persisted variant name must resolve here, and anything else
/// is rejected instead of being interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Base,
    User,
    Accommodation,
    City,
    GeographicRegion,
    Amenity,
    GuestReview,
}

impl RecordKind {
    /// Every variant, in a stable order. Useful for seeding and tests.
    pub const ALL: [RecordKind; 7] = [
        RecordKind::Base,
        RecordKind::User,
        RecordKind::Accommodation,
        RecordKind::City,
        RecordKind::GeographicRegion,
        RecordKind::Amenity,
        RecordKind::GuestReview,
    ];

    /// Returns the persisted variant name.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Base => "BaseRecord",
            Self::User => "User",
            Self::Accommodation => "Accommodation",
            Self::City => "City",
            Self::GeographicRegion => "GeographicRegion",
            Self::Amenity => "Amenity",
            Self::GuestReview => "GuestReview",
        }
    }

    /// Resolves a persisted variant name against the closed set.
    ///
    /// Returns `None` for anything outside the set; callers must treat
    /// that as a hard error, never as a fallback to `Base`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "BaseRecord" => Some(Self::Base),
            "User" => Some(Self::User),
            "Accommodation" => Some(Self::Accommodation),
            "City" => Some(Self::City),
            "GeographicRegion" => Some(Self::GeographicRegion),
            "Amenity" => Some(Self::Amenity),
            "GuestReview" => Some(Self::GuestReview),
            _ => None,
        }
    }

    /// Builds the default attribute set for this variant.
    ///
    /// A fresh map is built on every call so instances never alias a
    /// shared default value (list-valued defaults included).
    pub fn default_attributes(self) -> Map<String, Value> {
        let fields: &[(&str, Value)] = match self {
            Self::Base => &[],
            Self::User => &[
                ("email", Value::String(String::new())),
                ("password", Value::String(String::new())),
                ("first_name", Value::String(String::new())),
                ("last_name", Value::String(String::new())),
            ],
            Self::Accommodation => &[
                ("city_id", Value::String(String::new())),
                ("host_id", Value::String(String::new())),
                ("title", Value::String(String::new())),
                ("description", Value::String(String::new())),
                ("rooms", Value::Number(0.into())),
                ("bathrooms", Value::Number(0.into())),
                ("max_guests", Value::Number(0.into())),
                ("price_by_night", Value::Number(0.into())),
                ("latitude", Value::from(0.0)),
                ("longitude", Value::from(0.0)),
                ("amenity_ids", Value::Array(Vec::new())),
            ],
            Self::City => &[
                ("region_id", Value::String(String::new())),
                ("name", Value::String(String::new())),
            ],
            Self::GeographicRegion => &[("name", Value::String(String::new()))],
            Self::Amenity => &[("name", Value::String(String::new()))],
            Self::GuestReview => &[
                ("accommodation_id", Value::String(String::new())),
                ("reviewer_id", Value::String(String::new())),
                ("text", Value::String(String::new())),
            ],
        };

        let mut attributes = Map::new();
        for (name, value) in fields {
            attributes.insert((*name).to_string(), value.clone());
        }
        attributes
    }
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Canonical persisted domain entity: identity, two timestamps and an
/// open attribute bag.
///
/// Fixed fields are kept private so identity and timestamp rules can
/// only be exercised through the constructors, `touch` and snapshot
/// reconstruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    kind: RecordKind,
    identity: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    attributes: Map<String, Value>,
}

impl Record {
    /// Creates a fresh record with a generated identity, both
    /// timestamps set to now and per-instance variant defaults.
    ///
    /// Registration is the storage engine's job; see
    /// `RecordStore::register` and `RecordService::create`.
    pub fn new(kind: RecordKind) -> Self {
        let now = now();
        Self {
            kind,
            identity: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            attributes: kind.default_attributes(),
        }
    }

    /// Rebuilds a record verbatim from flat snapshot data.
    ///
    /// # Contract
    /// - `identity`, `created_at` and `updated_at` must be present;
    ///   timestamps must be strings in [`TIMESTAMP_FORMAT`].
    /// - Every other key is adopted as an ad-hoc attribute unchanged.
    /// - The rebuilt record is NOT registered anywhere; reload paths
    ///   register explicitly.
    ///
    /// # Errors
    /// - [`ModelError::MissingField`] when a fixed field is absent.
    /// - [`ModelError::InvalidIdentity`] when `identity` is not a
    ///   string (`null` included).
    /// - [`ModelError::InvalidTimestamp`] when a timestamp is not a
    ///   string or does not match the wire format.
    /// - [`ModelError::InvalidTimestampOrder`] when the persisted
    ///   `updated_at` precedes `created_at`.
    pub fn from_snapshot(kind: RecordKind, mut data: Map<String, Value>) -> ModelResult<Self> {
        let identity = match data.remove("identity") {
            Some(Value::String(value)) => value,
            Some(other) => {
                return Err(ModelError::InvalidIdentity {
                    value: other.to_string(),
                });
            }
            None => return Err(ModelError::MissingField { field: "identity" }),
        };

        let created_at = take_timestamp(&mut data, "created_at")?;
        let updated_at = take_timestamp(&mut data, "updated_at")?;
        if updated_at < created_at {
            return Err(ModelError::InvalidTimestampOrder {
                created_at: format_timestamp(created_at),
                updated_at: format_timestamp(updated_at),
            });
        }

        Ok(Self {
            kind,
            identity,
            created_at,
            updated_at,
            attributes: data,
        })
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn updated_at(&self) -> NaiveDateTime {
        self.updated_at
    }

    /// Composite registry key: `<TypeName>.<identity>`.
    pub fn key(&self) -> String {
        format!("{}.{}", self.kind.type_name(), self.identity)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Sets or replaces one open attribute.
    ///
    /// # Errors
    /// - [`ModelError::ReservedAttribute`] for the fixed fields and any
    ///   double-underscore name (the snapshot tag namespace).
    pub fn set_attribute(&mut self, name: impl Into<String>, value: Value) -> ModelResult<()> {
        let name = name.into();
        if RESERVED_FIELDS.contains(&name.as_str()) || name.starts_with("__") {
            return Err(ModelError::ReservedAttribute { name });
        }
        self.attributes.insert(name, value);
        Ok(())
    }

    /// Moves `updated_at` to the current time.
    ///
    /// Persistence is a separate step; see `RecordService::commit_update`.
    pub fn touch(&mut self) {
        self.updated_at = now();
    }

    /// Renders the flat snapshot form of this record.
    ///
    /// # Contract
    /// - Timestamps are rendered in [`TIMESTAMP_FORMAT`].
    /// - The variant name is added under [`KIND_KEY`].
    /// - The record itself is left untouched.
    pub fn to_snapshot_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("identity".to_string(), Value::String(self.identity.clone()));
        map.insert(
            "created_at".to_string(),
            Value::String(format_timestamp(self.created_at)),
        );
        map.insert(
            "updated_at".to_string(),
            Value::String(format_timestamp(self.updated_at)),
        );
        for (name, value) in &self.attributes {
            map.insert(name.clone(), value.clone());
        }
        map.insert(
            KIND_KEY.to_string(),
            Value::String(self.kind.type_name().to_string()),
        );
        map
    }
}

/// Diagnostic rendering: `[<TypeName>] (<identity>) <field-map>`.
///
/// Never used for persistence; the snapshot form is `to_snapshot_map`.
impl Display for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut fields = self.to_snapshot_map();
        fields.remove(KIND_KEY);
        write!(
            f,
            "[{}] ({}) {}",
            self.kind.type_name(),
            self.identity,
            Value::Object(fields)
        )
    }
}

/// Renders one timestamp in the persisted wire format.
pub fn format_timestamp(value: NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses one timestamp from the persisted wire format.
pub fn parse_timestamp(field: &'static str, value: &str) -> ModelResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|_| {
        ModelError::InvalidTimestamp {
            field,
            value: value.to_string(),
        }
    })
}

fn take_timestamp(data: &mut Map<String, Value>, field: &'static str) -> ModelResult<NaiveDateTime> {
    match data.remove(field) {
        Some(Value::String(value)) => parse_timestamp(field, &value),
        Some(other) => Err(ModelError::InvalidTimestamp {
            field,
            value: other.to_string(),
        }),
        None => Err(ModelError::MissingField { field }),
    }
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
