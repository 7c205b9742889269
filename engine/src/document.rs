//! Document primitives shared by every store implementation.

use crate::{error::Result, Error};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// A schema-flexible document body.
pub type Document = Map<String, Value>;

/// The three named collections kept by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Employees,
    Vehicles,
    Allocations,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Employees,
        Collection::Vehicles,
        Collection::Allocations,
    ];

    /// Collection name as persisted by stores.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Employees => "employees",
            Collection::Vehicles => "vehicles",
            Collection::Allocations => "allocations",
        }
    }

    /// Singular, human-readable entity name used in messages.
    pub fn entity_name(&self) -> &'static str {
        match self {
            Collection::Employees => "Employee",
            Collection::Vehicles => "Vehicle",
            Collection::Allocations => "Allocation",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque document identifier: 12 bytes rendered as 24 lowercase hex digits.
///
/// The first four bytes hold the creation time in seconds (big-endian), the
/// remaining eight are random.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    pub const LEN: usize = 24;

    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or_default();
        let random = uuid::Uuid::new_v4();

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..].copy_from_slice(&random.as_bytes()[..8]);

        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Parse a caller-supplied identifier.
    pub fn parse(input: &str) -> Result<Self> {
        if input.len() == Self::LEN && input.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(Self(input.to_ascii_lowercase()))
        } else {
            Err(Error::InvalidId(input.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DocumentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A conjunction of top-level field-equality conditions.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Document,
}

impl Filter {
    /// A filter matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.insert(field.into(), value.into());
        self
    }

    /// Add the condition only when `value` is present.
    pub fn eq_opt<V: Into<Value>>(self, field: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.eq(field, v),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Conditions as a JSON object, suitable for containment queries.
    pub fn as_document(&self) -> &Document {
        &self.conditions
    }

    /// Whether `doc` satisfies every condition.
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }
}

/// A document together with its store identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub body: Document,
}
