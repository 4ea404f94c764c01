//! Core domain types for harvested legislative records.

use serde::{Deserialize, Serialize};

use crate::error::{HarvestError, Result};

/// Checkpoint document holding the hearings backfill cursor.
pub const CHECKPOINT_DOCUMENT: &str = "federal/congressional";

/// Key of the congress-number cursor inside [`CHECKPOINT_DOCUMENT`].
pub const CONGRESS_NUMBER_KEY: &str = "congress-number";

/// Separator between id components. Components may not contain it.
const ID_SEPARATOR: char = '|';

// ---------------------------------------------------------------------------
// Chamber
// ---------------------------------------------------------------------------

/// A congressional chamber as used in committee listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chamber {
    Senate,
    House,
    Joint,
}

impl Chamber {
    /// All chambers in catalog order.
    pub const ALL: [Chamber; 3] = [Chamber::Senate, Chamber::House, Chamber::Joint];

    /// Path segment used by the upstream committee browser.
    pub fn as_str(&self) -> &'static str {
        match self {
            Chamber::Senate => "senate",
            Chamber::House => "house",
            Chamber::Joint => "joint",
        }
    }
}

impl std::fmt::Display for Chamber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RecordId
// ---------------------------------------------------------------------------

/// Stable, deterministic document id within an index.
///
/// Only constructible through the per-record-type constructors, which reject
/// empty components and components containing the `|` separator so two
/// distinct entities can never render to the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Id of a hearing: the granule id when present, else the package id.
    pub fn hearing(granule_id: Option<&str>, package_id: Option<&str>) -> Result<Self> {
        let granule = granule_id.map(str::trim).filter(|s| !s.is_empty());
        let package = package_id.map(str::trim).filter(|s| !s.is_empty());

        let natural = granule.or(package).ok_or_else(|| {
            HarvestError::validation("hearing has neither granuleid nor packageid")
        })?;
        Ok(Self(natural.to_string()))
    }

    /// Id of a roster row: `<kind>|<district>|<name>|<party>`.
    pub fn roster(kind: RosterKind, district: &str, name: &str, party: &str) -> Result<Self> {
        let mut parts = vec![kind.code().to_string()];
        for (field, value) in [("district", district), ("name", name), ("party", party)] {
            let value = value.trim();
            if value.is_empty() {
                return Err(HarvestError::validation(format!(
                    "roster id: empty {field}"
                )));
            }
            if value.contains(ID_SEPARATOR) {
                return Err(HarvestError::validation(format!(
                    "roster id: {field} '{value}' contains '{ID_SEPARATOR}'"
                )));
            }
            parts.push(value.to_string());
        }
        Ok(Self(parts.join(&ID_SEPARATOR.to_string())))
    }

    /// Borrow the rendered id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// HearingRecord
// ---------------------------------------------------------------------------

/// One hearing (granule or package) from a committee listing.
#[derive(Debug, Clone)]
pub struct HearingRecord {
    /// Natural id derived from the upstream granule/package id.
    pub id: RecordId,
    /// The upstream `nodeValue` object, stored verbatim.
    pub node: serde_json::Value,
}

impl HearingRecord {
    /// Build a record from an upstream `nodeValue` object.
    pub fn from_node(node: serde_json::Value) -> Result<Self> {
        let id = RecordId::hearing(
            node.get("granuleid").and_then(|v| v.as_str()),
            node.get("packageid").and_then(|v| v.as_str()),
        )?;
        Ok(Self { id, node })
    }

    /// Convert into an index upsert.
    pub fn into_op(self) -> IndexOp {
        IndexOp {
            id: self.id,
            document: serde_json::json!({ "obj": self.node }),
        }
    }
}

// ---------------------------------------------------------------------------
// RosterRecord
// ---------------------------------------------------------------------------

/// Which roster a member row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RosterKind {
    /// House representative.
    #[serde(rename = "R")]
    Representative,
    /// Senator.
    #[serde(rename = "S")]
    Senator,
}

impl RosterKind {
    /// Single-letter code used in ids and documents.
    pub fn code(&self) -> &'static str {
        match self {
            RosterKind::Representative => "R",
            RosterKind::Senator => "S",
        }
    }
}

/// One elected member with their committee assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterRecord {
    #[serde(rename = "Type")]
    pub kind: RosterKind,
    #[serde(rename = "District")]
    pub district: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Party")]
    pub party: String,
    #[serde(rename = "Office Room")]
    pub office_room: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "Committee Assignment")]
    pub committees: Vec<String>,
}

impl RosterRecord {
    /// Stable id from kind, district, name and party.
    pub fn id(&self) -> Result<RecordId> {
        RecordId::roster(self.kind, &self.district, &self.name, &self.party)
    }

    /// Convert into an index upsert.
    pub fn into_op(self) -> Result<IndexOp> {
        let id = self.id()?;
        let obj = serde_json::to_value(&self)
            .map_err(|e| HarvestError::validation(format!("roster {id}: {e}")))?;
        Ok(IndexOp {
            id,
            document: serde_json::json!({ "obj": obj }),
        })
    }
}

// ---------------------------------------------------------------------------
// IndexBatch
// ---------------------------------------------------------------------------

/// A single upsert: replace the document stored under `id`.
#[derive(Debug, Clone)]
pub struct IndexOp {
    pub id: RecordId,
    pub document: serde_json::Value,
}

/// Ordered upserts bound for one index, flushed as a unit.
#[derive(Debug, Clone)]
pub struct IndexBatch {
    /// Target index name.
    pub index: String,
    /// Pending upserts in accumulation order.
    pub ops: Vec<IndexOp>,
}

impl IndexBatch {
    /// Create an empty batch for `index`.
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            ops: Vec::new(),
        }
    }

    pub fn push(&mut self, op: IndexOp) {
        self.ops.push(op);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Drop all pending ops, keeping the target index.
    pub fn clear(&mut self) {
        self.ops.clear();
    }
}
