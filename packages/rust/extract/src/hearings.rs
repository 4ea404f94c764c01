//! govinfo committee hearing listing (JSON) → hearing records.
//!
//! The listing endpoint answers
//! `{"childNodes": [{"nodeValue": {"granuleid": …, "packageid": …, …}}, …]}`.
//! `childNodes` may be absent or null when a committee held no hearings in
//! that congress.

use legisharvest_shared::{HarvestError, HearingRecord, Result};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(rename = "childNodes", default)]
    child_nodes: Option<Vec<ChildNode>>,
}

#[derive(Debug, Deserialize)]
struct ChildNode {
    #[serde(rename = "nodeValue", default)]
    node_value: Option<serde_json::Value>,
}

/// Records extracted from one listing, plus how many children were unusable.
#[derive(Debug, Default)]
pub struct HearingListing {
    pub records: Vec<HearingRecord>,
    /// Children dropped for lacking a `nodeValue` or a usable id.
    pub dropped: usize,
}

/// Parse a listing body. Invalid JSON is an error; bad children are dropped.
pub fn parse_hearing_listing(body: &str) -> Result<HearingListing> {
    let listing: Listing = serde_json::from_str(body)
        .map_err(|e| HarvestError::parse(format!("hearing listing: {e}")))?;

    let mut out = HearingListing::default();
    for child in listing.child_nodes.unwrap_or_default() {
        let Some(node) = child.node_value else {
            warn!("listing child without nodeValue, dropping");
            out.dropped += 1;
            continue;
        };

        match HearingRecord::from_node(node) {
            Ok(record) => out.records.push(record),
            Err(e) => {
                warn!(error = %e, "dropping hearing without id");
                out.dropped += 1;
            }
        }
    }

    Ok(out)
}
