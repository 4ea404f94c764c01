//! house.gov representatives page → roster rows.
//!
//! The page holds one table per state/territory, each preceded by a
//! `<caption>` naming it. Rows are `District | Name | Party | Office Room |
//! Phone | Committee Assignment`. Tables past the state listing (search
//! widgets, alphabetical views) are ignored.

use std::sync::LazyLock;

use legisharvest_shared::{RosterKind, RosterRecord};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::text::{camel_case_split, squash_whitespace};

/// Number of state/territory tables on the roster page.
pub const HOUSE_TABLE_LIMIT: usize = 56;

/// Minimum cells a member row must have (district through phone).
const MIN_CELLS: usize = 5;

static CAPTION_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("caption").expect("caption selector"));

static TABLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("table selector"));

static ROW_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("row selector"));

static CELL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("cell selector"));

/// Extract every member row from the representatives page.
pub fn parse_house_roster(html: &str) -> Vec<RosterRecord> {
    let doc = Html::parse_document(html);

    let places: Vec<String> = doc
        .select(&CAPTION_SEL)
        .take(HOUSE_TABLE_LIMIT)
        .map(|c| squash_whitespace(&c.text().collect::<String>()))
        .collect();

    let mut records = Vec::new();
    for (place, table) in places.iter().zip(doc.select(&TABLE_SEL).take(HOUSE_TABLE_LIMIT)) {
        for row in table.select(&ROW_SEL) {
            let cells: Vec<ElementRef<'_>> = row.select(&CELL_SEL).collect();
            if cells.len() < MIN_CELLS {
                // header rows use <th>
                continue;
            }

            let text = |i: usize| squash_whitespace(&cells[i].text().collect::<String>());
            records.push(RosterRecord {
                kind: RosterKind::Representative,
                district: format!("{place} {}", text(0)),
                name: text(1),
                party: text(2),
                office_room: text(3),
                phone: text(4),
                committees: cells.get(5).map(committee_cell).unwrap_or_default(),
            });
        }
    }

    debug!(tables = places.len(), members = records.len(), "parsed house roster");
    records
}

/// Committee names from the assignment cell.
///
/// When the cell keeps one text node per committee those are used directly;
/// when upstream runs them together into a single string, split on case.
fn committee_cell(cell: &ElementRef<'_>) -> Vec<String> {
    let parts: Vec<String> = cell
        .text()
        .map(squash_whitespace)
        .filter(|s| !s.is_empty())
        .collect();

    match parts.as_slice() {
        [] => Vec::new(),
        [single] => camel_case_split(single),
        _ => parts,
    }
}
