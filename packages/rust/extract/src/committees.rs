//! govinfo committee browser → committee catalog.
//!
//! The browse page lists committees in three columns (`#senate-col`,
//! `#house-col`, `#joint-col`). Each entry links to
//! `/committee/<chamber>-<code>`; the trailing code is what the listing API
//! expects.

use std::sync::LazyLock;

use legisharvest_shared::{Chamber, HarvestError, Result};
use scraper::{Html, Selector};
use tracing::debug;

static ENTRY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.field_items").expect("entry selector"));

static LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("link selector"));

/// Committee codes per chamber, in page order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitteeCatalog {
    columns: Vec<(Chamber, Vec<String>)>,
}

impl CommitteeCatalog {
    /// Every `(chamber, committee)` pair, chamber-major in catalog order.
    pub fn pairs(&self) -> impl Iterator<Item = (Chamber, &str)> + '_ {
        self.columns.iter().flat_map(|(chamber, committees)| {
            committees.iter().map(move |code| (*chamber, code.as_str()))
        })
    }

    /// Committee codes for one chamber.
    pub fn committees(&self, chamber: Chamber) -> &[String] {
        self.columns
            .iter()
            .find(|(c, _)| *c == chamber)
            .map(|(_, codes)| codes.as_slice())
            .unwrap_or(&[])
    }

    /// Total number of `(chamber, committee)` pairs.
    pub fn len(&self) -> usize {
        self.columns.iter().map(|(_, codes)| codes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse the committee browse page.
///
/// A missing chamber column means the page layout changed, which is an error:
/// harvesting with a partial catalog would silently skip whole chambers.
pub fn parse_committee_catalog(html: &str) -> Result<CommitteeCatalog> {
    let doc = Html::parse_document(html);
    let mut columns = Vec::with_capacity(Chamber::ALL.len());

    for chamber in Chamber::ALL {
        let column_sel = Selector::parse(&format!("div#{}-col", chamber.as_str()))
            .map_err(|e| HarvestError::parse(format!("column selector: {e}")))?;

        let column = doc.select(&column_sel).next().ok_or_else(|| {
            HarvestError::parse(format!("committee page has no {chamber} column"))
        })?;

        let mut codes = Vec::new();
        for entry in column.select(&ENTRY_SEL) {
            let Some(href) = entry
                .select(&LINK_SEL)
                .next()
                .and_then(|a| a.value().attr("href"))
            else {
                debug!(%chamber, "committee entry without link, skipping");
                continue;
            };

            match committee_code(href) {
                Some(code) => codes.push(code.to_string()),
                None => debug!(%chamber, href, "unrecognized committee link"),
            }
        }

        debug!(%chamber, committees = codes.len(), "parsed committee column");
        columns.push((chamber, codes));
    }

    Ok(CommitteeCatalog { columns })
}

/// `/committee/senate-agriculture` → `agriculture`.
fn committee_code(href: &str) -> Option<&str> {
    let segment = href.trim_end_matches('/').rsplit('/').next()?;
    let code = segment.rsplit('-').next()?;
    (!code.is_empty()).then_some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"<html><body>
        <div id="senate-col">
            <div class="field_items"><a href="/committee/senate-agriculture">Agriculture</a></div>
            <div class="field_items"><a href="/committee/senate-judiciary">Judiciary</a></div>
        </div>
        <div id="house-col">
            <div class="field_items"><a href="/committee/house-ways">Ways and Means</a></div>
            <div class="field_items"><span>No link here</span></div>
        </div>
        <div id="joint-col">
            <div class="field_items"><a href="/committee/joint-economic/">Economic</a></div>
        </div>
    </body></html>"#;

    #[test]
    fn parses_all_columns_in_order() {
        let catalog = parse_committee_catalog(CATALOG).unwrap();

        assert_eq!(catalog.committees(Chamber::Senate), ["agriculture", "judiciary"]);
        assert_eq!(catalog.committees(Chamber::House), ["ways"]);
        assert_eq!(catalog.committees(Chamber::Joint), ["economic"]);
        assert_eq!(catalog.len(), 4);

        let pairs: Vec<(Chamber, &str)> = catalog.pairs().collect();
        assert_eq!(pairs[0], (Chamber::Senate, "agriculture"));
        assert_eq!(pairs[2], (Chamber::House, "ways"));
        assert_eq!(pairs[3], (Chamber::Joint, "economic"));
    }

    #[test]
    fn missing_column_is_parse_error() {
        let html = r#"<div id="senate-col"></div><div id="house-col"></div>"#;
        let err = parse_committee_catalog(html).unwrap_err();
        assert!(err.to_string().contains("joint column"));
    }

    #[test]
    fn code_from_href() {
        assert_eq!(committee_code("/committee/senate-agriculture"), Some("agriculture"));
        assert_eq!(committee_code("https://www.govinfo.gov/committee/house-ways/"), Some("ways"));
        assert_eq!(committee_code("/committee/"), Some("committee"));
        assert_eq!(committee_code("/committee/senate-"), None);
    }
}
