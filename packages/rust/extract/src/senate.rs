//! senate.gov contact list (XML) and committee assignments (HTML) → roster rows.
//!
//! Members come from `senators_cfm.xml`:
//!
//! ```xml
//! <contact_information>
//!   <member>
//!     <last_name>Sanders</last_name><first_name>Bernard</first_name>
//!     <party>I</party><state>VT</state>
//!     <address>332 Dirksen Senate Office Building Washington DC 20510</address>
//!     <phone>(202) 224-5141</phone>
//!   </member>
//! </contact_information>
//! ```
//!
//! Assignments come from a page that renders each senator as a pair of
//! floated divs: the name (`Sanders, Bernard (I-VT)`) and a list of committee
//! links. Both sides are joined on the `Last, First` name.

use std::collections::HashMap;
use std::sync::LazyLock;

use legisharvest_shared::{HarvestError, Result, RosterKind, RosterRecord};
use quick_xml::Reader;
use quick_xml::events::Event;
use scraper::{Html, Selector};
use tracing::debug;

use crate::text::squash_whitespace;

static NAME_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"div[style="float:left; width:25%; font-weight:bold; min-width:200px;"]"#)
        .expect("senator name selector")
});

static MEMBERSHIP_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"div[style="float:left; width:72%; min-width:200px;"]"#)
        .expect("membership selector")
});

static LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("link selector"));

/// Whitespace sequence that breaks one upstream address across lines.
const BROKEN_ADDRESS_SEQ: &str = "\n     ";

/// One `<member>` of the senate contact list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SenateMember {
    pub last_name: String,
    pub first_name: String,
    pub state: String,
    pub party: String,
    pub address: String,
    pub phone: String,
}

impl SenateMember {
    /// `Last, First`, the key used by the assignments page.
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }

    fn field_mut(&mut self, tag: &[u8]) -> Option<&mut String> {
        match tag {
            b"last_name" => Some(&mut self.last_name),
            b"first_name" => Some(&mut self.first_name),
            b"state" => Some(&mut self.state),
            b"party" => Some(&mut self.party),
            b"address" => Some(&mut self.address),
            b"phone" => Some(&mut self.phone),
            _ => None,
        }
    }
}

/// Parse the senate contact list.
pub fn parse_senate_members(xml: &str) -> Result<Vec<SenateMember>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut members = Vec::new();
    let mut current: Option<SenateMember> = None;
    let mut field: Option<Vec<u8>> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();
                if name == b"member" {
                    current = Some(SenateMember::default());
                } else if current.is_some() {
                    field = Some(name);
                }
            }
            Ok(Event::Text(t)) => {
                if let (Some(member), Some(tag)) = (current.as_mut(), field.as_deref()) {
                    let text = t
                        .unescape()
                        .map_err(|e| HarvestError::parse(format!("senate members: {e}")))?;
                    if let Some(slot) = member.field_mut(tag) {
                        slot.push_str(&text);
                    }
                }
            }
            Ok(Event::CData(c)) => {
                if let (Some(member), Some(tag)) = (current.as_mut(), field.as_deref()) {
                    if let Some(slot) = member.field_mut(tag) {
                        slot.push_str(&String::from_utf8_lossy(&c));
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"member" {
                    if let Some(member) = current.take() {
                        members.push(member);
                    }
                }
                field = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(HarvestError::parse(format!(
                    "senate members at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
    }

    debug!(members = members.len(), "parsed senate contact list");
    Ok(members)
}

/// Parse the assignments page into `Last, First` → committee names.
pub fn parse_senate_assignments(html: &str) -> HashMap<String, Vec<String>> {
    let doc = Html::parse_document(html);

    let memberships: HashMap<String, Vec<String>> = doc
        .select(&NAME_SEL)
        .zip(doc.select(&MEMBERSHIP_SEL))
        .map(|(name_div, membership_div)| {
            let label = name_div.text().collect::<String>();
            let name = label.split('(').next().unwrap_or_default().trim().to_string();
            let committees = membership_div
                .select(&LINK_SEL)
                .map(|a| squash_whitespace(&a.text().collect::<String>()))
                .filter(|c| !c.is_empty())
                .collect();
            (name, committees)
        })
        .collect();

    debug!(senators = memberships.len(), "parsed senate assignments");
    memberships
}

/// Join contact list and assignments into roster rows.
///
/// A senator missing from the assignments page gets an empty committee list.
pub fn build_senate_roster(
    members: Vec<SenateMember>,
    memberships: &HashMap<String, Vec<String>>,
) -> Vec<RosterRecord> {
    members
        .into_iter()
        .map(|member| {
            let name = member.display_name();
            let committees = match memberships.get(&name) {
                Some(committees) => committees.clone(),
                None => {
                    debug!(%name, "no committee assignments found");
                    Vec::new()
                }
            };
            RosterRecord {
                kind: RosterKind::Senator,
                district: member.state,
                name,
                party: member.party,
                office_room: member.address.replace(BROKEN_ADDRESS_SEQ, ""),
                phone: member.phone,
                committees,
            }
        })
        .collect()
}
