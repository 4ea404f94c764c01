//! Field extraction from upstream legislative pages.
//!
//! Each module turns one kind of raw body into typed records:
//! - [`committees`]: govinfo committee browser (HTML) → [`CommitteeCatalog`]
//! - [`hearings`]: per-committee hearing listing (JSON) → [`HearingListing`]
//! - [`house`]: house.gov representatives tables (HTML) → roster rows
//! - [`senate`]: senate.gov contact XML + assignments page (HTML) → roster rows
//!
//! Extraction is deliberately lenient: rows that cannot yield a record are
//! skipped, and only a body that is unusable as a whole is an error.

pub mod committees;
pub mod hearings;
pub mod house;
pub mod senate;
mod text;

pub use committees::{CommitteeCatalog, parse_committee_catalog};
pub use hearings::{HearingListing, parse_hearing_listing};
pub use house::{HOUSE_TABLE_LIMIT, parse_house_roster};
pub use senate::{
    SenateMember, build_senate_roster, parse_senate_assignments, parse_senate_members,
};
pub use text::camel_case_split;
