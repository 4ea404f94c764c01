//! Harvest orchestration for LegisHarvest.
//!
//! Ties fetching, extraction and storage together into the two runs the CLI
//! exposes: the resumable hearings sweep and the roster refresh.

pub mod clock;
pub mod congress;
pub mod hearings;
pub mod members;

pub use clock::{Clock, SystemClock};
pub use congress::{congress_number_from_year, next_range, resolve_checkpoint};
pub use hearings::{
    HarvestOutcome, HarvestProgress, HarvestSummary, HearingsConfig, HearingsHarvester,
    SilentProgress,
};
pub use members::{ChamberReport, MembersConfig, RosterIngester, RosterSummary};
