//! Stage sequencers — step logic for the mash and boil stages.
//!
//! Both implement [`StageSequencer`](crate::app::ports::StageSequencer):
//! the controller calls `advance` once per control tick and applies the
//! returned patch itself. Sequencers are pure step machines over their
//! reloaded profiles; they never persist anything and never touch actuators.

pub mod boil;
pub mod mash;

pub use boil::BoilSequencer;
pub use mash::MashSequencer;
