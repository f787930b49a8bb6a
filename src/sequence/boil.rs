//! Boil sequencer.
//!
//! Holds the session at the boil setpoint, arms the boil window once the
//! kettle reaches it, and surfaces named addition keys (hops, finings) as
//! their time offsets come due. Addition offsets count backwards from the
//! end of the boil, recipe style: a "60" bittering addition is due the
//! moment the window opens, a "5" aroma addition five minutes before it
//! closes.

use log::{info, warn};

use crate::app::ports::{ConfigStore, StageSequencer};
use crate::app::session::{BrewSession, SessionPatch, Stage};
use crate::config::BoilProfile;

pub struct BoilSequencer {
    profile: BoilProfile,
}

impl BoilSequencer {
    pub fn new() -> Self {
        Self {
            profile: BoilProfile::default(),
        }
    }

    /// The addition whose offset window covers `remaining_secs`, i.e. the
    /// most recent key that has come due.
    fn due_addition(&self, remaining_secs: u64) -> Option<&crate::config::BoilAddition> {
        self.profile
            .additions
            .iter()
            .filter(|a| u64::from(a.offset_from_end_mins) * 60 >= remaining_secs)
            .min_by_key(|a| a.offset_from_end_mins)
    }
}

impl Default for BoilSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl StageSequencer for BoilSequencer {
    fn reload(&mut self, store: &dyn ConfigStore) {
        self.profile = match store.load_boil_profile() {
            Ok(p) => p,
            Err(e) => {
                warn!("boil: profile load failed ({}), no additions", e);
                BoilProfile::default()
            }
        };
        info!(
            "boil: profile loaded ({} additions)",
            self.profile.additions.len()
        );
    }

    fn advance(&mut self, session: &BrewSession, now: Option<u64>) -> Option<SessionPatch> {
        if !session.brew_started || session.active_stage != Stage::Boil {
            return None;
        }
        let target = session.boil_target_temperature?;

        let mut patch = SessionPatch {
            target_temperature: Some(target),
            ..Default::default()
        };

        match session.end_time {
            None => {
                if session.current_temperature >= target {
                    if let Some(now) = now {
                        patch.start_time = Some(now);
                        patch.end_time = Some(now + u64::from(session.boil_time_secs));
                        info!("boil: at temp, {} s window armed", session.boil_time_secs);
                    }
                }
            }
            Some(end) => {
                let Some(now) = now else { return Some(patch) };
                if now >= end {
                    patch.clear_step_window = true;
                    patch.clear_boil_step = true;
                    patch.stage_complete = true;
                    info!("boil: window elapsed");
                } else {
                    let remaining = end - now;
                    if let Some(addition) = self.due_addition(remaining) {
                        if session.boil_step.as_ref() != Some(&addition.key) {
                            info!(
                                "boil: addition '{}' due ({} s remaining)",
                                addition.key, remaining
                            );
                            patch.boil_step = Some(addition.key.clone());
                        }
                    }
                }
            }
        }

        Some(patch)
    }
}
