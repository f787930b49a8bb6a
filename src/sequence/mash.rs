//! Mash rest sequencer.
//!
//! Walks the ordered mash profile: for the current step it keeps the
//! session setpoint on the rest target, arms the rest window once the
//! kettle reaches the target, and moves to the next step when the window
//! deadline passes (either naturally or because the operator forced the
//! deadline via AdvanceStage).

use log::{info, warn};

use crate::app::ports::{ConfigStore, StageSequencer};
use crate::app::session::{BrewSession, SessionPatch, Stage};
use crate::config::MashProfile;

pub struct MashSequencer {
    profile: MashProfile,
}

impl MashSequencer {
    pub fn new() -> Self {
        Self {
            profile: MashProfile::default(),
        }
    }

    pub fn step_count(&self) -> usize {
        self.profile.steps.len()
    }
}

impl Default for MashSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl StageSequencer for MashSequencer {
    fn reload(&mut self, store: &dyn ConfigStore) {
        self.profile = match store.load_mash_profile() {
            Ok(p) if !p.steps.is_empty() => p,
            Ok(_) => {
                info!("mash: empty profile, falling back to single infusion");
                MashProfile::single_infusion()
            }
            Err(e) => {
                warn!("mash: profile load failed ({}), using single infusion", e);
                MashProfile::single_infusion()
            }
        };
        info!("mash: profile loaded ({} steps)", self.profile.steps.len());
    }

    fn advance(&mut self, session: &BrewSession, now: Option<u64>) -> Option<SessionPatch> {
        if !session.brew_started || session.active_stage != Stage::Mash {
            return None;
        }
        let idx = session.mash_step?;
        let Some(step) = self.profile.steps.get(idx) else {
            // Profile shrank under a running session; report the stage done.
            return Some(SessionPatch {
                clear_step_window: true,
                stage_complete: true,
                ..Default::default()
            });
        };

        let mut patch = SessionPatch {
            target_temperature: Some(step.target_temperature_c),
            ..Default::default()
        };

        match session.end_time {
            None => {
                // Still ramping. Arm the rest window once the kettle is at
                // temperature (requires a synchronized clock).
                if session.current_temperature >= step.target_temperature_c {
                    if let Some(now) = now {
                        patch.start_time = Some(now);
                        patch.end_time = Some(now + u64::from(step.duration_mins) * 60);
                        info!(
                            "mash: step {} at temp, resting {} min",
                            idx, step.duration_mins
                        );
                    }
                }
            }
            Some(end) => {
                let Some(now) = now else { return Some(patch) };
                if now >= end {
                    let next = idx + 1;
                    patch.clear_step_window = true;
                    if next < self.profile.steps.len() {
                        patch.mash_step = Some(next);
                        patch.target_temperature =
                            Some(self.profile.steps[next].target_temperature_c);
                        info!("mash: advancing to step {}", next);
                    } else {
                        patch.stage_complete = true;
                        info!("mash: all rests complete");
                    }
                }
            }
        }

        Some(patch)
    }
}
