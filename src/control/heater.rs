//! Kettle heater controller.
//!
//! Wraps the [`Pid`] core with the session-facing contract: tunings and
//! sample period are pushed from config at stage starts, one `compute` step
//! runs per control tick, and `disable` is the hard off switch used at boot
//! and by StopBrew. The heater SSR is exclusively owned here — nothing else
//! in the firmware writes to [`HeaterPort`].

use log::debug;

use crate::app::ports::HeaterPort;
use crate::app::session::{BrewSession, Stage};
use crate::error::ActuatorError;

use super::pid::Pid;

pub struct HeaterController {
    pid: Pid,
    sample_period_ms: u32,
    enabled: bool,
    last_duty: f32,
}

impl HeaterController {
    /// Construct disabled; a start/resume command enables and tunes it.
    pub fn new(kp: f32, ki: f32, kd: f32, sample_period_ms: u32) -> Self {
        Self {
            pid: Pid::new(kp, ki, kd),
            sample_period_ms,
            enabled: false,
            last_duty: 0.0,
        }
    }

    pub fn set_tunings(&mut self, kp: f32, ki: f32, kd: f32) {
        self.pid.set_tunings(kp, ki, kd);
    }

    pub fn set_sample_period_ms(&mut self, ms: u32) {
        self.sample_period_ms = ms;
    }

    pub fn sample_period_ms(&self) -> u32 {
        self.sample_period_ms
    }

    /// Arm the controller for a running session.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Hard off: zero output, reset PID state, drop the SSR gate.
    pub fn disable(&mut self, hw: &mut impl HeaterPort) -> Result<(), ActuatorError> {
        self.enabled = false;
        self.last_duty = 0.0;
        self.pid.reset();
        hw.heater_off()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn last_duty(&self) -> f32 {
        self.last_duty
    }

    /// One PID step against the current session. Drives the SSR as a side
    /// effect and returns the applied duty. A disabled controller, a
    /// stopped session, or an absent setpoint all force the element off.
    pub fn compute(
        &mut self,
        session: &BrewSession,
        hw: &mut impl HeaterPort,
    ) -> Result<f32, ActuatorError> {
        let target = match session.target_temperature {
            Some(t) if self.enabled && session.brew_started => t,
            _ => {
                self.last_duty = 0.0;
                hw.heater_off()?;
                return Ok(0.0);
            }
        };

        // The active power cap depends on the phase: full ramp power on the
        // way to a mash rest, the operator's boil cap during the boil.
        let cap = match session.active_stage {
            Stage::Boil => session.boil_power_percent,
            _ => session.ramp_power_percent,
        };

        self.pid.set_limits(0.0, cap.clamp(0.0, 100.0));
        self.pid.set_target(target);

        let dt = self.sample_period_ms as f32 / 1000.0;
        let duty = self.pid.compute(session.current_temperature, dt);

        hw.set_heater_duty(duty)?;
        self.last_duty = duty;
        debug!(
            "heater: target={:.1}C current={:.1}C duty={:.0}%",
            target, session.current_temperature, duty
        );
        Ok(duty)
    }
}
