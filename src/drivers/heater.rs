//! Heater element SSR driver.
//!
//! Converts a 0–100 % duty command into the 8-bit LEDC duty register that
//! gates the kettle's solid-state relay. Slow PWM on a zero-cross SSR
//! gives proportional power into the resistive element.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: writes the LEDC channel via hw_init helpers.
//! On host/test: tracks the last duty in-memory only.

use crate::drivers::hw_init;
use crate::error::ActuatorError;

pub struct HeaterDriver {
    duty_percent: f32,
}

impl HeaterDriver {
    pub fn new() -> Self {
        Self { duty_percent: 0.0 }
    }

    /// Apply a duty in percent. Out-of-range input is clamped; the domain
    /// layer has already bounded it via the PID output limits.
    pub fn set_duty(&mut self, percent: f32) -> Result<(), ActuatorError> {
        let percent = if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            0.0
        };
        let duty_8bit = (percent * 255.0 / 100.0) as u8;
        if !hw_init::ledc_set(hw_init::LEDC_CH_HEATER, duty_8bit) {
            return Err(ActuatorError::PwmWriteFailed);
        }
        self.duty_percent = percent;
        Ok(())
    }

    /// Hard off.
    pub fn off(&mut self) -> Result<(), ActuatorError> {
        self.set_duty(0.0)
    }

    pub fn current_duty(&self) -> f32 {
        self.duty_percent
    }
}

impl Default for HeaterDriver {
    fn default() -> Self {
        Self::new()
    }
}
