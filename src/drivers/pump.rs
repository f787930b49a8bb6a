//! Recirculation pump relay driver.
//!
//! Plain on/off relay on a GPIO. The pump moves wort through the RIMS
//! tube during the mash; policy for when it runs lives with the operator
//! and the session's recirculation flag, not here.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the relay GPIO via hw_init helpers.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;
use crate::error::ActuatorError;
use crate::pins;

pub struct PumpDriver {
    running: bool,
}

impl PumpDriver {
    pub fn new() -> Self {
        Self { running: false }
    }

    pub fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        if !hw_init::gpio_write(pins::PUMP_RELAY_GPIO, on) {
            return Err(ActuatorError::GpioWriteFailed);
        }
        self.running = on;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for PumpDriver {
    fn default() -> Self {
        Self::new()
    }
}
