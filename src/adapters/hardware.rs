//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the kettle probe and both actuator drivers, exposing them through
//! [`TemperatureProbe`], [`HeaterPort`] and [`PumpPort`]. This is the only
//! module in the system that touches actual hardware. On non-espidf
//! targets, the underlying drivers use cfg-gated simulation stubs.

use crate::app::ports::{HeaterPort, PumpPort, TemperatureProbe};
use crate::drivers::heater::HeaterDriver;
use crate::drivers::pump::PumpDriver;
use crate::error::{ActuatorError, SensorError};
use crate::sensors::TemperatureSensor;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    probe: TemperatureSensor,
    heater: HeaterDriver,
    pump: PumpDriver,
}

impl HardwareAdapter {
    pub fn new(probe: TemperatureSensor, heater: HeaterDriver, pump: PumpDriver) -> Self {
        Self {
            probe,
            heater,
            pump,
        }
    }

    pub fn heater_duty(&self) -> f32 {
        self.heater.current_duty()
    }

    pub fn pump_running(&self) -> bool {
        self.pump.is_running()
    }
}

impl TemperatureProbe for HardwareAdapter {
    fn read_celsius(&mut self) -> Result<f32, SensorError> {
        self.probe.read_celsius()
    }
}

impl HeaterPort for HardwareAdapter {
    fn set_heater_duty(&mut self, duty: f32) -> Result<(), ActuatorError> {
        self.heater.set_duty(duty)
    }

    fn heater_off(&mut self) -> Result<(), ActuatorError> {
        self.heater.off()
    }
}

impl PumpPort for HardwareAdapter {
    fn set_pump(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.pump.set(on)
    }
}
