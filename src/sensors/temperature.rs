//! NTC thermistor kettle probe (10 kOhm @ 25 C, B = 3950).
//!
//! Wired in a voltage divider with a fixed 10 kOhm resistor, read via the
//! ESP32-S3 ADC. The simplified Beta (Steinhart-Hart) equation converts
//! resistance to temperature. Readings pinned to either supply rail mean
//! a shorted or disconnected probe and are reported as errors rather than
//! fed into the control loop.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the kettle ADC channel via the oneshot API
//! (initialised by hw_init).
//! On host/test: reads from a static AtomicU16 for injection.

use core::sync::atomic::AtomicU16;
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::Ordering;

use crate::error::SensorError;
#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

static SIM_TEMP_ADC: AtomicU16 = AtomicU16::new(2048);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_temp_adc(raw: u16) {
    SIM_TEMP_ADC.store(raw, Ordering::Relaxed);
}

const R25: f32 = 10_000.0;
const BETA: f32 = 3950.0;
const T25_K: f32 = 298.15;
const R_DIVIDER: f32 = 10_000.0;
const ADC_MAX: f32 = 4095.0;
const V_REF: f32 = 3.3;

// Anything outside this band is physically implausible for a brew kettle
// probe and indicates a wiring or conversion fault.
const MIN_PLAUSIBLE_C: f32 = -10.0;
const MAX_PLAUSIBLE_C: f32 = 130.0;

pub struct TemperatureSensor {
    _adc_gpio: i32,
}

impl TemperatureSensor {
    pub fn new(adc_gpio: i32) -> Self {
        Self { _adc_gpio: adc_gpio }
    }

    pub fn read_celsius(&self) -> Result<f32, SensorError> {
        let raw = self.read_adc();
        let celsius = Self::adc_to_celsius(raw)?;
        if !(MIN_PLAUSIBLE_C..=MAX_PLAUSIBLE_C).contains(&celsius) {
            return Err(SensorError::OutOfRange);
        }
        Ok(celsius)
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> u16 {
        hw_init::adc1_read(pins::ADC1_CH_KETTLE_TEMP)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> u16 {
        SIM_TEMP_ADC.load(Ordering::Relaxed)
    }

    fn adc_to_celsius(raw: u16) -> Result<f32, SensorError> {
        let voltage = (f32::from(raw) / ADC_MAX) * V_REF;
        // Pinned to a rail: open or shorted probe.
        if voltage <= 0.01 || voltage >= (V_REF - 0.01) {
            return Err(SensorError::Disconnected);
        }
        let r_ntc = R_DIVIDER * voltage / (V_REF - voltage);
        let inv_t = (1.0 / T25_K) + (1.0 / BETA) * (r_ntc / R25).ln();
        if inv_t <= 0.0 {
            return Err(SensorError::OutOfRange);
        }
        Ok((1.0 / inv_t) - 273.15)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midscale_reads_room_temperature() {
        // Half-rail means R_ntc == R_divider == R25, i.e. exactly 25 C.
        sim_set_temp_adc(2048);
        let sensor = TemperatureSensor::new(9);
        let c = sensor.read_celsius().unwrap();
        assert!((c - 25.0).abs() < 0.5, "got {c}");
    }

    #[test]
    fn rail_low_is_disconnected() {
        assert_eq!(
            TemperatureSensor::adc_to_celsius(0),
            Err(SensorError::Disconnected)
        );
    }

    #[test]
    fn rail_high_is_disconnected() {
        assert_eq!(
            TemperatureSensor::adc_to_celsius(4095),
            Err(SensorError::Disconnected)
        );
    }

    #[test]
    fn hotter_probe_reads_higher() {
        // NTC resistance falls as temperature rises, so a lower divider
        // voltage (lower raw) must convert to a higher temperature.
        let cool = TemperatureSensor::adc_to_celsius(2048).unwrap();
        let hot = TemperatureSensor::adc_to_celsius(900).unwrap();
        assert!(hot > cool);
    }
}
