//! GPIO pin map for the BrewKettle controller board (ESP32-S3).
//!
//! Single source of truth for every pin assignment. Change here, not in
//! the drivers.

/// Kettle NTC thermistor divider, read via ADC1.
pub const KETTLE_TEMP_ADC_GPIO: i32 = 9;

/// Heater SSR gate — LEDC slow PWM output.
pub const HEATER_SSR_GPIO: i32 = 12;

/// Recirculation pump relay (active high).
pub const PUMP_RELAY_GPIO: i32 = 13;

/// ADC1 channel number for the kettle thermistor (GPIO9 on the S3).
pub const ADC1_CH_KETTLE_TEMP: u32 = 8;
