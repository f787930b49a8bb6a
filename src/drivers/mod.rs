//! Low-level peripheral drivers.
//!
//! Everything below this module is a dumb actuator or raw peripheral
//! access; policy (when to heat, when to pump) lives in the application
//! core behind port traits.

pub mod heater;
pub mod hw_init;
pub mod hw_timer;
pub mod pump;
