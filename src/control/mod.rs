//! Closed-loop heater control.

pub mod heater;
pub mod pid;
