//! Concrete port implementations.
//!
//! Each adapter binds one or more domain port traits to a real backend:
//! peripherals ([`hardware`]), NVS flash ([`nvs`]), the system wall clock
//! ([`time`]) and the log output ([`log_sink`]). Nothing above this layer
//! touches ESP-IDF directly.

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;

pub use hardware::HardwareAdapter;
pub use log_sink::LogEventSink;
pub use nvs::NvsAdapter;
pub use time::SystemClock;
