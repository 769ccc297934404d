//! Turns an hourly green-power-index forecast into retained MQTT signals
//! (current value, day-window extremes, best contiguous windows, ranked
//! best hours) and keeps them fresh on an hour-aligned refresh schedule.

pub mod config;
pub mod cycle;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod publish;
pub mod scheduler;
pub mod stats;
pub mod telemetry;
