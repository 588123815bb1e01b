//! Small fixed-point control toolkit for microcontrollers: Q16.16 arithmetic,
//! cyclic timers, first-order and moving-average filters, linear ramps and a
//! few peripheral drivers built on top of them.
//!
//! Nothing in here owns a clock. Time-dependent calls take the current
//! millisecond counter as `now`.
#![cfg_attr(not(feature = "std"), no_std)]

// must stay first so the logging macros are visible everywhere
mod fmt;

pub mod config;
pub mod first_order;
pub mod fix;
pub mod moving_average;
pub mod mqtt;
pub mod ramp;
pub mod servo;
pub mod telemetry;
pub mod timer;
pub mod types;
pub mod wifi;

pub use first_order::{FilterMode, FirstOrderFilter};
pub use moving_average::MovingAverageFilter;
pub use mqtt::MqttSession;
pub use ramp::LinearRamp;
pub use servo::Servo;
pub use telemetry::Telemetry;
pub use timer::CyclicTimer;
pub use types::{Degrees, Fix, Millis, Rate};
pub use wifi::WifiStation;
