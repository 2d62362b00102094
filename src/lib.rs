#![cfg_attr(not(feature = "std"), no_std)]
#![allow(dead_code)]
//! Driver for a two-channel NTC thermistor sensor module.
//!
//! Each channel periodically triggers an analog conversion through a shared
//! front end, converts the raw code into a calibrated temperature via a
//! precomputed lookup table, and notifies a registered monitor. The analog
//! front end, the cooperative scheduler and the module bias control are
//! external collaborators expressed as traits, so the driver runs unchanged
//! against real hardware or against the test doubles in [`testutil`].
//!
//! # Example
//!
//! With `Afe`, `Timer` and `Module` implementing the collaborator traits for
//! the target board:
//!
//! ```
//! use embassy_time::Duration;
//! use static_cell::StaticCell;
//! use thermistor_module::{SensorChannel, Thermistor, ThermistorEvent, ThermistorMonitor};
//!
//! struct Console;
//!
//! impl ThermistorMonitor for Console {
//!     fn on_event(&self, channel: SensorChannel, event: ThermistorEvent) {
//!         // react to Update / Error for the channel
//!     }
//! }
//!
//! static DRIVER: StaticCell<Thermistor<Afe, Timer, Module>> = StaticCell::new();
//! static CONSOLE: Console = Console;
//!
//! fn bring_up(afe: &'static Afe, timer: &'static Timer, module: &'static Module) {
//!     let driver = DRIVER.init(Thermistor::new(afe, timer, module));
//!     driver.init(SensorChannel::A).unwrap();
//!     driver.set_event_handler(SensorChannel::A, &CONSOLE);
//!     driver.set_update_interval(SensorChannel::A, Some(Duration::from_secs(1)));
//! }
//! ```

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod domain;

pub mod drivers;

pub mod traits;

#[cfg(feature = "std")]
pub mod testutil;

pub use drivers::sensors::thermistor::{
    Thermistor, ThermistorError, ThermistorEvent, ThermistorMonitor,
};
pub use traits::sensor_module::{Pull, SensorChannel};
