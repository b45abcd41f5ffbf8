//! Hardware abstraction layer for a small GPIO/I2C sensing rig: an HC-SR04
//! rangefinder, an IR thermometer, an RGB color sensor, a button, a buzzer
//! and a small status display.
//!
//! The crate's job is to keep an application running with partial or no
//! hardware present. The [`manager::HandleManager`] owns every chip/bus
//! handle and pin claim, recovers once from busy-handle failures and
//! degrades instead of failing; the adapters in [`sensors`], [`io`] and
//! [`display`] borrow those handles per call and turn every fault into a
//! tagged [`errors::Reading`] instead of a panic or a sentinel value.
//!
//! Single-threaded by design: callers serialize access to the manager, and
//! every blocking wait in the crate is bounded.

pub mod config;
pub mod display;
pub mod errors;
pub mod filter;
pub mod hal;
pub mod io;
pub mod manager;
pub mod sensors;

pub use config::RigConfig;
pub use display::{DisplayFrame, StatusDisplay};
pub use errors::{ReadError, Reading};
pub use filter::FilteredDistance;
pub use io::{Button, Buzzer, WaitOutcome};
pub use manager::{HandleManager, ManagerState};
pub use sensors::{ColorSensor, DistanceSensor, SensorAdapter, ThermalSensor};
