pub mod color;
pub mod distance;
pub mod thermal;

use crate::errors::Reading;
use crate::manager::HandleManager;

/// Uniform read contract shared by the sensor adapters.
///
/// Adapters hold no handles of their own; every read borrows the manager's
/// handles for the duration of the call. A failure is always a tagged
/// `ReadError`, never a sentinel value and never a panic.
pub trait SensorAdapter {
    type Output;

    fn read(&self, rig: &mut HandleManager) -> Reading<Self::Output>;
}

pub use color::{classify_color, ColorLabel, ColorReading, ColorSensor};
pub use distance::{classify_absorption, Absorption, DistanceSensor};
pub use thermal::{ThermalReading, ThermalSensor};
