//! MLX90614 IR thermometer adapter.

use crate::errors::{ReadError, Reading};
use crate::filter::round_to;
use crate::manager::HandleManager;
use crate::sensors::SensorAdapter;

// MLX90614 RAM cells.
const RAM_T_AMBIENT: u8 = 0x06;
const RAM_T_OBJECT1: u8 = 0x07;

/// Fixed pair reported when thermal simulation is configured.
const SIMULATED_TEMP_C: f64 = 25.0;

/// Ambient plus object temperature in °C, rounded to 2 decimals.
///
/// `simulated` is set only on the fixed fallback pair, so callers can always
/// tell a real measurement from the no-bus default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalReading {
    pub ambient: f64,
    pub object: f64,
    pub simulated: bool,
}

pub struct ThermalSensor {
    address: u16,
}

impl ThermalSensor {
    pub fn new(address: u16) -> Self {
        Self { address }
    }

    fn convert(raw: u16) -> f64 {
        // 0.02 K per LSB, reported in °C.
        round_to(f64::from(raw) * 0.02 - 273.15, 2)
    }
}

impl SensorAdapter for ThermalSensor {
    type Output = ThermalReading;

    /// One ambient/object pair. A transient bus failure is reported as-is
    /// without retry; the caller picks its own retry cadence. With no I2C
    /// handle the reading is `Unavailable`, unless thermal simulation is
    /// configured, in which case a tagged fixed pair is returned.
    fn read(&self, rig: &mut HandleManager) -> Reading<ThermalReading> {
        let simulate = rig.config().simulate_thermal;
        let bus = match rig.i2c_mut() {
            Some(bus) => bus,
            None if simulate => {
                return Ok(ThermalReading {
                    ambient: SIMULATED_TEMP_C,
                    object: SIMULATED_TEMP_C,
                    simulated: true,
                })
            }
            None => return Err(ReadError::Unavailable),
        };

        let ambient_raw = bus.read_word(self.address, RAM_T_AMBIENT)?;
        let object_raw = bus.read_word(self.address, RAM_T_OBJECT1)?;
        Ok(ThermalReading {
            ambient: Self::convert(ambient_raw),
            object: Self::convert(object_raw),
            simulated: false,
        })
    }
}
