//! TCS34725 RGB color sensor adapter.

use std::fmt;

use crate::errors::{ReadError, Reading};
use crate::filter::round_to;
use crate::manager::HandleManager;
use crate::sensors::SensorAdapter;

// TCS34725 registers; every access sets the command bit.
const COMMAND_BIT: u8 = 0x80;
const REG_ENABLE: u8 = 0x00;
const REG_CDATAL: u8 = 0x14;

const ENABLE_PON: u8 = 0x01;
const ENABLE_AEN: u8 = 0x02;

/// Categorical label derived from the scaled RGB bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorLabel {
    White,
    Black,
    Red,
    Green,
    Blue,
    Yellow,
    Unknown,
}

impl fmt::Display for ColorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorLabel::White => "White",
            ColorLabel::Black => "Black",
            ColorLabel::Red => "Red",
            ColorLabel::Green => "Green",
            ColorLabel::Blue => "Blue",
            ColorLabel::Yellow => "Yellow",
            ColorLabel::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Priority-ordered labeling, first match wins.
///
/// The order is load-bearing: the Yellow rule is reachable only when no
/// channel is strictly dominant (e.g. red and green tied above 100), because
/// the dominant-channel rules fire first.
pub fn classify_color(r: u8, g: u8, b: u8) -> ColorLabel {
    if r > 200 && g > 200 && b > 200 {
        ColorLabel::White
    } else if r < 30 && g < 30 && b < 30 {
        ColorLabel::Black
    } else if r > g && r > b {
        ColorLabel::Red
    } else if g > r && g > b {
        ColorLabel::Green
    } else if b > r && b > g {
        ColorLabel::Blue
    } else if r > 100 && g > 100 && b < 50 {
        ColorLabel::Yellow
    } else {
        ColorLabel::Unknown
    }
}

/// Raw channel data plus derived values from one integration cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorReading {
    /// Channel bytes scaled against the clear channel, 0-255.
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Raw 16-bit clear-channel count.
    pub clear: u16,
    /// Correlated color temperature in K (McCamy), when computable.
    pub color_temp: Option<f64>,
    /// Illuminance estimate in lux, when non-negative.
    pub lux: Option<f64>,
    pub label: ColorLabel,
}

pub struct ColorSensor {
    address: u16,
}

impl ColorSensor {
    pub fn new(address: u16) -> Self {
        Self { address }
    }

    /// Powers the device up and enables the RGBC ADC. Run once after the
    /// manager initializes; reads on a never-enabled device return zeros.
    pub fn init(&self, rig: &mut HandleManager) -> Reading<()> {
        let bus = rig.i2c_mut().ok_or(ReadError::Unavailable)?;
        bus.write_byte(self.address, COMMAND_BIT | REG_ENABLE, ENABLE_PON)?;
        bus.write_byte(
            self.address,
            COMMAND_BIT | REG_ENABLE,
            ENABLE_PON | ENABLE_AEN,
        )?;
        Ok(())
    }

    fn derive(red: u16, green: u16, blue: u16) -> (Option<f64>, Option<f64>) {
        let (r, g, b) = (f64::from(red), f64::from(green), f64::from(blue));

        // DN40-style channel weighting.
        let illuminance = -0.32466 * r + 1.57837 * g - 0.73191 * b;
        let lux = (illuminance > 0.0).then(|| round_to(illuminance, 1));

        let x = -0.14282 * r + 1.54924 * g - 0.95641 * b;
        let y = illuminance;
        let z = -0.68202 * r + 0.77073 * g + 0.56332 * b;
        let sum = x + y + z;
        let color_temp = if sum > 0.0 && y > 0.0 {
            let xc = x / sum;
            let yc = y / sum;
            let n = (xc - 0.3320) / (0.1858 - yc);
            let cct = 449.0 * n.powi(3) + 3525.0 * n.powi(2) + 6823.3 * n + 5520.33;
            (cct.is_finite() && cct > 0.0).then(|| round_to(cct, 0))
        } else {
            None
        };
        (color_temp, lux)
    }

    fn scale(channel: u16, clear: u16) -> u8 {
        if clear == 0 {
            return 0;
        }
        let scaled = f64::from(channel) / f64::from(clear) * 255.0;
        scaled.min(255.0) as u8
    }
}

impl SensorAdapter for ColorSensor {
    type Output = ColorReading;

    /// One RGBC readout. `Unavailable` when no I2C handle exists; a failed
    /// transfer is `Transient`, never an error label.
    fn read(&self, rig: &mut HandleManager) -> Reading<ColorReading> {
        let bus = rig.i2c_mut().ok_or(ReadError::Unavailable)?;

        // Clear, red, green, blue as consecutive little-endian words.
        let mut data = [0u8; 8];
        bus.read_block(self.address, COMMAND_BIT | REG_CDATAL, &mut data)?;
        let clear = u16::from_le_bytes([data[0], data[1]]);
        let red = u16::from_le_bytes([data[2], data[3]]);
        let green = u16::from_le_bytes([data[4], data[5]]);
        let blue = u16::from_le_bytes([data[6], data[7]]);

        let (r, g, b) = (
            Self::scale(red, clear),
            Self::scale(green, clear),
            Self::scale(blue, clear),
        );
        let (color_temp, lux) = Self::derive(red, green, blue);

        Ok(ColorReading {
            r,
            g,
            b,
            clear,
            color_temp,
            lux,
            label: classify_color(r, g, b),
        })
    }
}
