//! GPIO backend over the Linux character device (`/dev/gpiochipN`).

#[cfg(target_os = "linux")]
use gpio_cdev::{Chip, LineHandle, LineRequestFlags};

use crate::errors::{HalError, HalResult};
#[cfg(target_os = "linux")]
use crate::errors::ReadError;
use crate::hal::{GpioBackend, InputLine, OutputLine};

#[cfg(target_os = "linux")]
pub struct CdevGpio {
    chip: Chip,
    chip_index: u32,
}

#[cfg(target_os = "linux")]
impl CdevGpio {
    pub fn open(chip_index: u32) -> HalResult<Self> {
        let path = format!("/dev/gpiochip{}", chip_index);
        let chip = Chip::new(&path).map_err(|e| HalError::ChipOpen {
            chip: chip_index,
            reason: e.to_string(),
        })?;
        Ok(Self { chip, chip_index })
    }
}

#[cfg(target_os = "linux")]
struct CdevLine(LineHandle);

#[cfg(target_os = "linux")]
impl OutputLine for CdevLine {
    fn set_level(&mut self, high: bool) -> Result<(), ReadError> {
        self.0
            .set_value(u8::from(high))
            .map_err(|e| ReadError::Transient(e.to_string()))
    }
}

#[cfg(target_os = "linux")]
impl InputLine for CdevLine {
    fn level(&mut self) -> Result<bool, ReadError> {
        let v = self
            .0
            .get_value()
            .map_err(|e| ReadError::Transient(e.to_string()))?;
        Ok(v != 0)
    }
}

#[cfg(target_os = "linux")]
impl GpioBackend for CdevGpio {
    fn claim_output(&mut self, pin: u32, consumer: &str) -> HalResult<Box<dyn OutputLine>> {
        let line = self.chip.get_line(pin).map_err(|e| HalError::PinClaim {
            pin,
            direction: "output",
            reason: e.to_string(),
        })?;
        let handle = line
            .request(LineRequestFlags::OUTPUT, 0, consumer)
            .map_err(|e| HalError::PinClaim {
                pin,
                direction: "output",
                reason: e.to_string(),
            })?;
        tracing::debug!(
            "[gpio] claimed pin {} as output on chip {}",
            pin,
            self.chip_index
        );
        Ok(Box::new(CdevLine(handle)))
    }

    fn claim_input(
        &mut self,
        pin: u32,
        active_low: bool,
        consumer: &str,
    ) -> HalResult<Box<dyn InputLine>> {
        let line = self.chip.get_line(pin).map_err(|e| HalError::PinClaim {
            pin,
            direction: "input",
            reason: e.to_string(),
        })?;
        let mut flags = LineRequestFlags::INPUT;
        if active_low {
            flags |= LineRequestFlags::ACTIVE_LOW;
        }
        let handle = line
            .request(flags, 0, consumer)
            .map_err(|e| HalError::PinClaim {
                pin,
                direction: "input",
                reason: e.to_string(),
            })?;
        tracing::debug!(
            "[gpio] claimed pin {} as input on chip {}",
            pin,
            self.chip_index
        );
        Ok(Box::new(CdevLine(handle)))
    }
}

/// Non-Linux builds keep the type so the crate compiles, but every open fails.
#[cfg(not(target_os = "linux"))]
pub struct CdevGpio;

#[cfg(not(target_os = "linux"))]
impl CdevGpio {
    pub fn open(_chip_index: u32) -> HalResult<Self> {
        Err(HalError::UnsupportedPlatform)
    }
}

#[cfg(not(target_os = "linux"))]
impl GpioBackend for CdevGpio {
    fn claim_output(&mut self, _pin: u32, _consumer: &str) -> HalResult<Box<dyn OutputLine>> {
        Err(HalError::UnsupportedPlatform)
    }

    fn claim_input(
        &mut self,
        _pin: u32,
        _active_low: bool,
        _consumer: &str,
    ) -> HalResult<Box<dyn InputLine>> {
        Err(HalError::UnsupportedPlatform)
    }
}
