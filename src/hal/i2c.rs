//! SMBus register access over the Linux I2C character device.

#[cfg(target_os = "linux")]
use i2cdev::core::I2CDevice;
#[cfg(target_os = "linux")]
use i2cdev::linux::LinuxI2CDevice;

use crate::errors::{HalError, HalResult};
#[cfg(target_os = "linux")]
use crate::errors::ReadError;
use crate::hal::I2cRegisters;

#[cfg(target_os = "linux")]
pub struct SmbusRegisters {
    device: LinuxI2CDevice,
}

#[cfg(target_os = "linux")]
impl SmbusRegisters {
    pub fn open(bus: u8) -> HalResult<Self> {
        let path = format!("/dev/i2c-{}", bus);
        // Slave address is selected per transfer.
        let device = LinuxI2CDevice::new(&path, 0).map_err(|e| HalError::BusOpen {
            bus,
            reason: e.to_string(),
        })?;
        Ok(Self { device })
    }

    fn select(&mut self, addr: u16) -> Result<(), ReadError> {
        self.device
            .set_slave_address(addr)
            .map_err(|e| ReadError::Transient(e.to_string()))
    }
}

#[cfg(target_os = "linux")]
impl I2cRegisters for SmbusRegisters {
    fn read_word(&mut self, addr: u16, reg: u8) -> Result<u16, ReadError> {
        self.select(addr)?;
        self.device
            .smbus_read_word_data(reg)
            .map_err(|e| ReadError::Transient(e.to_string()))
    }

    fn read_block(&mut self, addr: u16, reg: u8, buf: &mut [u8]) -> Result<(), ReadError> {
        self.select(addr)?;
        let data = self
            .device
            .smbus_read_i2c_block_data(reg, buf.len() as u8)
            .map_err(|e| ReadError::Transient(e.to_string()))?;
        if data.len() < buf.len() {
            return Err(ReadError::Transient(format!(
                "short block read: wanted {}, got {}",
                buf.len(),
                data.len()
            )));
        }
        buf.copy_from_slice(&data[..buf.len()]);
        Ok(())
    }

    fn write_byte(&mut self, addr: u16, reg: u8, value: u8) -> Result<(), ReadError> {
        self.select(addr)?;
        self.device
            .smbus_write_byte_data(reg, value)
            .map_err(|e| ReadError::Transient(e.to_string()))
    }
}

#[cfg(not(target_os = "linux"))]
pub struct SmbusRegisters;

#[cfg(not(target_os = "linux"))]
impl SmbusRegisters {
    pub fn open(_bus: u8) -> HalResult<Self> {
        Err(HalError::UnsupportedPlatform)
    }
}

#[cfg(not(target_os = "linux"))]
impl I2cRegisters for SmbusRegisters {
    fn read_word(&mut self, _addr: u16, _reg: u8) -> Result<u16, crate::errors::ReadError> {
        Err(crate::errors::ReadError::Unavailable)
    }

    fn read_block(
        &mut self,
        _addr: u16,
        _reg: u8,
        _buf: &mut [u8],
    ) -> Result<(), crate::errors::ReadError> {
        Err(crate::errors::ReadError::Unavailable)
    }

    fn write_byte(
        &mut self,
        _addr: u16,
        _reg: u8,
        _value: u8,
    ) -> Result<(), crate::errors::ReadError> {
        Err(crate::errors::ReadError::Unavailable)
    }
}
