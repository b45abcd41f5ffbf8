//! Backend seams for peripheral access.
//!
//! The manager and adapters only ever talk to these traits. The Linux
//! character-device implementations live in [`cdev`] and [`i2c`]; tests
//! inject scripted fakes through the same [`PeripheralFactory`] seam.

pub mod cdev;
pub mod i2c;

use crate::errors::{HalResult, ReadError};

/// A claimed output line. Dropping the value releases the claim.
pub trait OutputLine: Send {
    fn set_level(&mut self, high: bool) -> Result<(), ReadError>;
}

/// A claimed input line. Dropping the value releases the claim.
pub trait InputLine: Send {
    fn level(&mut self) -> Result<bool, ReadError>;
}

/// An open GPIO chip handle that can hand out line claims.
///
/// Pull bias is board-level wiring; the claim seam models the logical
/// polarity instead (`active_low` for pulled-up inputs such as the button,
/// so `level() == true` always means "asserted").
pub trait GpioBackend: Send {
    fn claim_output(&mut self, pin: u32, consumer: &str) -> HalResult<Box<dyn OutputLine>>;

    fn claim_input(
        &mut self,
        pin: u32,
        active_low: bool,
        consumer: &str,
    ) -> HalResult<Box<dyn InputLine>>;
}

/// SMBus-style register access on an open I2C bus handle.
pub trait I2cRegisters: Send {
    fn read_word(&mut self, addr: u16, reg: u8) -> Result<u16, ReadError>;
    fn read_block(&mut self, addr: u16, reg: u8, buf: &mut [u8]) -> Result<(), ReadError>;
    fn write_byte(&mut self, addr: u16, reg: u8, value: u8) -> Result<(), ReadError>;
}

/// Opens fresh chip/bus handles. The manager goes back to the factory on
/// every (re-)initialization, so recovery is a plain close-then-reopen.
pub trait PeripheralFactory: Send {
    fn open_gpio(&mut self) -> HalResult<Box<dyn GpioBackend>>;
    fn open_i2c(&mut self) -> HalResult<Box<dyn I2cRegisters>>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Output line that records every level written to it.
    pub struct RecordingOutput {
        pub writes: Arc<Mutex<Vec<bool>>>,
    }

    impl OutputLine for RecordingOutput {
        fn set_level(&mut self, high: bool) -> Result<(), ReadError> {
            self.writes.lock().unwrap().push(high);
            Ok(())
        }
    }

    /// Input line that drains a shared level script, then idles low.
    pub struct ScriptedInput(pub Arc<Mutex<VecDeque<bool>>>);

    impl InputLine for ScriptedInput {
        fn level(&mut self) -> Result<bool, ReadError> {
            Ok(self.0.lock().unwrap().pop_front().unwrap_or(false))
        }
    }

    /// Input line whose level is shared with the test body.
    pub struct SharedInput(pub Arc<AtomicBool>);

    impl InputLine for SharedInput {
        fn level(&mut self) -> Result<bool, ReadError> {
            Ok(self.0.load(Ordering::SeqCst))
        }
    }

    /// GPIO backend handing out recording outputs, a scriptable echo line
    /// and a test-controlled button line.
    pub struct FakeGpio {
        pub trigger_writes: Arc<Mutex<Vec<bool>>>,
        pub buzzer_writes: Arc<Mutex<Vec<bool>>>,
        pub echo_levels: Arc<Mutex<VecDeque<bool>>>,
        pub button_level: Arc<AtomicBool>,
    }

    impl Default for FakeGpio {
        fn default() -> Self {
            Self {
                trigger_writes: Arc::new(Mutex::new(Vec::new())),
                buzzer_writes: Arc::new(Mutex::new(Vec::new())),
                echo_levels: Arc::new(Mutex::new(VecDeque::new())),
                button_level: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl GpioBackend for FakeGpio {
        fn claim_output(&mut self, _pin: u32, consumer: &str) -> HalResult<Box<dyn OutputLine>> {
            let writes = if consumer.contains("buzzer") {
                self.buzzer_writes.clone()
            } else {
                self.trigger_writes.clone()
            };
            Ok(Box::new(RecordingOutput { writes }))
        }

        fn claim_input(
            &mut self,
            _pin: u32,
            active_low: bool,
            consumer: &str,
        ) -> HalResult<Box<dyn InputLine>> {
            if consumer.contains("button") {
                assert!(active_low, "button must be claimed active-low");
                Ok(Box::new(SharedInput(self.button_level.clone())))
            } else {
                Ok(Box::new(ScriptedInput(self.echo_levels.clone())))
            }
        }
    }

    /// Register map shared between a fake bus and the test body.
    #[derive(Default)]
    pub struct FakeRegisterMap {
        pub words: std::collections::HashMap<(u16, u8), u16>,
        pub blocks: std::collections::HashMap<(u16, u8), Vec<u8>>,
        pub written: Vec<(u16, u8, u8)>,
        /// When set, every access fails with `Transient`.
        pub failing: bool,
    }

    pub struct FakeI2c(pub Arc<Mutex<FakeRegisterMap>>);

    impl I2cRegisters for FakeI2c {
        fn read_word(&mut self, addr: u16, reg: u8) -> Result<u16, ReadError> {
            let map = self.0.lock().unwrap();
            if map.failing {
                return Err(ReadError::Transient("fake bus failure".to_string()));
            }
            map.words
                .get(&(addr, reg))
                .copied()
                .ok_or_else(|| ReadError::Transient(format!("no word at {:#04x}/{:#04x}", addr, reg)))
        }

        fn read_block(&mut self, addr: u16, reg: u8, buf: &mut [u8]) -> Result<(), ReadError> {
            let map = self.0.lock().unwrap();
            if map.failing {
                return Err(ReadError::Transient("fake bus failure".to_string()));
            }
            let block = map
                .blocks
                .get(&(addr, reg))
                .ok_or_else(|| ReadError::Transient(format!("no block at {:#04x}/{:#04x}", addr, reg)))?;
            if block.len() < buf.len() {
                return Err(ReadError::Transient(format!(
                    "short block read: wanted {}, got {}",
                    buf.len(),
                    block.len()
                )));
            }
            buf.copy_from_slice(&block[..buf.len()]);
            Ok(())
        }

        fn write_byte(&mut self, addr: u16, reg: u8, value: u8) -> Result<(), ReadError> {
            let mut map = self.0.lock().unwrap();
            if map.failing {
                return Err(ReadError::Transient("fake bus failure".to_string()));
            }
            map.written.push((addr, reg, value));
            Ok(())
        }
    }

    /// Factory with a scripted number of leading GPIO failures, to exercise
    /// the manager's busy-pin recovery path.
    pub struct FakeFactory {
        pub gpio_failures: AtomicUsize,
        pub i2c_available: bool,
        pub gpio: Arc<Mutex<Option<FakeGpioHandles>>>,
        pub registers: Arc<Mutex<FakeRegisterMap>>,
        pub opens: Arc<AtomicUsize>,
    }

    /// Shared ends of the most recently opened fake GPIO backend.
    pub struct FakeGpioHandles {
        pub trigger_writes: Arc<Mutex<Vec<bool>>>,
        pub buzzer_writes: Arc<Mutex<Vec<bool>>>,
        pub echo_levels: Arc<Mutex<VecDeque<bool>>>,
        pub button_level: Arc<AtomicBool>,
    }

    impl FakeFactory {
        pub fn new() -> Self {
            Self {
                gpio_failures: AtomicUsize::new(0),
                i2c_available: true,
                gpio: Arc::new(Mutex::new(None)),
                registers: Arc::new(Mutex::new(FakeRegisterMap::default())),
                opens: Arc::new(AtomicUsize::new(0)),
            }
        }

        /// Shared open-attempt counter, usable after the factory is boxed.
        pub fn opens(&self) -> Arc<AtomicUsize> {
            self.opens.clone()
        }

        /// Shared ends of the fake GPIO handles, usable after boxing.
        pub fn handles(&self) -> Arc<Mutex<Option<FakeGpioHandles>>> {
            self.gpio.clone()
        }

        /// Shared register map, usable after boxing.
        pub fn register_map(&self) -> Arc<Mutex<FakeRegisterMap>> {
            self.registers.clone()
        }

        pub fn failing_first(n: usize) -> Self {
            let f = Self::new();
            f.gpio_failures.store(n, Ordering::SeqCst);
            f
        }

        pub fn without_i2c() -> Self {
            let mut f = Self::new();
            f.i2c_available = false;
            f
        }
    }

    impl PeripheralFactory for FakeFactory {
        fn open_gpio(&mut self) -> HalResult<Box<dyn GpioBackend>> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            let remaining = self.gpio_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.gpio_failures.store(remaining - 1, Ordering::SeqCst);
                return Err(crate::errors::HalError::ChipOpen {
                    chip: 0,
                    reason: "Device or resource busy".to_string(),
                });
            }
            let gpio = FakeGpio::default();
            *self.gpio.lock().unwrap() = Some(FakeGpioHandles {
                trigger_writes: gpio.trigger_writes.clone(),
                buzzer_writes: gpio.buzzer_writes.clone(),
                echo_levels: gpio.echo_levels.clone(),
                button_level: gpio.button_level.clone(),
            });
            Ok(Box::new(gpio))
        }

        fn open_i2c(&mut self) -> HalResult<Box<dyn I2cRegisters>> {
            if self.i2c_available {
                Ok(Box::new(FakeI2c(self.registers.clone())))
            } else {
                Err(crate::errors::HalError::BusOpen {
                    bus: 1,
                    reason: "No such file or directory".to_string(),
                })
            }
        }
    }
}
