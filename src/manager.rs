//! Peripheral handle lifecycle: open, claim, recover, release.

use std::thread;

use tracing::{debug, error, info, warn};

use crate::config::RigConfig;
use crate::errors::{HalError, HalResult};
use crate::hal::cdev::CdevGpio;
use crate::hal::i2c::SmbusRegisters;
use crate::hal::{GpioBackend, I2cRegisters, InputLine, OutputLine, PeripheralFactory};

/// Lifecycle state of the handle manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    /// No handles open. Initial state, and the state after `cleanup()`.
    Closed,
    /// GPIO chip open and all pins claimed. I2C may still be absent; the
    /// affected adapters degrade individually.
    Initialized,
    /// Both the first attempt and the single retry failed. All dependent
    /// adapters report `Unavailable` until a later `initialize()` succeeds.
    Degraded,
}

/// The fixed pin claims the rig needs. Dropping the set releases the claims.
pub struct PinSet {
    pub trigger: Box<dyn OutputLine>,
    pub echo: Box<dyn InputLine>,
    pub buzzer: Box<dyn OutputLine>,
    pub button: Box<dyn InputLine>,
}

/// Owns the GPIO chip handle, the pin claims and the I2C bus handle.
///
/// Adapters borrow handles through [`pins_mut`](HandleManager::pins_mut) and
/// [`i2c_mut`](HandleManager::i2c_mut) per call and never close anything
/// themselves. Single-threaded use only; callers serialize access.
pub struct HandleManager {
    config: RigConfig,
    factory: Box<dyn PeripheralFactory>,
    state: ManagerState,
    gpio: Option<Box<dyn GpioBackend>>,
    pins: Option<PinSet>,
    i2c: Option<Box<dyn I2cRegisters>>,
}

/// Default factory opening the real Linux character devices.
pub struct SystemFactory {
    gpio_chip: u32,
    i2c_bus: u8,
}

impl SystemFactory {
    pub fn new(config: &RigConfig) -> Self {
        Self {
            gpio_chip: config.gpio_chip,
            i2c_bus: config.i2c_bus,
        }
    }
}

impl PeripheralFactory for SystemFactory {
    fn open_gpio(&mut self) -> HalResult<Box<dyn GpioBackend>> {
        Ok(Box::new(CdevGpio::open(self.gpio_chip)?))
    }

    fn open_i2c(&mut self) -> HalResult<Box<dyn I2cRegisters>> {
        Ok(Box::new(SmbusRegisters::open(self.i2c_bus)?))
    }
}

impl HandleManager {
    pub fn new(config: RigConfig, factory: Box<dyn PeripheralFactory>) -> Self {
        Self {
            config,
            factory,
            state: ManagerState::Closed,
            gpio: None,
            pins: None,
            i2c: None,
        }
    }

    /// Manager over the real `/dev/gpiochipN` and `/dev/i2c-N` devices.
    pub fn with_system(config: RigConfig) -> Self {
        let factory = Box::new(SystemFactory::new(&config));
        Self::new(config, factory)
    }

    /// Opens the chip/bus handles and claims the fixed pin set.
    ///
    /// On failure this cleans up, waits `retry_delay_ms` (default 500 ms)
    /// and retries exactly once; a second failure leaves the manager
    /// `Degraded` rather than failing the process. Calling this again on a
    /// degraded manager is the recovery path.
    pub fn initialize(&mut self) -> ManagerState {
        let recovering = self.state == ManagerState::Degraded;
        // Release anything a previous attempt (or a previous process run)
        // left claimed before re-claiming.
        self.cleanup();

        match self.try_open() {
            Ok(()) => {
                self.state = ManagerState::Initialized;
                if recovering {
                    info!("[manager] recovered, handles reacquired");
                } else {
                    info!("[manager] initialized");
                }
            }
            Err(e) => {
                warn!("[manager] initialization failed: {}, retrying once", e);
                self.cleanup();
                thread::sleep(self.config.retry_delay());
                match self.try_open() {
                    Ok(()) => {
                        self.state = ManagerState::Initialized;
                        info!("[manager] initialized after retry");
                    }
                    Err(e2) => {
                        self.cleanup();
                        self.state = ManagerState::Degraded;
                        error!(
                            "[manager] degraded: {}",
                            HalError::InitExhausted(e2.to_string())
                        );
                    }
                }
            }
        }
        self.state
    }

    fn try_open(&mut self) -> HalResult<()> {
        let mut gpio = self.factory.open_gpio()?;
        let pins = PinSet {
            trigger: gpio.claim_output(self.config.pins.trigger, "rig-hal-trigger")?,
            echo: gpio.claim_input(self.config.pins.echo, false, "rig-hal-echo")?,
            buzzer: gpio.claim_output(self.config.pins.buzzer, "rig-hal-buzzer")?,
            // Pulled-up button reads active-low.
            button: gpio.claim_input(self.config.pins.button, true, "rig-hal-button")?,
        };
        self.gpio = Some(gpio);
        self.pins = Some(pins);

        // An absent I2C bus is not an initialization failure; the thermal
        // and color adapters degrade on their own.
        match self.factory.open_i2c() {
            Ok(bus) => self.i2c = Some(bus),
            Err(e) => {
                warn!("[manager] I2C bus unavailable: {}", e);
                self.i2c = None;
            }
        }
        Ok(())
    }

    /// Releases every claim and handle. Idempotent, safe before
    /// `initialize()` and safe to call any number of times.
    pub fn cleanup(&mut self) {
        let had_handles = self.pins.is_some() || self.gpio.is_some() || self.i2c.is_some();
        // Claims must go before the chip handle that issued them.
        self.pins = None;
        self.gpio = None;
        self.i2c = None;
        self.state = ManagerState::Closed;
        if had_handles {
            info!("[manager] cleaned up, handles released");
        } else {
            debug!("[manager] cleanup with nothing to release");
        }
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    /// Pin claims, or `None` when closed or degraded.
    pub fn pins_mut(&mut self) -> Option<&mut PinSet> {
        self.pins.as_mut()
    }

    /// I2C bus handle, or `None` when the bus is absent or the manager is
    /// closed or degraded.
    pub fn i2c_mut(&mut self) -> Option<&mut dyn I2cRegisters> {
        self.i2c.as_mut().map(|b| b.as_mut() as &mut dyn I2cRegisters)
    }

    pub fn config(&self) -> &RigConfig {
        &self.config
    }
}

impl Drop for HandleManager {
    fn drop(&mut self) {
        self.cleanup();
    }
}
