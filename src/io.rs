//! Button and buzzer adapters over the claimed GPIO lines.

use std::thread;
use std::time::Duration;

use crossbeam_channel::Receiver;
use tracing::{debug, warn};

use crate::errors::{ReadError, Reading};
use crate::manager::HandleManager;

/// Outcome of a bounded button wait, distinct from the unavailable case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Pressed,
    Cancelled,
}

#[derive(Debug, Default)]
pub struct Button;

impl Button {
    pub fn new() -> Self {
        Self
    }

    /// Level poll of the button line.
    ///
    /// Convention: an absent or failing line reads as **not pressed**. The
    /// claim is active-low, so a pressed (pulled-down) button reads `true`
    /// here without callers knowing the wiring polarity.
    pub fn is_pressed(&self, rig: &mut HandleManager) -> bool {
        let Some(pins) = rig.pins_mut() else {
            return false;
        };
        match pins.button.level() {
            Ok(level) => level,
            Err(e) => {
                debug!("[button] level read failed: {}", e);
                false
            }
        }
    }

    /// Polls the button at the configured interval until pressed or until
    /// the cancellation signal fires.
    ///
    /// Callers without a cancellation source pass
    /// `&crossbeam_channel::never()`; a deadline is
    /// `&crossbeam_channel::after(timeout)`. Returns within one poll
    /// interval of the signal. `Unavailable` immediately when no handle is
    /// present, so a missing button never blocks the caller.
    pub fn wait_for_press<T>(
        &self,
        rig: &mut HandleManager,
        cancel: &Receiver<T>,
    ) -> Reading<WaitOutcome> {
        let interval = rig.config().poll_interval();
        if rig.pins_mut().is_none() {
            return Err(ReadError::Unavailable);
        }

        loop {
            if cancel.try_recv().is_ok() {
                return Ok(WaitOutcome::Cancelled);
            }
            if self.is_pressed(rig) {
                return Ok(WaitOutcome::Pressed);
            }
            thread::sleep(interval);
        }
    }
}

#[derive(Debug, Default)]
pub struct Buzzer;

impl Buzzer {
    pub fn new() -> Self {
        Self
    }

    /// Drives the buzzer line high for `duration`, then low. Silent no-op
    /// when the line is unavailable; line faults are logged, not raised.
    pub fn beep(&self, rig: &mut HandleManager, duration: Duration) {
        let Some(pins) = rig.pins_mut() else {
            debug!("[buzzer] unavailable, skipping beep");
            return;
        };
        if let Err(e) = pins.buzzer.set_level(true) {
            warn!("[buzzer] failed to drive line: {}", e);
            return;
        }
        thread::sleep(duration);
        if let Err(e) = pins.buzzer.set_level(false) {
            warn!("[buzzer] failed to release line: {}", e);
        }
    }
}
