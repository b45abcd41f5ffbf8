//! HC-SR04 ultrasonic rangefinder adapter.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::errors::{ReadError, Reading};
use crate::filter::{filter_samples, FilteredDistance};
use crate::manager::HandleManager;
use crate::sensors::SensorAdapter;

/// Trigger pulse width required by the HC-SR04 datasheet.
const TRIGGER_PULSE: Duration = Duration::from_micros(10);

/// Speed of sound in cm/s; the echo travels out and back, so halve it.
const SPEED_OF_SOUND_CM_S: f64 = 34_300.0;

/// Surface echo-dispersion categories derived from ranging stddev.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absorption {
    High,
    Medium,
    Low,
}

/// Three-way threshold on ranging dispersion. Strict comparisons: the
/// boundary values 1.2 and 0.5 fall into the lower bucket.
pub fn classify_absorption(stddev: f64) -> Absorption {
    if stddev > 1.2 {
        Absorption::High
    } else if stddev > 0.5 {
        Absorption::Medium
    } else {
        Absorption::Low
    }
}

#[derive(Debug, Default)]
pub struct DistanceSensor;

impl DistanceSensor {
    pub fn new() -> Self {
        Self
    }

    /// One raw ranging cycle: 10 µs trigger pulse, then timed echo edges.
    ///
    /// Both edge waits are bounded by the configured echo timeout (default
    /// 30 ms); a disconnected sensor yields `ReadError::Timeout` instead of
    /// hanging the caller. The raw value is unfiltered and may fall outside
    /// the plausibility envelope.
    pub fn measure_once(&self, rig: &mut HandleManager) -> Reading<f64> {
        let timeout = rig.config().echo_timeout();
        let pins = rig.pins_mut().ok_or(ReadError::Unavailable)?;

        pins.trigger.set_level(true)?;
        spin_sleep::sleep(TRIGGER_PULSE);
        pins.trigger.set_level(false)?;

        let wait_start = Instant::now();
        while !pins.echo.level()? {
            if wait_start.elapsed() > timeout {
                return Err(ReadError::Timeout {
                    waited_ms: timeout.as_millis() as u64,
                });
            }
        }

        let rise = Instant::now();
        while pins.echo.level()? {
            if rise.elapsed() > timeout {
                return Err(ReadError::Timeout {
                    waited_ms: timeout.as_millis() as u64,
                });
            }
        }

        let elapsed = rise.elapsed();
        Ok(elapsed.as_secs_f64() * SPEED_OF_SOUND_CM_S / 2.0)
    }

    /// Takes the configured number of raw samples (default 10), discards
    /// everything outside the exclusive plausibility envelope and reports
    /// mean, stddev and survivor count. `Unavailable` when the handle is
    /// missing or no sample survives.
    pub fn measure_filtered(&self, rig: &mut HandleManager) -> Reading<FilteredDistance> {
        let samples = rig.config().distance_samples;
        let (min, max) = (rig.config().envelope_min_cm, rig.config().envelope_max_cm);
        if rig.pins_mut().is_none() {
            return Err(ReadError::Unavailable);
        }

        let mut raw = Vec::with_capacity(samples);
        for _ in 0..samples {
            match self.measure_once(rig) {
                Ok(d) => raw.push(d),
                Err(ReadError::Unavailable) => return Err(ReadError::Unavailable),
                // A timed-out or failed cycle costs one sample, not the run.
                Err(e) => debug!("[distance] sample skipped: {}", e),
            }
        }

        filter_samples(&raw, min, max).ok_or(ReadError::Unavailable)
    }
}

impl SensorAdapter for DistanceSensor {
    type Output = FilteredDistance;

    fn read(&self, rig: &mut HandleManager) -> Reading<FilteredDistance> {
        self.measure_filtered(rig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RigConfig;
    use crate::hal::testing::FakeFactory;
    use crate::manager::HandleManager;

    fn rig_with(factory: FakeFactory, echo_timeout_ms: u64) -> HandleManager {
        let config = RigConfig {
            retry_delay_ms: 1,
            echo_timeout_ms,
            ..RigConfig::default()
        };
        let mut mgr = HandleManager::new(config, Box::new(factory));
        mgr.initialize();
        mgr
    }

    #[test]
    fn test_classify_absorption_thresholds() {
        assert_eq!(classify_absorption(1.3), Absorption::High);
        assert_eq!(classify_absorption(0.6), Absorption::Medium);
        assert_eq!(classify_absorption(0.1), Absorption::Low);
    }

    #[test]
    fn test_classify_absorption_boundaries_go_low() {
        // Strict comparisons: exact thresholds land in the lower bucket.
        assert_eq!(classify_absorption(1.2), Absorption::Medium);
        assert_eq!(classify_absorption(0.5), Absorption::Low);
        assert_eq!(classify_absorption(0.0), Absorption::Low);
    }

    #[test]
    fn test_measure_once_without_handle_is_unavailable() {
        let config = RigConfig::default();
        let mut mgr = HandleManager::new(config, Box::new(FakeFactory::new()));
        // Never initialized.
        assert_eq!(
            DistanceSensor::new().measure_once(&mut mgr),
            Err(ReadError::Unavailable)
        );
    }

    #[test]
    fn test_measure_once_times_out_when_echo_never_rises() {
        let factory = FakeFactory::new();
        let mut mgr = rig_with(factory, 5);
        // Echo script left empty: the line idles low forever.
        let result = DistanceSensor::new().measure_once(&mut mgr);
        assert_eq!(result, Err(ReadError::Timeout { waited_ms: 5 }));
    }

    #[test]
    fn test_measure_once_pulses_trigger_and_times_echo() {
        let factory = FakeFactory::new();
        let handles = factory.handles();
        let mut mgr = rig_with(factory, 30);

        {
            let guard = handles.lock().unwrap();
            let h = guard.as_ref().unwrap();
            // Rise on the second poll, fall two polls later.
            h.echo_levels
                .lock()
                .unwrap()
                .extend([false, true, true, false]);
        }

        let result = DistanceSensor::new().measure_once(&mut mgr).unwrap();
        // Polling a fake line takes microseconds; the distance is tiny but
        // positive and well below the envelope floor.
        assert!(result >= 0.0 && result < 2.0, "distance was {}", result);

        let guard = handles.lock().unwrap();
        let writes = guard.as_ref().unwrap().trigger_writes.lock().unwrap();
        assert_eq!(writes.as_slice(), &[true, false]);
    }

    #[test]
    fn test_measure_filtered_unavailable_when_nothing_survives() {
        // Every cycle times out, so no sample survives the envelope.
        let factory = FakeFactory::new();
        let config = RigConfig {
            retry_delay_ms: 1,
            echo_timeout_ms: 1,
            distance_samples: 3,
            ..RigConfig::default()
        };
        let mut mgr = HandleManager::new(config, Box::new(factory));
        mgr.initialize();
        assert_eq!(
            DistanceSensor::new().measure_filtered(&mut mgr),
            Err(ReadError::Unavailable)
        );
    }

    #[test]
    fn test_read_matches_measure_filtered_contract() {
        let config = RigConfig::default();
        let mut mgr = HandleManager::new(config, Box::new(FakeFactory::new()));
        let sensor = DistanceSensor::new();
        assert_eq!(sensor.read(&mut mgr), Err(ReadError::Unavailable));
    }
}
