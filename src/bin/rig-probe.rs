//! One-shot probe of the whole rig: wait for the button, range, read the
//! thermal and color sensors, render a status frame, beep.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rig_hal::sensors::classify_absorption;
use rig_hal::{
    Button, Buzzer, ColorSensor, DisplayFrame, DistanceSensor, HandleManager, ManagerState,
    ReadError, RigConfig, SensorAdapter, StatusDisplay, ThermalSensor, WaitOutcome,
};

fn load_config() -> RigConfig {
    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config".to_string());
    let rig_config_path = format!("{}/rig.toml", config_path);
    match RigConfig::load(&rig_config_path) {
        Ok(cfg) => {
            info!("[config] loaded {}", rig_config_path);
            cfg
        }
        Err(e) => {
            warn!("[config] {} ({}), using defaults", rig_config_path, e);
            RigConfig::default()
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("[rig-probe] starting up...");
    let config = load_config();

    let mut rig = HandleManager::with_system(config);
    if rig.initialize() == ManagerState::Degraded {
        warn!("[rig-probe] running with no hardware; all readings degrade");
    }

    // Ctrl-C flips the flag; main returns and the manager's Drop releases
    // every claim exactly once.
    let running = Arc::new(AtomicBool::new(true));
    let (cancel_tx, cancel_rx) = crossbeam_channel::bounded::<()>(1);
    {
        let running = running.clone();
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
            let _ = cancel_tx.try_send(());
        })
        .expect("failed to install Ctrl-C handler");
    }

    let distance = DistanceSensor::new();
    let thermal = ThermalSensor::new(rig.config().addresses.thermal);
    let color = ColorSensor::new(rig.config().addresses.color);
    let button = Button::new();
    let buzzer = Buzzer::new();
    let mut display = StatusDisplay::headless();

    if let Err(e) = color.init(&mut rig) {
        warn!("[rig-probe] color sensor init skipped: {}", e);
    }

    info!("[rig-probe] press the button to measure (Ctrl-C to exit)");
    while running.load(Ordering::SeqCst) {
        match button.wait_for_press(&mut rig, &cancel_rx) {
            Ok(WaitOutcome::Cancelled) => break,
            Ok(WaitOutcome::Pressed) => {}
            Err(ReadError::Unavailable) => {
                // No button wired up; run one pass and stop.
                probe_once(&mut rig, &distance, &thermal, &color, &mut display);
                break;
            }
            Err(e) => {
                warn!("[rig-probe] button wait failed: {}", e);
                break;
            }
        }

        probe_once(&mut rig, &distance, &thermal, &color, &mut display);
        buzzer.beep(&mut rig, Duration::from_millis(100));
    }

    info!("[rig-probe] shutting down");
}

fn probe_once(
    rig: &mut HandleManager,
    distance: &DistanceSensor,
    thermal: &ThermalSensor,
    color: &ColorSensor,
    display: &mut StatusDisplay,
) {
    let dist_line = match distance.measure_filtered(rig) {
        Ok(f) => {
            let absorption = classify_absorption(f.stddev);
            info!(
                "[rig-probe] distance {} cm (σ {}, {} samples, absorption {:?})",
                f.mean, f.stddev, f.sample_count, absorption
            );
            format!("Dist: {} cm", f.mean)
        }
        Err(e) => {
            info!("[rig-probe] distance: {}", e);
            "Dist: --".to_string()
        }
    };

    let temp_line = match thermal.read(rig) {
        Ok(t) if t.simulated => format!("Temp: {} C (sim)", t.object),
        Ok(t) => format!("Temp: {} C", t.object),
        Err(e) => {
            info!("[rig-probe] thermal: {}", e);
            "Temp: --".to_string()
        }
    };

    let color_line = match color.read(rig) {
        Ok(c) => format!("Color: {}", c.label),
        Err(e) => {
            info!("[rig-probe] color: {}", e);
            "Color: --".to_string()
        }
    };

    display.render(&DisplayFrame::new([dist_line, temp_line, color_line]));
}
