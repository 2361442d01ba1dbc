//! Battery snapshots through the power supply manager.

use battery::{Manager, State};
use capy_applet::BoxError;

/// One battery reading.
#[derive(Debug, Clone)]
pub struct BatteryStatus {
    /// Charge percentage, 0-100.
    pub percentage: i32,
    pub state: State,
    /// `H:MM until charged` / `H:MM remaining`, empty when unknown.
    pub time_remaining: String,
}

/// Whether the machine has a battery at all.
pub fn has_battery() -> bool {
    Manager::new()
        .ok()
        .and_then(|m| m.batteries().ok())
        .map(|mut b| b.next().is_some())
        .unwrap_or(false)
}

/// Read the first battery.
pub fn read() -> Result<BatteryStatus, BoxError> {
    let manager = Manager::new()?;
    let Some(first) = manager.batteries()?.next() else {
        return Err("no battery present".into());
    };

    let mut battery = first?;
    manager.refresh(&mut battery)?;

    let state = battery.state();
    Ok(BatteryStatus {
        percentage: (battery.state_of_charge().value * 100.0) as i32,
        state,
        time_remaining: format_time_remaining(remaining_seconds(&battery), state),
    })
}

fn remaining_seconds(battery: &battery::Battery) -> Option<f32> {
    match battery.state() {
        State::Charging => battery.time_to_full().map(|t| t.value),
        State::Discharging => battery.time_to_empty().map(|t| t.value),
        _ => None,
    }
}

/// `H:MM` plus a direction suffix, or empty when the estimate is missing.
pub fn format_time_remaining(seconds: Option<f32>, state: State) -> String {
    let Some(seconds) = seconds else {
        return String::new();
    };

    let total_minutes = (seconds / 60.0) as i32;
    let suffix = if state == State::Charging {
        "until charged"
    } else {
        "remaining"
    };

    format!("{}:{:02} {}", total_minutes / 60, total_minutes % 60, suffix)
}
