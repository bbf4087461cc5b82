//! Gear-shift advice derived from the reading stream, as shown on the
//! dashboard: a warning appears once the driver has stayed in one gear too
//! long at an RPM that suggests a different gear.

use std::time::{Duration, Instant};

use dashcast_protocol::VehicleTelemetry;

pub const SHIFT_UP_RPM: u32 = 3_000;
pub const SHIFT_DOWN_RPM: u32 = 1_200;
/// Soft band used once the driver has been in one gear for twice the threshold.
pub const PROLONGED_HIGH_RPM: u32 = 2_800;
pub const PROLONGED_LOW_RPM: u32 = 1_500;
pub const GEAR_DURATION_THRESHOLD: Duration = Duration::from_secs(15);
pub const TOP_GEAR: u8 = 6;
/// Below this speed (km/h) the vehicle counts as stationary.
pub const MIN_MOVING_SPEED: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct GearWarning {
    pub current_gear: u8,
    pub suggested_gear: u8,
    /// Time spent in `current_gear` so far.
    pub duration: Duration,
    pub message: String,
}

/// Tracks how long the current gear has been engaged.
#[derive(Debug, Default)]
pub struct GearAdvisor {
    gear: Option<u8>,
    since: Option<Instant>,
}

impl GearAdvisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one reading observed at `now`; returns advice if any applies.
    pub fn observe(&mut self, reading: &VehicleTelemetry, now: Instant) -> Option<GearWarning> {
        if self.gear != Some(reading.gear) {
            self.gear = Some(reading.gear);
            self.since = Some(now);
        }
        let in_gear = self
            .since
            .map(|since| now.saturating_duration_since(since))
            .unwrap_or_default();

        advise(reading, in_gear)
    }
}

/// Stateless rule set: `in_gear` is how long `reading.gear` has been engaged.
pub fn advise(reading: &VehicleTelemetry, in_gear: Duration) -> Option<GearWarning> {
    let VehicleTelemetry {
        gear, rpm, speed, ..
    } = *reading;

    if speed < MIN_MOVING_SPEED || gear == 0 {
        return None;
    }

    let warning = |suggested: u8, message: String| GearWarning {
        current_gear: gear,
        suggested_gear: suggested,
        duration: in_gear,
        message,
    };

    if rpm > SHIFT_UP_RPM && gear < TOP_GEAR && in_gear > GEAR_DURATION_THRESHOLD {
        let next = gear + 1;
        return Some(warning(
            next,
            format!("High RPM detected. Consider shifting to gear {next}"),
        ));
    }

    if rpm < SHIFT_DOWN_RPM && gear > 1 && in_gear > GEAR_DURATION_THRESHOLD {
        let next = gear - 1;
        return Some(warning(
            next,
            format!("Low RPM detected. Consider shifting to gear {next}"),
        ));
    }

    if in_gear > GEAR_DURATION_THRESHOLD * 2
        && (rpm > PROLONGED_HIGH_RPM || rpm < PROLONGED_LOW_RPM)
        && gear < TOP_GEAR
    {
        let next = if rpm > PROLONGED_HIGH_RPM { gear + 1 } else { gear - 1 };
        if (1..=TOP_GEAR).contains(&next) {
            return Some(warning(
                next,
                format!(
                    "Driving in gear {gear} for {}s. Shift to gear {next} for better efficiency",
                    in_gear.as_secs_f64().round()
                ),
            ));
        }
    }

    None
}
