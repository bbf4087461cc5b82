use dashcast_core::Result;
use serde::{Deserialize, Serialize};

/// Mileage (km/L) at or above which consumption counts as optimal.
pub const MILEAGE_OPTIMAL: f64 = 15.0;
/// Mileage (km/L) at or above which consumption is a warning rather than danger.
pub const MILEAGE_WARNING: f64 = 10.0;

/// One vehicle reading, pushed to every client once per tick.
/// Wire: `{"fuelIn":45.5,"fuelOut":2.3,"gear":3,"rpm":2500,"speed":65,"mileage":14.2}`
///
/// Field order is part of the wire format; serde emits fields in
/// declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleTelemetry {
    /// Litres in the tank.
    pub fuel_in: f64,
    /// Litres consumed.
    pub fuel_out: f64,
    /// 0 = neutral, 1-6.
    pub gear: u8,
    pub rpm: u32,
    /// km/h.
    pub speed: u32,
    /// Predicted efficiency in km/L.
    pub mileage: f64,
}

impl VehicleTelemetry {
    /// Reference reading used when no live data source is attached.
    pub fn sample() -> Self {
        Self {
            fuel_in: 45.5,
            fuel_out: 2.3,
            gear: 3,
            rpm: 2500,
            speed: 65,
            mileage: 14.2,
        }
    }

    /// Encode as one wire message.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode one wire message. Extra fields (e.g. a client-side
    /// timestamp) are ignored.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn efficiency(&self) -> EfficiencyStatus {
        EfficiencyStatus::from_mileage(self.mileage)
    }
}

/// Dashboard colour band for the predicted mileage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EfficiencyStatus {
    Optimal,
    Warning,
    Danger,
}

impl EfficiencyStatus {
    pub fn from_mileage(mileage: f64) -> Self {
        if mileage >= MILEAGE_OPTIMAL {
            EfficiencyStatus::Optimal
        } else if mileage >= MILEAGE_WARNING {
            EfficiencyStatus::Warning
        } else {
            EfficiencyStatus::Danger
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EfficiencyStatus::Optimal => "optimal",
            EfficiencyStatus::Warning => "warning",
            EfficiencyStatus::Danger => "danger",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn efficiency_bands() {
        assert_eq!(EfficiencyStatus::from_mileage(15.0), EfficiencyStatus::Optimal);
        assert_eq!(EfficiencyStatus::from_mileage(22.4), EfficiencyStatus::Optimal);
        assert_eq!(EfficiencyStatus::from_mileage(14.9), EfficiencyStatus::Warning);
        assert_eq!(EfficiencyStatus::from_mileage(10.0), EfficiencyStatus::Warning);
        assert_eq!(EfficiencyStatus::from_mileage(9.99), EfficiencyStatus::Danger);
        assert_eq!(EfficiencyStatus::from_mileage(0.0), EfficiencyStatus::Danger);
    }

    #[test]
    fn sample_reading_is_in_warning_band() {
        assert_eq!(VehicleTelemetry::sample().efficiency(), EfficiencyStatus::Warning);
    }
}
