// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sensor readings derived from heater status.

use std::time::Duration;

use serde_json::Value;

use super::fields::Fields;
use super::translate::is_heating;
use crate::error::StatusError;
use crate::types::{HeaterType, StatusMap, TemperatureUnit};

fn fields(heater: HeaterType, status: &StatusMap) -> Fields<'_> {
    Fields::new(heater.as_str(), status)
}

/// Measured room temperature (`mtemp`).
///
/// # Errors
///
/// Returns [`StatusError`] if `mtemp` is absent or not numeric.
pub fn current_temperature(heater: HeaterType, status: &StatusMap) -> Result<f64, StatusError> {
    fields(heater, status).f64("mtemp")
}

/// Temperature unit of the status, or `None` if the node does not report one.
///
/// # Errors
///
/// Returns [`StatusError::UnexpectedValue`] for units other than `C`/`F`.
pub fn temperature_unit(
    heater: HeaterType,
    status: &StatusMap,
) -> Result<Option<TemperatureUnit>, StatusError> {
    let fields = fields(heater, status);
    let Some(value) = fields.optional("units") else {
        return Ok(None);
    };
    value
        .as_str()
        .and_then(TemperatureUnit::from_vendor_str)
        .map(Some)
        .ok_or_else(|| fields.unexpected("units", value))
}

/// Power drawn while heating, in watts. An idle heater reports 0 even if
/// the vendor still carries a stale `power` value.
///
/// # Errors
///
/// Returns [`StatusError`] if the heating flag or `power` is missing.
pub fn power(heater: HeaterType, status: &StatusMap) -> Result<f64, StatusError> {
    if is_heating(heater, status)? {
        fields(heater, status).f64("power")
    } else {
        Ok(0.0)
    }
}

/// Duty cycle in percent (`duty`).
///
/// # Errors
///
/// Returns [`StatusError`] if `duty` is absent or not numeric.
pub fn duty_cycle(heater: HeaterType, status: &StatusMap) -> Result<f64, StatusError> {
    fields(heater, status).f64("duty")
}

/// Storage heater charge level in percent (`charge_level`).
///
/// # Errors
///
/// Returns [`StatusError`] if `charge_level` is absent or not numeric.
pub fn charge_level(heater: HeaterType, status: &StatusMap) -> Result<f64, StatusError> {
    fields(heater, status).f64("charge_level")
}

/// Whether the node's controls are locked.
///
/// # Errors
///
/// Returns [`StatusError`] if `locked` is absent or not a boolean.
pub fn locked(heater: HeaterType, status: &StatusMap) -> Result<bool, StatusError> {
    fields(heater, status).bool("locked")
}

/// Whether the node is in sync with the vendor cloud.
#[must_use]
pub fn is_available(status: &StatusMap) -> bool {
    status.get("sync_status").and_then(Value::as_str) == Some("ok")
}

/// Energy consumed over `elapsed` at the current power and duty cycle, in
/// watt-hours.
///
/// # Errors
///
/// Returns [`StatusError`] if `power` or `duty` is absent or not numeric.
pub fn energy_consumed(
    heater: HeaterType,
    status: &StatusMap,
    elapsed: Duration,
) -> Result<f64, StatusError> {
    let fields = fields(heater, status);
    let watts = fields.f64("power")?;
    let duty = fields.f64("duty")?;
    Ok(watts * duty / 100.0 * elapsed.as_secs_f64() / 3600.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status(value: Value) -> StatusMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn current_temperature_parses_decimal_string() {
        let s = status(json!({"mtemp": "19.4"}));
        let t = current_temperature(HeaterType::Htr, &s).unwrap();
        assert!((t - 19.4).abs() < 1e-9);
    }

    #[test]
    fn temperature_unit_values() {
        assert_eq!(
            temperature_unit(HeaterType::Htr, &status(json!({"units": "C"}))).unwrap(),
            Some(TemperatureUnit::Celsius)
        );
        assert_eq!(
            temperature_unit(HeaterType::Htr, &StatusMap::new()).unwrap(),
            None
        );
        assert!(temperature_unit(HeaterType::Htr, &status(json!({"units": "K"}))).is_err());
    }

    #[test]
    fn power_is_zero_when_idle() {
        let idle = status(json!({"active": false, "power": "1500"}));
        assert!(power(HeaterType::Htr, &idle).unwrap().abs() < f64::EPSILON);

        let heating = status(json!({"charging": true, "power": "1500"}));
        assert!((power(HeaterType::Acm, &heating).unwrap() - 1500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn availability_follows_sync_status() {
        assert!(is_available(&status(json!({"sync_status": "ok"}))));
        assert!(!is_available(&status(json!({"sync_status": "lost"}))));
        assert!(!is_available(&StatusMap::new()));
    }

    #[test]
    fn energy_scales_with_duty_and_time() {
        let s = status(json!({"power": "1000", "duty": 50}));
        let wh = energy_consumed(HeaterType::Htr, &s, Duration::from_secs(1800)).unwrap();
        assert!((wh - 250.0).abs() < 1e-9);
    }

    #[test]
    fn charge_level_and_lock() {
        let s = status(json!({"charge_level": 80, "locked": true}));
        assert!((charge_level(HeaterType::Acm, &s).unwrap() - 80.0).abs() < f64::EPSILON);
        assert!(locked(HeaterType::Acm, &s).unwrap());
        assert!(duty_cycle(HeaterType::Acm, &s).is_err());
    }
}
