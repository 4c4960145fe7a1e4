// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Translation between vendor status and normalized climate state.
//!
//! Every reader has an inverse that builds the partial status to send
//! through [`Session::set_status`](crate::session::Session::set_status).
//! Modulating heaters (`htr_mod`) carry `on`, `mode` and `selected_temp`
//! and pick their target from `comfort_temp`, `eco_offset` or `ice_temp`;
//! plain and storage heaters use `mode` and `stemp` only.

use serde_json::{Value, json};

use super::fields::{Fields, format_temperature};
use crate::error::StatusError;
use crate::types::{HeaterMode, HeaterType, HvacMode, PresetMode, SelectedTemp, StatusMap};

const MODULATING_PRESETS: [PresetMode; 8] = [
    PresetMode::Away,
    PresetMode::Home,
    PresetMode::Comfort,
    PresetMode::Eco,
    PresetMode::Frost,
    PresetMode::Schedule,
    PresetMode::SelfLearn,
    PresetMode::Activity,
];

const BASIC_PRESETS: [PresetMode; 2] = [PresetMode::Away, PresetMode::Home];

fn fields(heater: HeaterType, status: &StatusMap) -> Fields<'_> {
    Fields::new(heater.as_str(), status)
}

fn selected_temp(fields: &Fields<'_>) -> Result<SelectedTemp, StatusError> {
    let raw = fields.str("selected_temp")?;
    SelectedTemp::from_vendor_str(raw)
        .ok_or_else(|| fields.unexpected("selected_temp", &Value::from(raw)))
}

fn heater_mode(fields: &Fields<'_>) -> Result<HeaterMode, StatusError> {
    let raw = fields.str("mode")?;
    HeaterMode::from_vendor_str(raw).ok_or_else(|| {
        tracing::error!(mode = %raw, "Unknown smartbox node mode");
        StatusError::UnknownMode(raw.to_string())
    })
}

fn into_map(value: Value) -> StatusMap {
    match value {
        Value::Object(map) => map,
        _ => StatusMap::new(),
    }
}

/// Returns the temperature the heater is currently targeting.
///
/// # Errors
///
/// Returns [`StatusError::MissingField`] if a required key is absent and
/// [`StatusError::UnexpectedValue`] if `selected_temp` is not one of
/// `comfort`, `eco`, `ice`.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use smartbox_lib::status::target_temperature;
/// use smartbox_lib::types::HeaterType;
///
/// let status = json!({"selected_temp": "eco", "comfort_temp": "17.2", "eco_offset": "4"});
/// let target = target_temperature(HeaterType::HtrMod, status.as_object().unwrap()).unwrap();
/// assert!((target - 13.2).abs() < 1e-9);
/// ```
pub fn target_temperature(heater: HeaterType, status: &StatusMap) -> Result<f64, StatusError> {
    let fields = fields(heater, status);
    if !heater.is_modulating() {
        return fields.f64("stemp");
    }
    match selected_temp(&fields)? {
        SelectedTemp::Comfort => fields.f64("comfort_temp"),
        SelectedTemp::Eco => Ok(fields.f64("comfort_temp")? - fields.f64("eco_offset")?),
        SelectedTemp::Ice => fields.f64("ice_temp"),
    }
}

/// Builds the status update that sets the target temperature.
///
/// Modulating heaters require the full `on`/`mode`/`selected_temp` context
/// in every write; in eco the comfort temperature is shifted by the offset
/// so the effective target matches.
///
/// # Errors
///
/// Returns [`StatusError::UnsupportedOperation`] for a modulating heater in
/// ice mode, and [`StatusError::MissingField`] if `units` or any context key
/// is absent.
pub fn set_temperature_args(
    heater: HeaterType,
    status: &StatusMap,
    target: f64,
) -> Result<StatusMap, StatusError> {
    let fields = fields(heater, status);
    let units = fields.value("units")?;
    if !heater.is_modulating() {
        return Ok(into_map(json!({
            "stemp": format_temperature(target),
            "units": units,
        })));
    }

    let selected = selected_temp(&fields)?;
    let comfort = match selected {
        SelectedTemp::Comfort => target,
        SelectedTemp::Eco => target + fields.f64("eco_offset")?,
        SelectedTemp::Ice => {
            return Err(StatusError::UnsupportedOperation(
                "cannot set temperature while in ice/frost mode".to_string(),
            ));
        }
    };
    Ok(into_map(json!({
        "on": true,
        "mode": fields.value("mode")?,
        "selected_temp": selected.as_str(),
        "comfort_temp": format_temperature(comfort),
        "eco_offset": fields.value("eco_offset")?,
        "units": units,
    })))
}

/// Returns the normalized HVAC mode.
///
/// A modulating heater that is switched off (`on: false`) reports
/// [`HvacMode::Off`] whatever its stored mode.
///
/// # Errors
///
/// Returns [`StatusError::MissingField`] if `mode` (or `on` for modulating
/// heaters) is absent and [`StatusError::UnknownMode`] for an unknown mode.
pub fn hvac_mode(heater: HeaterType, status: &StatusMap) -> Result<HvacMode, StatusError> {
    let fields = fields(heater, status);
    if fields.str("mode")? == "off" {
        return Ok(HvacMode::Off);
    }
    if heater.is_modulating() && !fields.bool("on")? {
        return Ok(HvacMode::Off);
    }
    match heater_mode(&fields)? {
        HeaterMode::Off => Ok(HvacMode::Off),
        HeaterMode::Manual => Ok(HvacMode::Heat),
        HeaterMode::Auto
        | HeaterMode::ModifiedAuto
        | HeaterMode::SelfLearn
        | HeaterMode::Presence => Ok(HvacMode::Auto),
    }
}

/// Builds the status update that selects an HVAC mode.
///
/// Switching a modulating heater off only clears `on`, keeping its stored
/// mode for when it is switched back on.
///
/// # Errors
///
/// Returns [`StatusError::MissingField`] if `selected_temp` is absent when
/// a modulating heater is switched to [`HvacMode::Heat`].
pub fn set_hvac_mode_args(
    heater: HeaterType,
    status: &StatusMap,
    mode: HvacMode,
) -> Result<StatusMap, StatusError> {
    if !heater.is_modulating() {
        let vendor_mode = match mode {
            HvacMode::Off => HeaterMode::Off,
            HvacMode::Heat => HeaterMode::Manual,
            HvacMode::Auto => HeaterMode::Auto,
        };
        return Ok(into_map(json!({ "mode": vendor_mode.as_str() })));
    }

    let args = match mode {
        HvacMode::Off => json!({ "on": false }),
        HvacMode::Heat => {
            let fields = fields(heater, status);
            json!({
                "selected_temp": fields.value("selected_temp")?,
                "on": true,
                "mode": HeaterMode::Manual.as_str(),
            })
        }
        HvacMode::Auto => json!({ "on": true, "mode": HeaterMode::Auto.as_str() }),
    };
    Ok(into_map(args))
}

/// Returns the normalized preset.
///
/// The away flag always wins. Plain and storage heaters otherwise report
/// [`PresetMode::Home`]; modulating heaters map their mode and selected
/// temperature to a fine-grained preset, and report `Home` while their mode
/// is `off`.
///
/// # Errors
///
/// Returns [`StatusError::MissingField`] or [`StatusError::UnexpectedValue`]
/// for incomplete modulating status and [`StatusError::UnknownMode`] for an
/// unknown mode.
pub fn preset_mode(
    heater: HeaterType,
    status: &StatusMap,
    away: bool,
) -> Result<PresetMode, StatusError> {
    if away {
        return Ok(PresetMode::Away);
    }
    if !heater.is_modulating() {
        return Ok(PresetMode::Home);
    }
    let fields = fields(heater, status);
    match heater_mode(&fields)? {
        HeaterMode::Off => Ok(PresetMode::Home),
        HeaterMode::Manual => Ok(match selected_temp(&fields)? {
            SelectedTemp::Comfort => PresetMode::Comfort,
            SelectedTemp::Eco => PresetMode::Eco,
            SelectedTemp::Ice => PresetMode::Frost,
        }),
        HeaterMode::Auto | HeaterMode::ModifiedAuto => Ok(PresetMode::Schedule),
        HeaterMode::SelfLearn => Ok(PresetMode::SelfLearn),
        HeaterMode::Presence => Ok(PresetMode::Activity),
    }
}

/// Returns the presets a heater type offers.
#[must_use]
pub fn preset_modes(heater: HeaterType) -> &'static [PresetMode] {
    if heater.is_modulating() {
        &MODULATING_PRESETS
    } else {
        &BASIC_PRESETS
    }
}

/// Builds the status update that selects a fine-grained preset.
///
/// # Errors
///
/// Returns [`StatusError::DevicePreset`] for `Away` and `Home`, which live on
/// the device, and [`StatusError::UnsupportedOperation`] when the heater is
/// not modulating.
pub fn set_preset_mode_args(
    heater: HeaterType,
    preset: PresetMode,
) -> Result<StatusMap, StatusError> {
    if preset.is_device_preset() {
        return Err(StatusError::DevicePreset(preset));
    }
    if !heater.is_modulating() {
        return Err(StatusError::UnsupportedOperation(format!(
            "preset {preset} is not available for {heater} nodes"
        )));
    }

    let manual = |selected: SelectedTemp| {
        json!({
            "on": true,
            "mode": HeaterMode::Manual.as_str(),
            "selected_temp": selected.as_str(),
        })
    };
    let scheduled = |mode: HeaterMode| json!({ "on": true, "mode": mode.as_str() });

    let args = match preset {
        PresetMode::Comfort => manual(SelectedTemp::Comfort),
        PresetMode::Eco => manual(SelectedTemp::Eco),
        PresetMode::Frost => manual(SelectedTemp::Ice),
        PresetMode::Schedule => scheduled(HeaterMode::Auto),
        PresetMode::SelfLearn => scheduled(HeaterMode::SelfLearn),
        PresetMode::Activity => scheduled(HeaterMode::Presence),
        PresetMode::Away | PresetMode::Home => return Err(StatusError::DevicePreset(preset)),
    };
    Ok(into_map(args))
}

/// Returns whether the heater is currently drawing power.
///
/// Storage heaters report `charging`; other heaters report `active`.
///
/// # Errors
///
/// Returns [`StatusError::MissingField`] if the key is absent. A missing key
/// is never treated as idle.
pub fn is_heating(heater: HeaterType, status: &StatusMap) -> Result<bool, StatusError> {
    let key = match heater {
        HeaterType::Acm => "charging",
        HeaterType::Htr | HeaterType::HtrMod => "active",
    };
    fields(heater, status).bool(key)
}
