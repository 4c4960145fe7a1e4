// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Heater status translation.
//!
//! Pure functions over raw vendor status maps, parametrized by
//! [`HeaterType`](crate::types::HeaterType). Nothing here holds state or
//! performs I/O; [`SmartboxNode`](crate::SmartboxNode) feeds them its cached
//! status.
//!
//! Unknown vendor states are reported as [`StatusError`](crate::error::StatusError)
//! rather than coerced to a default.
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use smartbox_lib::status::{hvac_mode, set_hvac_mode_args};
//! use smartbox_lib::types::{HeaterType, HvacMode};
//!
//! let status = json!({"mode": "manual", "on": false, "selected_temp": "comfort"});
//! let status = status.as_object().unwrap();
//! assert_eq!(hvac_mode(HeaterType::HtrMod, status).unwrap(), HvacMode::Off);
//!
//! let args = set_hvac_mode_args(HeaterType::HtrMod, status, HvacMode::Heat).unwrap();
//! assert_eq!(args["mode"], "manual");
//! ```

mod fields;
mod readings;
mod translate;

pub(crate) use fields::Fields;

pub use readings::{
    charge_level, current_temperature, duty_cycle, energy_consumed, is_available, locked, power,
    temperature_unit,
};
pub use translate::{
    hvac_mode, is_heating, preset_mode, preset_modes, set_hvac_mode_args, set_preset_mode_args,
    set_temperature_args, target_temperature,
};
