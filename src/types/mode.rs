// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Climate mode types.
//!
//! [`HvacMode`] and [`PresetMode`] are the normalized vocabulary exposed to
//! hosts. [`HeaterMode`] and [`SelectedTemp`] are the vendor's own values as
//! found in node status.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Normalized HVAC mode.
///
/// # Examples
///
/// ```
/// use smartbox_lib::types::HvacMode;
///
/// let mode: HvacMode = "heat".parse().unwrap();
/// assert_eq!(mode, HvacMode::Heat);
/// assert_eq!(HvacMode::Auto.as_str(), "auto");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HvacMode {
    /// Heating disabled.
    Off,
    /// Manual heating to the target temperature.
    Heat,
    /// Heating follows a schedule or learned program.
    Auto,
}

impl HvacMode {
    /// All HVAC modes a heater supports.
    pub const ALL: [Self; 3] = [Self::Heat, Self::Auto, Self::Off];

    /// Returns the mode name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Heat => "heat",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HvacMode {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(Self::Off),
            "heat" => Ok(Self::Heat),
            "auto" => Ok(Self::Auto),
            _ => Err(ValueError::InvalidHvacMode(s.to_string())),
        }
    }
}

/// Normalized preset mode.
///
/// `Away` and `Home` reflect the device-wide away flag. The remaining presets
/// only exist on modulating heaters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresetMode {
    /// Device is in away mode.
    Away,
    /// Device is home (non-modulating heaters only).
    Home,
    /// Manual heating to the comfort temperature.
    Comfort,
    /// Manual heating to the comfort temperature minus the eco offset.
    Eco,
    /// Manual heating to the frost protection temperature.
    Frost,
    /// Heating follows the programmed schedule.
    Schedule,
    /// Heating follows a learned program.
    SelfLearn,
    /// Heating follows presence detection.
    Activity,
}

impl PresetMode {
    /// Returns the preset name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Away => "away",
            Self::Home => "home",
            Self::Comfort => "comfort",
            Self::Eco => "eco",
            Self::Frost => "frost",
            Self::Schedule => "schedule",
            Self::SelfLearn => "self_learn",
            Self::Activity => "activity",
        }
    }

    /// Returns true for presets backed by the device away flag.
    #[must_use]
    pub const fn is_device_preset(&self) -> bool {
        matches!(self, Self::Away | Self::Home)
    }
}

impl fmt::Display for PresetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresetMode {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "away" => Ok(Self::Away),
            "home" => Ok(Self::Home),
            "comfort" => Ok(Self::Comfort),
            "eco" => Ok(Self::Eco),
            "frost" => Ok(Self::Frost),
            "schedule" => Ok(Self::Schedule),
            "self_learn" => Ok(Self::SelfLearn),
            "activity" => Ok(Self::Activity),
            _ => Err(ValueError::InvalidPresetMode(s.to_string())),
        }
    }
}

/// The vendor `mode` status value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaterMode {
    /// Heater off.
    Off,
    /// Manual target temperature.
    Manual,
    /// Programmed schedule.
    Auto,
    /// Programmed schedule with a temporary temperature override.
    ModifiedAuto,
    /// Learned program.
    SelfLearn,
    /// Presence detection.
    Presence,
}

impl HeaterMode {
    /// Returns the vendor string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Manual => "manual",
            Self::Auto => "auto",
            Self::ModifiedAuto => "modified_auto",
            Self::SelfLearn => "self_learn",
            Self::Presence => "presence",
        }
    }

    /// Parses a vendor mode string.
    #[must_use]
    pub fn from_vendor_str(s: &str) -> Option<Self> {
        match s {
            "off" => Some(Self::Off),
            "manual" => Some(Self::Manual),
            "auto" => Some(Self::Auto),
            "modified_auto" => Some(Self::ModifiedAuto),
            "self_learn" => Some(Self::SelfLearn),
            "presence" => Some(Self::Presence),
            _ => None,
        }
    }
}

impl fmt::Display for HeaterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which stored temperature a modulating heater targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectedTemp {
    /// `comfort_temp`.
    Comfort,
    /// `comfort_temp - eco_offset`.
    Eco,
    /// `ice_temp` (frost protection).
    Ice,
}

impl SelectedTemp {
    /// Returns the vendor string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Comfort => "comfort",
            Self::Eco => "eco",
            Self::Ice => "ice",
        }
    }

    /// Parses a vendor `selected_temp` string.
    #[must_use]
    pub fn from_vendor_str(s: &str) -> Option<Self> {
        match s {
            "comfort" => Some(Self::Comfort),
            "eco" => Some(Self::Eco),
            "ice" => Some(Self::Ice),
            _ => None,
        }
    }
}

impl fmt::Display for SelectedTemp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Temperature unit reported in node status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemperatureUnit {
    /// Degrees Celsius (`C`).
    Celsius,
    /// Degrees Fahrenheit (`F`).
    Fahrenheit,
}

impl TemperatureUnit {
    /// Returns the vendor string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
        }
    }

    /// Parses a vendor `units` string.
    #[must_use]
    pub fn from_vendor_str(s: &str) -> Option<Self> {
        match s {
            "C" => Some(Self::Celsius),
            "F" => Some(Self::Fahrenheit),
            _ => None,
        }
    }
}
