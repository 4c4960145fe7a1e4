// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed access to raw status and setup maps.

use serde_json::Value;

use crate::error::StatusError;
use crate::types::StatusMap;

/// Read-only view over a status or setup map that turns absent or
/// ill-typed keys into [`StatusError`]s naming the key and node type.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Fields<'a> {
    node_type: &'a str,
    map: &'a StatusMap,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(node_type: &'a str, map: &'a StatusMap) -> Self {
        Self { node_type, map }
    }

    /// Returns the raw value for `key`.
    pub(crate) fn value(&self, key: &str) -> Result<&'a Value, StatusError> {
        self.map.get(key).ok_or_else(|| self.missing(key))
    }

    /// Returns the value for `key`, or `None` if absent.
    pub(crate) fn optional(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key)
    }

    pub(crate) fn str(&self, key: &str) -> Result<&'a str, StatusError> {
        let value = self.value(key)?;
        value.as_str().ok_or_else(|| self.unexpected(key, value))
    }

    /// Reads a number that the vendor may send either as a JSON number or
    /// as a decimal string.
    pub(crate) fn f64(&self, key: &str) -> Result<f64, StatusError> {
        let value = self.value(key)?;
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| self.unexpected(key, value))
    }

    pub(crate) fn bool(&self, key: &str) -> Result<bool, StatusError> {
        let value = self.value(key)?;
        value.as_bool().ok_or_else(|| self.unexpected(key, value))
    }

    pub(crate) fn missing(&self, key: &str) -> StatusError {
        StatusError::MissingField {
            key: key.to_string(),
            node_type: self.node_type.to_string(),
            status: Value::Object(self.map.clone()).to_string(),
        }
    }

    pub(crate) fn unexpected(&self, key: &str, value: &Value) -> StatusError {
        let value = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        StatusError::UnexpectedValue {
            key: key.to_string(),
            value,
            node_type: self.node_type.to_string(),
        }
    }
}

/// Formats a temperature the way the vendor API expects it: whole numbers
/// keep one decimal place (`20.0`), others use the shortest representation.
pub(crate) fn format_temperature(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
