// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Node capability detection.
//!
//! Heaters differ by type and by firmware: some offer window-open detection
//! or "true radiant" control, storage heaters report a charge level, and only
//! modulating heaters have fine-grained presets. Rather than branching on
//! node type throughout, hosts ask a [`NodeCapabilities`] what a node can do.
//!
//! Optional features are advertised by the vendor in the node setup under
//! `factory_options`; a missing flag means the feature is not available.

use serde_json::Value;

use crate::error::StatusError;
use crate::status::Fields;
use crate::types::{HeaterType, NodeType, SetupMap};

/// Capabilities of a heater node.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use smartbox_lib::capabilities::NodeCapabilities;
/// use smartbox_lib::types::NodeType;
///
/// let setup = json!({"factory_options": {"window_mode_available": true}});
/// let caps = NodeCapabilities::detect(&NodeType::from("htr"), setup.as_object().unwrap());
/// assert!(caps.window_mode);
/// assert!(!caps.true_radiant);
/// assert!(!caps.presets);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
// Each flag is an independent vendor feature.
#[allow(clippy::struct_excessive_bools)]
pub struct NodeCapabilities {
    /// Supports window-open detection.
    pub window_mode: bool,

    /// Supports true radiant control.
    pub true_radiant: bool,

    /// Supports fine-grained presets (comfort, eco, frost, ...).
    pub presets: bool,

    /// Reports a storage charge level.
    pub charge_level: bool,
}

impl NodeCapabilities {
    /// Detects the optional setup features of a node.
    #[must_use]
    pub fn from_setup(setup: &SetupMap) -> Self {
        Self {
            window_mode: factory_option(setup, "window_mode_available"),
            true_radiant: factory_option(setup, "true_radiant_available"),
            ..Self::default()
        }
    }

    /// Detects all capabilities of a node from its type and setup.
    #[must_use]
    pub fn detect(node_type: &NodeType, setup: &SetupMap) -> Self {
        let heater = node_type.heater();
        Self {
            presets: heater.is_some_and(|h| h.is_modulating()),
            charge_level: heater.is_some_and(|h| h == HeaterType::Acm),
            ..Self::from_setup(setup)
        }
    }
}

fn factory_option(setup: &SetupMap, key: &str) -> bool {
    setup
        .get("factory_options")
        .and_then(|options| options.get(key))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Whether window-open detection is currently enabled.
///
/// # Errors
///
/// Returns [`StatusError::MissingField`] if the setup lacks
/// `window_mode_enabled`, which is distinct from the feature being disabled.
pub fn window_mode_enabled(node_type: &NodeType, setup: &SetupMap) -> Result<bool, StatusError> {
    Fields::new(node_type.as_str(), setup).bool("window_mode_enabled")
}

/// Whether true radiant control is currently enabled.
///
/// # Errors
///
/// Returns [`StatusError::MissingField`] if the setup lacks
/// `true_radiant_enabled`.
pub fn true_radiant_enabled(node_type: &NodeType, setup: &SetupMap) -> Result<bool, StatusError> {
    Fields::new(node_type.as_str(), setup).bool("true_radiant_enabled")
}
