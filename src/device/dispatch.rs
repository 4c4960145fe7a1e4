// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Routing of push messages into device and node state.

use serde_json::Value;

use super::SmartboxDevice;
use crate::error::RoutingError;
use crate::event::SmartboxEvent;
use crate::session::{PushUpdate, Topic};
use crate::types::{NodeKey, StatusMap};

/// Where a push update was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// Merged into a node status.
    NodeStatus(NodeKey),
    /// Merged into a node setup.
    NodeSetup(NodeKey),
    /// Set the device away flag.
    AwayStatus(bool),
    /// Set the device power limit.
    PowerLimit(u32),
    /// A known topic carrying nothing tracked.
    Ignored,
}

impl SmartboxDevice {
    /// Applies one push update.
    ///
    /// Updates for one node never touch another node; the away flag and
    /// power limit only ever change on this device.
    ///
    /// # Errors
    ///
    /// - [`RoutingError::UnknownNode`] if the update names a node this device
    ///   does not have.
    /// - [`RoutingError::UnmatchedTopic`] for unrecognised paths.
    /// - [`RoutingError::MalformedBody`] if the payload has the wrong shape.
    ///
    /// Nothing is changed when an error is returned.
    pub fn handle_update(&self, update: &PushUpdate) -> Result<Routed, RoutingError> {
        tracing::debug!(dev_id = %self.dev_id(), path = %update.path, "Push update");

        match Topic::parse(&update.path) {
            Topic::NodeStatus { node_type, addr } => {
                let key = NodeKey::new(node_type, addr);
                let node = self.lookup(&key)?;
                node.update_status(object_body(update)?);
                self.publish(SmartboxEvent::NodeStatusUpdated {
                    dev_id: self.dev_id().to_string(),
                    node: key.clone(),
                });
                Ok(Routed::NodeStatus(key))
            }
            Topic::NodeSetup { node_type, addr } => {
                let key = NodeKey::new(node_type, addr);
                let node = self.lookup(&key)?;
                node.update_setup(object_body(update)?);
                self.publish(SmartboxEvent::NodeSetupUpdated {
                    dev_id: self.dev_id().to_string(),
                    node: key.clone(),
                });
                Ok(Routed::NodeSetup(key))
            }
            Topic::AwayStatus => {
                let away = update
                    .body
                    .get("away")
                    .and_then(Value::as_bool)
                    .ok_or_else(|| malformed(update, "missing boolean 'away'"))?;
                self.apply_away(away);
                Ok(Routed::AwayStatus(away))
            }
            Topic::PowerLimit => {
                let limit = update
                    .body
                    .get("power_limit")
                    .and_then(power_limit_value)
                    .ok_or_else(|| malformed(update, "missing numeric 'power_limit'"))?;
                self.apply_power_limit(limit);
                Ok(Routed::PowerLimit(limit))
            }
            Topic::Informational => Ok(Routed::Ignored),
            Topic::Unmatched => Err(RoutingError::UnmatchedTopic(update.path.clone())),
        }
    }

    /// Applies the full device payload sent when the push socket connects.
    ///
    /// Only the away status and the power limit are read from it.
    pub fn on_dev_data(&self, data: &Value) {
        tracing::debug!(dev_id = %self.dev_id(), "Push device data");

        if let Some(away_status) = data.get("away_status") {
            match away_status.get("away").and_then(Value::as_bool) {
                Some(away) => self.apply_away(away),
                None => tracing::error!(
                    dev_id = %self.dev_id(),
                    "Device data away_status has no boolean 'away'"
                ),
            }
        }

        if let Some(limit) = data.pointer("/htr_system/setup/power_limit") {
            match power_limit_value(limit) {
                Some(limit) => self.apply_power_limit(limit),
                None => tracing::error!(
                    dev_id = %self.dev_id(),
                    value = %limit,
                    "Device data power_limit is not a number"
                ),
            }
        }
    }

    fn lookup(&self, key: &NodeKey) -> Result<crate::node::SmartboxNode, RoutingError> {
        self.node(key).ok_or_else(|| RoutingError::UnknownNode {
            node_type: key.node_type.as_str().to_string(),
            addr: key.addr,
        })
    }
}

fn object_body(update: &PushUpdate) -> Result<&StatusMap, RoutingError> {
    update
        .body
        .as_object()
        .ok_or_else(|| malformed(update, "expected an object"))
}

fn malformed(update: &PushUpdate, reason: &str) -> RoutingError {
    RoutingError::MalformedBody {
        path: update.path.clone(),
        reason: reason.to_string(),
    }
}

/// Power limits arrive as a number or a decimal string.
fn power_limit_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
