// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Smartbox event types.

use crate::types::NodeKey;

/// Events emitted as devices and nodes change.
///
/// Events describe what changed, not the new values; subscribers read the
/// current state from the device or node.
///
/// # Examples
///
/// ```
/// use smartbox_lib::event::SmartboxEvent;
/// use smartbox_lib::types::{HeaterType, NodeKey};
///
/// let event = SmartboxEvent::NodeStatusUpdated {
///     dev_id: "dev1".to_string(),
///     node: NodeKey::new(HeaterType::Htr, 1),
/// };
/// assert_eq!(event.dev_id(), "dev1");
/// assert_eq!(event.node(), Some(&NodeKey::new(HeaterType::Htr, 1)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmartboxEvent {
    /// A node status was updated from the push channel.
    NodeStatusUpdated {
        /// The owning device.
        dev_id: String,
        /// The updated node.
        node: NodeKey,
    },

    /// A node setup was updated from the push channel.
    NodeSetupUpdated {
        /// The owning device.
        dev_id: String,
        /// The updated node.
        node: NodeKey,
    },

    /// The device away flag changed.
    AwayStatusChanged {
        /// The device.
        dev_id: String,
        /// New away flag.
        away: bool,
    },

    /// The device power limit changed.
    PowerLimitChanged {
        /// The device.
        dev_id: String,
        /// New limit in watts.
        limit: u32,
    },

    /// The device push channel task ended.
    PushChannelClosed {
        /// The device.
        dev_id: String,
    },
}

impl SmartboxEvent {
    /// Returns the device this event concerns.
    #[must_use]
    pub fn dev_id(&self) -> &str {
        match self {
            Self::NodeStatusUpdated { dev_id, .. }
            | Self::NodeSetupUpdated { dev_id, .. }
            | Self::AwayStatusChanged { dev_id, .. }
            | Self::PowerLimitChanged { dev_id, .. }
            | Self::PushChannelClosed { dev_id } => dev_id,
        }
    }

    /// Returns the node this event concerns, if it is a node event.
    #[must_use]
    pub fn node(&self) -> Option<&NodeKey> {
        match self {
            Self::NodeStatusUpdated { node, .. } | Self::NodeSetupUpdated { node, .. } => {
                Some(node)
            }
            _ => None,
        }
    }
}
