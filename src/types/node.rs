// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device and node identity types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The heater node types this library understands.
///
/// # Examples
///
/// ```
/// use smartbox_lib::types::HeaterType;
///
/// assert_eq!(HeaterType::HtrMod.as_str(), "htr_mod");
/// assert_eq!(HeaterType::from_vendor_str("acm"), Some(HeaterType::Acm));
/// assert_eq!(HeaterType::from_vendor_str("thm"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaterType {
    /// Plain heater.
    Htr,
    /// Storage heater (accumulator).
    Acm,
    /// Modulating heater with comfort/eco/ice temperatures.
    HtrMod,
}

impl HeaterType {
    /// Returns the vendor string for this heater type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Htr => "htr",
            Self::Acm => "acm",
            Self::HtrMod => "htr_mod",
        }
    }

    /// Parses a vendor node type string.
    #[must_use]
    pub fn from_vendor_str(s: &str) -> Option<Self> {
        match s {
            "htr" => Some(Self::Htr),
            "acm" => Some(Self::Acm),
            "htr_mod" => Some(Self::HtrMod),
            _ => None,
        }
    }

    /// Returns true for modulating heaters.
    #[must_use]
    pub const fn is_modulating(&self) -> bool {
        matches!(self, Self::HtrMod)
    }
}

impl fmt::Display for HeaterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The type of a node as reported by the vendor.
///
/// Devices can report node types this library does not control (such as
/// thermostats or power monitors). Those are kept as [`NodeType::Other`] so
/// push traffic for them still routes to a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    /// One of the supported heater types.
    Heater(HeaterType),
    /// Any other node type, by vendor name.
    Other(String),
}

impl NodeType {
    /// Returns the vendor string for this node type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Heater(heater) => heater.as_str(),
            Self::Other(name) => name,
        }
    }

    /// Returns the heater type if this node is a supported heater.
    #[must_use]
    pub fn heater(&self) -> Option<HeaterType> {
        match self {
            Self::Heater(heater) => Some(*heater),
            Self::Other(_) => None,
        }
    }

    /// Returns true if this node is a supported heater.
    #[must_use]
    pub fn is_heater(&self) -> bool {
        matches!(self, Self::Heater(_))
    }
}

impl From<&str> for NodeType {
    fn from(s: &str) -> Self {
        HeaterType::from_vendor_str(s).map_or_else(|| Self::Other(s.to_string()), Self::Heater)
    }
}

impl From<String> for NodeType {
    fn from(s: String) -> Self {
        match HeaterType::from_vendor_str(&s) {
            Some(heater) => Self::Heater(heater),
            None => Self::Other(s),
        }
    }
}

impl From<HeaterType> for NodeType {
    fn from(heater: HeaterType) -> Self {
        Self::Heater(heater)
    }
}

impl From<NodeType> for String {
    fn from(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Heater(heater) => heater.as_str().to_string(),
            NodeType::Other(name) => name,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a node within a device.
///
/// Addresses are only unique per node type, so the pair is the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    /// The node type.
    pub node_type: NodeType,
    /// The node address.
    pub addr: u32,
}

impl NodeKey {
    /// Creates a new node key.
    #[must_use]
    pub fn new(node_type: impl Into<NodeType>, addr: u32) -> Self {
        Self {
            node_type: node_type.into(),
            addr,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.node_type, self.addr)
    }
}

/// A node as listed by the vendor session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Node address.
    pub addr: u32,
    /// User-assigned node name.
    pub name: String,
    /// Node type.
    #[serde(rename = "type")]
    pub node_type: NodeType,
}

impl NodeInfo {
    /// Creates a node record.
    #[must_use]
    pub fn new(addr: u32, name: impl Into<String>, node_type: impl Into<NodeType>) -> Self {
        Self {
            addr,
            name: name.into(),
            node_type: node_type.into(),
        }
    }

    /// Returns the key identifying this node within its device.
    #[must_use]
    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.node_type.clone(), self.addr)
    }
}

/// A device as listed by the vendor session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Stable vendor identifier.
    pub dev_id: String,
    /// User-assigned device name.
    pub name: String,
}

impl DeviceInfo {
    /// Creates a device record.
    #[must_use]
    pub fn new(dev_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            dev_id: dev_id.into(),
            name: name.into(),
        }
    }
}

/// Device-wide away status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AwayStatus {
    /// Whether the device is in away mode.
    pub away: bool,
    /// Whether automatic away detection is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Whether away mode was forced by the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced: Option<bool>,
}

impl AwayStatus {
    /// Creates an away status carrying only the away flag.
    #[must_use]
    pub const fn new(away: bool) -> Self {
        Self {
            away,
            enabled: None,
            forced: None,
        }
    }
}
