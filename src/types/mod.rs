// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared across the library.
//!
//! # Types
//!
//! - [`NodeType`] / [`HeaterType`] - What kind of unit a node is
//! - [`NodeKey`] - `(node_type, addr)` identity of a node within a device
//! - [`NodeInfo`] / [`DeviceInfo`] - Discovery records from the vendor session
//! - [`HvacMode`] / [`PresetMode`] - Normalized climate state
//! - [`HeaterMode`] / [`SelectedTemp`] - Vendor mode vocabulary
//! - [`TemperatureUnit`] - Unit reported in node status
//!
//! Node status and setup stay as raw JSON objects ([`StatusMap`],
//! [`SetupMap`]) because push updates merge into them key by key; typed
//! access happens in the [`status`](crate::status) translator.

mod mode;
mod node;

pub use mode::{HeaterMode, HvacMode, PresetMode, SelectedTemp, TemperatureUnit};
pub use node::{AwayStatus, DeviceInfo, HeaterType, NodeInfo, NodeKey, NodeType};

/// Raw node status as reported by the vendor.
pub type StatusMap = serde_json::Map<String, serde_json::Value>;

/// Raw node setup as reported by the vendor.
pub type SetupMap = serde_json::Map<String, serde_json::Value>;
