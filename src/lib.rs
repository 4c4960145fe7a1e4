// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Smartbox Lib - A Rust library mirroring Smartbox heaters.
//!
//! This library keeps an in-memory model of Smartbox devices (hubs) and
//! their nodes (heaters) in sync with the vendor cloud, and translates
//! between the vendor's raw status dictionaries and climate concepts.
//!
//! # Supported Features
//!
//! - **Climate control**: target temperature, HVAC mode, presets
//! - **Node types**: plain (`htr`), storage (`acm`) and modulating (`htr_mod`)
//!   heaters
//! - **Readings**: room temperature, power, duty cycle, charge level, energy
//! - **Device features**: away status, power limit, window mode, true radiant
//! - **Push updates**: per-device push channel routed into the cache, with
//!   broadcast events for hosts
//!
//! The vendor cloud client itself is not part of this library: hosts provide
//! a [`Connector`](session::Connector) and [`Session`](session::Session).
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use smartbox_lib::manager::{SmartboxConfig, SmartboxRegistry};
//! use smartbox_lib::types::HvacMode;
//!
//! #[tokio::main]
//! async fn main() -> smartbox_lib::Result<()> {
//!     let config: SmartboxConfig = load_config();
//!     let registry = SmartboxRegistry::setup(&config, Arc::new(VendorConnector)).await?;
//!
//!     for node in registry.heater_nodes().await {
//!         println!("{}: {}", node.name(), node.current_temperature()?);
//!         node.set_hvac_mode(HvacMode::Auto).await?;
//!     }
//!
//!     registry.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Pure Status Translation
//!
//! The translator works on plain status maps and needs no session:
//!
//! ```
//! use smartbox_lib::status;
//! use smartbox_lib::types::{HeaterType, StatusMap};
//!
//! let status: StatusMap = serde_json::from_value(serde_json::json!({
//!     "mode": "manual",
//!     "selected_temp": "eco",
//!     "comfort_temp": "17.2",
//!     "eco_offset": "4",
//! }))
//! .unwrap();
//!
//! let target = status::target_temperature(HeaterType::HtrMod, &status).unwrap();
//! assert!((target - 13.2).abs() < 1e-9);
//! ```

pub mod capabilities;
pub mod device;
pub mod error;
pub mod event;
pub mod manager;
pub mod node;
pub mod session;
pub mod state;
pub mod status;
pub mod types;

pub use capabilities::NodeCapabilities;
pub use device::SmartboxDevice;
pub use error::{
    DeviceError, Error, ProtocolError, Result, RoutingError, StatusError, ValueError,
};
pub use manager::{SmartboxConfig, SmartboxRegistry};
pub use node::SmartboxNode;
pub use types::{HeaterType, HvacMode, NodeKey, NodeType, PresetMode};
