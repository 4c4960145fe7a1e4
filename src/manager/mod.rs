// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration, account bootstrap and the device registry.
//!
//! # Overview
//!
//! The [`SmartboxRegistry`] is the entry point for hosts. Given a
//! [`SmartboxConfig`] and a [`Connector`](crate::session::Connector), it:
//!
//! - **Validates configuration**: accounts, credentials and retry settings
//! - **Bootstraps accounts**: one vendor session per account
//! - **Initialises devices**: only those listed in the account's `device_ids`
//! - **Distributes events**: every device publishes on one event bus
//! - **Tears down**: [`SmartboxRegistry::shutdown`] stops every push channel
//!
//! # Examples
//!
//! ```ignore
//! use std::sync::Arc;
//! use smartbox_lib::manager::{SmartboxConfig, SmartboxRegistry};
//!
//! let config: SmartboxConfig = serde_json::from_str(&json)?;
//! let registry = SmartboxRegistry::setup(&config, Arc::new(MyConnector)).await?;
//!
//! for node in registry.heater_nodes().await {
//!     println!("{}: {:?}", node.name(), node.target_temperature());
//! }
//!
//! registry.shutdown().await;
//! ```

mod config;
mod discovery;
mod registry;

pub use config::{AccountConfig, AwayPresetPolicy, RetryPolicy, SmartboxConfig};
pub use discovery::{connect, create_smartbox_device, get_devices};
pub use registry::SmartboxRegistry;
