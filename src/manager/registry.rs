// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of live devices for an integration instance.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};

use crate::device::SmartboxDevice;
use crate::error::Error;
use crate::event::{EventBus, SmartboxEvent};
use crate::node::SmartboxNode;
use crate::session::Connector;
use crate::types::NodeKey;

use super::config::SmartboxConfig;
use super::discovery::get_devices;

/// Owns the devices of every configured account.
///
/// A registry replaces ambient global state: hosts create one per
/// integration instance and pass it to whatever needs device or node
/// lookup. All devices publish on the registry's event bus.
///
/// # Examples
///
/// ```ignore
/// use smartbox_lib::manager::{SmartboxConfig, SmartboxRegistry};
///
/// let registry = SmartboxRegistry::setup(&config, connector).await?;
///
/// let mut events = registry.subscribe();
/// tokio::spawn(async move {
///     while let Ok(event) = events.recv().await {
///         println!("{event:?}");
///     }
/// });
///
/// for node in registry.heater_nodes().await {
///     println!("{} ({})", node.name(), node.node_id());
/// }
///
/// registry.shutdown().await;
/// ```
#[derive(Debug)]
pub struct SmartboxRegistry {
    /// Live devices, keyed by device ID.
    devices: Arc<RwLock<HashMap<String, SmartboxDevice>>>,
    /// Event bus shared by all devices.
    event_bus: EventBus,
}

impl SmartboxRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            devices: Arc::new(RwLock::new(HashMap::new())),
            event_bus: EventBus::new(),
        }
    }

    /// Creates an empty registry with a custom event bus capacity.
    #[must_use]
    pub fn with_capacity(event_capacity: usize) -> Self {
        Self {
            devices: Arc::new(RwLock::new(HashMap::new())),
            event_bus: EventBus::with_capacity(event_capacity),
        }
    }

    /// Validates the configuration, connects every account and initialises
    /// its configured devices.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or any account's
    /// session, device listing or device initialisation fails. Nothing is
    /// left running on failure.
    pub async fn setup(
        config: &SmartboxConfig,
        connector: Arc<dyn Connector>,
    ) -> crate::Result<Self> {
        config.validate()?;

        let registry = Self::new();
        for account in &config.accounts {
            let devices = match get_devices(
                &connector,
                account,
                &config.basic_auth_creds,
                config.away_preset,
                &registry.event_bus,
            )
            .await
            {
                Ok(devices) => devices,
                Err(e) => {
                    tracing::error!(
                        api_name = %account.api_name,
                        error = %e,
                        "Account setup failed"
                    );
                    registry.shutdown().await;
                    return Err(e);
                }
            };
            registry.insert_all(devices).await;
        }

        registry.report_unsupported_nodes().await;
        tracing::info!(devices = registry.len().await, "Smartbox registry set up");
        Ok(registry)
    }

    // =========================================================================
    // Subscription
    // =========================================================================

    /// Subscribes to events from every device.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SmartboxEvent> {
        self.event_bus.subscribe()
    }

    /// Returns the event bus devices publish on.
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    // =========================================================================
    // Device Management
    // =========================================================================

    /// Adds devices to the registry. A device whose ID is already present
    /// replaces the previous one, which is shut down.
    pub async fn insert_all(&self, devices: impl IntoIterator<Item = SmartboxDevice>) {
        let mut guard = self.devices.write().await;
        for device in devices {
            let dev_id = device.dev_id().to_string();
            if let Some(previous) = guard.insert(dev_id.clone(), device) {
                tracing::warn!(dev_id = %dev_id, "Device registered twice, replacing");
                previous.shutdown();
            }
        }
    }

    async fn report_unsupported_nodes(&self) {
        let unsupported: BTreeSet<String> = self
            .nodes()
            .await
            .into_iter()
            .filter(|node| !node.is_heater())
            .map(|node| node.node_type().as_str().to_string())
            .collect();
        for node_type in unsupported {
            tracing::error!(node_type = %node_type, "Unsupported node type");
        }
    }

    /// Returns the number of devices.
    pub async fn len(&self) -> usize {
        self.devices.read().await.len()
    }

    /// Returns true if the registry holds no devices.
    pub async fn is_empty(&self) -> bool {
        self.devices.read().await.is_empty()
    }

    /// Returns all devices, ordered by device ID.
    pub async fn devices(&self) -> Vec<SmartboxDevice> {
        let mut devices: Vec<_> = self.devices.read().await.values().cloned().collect();
        devices.sort_by(|a, b| a.dev_id().cmp(b.dev_id()));
        devices
    }

    /// Looks up a device.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`] if no device has this ID.
    pub async fn device(&self, dev_id: &str) -> crate::Result<SmartboxDevice> {
        self.devices
            .read()
            .await
            .get(dev_id)
            .cloned()
            .ok_or_else(|| Error::DeviceNotFound(dev_id.to_string()))
    }

    /// Returns the nodes of every device.
    pub async fn nodes(&self) -> Vec<SmartboxNode> {
        self.devices()
            .await
            .iter()
            .flat_map(SmartboxDevice::nodes)
            .collect()
    }

    /// Returns the heater nodes of every device.
    pub async fn heater_nodes(&self) -> Vec<SmartboxNode> {
        self.devices()
            .await
            .iter()
            .flat_map(SmartboxDevice::heater_nodes)
            .collect()
    }

    /// Looks up a node of a device.
    pub async fn node(&self, dev_id: &str, key: &NodeKey) -> Option<SmartboxNode> {
        self.device(dev_id).await.ok()?.node(key)
    }

    /// Shuts every device down and empties the registry.
    pub async fn shutdown(&self) {
        let devices: Vec<_> = self.devices.write().await.drain().collect();
        for (_, device) in &devices {
            device.shutdown();
        }
        tracing::debug!(devices = devices.len(), "Smartbox registry shut down");
    }
}

impl Default for SmartboxRegistry {
    fn default() -> Self {
        Self::new()
    }
}
