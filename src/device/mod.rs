// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Smartbox devices and their push channel.
//!
//! A [`SmartboxDevice`] mirrors one physical device of an account: its
//! away flag, its power limit and the [`SmartboxNode`]s behind it.
//!
//! # Lifecycle
//!
//! A device starts uninitialised. [`SmartboxDevice::initialise`] fetches the
//! node list and per-node snapshots, then opens the push socket and spawns a
//! task that routes incoming updates into the cache. [`SmartboxDevice::shutdown`]
//! stops that task. A device that has been shut down cannot be initialised
//! again; dropping the last handle also stops the task.
//!
//! ```ignore
//! let device = SmartboxDevice::new(info, session, RetryPolicy::default(),
//!     AwayPresetPolicy::default(), EventBus::new());
//! device.initialise().await?;
//!
//! for node in device.nodes() {
//!     println!("{}: {:?}", node.name(), node.current_temperature());
//! }
//!
//! device.shutdown();
//! ```

mod dispatch;

pub use dispatch::Routed;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::error::{DeviceError, Error};
use crate::event::{EventBus, SmartboxEvent};
use crate::manager::{AwayPresetPolicy, RetryPolicy};
use crate::node::SmartboxNode;
use crate::session::{PushCallbacks, Session, blocking};
use crate::types::{AwayStatus, DeviceInfo, NodeInfo, NodeKey};

/// A Smartbox device and its nodes.
///
/// Cloning is cheap; clones share the same device.
#[derive(Clone)]
pub struct SmartboxDevice {
    inner: Arc<DeviceInner>,
}

pub(crate) struct DeviceInner {
    info: DeviceInfo,
    session: Arc<dyn Session>,
    socket_retry: RetryPolicy,
    away_preset: AwayPresetPolicy,
    flags: RwLock<DeviceFlags>,
    nodes: RwLock<HashMap<NodeKey, SmartboxNode>>,
    lifecycle: Mutex<Lifecycle>,
    events: EventBus,
}

#[derive(Debug, Default, Clone, Copy)]
struct DeviceFlags {
    away: bool,
    power_limit: Option<u32>,
}

enum Lifecycle {
    Uninitialised,
    Initialising,
    Live(JoinHandle<()>),
    ShutDown,
}

impl DeviceInner {
    pub(crate) fn away(&self) -> bool {
        self.flags.read().away
    }
}

impl Drop for DeviceInner {
    fn drop(&mut self) {
        if let Lifecycle::Live(handle) = self.lifecycle.get_mut() {
            handle.abort();
        }
    }
}

impl SmartboxDevice {
    /// Creates an uninitialised device.
    ///
    /// Events for this device are published on `events`.
    #[must_use]
    pub fn new(
        info: DeviceInfo,
        session: Arc<dyn Session>,
        socket_retry: RetryPolicy,
        away_preset: AwayPresetPolicy,
        events: EventBus,
    ) -> Self {
        Self {
            inner: Arc::new(DeviceInner {
                info,
                session,
                socket_retry,
                away_preset,
                flags: RwLock::new(DeviceFlags::default()),
                nodes: RwLock::new(HashMap::new()),
                lifecycle: Mutex::new(Lifecycle::Uninitialised),
                events,
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<DeviceInner>) -> Self {
        Self { inner }
    }

    // ========== Lifecycle ==========

    /// Fetches the device's nodes and state, then starts the push channel.
    ///
    /// On failure the device stays uninitialised and may be retried.
    ///
    /// # Errors
    ///
    /// - [`DeviceError::AlreadyInitialised`] if initialisation already ran
    ///   or is running.
    /// - [`DeviceError::ShutDown`] if the device was shut down.
    /// - A protocol error if a snapshot request fails.
    pub async fn initialise(&self) -> crate::Result<()> {
        let dev_id = self.dev_id().to_string();
        {
            let mut lifecycle = self.inner.lifecycle.lock();
            match *lifecycle {
                Lifecycle::Uninitialised => *lifecycle = Lifecycle::Initialising,
                Lifecycle::Initialising | Lifecycle::Live(_) => {
                    return Err(DeviceError::AlreadyInitialised(dev_id).into());
                }
                Lifecycle::ShutDown => return Err(DeviceError::ShutDown(dev_id).into()),
            }
        }

        tracing::debug!(dev_id = %dev_id, "Initialising device");

        if let Err(e) = self.load().await {
            tracing::error!(dev_id = %dev_id, error = %e, "Device initialisation failed");
            let mut lifecycle = self.inner.lifecycle.lock();
            if matches!(*lifecycle, Lifecycle::Initialising) {
                *lifecycle = Lifecycle::Uninitialised;
            }
            return Err(e);
        }

        let mut lifecycle = self.inner.lifecycle.lock();
        if matches!(*lifecycle, Lifecycle::ShutDown) {
            return Err(DeviceError::ShutDown(dev_id).into());
        }
        *lifecycle = Lifecycle::Live(self.spawn_push_task());
        drop(lifecycle);

        tracing::info!(
            dev_id = %dev_id,
            name = %self.name(),
            nodes = self.inner.nodes.read().len(),
            "Device initialised"
        );
        Ok(())
    }

    async fn load(&self) -> crate::Result<()> {
        let dev_id = self.dev_id().to_string();

        let infos = {
            let session = Arc::clone(&self.inner.session);
            let dev_id = dev_id.clone();
            blocking("get_nodes", move || session.get_nodes(&dev_id)).await?
        };

        let mut nodes = HashMap::with_capacity(infos.len());
        for info in infos {
            let key = info.key();
            let node = self.load_node(info).await?;
            if nodes.insert(key.clone(), node).is_some() {
                tracing::warn!(dev_id = %dev_id, node = %key, "Duplicate node in node list");
            }
        }

        let away_status = {
            let session = Arc::clone(&self.inner.session);
            let dev_id = dev_id.clone();
            blocking("get_device_away_status", move || {
                session.get_device_away_status(&dev_id)
            })
            .await?
        };
        let power_limit = {
            let session = Arc::clone(&self.inner.session);
            let dev_id = dev_id.clone();
            blocking("get_device_power_limit", move || {
                session.get_device_power_limit(&dev_id)
            })
            .await?
        };

        *self.inner.nodes.write() = nodes;
        *self.inner.flags.write() = DeviceFlags {
            away: away_status.away,
            power_limit,
        };
        Ok(())
    }

    async fn load_node(&self, info: NodeInfo) -> crate::Result<SmartboxNode> {
        let status = {
            let session = Arc::clone(&self.inner.session);
            let dev_id = self.dev_id().to_string();
            let info = info.clone();
            blocking("get_status", move || session.get_status(&dev_id, &info)).await?
        };
        let setup = {
            let session = Arc::clone(&self.inner.session);
            let dev_id = self.dev_id().to_string();
            let info = info.clone();
            blocking("get_setup", move || session.get_setup(&dev_id, &info)).await?
        };

        let node = SmartboxNode::new(
            self.dev_id(),
            info,
            Arc::clone(&self.inner.session),
            Arc::downgrade(&self.inner),
            status,
            setup,
        );
        if node.is_heater() && !node.supports_window_mode() {
            tracing::info!(
                dev_id = %self.dev_id(),
                node = %node.key(),
                "Window mode not available for node"
            );
        }
        Ok(node)
    }

    /// Opens the push socket and spawns the task driving it.
    ///
    /// The callbacks and the task hold only weak references to the device.
    fn spawn_push_task(&self) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        let callbacks = PushCallbacks::new(
            {
                let weak = weak.clone();
                move |data| {
                    if let Some(inner) = weak.upgrade() {
                        SmartboxDevice::from_inner(inner).on_dev_data(&data);
                    }
                }
            },
            move |update| {
                if let Some(inner) = weak.upgrade() {
                    let device = SmartboxDevice::from_inner(inner);
                    if let Err(e) = device.handle_update(&update) {
                        tracing::error!(
                            dev_id = %device.dev_id(),
                            path = %update.path,
                            error = %e,
                            "Failed to route push update"
                        );
                    }
                }
            },
        );

        let task = self
            .inner
            .session
            .open_socket(self.dev_id(), callbacks, &self.inner.socket_retry);
        let dev_id = self.dev_id().to_string();
        let events = self.inner.events.clone();

        tokio::spawn(async move {
            tracing::debug!(dev_id = %dev_id, "Push channel started");
            task.await;
            tracing::warn!(dev_id = %dev_id, "Push channel ended");
            events.publish(SmartboxEvent::PushChannelClosed { dev_id });
        })
    }

    /// Stops the push channel. Idempotent.
    ///
    /// Cached state stays readable; commands still reach the vendor but the
    /// cache no longer follows remote changes.
    pub fn shutdown(&self) {
        let previous = std::mem::replace(&mut *self.inner.lifecycle.lock(), Lifecycle::ShutDown);
        if let Lifecycle::Live(handle) = previous {
            handle.abort();
            tracing::info!(dev_id = %self.dev_id(), "Device shut down");
        }
    }

    /// Returns true once the device is initialised and not shut down.
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(*self.inner.lifecycle.lock(), Lifecycle::Live(_))
    }

    fn ensure_initialised(&self) -> Result<(), DeviceError> {
        match *self.inner.lifecycle.lock() {
            Lifecycle::Uninitialised | Lifecycle::Initialising => {
                Err(DeviceError::NotInitialised(self.dev_id().to_string()))
            }
            Lifecycle::Live(_) | Lifecycle::ShutDown => Ok(()),
        }
    }

    /// Returns true if the device has been shut down.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        matches!(*self.inner.lifecycle.lock(), Lifecycle::ShutDown)
    }

    // ========== Identity ==========

    /// Returns the device ID.
    #[must_use]
    pub fn dev_id(&self) -> &str {
        &self.inner.info.dev_id
    }

    /// Returns the device name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.info.name
    }

    /// Returns the vendor device record.
    #[must_use]
    pub fn info(&self) -> &DeviceInfo {
        &self.inner.info
    }

    /// Returns how `Away` and `Home` presets are handled on this device.
    #[must_use]
    pub fn away_preset_policy(&self) -> AwayPresetPolicy {
        self.inner.away_preset
    }

    /// Subscribes to the event bus this device publishes on.
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SmartboxEvent> {
        self.inner.events.subscribe()
    }

    // ========== Nodes ==========

    /// Returns the device's nodes, ordered by type then address.
    #[must_use]
    pub fn nodes(&self) -> Vec<SmartboxNode> {
        let mut nodes: Vec<_> = self.inner.nodes.read().values().cloned().collect();
        nodes.sort_by(|a, b| {
            (a.node_type().as_str(), a.addr()).cmp(&(b.node_type().as_str(), b.addr()))
        });
        nodes
    }

    /// Returns the device's heater nodes.
    #[must_use]
    pub fn heater_nodes(&self) -> Vec<SmartboxNode> {
        self.nodes().into_iter().filter(SmartboxNode::is_heater).collect()
    }

    /// Looks up a node by key.
    #[must_use]
    pub fn node(&self, key: &NodeKey) -> Option<SmartboxNode> {
        self.inner.nodes.read().get(key).cloned()
    }

    // ========== Away status ==========

    /// Returns the device away flag.
    #[must_use]
    pub fn away(&self) -> bool {
        self.inner.away()
    }

    /// Sets the device away flag.
    ///
    /// # Errors
    ///
    /// - [`DeviceError::NotInitialised`] before [`initialise`](Self::initialise)
    ///   has completed.
    /// - A protocol error if the write fails; the flag is then unchanged.
    pub async fn set_away_status(&self, away: bool) -> crate::Result<()> {
        self.ensure_initialised()?;
        let session = Arc::clone(&self.inner.session);
        let dev_id = self.dev_id().to_string();
        blocking("set_device_away_status", move || {
            session.set_device_away_status(&dev_id, &AwayStatus::new(away))
        })
        .await?;

        self.apply_away(away);
        Ok(())
    }

    pub(crate) fn apply_away(&self, away: bool) {
        self.inner.flags.write().away = away;
        tracing::debug!(dev_id = %self.dev_id(), away, "Device away status updated");
        self.inner.events.publish(SmartboxEvent::AwayStatusChanged {
            dev_id: self.dev_id().to_string(),
            away,
        });
    }

    // ========== Power limit ==========

    /// Returns the power limit in watts, if the device has one.
    #[must_use]
    pub fn power_limit(&self) -> Option<u32> {
        self.inner.flags.read().power_limit
    }

    /// Returns true if the device reported a power limit.
    #[must_use]
    pub fn supports_power_limit(&self) -> bool {
        self.power_limit().is_some()
    }

    /// Sets the power limit in watts.
    ///
    /// # Errors
    ///
    /// - [`DeviceError::NotInitialised`] before [`initialise`](Self::initialise)
    ///   has completed.
    /// - [`DeviceError::InvalidConfiguration`] if the device has no power
    ///   limit feature.
    /// - A protocol error if the write fails; the limit is then unchanged.
    pub async fn set_power_limit(&self, limit: u32) -> crate::Result<()> {
        self.ensure_initialised()?;
        if !self.supports_power_limit() {
            return Err(Error::Device(DeviceError::InvalidConfiguration(format!(
                "device {} has no power limit",
                self.dev_id()
            ))));
        }

        let session = Arc::clone(&self.inner.session);
        let dev_id = self.dev_id().to_string();
        blocking("set_device_power_limit", move || {
            session.set_device_power_limit(&dev_id, limit)
        })
        .await?;

        self.apply_power_limit(limit);
        Ok(())
    }

    pub(crate) fn apply_power_limit(&self, limit: u32) {
        self.inner.flags.write().power_limit = Some(limit);
        tracing::debug!(dev_id = %self.dev_id(), limit, "Device power limit updated");
        self.inner.events.publish(SmartboxEvent::PowerLimitChanged {
            dev_id: self.dev_id().to_string(),
            limit,
        });
    }

    pub(crate) fn publish(&self, event: SmartboxEvent) {
        self.inner.events.publish(event);
    }
}

impl fmt::Debug for SmartboxDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = *self.inner.flags.read();
        f.debug_struct("SmartboxDevice")
            .field("info", &self.inner.info)
            .field("away", &flags.away)
            .field("power_limit", &flags.power_limit)
            .field("nodes", &self.inner.nodes.read().len())
            .finish_non_exhaustive()
    }
}
