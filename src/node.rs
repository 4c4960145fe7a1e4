// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A single heater unit within a device.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;

use crate::capabilities::{self, NodeCapabilities};
use crate::device::{DeviceInner, SmartboxDevice};
use crate::error::{DeviceError, Error, StatusError};
use crate::manager::AwayPresetPolicy;
use crate::session::{Session, blocking};
use crate::state::NodeState;
use crate::status;
use crate::types::{
    HeaterType, HvacMode, NodeInfo, NodeKey, NodeType, PresetMode, SetupMap, StatusMap,
    TemperatureUnit,
};

/// A node (heater) of a Smartbox device.
///
/// Nodes are cheap to clone; clones share the same cached state. The cache
/// is kept current by the owning device's push channel and by the node's own
/// commands.
///
/// The node holds only a weak reference to its device. Once the device is
/// dropped, [`away`](Self::away) reports `false` and device-level presets
/// fail with [`DeviceError::DeviceDropped`].
///
/// # Examples
///
/// ```ignore
/// let node = device.node(&NodeKey::new(HeaterType::HtrMod, 1)).unwrap();
///
/// println!("{} is at {}", node.name(), node.current_temperature()?);
/// node.set_hvac_mode(HvacMode::Heat).await?;
/// node.set_target_temperature(21.5).await?;
/// ```
#[derive(Clone)]
pub struct SmartboxNode {
    inner: Arc<NodeInner>,
}

struct NodeInner {
    dev_id: String,
    info: NodeInfo,
    session: Arc<dyn Session>,
    device: Weak<DeviceInner>,
    state: RwLock<NodeState>,
}

impl SmartboxNode {
    pub(crate) fn new(
        dev_id: impl Into<String>,
        info: NodeInfo,
        session: Arc<dyn Session>,
        device: Weak<DeviceInner>,
        status: StatusMap,
        setup: SetupMap,
    ) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                dev_id: dev_id.into(),
                info,
                session,
                device,
                state: RwLock::new(NodeState::new(status, setup)),
            }),
        }
    }

    // ========== Identity ==========

    /// Returns the owning device ID.
    #[must_use]
    pub fn dev_id(&self) -> &str {
        &self.inner.dev_id
    }

    /// Returns the node name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.info.name
    }

    /// Returns the node address.
    #[must_use]
    pub fn addr(&self) -> u32 {
        self.inner.info.addr
    }

    /// Returns the node type.
    #[must_use]
    pub fn node_type(&self) -> &NodeType {
        &self.inner.info.node_type
    }

    /// Returns the vendor node record.
    #[must_use]
    pub fn info(&self) -> &NodeInfo {
        &self.inner.info
    }

    /// Returns the key of this node within its device.
    #[must_use]
    pub fn key(&self) -> NodeKey {
        self.inner.info.key()
    }

    /// Returns a stable identifier, `{dev_id}-{addr}`, for host entities.
    #[must_use]
    pub fn node_id(&self) -> String {
        format!("{}-{}", self.inner.dev_id, self.inner.info.addr)
    }

    /// Returns true if this node is a supported heater.
    #[must_use]
    pub fn is_heater(&self) -> bool {
        self.inner.info.node_type.is_heater()
    }

    fn heater(&self) -> Result<HeaterType, StatusError> {
        self.inner.info.node_type.heater().ok_or_else(|| {
            StatusError::UnsupportedOperation(format!(
                "node type {} is not a supported heater",
                self.inner.info.node_type
            ))
        })
    }

    // ========== Cached state ==========

    /// Returns a copy of the current status.
    #[must_use]
    pub fn status(&self) -> StatusMap {
        self.inner.state.read().status().clone()
    }

    /// Returns a copy of the current setup.
    #[must_use]
    pub fn setup(&self) -> SetupMap {
        self.inner.state.read().setup().clone()
    }

    /// Returns a copy of the full cached state.
    #[must_use]
    pub fn state(&self) -> NodeState {
        self.inner.state.read().clone()
    }

    /// When the status was last written from the vendor.
    #[must_use]
    pub fn last_status_update(&self) -> DateTime<Utc> {
        self.inner.state.read().status_updated_at()
    }

    /// Returns the device-wide away flag.
    #[must_use]
    pub fn away(&self) -> bool {
        self.inner.device.upgrade().is_some_and(|device| device.away())
    }

    /// Returns the current status. Push updates keep the cache fresh, so
    /// polling does not hit the network.
    pub async fn async_update(&self) -> StatusMap {
        self.status()
    }

    /// Re-fetches status and setup snapshots from the vendor.
    ///
    /// # Errors
    ///
    /// Returns an error if either request fails; the cache is then unchanged.
    pub async fn refresh(&self) -> crate::Result<StatusMap> {
        let status = {
            let (session, dev_id, info) = self.call_parts();
            blocking("get_status", move || session.get_status(&dev_id, &info)).await?
        };
        let setup = {
            let (session, dev_id, info) = self.call_parts();
            blocking("get_setup", move || session.get_setup(&dev_id, &info)).await?
        };

        let mut state = self.inner.state.write();
        state.replace_status(status);
        state.replace_setup(setup);
        Ok(state.status().clone())
    }

    /// Merges a partial status update from the vendor.
    pub fn update_status(&self, partial: &StatusMap) {
        tracing::debug!(
            dev_id = %self.inner.dev_id,
            node = %self.key(),
            "Node status update"
        );
        self.inner.state.write().merge_status(partial);
    }

    /// Merges a partial setup update from the vendor.
    pub fn update_setup(&self, partial: &SetupMap) {
        tracing::debug!(
            dev_id = %self.inner.dev_id,
            node = %self.key(),
            "Node setup update"
        );
        self.inner.state.write().merge_setup(partial);
    }

    /// Replaces the status with a fresh snapshot.
    pub fn replace_status(&self, status: StatusMap) {
        self.inner.state.write().replace_status(status);
    }

    /// Replaces the setup with a fresh snapshot.
    pub fn replace_setup(&self, setup: SetupMap) {
        self.inner.state.write().replace_setup(setup);
    }

    // ========== Commands ==========

    fn call_parts(&self) -> (Arc<dyn Session>, String, NodeInfo) {
        (
            Arc::clone(&self.inner.session),
            self.inner.dev_id.clone(),
            self.inner.info.clone(),
        )
    }

    /// Writes a partial status and, once the vendor accepts it, merges it
    /// into the cache.
    ///
    /// If a vendor status update arrived while the write was in flight, the
    /// local merge is skipped and the newer vendor status is kept. Setup
    /// updates do not affect the merge.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; the cache is then unchanged.
    pub async fn set_status(&self, args: StatusMap) -> crate::Result<()> {
        let observed = self.inner.state.read().status_generation();
        let (session, dev_id, info) = self.call_parts();
        let sent = args.clone();
        blocking("set_status", move || session.set_status(&dev_id, &info, &sent)).await?;

        if !self.inner.state.write().apply_status_command(observed, &args) {
            tracing::warn!(
                dev_id = %self.inner.dev_id,
                node = %self.key(),
                "Status changed remotely during command, keeping remote status"
            );
        }
        Ok(())
    }

    /// Writes a partial setup, with the same caching contract as
    /// [`set_status`](Self::set_status).
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; the cache is then unchanged.
    pub async fn set_setup(&self, args: SetupMap) -> crate::Result<()> {
        let observed = self.inner.state.read().setup_generation();
        let (session, dev_id, info) = self.call_parts();
        let sent = args.clone();
        blocking("set_setup", move || session.set_setup(&dev_id, &info, &sent)).await?;

        if !self.inner.state.write().apply_setup_command(observed, &args) {
            tracing::warn!(
                dev_id = %self.inner.dev_id,
                node = %self.key(),
                "Setup changed remotely during command, keeping remote setup"
            );
        }
        Ok(())
    }

    // ========== Climate ==========

    /// Returns the target temperature.
    ///
    /// # Errors
    ///
    /// Returns a [`StatusError`] if the node is not a heater or its status is
    /// incomplete.
    pub fn target_temperature(&self) -> crate::Result<f64> {
        let heater = self.heater()?;
        Ok(status::target_temperature(heater, self.inner.state.read().status())?)
    }

    /// Sets the target temperature.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be built (for example in ice
    /// mode) or the write fails.
    pub async fn set_target_temperature(&self, target: f64) -> crate::Result<()> {
        let heater = self.heater()?;
        let args = status::set_temperature_args(heater, self.inner.state.read().status(), target)?;
        self.set_status(args).await
    }

    /// Returns the HVAC mode.
    ///
    /// # Errors
    ///
    /// Returns a [`StatusError`] for incomplete status or an unknown mode.
    pub fn hvac_mode(&self) -> crate::Result<HvacMode> {
        let heater = self.heater()?;
        Ok(status::hvac_mode(heater, self.inner.state.read().status())?)
    }

    /// Sets the HVAC mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be built or the write fails.
    pub async fn set_hvac_mode(&self, mode: HvacMode) -> crate::Result<()> {
        let heater = self.heater()?;
        let args = status::set_hvac_mode_args(heater, self.inner.state.read().status(), mode)?;
        self.set_status(args).await
    }

    /// Returns the preset, taking the device away flag into account.
    ///
    /// # Errors
    ///
    /// Returns a [`StatusError`] for incomplete status or an unknown mode.
    pub fn preset_mode(&self) -> crate::Result<PresetMode> {
        let heater = self.heater()?;
        let away = self.away();
        Ok(status::preset_mode(heater, self.inner.state.read().status(), away)?)
    }

    /// Returns the presets this node offers.
    #[must_use]
    pub fn preset_modes(&self) -> &'static [PresetMode] {
        match self.inner.info.node_type.heater() {
            Some(heater) => status::preset_modes(heater),
            None => &[],
        }
    }

    /// Selects a preset.
    ///
    /// `Away` and `Home` go through the device away flag when the device's
    /// [`AwayPresetPolicy`] is `DeviceAway`, and are rejected under
    /// `SwitchOnly`. Selecting any other preset while away clears the away
    /// flag first; if the status write then fails, the away flag is set
    /// again.
    ///
    /// # Errors
    ///
    /// Returns an error if the preset is not available for this node, the
    /// device has been dropped, or a write fails.
    pub async fn set_preset_mode(&self, preset: PresetMode) -> crate::Result<()> {
        if preset.is_device_preset() {
            let device = self.device()?;
            return match device.away_preset_policy() {
                AwayPresetPolicy::DeviceAway => {
                    device.set_away_status(preset == PresetMode::Away).await
                }
                AwayPresetPolicy::SwitchOnly => Err(StatusError::DevicePreset(preset).into()),
            };
        }

        let heater = self.heater()?;
        let args = status::set_preset_mode_args(heater, preset)?;
        let Some(device) = self.device().ok().filter(|device| {
            device.away() && device.away_preset_policy() == AwayPresetPolicy::DeviceAway
        }) else {
            return self.set_status(args).await;
        };

        device.set_away_status(false).await?;
        let result = self.set_status(args).await;
        if result.is_err()
            && let Err(e) = device.set_away_status(true).await
        {
            tracing::warn!(
                dev_id = %self.inner.dev_id,
                node = %self.key(),
                error = %e,
                "Failed to restore away status after preset change failed"
            );
        }
        result
    }

    /// Returns whether the heater is currently heating (or charging).
    ///
    /// # Errors
    ///
    /// Returns a [`StatusError`] if the flag is missing.
    pub fn is_heating(&self) -> crate::Result<bool> {
        let heater = self.heater()?;
        Ok(status::is_heating(heater, self.inner.state.read().status())?)
    }

    fn device(&self) -> Result<SmartboxDevice, Error> {
        self.inner
            .device
            .upgrade()
            .map(SmartboxDevice::from_inner)
            .ok_or_else(|| DeviceError::DeviceDropped(self.inner.dev_id.clone()).into())
    }

    // ========== Readings ==========

    /// Measured room temperature.
    ///
    /// # Errors
    ///
    /// Returns a [`StatusError`] if the reading is missing.
    pub fn current_temperature(&self) -> crate::Result<f64> {
        let heater = self.heater()?;
        Ok(status::current_temperature(heater, self.inner.state.read().status())?)
    }

    /// Temperature unit, if reported.
    ///
    /// # Errors
    ///
    /// Returns a [`StatusError`] for an unknown unit.
    pub fn temperature_unit(&self) -> crate::Result<Option<TemperatureUnit>> {
        let heater = self.heater()?;
        Ok(status::temperature_unit(heater, self.inner.state.read().status())?)
    }

    /// Power drawn while heating, 0 when idle.
    ///
    /// # Errors
    ///
    /// Returns a [`StatusError`] if the reading is missing.
    pub fn power(&self) -> crate::Result<f64> {
        let heater = self.heater()?;
        Ok(status::power(heater, self.inner.state.read().status())?)
    }

    /// Duty cycle in percent.
    ///
    /// # Errors
    ///
    /// Returns a [`StatusError`] if the reading is missing.
    pub fn duty_cycle(&self) -> crate::Result<f64> {
        let heater = self.heater()?;
        Ok(status::duty_cycle(heater, self.inner.state.read().status())?)
    }

    /// Storage charge level in percent.
    ///
    /// # Errors
    ///
    /// Returns a [`StatusError`] if the reading is missing.
    pub fn charge_level(&self) -> crate::Result<f64> {
        let heater = self.heater()?;
        Ok(status::charge_level(heater, self.inner.state.read().status())?)
    }

    /// Whether the node controls are locked.
    ///
    /// # Errors
    ///
    /// Returns a [`StatusError`] if the flag is missing.
    pub fn locked(&self) -> crate::Result<bool> {
        let heater = self.heater()?;
        Ok(status::locked(heater, self.inner.state.read().status())?)
    }

    /// Whether the node is in sync with the vendor cloud.
    #[must_use]
    pub fn is_available(&self) -> bool {
        status::is_available(self.inner.state.read().status())
    }

    /// Energy consumed since the last status update at the current power
    /// and duty cycle, in watt-hours. The initial snapshot counts as an
    /// update.
    ///
    /// # Errors
    ///
    /// Returns a [`StatusError`] if a reading is missing.
    pub fn energy_since_last_update(&self) -> crate::Result<f64> {
        let heater = self.heater()?;
        let state = self.inner.state.read();
        let elapsed = (Utc::now() - state.status_updated_at())
            .to_std()
            .unwrap_or(Duration::ZERO);
        Ok(status::energy_consumed(heater, state.status(), elapsed)?)
    }

    // ========== Setup features ==========

    /// Returns the node capabilities.
    #[must_use]
    pub fn capabilities(&self) -> NodeCapabilities {
        NodeCapabilities::detect(&self.inner.info.node_type, self.inner.state.read().setup())
    }

    /// Returns true if the node offers window-open detection.
    #[must_use]
    pub fn supports_window_mode(&self) -> bool {
        self.capabilities().window_mode
    }

    /// Returns true if the node offers true radiant control.
    #[must_use]
    pub fn supports_true_radiant(&self) -> bool {
        self.capabilities().true_radiant
    }

    /// Whether window-open detection is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`StatusError::MissingField`] if the setup does not carry the
    /// flag.
    pub fn window_mode(&self) -> crate::Result<bool> {
        let state = self.inner.state.read();
        Ok(capabilities::window_mode_enabled(
            &self.inner.info.node_type,
            state.setup(),
        )?)
    }

    /// Enables or disables window-open detection.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn set_window_mode(&self, enabled: bool) -> crate::Result<()> {
        self.set_setup(setup_flag("window_mode_enabled", enabled)).await
    }

    /// Whether true radiant control is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`StatusError::MissingField`] if the setup does not carry the
    /// flag.
    pub fn true_radiant(&self) -> crate::Result<bool> {
        let state = self.inner.state.read();
        Ok(capabilities::true_radiant_enabled(
            &self.inner.info.node_type,
            state.setup(),
        )?)
    }

    /// Enables or disables true radiant control.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn set_true_radiant(&self, enabled: bool) -> crate::Result<()> {
        self.set_setup(setup_flag("true_radiant_enabled", enabled)).await
    }
}

fn setup_flag(key: &str, enabled: bool) -> SetupMap {
    let mut setup = SetupMap::new();
    setup.insert(key.to_string(), Value::Bool(enabled));
    setup
}

impl fmt::Debug for SmartboxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmartboxNode")
            .field("dev_id", &self.inner.dev_id)
            .field("info", &self.inner.info)
            .finish_non_exhaustive()
    }
}
