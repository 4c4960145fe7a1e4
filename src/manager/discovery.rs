// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Account bootstrap: session creation and device discovery.

use std::sync::Arc;

use crate::device::SmartboxDevice;
use crate::event::EventBus;
use crate::session::{Connector, Session, blocking};
use crate::types::DeviceInfo;

use super::config::{AccountConfig, AwayPresetPolicy};

/// Authenticates an account through the connector.
///
/// # Errors
///
/// Returns a protocol error if authentication fails.
pub async fn connect(
    connector: &Arc<dyn Connector>,
    account: &AccountConfig,
    basic_auth_creds: &str,
) -> crate::Result<Arc<dyn Session>> {
    let connector = Arc::clone(connector);
    let credentials = account.credentials(basic_auth_creds);
    let retry = account.session_retry();

    let session = blocking("connect", move || connector.connect(&credentials, &retry)).await?;
    tracing::info!(
        api_name = %account.api_name,
        username = %account.username,
        "Created vendor session"
    );
    Ok(session)
}

/// Authenticates, lists the account's devices and initialises those the
/// account is configured for.
///
/// Devices the account does not name are skipped with a warning; configured
/// IDs the vendor does not list are logged as errors.
///
/// # Errors
///
/// Returns an error if authentication, the device listing or any device's
/// initialisation fails. Devices initialised before the failure are shut
/// down.
pub async fn get_devices(
    connector: &Arc<dyn Connector>,
    account: &AccountConfig,
    basic_auth_creds: &str,
    away_preset: AwayPresetPolicy,
    events: &EventBus,
) -> crate::Result<Vec<SmartboxDevice>> {
    let session = connect(connector, account, basic_auth_creds).await?;

    let listed = {
        let session = Arc::clone(&session);
        blocking("get_devices", move || session.get_devices()).await?
    };

    for dev_id in &account.device_ids {
        if !listed.iter().any(|info| &info.dev_id == dev_id) {
            tracing::error!(dev_id = %dev_id, "Configured device not found in account");
        }
    }

    let mut devices = Vec::new();
    for info in listed {
        if !account.is_configured(&info.dev_id) {
            tracing::warn!(
                dev_id = %info.dev_id,
                name = %info.name,
                "Found device but it is not configured"
            );
            continue;
        }

        tracing::info!(dev_id = %info.dev_id, name = %info.name, "Setting up configured device");
        match create_smartbox_device(
            Arc::clone(&session),
            info,
            account,
            away_preset,
            events.clone(),
        )
        .await
        {
            Ok(device) => devices.push(device),
            Err(e) => {
                for device in &devices {
                    device.shutdown();
                }
                return Err(e);
            }
        }
    }

    Ok(devices)
}

/// Creates a device and initialises it.
///
/// # Errors
///
/// Returns an error if initialisation fails.
pub async fn create_smartbox_device(
    session: Arc<dyn Session>,
    info: DeviceInfo,
    account: &AccountConfig,
    away_preset: AwayPresetPolicy,
    events: EventBus,
) -> crate::Result<SmartboxDevice> {
    let device = SmartboxDevice::new(info, session, account.socket_reconnect(), away_preset, events);
    device.initialise().await?;
    Ok(device)
}
