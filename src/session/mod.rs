// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary with the vendor cloud client.
//!
//! This library does not talk to the Smartbox cloud itself. Hosts supply a
//! [`Connector`] that authenticates and returns a [`Session`]; the session
//! answers snapshot requests, accepts commands and opens the per-device push
//! socket.
//!
//! # Blocking calls
//!
//! [`Session`] methods are synchronous, matching the vendor client. Devices
//! and nodes never call them on the async scheduler directly: every call
//! runs on tokio's blocking pool.
//!
//! # Push socket
//!
//! [`Session::open_socket`] returns a [`PushTask`] future that delivers
//! messages through [`PushCallbacks`] until the channel ends. Reconnection
//! within the task is the session's job, following the [`RetryPolicy`] it
//! receives.

mod topic;

pub use topic::Topic;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::manager::RetryPolicy;
use crate::types::{AwayStatus, DeviceInfo, NodeInfo, SetupMap, StatusMap};

/// Long-running push socket task. Completes when the channel ends.
pub type PushTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A message delivered on the push socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushUpdate {
    /// Topic path, e.g. `/htr/2/status`.
    pub path: String,
    /// Message payload.
    pub body: Value,
}

impl PushUpdate {
    /// Creates a push update.
    #[must_use]
    pub fn new(path: impl Into<String>, body: Value) -> Self {
        Self {
            path: path.into(),
            body,
        }
    }
}

type DevDataFn = dyn Fn(Value) + Send + Sync;
type UpdateFn = dyn Fn(PushUpdate) + Send + Sync;

/// Callbacks a push socket invokes.
///
/// `on_dev_data` receives the full device payload sent when the socket
/// connects; `on_update` receives incremental updates by topic.
#[derive(Clone)]
pub struct PushCallbacks {
    on_dev_data: Arc<DevDataFn>,
    on_update: Arc<UpdateFn>,
}

impl PushCallbacks {
    /// Creates a callback pair.
    pub fn new<D, U>(on_dev_data: D, on_update: U) -> Self
    where
        D: Fn(Value) + Send + Sync + 'static,
        U: Fn(PushUpdate) + Send + Sync + 'static,
    {
        Self {
            on_dev_data: Arc::new(on_dev_data),
            on_update: Arc::new(on_update),
        }
    }

    /// Delivers a device data payload.
    pub fn dev_data(&self, data: Value) {
        (self.on_dev_data)(data);
    }

    /// Delivers an incremental update.
    pub fn update(&self, update: PushUpdate) {
        (self.on_update)(update);
    }
}

impl fmt::Debug for PushCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushCallbacks").finish_non_exhaustive()
    }
}

/// Account credentials passed to a [`Connector`].
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Vendor API name (selects the cloud endpoint).
    pub api_name: String,
    /// Client basic auth credentials for the vendor API.
    pub basic_auth_creds: String,
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_name", &self.api_name)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// A synchronous session with the vendor cloud.
///
/// All methods may block on network I/O.
pub trait Session: Send + Sync {
    /// Lists the devices of the account.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails.
    fn get_devices(&self) -> Result<Vec<DeviceInfo>, ProtocolError>;

    /// Lists the nodes of a device.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails.
    fn get_nodes(&self, dev_id: &str) -> Result<Vec<NodeInfo>, ProtocolError>;

    /// Fetches a node status snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails.
    fn get_status(&self, dev_id: &str, node: &NodeInfo) -> Result<StatusMap, ProtocolError>;

    /// Fetches a node setup snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails.
    fn get_setup(&self, dev_id: &str, node: &NodeInfo) -> Result<SetupMap, ProtocolError>;

    /// Writes a partial node status.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails.
    fn set_status(
        &self,
        dev_id: &str,
        node: &NodeInfo,
        status: &StatusMap,
    ) -> Result<(), ProtocolError>;

    /// Writes a partial node setup.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails.
    fn set_setup(&self, dev_id: &str, node: &NodeInfo, setup: &SetupMap)
    -> Result<(), ProtocolError>;

    /// Fetches the device away status.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails.
    fn get_device_away_status(&self, dev_id: &str) -> Result<AwayStatus, ProtocolError>;

    /// Writes the device away status.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails.
    fn set_device_away_status(&self, dev_id: &str, status: &AwayStatus)
    -> Result<(), ProtocolError>;

    /// Fetches the device power limit in watts, `None` if the device has no
    /// power limit feature.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails.
    fn get_device_power_limit(&self, dev_id: &str) -> Result<Option<u32>, ProtocolError>;

    /// Writes the device power limit in watts.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails.
    fn set_device_power_limit(&self, dev_id: &str, limit: u32) -> Result<(), ProtocolError>;

    /// Opens the push socket for a device.
    ///
    /// The returned task runs until the channel ends; dropping or aborting it
    /// closes the socket.
    fn open_socket(&self, dev_id: &str, callbacks: PushCallbacks, retry: &RetryPolicy)
    -> PushTask;
}

/// Creates authenticated sessions.
pub trait Connector: Send + Sync {
    /// Authenticates and returns a session.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if authentication or the connection fails.
    fn connect(
        &self,
        credentials: &Credentials,
        retry: &RetryPolicy,
    ) -> Result<Arc<dyn Session>, ProtocolError>;
}

/// Runs a blocking session call on the blocking thread pool.
pub(crate) async fn blocking<T, F>(op: &'static str, f: F) -> Result<T, ProtocolError>
where
    F: FnOnce() -> Result<T, ProtocolError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!(op, error = %e, "Blocking session call failed to complete");
        ProtocolError::TaskFailed(format!("{op}: {e}"))
    })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn push_update_deserializes() {
        let update: PushUpdate =
            serde_json::from_str(r#"{"path": "/mgr/away_status", "body": {"away": true}}"#)
                .unwrap();
        assert_eq!(update.path, "/mgr/away_status");
        assert_eq!(update.body["away"], true);
    }

    #[test]
    fn callbacks_forward_messages() {
        let dev_data = Arc::new(AtomicU32::new(0));
        let updates = Arc::new(AtomicU32::new(0));
        let callbacks = PushCallbacks::new(
            {
                let dev_data = dev_data.clone();
                move |_| {
                    dev_data.fetch_add(1, Ordering::SeqCst);
                }
            },
            {
                let updates = updates.clone();
                move |_| {
                    updates.fetch_add(1, Ordering::SeqCst);
                }
            },
        );

        callbacks.dev_data(serde_json::json!({}));
        callbacks.clone().update(PushUpdate::new("/connected", Value::Null));
        callbacks.update(PushUpdate::new("/connected", Value::Null));

        assert_eq!(dev_data.load(Ordering::SeqCst), 1);
        assert_eq!(updates.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn credentials_debug_hides_secrets() {
        let creds = Credentials {
            api_name: "api".to_string(),
            basic_auth_creds: "c2VjcmV0".to_string(),
            username: "user".to_string(),
            password: "hunter2".to_string(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("user"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("c2VjcmV0"));
    }

    #[tokio::test]
    async fn blocking_returns_closure_result() {
        let value = blocking("test", || Ok::<_, ProtocolError>(42)).await.unwrap();
        assert_eq!(value, 42);

        let err = blocking("test", || Err::<u32, _>(ProtocolError::AuthenticationFailed))
            .await
            .unwrap_err();
        assert_eq!(err, ProtocolError::AuthenticationFailed);
    }

    #[tokio::test]
    async fn blocking_maps_panics_to_task_failed() {
        let err = blocking("panics", || -> Result<(), ProtocolError> { panic!("boom") })
            .await
            .unwrap_err();
        assert!(matches!(err, ProtocolError::TaskFailed(ref msg) if msg.starts_with("panics")));
    }
}
