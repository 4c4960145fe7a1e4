// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory vendor session shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use smartbox_lib::error::ProtocolError;
use smartbox_lib::event::SmartboxEvent;
use smartbox_lib::manager::RetryPolicy;
use smartbox_lib::session::{
    Connector, Credentials, PushCallbacks, PushTask, PushUpdate, Session,
};
use smartbox_lib::types::{AwayStatus, DeviceInfo, NodeInfo, SetupMap, StatusMap};
use tokio::sync::{broadcast, mpsc};

/// Converts a JSON object literal into a status or setup map.
pub fn map(value: Value) -> StatusMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Waits for the next event, failing the test after two seconds.
pub async fn next_event(rx: &mut broadcast::Receiver<SmartboxEvent>) -> SmartboxEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event bus closed")
}

/// A message fed into a mock push socket.
#[derive(Debug, Clone)]
pub enum SocketMessage {
    DevData(Value),
    Update(PushUpdate),
}

/// A write the mock session accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Status {
        dev_id: String,
        addr: u32,
        args: StatusMap,
    },
    Setup {
        dev_id: String,
        addr: u32,
        args: SetupMap,
    },
    Away {
        dev_id: String,
        away: bool,
    },
    PowerLimit {
        dev_id: String,
        limit: u32,
    },
}

struct MockNode {
    info: NodeInfo,
    status: StatusMap,
    setup: SetupMap,
}

type StatusHook = Box<dyn Fn(&StatusMap) + Send + Sync>;

/// In-memory [`Session`] with sockets fed through channels.
#[derive(Default)]
pub struct MockSession {
    devices: Mutex<Vec<DeviceInfo>>,
    nodes: Mutex<HashMap<String, Vec<MockNode>>>,
    away: Mutex<HashMap<String, bool>>,
    power_limits: Mutex<HashMap<String, u32>>,
    socket_tx: Mutex<HashMap<String, mpsc::UnboundedSender<SocketMessage>>>,
    socket_rx: Mutex<HashMap<String, mpsc::UnboundedReceiver<SocketMessage>>>,
    writes: Mutex<Vec<Write>>,
    on_set_status: Mutex<Option<StatusHook>>,
    fail_writes: AtomicBool,
    fail_status_writes: AtomicBool,
    fail_reads: AtomicBool,
    sockets_opened: AtomicU32,
}

impl MockSession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_device(&self, dev_id: &str, name: &str) {
        self.devices.lock().push(DeviceInfo::new(dev_id, name));
        let (tx, rx) = mpsc::unbounded_channel();
        self.socket_tx.lock().insert(dev_id.to_string(), tx);
        self.socket_rx.lock().insert(dev_id.to_string(), rx);
    }

    pub fn add_node(&self, dev_id: &str, info: NodeInfo, status: Value, setup: Value) {
        self.nodes
            .lock()
            .entry(dev_id.to_string())
            .or_default()
            .push(MockNode {
                info,
                status: map(status),
                setup: map(setup),
            });
    }

    pub fn set_away(&self, dev_id: &str, away: bool) {
        self.away.lock().insert(dev_id.to_string(), away);
    }

    pub fn set_power_limit(&self, dev_id: &str, limit: u32) {
        self.power_limits.lock().insert(dev_id.to_string(), limit);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Fails status writes only; other writes keep succeeding.
    pub fn fail_status_writes(&self, fail: bool) {
        self.fail_status_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Runs `hook` inside every status write, before it returns.
    pub fn on_set_status(&self, hook: impl Fn(&StatusMap) + Send + Sync + 'static) {
        *self.on_set_status.lock() = Some(Box::new(hook));
    }

    /// Feeds a push update into a device's socket.
    pub fn push(&self, dev_id: &str, path: &str, body: Value) {
        self.send(dev_id, SocketMessage::Update(PushUpdate::new(path, body)));
    }

    /// Feeds a device data payload into a device's socket.
    pub fn push_dev_data(&self, dev_id: &str, data: Value) {
        self.send(dev_id, SocketMessage::DevData(data));
    }

    fn send(&self, dev_id: &str, message: SocketMessage) {
        self.socket_tx
            .lock()
            .get(dev_id)
            .expect("unknown device socket")
            .send(message)
            .expect("socket closed");
    }

    /// Ends a device's push socket.
    pub fn close_socket(&self, dev_id: &str) {
        self.socket_tx.lock().remove(dev_id);
    }

    /// Returns true once the device's socket receiver has been dropped.
    pub fn socket_closed(&self, dev_id: &str) -> bool {
        self.socket_tx
            .lock()
            .get(dev_id)
            .is_none_or(mpsc::UnboundedSender::is_closed)
    }

    pub fn writes(&self) -> Vec<Write> {
        self.writes.lock().clone()
    }

    pub fn sockets_opened(&self) -> u32 {
        self.sockets_opened.load(Ordering::SeqCst)
    }

    fn check_read(&self) -> Result<(), ProtocolError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ProtocolError::RequestFailed("read refused".to_string()));
        }
        Ok(())
    }

    fn record(&self, write: Write) -> Result<(), ProtocolError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ProtocolError::RequestFailed("write refused".to_string()));
        }
        self.writes.lock().push(write);
        Ok(())
    }

    fn find_node<T>(
        &self,
        dev_id: &str,
        node: &NodeInfo,
        f: impl FnOnce(&MockNode) -> T,
    ) -> Result<T, ProtocolError> {
        self.check_read()?;
        self.nodes
            .lock()
            .get(dev_id)
            .and_then(|nodes| nodes.iter().find(|n| n.info == *node))
            .map(f)
            .ok_or_else(|| ProtocolError::RequestFailed(format!("no node {}", node.key())))
    }
}

impl Session for MockSession {
    fn get_devices(&self) -> Result<Vec<DeviceInfo>, ProtocolError> {
        self.check_read()?;
        Ok(self.devices.lock().clone())
    }

    fn get_nodes(&self, dev_id: &str) -> Result<Vec<NodeInfo>, ProtocolError> {
        self.check_read()?;
        Ok(self
            .nodes
            .lock()
            .get(dev_id)
            .map(|nodes| nodes.iter().map(|n| n.info.clone()).collect())
            .unwrap_or_default())
    }

    fn get_status(&self, dev_id: &str, node: &NodeInfo) -> Result<StatusMap, ProtocolError> {
        self.find_node(dev_id, node, |n| n.status.clone())
    }

    fn get_setup(&self, dev_id: &str, node: &NodeInfo) -> Result<SetupMap, ProtocolError> {
        self.find_node(dev_id, node, |n| n.setup.clone())
    }

    fn set_status(
        &self,
        dev_id: &str,
        node: &NodeInfo,
        status: &StatusMap,
    ) -> Result<(), ProtocolError> {
        if let Some(hook) = self.on_set_status.lock().as_ref() {
            hook(status);
        }
        if self.fail_status_writes.load(Ordering::SeqCst) {
            return Err(ProtocolError::RequestFailed("status write refused".to_string()));
        }
        self.record(Write::Status {
            dev_id: dev_id.to_string(),
            addr: node.addr,
            args: status.clone(),
        })
    }

    fn set_setup(
        &self,
        dev_id: &str,
        node: &NodeInfo,
        setup: &SetupMap,
    ) -> Result<(), ProtocolError> {
        self.record(Write::Setup {
            dev_id: dev_id.to_string(),
            addr: node.addr,
            args: setup.clone(),
        })
    }

    fn get_device_away_status(&self, dev_id: &str) -> Result<AwayStatus, ProtocolError> {
        self.check_read()?;
        let away = self.away.lock().get(dev_id).copied().unwrap_or(false);
        Ok(AwayStatus::new(away))
    }

    fn set_device_away_status(
        &self,
        dev_id: &str,
        status: &AwayStatus,
    ) -> Result<(), ProtocolError> {
        self.record(Write::Away {
            dev_id: dev_id.to_string(),
            away: status.away,
        })
    }

    fn get_device_power_limit(&self, dev_id: &str) -> Result<Option<u32>, ProtocolError> {
        self.check_read()?;
        Ok(self.power_limits.lock().get(dev_id).copied())
    }

    fn set_device_power_limit(&self, dev_id: &str, limit: u32) -> Result<(), ProtocolError> {
        self.record(Write::PowerLimit {
            dev_id: dev_id.to_string(),
            limit,
        })
    }

    fn open_socket(
        &self,
        dev_id: &str,
        callbacks: PushCallbacks,
        _retry: &RetryPolicy,
    ) -> PushTask {
        self.sockets_opened.fetch_add(1, Ordering::SeqCst);
        let rx = self.socket_rx.lock().remove(dev_id);
        Box::pin(async move {
            let Some(mut rx) = rx else {
                return;
            };
            while let Some(message) = rx.recv().await {
                match message {
                    SocketMessage::DevData(data) => callbacks.dev_data(data),
                    SocketMessage::Update(update) => callbacks.update(update),
                }
            }
        })
    }
}

/// [`Connector`] handing out one shared [`MockSession`].
pub struct MockConnector {
    session: Arc<MockSession>,
    fail: AtomicBool,
    connects: Mutex<Vec<String>>,
}

impl MockConnector {
    pub fn new(session: Arc<MockSession>) -> Arc<Self> {
        Arc::new(Self {
            session,
            fail: AtomicBool::new(false),
            connects: Mutex::new(Vec::new()),
        })
    }

    pub fn fail_auth(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Usernames that connected, in order.
    pub fn connects(&self) -> Vec<String> {
        self.connects.lock().clone()
    }
}

impl Connector for MockConnector {
    fn connect(
        &self,
        credentials: &Credentials,
        _retry: &RetryPolicy,
    ) -> Result<Arc<dyn Session>, ProtocolError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProtocolError::AuthenticationFailed);
        }
        self.connects.lock().push(credentials.username.clone());
        let session: Arc<dyn Session> = self.session.clone();
        Ok(session)
    }
}
