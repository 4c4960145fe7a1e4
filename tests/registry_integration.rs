// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for account bootstrap and the device registry.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use smartbox_lib::error::{DeviceError, Error, ProtocolError};
use smartbox_lib::event::SmartboxEvent;
use smartbox_lib::manager::{AccountConfig, AwayPresetPolicy, SmartboxConfig, SmartboxRegistry};
use smartbox_lib::session::Connector;
use smartbox_lib::types::{HeaterType, NodeInfo, NodeKey};

use common::{MockConnector, MockSession, next_event};

fn node_status() -> serde_json::Value {
    json!({"mode": "auto", "stemp": "20.0", "mtemp": "19.0", "units": "C", "active": false})
}

/// Account devices `dev1`, `dev2` and `spare`; `dev2` carries an
/// unsupported node type.
fn session() -> Arc<MockSession> {
    let session = MockSession::new();
    session.add_device("dev1", "Home");
    session.add_node("dev1", NodeInfo::new(1, "Living room", "htr"), node_status(), json!({}));
    session.add_device("dev2", "Cottage");
    session.add_node("dev2", NodeInfo::new(1, "Kitchen", "acm"), node_status(), json!({}));
    session.add_node("dev2", NodeInfo::new(2, "Hub", "pmo"), json!({}), json!({}));
    session.add_device("spare", "Spare");
    session.add_node("spare", NodeInfo::new(1, "Shed", "htr"), node_status(), json!({}));
    session
}

fn config(device_ids: &[&str]) -> SmartboxConfig {
    SmartboxConfig {
        accounts: vec![AccountConfig::new(
            "api-test",
            "me@example.com",
            "secret",
            device_ids.iter().copied(),
        )],
        basic_auth_creds: "Y2xpZW50OnNlY3JldA==".to_string(),
        away_preset: AwayPresetPolicy::default(),
    }
}

fn connector(session: &Arc<MockSession>) -> (Arc<MockConnector>, Arc<dyn Connector>) {
    let mock = MockConnector::new(session.clone());
    let connector: Arc<dyn Connector> = mock.clone();
    (mock, connector)
}

// ============================================================================
// Setup
// ============================================================================

mod setup {
    use super::*;

    #[tokio::test]
    async fn initialises_only_configured_devices() {
        let session = session();
        let (mock, connector) = connector(&session);

        let registry = SmartboxRegistry::setup(&config(&["dev1", "dev2", "missing"]), connector)
            .await
            .unwrap();

        assert_eq!(mock.connects(), vec!["me@example.com".to_string()]);
        let ids: Vec<_> = registry
            .devices()
            .await
            .iter()
            .map(|d| d.dev_id().to_string())
            .collect();
        assert_eq!(ids, vec!["dev1", "dev2"]);
        assert!(registry.devices().await.iter().all(|d| d.is_live()));
        assert_eq!(session.sockets_opened(), 2);

        assert_eq!(registry.nodes().await.len(), 3);
        assert_eq!(registry.heater_nodes().await.len(), 2);
        assert!(matches!(
            registry.device("spare").await,
            Err(Error::DeviceNotFound(ref id)) if id == "spare"
        ));
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_connecting() {
        let session = session();
        let (mock, connector) = connector(&session);

        let err = SmartboxRegistry::setup(&config(&[]), connector).await.unwrap_err();

        assert!(matches!(err, Error::Device(DeviceError::InvalidConfiguration(_))));
        assert!(mock.connects().is_empty());
    }

    #[tokio::test]
    async fn authentication_failure_propagates() {
        let session = session();
        let (mock, connector) = connector(&session);
        mock.fail_auth(true);

        let err = SmartboxRegistry::setup(&config(&["dev1"]), connector).await.unwrap_err();

        assert!(matches!(err, Error::Protocol(ProtocolError::AuthenticationFailed)));
        assert_eq!(session.sockets_opened(), 0);
    }

    #[tokio::test]
    async fn device_listing_failure_propagates() {
        let session = session();
        session.fail_reads(true);
        let (_mock, connector) = connector(&session);

        let err = SmartboxRegistry::setup(&config(&["dev1"]), connector).await.unwrap_err();

        assert!(matches!(err, Error::Protocol(ProtocolError::RequestFailed(_))));
    }

    #[tokio::test]
    async fn config_from_json_sets_up_registry() {
        let session = session();
        let (_mock, connector) = connector(&session);
        let config: SmartboxConfig = serde_json::from_value(json!({
            "accounts": [{
                "api_name": "api-test",
                "username": "me@example.com",
                "password": "secret",
                "device_ids": ["spare"],
                "socket_reconnect_attempts": 5,
            }],
            "basic_auth_creds": "Y2xpZW50OnNlY3JldA==",
            "away_preset": "switch_only",
        }))
        .unwrap();

        let registry = SmartboxRegistry::setup(&config, connector).await.unwrap();

        let device = registry.device("spare").await.unwrap();
        assert_eq!(device.away_preset_policy(), AwayPresetPolicy::SwitchOnly);
        assert_eq!(registry.len().await, 1);
    }
}

// ============================================================================
// Lookups and events
// ============================================================================

mod lookups {
    use super::*;

    #[tokio::test]
    async fn node_lookup_by_device_and_key() {
        let session = session();
        let (_mock, connector) = connector(&session);
        let registry = SmartboxRegistry::setup(&config(&["dev1", "dev2"]), connector)
            .await
            .unwrap();

        let node = registry
            .node("dev2", &NodeKey::new(HeaterType::Acm, 1))
            .await
            .unwrap();
        assert_eq!(node.name(), "Kitchen");
        assert_eq!(node.node_id(), "dev2-1");

        assert!(registry.node("dev2", &NodeKey::new(HeaterType::Htr, 1)).await.is_none());
        assert!(registry.node("spare", &NodeKey::new(HeaterType::Htr, 1)).await.is_none());
    }

    #[tokio::test]
    async fn events_from_all_devices_reach_subscribers() {
        let session = session();
        let (_mock, connector) = connector(&session);
        let registry = SmartboxRegistry::setup(&config(&["dev1", "dev2"]), connector)
            .await
            .unwrap();
        let mut events = registry.subscribe();

        session.push("dev2", "/acm/1/status", json!({"stemp": "21.0"}));
        session.push("dev1", "/mgr/away_status", json!({"away": true}));

        let mut seen = vec![
            next_event(&mut events).await,
            next_event(&mut events).await,
        ];
        seen.sort_by(|a, b| a.dev_id().cmp(b.dev_id()));
        assert_eq!(
            seen,
            vec![
                SmartboxEvent::AwayStatusChanged {
                    dev_id: "dev1".to_string(),
                    away: true,
                },
                SmartboxEvent::NodeStatusUpdated {
                    dev_id: "dev2".to_string(),
                    node: NodeKey::new(HeaterType::Acm, 1),
                },
            ]
        );
        assert!(!registry.device("dev2").await.unwrap().away());
    }
}

// ============================================================================
// Teardown
// ============================================================================

mod teardown {
    use super::*;

    #[tokio::test]
    async fn shutdown_stops_every_device_and_empties_registry() {
        let session = session();
        let (_mock, connector) = connector(&session);
        let registry = SmartboxRegistry::setup(&config(&["dev1", "dev2"]), connector)
            .await
            .unwrap();
        let devices = registry.devices().await;

        registry.shutdown().await;

        assert!(registry.is_empty().await);
        assert!(devices.iter().all(|d| d.is_shut_down()));
        tokio::time::timeout(Duration::from_secs(2), async {
            while !(session.socket_closed("dev1") && session.socket_closed("dev2")) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("sockets still open after shutdown");
    }
}
