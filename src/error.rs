// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `Smartbox` library.
//!
//! This module provides the error hierarchy used across the library: status
//! translation, vendor session communication, device lifecycle, and push
//! message routing.
//!
//! Status and session errors always propagate to the caller. Routing errors
//! describe push traffic that could not be applied; the push channel logs
//! them and keeps running.

use thiserror::Error;

use crate::types::PresetMode;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A value could not be parsed.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// A node status or setup could not be translated.
    #[error("status error: {0}")]
    Status(#[from] StatusError),

    /// The vendor session failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A device lifecycle operation was invalid.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// Device was not found in the registry.
    #[error("device not found: {0}")]
    DeviceNotFound(String),
}

/// Errors raised when parsing mode and preset names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// An HVAC mode name outside `off`, `heat`, `auto`.
    #[error("invalid hvac mode: {0}")]
    InvalidHvacMode(String),

    /// An unknown preset name.
    #[error("invalid preset mode: {0}")]
    InvalidPresetMode(String),
}

/// Errors raised while translating vendor status dictionaries.
///
/// These indicate either vendor firmware states this library has not seen
/// (`MissingField`, `UnexpectedValue`, `UnknownMode`) or requests that are
/// valid in general but not for the node's current type or mode.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatusError {
    /// A required status or setup key is absent.
    #[error("'{key}' not found in {node_type} - please report this as a bug. status: {status}")]
    MissingField {
        /// The missing key.
        key: String,
        /// The node type whose status was inspected.
        node_type: String,
        /// The offending status, serialized for the report.
        status: String,
    },

    /// An enum-like field holds a value outside the known set.
    #[error(
        "unexpected '{key}' value {value} found for {node_type} - please report this as a bug"
    )]
    UnexpectedValue {
        /// The key holding the value.
        key: String,
        /// The unexpected value.
        value: String,
        /// The node type whose status was inspected.
        node_type: String,
    },

    /// The node reports a heating mode this library does not know.
    #[error("unknown smartbox node mode {0}")]
    UnknownMode(String),

    /// The request is valid in general but not for this node or its state.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Away and home presets live on the device, not in node status.
    #[error("preset {0} is handled by the device away status, not node status")]
    DevicePreset(PresetMode),
}

/// Errors reported by the vendor session collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A request to the vendor cloud failed.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Connection to the vendor cloud failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// A blocking session call could not be completed on the worker pool.
    #[error("session task failed: {0}")]
    TaskFailed(String),
}

/// Errors related to device lifecycle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The device already has a push channel.
    #[error("device {0} is already initialised")]
    AlreadyInitialised(String),

    /// The device has not been initialised yet.
    #[error("device {0} is not initialised")]
    NotInitialised(String),

    /// The device was shut down.
    #[error("device {0} has been shut down")]
    ShutDown(String),

    /// The node outlived its owning device.
    #[error("device {0} has been dropped")]
    DeviceDropped(String),

    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Push messages that could not be routed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// The topic names a node the device does not have.
    #[error("received update for unknown node {node_type} {addr}")]
    UnknownNode {
        /// Node type from the topic.
        node_type: String,
        /// Node address from the topic.
        addr: u32,
    },

    /// No known topic pattern matched.
    #[error("couldn't match update for {0}")]
    UnmatchedTopic(String),

    /// The topic matched but the body has the wrong shape.
    #[error("malformed body for {path}: {reason}")]
    MalformedBody {
        /// The topic path.
        path: String,
        /// What was wrong with the body.
        reason: String,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
