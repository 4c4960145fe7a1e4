// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Node state tracking.
//!
//! [`NodeState`] holds the cached status and setup of one node together with
//! per-map generation counters that order remote writes against local command
//! echoes.
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use smartbox_lib::state::NodeState;
//! use smartbox_lib::types::StatusMap;
//!
//! let mut state = NodeState::new(StatusMap::new(), StatusMap::new());
//! let observed = state.status_generation();
//!
//! // A push update arrives while a command is in flight
//! state.merge_status(json!({"stemp": "18.0"}).as_object().unwrap());
//!
//! // The command echo is dropped in favour of the newer remote value
//! let command = json!({"stemp": "22.0"});
//! assert!(!state.apply_status_command(observed, command.as_object().unwrap()));
//! assert_eq!(state.status()["stemp"], "18.0");
//! ```

mod node_state;

pub use node_state::NodeState;
