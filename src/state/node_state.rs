// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cached status and setup of a single node.

use chrono::{DateTime, Utc};

use crate::types::{SetupMap, StatusMap};

/// Latest known status and setup of a node.
///
/// Status and setup each carry their own generation. Every write that comes
/// from the vendor (a fresh snapshot or a push update) advances the
/// generation of the map it touches. Local writes made after a successful
/// command do not; they only apply if the generation of the same map
/// observed before the command is still current, so a remote update that
/// raced the command is never overwritten by stale intent.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use smartbox_lib::state::NodeState;
/// use smartbox_lib::types::StatusMap;
///
/// let status = json!({"stemp": "20.0"}).as_object().unwrap().clone();
/// let mut state = NodeState::new(status, StatusMap::new());
///
/// let before = state.status_generation();
/// let command = json!({"stemp": "21.0"}).as_object().unwrap().clone();
/// assert!(state.apply_status_command(before, &command));
/// assert_eq!(state.status()["stemp"], "21.0");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NodeState {
    status: StatusMap,
    setup: SetupMap,
    status_generation: u64,
    setup_generation: u64,
    status_updated_at: DateTime<Utc>,
}

impl NodeState {
    /// Creates a state from the initial snapshots.
    #[must_use]
    pub fn new(status: StatusMap, setup: SetupMap) -> Self {
        Self {
            status,
            setup,
            status_generation: 0,
            setup_generation: 0,
            status_updated_at: Utc::now(),
        }
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> &StatusMap {
        &self.status
    }

    /// Current setup.
    #[must_use]
    pub fn setup(&self) -> &SetupMap {
        &self.setup
    }

    /// Number of remote status writes applied so far.
    #[must_use]
    pub fn status_generation(&self) -> u64 {
        self.status_generation
    }

    /// Number of remote setup writes applied so far.
    #[must_use]
    pub fn setup_generation(&self) -> u64 {
        self.setup_generation
    }

    /// When the status was last written from a remote source. The initial
    /// snapshot counts as one.
    #[must_use]
    pub fn status_updated_at(&self) -> DateTime<Utc> {
        self.status_updated_at
    }

    // ========== Remote writes ==========

    /// Replaces the status with a fresh snapshot.
    pub fn replace_status(&mut self, status: StatusMap) {
        self.status = status;
        self.touch_status();
    }

    /// Merges a partial status update, last write wins per key.
    pub fn merge_status(&mut self, partial: &StatusMap) {
        merge(&mut self.status, partial);
        self.touch_status();
    }

    /// Replaces the setup with a fresh snapshot.
    pub fn replace_setup(&mut self, setup: SetupMap) {
        self.setup = setup;
        self.setup_generation += 1;
    }

    /// Merges a partial setup update, last write wins per key.
    pub fn merge_setup(&mut self, partial: &SetupMap) {
        merge(&mut self.setup, partial);
        self.setup_generation += 1;
    }

    fn touch_status(&mut self) {
        self.status_generation += 1;
        self.status_updated_at = Utc::now();
    }

    // ========== Command echoes ==========

    /// Merges the arguments of a successful status command if no remote
    /// status write happened since `observed`. Returns whether the merge
    /// applied.
    pub fn apply_status_command(&mut self, observed: u64, args: &StatusMap) -> bool {
        if self.status_generation != observed {
            return false;
        }
        merge(&mut self.status, args);
        true
    }

    /// Setup counterpart of [`apply_status_command`](Self::apply_status_command),
    /// checked against [`setup_generation`](Self::setup_generation).
    pub fn apply_setup_command(&mut self, observed: u64, args: &SetupMap) -> bool {
        if self.setup_generation != observed {
            return false;
        }
        merge(&mut self.setup, args);
        true
    }
}

fn merge(target: &mut StatusMap, partial: &StatusMap) {
    for (key, value) in partial {
        target.insert(key.clone(), value.clone());
    }
}
