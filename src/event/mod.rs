// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event system for device and node changes.
//!
//! Push updates keep devices and nodes current; hosts that would rather be
//! told than poll subscribe to an [`EventBus`]. Every device publishes to the
//! bus it was created with, so a registry-wide bus sees all devices.
//!
//! # Examples
//!
//! ```
//! use smartbox_lib::event::{EventBus, SmartboxEvent};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(SmartboxEvent::PushChannelClosed { dev_id: "dev1".to_string() });
//! assert!(matches!(rx.try_recv(), Ok(SmartboxEvent::PushChannelClosed { .. })));
//! ```

mod event_bus;
mod smartbox_event;

pub use event_bus::EventBus;
pub use smartbox_event::SmartboxEvent;
