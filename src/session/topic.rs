// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Push topic classification.

/// A classified push topic path.
///
/// Paths are matched on their leading segments in priority order, so
/// `/htr/2/status/extra` still classifies as a node status update.
///
/// # Examples
///
/// ```
/// use smartbox_lib::session::Topic;
///
/// assert_eq!(
///     Topic::parse("/htr_mod/3/status"),
///     Topic::NodeStatus { node_type: "htr_mod", addr: 3 }
/// );
/// assert_eq!(Topic::parse("/mgr/away_status"), Topic::AwayStatus);
/// assert_eq!(Topic::parse("/acm/1/version"), Topic::Informational);
/// assert_eq!(Topic::parse("/mystery"), Topic::Unmatched);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic<'a> {
    /// `/{node_type}/{addr}/status`
    NodeStatus {
        /// Node type segment.
        node_type: &'a str,
        /// Node address segment.
        addr: u32,
    },
    /// `/{node_type}/{addr}/setup`
    NodeSetup {
        /// Node type segment.
        node_type: &'a str,
        /// Node address segment.
        addr: u32,
    },
    /// `/mgr/away_status`
    AwayStatus,
    /// `/htr_system/power_limit`
    PowerLimit,
    /// Known topics that carry nothing this library tracks: `/connected`,
    /// `/mgr/nodes`, `/{node_type}/{addr}/prog` and `/{node_type}/{addr}/version`.
    Informational,
    /// Anything else.
    Unmatched,
}

impl<'a> Topic<'a> {
    /// Classifies a topic path.
    #[must_use]
    pub fn parse(path: &'a str) -> Self {
        let Some(rest) = path.strip_prefix('/') else {
            return Self::Unmatched;
        };
        let parts: Vec<&str> = rest.split('/').collect();

        if let Some((node_type, addr, leaf)) = node_segments(&parts) {
            return match leaf {
                "status" => Self::NodeStatus { node_type, addr },
                "setup" => Self::NodeSetup { node_type, addr },
                "prog" | "version" => Self::Informational,
                _ => Self::Unmatched,
            };
        }

        match parts.as_slice() {
            ["mgr", "away_status", ..] => Self::AwayStatus,
            ["htr_system", "power_limit", ..] => Self::PowerLimit,
            ["connected", ..] | ["mgr", "nodes", ..] => Self::Informational,
            _ => Self::Unmatched,
        }
    }
}

fn node_segments<'a>(parts: &[&'a str]) -> Option<(&'a str, u32, &'a str)> {
    match parts {
        [node_type, addr, leaf, ..] if !node_type.is_empty() => {
            let addr = addr.parse().ok()?;
            Some((*node_type, addr, *leaf))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_node_status() {
        assert_eq!(
            Topic::parse("/htr/2/status"),
            Topic::NodeStatus {
                node_type: "htr",
                addr: 2
            }
        );
    }

    #[test]
    fn parse_node_setup() {
        assert_eq!(
            Topic::parse("/acm/10/setup"),
            Topic::NodeSetup {
                node_type: "acm",
                addr: 10
            }
        );
    }

    #[test]
    fn parse_device_topics() {
        assert_eq!(Topic::parse("/mgr/away_status"), Topic::AwayStatus);
        assert_eq!(Topic::parse("/htr_system/power_limit"), Topic::PowerLimit);
    }

    #[test]
    fn parse_informational_topics() {
        for path in ["/connected", "/mgr/nodes", "/htr/1/prog", "/htr_mod/4/version"] {
            assert_eq!(Topic::parse(path), Topic::Informational, "{path}");
        }
    }

    #[test]
    fn parse_trailing_segments_match_prefix() {
        assert_eq!(
            Topic::parse("/htr/2/status/extra"),
            Topic::NodeStatus {
                node_type: "htr",
                addr: 2
            }
        );
    }

    #[test]
    fn parse_unmatched() {
        for path in [
            "",
            "htr/1/status",
            "/htr/x/status",
            "/htr/1/samples",
            "/mgr/discovery",
            "/mgr",
            "//1/status",
        ] {
            assert_eq!(Topic::parse(path), Topic::Unmatched, "{path}");
        }
    }
}
