// fBGP: Flow-based BGP Decision Core
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Module for defining inbound events

use crate::rib::{AsId, Attachment, Origin, PathAttributes, Prefix, SessionState};
use serde::Deserialize;
use std::net::IpAddr;

/// Inbound event, to be handled by the [`Speaker`](crate::rib::Speaker).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    /// Update received from a peer
    Update {
        /// Address of the peer
        peer: IpAddr,
        /// The update message
        update: Update,
    },
    /// The BGP session with a peer changed its state
    State {
        /// Address of the peer
        peer: IpAddr,
        /// New state of the session
        state: SessionState,
    },
    /// A peer is attached to the dataplane
    Attach {
        /// Address of the peer
        peer: IpAddr,
        /// Attachment point
        attachment: Attachment,
    },
    /// A peer is detached from the dataplane
    Detach {
        /// Address of the peer
        peer: IpAddr,
    },
    /// A border router is attached to the dataplane
    #[serde(rename = "border_attach")]
    BorderAttach {
        /// Router id of the border router
        border: IpAddr,
        /// Attachment point
        attachment: Attachment,
    },
    /// A border router is detached from the dataplane
    #[serde(rename = "border_detach")]
    BorderDetach {
        /// Router id of the border router
        border: IpAddr,
    },
    /// Originate a prefix from this router
    Originate {
        /// Prefix to originate
        prefix: Prefix,
        /// Next-hop of the route
        nexthop: IpAddr,
    },
    /// Stop originating a prefix
    Retract {
        /// Prefix which is no longer originated
        prefix: Prefix,
    },
}

/// Announcement of a prefix in an update
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Announcement {
    /// Announced prefix
    pub prefix: Prefix,
    /// Next-hop of the route
    pub nexthop: IpAddr,
}

/// Update message received from a peer. All announced prefixes share the same attributes.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Update {
    /// Announced prefixes
    #[serde(default)]
    pub announce: Vec<Announcement>,
    /// Withdrawn prefixes
    #[serde(default)]
    pub withdraw: Vec<Prefix>,
    /// AS-PATH of the announced routes. Required for updates from external peers.
    #[serde(default, alias = "as-path")]
    pub as_path: Option<Vec<AsId>>,
    /// ORIGIN of the announced routes (default: incomplete)
    #[serde(default)]
    pub origin: Option<Origin>,
    /// Optional attributes of the announced routes
    #[serde(flatten)]
    pub attributes: PathAttributes,
}

impl Update {
    /// Create an update announcing the prefixes with the same next-hop and AS-PATH.
    pub fn announce(prefixes: Vec<Prefix>, nexthop: IpAddr, as_path: Vec<AsId>) -> Self {
        Self {
            announce: prefixes.into_iter().map(|prefix| Announcement { prefix, nexthop }).collect(),
            as_path: Some(as_path),
            ..Default::default()
        }
    }

    /// Create an update withdrawing the prefixes.
    pub fn withdraw(prefixes: Vec<Prefix>) -> Self {
        Self { withdraw: prefixes, ..Default::default() }
    }

    /// Set the origin of the update
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Set the optional attributes of the update
    pub fn with_attributes(mut self, attributes: PathAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Returns true if the update neither announces nor withdraws anything.
    pub fn is_empty(&self) -> bool {
        self.announce.is_empty() && self.withdraw.is_empty()
    }
}
