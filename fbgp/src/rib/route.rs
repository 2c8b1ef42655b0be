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

//! Module containing the definition of a BGP route

use crate::rib::{AsId, Origin, PeerId, Prefix};
use itertools::Itertools;
use serde::Deserialize;
use std::fmt;
use std::net::IpAddr;

/// Default LOCAL-PREF of a route
pub const DEFAULT_LOCAL_PREF: u32 = 100;
/// Default MED of a route
pub const DEFAULT_MED: u32 = 0;

/// # Bgp Route
/// One advertisement for a prefix. Two routes are equal if and only if all of their fields are
/// equal. Routes are never shared between tables; every table stores its own copy, and a per-peer
/// transformation always operates on a clone.
///
/// The following attributes are omitted
/// - ATOMIC_AGGREGATE: not used
/// - AGGREGATOR: not used
/// - MP-BGP attributes: not used
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    /// IP PREFIX
    pub prefix: Prefix,
    /// NEXT-HOP for reaching the source of the route.
    pub nexthop: IpAddr,
    /// AS-PATH, where the most recently added AS comes first.
    pub as_path: Vec<AsId>,
    /// ORIGIN
    pub origin: Origin,
    /// LOCAL-PREF. It is `None` once the route leaves the local AS.
    pub local_pref: Option<u32>,
    /// MED (Multi-Exit Discriminator)
    pub med: u32,
    /// Community (opaque string)
    pub community: Option<String>,
    /// The route is originated by this router
    pub local: bool,
    /// AS of the peer which supplied the route
    pub from_as: Option<AsId>,
    /// Peer which supplied the route
    pub from_peer: Option<PeerId>,
    /// The route was supplied by an internal peer
    pub from_ibgp: bool,
}

impl Route {
    /// Returns the LOCAL-PREF, with the default value applied.
    pub fn local_pref_or_default(&self) -> u32 {
        self.local_pref.unwrap_or(DEFAULT_LOCAL_PREF)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Route {} -> {} (local-pref={:?}, as-path=[{}], med={}, origin={}, community={:?})>",
            self.prefix,
            self.nexthop,
            self.local_pref,
            self.as_path.iter().join(" "),
            self.med,
            self.origin,
            self.community,
        )
    }
}

/// Optional path attributes received in an update. Missing values are replaced by the defaults
/// when the route is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PathAttributes {
    /// LOCAL-PREF (default: 100)
    #[serde(default, alias = "local-pref")]
    pub local_pref: Option<u32>,
    /// MED (default: 0)
    #[serde(default)]
    pub med: Option<u32>,
    /// Community
    #[serde(default)]
    pub community: Option<String>,
}

/// # Route Builder
///
/// Convenience type to build a route. Only the prefix and the next-hop are required; every other
/// field has a default value:
///
/// | field        | default      |
/// |--------------|--------------|
/// | `as_path`    | empty        |
/// | `origin`     | `Incomplete` |
/// | `local_pref` | `100`        |
/// | `med`        | `0`          |
/// | `community`  | `None`       |
/// | `local`      | `false`      |
/// | `from_*`     | not set      |
///
/// ```
/// # use fbgp::rib::{AsId, Origin, RouteBuilder};
/// let route = RouteBuilder::new("10.0.0.0/24".parse().unwrap(), "10.0.0.1".parse().unwrap())
///     .as_path(vec![AsId(1), AsId(2)])
///     .origin(Origin::Igp)
///     .med(10)
///     .build();
/// assert_eq!(route.local_pref, Some(100));
/// ```
#[derive(Debug, Clone)]
pub struct RouteBuilder {
    route: Route,
}

impl RouteBuilder {
    /// Create a new builder for a route to `prefix` via `nexthop`.
    pub fn new(prefix: Prefix, nexthop: IpAddr) -> Self {
        Self {
            route: Route {
                prefix,
                nexthop,
                as_path: Vec::new(),
                origin: Origin::default(),
                local_pref: Some(DEFAULT_LOCAL_PREF),
                med: DEFAULT_MED,
                community: None,
                local: false,
                from_as: None,
                from_peer: None,
                from_ibgp: false,
            },
        }
    }

    /// Set the AS-PATH
    pub fn as_path(mut self, as_path: Vec<AsId>) -> Self {
        self.route.as_path = as_path;
        self
    }

    /// Set the ORIGIN
    pub fn origin(mut self, origin: Origin) -> Self {
        self.route.origin = origin;
        self
    }

    /// Set the LOCAL-PREF
    pub fn local_pref(mut self, local_pref: u32) -> Self {
        self.route.local_pref = Some(local_pref);
        self
    }

    /// Set the MED
    pub fn med(mut self, med: u32) -> Self {
        self.route.med = med;
        self
    }

    /// Set the community
    pub fn community(mut self, community: impl Into<String>) -> Self {
        self.route.community = Some(community.into());
        self
    }

    /// Apply all attributes that are present, and keep the defaults for the others.
    pub fn attributes(mut self, attrs: PathAttributes) -> Self {
        if let Some(lp) = attrs.local_pref {
            self.route.local_pref = Some(lp);
        }
        if let Some(med) = attrs.med {
            self.route.med = med;
        }
        if attrs.community.is_some() {
            self.route.community = attrs.community;
        }
        self
    }

    /// Mark the route as originated by this router
    pub fn local(mut self) -> Self {
        self.route.local = true;
        self
    }

    /// Tag the route with the peer from which it was learned.
    pub fn from_peer(mut self, peer: PeerId) -> Self {
        self.route.from_as = Some(peer.peer_as);
        self.route.from_peer = Some(peer);
        self.route.from_ibgp = peer.is_ibgp();
        self
    }

    /// Build the route
    pub fn build(self) -> Route {
        self.route
    }
}
