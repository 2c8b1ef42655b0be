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

//! Border routers of the own network.

use crate::rib::Attachment;
use std::fmt;
use std::net::IpAddr;

/// Border router of the own network, which is attached to the dataplane. Only used for
/// bookkeeping of the topology.
#[derive(Debug, Clone, PartialEq)]
pub struct Border {
    /// Router id
    pub router_id: IpAddr,
    /// Next-hop address to reach the border router
    pub nexthop: IpAddr,
    /// Attachment point to the dataplane
    pub attachment: Option<Attachment>,
    /// The border router is physically connected
    pub is_connected: bool,
}

impl Border {
    /// Create a new border router, which is not yet connected.
    pub fn new(router_id: IpAddr, nexthop: IpAddr) -> Self {
        Self { router_id, nexthop, attachment: None, is_connected: false }
    }

    /// The border router is connected to the dataplane.
    pub fn connected(&mut self, attachment: Attachment) {
        self.attachment = Some(attachment);
        self.is_connected = true;
    }

    /// The border router is disconnected.
    pub fn disconnected(&mut self) {
        self.is_connected = false;
    }
}

impl fmt::Display for Border {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Border(routerid={}, nexthop={}", self.router_id, self.nexthop)?;
        if let Some(a) = self.attachment {
            write!(f, ", {}", a)?;
        }
        write!(f, ")")
    }
}
