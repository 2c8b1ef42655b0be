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

//! Module containing all type definitions

use ipnetwork::IpNetwork;
use serde::Deserialize;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

/// IP Prefix (network address and prefix length)
pub type Prefix = IpNetwork;

/// AS Number
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Deserialize)]
#[serde(transparent)]
pub struct AsId(pub u32);

impl fmt::Display for AsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for AsId {
    fn from(x: u32) -> Self {
        Self(x)
    }
}

/// ORIGIN attribute of a route. The variants are ordered, such that `Igp < Egp < Incomplete`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Route originated from an interior gateway protocol
    Igp,
    /// Route learned via EGP
    Egp,
    /// Origin unknown
    Incomplete,
}

impl Default for Origin {
    fn default() -> Self {
        Self::Incomplete
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Igp => "igp",
            Self::Egp => "egp",
            Self::Incomplete => "incomplete",
        })
    }
}

impl FromStr for Origin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "igp" | "0" => Ok(Self::Igp),
            "egp" | "1" => Ok(Self::Egp),
            "incomplete" | "2" => Ok(Self::Incomplete),
            _ => Err(s.to_string()),
        }
    }
}

/// Identity of a BGP peer (session).
///
/// The fields are declared such that the derived ordering compares the peer address first. This
/// ordering is used as the final tie-break of the best path selection.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct PeerId {
    /// Address of the neighbor
    pub peer_addr: IpAddr,
    /// AS of the neighbor
    pub peer_as: AsId,
    /// Local address used for the session
    pub local_addr: Option<IpAddr>,
    /// Local AS used for the session
    pub local_as: AsId,
}

impl PeerId {
    /// Create a new peer identity
    pub fn new(peer_as: AsId, peer_addr: IpAddr, local_as: AsId, local_addr: Option<IpAddr>) -> Self {
        Self { peer_addr, peer_as, local_addr, local_as }
    }

    /// Returns true if the peer is in the same AS as the local router.
    pub fn is_ibgp(&self) -> bool {
        self.peer_as == self.local_as
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (AS{})", self.peer_addr, self.peer_as)
    }
}

/// State of the BGP session with a peer
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No session established
    Down,
    /// Session is established
    Up,
}

impl SessionState {
    /// returns true if the session is up
    pub fn is_up(&self) -> bool {
        matches!(self, Self::Up)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Down
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Down => "down",
            Self::Up => "up",
        })
    }
}

/// Physical attachment point of a peer or border router to the dataplane.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Deserialize)]
pub struct Attachment {
    /// Datapath (switch) id
    pub dp_id: u64,
    /// VLAN id
    pub vlan_vid: u16,
    /// Port number on the switch
    pub port_no: u32,
}

impl fmt::Display for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dpid={}, vid={}, port_no={}", self.dp_id, self.vlan_vid, self.port_no)
    }
}

/// Errors of the event processing
#[derive(Error, Debug, PartialEq)]
pub enum SpeakerError {
    /// The event refers to a peer which is not configured
    #[error("Peer {0} is not configured")]
    UnknownPeer(IpAddr),
    /// The event refers to a border router which is not configured
    #[error("Border router {0} is not configured")]
    UnknownBorder(IpAddr),
    /// A required attribute is missing in an update
    #[error("Update for {0} is missing the required attribute {1}")]
    MissingAttribute(Prefix, &'static str),
}
