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

//! # BGP Peer
//!
//! A peer represents the BGP session with one neighbor. It keeps the routes received from the
//! neighbor (RIB-in), the routes announced to the neighbor (RIB-out), and the import and export
//! policies. It also keeps the physical attachment point of the neighbor to the dataplane.

use crate::policy::Policy;
use crate::rib::{AsId, Attachment, Origin, PathAttributes, PeerId, Prefix, Route, RouteBuilder};
use crate::rib::SessionState;
use log::*;
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;

/// Default TCP port of a BGP session
pub const DEFAULT_PEER_PORT: u16 = 179;

/// Bgp Peer
#[derive(Debug, Clone)]
pub struct Peer {
    /// Identity of the peer
    id: PeerId,
    /// TCP port of the session
    peer_port: u16,
    /// The peer is in the same AS. Computed once at construction.
    is_ibgp: bool,
    /// State of the BGP session
    state: SessionState,
    /// Attachment point to the dataplane
    attachment: Option<Attachment>,
    /// The peer is physically connected
    is_connected: bool,
    /// Routes received from the peer, before the import policy was applied
    rib_in: HashMap<Prefix, Route>,
    /// Routes announced to the peer
    rib_out: HashMap<Prefix, Route>,
    /// Policy applied to routes received from the peer
    import_policy: Policy,
    /// Policy applied to routes announced to the peer
    export_policy: Policy,
}

impl Peer {
    /// Create a new peer with the session down, and accept-all policies.
    pub fn new(peer_as: AsId, peer_addr: IpAddr, local_as: AsId, local_addr: Option<IpAddr>) -> Self {
        let id = PeerId::new(peer_as, peer_addr, local_as, local_addr);
        Self {
            id,
            peer_port: DEFAULT_PEER_PORT,
            is_ibgp: id.is_ibgp(),
            state: SessionState::Down,
            attachment: None,
            is_connected: false,
            rib_in: HashMap::new(),
            rib_out: HashMap::new(),
            import_policy: Policy::default(),
            export_policy: Policy::default(),
        }
    }

    /// Set the TCP port of the session
    pub fn with_port(mut self, port: u16) -> Self {
        self.peer_port = port;
        self
    }

    /// Set the import policy
    pub fn with_import_policy(mut self, policy: Policy) -> Self {
        self.import_policy = policy;
        self
    }

    /// Set the export policy
    pub fn with_export_policy(mut self, policy: Policy) -> Self {
        self.export_policy = policy;
        self
    }

    /// Return the identity of the peer
    pub fn id(&self) -> PeerId {
        self.id
    }

    /// Return the address of the peer
    pub fn peer_addr(&self) -> IpAddr {
        self.id.peer_addr
    }

    /// Return the AS of the peer
    pub fn peer_as(&self) -> AsId {
        self.id.peer_as
    }

    /// Return the local AS of the session
    pub fn local_as(&self) -> AsId {
        self.id.local_as
    }

    /// Return the TCP port of the session
    pub fn peer_port(&self) -> u16 {
        self.peer_port
    }

    /// Returns true if the peer is in the same AS.
    pub fn is_ibgp(&self) -> bool {
        self.is_ibgp
    }

    /// Return the state of the BGP session
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Return the import policy
    pub fn import_policy(&self) -> &Policy {
        &self.import_policy
    }

    /// Return the export policy
    pub fn export_policy(&self) -> &Policy {
        &self.export_policy
    }

    /// Return the attachment point, if it is known
    pub fn attachment(&self) -> Option<Attachment> {
        self.attachment
    }

    /// Returns true if the peer is physically connected to the dataplane
    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    /// Returns the route received from the peer for the prefix (before the import policy).
    pub fn get_rib_in(&self, prefix: Prefix) -> Option<&Route> {
        self.rib_in.get(&prefix)
    }

    /// Returns the route announced to the peer for the prefix.
    pub fn get_rib_out(&self, prefix: Prefix) -> Option<&Route> {
        self.rib_out.get(&prefix)
    }

    /// Returns all routes received from the peer
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.rib_in.values()
    }

    /// Returns all routes announced to the peer
    pub fn announced_routes(&self) -> impl Iterator<Item = &Route> {
        self.rib_out.values()
    }

    /// The BGP session with the peer is up. Both RIB-in and RIB-out are cleared. Nothing happens
    /// if the session is already up. Returns true if the state has changed.
    pub fn session_up(&mut self) -> bool {
        self.set_state(SessionState::Up)
    }

    /// The BGP session with the peer is down. Both RIB-in and RIB-out are cleared. Nothing
    /// happens if the session is already down. Returns true if the state has changed.
    pub fn session_down(&mut self) -> bool {
        self.set_state(SessionState::Down)
    }

    fn set_state(&mut self, state: SessionState) -> bool {
        if self.state == state {
            debug!("Session with {} is already {}", self.id, state);
            return false;
        }
        info!("Session with {} is {}", self.id, state);
        self.rib_in.clear();
        self.rib_out.clear();
        self.state = state;
        true
    }

    /// The peer is connected to the dataplane.
    pub fn connected(&mut self, attachment: Attachment) {
        self.attachment = Some(attachment);
        self.is_connected = true;
    }

    /// The peer is physically disconnected. The last attachment point is kept.
    pub fn disconnected(&mut self) {
        self.is_connected = false;
    }

    /// Process a route announced by the peer.
    ///
    /// If the same route was already received, `None` is returned. Otherwise, the route is stored
    /// in the RIB-in, and the result of [`Peer::import`] is returned. The RIB-in always keeps the
    /// route as it was received, even if it is dropped as a loop or rejected by the import
    /// policy.
    pub fn receive_announce(
        &mut self,
        prefix: Prefix,
        nexthop: IpAddr,
        as_path: Vec<AsId>,
        origin: Origin,
        attrs: PathAttributes,
    ) -> Option<Route> {
        let route = RouteBuilder::new(prefix, nexthop)
            .as_path(as_path)
            .origin(origin)
            .attributes(attrs)
            .from_peer(self.id)
            .build();

        if self.rib_in.get(&prefix) == Some(&route) {
            debug!("Ignore duplicate announcement from {}: {}", self.id, route);
            return None;
        }

        self.rib_in.insert(prefix, route.clone());
        self.import(route)
    }

    /// Decide whether a route received from the peer is used as a candidate. Routes whose
    /// AS-PATH already contains the local AS are dropped as a loop. Otherwise, the result of the
    /// import policy is returned.
    pub fn import(&self, route: Route) -> Option<Route> {
        if route.as_path.contains(&self.id.local_as) {
            debug!("Drop looped route from {}: {}", self.id, route);
            return None;
        }
        let prefix = route.prefix;
        let accepted = self.import_policy.evaluate(route);
        if accepted.is_none() {
            debug!("Import policy of {} rejects the route for {}", self.id, prefix);
        }
        accepted
    }

    /// Process a withdraw of the peer. Returns the withdrawn route, if it was present.
    pub fn receive_withdraw(&mut self, prefix: Prefix) -> Option<Route> {
        self.rib_in.remove(&prefix)
    }

    /// Prepare a route to be announced to the peer.
    ///
    /// The route is not announced to an internal peer if it was learned from an internal peer,
    /// and not to an external peer whose AS is the most recent hop in the AS-PATH. Otherwise, the
    /// export policy is evaluated on a copy of the route. To external peers, the local AS is
    /// prepended and the LOCAL-PREF is removed. The transformed route is stored in the RIB-out and
    /// returned.
    pub fn announce(&mut self, route: &Route) -> Option<Route> {
        if self.is_ibgp && route.from_ibgp {
            debug!("Do not announce an iBGP route to the internal peer {}", self.id);
            return None;
        }
        if !self.is_ibgp && route.as_path.first() == Some(&self.id.peer_as) {
            debug!("Do not announce {} back to {}", route.prefix, self.id);
            return None;
        }

        let mut out = match self.export_policy.evaluate(route.clone()) {
            Some(r) => r,
            None => {
                debug!("Export policy of {} rejects the route for {}", self.id, route.prefix);
                return None;
            }
        };

        if self.id.peer_as != self.id.local_as {
            out.as_path.insert(0, self.id.local_as);
            out.local_pref = None;
        }

        self.rib_out.insert(out.prefix, out.clone());
        Some(out)
    }

    /// Withdraw the route previously announced to the peer. Returns the announced route, or
    /// `None` if nothing was announced for the prefix.
    pub fn withdraw(&mut self, route: &Route) -> Option<Route> {
        self.withdraw_prefix(route.prefix)
    }

    /// Withdraw the route previously announced to the peer for the prefix.
    pub fn withdraw_prefix(&mut self, prefix: Prefix) -> Option<Route> {
        self.rib_out.remove(&prefix)
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BgpPeer(peer_as: {}, peer_ip: {}, local_as: {}, local_ip: {}, state: {}, import: {}, export: {})",
            self.id.peer_as,
            self.id.peer_addr,
            self.id.local_as,
            self.id.local_addr.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string()),
            self.state,
            self.import_policy,
            self.export_policy,
        )
    }
}
