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

//! # Bgp Speaker
//!
//! The speaker owns the router and all peers, and processes every inbound event in order. Each
//! event results in a list of outbound [`BgpEvent`]s, tagged with the peer they must be sent to.

use crate::config::{Config, ConfigError};
use crate::rib::{
    Attachment, BgpEvent, Border, Event, Origin, Peer, PeerId, Prefix, Route, RouteBuilder, Router,
    SessionState, SpeakerError, Update,
};
use log::*;
use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;

/// Outbound events, in the order they must be sent.
pub type Outbound = Vec<(PeerId, BgpEvent)>;

/// # Bgp Speaker
///
/// Single ordered processing path for all inbound events. The peers are kept sorted by their
/// address, such that the outbound events are generated in a deterministic order.
///
/// Changes are propagated by comparing the best route before and after processing a prefix,
/// instead of using the [`BestPathChange`](crate::rib::BestPathChange) of each transaction. An
/// implicit withdraw performs a `del_route` followed by an `add_route` on the same prefix, and
/// only the net change of both must be sent to the peers. If the best route is removed and
/// installed again, nothing is sent.
#[derive(Debug, Clone, Default)]
pub struct Speaker {
    /// RIB engine
    router: Router,
    /// Configured peers
    peers: BTreeMap<IpAddr, Peer>,
    /// Configured border routers
    borders: BTreeMap<IpAddr, Border>,
    /// Locally originated routes
    originated: HashMap<Prefix, Route>,
}

impl Speaker {
    /// Create a speaker without any peers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the speaker from the configuration. All policies are parsed at this point.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut speaker = Self::new();
        for peer_config in config.peers.iter() {
            let local_as = peer_config
                .local_as
                .or(config.local_as)
                .ok_or(ConfigError::MissingLocalAs(peer_config.peer_ip))?;
            let policy_err = |source| ConfigError::Policy { peer: peer_config.peer_ip, source };
            let import_policy = peer_config.import_policy.build().map_err(policy_err)?;
            let export_policy = peer_config.export_policy.build().map_err(policy_err)?;
            let peer = Peer::new(peer_config.peer_as, peer_config.peer_ip, local_as, peer_config.local_ip)
                .with_port(peer_config.peer_port)
                .with_import_policy(import_policy)
                .with_export_policy(export_policy);
            speaker.add_peer(peer)?;
        }
        for border_config in config.borders.iter() {
            speaker.add_border(Border::new(border_config.router_id, border_config.nexthop));
        }
        Ok(speaker)
    }

    /// Add a new peer. Returns an error if a peer with the same address already exists.
    pub fn add_peer(&mut self, peer: Peer) -> Result<(), ConfigError> {
        let addr = peer.peer_addr();
        if self.peers.contains_key(&addr) {
            return Err(ConfigError::DuplicatePeer(addr));
        }
        debug!("Add {}", peer);
        self.peers.insert(addr, peer);
        Ok(())
    }

    /// Add a border router. An existing border router with the same router id is replaced.
    pub fn add_border(&mut self, border: Border) {
        debug!("Add {}", border);
        self.borders.insert(border.router_id, border);
    }

    /// Returns a reference to the router
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the peer with the given address
    pub fn peer(&self, addr: IpAddr) -> Option<&Peer> {
        self.peers.get(&addr)
    }

    /// Returns an iterator over all peers, ordered by their address
    pub fn peers(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values()
    }

    /// Returns the border router with the given router id
    pub fn border(&self, router_id: IpAddr) -> Option<&Border> {
        self.borders.get(&router_id)
    }

    /// Returns an iterator over all border routers, ordered by their router id
    pub fn borders(&self) -> impl Iterator<Item = &Border> {
        self.borders.values()
    }

    /// Handle an inbound event.
    pub fn handle_event(&mut self, event: Event) -> Result<Outbound, SpeakerError> {
        trace!("Handle event {:?}", event);
        match event {
            Event::Update { peer, update } => self.update_received(peer, update),
            Event::State { peer, state } => self.peer_state_changed(peer, state),
            Event::Attach { peer, attachment } => self.peer_attached(peer, attachment).map(|_| Vec::new()),
            Event::Detach { peer } => self.peer_detached(peer).map(|_| Vec::new()),
            Event::BorderAttach { border, attachment } => {
                self.border_attached(border, attachment).map(|_| Vec::new())
            }
            Event::BorderDetach { border } => self.border_detached(border).map(|_| Vec::new()),
            Event::Originate { prefix, nexthop } => Ok(self.originate(prefix, nexthop)),
            Event::Retract { prefix } => Ok(self.stop_originating(prefix)),
        }
    }

    /// Process an update received from a peer.
    ///
    /// Withdrawn prefixes are processed first, then the announced prefixes, both in the order of
    /// the update. An update from an external peer which announces prefixes must carry an
    /// AS-PATH. Otherwise, it is rejected without modifying any table. Updates received while the
    /// session is down are ignored.
    pub fn update_received(&mut self, peer_addr: IpAddr, update: Update) -> Result<Outbound, SpeakerError> {
        let peer = self.peers.get(&peer_addr).ok_or(SpeakerError::UnknownPeer(peer_addr))?;

        if !peer.state().is_up() {
            warn!("Ignore update from {}: session is down", peer.id());
            return Ok(Vec::new());
        }

        let as_path = match (update.as_path, update.announce.first()) {
            (Some(as_path), _) => as_path,
            (None, None) => Vec::new(),
            (None, Some(_)) if peer.is_ibgp() => Vec::new(),
            (None, Some(a)) => return Err(SpeakerError::MissingAttribute(a.prefix, "AS_PATH")),
        };
        let origin = update.origin.unwrap_or_default();

        let mut outbound = Vec::new();

        for prefix in update.withdraw {
            let before = self.router.get_best_route(prefix).cloned();
            if let Some(peer) = self.peers.get_mut(&peer_addr) {
                if let Some(raw) = peer.receive_withdraw(prefix) {
                    debug!("{} withdraws {}", peer.id(), prefix);
                    if let Some(imported) = peer.import(raw) {
                        self.router.del_route(&imported);
                    }
                }
            }
            outbound.extend(self.propagate(prefix, before));
        }

        for announcement in update.announce {
            let prefix = announcement.prefix;
            let before = self.router.get_best_route(prefix).cloned();
            if let Some(peer) = self.peers.get_mut(&peer_addr) {
                let previous = peer.get_rib_in(prefix).cloned();
                let accepted = peer.receive_announce(
                    prefix,
                    announcement.nexthop,
                    as_path.clone(),
                    origin,
                    update.attributes.clone(),
                );

                // duplicate announcement, the RIB-in did not change
                if accepted.is_none() && peer.get_rib_in(prefix) == previous.as_ref() {
                    continue;
                }

                if let Some(imported) = previous.and_then(|r| peer.import(r)) {
                    self.router.del_route(&imported);
                }
                if let Some(route) = accepted {
                    self.router.add_route(route);
                }
            }
            outbound.extend(self.propagate(prefix, before));
        }

        Ok(outbound)
    }

    /// Process a state change of the BGP session with a peer.
    ///
    /// If the session comes up, every current best route is announced to the peer. If the
    /// session goes down, all routes received from the peer are removed, and the resulting
    /// changes are propagated to the remaining peers.
    pub fn peer_state_changed(&mut self, peer_addr: IpAddr, state: SessionState) -> Result<Outbound, SpeakerError> {
        let peer = self.peers.get_mut(&peer_addr).ok_or(SpeakerError::UnknownPeer(peer_addr))?;

        if peer.state() == state {
            debug!("Session with {} is already {}", peer.id(), state);
            return Ok(Vec::new());
        }

        let mut outbound = Vec::new();

        match state {
            SessionState::Up => {
                peer.session_up();
                let mut best_routes: Vec<&Route> = self.router.best_routes().values().collect();
                best_routes.sort_by_key(|r| (r.prefix.ip(), r.prefix.prefix()));
                for best in best_routes {
                    if best.from_peer == Some(peer.id()) {
                        continue;
                    }
                    if let Some(route) = peer.announce(best) {
                        outbound.push((peer.id(), BgpEvent::Announce(route)));
                    }
                }
            }
            SessionState::Down => {
                let mut routes: Vec<Route> = peer.routes().cloned().collect();
                routes.sort_by_key(|r| (r.prefix.ip(), r.prefix.prefix()));
                let imported: Vec<(Prefix, Option<Route>)> =
                    routes.into_iter().map(|r| (r.prefix, peer.import(r))).collect();
                peer.session_down();
                for (prefix, imported) in imported {
                    let before = self.router.get_best_route(prefix).cloned();
                    if let Some(imported) = imported {
                        self.router.del_route(&imported);
                    }
                    outbound.extend(self.propagate(prefix, before));
                }
            }
        }

        Ok(outbound)
    }

    /// A peer is attached to the dataplane.
    pub fn peer_attached(&mut self, peer_addr: IpAddr, attachment: Attachment) -> Result<(), SpeakerError> {
        let peer = self.peers.get_mut(&peer_addr).ok_or(SpeakerError::UnknownPeer(peer_addr))?;
        info!("{} is attached at {}", peer.id(), attachment);
        peer.connected(attachment);
        Ok(())
    }

    /// A peer is detached from the dataplane.
    pub fn peer_detached(&mut self, peer_addr: IpAddr) -> Result<(), SpeakerError> {
        let peer = self.peers.get_mut(&peer_addr).ok_or(SpeakerError::UnknownPeer(peer_addr))?;
        info!("{} is detached", peer.id());
        peer.disconnected();
        Ok(())
    }

    /// A border router is attached to the dataplane.
    pub fn border_attached(&mut self, router_id: IpAddr, attachment: Attachment) -> Result<(), SpeakerError> {
        let border = self.borders.get_mut(&router_id).ok_or(SpeakerError::UnknownBorder(router_id))?;
        info!("Border router {} is attached at {}", router_id, attachment);
        border.connected(attachment);
        Ok(())
    }

    /// A border router is detached from the dataplane.
    pub fn border_detached(&mut self, router_id: IpAddr) -> Result<(), SpeakerError> {
        let border = self.borders.get_mut(&router_id).ok_or(SpeakerError::UnknownBorder(router_id))?;
        info!("Border router {} is detached", router_id);
        border.disconnected();
        Ok(())
    }

    /// Originate a prefix from this router. An earlier origination of the same prefix with a
    /// different next-hop is replaced.
    pub fn originate(&mut self, prefix: Prefix, nexthop: IpAddr) -> Outbound {
        let route = RouteBuilder::new(prefix, nexthop).origin(Origin::Igp).local().build();
        let before = self.router.get_best_route(prefix).cloned();

        match self.originated.insert(prefix, route.clone()) {
            Some(old) if old == route => return Vec::new(),
            Some(old) => {
                self.router.del_route(&old);
            }
            None => {}
        }

        info!("Originate {}", prefix);
        self.router.add_route(route);
        self.propagate(prefix, before)
    }

    /// Stop originating a prefix.
    pub fn stop_originating(&mut self, prefix: Prefix) -> Outbound {
        let route = match self.originated.remove(&prefix) {
            Some(route) => route,
            None => {
                debug!("Prefix {} is not originated", prefix);
                return Vec::new();
            }
        };

        info!("Stop originating {}", prefix);
        let before = self.router.get_best_route(prefix).cloned();
        self.router.del_route(&route);
        self.propagate(prefix, before)
    }

    /// Propagate a change of the best route for the prefix to all peers whose session is up.
    fn propagate(&mut self, prefix: Prefix, before: Option<Route>) -> Outbound {
        let after = self.router.get_best_route(prefix).cloned();
        if after == before {
            return Vec::new();
        }
        debug!(
            "Propagate best route change for {}: {:?} -> {:?}",
            prefix,
            before.as_ref().map(|r| r.to_string()),
            after.as_ref().map(|r| r.to_string())
        );

        let mut outbound = Vec::new();
        for peer in self.peers.values_mut().filter(|p| p.state().is_up()) {
            let announced = match after.as_ref() {
                Some(best) if best.from_peer != Some(peer.id()) => peer.announce(best),
                _ => None,
            };
            match announced {
                Some(route) => outbound.push((peer.id(), BgpEvent::Announce(route))),
                None => {
                    if peer.withdraw_prefix(prefix).is_some() {
                        outbound.push((peer.id(), BgpEvent::Withdraw(prefix)));
                    }
                }
            }
        }
        outbound
    }
}
