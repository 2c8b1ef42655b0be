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

//! Module defining the RIB engine with the BGP decision process.

use crate::rib::{AsId, BestPathChange, Origin, PeerId, Prefix, Route};
use itertools::Itertools;
use log::*;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;

/// # Bgp Router (RIB engine)
///
/// The router owns the loc-RIB, which contains every candidate route for each prefix, and the
/// table of selected best routes. A prefix is present in the table of best routes if and only if
/// it has at least one candidate, and the best route is always the result of [`Router::select_best`]
/// over all candidates. The only functions modifying the tables are [`Router::add_route`] and
/// [`Router::del_route`]. They must not be called concurrently, since `add_route` relies on the
/// current best route dominating all other candidates.
#[derive(Debug, Clone, Default)]
pub struct Router {
    /// Table containing all candidate routes. It is represented as a hashmap, mapping the
    /// prefixes to the set of distinct routes received from all peers.
    loc_rib: HashMap<Prefix, HashSet<Route>>,
    /// Table containing all selected best routes.
    best_routes: HashMap<Prefix, Route>,
}

impl Router {
    /// Create an empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the selected best route for the prefix, or `None`.
    pub fn get_best_route(&self, prefix: Prefix) -> Option<&Route> {
        self.best_routes.get(&prefix)
    }

    /// Returns all candidate routes known for the prefix.
    pub fn get_candidates(&self, prefix: Prefix) -> Option<&HashSet<Route>> {
        self.loc_rib.get(&prefix)
    }

    /// Returns the table of best routes
    pub fn best_routes(&self) -> &HashMap<Prefix, Route> {
        &self.best_routes
    }

    /// Returns the loc-RIB
    pub fn loc_rib(&self) -> &HashMap<Prefix, HashSet<Route>> {
        &self.loc_rib
    }

    /// Select the best route out of a set of candidates, by a pairwise reduction using
    /// [`compare_routes`]. If the two routes cannot be distinguished, the route selected so far
    /// (the left operand) is kept.
    ///
    /// The candidates are sorted by a fixed key (the supplying peer first) before the reduction.
    /// Since the MED comparison is not transitive, this is required for the winner to be
    /// independent of the order in which the candidates are given.
    pub fn select_best<'a, I>(routes: I) -> Option<&'a Route>
    where
        I: IntoIterator<Item = &'a Route>,
    {
        let mut routes: Vec<&'a Route> = routes.into_iter().collect();
        routes.sort_by(|a, b| selection_key(a).cmp(&selection_key(b)));
        routes.into_iter().fold(None, |best, route| match best {
            None => Some(route),
            Some(best) => match compare_routes(route, best) {
                Ordering::Greater => Some(route),
                _ => Some(best),
            },
        })
    }

    /// Add a route to the loc-RIB, replacing a route with the same value. If all candidates are
    /// received from the same neighboring AS, the new route is only compared with the current
    /// best route, since the current best already dominates every other candidate. Otherwise, the
    /// MED comparison is skipped between some candidates, and all of them are compared again.
    ///
    /// If the best route changes, `new_best` of the result is set to the new best route.
    /// Otherwise, it is `None`.
    pub fn add_route(&mut self, route: Route) -> BestPathChange {
        let prefix = route.prefix;
        let previous_best = self.best_routes.get(&prefix).cloned();

        let candidates = self.loc_rib.entry(prefix).or_default();
        candidates.replace(route.clone());

        let candidate_best = match previous_best.as_ref() {
            Some(prev) if candidates.iter().map(|r| r.from_as).all_equal() => {
                Self::select_best(vec![prev, &route]).cloned()
            }
            Some(_) => Self::select_best(candidates.iter()).cloned(),
            None => Some(route),
        };

        match candidate_best {
            Some(new_best) if Some(&new_best) != previous_best.as_ref() => {
                debug!("New best route for {}: {}", prefix, new_best);
                self.best_routes.insert(prefix, new_best.clone());
                BestPathChange { new_best: Some(new_best), previous_best }
            }
            _ => BestPathChange { new_best: None, previous_best },
        }
    }

    /// Remove a route from the loc-RIB. The best route is recomputed over all remaining
    /// candidates. If no candidate is left, the prefix is removed from both tables.
    ///
    /// `new_best` of the result is always the current best route, regardless of whether it has
    /// changed.
    pub fn del_route(&mut self, route: &Route) -> BestPathChange {
        let prefix = route.prefix;
        let previous_best = self.best_routes.get(&prefix).cloned();

        let routes = match self.loc_rib.get_mut(&prefix) {
            Some(routes) => routes,
            None => return BestPathChange { new_best: None, previous_best },
        };

        if !routes.remove(route) {
            trace!("Route to remove is not in the loc-RIB: {}", route);
        }

        let new_best = Self::select_best(routes.iter()).cloned();

        match new_best.as_ref() {
            Some(best) => {
                self.best_routes.insert(prefix, best.clone());
            }
            None => {
                self.loc_rib.remove(&prefix);
                self.best_routes.remove(&prefix);
            }
        }

        if new_best != previous_best {
            debug!("Best route for {} changed to {:?}", prefix, new_best.as_ref().map(|r| r.to_string()));
        }

        BestPathChange { new_best, previous_best }
    }
}

/// Compare two routes for the best path selection. Returns `Ordering::Greater` if `a` is
/// preferred over `b`, and `Ordering::Less` if `b` is preferred over `a`.
///
/// The attributes are compared in the following order. The first attribute which discriminates
/// between both routes decides.
/// 1. LOCAL-PREF: higher wins
/// 2. locally originated routes win
/// 3. AS-PATH length: shorter wins
/// 4. ORIGIN: lower wins (`Igp < Egp < Incomplete`)
/// 5. MED: higher wins, only compared if both routes are received from the same AS
/// 6. routes learned via eBGP win over routes learned via iBGP
/// 7. Peer identity: lower wins
///
/// Since the MED is skipped for routes from different neighboring ASes, this comparison is not
/// transitive. Three routes `x`, `y` (both from AS 1) and `z` (from AS 2) can form a cycle, where
/// `y` beats `x` on the MED, `z` beats `y` and `x` beats `z` on the peer identity. Use
/// [`Router::select_best`] to pick a winner out of more than two routes.
///
/// The MED comparison reproduces the observed behavior of the deployed decision process, which is
/// the inverse of the usual BGP convention (lower MED wins). It is not a corrected algorithm.
///
/// Routes that are equal in all seven attributes only differ in their next-hop, AS-PATH content,
/// or community. These are compared last, such that the outcome does not depend on the order of
/// the candidates.
pub fn compare_routes(a: &Route, b: &Route) -> Ordering {
    match a.local_pref_or_default().cmp(&b.local_pref_or_default()) {
        Ordering::Equal => {}
        o => return o,
    }

    match a.local.cmp(&b.local) {
        Ordering::Equal => {}
        o => return o,
    }

    match a.as_path.len().cmp(&b.as_path.len()) {
        Ordering::Equal => {}
        o => return o.reverse(),
    }

    match a.origin.cmp(&b.origin) {
        Ordering::Equal => {}
        o => return o.reverse(),
    }

    if a.from_as == b.from_as {
        match a.med.cmp(&b.med) {
            Ordering::Equal => {}
            o => return o,
        }
    }

    match a.from_ibgp.cmp(&b.from_ibgp) {
        Ordering::Equal => {}
        o => return o.reverse(),
    }

    match a.from_peer.cmp(&b.from_peer) {
        Ordering::Equal => {}
        o => return o.reverse(),
    }

    a.nexthop
        .cmp(&b.nexthop)
        .then_with(|| a.as_path.cmp(&b.as_path))
        .then_with(|| a.community.cmp(&b.community))
        .then_with(|| a.local_pref.cmp(&b.local_pref))
        .reverse()
}

/// Key for sorting the candidates before the selection. All fields of the route are part of the
/// key, such that distinct routes never share the same key.
#[allow(clippy::type_complexity)]
fn selection_key(
    r: &Route,
) -> (Option<PeerId>, IpAddr, &[AsId], Option<&str>, Option<u32>, u32, Origin, bool, Option<AsId>, bool) {
    (
        r.from_peer,
        r.nexthop,
        r.as_path.as_slice(),
        r.community.as_deref(),
        r.local_pref,
        r.med,
        r.origin,
        r.local,
        r.from_as,
        r.from_ibgp,
    )
}
