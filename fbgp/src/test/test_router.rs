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

use crate::rib::*;
use maplit::hashset;
use rand::prelude::*;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::net::IpAddr;

const LOCAL_AS: AsId = AsId(65000);

fn addr(s: &str) -> IpAddr {
    s.parse().unwrap()
}

fn prefix(s: &str) -> Prefix {
    s.parse().unwrap()
}

fn peer(a: &str, asn: u32) -> PeerId {
    PeerId::new(AsId(asn), addr(a), LOCAL_AS, None)
}

fn route(p: &str, from: PeerId) -> RouteBuilder {
    RouteBuilder::new(prefix(p), from.peer_addr).as_path(vec![from.peer_as]).from_peer(from)
}

#[test]
fn test_add_route_higher_local_pref() {
    let a = peer("10.0.0.1", 1);
    let b = peer("10.0.0.2", 2);
    let mut r = Router::new();

    let ra = route("10.0.0.0/24", a).local_pref(100).build();
    let change = r.add_route(ra.clone());
    assert_eq!(change.new_best, Some(ra.clone()));
    assert_eq!(change.previous_best, None);

    let rb = route("10.0.0.0/24", b).local_pref(110).build();
    let change = r.add_route(rb.clone());
    assert_eq!(change.new_best, Some(rb.clone()));
    assert_eq!(change.previous_best, Some(ra.clone()));

    let best = r.get_best_route(prefix("10.0.0.0/24")).unwrap();
    assert_eq!(best.local_pref, Some(110));
    assert_eq!(r.get_candidates(prefix("10.0.0.0/24")).unwrap(), &hashset! {ra, rb});
}

#[test]
fn test_add_worse_route() {
    let a = peer("10.0.0.1", 1);
    let b = peer("10.0.0.2", 2);
    let mut r = Router::new();

    let ra = route("10.0.0.0/24", a).local_pref(110).build();
    let rb = route("10.0.0.0/24", b).local_pref(100).build();
    r.add_route(ra.clone());
    let change = r.add_route(rb);
    assert_eq!(change.new_best, None);
    assert_eq!(change.previous_best, Some(ra.clone()));
    assert_eq!(r.get_best_route(prefix("10.0.0.0/24")), Some(&ra));
    assert_eq!(r.get_candidates(prefix("10.0.0.0/24")).unwrap().len(), 2);
}

#[test]
fn test_add_same_route_twice() {
    let a = peer("10.0.0.1", 1);
    let mut r = Router::new();

    let ra = route("10.0.0.0/24", a).build();
    r.add_route(ra.clone());
    let change = r.add_route(ra.clone());
    assert_eq!(change.new_best, None);
    assert_eq!(change.previous_best, Some(ra));
    assert_eq!(r.get_candidates(prefix("10.0.0.0/24")).unwrap().len(), 1);
}

#[test]
fn test_del_route() {
    let a = peer("10.0.0.1", 1);
    let b = peer("10.0.0.2", 2);
    let p = prefix("10.0.0.0/24");

    let ra = route("10.0.0.0/24", a).build();
    let rb = route("10.0.0.0/24", b).local_pref(110).build();

    // remove the route which is not the best
    let mut r = Router::new();
    r.add_route(ra.clone());
    r.add_route(rb.clone());
    let change = r.del_route(&ra);
    assert_eq!(change.new_best, change.previous_best);
    assert_eq!(change.new_best, Some(rb.clone()));

    // remove the best route
    let mut r = Router::new();
    r.add_route(ra.clone());
    r.add_route(rb.clone());
    let change = r.del_route(&rb);
    assert_eq!(change.new_best, Some(ra.clone()));
    assert_eq!(change.previous_best, Some(rb));
    assert_eq!(r.get_best_route(p), Some(&ra));

    // remove the last route
    let change = r.del_route(&ra);
    assert_eq!(change.new_best, None);
    assert_eq!(change.previous_best, Some(ra));
    assert!(r.get_best_route(p).is_none());
    assert!(r.get_candidates(p).is_none());
    assert!(r.loc_rib().is_empty());
    assert!(r.best_routes().is_empty());
}

#[test]
fn test_del_unknown_route() {
    let a = peer("10.0.0.1", 1);
    let mut r = Router::new();
    let ra = route("10.0.0.0/24", a).build();

    let change = r.del_route(&ra);
    assert_eq!(change, BestPathChange::default());

    r.add_route(ra.clone());
    let other = route("10.0.0.0/24", a).med(20).build();
    let change = r.del_route(&other);
    assert_eq!(change.new_best, Some(ra.clone()));
    assert_eq!(change.previous_best, Some(ra));
}

#[test]
fn test_decision_order() {
    let a = peer("10.0.0.1", 1);
    let b = peer("10.0.0.2", 2);
    let i = peer("10.0.0.3", 65000);

    // local-pref beats everything else
    let x = route("1.0.0.0/8", b).local_pref(200).as_path(vec![AsId(2), AsId(3), AsId(4)]).build();
    let y = route("1.0.0.0/8", a).origin(Origin::Igp).build();
    assert_eq!(compare_routes(&x, &y), Ordering::Greater);
    assert_eq!(compare_routes(&y, &x), Ordering::Less);

    // locally originated routes win
    let x = RouteBuilder::new(prefix("1.0.0.0/8"), addr("10.0.0.254")).local().build();
    let y = route("1.0.0.0/8", a).build();
    assert_eq!(compare_routes(&x, &y), Ordering::Greater);

    // shorter as path wins
    let x = route("1.0.0.0/8", b).origin(Origin::Incomplete).build();
    let y = route("1.0.0.0/8", a).as_path(vec![AsId(1), AsId(5)]).origin(Origin::Igp).build();
    assert_eq!(compare_routes(&x, &y), Ordering::Greater);

    // lower origin wins
    let x = route("1.0.0.0/8", b).origin(Origin::Igp).build();
    let y = route("1.0.0.0/8", a).origin(Origin::Egp).build();
    assert_eq!(compare_routes(&x, &y), Ordering::Greater);

    // ebgp wins over ibgp
    let x = route("1.0.0.0/8", b).build();
    let y = route("1.0.0.0/8", i).as_path(vec![AsId(7)]).build();
    assert_eq!(compare_routes(&x, &y), Ordering::Greater);

    // lower peer wins
    let x = route("1.0.0.0/8", a).as_path(vec![AsId(7)]).build();
    let y = route("1.0.0.0/8", b).as_path(vec![AsId(7)]).build();
    assert_eq!(compare_routes(&x, &y), Ordering::Greater);
}

#[test]
fn test_med_same_neighbor_as() {
    let a1 = peer("10.0.0.1", 1);
    let a2 = peer("10.0.0.2", 1);

    let x = route("1.0.0.0/8", a1).med(10).build();
    let y = route("1.0.0.0/8", a2).med(50).build();
    // higher med wins
    assert_eq!(compare_routes(&y, &x), Ordering::Greater);
    assert_eq!(Router::select_best(vec![&x, &y]), Some(&y));
    assert_eq!(Router::select_best(vec![&y, &x]), Some(&y));
}

#[test]
fn test_med_ignored_between_different_as() {
    let a = peer("10.0.0.1", 1);
    let b = peer("10.0.0.2", 2);

    let x = route("1.0.0.0/8", a).med(10).build();
    let y = route("1.0.0.0/8", b).med(50).build();
    // med is skipped, the lower peer wins
    assert_eq!(compare_routes(&x, &y), Ordering::Greater);
    assert_eq!(Router::select_best(vec![&x, &y]), Some(&x));
    assert_eq!(Router::select_best(vec![&y, &x]), Some(&x));
}

#[test]
fn test_med_cycle() {
    let x = route("1.0.0.0/8", peer("10.0.0.1", 1)).med(10).build();
    let y = route("1.0.0.0/8", peer("10.0.0.3", 1)).med(50).build();
    let z = route("1.0.0.0/8", peer("10.0.0.2", 2)).med(0).build();

    // the pairwise comparison forms a cycle
    assert_eq!(compare_routes(&y, &x), Ordering::Greater);
    assert_eq!(compare_routes(&z, &y), Ordering::Greater);
    assert_eq!(compare_routes(&x, &z), Ordering::Greater);

    let orders = vec![
        vec![&x, &y, &z],
        vec![&x, &z, &y],
        vec![&y, &x, &z],
        vec![&y, &z, &x],
        vec![&z, &x, &y],
        vec![&z, &y, &x],
    ];
    for order in orders {
        assert_eq!(Router::select_best(order.clone()), Some(&y));

        let mut r = Router::new();
        for route in order {
            r.add_route(route.clone());
        }
        let candidates = r.get_candidates(prefix("1.0.0.0/8")).unwrap();
        assert_eq!(r.get_best_route(prefix("1.0.0.0/8")), Router::select_best(candidates.iter()));
        assert_eq!(r.get_best_route(prefix("1.0.0.0/8")), Some(&y));
    }
}

#[test]
fn test_tie_break_on_peer() {
    let mut rng = StdRng::seed_from_u64(42);
    let peers: Vec<PeerId> =
        (1..=6).map(|i| PeerId::new(AsId(1), format!("10.0.0.{}", i).parse().unwrap(), LOCAL_AS, None)).collect();
    let routes: Vec<Route> = peers
        .iter()
        .map(|p| {
            RouteBuilder::new(prefix("1.0.0.0/8"), addr("10.0.1.1")).as_path(vec![AsId(1)]).from_peer(*p).build()
        })
        .collect();

    for _ in 0..20 {
        let mut order = routes.clone();
        order.shuffle(&mut rng);

        assert_eq!(Router::select_best(order.iter()), Some(&routes[0]));

        let mut r = Router::new();
        for route in order {
            r.add_route(route);
        }
        assert_eq!(r.get_best_route(prefix("1.0.0.0/8")), Some(&routes[0]));
    }
}

#[test]
fn test_select_best_deterministic() {
    let mut rng = StdRng::seed_from_u64(7);
    let routes = route_pool();

    let expected = Router::select_best(routes.iter()).cloned();
    assert!(expected.is_some());
    for _ in 0..50 {
        let mut order = routes.clone();
        order.shuffle(&mut rng);
        assert_eq!(Router::select_best(order.iter()).cloned(), expected);
    }
}

#[test]
fn test_best_route_invariant() {
    let mut rng = StdRng::seed_from_u64(1337);
    let pool = route_pool();
    let p = pool[0].prefix;
    let mut present: HashSet<Route> = HashSet::new();
    let mut r = Router::new();

    for _ in 0..500 {
        let route = pool[rng.gen_range(0, pool.len())].clone();
        if present.contains(&route) {
            present.remove(&route);
            r.del_route(&route);
        } else {
            present.insert(route.clone());
            r.add_route(route);
        }

        match r.get_candidates(p) {
            Some(candidates) => {
                assert_eq!(candidates, &present);
                assert_eq!(r.get_best_route(p), Router::select_best(candidates.iter()));
            }
            None => {
                assert!(present.is_empty());
                assert!(r.get_best_route(p).is_none());
            }
        }
    }
}

/// Routes for the same prefix with different attributes. Some neighbors share an AS, such that
/// the MED is compared between some of the routes, but not between others.
fn route_pool() -> Vec<Route> {
    let peers = vec![
        peer("10.0.0.1", 1),
        peer("10.0.0.2", 2),
        peer("10.0.0.3", 3),
        peer("10.0.0.4", 65000),
        peer("10.0.0.5", 65000),
        peer("10.0.0.6", 1),
        peer("10.0.0.7", 2),
    ];
    let mut routes = Vec::new();
    for p in peers {
        for lp in &[90, 100] {
            for len in 1..=2 {
                for origin in &[Origin::Igp, Origin::Incomplete] {
                    for med in &[0, 10, 50] {
                        let as_path = (0..len).map(|i| AsId(p.peer_as.0 + i)).collect();
                        routes.push(
                            route("2.0.0.0/16", p)
                                .local_pref(*lp)
                                .as_path(as_path)
                                .origin(*origin)
                                .med(*med)
                                .build(),
                        );
                    }
                }
            }
        }
    }
    routes
}
