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

//! Module containing definitions for BGP events

use crate::rib::{Prefix, Route};
use std::fmt;

/// Outbound BGP Events, to be sent to a peer
#[derive(Debug, Clone, PartialEq)]
pub enum BgpEvent {
    /// Announce a route (already transformed for the target peer)
    Announce(Route),
    /// Withdraw a previously announced prefix
    Withdraw(Prefix),
}

impl BgpEvent {
    /// Returns the prefix for which this event is responsible
    pub fn prefix(&self) -> Prefix {
        match self {
            Self::Withdraw(p) => *p,
            Self::Announce(r) => r.prefix,
        }
    }

    /// returns true if the event is a withdraw
    pub fn is_withdraw(&self) -> bool {
        matches!(self, Self::Withdraw(_))
    }
}

impl fmt::Display for BgpEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Announce(r) => write!(f, "announce {}", r),
            Self::Withdraw(p) => write!(f, "withdraw {}", p),
        }
    }
}

/// Result of a transaction on the loc-RIB.
///
/// `new_best` is the best route after the transaction, and `previous_best` is the best route
/// before. For [`Router::add_route`](crate::rib::Router::add_route), `new_best` is only set if the
/// best route has changed. For [`Router::del_route`](crate::rib::Router::del_route), `new_best` is
/// always the current best route (or `None` if there is no route left for the prefix).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BestPathChange {
    /// Best route after the transaction
    pub new_best: Option<Route>,
    /// Best route before the transaction
    pub previous_best: Option<Route>,
}
