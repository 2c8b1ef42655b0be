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

//! # Routing tables
//!
//! This module contains the routing tables of the speaker and the BGP decision process.
//!
//! - [`Route`] is the value stored in all tables. It is built with a [`RouteBuilder`].
//! - [`Peer`] owns the RIB-in and RIB-out of one neighbor, and applies the import and export
//!   policies.
//! - [`Router`] owns the loc-RIB and the table of best routes, and runs the best path selection.
//! - [`Speaker`] wires peers and router together, and processes all inbound [`Event`]s in order.

mod bgp;
mod border;
mod event;
mod peer;
mod route;
mod router;
mod speaker;
mod types;

pub use bgp::{BestPathChange, BgpEvent};
pub use border::Border;
pub use event::{Announcement, Event, Update};
pub use peer::{Peer, DEFAULT_PEER_PORT};
pub use route::{PathAttributes, Route, RouteBuilder, DEFAULT_LOCAL_PREF, DEFAULT_MED};
pub use router::{compare_routes, Router};
pub use speaker::{Outbound, Speaker};
pub use types::*;
