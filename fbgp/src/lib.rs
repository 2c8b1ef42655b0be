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

#![deny(missing_docs)]

//! # fBGP: Flow-based BGP Decision Core
//! This is a library implementing the decision core of a software-defined BGP speaker. It keeps
//! the per-peer route tables, runs the BGP best-path selection, enforces import and export
//! policies, and computes which routes must be announced or withdrawn to which neighbor.
//!
//! The library does not speak BGP on the wire. Updates arrive pre-decoded, and every operation
//! returns plain data (a list of [`BgpEvent`](rib::BgpEvent)s per target peer), which the caller
//! serializes and sends to the external BGP speaker.
//!
//! ## Structure
//!
//! - **[`Rib`](rib)**: The routing tables. [`Route`](rib::Route) is the value stored in all
//!   tables, [`Peer`](rib::Peer) owns the RIB-in and RIB-out of one neighbor,
//!   [`Router`](rib::Router) owns the loc-RIB and the table of best routes, and
//!   [`Speaker`](rib::Speaker) funnels all inbound events through one ordered processing path.
//!
//! - **[`Policy`](policy)**: Import and export policies. A [`Policy`](policy::Policy) is made of a
//!   [`Filter`](policy::Filter) predicate tree and a list of [`Action`](policy::Action)s. Filters
//!   can be parsed from an RPSL-like text representation.
//!
//! - **[`Config`](config)**: YAML configuration of the peers, their policies and the border
//!   routers.
//!
//! ## Usage
//!
//! ```
//! use fbgp::rib::{AsId, BgpEvent, SessionState, Speaker, Update};
//! use fbgp::config::Config;
//!
//! fn main() -> Result<(), fbgp::Error> {
//!     let config = Config::from_yaml(
//!         "
//! local_as: 65000
//! peers:
//!   - peer_ip: 10.0.0.1
//!     peer_as: 1
//!   - peer_ip: 10.0.0.2
//!     peer_as: 2
//! ",
//!     )?;
//!     let mut speaker = Speaker::from_config(&config)?;
//!     let a = "10.0.0.1".parse().unwrap();
//!     let b = "10.0.0.2".parse().unwrap();
//!     speaker.peer_state_changed(a, SessionState::Up)?;
//!     speaker.peer_state_changed(b, SessionState::Up)?;
//!
//!     let update = Update::announce(
//!         vec!["1.0.0.0/24".parse().unwrap()],
//!         a,
//!         vec![AsId(1), AsId(3)],
//!     );
//!     let out = speaker.update_received(a, update)?;
//!
//!     // the route is re-announced to peer b, with the local AS prepended
//!     assert_eq!(out.len(), 1);
//!     let (target, event) = &out[0];
//!     assert_eq!(target.peer_addr, b);
//!     match event {
//!         BgpEvent::Announce(route) => {
//!             assert_eq!(route.as_path, vec![AsId(65000), AsId(1), AsId(3)])
//!         }
//!         BgpEvent::Withdraw(_) => unreachable!(),
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
mod error;
pub mod policy;
pub mod rib;

// test modules
mod test;

pub use error::Error;
