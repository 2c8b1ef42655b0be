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

//! # Policies
//!
//! This module contains the import and export policies of a peer. A [`Policy`] consists of a
//! [`Filter`], which decides whether a route is accepted, and a list of [`Action`]s.
//!
//! Both the filter and the actions can be parsed from an RPSL-like text representation:
//!
//! ```
//! # use fbgp::policy::Policy;
//! let policy = Policy::parse("{10.0.0.0/8^+} and not as65001", "pref = 120; med = 10").unwrap();
//! assert_eq!(policy.actions().len(), 2);
//! ```

mod action;
mod filter;
mod parser;

pub use action::Action;
pub use filter::{AsPathRegex, Filter, PrefixRange};

use crate::rib::Route;
use itertools::Itertools;
use std::fmt;
use thiserror::Error;

/// # Policy
/// A policy takes a route, checks if it matches the filter, applies the actions, and returns the
/// route. If the route does not match, the policy returns `None`.
///
/// The actions are stored, but not yet applied to the route. See [`Policy::evaluate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    filter: Filter,
    actions: Vec<Action>,
}

impl Default for Policy {
    /// The default policy accepts every route without changing it.
    fn default() -> Self {
        Self { filter: Filter::Any, actions: Vec::new() }
    }
}

impl Policy {
    /// Create a new policy
    pub fn new(filter: Filter, actions: Vec<Action>) -> Self {
        Self { filter, actions }
    }

    /// Parse a policy from the text representation of the filter and the actions.
    pub fn parse(filter: &str, actions: &str) -> Result<Self, PolicyParseError> {
        Ok(Self { filter: Filter::parse(filter)?, actions: Action::parse_list(actions)? })
    }

    /// Returns the filter of the policy
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Returns the actions of the policy
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Evaluate the policy on a route. Returns the route if it matches the filter, and `None`
    /// otherwise.
    pub fn evaluate(&self, route: Route) -> Option<Route> {
        if self.filter.matches(&route) {
            Some(self.apply_actions(route))
        } else {
            None
        }
    }

    /// Actions are parsed, but the deployed policies never apply them. The route is returned
    /// unchanged.
    fn apply_actions(&self, route: Route) -> Route {
        route
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Policy(filter={}, actions=[{}])", self.filter, self.actions.iter().join("; "))
    }
}

/// Error while parsing a policy. Every variant carries the offending fragment of the text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyParseError {
    /// Unknown or incorrect syntax
    #[error("Unknown or incorrect syntax: {0}")]
    Syntax(String),
    /// The construct is known, but not supported
    #[error("Not supported: {0}")]
    Unsupported(String),
    /// AS-PATH regular expressions with bracketed alternations are not supported
    #[error("Bracketed alternation in AS-PATH regex is not supported: {0}")]
    UnsupportedAlternation(String),
    /// The action is known, but not supported
    #[error("Action is not supported: {0}")]
    UnsupportedAction(String),
    /// The translated AS-PATH regex is invalid
    #[error("Invalid AS-PATH regex: {0}")]
    InvalidRegex(String),
    /// The prefix cannot be parsed
    #[error("Invalid prefix: {0}")]
    InvalidPrefix(String),
    /// A number cannot be parsed
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}
