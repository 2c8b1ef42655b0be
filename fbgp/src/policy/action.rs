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

//! Actions of a policy

use crate::policy::PolicyParseError;
use crate::rib::{AsId, Origin};
use itertools::Itertools;
use std::fmt;
use std::net::IpAddr;

/// Action of a policy, to modify the attributes of a route.
///
/// The text representation is a `;` separated list of actions:
///
/// ```text
/// pref = 120; med = 100; origin = igp; nexthop = 10.0.0.1;
/// aspath.prepend(AS123, AS123); community .= {345:80}
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Overwrite the LOCAL-PREF
    SetLocalPref(u32),
    /// Overwrite the MED
    SetMed(u32),
    /// Overwrite the ORIGIN
    SetOrigin(Origin),
    /// Overwrite the NEXT-HOP
    SetNextHop(IpAddr),
    /// Prepend the AS numbers to the AS-PATH
    AsPathPrepend(Vec<AsId>),
    /// Append communities to the community attribute
    CommunityAppend(Vec<String>),
}

impl Action {
    /// Parse a `;` separated list of actions. An empty string results in an empty list.
    pub fn parse_list(s: &str) -> Result<Vec<Self>, PolicyParseError> {
        let s: String = s.to_lowercase().chars().filter(|c| !c.is_whitespace()).collect();
        s.split(';').filter(|a| !a.is_empty()).map(Self::parse).collect()
    }

    /// Parse a single action, without any whitespace.
    fn parse(s: &str) -> Result<Self, PolicyParseError> {
        if s.starts_with("community") {
            let value = s
                .strip_prefix("community.=")
                .ok_or_else(|| PolicyParseError::UnsupportedAction(s.to_string()))?;
            let inner = value
                .strip_prefix('{')
                .and_then(|v| v.strip_suffix('}'))
                .ok_or_else(|| PolicyParseError::Syntax(s.to_string()))?;
            let communities: Vec<String> =
                inner.split(',').filter(|c| !c.is_empty()).map(String::from).collect();
            if communities.is_empty() {
                return Err(PolicyParseError::Syntax(s.to_string()));
            }
            return Ok(Self::CommunityAppend(communities));
        }

        if s.starts_with("aspath") {
            let inner = s
                .strip_prefix("aspath.prepend(")
                .and_then(|v| v.strip_suffix(')'))
                .ok_or_else(|| PolicyParseError::UnsupportedAction(s.to_string()))?;
            let path = inner
                .split(',')
                .map(|a| {
                    a.trim_start_matches("as")
                        .parse::<u32>()
                        .map(AsId)
                        .map_err(|_| PolicyParseError::InvalidNumber(s.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Self::AsPathPrepend(path));
        }

        let (key, value) = match s.split_once('=') {
            Some(kv) => kv,
            None => return Err(PolicyParseError::Syntax(s.to_string())),
        };
        let number = || value.parse::<u32>().map_err(|_| PolicyParseError::InvalidNumber(s.to_string()));
        match key {
            k if k.contains("pref") => Ok(Self::SetLocalPref(number()?)),
            k if k.contains("med") => Ok(Self::SetMed(number()?)),
            k if k.contains("origin") => value
                .parse::<Origin>()
                .map(Self::SetOrigin)
                .map_err(|_| PolicyParseError::Syntax(s.to_string())),
            k if k.contains("nexthop") => value
                .parse::<IpAddr>()
                .map(Self::SetNextHop)
                .map_err(|_| PolicyParseError::Syntax(s.to_string())),
            _ => Err(PolicyParseError::Syntax(s.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetLocalPref(x) => write!(f, "pref = {}", x),
            Self::SetMed(x) => write!(f, "med = {}", x),
            Self::SetOrigin(x) => write!(f, "origin = {}", x),
            Self::SetNextHop(x) => write!(f, "nexthop = {}", x),
            Self::AsPathPrepend(path) => {
                write!(f, "aspath.prepend({})", path.iter().map(|a| format!("AS{}", a)).join(", "))
            }
            Self::CommunityAppend(c) => write!(f, "community .= {{{}}}", c.iter().join(", ")),
        }
    }
}
