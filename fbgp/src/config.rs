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

//! # Configuration
//!
//! The configuration is a YAML file, describing the local AS, the peers with their import and
//! export policies, and the border routers of the own network.
//!
//! ```yaml
//! local_as: 65000
//! peers:
//!   - peer_ip: 10.0.0.1
//!     peer_as: 1
//!     local_ip: 10.0.0.254
//!     import_policy:
//!       filter: "{10.0.0.0/8^+}"
//!       actions: "pref = 120"
//!     export_policy:
//!       filter: "not <^as65001$>"
//! borders:
//!   - routerid: 10.2.2.2
//!     nexthop: 10.0.30.2
//! ```
//!
//! Policies are kept as text in the configuration, and parsed by
//! [`Speaker::from_config`](crate::rib::Speaker::from_config).

use crate::policy::{Policy, PolicyParseError};
use crate::rib::{AsId, DEFAULT_PEER_PORT};
use serde::Deserialize;
use std::fs;
use std::net::IpAddr;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

struct Defaults {}

impl Defaults {
    fn peer_port() -> u16 {
        DEFAULT_PEER_PORT
    }

    fn filter() -> String {
        String::from("any")
    }
}

/// Configuration of the speaker
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Local AS, used for all peers which do not configure their own local AS.
    #[serde(default)]
    pub local_as: Option<AsId>,
    /// Configured peers
    #[serde(default)]
    pub peers: Vec<PeerConfig>,
    /// Border routers of the own network
    #[serde(default)]
    pub borders: Vec<BorderConfig>,
}

/// Configuration of a single peer
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PeerConfig {
    /// Address of the peer
    pub peer_ip: IpAddr,
    /// AS of the peer
    pub peer_as: AsId,
    /// Local AS of the session. Defaults to the global local AS.
    #[serde(default)]
    pub local_as: Option<AsId>,
    /// Local address of the session
    #[serde(default)]
    pub local_ip: Option<IpAddr>,
    /// TCP port of the session
    #[serde(default = "Defaults::peer_port")]
    pub peer_port: u16,
    /// Policy for routes received from the peer
    #[serde(default)]
    pub import_policy: PolicyConfig,
    /// Policy for routes announced to the peer
    #[serde(default)]
    pub export_policy: PolicyConfig,
}

/// Text representation of a policy
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PolicyConfig {
    /// Filter expression
    #[serde(default = "Defaults::filter")]
    pub filter: String,
    /// `;` separated list of actions
    #[serde(default)]
    pub actions: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self { filter: Defaults::filter(), actions: String::new() }
    }
}

impl PolicyConfig {
    /// Parse the policy
    pub fn build(&self) -> Result<Policy, PolicyParseError> {
        Policy::parse(&self.filter, &self.actions)
    }
}

/// Configuration of a border router
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BorderConfig {
    /// Router id
    #[serde(rename = "routerid", alias = "router_id")]
    pub router_id: IpAddr,
    /// Next-hop address of the border router
    pub nexthop: IpAddr,
}

impl Config {
    /// Read the configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse the configuration from a YAML string.
    pub fn from_yaml(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_yaml(s)
    }
}

/// Errors of loading the configuration and building the speaker
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file cannot be read
    #[error("Cannot read the configuration: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration is not valid YAML, or has the wrong structure
    #[error("Invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The policy of a peer cannot be parsed
    #[error("Invalid policy of peer {peer}: {source}")]
    Policy {
        /// Address of the peer
        peer: IpAddr,
        /// Parse error
        source: PolicyParseError,
    },
    /// Two peers are configured with the same address
    #[error("Peer {0} is configured twice")]
    DuplicatePeer(IpAddr),
    /// Neither the peer nor the configuration define the local AS
    #[error("No local AS is configured for peer {0}")]
    MissingLocalAs(IpAddr),
}
