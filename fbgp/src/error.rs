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

//! Module containing all error types

use crate::config::ConfigError;
use crate::policy::PolicyParseError;
use crate::rib::SpeakerError;
use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    /// Error propagated from the event processing
    #[error("Speaker Error: {0}")]
    SpeakerError(#[from] SpeakerError),
    /// Error propagated from parsing a policy
    #[error("Policy Error: {0}")]
    PolicyParseError(#[from] PolicyParseError),
    /// Error propagated from loading the configuration
    #[error("Config Error: {0}")]
    ConfigError(#[from] ConfigError),
}
