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

use fbgp::config::Config;
use fbgp::rib::{Event, Speaker};

use clap::Parser;
use log::*;
use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

fn main() -> Result<(), Box<dyn Error>> {
    // initialize the env logger
    pretty_env_logger::init();

    // run clap
    let args = CommandLineArguments::parse();

    match args.cmd {
        MainCommand::Check { config } => check(config),
        MainCommand::Replay { config, events, keep_going } => replay(config, events, keep_going),
    }
}

/// Load the configuration, and print all peers and border routers.
fn check(config: PathBuf) -> Result<(), Box<dyn Error>> {
    let speaker = build_speaker(&config)?;
    for peer in speaker.peers() {
        println!("{}", peer);
    }
    for border in speaker.borders() {
        println!("{}", border);
    }
    info!("Configuration {} is valid", config.display());
    Ok(())
}

/// Replay a file of events (one JSON object per line), and print all outbound events.
fn replay(config: PathBuf, events: PathBuf, keep_going: bool) -> Result<(), Box<dyn Error>> {
    let mut speaker = build_speaker(&config)?;
    let reader = BufReader::new(File::open(&events)?);

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let event: Event = serde_json::from_str(line)
            .map_err(|e| format!("{}:{}: invalid event: {}", events.display(), i + 1, e))?;

        match speaker.handle_event(event) {
            Ok(outbound) => {
                for (peer, event) in outbound {
                    println!("neighbor {} {}", peer.peer_addr, event);
                }
            }
            Err(e) if keep_going => error!("{}:{}: {}", events.display(), i + 1, e),
            Err(e) => return Err(e.into()),
        }
    }

    for route in speaker.router().best_routes().values() {
        debug!("best: {}", route);
    }
    Ok(())
}

fn build_speaker(config: &Path) -> Result<Speaker, fbgp::Error> {
    let config = Config::load(config)?;
    Ok(Speaker::from_config(&config)?)
}

#[derive(Parser, Debug)]
#[clap(name = "fbgp", author = "Tibor Schneider")]
struct CommandLineArguments {
    /// Action to perform
    #[clap(subcommand)]
    cmd: MainCommand,
}

#[derive(Parser, Debug)]
enum MainCommand {
    /// Load and validate the configuration
    #[clap(name = "check")]
    Check {
        /// YAML configuration file
        config: PathBuf,
    },
    /// Replay a file of inbound events and print the outbound announcements and withdraws
    #[clap(name = "replay")]
    Replay {
        /// YAML configuration file
        config: PathBuf,
        /// File with one JSON event per line
        events: PathBuf,
        /// Log rejected events and continue, instead of aborting
        #[clap(short = 'k', long)]
        keep_going: bool,
    },
}
