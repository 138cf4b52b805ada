//! Command-line interface definitions.
//!
//! This module defines the server flags and the client subcommands using
//! clap.

use clap::{Parser, Subcommand};
use std::time::Duration;

use crate::command::{CommandKind, WireCommand};
use crate::config::{StoreConfig, SweepPolicy, DEFAULT_QUEUE_CAPACITY};
use crate::ttl::parse_duration;

/// Default address the server listens on and the client connects to.
pub const DEFAULT_ADDR: &str = "localhost:12345";

/// TTL key-value store server.
#[derive(Parser, Debug)]
#[command(name = "ttl-store-server")]
#[command(author, version, about, long_about = None)]
pub struct ServerArgs {
    /// Default TTL for keys, as a duration string (`10s`, `1m30s`).
    #[arg(long, env = "TTL_STORE_KEY_TTL", default_value = "10s", value_parser = parse_ttl_flag)]
    pub key_ttl: Duration,

    /// Address to listen on.
    #[arg(long, env = "TTL_STORE_LISTEN_ADDR", default_value = DEFAULT_ADDR)]
    pub listen_addr: String,

    /// Capacity of each request queue.
    #[arg(long, env = "TTL_STORE_QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Which TTL the `List` sweep applies.
    #[arg(long, value_enum, default_value_t = SweepPolicy::DefaultTtl)]
    pub sweep_policy: SweepPolicy,
}

impl ServerArgs {
    /// Store configuration described by these flags.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new()
            .default_ttl(self.key_ttl)
            .queue_capacity(self.queue_capacity)
            .sweep_policy(self.sweep_policy)
            .build()
    }
}

fn parse_ttl_flag(s: &str) -> Result<Duration, String> {
    parse_duration(s).ok_or_else(|| format!("invalid duration '{}'", s))
}

/// TTL key-value store client.
///
/// A CLI tool for talking to a running server.
#[derive(Parser, Debug)]
#[command(name = "ttl-store-client")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Server address.
    #[arg(long, global = true, env = "TTL_STORE_ADDR", default_value = DEFAULT_ADDR)]
    pub addr: String,

    /// The command to execute.
    #[clap(subcommand)]
    pub command: ClientCommand,
}

/// Available client commands.
#[derive(Subcommand, Debug)]
pub enum ClientCommand {
    /// Create a key. Fails if the key already holds a live value.
    Create { key: String, value: String },

    /// Get the value stored at a key.
    Get { key: String },

    /// Replace the value of an existing key.
    Update { key: String, value: String },

    /// Set a key's TTL (`10s`, `1h30m`, or whole seconds).
    Ttl { key: String, ttl: String },

    /// Remove a key.
    Remove { key: String },

    /// List live keys.
    List,

    /// Show server statistics.
    Stats,
}

impl ClientCommand {
    /// The protocol command to send.
    pub fn to_wire(&self) -> WireCommand {
        match self {
            ClientCommand::Create { key, value } => {
                WireCommand::new(CommandKind::Create, Some(key.clone()), Some(value.clone()))
            }
            ClientCommand::Get { key } => WireCommand::new(CommandKind::Get, Some(key.clone()), None),
            ClientCommand::Update { key, value } => {
                WireCommand::new(CommandKind::Update, Some(key.clone()), Some(value.clone()))
            }
            ClientCommand::Ttl { key, ttl } => {
                WireCommand::new(CommandKind::Ttl, Some(key.clone()), Some(ttl.clone()))
            }
            ClientCommand::Remove { key } => {
                WireCommand::new(CommandKind::Remove, Some(key.clone()), None)
            }
            ClientCommand::List => WireCommand::new(CommandKind::List, None, None),
            ClientCommand::Stats => WireCommand::new(CommandKind::Stats, None, None),
        }
    }
}
