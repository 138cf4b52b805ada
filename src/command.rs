//! Command types for the line protocol.
//!
//! Each line a client sends holds one command, either as a JSON object
//! `{"command": "Create", "key": "foo", "value": "bar"}` or in the text form
//! `Create foo bar`.

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::value::Value;

/// Types of commands supported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Create,
    Get,
    Update,
    /// Set a per-entry TTL.
    Ttl,
    Remove,
    List,
    /// Report store statistics.
    Stats,
    /// End the session.
    Close,
    /// Invalid or unknown command.
    Invalid,
}

impl CommandKind {
    /// Parse a command name (case-insensitive).
    ///
    /// Returns `CommandKind::Invalid` for unknown names.
    pub fn get(s: &str) -> CommandKind {
        match s.to_lowercase().as_str() {
            "create" => CommandKind::Create,
            "get" => CommandKind::Get,
            "update" => CommandKind::Update,
            "ttl" | "setttl" => CommandKind::Ttl,
            "remove" | "delete" | "del" => CommandKind::Remove,
            "list" => CommandKind::List,
            "stats" | "info" => CommandKind::Stats,
            "close" | "quit" => CommandKind::Close,
            _ => CommandKind::Invalid,
        }
    }

    /// Canonical name, as sent by the client.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Create => "Create",
            CommandKind::Get => "Get",
            CommandKind::Update => "Update",
            CommandKind::Ttl => "TTL",
            CommandKind::Remove => "Remove",
            CommandKind::List => "List",
            CommandKind::Stats => "Stats",
            CommandKind::Close => "Close",
            CommandKind::Invalid => "invalid",
        }
    }

    /// Whether the command needs a key argument.
    pub fn takes_key(&self) -> bool {
        matches!(
            self,
            CommandKind::Create
                | CommandKind::Get
                | CommandKind::Update
                | CommandKind::Ttl
                | CommandKind::Remove
        )
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A decoded command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub kind: CommandKind,
    /// Name as it appeared on the wire.
    pub name: String,
    pub key: Option<String>,
    pub value: Option<Value>,
}

/// The JSON shape of a command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireCommand {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl WireCommand {
    /// Build a command for sending.
    pub fn new(kind: CommandKind, key: Option<String>, value: Option<String>) -> Self {
        Self {
            command: kind.as_str().to_string(),
            key,
            value: value.map(serde_json::Value::String),
        }
    }

    /// Encode as one JSON line, newline included.
    pub fn to_line(&self) -> StoreResult<String> {
        let mut line =
            serde_json::to_string(self).map_err(|e| StoreError::ParseError(e.to_string()))?;
        line.push('\n');
        Ok(line)
    }
}

impl From<WireCommand> for Command {
    fn from(wire: WireCommand) -> Self {
        Command {
            kind: CommandKind::get(&wire.command),
            name: wire.command,
            key: wire.key,
            value: wire.value.and_then(json_to_value),
        }
    }
}

fn json_to_value(json: serde_json::Value) -> Option<Value> {
    match json {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(Value::Str(s)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Value::Int(i)),
            None => Some(Value::Str(n.to_string())),
        },
        other => Some(Value::Str(other.to_string())),
    }
}

impl Command {
    /// Decode one protocol line, JSON first, then the text form.
    ///
    /// Trailing `\r\n` is ignored. Fails only on an empty line.
    pub fn parse(line: &str) -> StoreResult<Command> {
        let line = line.trim_end_matches(['\r', '\n']);
        match serde_json::from_str::<WireCommand>(line) {
            Ok(wire) => Ok(wire.into()),
            Err(_) => Self::parse_text(line),
        }
    }

    /// Decode the text form `COMMAND KEY VALUE...`.
    ///
    /// Everything after the key, inner spaces included, is the value.
    pub fn parse_text(line: &str) -> StoreResult<Command> {
        let mut parts = line.splitn(3, ' ');
        let name = match parts.next() {
            Some(name) if !name.is_empty() => name,
            _ => return Err(StoreError::ParseError("empty command".to_string())),
        };

        Ok(Command {
            kind: CommandKind::get(name),
            name: name.to_string(),
            key: parts.next().map(str::to_string),
            value: parts.next().map(Value::from),
        })
    }

    /// The key argument, or an error naming what is missing.
    pub fn require_key(&self) -> StoreResult<&str> {
        self.key
            .as_deref()
            .ok_or_else(|| StoreError::InvalidCommand("missing key argument".to_string()))
    }

    /// The value argument, or an error naming what is missing.
    pub fn require_value(&self) -> StoreResult<Value> {
        self.value
            .clone()
            .ok_or_else(|| StoreError::InvalidCommand("missing value argument".to_string()))
    }
}
