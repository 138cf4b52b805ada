//! TCP line-protocol server.
//!
//! One task per connection. Each newline-terminated command is decoded,
//! applied to the store on tokio's blocking pool, and answered with one
//! newline-terminated reply.

use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::command::{Command, CommandKind};
use crate::error::{StoreError, StoreResult};
use crate::store::Store;

/// What to send back for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A reply line, without its newline.
    Line(String),
    /// End the session without replying.
    Close,
}

impl Reply {
    fn ok() -> Self {
        Reply::Line("OK".to_string())
    }

    fn error(err: &StoreError) -> Self {
        Reply::Line(format!("ERR {}", err))
    }
}

/// Apply one command to the store and render the reply.
///
/// This blocks until the store answers.
pub fn execute(store: &Store, command: &Command) -> Reply {
    match run(store, command) {
        Ok(reply) => reply,
        Err(err) => Reply::error(&err),
    }
}

fn run(store: &Store, command: &Command) -> StoreResult<Reply> {
    let kind = command.kind;
    let key = if kind.takes_key() {
        command.require_key()?
    } else {
        ""
    };

    let reply = match kind {
        CommandKind::Create => {
            store.create(key, command.require_value()?)?;
            Reply::ok()
        }
        CommandKind::Update => {
            store.update(key, command.require_value()?)?;
            Reply::ok()
        }
        CommandKind::Ttl => {
            store.set_ttl(key, command.require_value()?)?;
            Reply::ok()
        }
        CommandKind::Remove => {
            store.remove(key)?;
            Reply::ok()
        }
        CommandKind::Get => Reply::Line(store.get(key)?.to_string()),
        CommandKind::List => {
            let keys = store.list()?;
            let rendered =
                serde_json::to_string(&keys).map_err(|e| StoreError::ParseError(e.to_string()))?;
            Reply::Line(rendered)
        }
        CommandKind::Stats => Reply::Line(store.stats().to_string()),
        CommandKind::Close => Reply::Close,
        CommandKind::Invalid => {
            return Err(StoreError::InvalidCommand(format!(
                "unknown command '{}'",
                command.name
            )))
        }
    };
    Ok(reply)
}

/// Accept connections forever, one task per connection.
pub async fn serve(listener: TcpListener, store: Store) {
    loop {
        let (socket, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "failed to accept connection");
                continue;
            }
        };
        info!(%addr, "accepted connection");

        let store = store.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, addr, store).await {
                warn!(%addr, error = %e, "connection error");
            }
        });
    }
}

/// Handle a single client connection.
async fn handle_connection(socket: TcpStream, addr: SocketAddr, store: Store) -> StoreResult<()> {
    let (reader, mut writer) = socket.into_split();
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let decoded = std::str::from_utf8(&buf)
            .map_err(|e| StoreError::ParseError(e.to_string()))
            .and_then(Command::parse);
        let command = match decoded {
            Ok(command) => command,
            Err(err) => {
                // Undecodable input ends the session.
                writer.write_all(format!("ERR {}\n", err).as_bytes()).await?;
                break;
            }
        };
        debug!(%addr, command = %command.kind, key = ?command.key, "processing command");

        let store = store.clone();
        let reply = tokio::task::spawn_blocking(move || execute(&store, &command))
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))?;

        match reply {
            Reply::Line(mut line) => {
                line.push('\n');
                writer.write_all(line.as_bytes()).await?;
            }
            Reply::Close => break,
        }
    }

    writer.shutdown().await?;
    info!(%addr, "connection closed");
    Ok(())
}
