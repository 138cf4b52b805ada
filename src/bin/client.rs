//! TTL store client.
//!
//! Sends one command to a running server and prints the reply.

use clap::Parser;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
};

use ttl_store::cli::{Cli, ClientCommand};

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let stream = match TcpStream::connect(&args.addr).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to connect to server at {}: {}", args.addr, e);
            eprintln!("Make sure the server is running with: cargo run --bin server");
            std::process::exit(1);
        }
    };
    let (reader, mut writer) = stream.into_split();

    let line = args.command.to_wire().to_line()?;
    writer.write_all(line.as_bytes()).await?;

    let mut reply = String::new();
    BufReader::new(reader).read_line(&mut reply).await?;
    let reply = reply.trim_end();

    if let Some(message) = reply.strip_prefix("ERR ") {
        eprintln!("Error: {}", message);
        std::process::exit(1);
    }

    match args.command {
        ClientCommand::List => {
            let keys: Vec<String> = serde_json::from_str(reply)?;
            if keys.is_empty() {
                println!("(no keys)");
            }
            for key in keys {
                println!("{}", key);
            }
        }
        ClientCommand::Stats => {
            println!("Store Statistics:");
            for part in reply.split_whitespace() {
                if let Some((key, value)) = part.split_once(':') {
                    println!("  {}: {}", key, value);
                }
            }
        }
        _ => println!("{}", reply),
    }

    Ok(())
}
