//! Line relay client: prints every server line and forwards stdin lines.
//!
//! Answers the server's greeting with the given name automatically.

use std::process::ExitCode;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[derive(Parser, Debug)]
#[command(author, version, about = "Connect to a wordduel server", long_about = None)]
struct Args {
    /// Server host name or address
    host: String,
    /// Server port
    port: u16,
    /// Display name sent in the NAME handshake
    name: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let stream = match TcpStream::connect((args.host.as_str(), args.port)).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!("Failed to connect to {}:{}: {}", args.host, args.port, e);
            return ExitCode::FAILURE;
        }
    };

    let (read, mut write) = stream.into_split();
    let mut server_lines = BufReader::new(read).lines();
    let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = server_lines.next_line() => match line {
                Ok(Some(line)) => {
                    let line = line.trim_end_matches('\r');
                    println!("{}", line);
                    if line.starts_with("WELCOME") {
                        let reply = format!("NAME {}\n", args.name);
                        if let Err(e) = write.write_all(reply.as_bytes()).await {
                            tracing::error!("Failed to send name: {}", e);
                            break;
                        }
                    }
                }
                Ok(None) => {
                    tracing::info!("Server closed the connection");
                    break;
                }
                Err(e) => {
                    tracing::error!("Read from server failed: {}", e);
                    break;
                }
            },
            input = stdin_lines.next_line() => match input {
                Ok(Some(input)) => {
                    let line = format!("{}\n", input.trim_end());
                    if let Err(e) = write.write_all(line.as_bytes()).await {
                        tracing::error!("Send to server failed: {}", e);
                        break;
                    }
                }
                _ => break,
            },
        }
    }

    ExitCode::SUCCESS
}
