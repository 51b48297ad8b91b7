use camconsole_core::{decode_log_frame, BcryptSalt, Credentials, JOIN_FRAME};
use clap::{Parser, Subcommand};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use url::Url;

#[derive(Parser)]
#[command(name = "camconsole-cli", version, about = "Operator tools for the camera console")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the server log stream.
    Logs {
        #[arg(long, env = "CAMCONSOLE_LOG_WS", default_value = "ws://127.0.0.1:5000/logs")]
        url: String,
        /// Stop after this many records.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Compute the password hash the login page would send.
    Hash {
        #[arg(long)]
        salt: String,
        #[arg(long, env = "CAMCONSOLE_PASSWORD")]
        password: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long, default_value = "")]
        next: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Logs { url, limit } => {
            let url = log_stream_url(&url)?;
            let (ws, _response) = tokio_tungstenite::connect_async(url.as_str()).await?;
            eprintln!("connected to {url}");
            let (mut write, mut read) = ws.split();
            write.send(Message::text(JOIN_FRAME)).await?;

            let mut printed = 0usize;
            while let Some(message) = read.next().await {
                match message? {
                    Message::Text(text) => {
                        println!("{}", decode_log_frame(text.as_str()));
                        printed += 1;
                    }
                    Message::Close(frame) => {
                        eprintln!("server closed: {frame:?}");
                        break;
                    }
                    _ => {}
                }
                if limit.is_some_and(|limit| printed >= limit) {
                    break;
                }
            }
        }
        Commands::Hash {
            salt,
            password,
            username,
            next,
        } => {
            let salt = BcryptSalt::parse(&salt)?;
            let credentials = Credentials::new(username.as_deref().unwrap_or(""), &password, &next);
            let hash = credentials.hash_with(&salt)?;
            println!("hash: {hash}");
            if username.is_some() {
                println!("login_url: {}", credentials.login_url(&hash));
            }
        }
    }

    Ok(())
}

fn log_stream_url(raw: &str) -> Result<Url, url::ParseError> {
    let trimmed = raw.trim();
    let rewritten = if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{rest}")
    } else {
        trimmed.to_string()
    };
    Url::parse(&rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_urls_are_rewritten_to_websocket() {
        let url = log_stream_url("http://127.0.0.1:5000/logs").expect("url");
        assert_eq!(url.as_str(), "ws://127.0.0.1:5000/logs");
        let url = log_stream_url(" https://console.example/logs ").expect("url");
        assert_eq!(url.scheme(), "wss");
    }

    #[test]
    fn garbage_url_is_rejected() {
        assert!(log_stream_url("not a url").is_err());
    }

    #[test]
    fn hash_command_parses() {
        let cli = Cli::try_parse_from([
            "camconsole-cli",
            "hash",
            "--salt",
            "$2b$04$R9h/cIPz0gi.URNNX3kh2O",
            "--password",
            "pw",
            "--username",
            "u",
        ])
        .expect("parse");
        let Commands::Hash { username, next, .. } = cli.command else {
            panic!("expected hash command");
        };
        assert_eq!(username.as_deref(), Some("u"));
        assert_eq!(next, "");
    }

    #[test]
    fn logs_command_takes_limit() {
        let cli = Cli::try_parse_from([
            "camconsole-cli",
            "logs",
            "--url",
            "ws://host/logs",
            "--limit",
            "3",
        ])
        .expect("parse");
        let Commands::Logs { url, limit } = cli.command else {
            panic!("expected logs command");
        };
        assert_eq!(url, "ws://host/logs");
        assert_eq!(limit, Some(3));
    }
}
