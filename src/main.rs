mod admin;
mod config;
mod feed;
mod server;
mod translate;
mod weather;

pub const USER_AGENT: &str = concat!("dearkochi/", env!("CARGO_PKG_VERSION"));

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tracing::info;

use config::Config;

#[derive(Parser)]
#[command(version, about = "Dear Kochi API gateway")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Listen address, overrides DEARKOCHI_BIND
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Print an Argon2 hash for ADMIN_PASSWORD_HASH
    HashPassword {
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dearkochi=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::HashPassword { password } => {
            println!("{}", admin::hash_password(&password)?);
        }
        Command::Serve { bind } => {
            let mut config = Config::from_env()
                .inspect_err(|e| tracing::error!("invalid configuration: {e}"))?;
            if let Some(bind) = bind {
                config.bind = bind;
            }

            info!("starting dearkochi server");
            server::serve(config).await?;
        }
    }

    Ok(())
}
