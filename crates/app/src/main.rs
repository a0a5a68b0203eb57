mod config;
mod init;
mod server;

use clap::Parser;
use config::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Commands::Start(config) => {
            server::init_tracing(config.debug);
            server::start_daemon(&config).await
        }
        Commands::Version => {
            println!("Homeroom v{}", env!("CARGO_PKG_VERSION"));
            println!("Classroom economy simulation backend");
            Ok(())
        }
    }
}
