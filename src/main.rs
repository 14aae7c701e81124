use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use rust_tcp_chat::config;
use rust_tcp_chat::{ChatError, ChatManager, ChatServer};
use tokio::signal;

#[derive(Parser)]
#[command(
    name = "rust_tcp_chat",
    version,
    about = "Multi-client TCP chat server"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Override the listen address from the config file
    #[arg(long, value_name = "ADDR")]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), ChatError> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = config::load_config(&cli.config);
    if let Some(listen) = cli.listen {
        app_config.listen_addr = listen;
    }

    let manager = Arc::new(ChatManager::new());
    let server = ChatServer::bind(&app_config.listen_addr, manager)
        .await?
        .with_stats_interval(app_config.stats_interval_secs);

    server
        .run_until(async {
            if let Err(err) = signal::ctrl_c().await {
                log::error!("Unable to listen for shutdown signal: {err}");
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}
