use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use statusd::cli::{self, Cli, Commands};
use statusd::client::RpcClient;
use statusd::config::StatusConfig;
use statusd::node::StatusNode;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Node { cmd } => match cmd {
            cli::node::NodeCommands::Start { config, rpc_port } => {
                run_node_mode(&config, rpc_port).await;
            }
        },
        command => {
            init_tracing("warn");
            run_client_command(RpcClient::new(cli.rpc_url), command).await;
        }
    }
}

/// RUST_LOG wins over the configured level
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run_node_mode(config_path: &str, rpc_port: Option<u16>) {
    // Config messages are printed before the configured level is known
    let config = tracing::subscriber::with_default(tracing_subscriber::fmt().finish(), || {
        StatusConfig::load_or_default(config_path)
    });
    init_tracing(&config.node.log_level);

    let rpc_port = rpc_port.unwrap_or(config.node.rpc_port);
    let node = match StatusNode::new(config) {
        Ok(node) => node,
        Err(e) => {
            error!("Failed to start node: {}", e);
            std::process::exit(1);
        }
    };

    tokio::select! {
        res = node.start(rpc_port) => {
            if let Err(e) = res {
                error!("Node stopped: {}", e);
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }
}

async fn run_client_command(client: RpcClient, command: Commands) {
    let password = |flag: Option<String>| match cli::read_password(flag) {
        Ok(password) => Some(password),
        Err(e) => {
            println!("Could not read password: {}", e);
            None
        }
    };

    match command {
        Commands::Node { .. } => {}
        Commands::Signup { password: flag } => {
            if let Some(password) = password(flag) {
                cli::account::handle_signup_command(&client, password).await;
            }
        }
        Commands::Login { address, password: flag } => {
            if let Some(password) = password(flag) {
                cli::account::handle_login_command(&client, address, password).await;
            }
        }
        Commands::Logout => cli::account::handle_logout_command(&client).await,
        Commands::Sign { data, account } => {
            cli::sign::handle_sign_command(&client, data, account).await;
        }
        Commands::Pending => cli::sign::handle_pending_command(&client).await,
        Commands::Approve { id, password: flag } => {
            if let Some(password) = password(flag) {
                cli::sign::handle_approve_command(&client, id, password).await;
            }
        }
        Commands::Discard { id } => cli::sign::handle_discard_command(&client, id).await,
    }
}
