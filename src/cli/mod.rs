pub mod account;
pub mod node;
pub mod sign;

use clap::{Parser, Subcommand};
use std::io::{self, Write};

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9000";

#[derive(Parser)]
#[command(name = "statusd")]
#[command(about = "Account session and sign request daemon", long_about = None)]
pub struct Cli {
    /// JSON-RPC endpoint used by the client commands
    #[arg(long, global = true, default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Node operations
    Node {
        #[command(subcommand)]
        cmd: node::NodeCommands,
    },
    /// Create a new account
    Signup {
        #[arg(long)]
        password: Option<String>,
    },
    /// Unlock an account and make it the active selection
    Login {
        #[arg(long)]
        address: String,
        #[arg(long)]
        password: Option<String>,
    },
    Logout,
    /// Submit a personal_sign request and wait for its outcome
    Sign {
        #[arg(long)]
        data: String,
        #[arg(long)]
        account: Option<String>,
    },
    /// List waiting sign requests
    Pending,
    /// Approve a waiting sign request
    Approve {
        id: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Discard a waiting sign request
    Discard { id: String },
}

/// Use the flag value if given, otherwise prompt on stdin
pub fn read_password(flag: Option<String>) -> io::Result<String> {
    if let Some(password) = flag {
        return Ok(password);
    }
    print!("Password: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}
