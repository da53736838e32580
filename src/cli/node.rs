use clap::Subcommand;

#[derive(Subcommand)]
pub enum NodeCommands {
    Start {
        #[arg(long, default_value = "statusd.toml")]
        config: String,
        #[arg(long)]
        rpc_port: Option<u16>,
    },
}
