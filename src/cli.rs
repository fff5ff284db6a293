use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bankagg", about = "Open-banking account aggregation service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service (default).
    Serve {
        /// Override the configured listen port.
        #[arg(long, env = "BANKAGG_PORT")]
        port: Option<u16>,
    },
    /// Load and validate the provider registry, then exit.
    CheckConfig,
}
