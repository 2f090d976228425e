use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "nitro-ctl")]
#[command(about = "Run and supervise the local nitro inference server")]
#[command(version)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub(crate) pretty: bool,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Launch the server with a model and wait until it is ready
    Init {
        /// Model file name, relative to the user data directory
        model: String,

        /// Keep the server running until Ctrl-C
        #[arg(long)]
        hold: bool,
    },

    /// Free the server port by killing whatever listens on it
    Kill,

    /// Report whether the server port accepts connections
    Status,

    /// Show the detected platform and the server binary it maps to
    Platform,

    /// Show the effective supervisor settings
    Config,
}
