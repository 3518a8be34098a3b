use anyhow::Result;
use clap::{Parser, Subcommand};
use ember::commands::{dev, serve};
use ember::DEFAULT_PORT;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ember")]
#[command(about = "Local development harness with hot reload and process supervision", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve a directory with hot reload and browser log capture
    Serve {
        /// TCP port to bind on loopback
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Directory to serve (defaults to the current directory)
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },

    /// Supervise a serve process, restarting it on source changes or crashes
    Dev {
        /// TCP port the supervised server binds
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Directory the supervised server serves
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Extra file to watch for restarts (repeatable)
        #[arg(short, long)]
        watch: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, root } => serve::execute(port, root),
        Commands::Dev { port, root, watch } => dev::execute(port, root, watch),
    }
}
