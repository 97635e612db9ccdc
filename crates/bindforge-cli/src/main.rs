//! bindforge CLI - toolchain bootstrap and binding generation.

mod docker;
mod generate;
mod install;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bindforge")]
#[command(about = "Bootstrap the binder toolchain and generate extension modules")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Bootstrap the toolchain and write the environment descriptor
    Install(install::InstallArgs),

    /// Generate bindings, compile them and verify the module loads
    Generate(generate::GenerateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Install(args) => install::run(args),
        Commands::Generate(args) => generate::run(args),
    }
}
