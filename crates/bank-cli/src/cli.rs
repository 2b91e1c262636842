use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "bank",
    about = "Banking core: accounts, deposits, withdrawals and transfers",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Execute a script of banking commands against an in-memory bank
    Run(RunArgs),
    /// Check a value against one input rule
    Check(CheckArgs),
    /// Print the effective configuration
    Config,
}

#[derive(Args)]
pub struct RunArgs {
    /// Script file, one command per line
    pub script: PathBuf,
    /// Continue after a failing command instead of stopping
    #[arg(long)]
    pub keep_going: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Rule name: tax_id, phone, name or credential
    pub rule: String,
    pub value: String,
}
