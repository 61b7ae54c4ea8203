use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "objreg",
    about = "Inspect, load and re-save objreg stream files",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Workspace configuration (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load a stream into a fresh workspace and show the result
    Load(LoadArgs),
    /// List the (type, name) pairs in a stream
    List(ListArgs),
    /// Load a stream, then save it again in dependency order
    Resave(ResaveArgs),
}

#[derive(Args)]
pub struct LoadArgs {
    /// JSON-lines stream file
    pub file: PathBuf,
    /// Load only these names
    #[arg(long = "name", conflicts_with = "types")]
    pub names: Vec<String>,
    /// Load only objects of these type names
    #[arg(long = "type")]
    pub types: Vec<String>,
}

#[derive(Args)]
pub struct ListArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ResaveArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Save only these names (and what they depend on)
    #[arg(long = "name")]
    pub names: Vec<String>,
}
