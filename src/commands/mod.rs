use crate::commands::ecm::{DecodeCommand, EncodeCommand, VerifyCommand};
use clap::{Parser, Subcommand};

pub mod ecm;

/// CLI for shrinking raw CD images into ECM files and restoring them.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Encode(EncodeCommand),
    Decode(DecodeCommand),
    Verify(VerifyCommand),
}
