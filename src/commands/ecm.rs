use clap::Parser;
use std::path::PathBuf;

/// Encodes a raw CD image (.bin/.img/.iso) into an ECM file.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct EncodeCommand {
    /// Raw image to encode, `-` reads stdin
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output ECM file, defaults to the input path with .ecm appended, `-` writes stdout
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Emit one record per sector instead of coalescing runs (always used for stdin)
    #[arg(long, short = 's', default_value_t = false)]
    pub streaming: bool,

    /// Force overwrite of the output file if it already exists
    #[arg(long, short = 'f', value_name = "FORCE", default_value_t = false)]
    pub force: bool,
}

/// Decodes an ECM file back into the original raw CD image.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct DecodeCommand {
    /// ECM file to decode, must end in .ecm, `-` reads stdin
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output image, defaults to the input path without .ecm, `-` writes stdout
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Write a single-track CUE sheet next to the decoded image
    #[arg(long, default_value_t = false)]
    pub cue: bool,

    /// Force overwrite of the output file if it already exists
    #[arg(long, short = 'f', value_name = "FORCE", default_value_t = false)]
    pub force: bool,
}

/// Verifies the integrity of an ECM file without writing the decoded image.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct VerifyCommand {
    /// ECM file to verify, `-` reads stdin
    pub input: PathBuf,
}
