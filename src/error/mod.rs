use crate::cue::error::CueError;
use crate::ecm::error::EcmError;
use std::path::PathBuf;
use std::result;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    EcmError(#[from] EcmError),

    #[error(transparent)]
    CueError(#[from] CueError),

    #[error("Output file already exists, use --force to overwrite: {0}")]
    OutputAlreadyExists(PathBuf),

    #[error("Output file is the input file: {0}")]
    OutputIsInput(PathBuf),

    #[error("Input file name must end in .ecm: {0}")]
    InvalidEcmFileName(PathBuf),
}

pub type ConvertResult<T> = result::Result<T, ConvertError>;
