use thiserror::Error;

#[derive(Debug, Error)]
pub enum CueError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Image file name is not valid UTF-8: {0}")]
    InvalidFileName(std::path::PathBuf),

    #[error("Image file name contains a double quote: {0}")]
    QuoteInFileName(String),
}

pub type CueResult<T> = Result<T, CueError>;
