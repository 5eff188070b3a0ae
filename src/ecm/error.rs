use thiserror::Error;

/// Structural damage found while reading a container.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Corruption {
    #[error("Bad magic {0:02X?}, expected \"ECM\\0\"")]
    BadMagic([u8; 4]),

    #[error("Record header continuation chain exceeds 32 bits")]
    CountOverflow,

    #[error("Record count {0} exceeds the supported maximum")]
    CountTooLarge(u64),

    #[error("Stream EDC mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    EdcMismatch { stored: u32, computed: u32 },
}

#[derive(Debug, Error)]
pub enum EcmError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    #[error("Corrupt ECM container: {0}")]
    CorruptContainer(#[from] Corruption),

    #[error("Unexpected end of input while reading {0}")]
    UnexpectedEof(&'static str),

    #[error("Literal records carry raw bytes, not sectors")]
    LiteralIsNotASector,

    #[error("Buffer of {actual} bytes does not fit a {sector_type} record ({expected} bytes)")]
    PayloadLength {
        sector_type: crate::cd::SectorType,
        expected: usize,
        actual: usize,
    },

    #[error("Record count {0} is out of range")]
    RecordCountOutOfRange(u64),
}

impl EcmError {
    /// The container is structurally wrong (bad magic, broken header, checksum mismatch).
    pub fn is_corrupt(&self) -> bool {
        matches!(self, EcmError::CorruptContainer(_))
    }

    /// The container ended early, either in a header, a payload or the trailer.
    pub fn is_truncated(&self) -> bool {
        match self {
            EcmError::UnexpectedEof(_) => true,
            EcmError::IoError(err) => err.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

pub type EcmResult<T> = Result<T, EcmError>;
