use crate::cd::SectorType;
use crate::ecm::error::{Corruption, EcmError, EcmResult};
use binrw::{BinRead, BinWrite};
use std::fmt::{Display, Formatter};
use std::io::{Cursor, ErrorKind};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod record;
pub mod type_count;

pub const ECM_MAGIC: [u8; 4] = *b"ECM\0";

/// Leading four bytes of every container.
#[derive(BinRead, BinWrite, Debug, Clone, Copy, PartialEq, Eq)]
#[brw(little)]
pub struct EcmHeader {
    pub magic: [u8; 4],
}

impl EcmHeader {
    pub fn new() -> Self {
        Self { magic: ECM_MAGIC }
    }

    pub fn validate(&self) -> EcmResult<()> {
        if self.magic != ECM_MAGIC {
            return Err(Corruption::BadMagic(self.magic).into());
        }
        Ok(())
    }
}

impl Default for EcmHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Checksum over the original image, stored after the terminal record.
#[derive(BinRead, BinWrite, Debug, Clone, Copy, PartialEq, Eq)]
#[brw(little)]
pub struct EcmTrailer {
    pub edc: u32,
}

pub(crate) async fn write_model<W, T>(writer: &mut W, model: &T) -> EcmResult<usize>
where
    W: AsyncWrite + Unpin,
    T: for<'a> BinWrite<Args<'a> = ()>,
{
    let mut data = Cursor::new(Vec::new());
    model.write_le(&mut data)?;
    let data = data.into_inner();
    writer.write_all(&data).await?;
    Ok(data.len())
}

// Both container models are four bytes wide.
pub(crate) async fn read_model<R, T>(reader: &mut R, what: &'static str) -> EcmResult<T>
where
    R: AsyncRead + Unpin,
    T: for<'a> BinRead<Args<'a> = ()>,
{
    let mut data = [0u8; 4];
    read_exact_or_eof(reader, &mut data, what).await?;
    Ok(T::read_le(&mut Cursor::new(data))?)
}

pub(crate) async fn read_exact_or_eof<R: AsyncRead + Unpin>(
    reader: &mut R,
    buf: &mut [u8],
    what: &'static str,
) -> EcmResult<()> {
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == ErrorKind::UnexpectedEof => Err(EcmError::UnexpectedEof(what)),
        Err(err) => Err(err.into()),
    }
}

/// Per-type counts: literal bytes and sectors of each structural type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectorTally {
    pub literal_bytes: u64,
    pub mode1_sectors: u64,
    pub mode2_form1_sectors: u64,
    pub mode2_form2_sectors: u64,
}

impl SectorTally {
    /// Adds `count` units of `sector_type`, bytes for literals and sectors otherwise.
    pub fn record(&mut self, sector_type: SectorType, count: u64) {
        match sector_type {
            SectorType::Literal => self.literal_bytes += count,
            SectorType::Mode1 => self.mode1_sectors += count,
            SectorType::Mode2Form1 => self.mode2_form1_sectors += count,
            SectorType::Mode2Form2 => self.mode2_form2_sectors += count,
        }
    }

    pub fn has_mode2(&self) -> bool {
        self.mode2_form1_sectors + self.mode2_form2_sectors > 0
    }
}

impl Display for SectorTally {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Literal bytes........... {:>10}", self.literal_bytes)?;
        writeln!(f, "Mode 1 sectors.......... {:>10}", self.mode1_sectors)?;
        writeln!(f, "Mode 2 form 1 sectors... {:>10}", self.mode2_form1_sectors)?;
        write!(f, "Mode 2 form 2 sectors... {:>10}", self.mode2_form2_sectors)
    }
}
