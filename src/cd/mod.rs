// src/cd/mod.rs
use crate::cd::ecc::EccTable;
use crate::cd::edc::{EdcTable, write_edc};
use std::fmt::{Display, Formatter};

pub mod classify;
pub mod ecc;
pub mod edc;
pub mod msf;

#[cfg(test)]
pub(crate) mod fixtures;

pub const SECTOR_SIZE: usize = 2352;
pub const MODE2_SECTOR_SIZE: usize = 2336;
pub const USER_DATA_SIZE: usize = 2048;
pub const FORM2_USER_DATA_SIZE: usize = 2324;

pub const SYNC_SIZE: usize = 12;
pub const SYNC_PATTERN: [u8; SYNC_SIZE] = [
    0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00,
];

pub const HEADER_OFFSET: usize = 0x00C;
pub const ADDRESS_SIZE: usize = 3;
pub const MODE_OFFSET: usize = 0x00F;

pub const MODE1_DATA_OFFSET: usize = 0x010;
pub const MODE1_EDC_OFFSET: usize = 0x810;
pub const MODE1_RESERVED_OFFSET: usize = 0x814;
pub const RESERVED_SIZE: usize = 8;

pub const ECC_P_OFFSET: usize = 0x81C;
pub const ECC_Q_OFFSET: usize = 0x8C8;
pub const ECC_P_SIZE: usize = 172;
pub const ECC_Q_SIZE: usize = 104;
pub const EDC_SIZE: usize = 4;

pub const SUBHEADER_OFFSET: usize = 0x010;
pub const SUBHEADER_SIZE: usize = 4;
/// Subheader plus Form 1 user data, the range covered by the Form 1 EDC.
pub const FORM1_EDC_SPAN: usize = 0x808;
/// Subheader plus Form 2 user data, the range covered by the Form 2 EDC.
pub const FORM2_EDC_SPAN: usize = 0x91C;
pub const MODE2_FORM1_EDC_OFFSET: usize = SUBHEADER_OFFSET + FORM1_EDC_SPAN;
pub const MODE2_FORM2_EDC_OFFSET: usize = SUBHEADER_OFFSET + FORM2_EDC_SPAN;

pub const MODE1_BYTE: u8 = 0x01;
pub const MODE2_BYTE: u8 = 0x02;

/// Structural kind of a 2352-byte window, as detected by the classifier.
///
/// The discriminants are the 2-bit type codes stored in ECM record headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SectorType {
    Literal = 0,
    Mode1 = 1,
    Mode2Form1 = 2,
    Mode2Form2 = 3,
}

impl SectorType {
    pub const ALL: [SectorType; 4] = [
        SectorType::Literal,
        SectorType::Mode1,
        SectorType::Mode2Form1,
        SectorType::Mode2Form2,
    ];

    /// Size of the reduced payload stored per sector, `None` for literal bytes.
    pub fn payload_len(self) -> Option<usize> {
        match self {
            SectorType::Literal => None,
            SectorType::Mode1 => Some(ADDRESS_SIZE + USER_DATA_SIZE),
            SectorType::Mode2Form1 => Some(SUBHEADER_SIZE + USER_DATA_SIZE),
            SectorType::Mode2Form2 => Some(SUBHEADER_SIZE + FORM2_USER_DATA_SIZE),
        }
    }

    pub fn is_mode2(self) -> bool {
        matches!(self, SectorType::Mode2Form1 | SectorType::Mode2Form2)
    }
}

impl TryFrom<u8> for SectorType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SectorType::Literal),
            1 => Ok(SectorType::Mode1),
            2 => Ok(SectorType::Mode2Form1),
            3 => Ok(SectorType::Mode2Form2),
            other => Err(other),
        }
    }
}

impl Display for SectorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SectorType::Literal => "literal",
            SectorType::Mode1 => "mode1",
            SectorType::Mode2Form1 => "mode2f1",
            SectorType::Mode2Form2 => "mode2f2",
        };
        f.write_str(name)
    }
}

pub fn has_sync(sector: &[u8]) -> bool {
    sector.len() >= SYNC_SIZE && sector[..SYNC_SIZE] == SYNC_PATTERN
}

pub fn write_sync(sector: &mut [u8; SECTOR_SIZE]) {
    sector[..SYNC_SIZE].copy_from_slice(&SYNC_PATTERN);
}

/// Rebuilds every redundant field of `sector` for the given type: EDC, reserved bytes and
/// ECC P/Q. Sync, header and subheaders must already be in place.
pub fn eccedc_generate(
    edc: &EdcTable,
    ecc: &EccTable,
    sector: &mut [u8; SECTOR_SIZE],
    sector_type: SectorType,
) {
    match sector_type {
        SectorType::Mode1 => {
            let checksum = edc.compute(&sector[..MODE1_EDC_OFFSET]);
            write_edc(checksum, &mut sector[MODE1_EDC_OFFSET..MODE1_EDC_OFFSET + EDC_SIZE]);
            sector[MODE1_RESERVED_OFFSET..MODE1_RESERVED_OFFSET + RESERVED_SIZE].fill(0);
            ecc.generate(sector, false);
        }
        SectorType::Mode2Form1 => {
            let checksum = edc.compute(&sector[SUBHEADER_OFFSET..MODE2_FORM1_EDC_OFFSET]);
            write_edc(
                checksum,
                &mut sector[MODE2_FORM1_EDC_OFFSET..MODE2_FORM1_EDC_OFFSET + EDC_SIZE],
            );
            ecc.generate(sector, true);
        }
        SectorType::Mode2Form2 => {
            let checksum = edc.compute(&sector[SUBHEADER_OFFSET..MODE2_FORM2_EDC_OFFSET]);
            write_edc(
                checksum,
                &mut sector[MODE2_FORM2_EDC_OFFSET..MODE2_FORM2_EDC_OFFSET + EDC_SIZE],
            );
        }
        SectorType::Literal => {}
    }
}
