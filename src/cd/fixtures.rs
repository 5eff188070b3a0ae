//! Real sectors dumped from retail discs, stored sparsely (offset, byte) after the header.

use crate::cd::ecc::EccTable;
use crate::cd::edc::EdcTable;
use crate::cd::msf::Msf;
use crate::cd::{
    FORM2_USER_DATA_SIZE, HEADER_OFFSET, MODE_OFFSET, MODE1_BYTE, MODE1_DATA_OFFSET, MODE2_BYTE,
    SECTOR_SIZE, SUBHEADER_OFFSET, SUBHEADER_SIZE, SYNC_PATTERN, SYNC_SIZE, SectorType,
    USER_DATA_SIZE, eccedc_generate,
};

/// Mode 1 sector at 00:02:14 with empty user data.
const MODE1_AT_00_02_14: &[(usize, u8)] = &[
    (0x810, 0x9E), (0x811, 0xDC), (0x812, 0x20), (0x813, 0x94), (0x81D, 0xF7), (0x81E, 0x18),
    (0x81F, 0xF5), (0x866, 0xBF), (0x867, 0x79), (0x868, 0x60), (0x869, 0xA1), (0x873, 0xF5),
    (0x874, 0x0C), (0x875, 0xF4), (0x8BC, 0x21), (0x8BD, 0xA5), (0x8BE, 0x40), (0x8BF, 0x35),
    (0x8C9, 0x41), (0x8DE, 0xB3), (0x8DF, 0xDD), (0x8E0, 0xDA), (0x8E1, 0x20), (0x8E2, 0x4D),
    (0x8E3, 0x49), (0x8E4, 0x24), (0x8E5, 0xB4), (0x8F6, 0x97), (0x8F7, 0x65), (0x8F8, 0xC5),
    (0x8F9, 0xC2), (0x8FA, 0x52), (0x8FB, 0xE6), (0x8FD, 0x43), (0x912, 0x93), (0x913, 0x49),
    (0x914, 0x24), (0x915, 0x5D), (0x916, 0xB2), (0x917, 0x05), (0x918, 0x05), (0x919, 0x11),
    (0x92A, 0x8F), (0x92B, 0x90), (0x92C, 0xC9), (0x92D, 0xC1), (0x92E, 0x46), (0x92F, 0x12),
];

/// Mode 2 Form 1 sector at 00:02:03 with empty user data and submode 0x08.
const MODE2_FORM1_AT_00_02_03: &[(usize, u8)] = &[
    (0x012, 0x08), (0x016, 0x08), (0x818, 0x0B), (0x819, 0x88), (0x81A, 0x81), (0x81B, 0x94),
    (0x822, 0xFB), (0x826, 0xFB), (0x86E, 0x1D), (0x86F, 0x85), (0x870, 0x9E), (0x871, 0xA1),
    (0x878, 0xF3), (0x87C, 0xF3), (0x8C4, 0x16), (0x8C5, 0x0D), (0x8C6, 0x1F), (0x8C7, 0x35),
    (0x8D6, 0x9E), (0x8D7, 0xA1), (0x8D8, 0x8E), (0x8D9, 0x61), (0x8DA, 0x72), (0x8DB, 0xE3),
    (0x8DC, 0x62), (0x8DD, 0x23), (0x8EE, 0xB9), (0x8F0, 0xD2), (0x8F2, 0xA5), (0x8F4, 0x67),
    (0x8F6, 0xA9), (0x90A, 0x1F), (0x90B, 0x35), (0x90C, 0x1B), (0x90D, 0x48), (0x90E, 0x70),
    (0x90F, 0x53), (0x910, 0x74), (0x911, 0x2E), (0x922, 0x42), (0x924, 0x21), (0x926, 0x56),
    (0x928, 0x94), (0x92A, 0xA1),
];

fn expand(header: [u8; 4], body: &[(usize, u8)]) -> [u8; SECTOR_SIZE] {
    let mut sector = [0u8; SECTOR_SIZE];
    sector[..SYNC_SIZE].copy_from_slice(&SYNC_PATTERN);
    sector[HEADER_OFFSET..HEADER_OFFSET + 4].copy_from_slice(&header);
    for &(offset, byte) in body {
        sector[offset] = byte;
    }
    sector
}

pub fn empty_mode1_sector() -> [u8; SECTOR_SIZE] {
    expand([0x00, 0x02, 0x14, 0x01], MODE1_AT_00_02_14)
}

pub fn empty_mode2_form1_sector() -> [u8; SECTOR_SIZE] {
    expand([0x00, 0x02, 0x03, 0x02], MODE2_FORM1_AT_00_02_03)
}

/// Deterministic filler so every synthetic sector carries distinct user data.
pub fn pattern_bytes(seed: u32, len: usize) -> Vec<u8> {
    let mut state = seed.wrapping_mul(0x9E37_79B9).wrapping_add(1);
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 16) as u8
        })
        .collect()
}

/// Builds a well-formed sector of `sector_type` located at `sector_index` (0-based, without
/// the pregap) with user data derived from `seed`.
pub fn build_sector(sector_type: SectorType, sector_index: u32, seed: u32) -> [u8; SECTOR_SIZE] {
    let mut sector = [0u8; SECTOR_SIZE];
    sector[..SYNC_SIZE].copy_from_slice(&SYNC_PATTERN);
    sector[HEADER_OFFSET..HEADER_OFFSET + 3]
        .copy_from_slice(&Msf::from_sector_index(sector_index).to_bcd());

    match sector_type {
        SectorType::Mode1 => {
            sector[MODE_OFFSET] = MODE1_BYTE;
            sector[MODE1_DATA_OFFSET..MODE1_DATA_OFFSET + USER_DATA_SIZE]
                .copy_from_slice(&pattern_bytes(seed, USER_DATA_SIZE));
        }
        SectorType::Mode2Form1 | SectorType::Mode2Form2 => {
            sector[MODE_OFFSET] = MODE2_BYTE;
            let (submode, data_len) = if sector_type == SectorType::Mode2Form1 {
                (0x08, USER_DATA_SIZE)
            } else {
                (0x20, FORM2_USER_DATA_SIZE)
            };
            let subheader = [0x01, 0x00, submode, 0x00];
            sector[SUBHEADER_OFFSET..SUBHEADER_OFFSET + SUBHEADER_SIZE].copy_from_slice(&subheader);
            sector[SUBHEADER_OFFSET + SUBHEADER_SIZE..SUBHEADER_OFFSET + 2 * SUBHEADER_SIZE]
                .copy_from_slice(&subheader);
            let data_offset = SUBHEADER_OFFSET + 2 * SUBHEADER_SIZE;
            sector[data_offset..data_offset + data_len]
                .copy_from_slice(&pattern_bytes(seed, data_len));
        }
        SectorType::Literal => {
            return pattern_bytes(seed, SECTOR_SIZE)
                .try_into()
                .expect("pattern has sector length");
        }
    }

    eccedc_generate(EdcTable::global(), EccTable::global(), &mut sector, sector_type);
    sector
}
