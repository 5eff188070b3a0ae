use crate::cd::{ECC_P_OFFSET, ECC_P_SIZE, ECC_Q_OFFSET, ECC_Q_SIZE, HEADER_OFFSET, SECTOR_SIZE};
use lazy_static::lazy_static;

/// Generator polynomial of GF(2^8) used by the P/Q codes.
const GF8_POLYNOMIAL: u32 = 0x11D;

/// Header bytes (address and mode) hidden from the ECC when a Mode 2 sector is processed.
const ADDRESS_FIELD_SIZE: usize = 4;

lazy_static! {
    static ref ECC_TABLE: EccTable = EccTable::new();
}

/// Interleave layout of one parity layer over the window starting at the sector header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EccGeometry {
    pub major_count: usize,
    pub minor_count: usize,
    pub major_mult: usize,
    pub minor_inc: usize,
}

impl EccGeometry {
    pub const fn output_len(&self) -> usize {
        self.major_count * 2
    }

    const fn window_len(&self) -> usize {
        self.major_count * self.minor_count
    }
}

pub const P_CODE: EccGeometry = EccGeometry {
    major_count: 86,
    minor_count: 24,
    major_mult: 2,
    minor_inc: 86,
};

pub const Q_CODE: EccGeometry = EccGeometry {
    major_count: 52,
    minor_count: 43,
    major_mult: 86,
    minor_inc: 88,
};

/// Read-only view of the ECC window. With `zero_address` set the header bytes read as zero,
/// so the caller's sector is never modified.
struct EccWindow<'a> {
    bytes: &'a [u8],
    zero_address: bool,
}

impl<'a> EccWindow<'a> {
    fn new(sector: &'a [u8], zero_address: bool) -> Self {
        Self {
            bytes: &sector[HEADER_OFFSET..],
            zero_address,
        }
    }

    #[inline]
    fn at(&self, index: usize) -> u8 {
        if self.zero_address && index < ADDRESS_FIELD_SIZE {
            0
        } else {
            self.bytes[index]
        }
    }
}

/// Reed-Solomon style P/Q parity generator for CD-ROM sectors.
#[derive(Debug, Clone)]
pub struct EccTable {
    f_lut: [u8; 256],
    b_lut: [u8; 256],
}

impl EccTable {
    pub fn new() -> Self {
        let mut f_lut = [0u8; 256];
        let mut b_lut = [0u8; 256];
        for i in 0..256u32 {
            let j = (i << 1) ^ if i & 0x80 != 0 { GF8_POLYNOMIAL } else { 0 };
            f_lut[i as usize] = j as u8;
            b_lut[(i ^ j) as usize & 0xFF] = i as u8;
        }
        Self { f_lut, b_lut }
    }

    /// Process-wide table, built on first use.
    pub fn global() -> &'static EccTable {
        &ECC_TABLE
    }

    fn parity(&self, window: &EccWindow, geometry: &EccGeometry, major: usize) -> (u8, u8) {
        let size = geometry.window_len();
        let mut index = (major >> 1) * geometry.major_mult + (major & 1);
        let mut ecc_a = 0u8;
        let mut ecc_b = 0u8;

        for _ in 0..geometry.minor_count {
            let byte = window.at(index);
            index += geometry.minor_inc;
            if index >= size {
                index -= size;
            }
            ecc_a ^= byte;
            ecc_b ^= byte;
            ecc_a = self.f_lut[ecc_a as usize];
        }

        let ecc_a = self.b_lut[(self.f_lut[ecc_a as usize] ^ ecc_b) as usize];
        (ecc_a, ecc_a ^ ecc_b)
    }

    fn compute_block(&self, window: &EccWindow, geometry: &EccGeometry, dest: &mut [u8]) {
        for major in 0..geometry.major_count {
            let (low, high) = self.parity(window, geometry, major);
            dest[major] = low;
            dest[major + geometry.major_count] = high;
        }
    }

    fn verify_block(&self, window: &EccWindow, geometry: &EccGeometry, expected: &[u8]) -> bool {
        (0..geometry.major_count).all(|major| {
            let (low, high) = self.parity(window, geometry, major);
            expected[major] == low && expected[major + geometry.major_count] == high
        })
    }

    /// Computes one parity layer over `sector` and returns it.
    pub fn compute(&self, sector: &[u8], geometry: &EccGeometry, zero_address: bool) -> Vec<u8> {
        let mut dest = vec![0u8; geometry.output_len()];
        self.compute_block(&EccWindow::new(sector, zero_address), geometry, &mut dest);
        dest
    }

    /// Writes P then Q into the sector. Q covers the freshly written P bytes.
    pub fn generate(&self, sector: &mut [u8; SECTOR_SIZE], zero_address: bool) {
        let mut p = [0u8; ECC_P_SIZE];
        self.compute_block(&EccWindow::new(sector, zero_address), &P_CODE, &mut p);
        sector[ECC_P_OFFSET..ECC_Q_OFFSET].copy_from_slice(&p);

        let mut q = [0u8; ECC_Q_SIZE];
        self.compute_block(&EccWindow::new(sector, zero_address), &Q_CODE, &mut q);
        sector[ECC_Q_OFFSET..ECC_Q_OFFSET + ECC_Q_SIZE].copy_from_slice(&q);
    }

    /// Checks `expected` (P followed by Q) against the parity of `sector`.
    pub fn verify(&self, sector: &[u8], zero_address: bool, expected: &[u8]) -> bool {
        if sector.len() < SECTOR_SIZE || expected.len() < ECC_P_SIZE + ECC_Q_SIZE {
            return false;
        }

        let window = EccWindow::new(sector, zero_address);
        self.verify_block(&window, &P_CODE, &expected[..ECC_P_SIZE])
            && self.verify_block(&window, &Q_CODE, &expected[ECC_P_SIZE..])
    }
}

impl Default for EccTable {
    fn default() -> Self {
        Self::new()
    }
}
