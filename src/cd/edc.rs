use byteorder::{ByteOrder, LittleEndian};
use lazy_static::lazy_static;

/// Reflected form of the CD-ROM EDC polynomial (x^32 + x^31 + x^16 + x^15 + x^4 + x^3 + x + 1).
pub const EDC_POLYNOMIAL: u32 = 0xD801_8001;

lazy_static! {
    static ref EDC_TABLE: EdcTable = EdcTable::new();
}

/// Table-driven CRC-32 variant used by CD-ROM sectors for error detection.
#[derive(Debug, Clone)]
pub struct EdcTable {
    lut: [u32; 256],
}

impl EdcTable {
    pub fn new() -> Self {
        let mut lut = [0u32; 256];
        for (i, entry) in lut.iter_mut().enumerate() {
            let mut edc = i as u32;
            for _ in 0..8 {
                edc = (edc >> 1) ^ if edc & 1 != 0 { EDC_POLYNOMIAL } else { 0 };
            }
            *entry = edc;
        }
        Self { lut }
    }

    /// Process-wide table, built on first use.
    pub fn global() -> &'static EdcTable {
        &EDC_TABLE
    }

    /// Folds `data` into `acc`. Chaining holds: `update(update(0, a), b) == update(0, a ++ b)`.
    pub fn update(&self, acc: u32, data: &[u8]) -> u32 {
        data.iter().fold(acc, |edc, &byte| {
            (edc >> 8) ^ self.lut[((edc ^ byte as u32) & 0xFF) as usize]
        })
    }

    pub fn compute(&self, data: &[u8]) -> u32 {
        self.update(0, data)
    }
}

impl Default for EdcTable {
    fn default() -> Self {
        Self::new()
    }
}

pub fn write_edc(edc: u32, dest: &mut [u8]) {
    LittleEndian::write_u32(&mut dest[..4], edc);
}

pub fn edc_matches(edc: u32, src: &[u8]) -> bool {
    src.len() >= 4 && LittleEndian::read_u32(&src[..4]) == edc
}

/// Running EDC over every byte of an image, in image order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamEdc(u32);

impl StreamEdc {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn update(&mut self, table: &EdcTable, data: &[u8]) {
        self.0 = table.update(self.0, data);
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}
