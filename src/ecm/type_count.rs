//! Variable-length record header: a 2-bit sector type plus a biased run length.
//!
//! The first byte holds `continuation | count_low5 << 2 | type`, every further byte holds
//! `continuation | next 7 bits`. The stored value is `count - 1`.

use crate::cd::SectorType;
use crate::ecm::error::{Corruption, EcmError, EcmResult};

/// Largest run length a record may carry.
pub const MAX_RECORD_COUNT: u32 = 0x7FFF_FFFF;

/// Record that ends the record sequence: literal type with all count bits set.
pub const TERMINAL_RECORD: [u8; 5] = [0xFC, 0xFF, 0xFF, 0xFF, 0x7F];

const CONTINUATION: u8 = 0x80;
const MAX_CONTINUATIONS: u8 = 4;
const SENTINEL: u64 = 0xFFFF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordMarker {
    Run { sector_type: SectorType, count: u32 },
    End,
}

pub fn encode_type_count(sector_type: SectorType, count: u32) -> EcmResult<Vec<u8>> {
    if count == 0 || count > MAX_RECORD_COUNT {
        return Err(EcmError::RecordCountOutOfRange(count as u64));
    }

    let mut value = count - 1;
    let mut bytes = Vec::with_capacity(5);
    bytes.push(((value & 0x1F) as u8) << 2 | sector_type as u8);
    value >>= 5;

    while value != 0 {
        if let Some(last) = bytes.last_mut() {
            *last |= CONTINUATION;
        }
        bytes.push((value & 0x7F) as u8);
        value >>= 7;
    }

    Ok(bytes)
}

#[derive(Debug, Clone, Copy)]
struct PartialHeader {
    sector_type: SectorType,
    value: u64,
    shift: u32,
    continuations: u8,
}

/// Byte-fed header decoder, so callers can pull one byte at a time from any reader.
#[derive(Debug, Default)]
pub struct TypeCountDecoder {
    partial: Option<PartialHeader>,
}

impl TypeCountDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one byte. Returns the marker once the last byte of a header has been seen.
    pub fn feed(&mut self, byte: u8) -> EcmResult<Option<RecordMarker>> {
        let mut partial = match self.partial.take() {
            None => PartialHeader {
                sector_type: type_bits(byte),
                value: ((byte >> 2) & 0x1F) as u64,
                shift: 5,
                continuations: 0,
            },
            Some(mut partial) => {
                partial.continuations += 1;
                if partial.continuations > MAX_CONTINUATIONS {
                    return Err(Corruption::CountOverflow.into());
                }
                partial.value |= ((byte & 0x7F) as u64) << partial.shift;
                partial.shift += 7;
                partial
            }
        };

        if byte & CONTINUATION != 0 {
            self.partial = Some(partial);
            return Ok(None);
        }

        partial.value = finish(partial.value)?;
        Ok(Some(match partial.value {
            SENTINEL => RecordMarker::End,
            value => RecordMarker::Run {
                sector_type: partial.sector_type,
                count: (value + 1) as u32,
            },
        }))
    }
}

// Normalises the chain value, mapping both terminal spellings to the sentinel.
fn finish(value: u64) -> EcmResult<u64> {
    if value & SENTINEL == SENTINEL {
        return Ok(SENTINEL);
    }
    if value > SENTINEL {
        return Err(Corruption::CountOverflow.into());
    }
    let count = value + 1;
    if count > MAX_RECORD_COUNT as u64 {
        return Err(Corruption::CountTooLarge(count).into());
    }
    Ok(value)
}

fn type_bits(byte: u8) -> SectorType {
    match byte & 0x03 {
        0 => SectorType::Literal,
        1 => SectorType::Mode1,
        2 => SectorType::Mode2Form1,
        _ => SectorType::Mode2Form2,
    }
}

/// Decodes one header from the start of `bytes`, returning the marker and the bytes consumed.
pub fn decode_type_count(bytes: &[u8]) -> EcmResult<(RecordMarker, usize)> {
    let mut decoder = TypeCountDecoder::new();
    for (index, &byte) in bytes.iter().enumerate() {
        if let Some(marker) = decoder.feed(byte)? {
            return Ok((marker, index + 1));
        }
    }
    Err(EcmError::UnexpectedEof("record header"))
}
