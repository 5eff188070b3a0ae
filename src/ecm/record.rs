use crate::cd::ecc::EccTable;
use crate::cd::edc::{EdcTable, StreamEdc};
use crate::cd::msf::Msf;
use crate::cd::{
    ADDRESS_SIZE, HEADER_OFFSET, MODE_OFFSET, MODE1_BYTE, MODE1_DATA_OFFSET, MODE1_EDC_OFFSET,
    MODE2_BYTE, SECTOR_SIZE, SUBHEADER_OFFSET, SUBHEADER_SIZE, SectorType, eccedc_generate,
    write_sync,
};
use crate::ecm::error::{EcmError, EcmResult};
use std::ops::Range;

/// Offset of the subheader copy, where Mode 2 payloads start.
const MODE2_PAYLOAD_OFFSET: usize = SUBHEADER_OFFSET + SUBHEADER_SIZE;

/// Converts single sectors between their raw form and the reduced payload stored in a record.
#[derive(Debug, Clone, Copy)]
pub struct RecordCodec<'a> {
    edc: &'a EdcTable,
    ecc: &'a EccTable,
}

impl<'a> RecordCodec<'a> {
    pub fn new(edc: &'a EdcTable, ecc: &'a EccTable) -> Self {
        Self { edc, ecc }
    }

    /// Appends the reduced payload of `sector` to `out` and folds the sector into `stream_edc`.
    pub fn encode_sector(
        &self,
        sector: &[u8],
        sector_type: SectorType,
        stream_edc: &mut StreamEdc,
        out: &mut Vec<u8>,
    ) -> EcmResult<()> {
        if sector_type == SectorType::Literal {
            return Err(EcmError::LiteralIsNotASector);
        }
        if sector.len() != SECTOR_SIZE {
            return Err(EcmError::PayloadLength {
                sector_type,
                expected: SECTOR_SIZE,
                actual: sector.len(),
            });
        }

        stream_edc.update(self.edc, &sector[stream_edc_range(sector_type)]);

        match sector_type {
            SectorType::Mode1 => {
                out.extend_from_slice(&sector[HEADER_OFFSET..HEADER_OFFSET + ADDRESS_SIZE]);
                out.extend_from_slice(&sector[MODE1_DATA_OFFSET..MODE1_EDC_OFFSET]);
            }
            _ => out.extend_from_slice(&sector[mode2_payload_range(sector_type)]),
        }

        Ok(())
    }

    /// Literal bytes are stored unchanged.
    pub fn encode_literal(&self, bytes: &[u8], stream_edc: &mut StreamEdc, out: &mut Vec<u8>) {
        stream_edc.update(self.edc, bytes);
        out.extend_from_slice(bytes);
    }

    /// Rebuilds the full sector for `payload`.
    ///
    /// `sector_index` is the 0-based position of the sector in the output image and only
    /// feeds the address of Mode 2 sectors, whose records carry none.
    pub fn decode_sector(
        &self,
        payload: &[u8],
        sector_type: SectorType,
        sector_index: u32,
        stream_edc: &mut StreamEdc,
    ) -> EcmResult<[u8; SECTOR_SIZE]> {
        let expected = sector_type
            .payload_len()
            .ok_or(EcmError::LiteralIsNotASector)?;
        if payload.len() != expected {
            return Err(EcmError::PayloadLength {
                sector_type,
                expected,
                actual: payload.len(),
            });
        }

        let mut sector = [0u8; SECTOR_SIZE];
        write_sync(&mut sector);

        match sector_type {
            SectorType::Mode1 => {
                sector[MODE_OFFSET] = MODE1_BYTE;
                sector[HEADER_OFFSET..HEADER_OFFSET + ADDRESS_SIZE]
                    .copy_from_slice(&payload[..ADDRESS_SIZE]);
                sector[MODE1_DATA_OFFSET..MODE1_EDC_OFFSET]
                    .copy_from_slice(&payload[ADDRESS_SIZE..]);
            }
            _ => {
                sector[HEADER_OFFSET..HEADER_OFFSET + ADDRESS_SIZE]
                    .copy_from_slice(&Msf::from_sector_index(sector_index).to_bcd());
                sector[MODE_OFFSET] = MODE2_BYTE;
                sector[mode2_payload_range(sector_type)].copy_from_slice(payload);
                sector.copy_within(
                    MODE2_PAYLOAD_OFFSET..MODE2_PAYLOAD_OFFSET + SUBHEADER_SIZE,
                    SUBHEADER_OFFSET,
                );
            }
        }

        eccedc_generate(self.edc, self.ecc, &mut sector, sector_type);
        stream_edc.update(self.edc, &sector[stream_edc_range(sector_type)]);

        Ok(sector)
    }
}

impl Default for RecordCodec<'static> {
    fn default() -> Self {
        Self::new(EdcTable::global(), EccTable::global())
    }
}

/// Bytes of a sector that contribute to the container checksum.
fn stream_edc_range(sector_type: SectorType) -> Range<usize> {
    if sector_type.is_mode2() {
        SUBHEADER_OFFSET..SECTOR_SIZE
    } else {
        0..SECTOR_SIZE
    }
}

fn mode2_payload_range(sector_type: SectorType) -> Range<usize> {
    let len = sector_type.payload_len().unwrap_or(0);
    MODE2_PAYLOAD_OFFSET..MODE2_PAYLOAD_OFFSET + len
}
