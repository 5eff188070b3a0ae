use crate::cd::SECTOR_SIZE;
use crate::cd::edc::{EdcTable, StreamEdc};
use crate::ecm::error::{Corruption, EcmError, EcmResult};
use crate::ecm::record::RecordCodec;
use crate::ecm::type_count::{RecordMarker, TypeCountDecoder};
use crate::ecm::{EcmHeader, EcmTrailer, SectorTally, read_exact_or_eof, read_model};
use indicatif::ProgressBar;
use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

const BUFFER_SIZE: usize = 8 * 1024 * 1024; // 8 MB buffer

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeReport {
    pub tally: SectorTally,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub stream_edc: u32,
}

impl DecodeReport {
    pub fn has_mode2(&self) -> bool {
        self.tally.has_mode2()
    }
}

async fn read_marker<R: AsyncRead + Unpin>(reader: &mut R) -> EcmResult<(RecordMarker, u64)> {
    let mut decoder = TypeCountDecoder::new();
    let mut used = 0u64;
    loop {
        let byte = match reader.read_u8().await {
            Ok(byte) => byte,
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(EcmError::UnexpectedEof("record header"));
            }
            Err(err) => return Err(err.into()),
        };
        used += 1;
        if let Some(marker) = decoder.feed(byte)? {
            return Ok((marker, used));
        }
    }
}

/// Decodes the ECM container read from `reader`, writing the original image to `writer`.
///
/// Output is written as records are decoded, so on error the writer may hold a partial image.
pub async fn decode_stream<R, W>(
    reader: R,
    writer: W,
    progress: &ProgressBar,
) -> EcmResult<DecodeReport>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, reader);
    let mut writer = BufWriter::with_capacity(BUFFER_SIZE, writer);
    let edc_table = EdcTable::global();
    let codec = RecordCodec::default();
    let mut stream_edc = StreamEdc::new();
    let mut report = DecodeReport::default();

    let header: EcmHeader = read_model(&mut reader, "magic").await?;
    header.validate()?;
    report.bytes_in += 4;

    let mut buf = vec![0u8; SECTOR_SIZE];
    loop {
        let (marker, used) = read_marker(&mut reader).await?;
        report.bytes_in += used;

        let (sector_type, count) = match marker {
            RecordMarker::End => break,
            RecordMarker::Run { sector_type, count } => (sector_type, count),
        };
        debug!("Record: type={sector_type}, count={count}");

        match sector_type.payload_len() {
            None => {
                let mut remaining = count as usize;
                while remaining > 0 {
                    let chunk = &mut buf[..remaining.min(SECTOR_SIZE)];
                    read_exact_or_eof(&mut reader, chunk, "literal bytes").await?;
                    stream_edc.update(edc_table, chunk);
                    writer.write_all(chunk).await?;

                    remaining -= chunk.len();
                    report.bytes_in += chunk.len() as u64;
                    report.bytes_out += chunk.len() as u64;
                }
            }
            Some(len) => {
                for _ in 0..count {
                    let payload = &mut buf[..len];
                    read_exact_or_eof(&mut reader, payload, "sector payload").await?;
                    let index = (report.bytes_out / SECTOR_SIZE as u64) as u32;
                    let sector = codec.decode_sector(payload, sector_type, index, &mut stream_edc)?;
                    writer.write_all(&sector).await?;

                    report.bytes_in += len as u64;
                    report.bytes_out += SECTOR_SIZE as u64;
                }
            }
        }

        report.tally.record(sector_type, count as u64);
        progress.set_position(report.bytes_in);
    }

    let trailer: EcmTrailer = read_model(&mut reader, "stream EDC").await?;
    report.bytes_in += 4;
    report.stream_edc = stream_edc.value();
    if trailer.edc != report.stream_edc {
        return Err(Corruption::EdcMismatch {
            stored: trailer.edc,
            computed: report.stream_edc,
        }
        .into());
    }

    writer.flush().await?;
    progress.set_position(report.bytes_in);
    Ok(report)
}
