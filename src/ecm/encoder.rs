use crate::cd::classify::SectorClassifier;
use crate::cd::edc::StreamEdc;
use crate::cd::msf::Msf;
use crate::cd::{ADDRESS_SIZE, HEADER_OFFSET, SECTOR_SIZE, SectorType};
use crate::ecm::error::EcmResult;
use crate::ecm::record::RecordCodec;
use crate::ecm::type_count::{MAX_RECORD_COUNT, TERMINAL_RECORD, encode_type_count};
use crate::ecm::{EcmHeader, EcmTrailer, SectorTally, write_model};
use indicatif::ProgressBar;
use log::{debug, trace, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};

/// Read-ahead used by the batch strategy.
pub const INPUT_QUEUE_SIZE: usize = 1024 * 1024;

/// A pending run is written out once its payload reaches this size.
pub const MAX_RUN_PAYLOAD: usize = 16 * 1024 * 1024;

const OUTPUT_BUFFER_SIZE: usize = 8 * 1024 * 1024; // 8 MB buffer

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodeStrategy {
    /// Coalesces consecutive windows of the same type into one record.
    #[default]
    Batch,
    /// One record per window, for pipes where latency matters more than size.
    Streaming,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeReport {
    pub tally: SectorTally,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub stream_edc: u32,
    /// Mode 2 sectors stored as literal because their header address did not match.
    pub misaddressed_sectors: u64,
}

struct InputQueue {
    buf: Vec<u8>,
    pos: usize,
    capacity: usize,
    eof: bool,
}

impl InputQueue {
    fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            pos: 0,
            capacity,
            eof: false,
        }
    }

    /// Tops the queue up until a full sector is available or the input is exhausted.
    async fn fill<R: AsyncRead + Unpin>(&mut self, reader: &mut R) -> EcmResult<()> {
        if self.available() >= SECTOR_SIZE || self.eof {
            return Ok(());
        }

        self.buf.drain(..self.pos);
        self.pos = 0;

        let target = self.capacity.max(SECTOR_SIZE);
        while self.buf.len() < target && !self.eof {
            let filled = self.buf.len();
            self.buf.resize(target, 0);
            let read = reader.read(&mut self.buf[filled..]).await?;
            self.buf.truncate(filled + read);
            self.eof = read == 0;
        }

        Ok(())
    }

    fn available(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn window(&self) -> &[u8] {
        let end = self.pos + self.available().min(SECTOR_SIZE);
        &self.buf[self.pos..end]
    }

    fn consume(&mut self, count: usize) {
        self.pos += count;
    }
}

struct PendingRun {
    sector_type: SectorType,
    count: u32,
    payload: Vec<u8>,
}

impl PendingRun {
    fn can_take(&self, sector_type: SectorType, added: u64) -> bool {
        self.sector_type == sector_type
            && self.payload.len() < MAX_RUN_PAYLOAD
            && self.count as u64 + added <= MAX_RECORD_COUNT as u64
    }
}

/// What a window adds to its record's count: bytes for literals, one for a sector.
fn window_count(window: &[u8], sector_type: SectorType) -> u64 {
    match sector_type {
        SectorType::Literal => window.len() as u64,
        _ => 1,
    }
}

struct RecordWriter<'a, W> {
    writer: BufWriter<W>,
    codec: RecordCodec<'a>,
    strategy: EncodeStrategy,
    pending: Option<PendingRun>,
    stream_edc: StreamEdc,
    report: EncodeReport,
}

impl<'a, W: AsyncWrite + Unpin> RecordWriter<'a, W> {
    async fn push(&mut self, window: &[u8], sector_type: SectorType) -> EcmResult<()> {
        let added = window_count(window, sector_type);
        let full = self
            .pending
            .as_ref()
            .is_some_and(|run| !run.can_take(sector_type, added));
        if full {
            self.flush_run().await?;
        }

        let run = self.pending.get_or_insert_with(|| PendingRun {
            sector_type,
            count: 0,
            payload: Vec::new(),
        });

        if sector_type == SectorType::Literal {
            self.codec
                .encode_literal(window, &mut self.stream_edc, &mut run.payload);
        } else {
            self.codec
                .encode_sector(window, sector_type, &mut self.stream_edc, &mut run.payload)?;
        }
        run.count += added as u32;
        self.report.tally.record(sector_type, added);

        if self.strategy == EncodeStrategy::Streaming {
            self.flush_run().await?;
        }
        Ok(())
    }

    async fn flush_run(&mut self) -> EcmResult<()> {
        let Some(run) = self.pending.take() else {
            return Ok(());
        };

        if self.strategy == EncodeStrategy::Batch {
            debug!(
                "Flushing batch: type={}, count={}, payload={} bytes",
                run.sector_type,
                run.count,
                run.payload.len()
            );
        }

        let header = encode_type_count(run.sector_type, run.count)?;
        self.writer.write_all(&header).await?;
        self.writer.write_all(&run.payload).await?;
        self.report.bytes_out += (header.len() + run.payload.len()) as u64;
        Ok(())
    }

    async fn finish(mut self) -> EcmResult<EncodeReport> {
        self.flush_run().await?;

        self.writer.write_all(&TERMINAL_RECORD).await?;
        let edc = self.stream_edc.value();
        let written = write_model(&mut self.writer, &EcmTrailer { edc }).await?;
        self.writer.flush().await?;

        self.report.bytes_out += (TERMINAL_RECORD.len() + written) as u64;
        self.report.stream_edc = edc;
        Ok(self.report)
    }
}

/// Mode 2 records carry no address, so a Mode 2 sector only survives the round trip when its
/// header matches the address the decoder derives from the output position.
fn address_matches_position(window: &[u8], offset: u64) -> bool {
    let index = (offset / SECTOR_SIZE as u64) as u32;
    window[HEADER_OFFSET..HEADER_OFFSET + ADDRESS_SIZE] == Msf::from_sector_index(index).to_bcd()
}

fn header_address(window: &[u8]) -> String {
    let mut bcd = [0u8; ADDRESS_SIZE];
    bcd.copy_from_slice(&window[HEADER_OFFSET..HEADER_OFFSET + ADDRESS_SIZE]);
    Msf::from_bcd(bcd).map_or_else(|| format!("{bcd:02X?}"), |msf| msf.to_string())
}

/// Encodes the raw image read from `reader` into an ECM container written to `writer`.
pub async fn encode_stream<R, W>(
    mut reader: R,
    writer: W,
    strategy: EncodeStrategy,
    progress: &ProgressBar,
) -> EcmResult<EncodeReport>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    debug!("Using {strategy:?} strategy");

    let classifier = SectorClassifier::default();
    let mut queue = InputQueue::new(match strategy {
        EncodeStrategy::Batch => INPUT_QUEUE_SIZE,
        EncodeStrategy::Streaming => SECTOR_SIZE,
    });
    let mut out = RecordWriter {
        writer: BufWriter::with_capacity(OUTPUT_BUFFER_SIZE, writer),
        codec: RecordCodec::default(),
        strategy,
        pending: None,
        stream_edc: StreamEdc::new(),
        report: EncodeReport::default(),
    };

    out.report.bytes_out += write_model(&mut out.writer, &EcmHeader::new()).await? as u64;

    let mut offset = 0u64;
    loop {
        queue.fill(&mut reader).await?;
        let window = queue.window();
        if window.is_empty() {
            break;
        }

        let mut sector_type = classifier.classify(window);
        if sector_type.is_mode2() && !address_matches_position(window, offset) {
            if out.report.misaddressed_sectors == 0 {
                warn!(
                    "Sector at offset {offset} is addressed as {}, storing it as literal",
                    header_address(window)
                );
            } else {
                debug!("Sector at offset {offset} is misaddressed, storing it as literal");
            }
            out.report.misaddressed_sectors += 1;
            sector_type = SectorType::Literal;
        }

        let step = window.len();
        if strategy == EncodeStrategy::Streaming {
            trace!(
                "Sector {}: type={}, size={}",
                offset / SECTOR_SIZE as u64,
                sector_type,
                step
            );
        }

        out.push(window, sector_type).await?;
        queue.consume(step);
        offset += step as u64;
        progress.inc(step as u64);
    }

    if out.report.misaddressed_sectors > 0 {
        warn!(
            "{} Mode 2 sectors did not match their position and were stored as literal",
            out.report.misaddressed_sectors
        );
    }

    out.report.bytes_in = offset;
    out.finish().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cd::fixtures::{build_sector, pattern_bytes};
    use crate::cd::edc::EdcTable;
    use crate::ecm::type_count::{RecordMarker, decode_type_count};

    async fn encode(data: &[u8], strategy: EncodeStrategy) -> (Vec<u8>, EncodeReport) {
        let mut out = Vec::new();
        let report = encode_stream(data, &mut out, strategy, &ProgressBar::hidden())
            .await
            .unwrap();
        (out, report)
    }

    /// Splits a container into its record markers, skipping payloads.
    fn markers(container: &[u8]) -> Vec<RecordMarker> {
        let mut pos = 4;
        let mut markers = Vec::new();
        loop {
            let (marker, used) = decode_type_count(&container[pos..]).unwrap();
            pos += used;
            markers.push(marker);
            match marker {
                RecordMarker::End => return markers,
                RecordMarker::Run { sector_type, count } => {
                    pos += match sector_type.payload_len() {
                        Some(len) => len * count as usize,
                        None => count as usize,
                    };
                }
            }
        }
    }

    fn image(types: &[SectorType]) -> Vec<u8> {
        types
            .iter()
            .enumerate()
            .flat_map(|(index, &sector_type)| build_sector(sector_type, index as u32, index as u32))
            .collect()
    }

    #[tokio::test]
    async fn empty_input_is_thirteen_bytes() {
        for strategy in [EncodeStrategy::Batch, EncodeStrategy::Streaming] {
            let (out, report) = encode(&[], strategy).await;
            assert_eq!(out, b"ECM\0\xFC\xFF\xFF\xFF\x7F\0\0\0\0");
            assert_eq!(report.bytes_out, 13);
            assert_eq!(report.bytes_in, 0);
        }
    }

    #[tokio::test]
    async fn single_literal_byte() {
        let (out, report) = encode(&[0x42], EncodeStrategy::Batch).await;
        assert_eq!(out, b"ECM\0\x00\x42\xFC\xFF\xFF\xFF\x7F\x00\x42\x20\x25");
        assert_eq!(report.stream_edc, EdcTable::global().compute(&[0x42]));
        assert_eq!(report.tally.literal_bytes, 1);
    }

    #[tokio::test]
    async fn batch_coalesces_runs_of_the_same_type() {
        use SectorType::*;
        let data = image(&[Mode1, Mode1, Mode1, Mode2Form1, Mode2Form1, Mode2Form2]);
        let (out, report) = encode(&data, EncodeStrategy::Batch).await;

        assert_eq!(
            markers(&out),
            vec![
                RecordMarker::Run { sector_type: Mode1, count: 3 },
                RecordMarker::Run { sector_type: Mode2Form1, count: 2 },
                RecordMarker::Run { sector_type: Mode2Form2, count: 1 },
                RecordMarker::End,
            ]
        );
        assert_eq!(report.tally.mode1_sectors, 3);
        assert_eq!(report.tally.mode2_form1_sectors, 2);
        assert_eq!(report.tally.mode2_form2_sectors, 1);
        assert_eq!(report.bytes_in, data.len() as u64);
        assert_eq!(report.bytes_out, out.len() as u64);
    }

    #[tokio::test]
    async fn streaming_emits_one_record_per_window() {
        use SectorType::*;
        let mut data = image(&[Mode1, Mode1]);
        data.extend_from_slice(&[1, 2, 3]);
        let (out, _) = encode(&data, EncodeStrategy::Streaming).await;

        assert_eq!(
            markers(&out),
            vec![
                RecordMarker::Run { sector_type: Mode1, count: 1 },
                RecordMarker::Run { sector_type: Mode1, count: 1 },
                RecordMarker::Run { sector_type: Literal, count: 3 },
                RecordMarker::End,
            ]
        );
    }

    #[tokio::test]
    async fn both_strategies_agree_on_the_stream_edc() {
        use SectorType::*;
        let mut data = image(&[Literal, Mode1, Mode2Form2, Mode2Form1, Literal]);
        data.extend_from_slice(&pattern_bytes(3, 1000));

        let (_, batch) = encode(&data, EncodeStrategy::Batch).await;
        let (_, streaming) = encode(&data, EncodeStrategy::Streaming).await;
        assert_eq!(batch.stream_edc, streaming.stream_edc);
        assert_eq!(batch.tally, streaming.tally);
        assert_eq!(batch.tally.literal_bytes, 2 * SECTOR_SIZE as u64 + 1000);
    }

    #[tokio::test]
    async fn literal_windows_advance_one_sector_at_a_time() {
        let data = pattern_bytes(9, SECTOR_SIZE * 3 + 10);
        let (out, _) = encode(&data, EncodeStrategy::Batch).await;
        assert_eq!(
            markers(&out),
            vec![
                RecordMarker::Run { sector_type: SectorType::Literal, count: data.len() as u32 },
                RecordMarker::End,
            ]
        );
    }

    #[tokio::test]
    async fn misplaced_mode2_sector_is_stored_as_literal() {
        // A Form 1 sector addressed for position 40, placed at position 0.
        let data = build_sector(SectorType::Mode2Form1, 40, 1);
        let (out, report) = encode(&data, EncodeStrategy::Batch).await;
        assert_eq!(report.tally.literal_bytes, SECTOR_SIZE as u64);
        assert_eq!(report.tally.mode2_form1_sectors, 0);
        assert_eq!(
            markers(&out)[0],
            RecordMarker::Run { sector_type: SectorType::Literal, count: SECTOR_SIZE as u32 }
        );
    }

    #[test]
    fn run_limit_counts_sectors_not_bytes() {
        let window = [0u8; SECTOR_SIZE];
        assert_eq!(window_count(&window, SectorType::Mode1), 1);
        assert_eq!(window_count(&window[..10], SectorType::Literal), 10);

        let run = PendingRun {
            sector_type: SectorType::Mode2Form1,
            count: MAX_RECORD_COUNT - 1,
            payload: Vec::new(),
        };
        assert!(run.can_take(SectorType::Mode2Form1, 1));
        assert!(!run.can_take(SectorType::Mode2Form1, 2));
        assert!(!run.can_take(SectorType::Mode2Form2, 1));

        let run = PendingRun {
            sector_type: SectorType::Literal,
            count: MAX_RECORD_COUNT - 100,
            payload: Vec::new(),
        };
        assert!(!run.can_take(SectorType::Literal, SECTOR_SIZE as u64));
    }

    #[tokio::test]
    async fn misaddressed_sectors_are_counted() {
        // A track cut from later on a disc: every Mode 2 sector is off by 1000.
        let data: Vec<u8> = (0..5u32)
            .flat_map(|index| build_sector(SectorType::Mode2Form2, index + 1000, index))
            .collect();
        let (_, report) = encode(&data, EncodeStrategy::Batch).await;
        assert_eq!(report.misaddressed_sectors, 5);
        assert_eq!(report.tally.literal_bytes, data.len() as u64);

        let (_, report) = encode(&image(&[SectorType::Mode2Form1]), EncodeStrategy::Batch).await;
        assert_eq!(report.misaddressed_sectors, 0);
    }

    #[test]
    fn header_address_renders_msf_or_raw_bytes() {
        let sector = build_sector(SectorType::Mode2Form1, 14, 1);
        assert_eq!(header_address(&sector), "00:02:14");
        let mut sector = sector;
        sector[HEADER_OFFSET] = 0xAB;
        assert_eq!(header_address(&sector), "[AB, 02, 14]");
    }

    #[tokio::test]
    async fn misplaced_mode1_sector_keeps_its_type() {
        let data = build_sector(SectorType::Mode1, 40, 1);
        let (_, report) = encode(&data, EncodeStrategy::Batch).await;
        assert_eq!(report.tally.mode1_sectors, 1);
    }

    #[tokio::test]
    async fn unaligned_sector_is_not_found() {
        let mut data = vec![0xEE];
        data.extend_from_slice(&build_sector(SectorType::Mode1, 0, 1));
        let (_, report) = encode(&data, EncodeStrategy::Batch).await;
        assert_eq!(report.tally.mode1_sectors, 0);
        assert_eq!(report.tally.literal_bytes, data.len() as u64);
    }
}
