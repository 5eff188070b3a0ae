use crate::cue::models::TrackType;
use crate::cue::write_cue_file;
use crate::ecm::decoder::{DecodeReport, decode_stream};
use crate::ecm::encoder::{EncodeReport, EncodeStrategy, encode_stream};
use crate::error::{ConvertError, ConvertResult};
use indicatif::ProgressBar;
use log::{debug, error, info};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncWrite};

/// Path that stands for stdin or stdout.
pub const STDIO_PATH: &str = "-";

const ECM_EXTENSION: &str = "ecm";

type DynReader = Box<dyn AsyncRead + Unpin + Send>;
type DynWriter = Box<dyn AsyncWrite + Unpin + Send>;

#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeOptions {
    /// `None` picks batch for files and streaming for stdin.
    pub strategy: Option<EncodeStrategy>,
    pub force: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    pub write_cue: bool,
    pub force: bool,
}

pub fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == STDIO_PATH
}

/// `image.bin` becomes `image.bin.ecm`.
pub fn default_encode_output(input: &Path) -> PathBuf {
    if is_stdio(input) {
        return input.to_path_buf();
    }
    let mut path = input.as_os_str().to_owned();
    path.push(".");
    path.push(ECM_EXTENSION);
    PathBuf::from(path)
}

/// Checks that `input` names an ECM file and returns it with the extension stripped.
pub fn default_decode_output(input: &Path) -> ConvertResult<PathBuf> {
    if is_stdio(input) {
        return Ok(input.to_path_buf());
    }
    let has_ecm_extension = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ECM_EXTENSION));
    if !has_ecm_extension {
        return Err(ConvertError::InvalidEcmFileName(input.to_path_buf()));
    }
    Ok(input.with_extension(""))
}

async fn same_file(input: &Path, output: &Path) -> bool {
    if is_stdio(input) || is_stdio(output) {
        return false;
    }
    match (fs::canonicalize(input).await, fs::canonicalize(output).await) {
        (Ok(input), Ok(output)) => input == output,
        _ => false,
    }
}

async fn ensure_writable(input: &Path, output: &Path, force: bool) -> ConvertResult<()> {
    if is_stdio(output) {
        return Ok(());
    }
    if same_file(input, output).await {
        return Err(ConvertError::OutputIsInput(output.to_path_buf()));
    }
    if fs::metadata(output).await.is_ok() && !force {
        return Err(ConvertError::OutputAlreadyExists(output.to_path_buf()));
    }
    Ok(())
}

async fn open_input(input: &Path, progress: &ProgressBar) -> ConvertResult<DynReader> {
    if is_stdio(input) {
        return Ok(Box::new(tokio::io::stdin()));
    }
    let file = File::open(input).await?;
    progress.set_length(file.metadata().await?.len());
    Ok(Box::new(file))
}

async fn create_output(output: &Path) -> ConvertResult<DynWriter> {
    if is_stdio(output) {
        return Ok(Box::new(tokio::io::stdout()));
    }
    Ok(Box::new(File::create(output).await?))
}

async fn remove_partial_output(output: &Path) {
    if is_stdio(output) {
        return;
    }
    error!("Removing incomplete output file: {:?}", output);
    if let Err(err) = fs::remove_file(output).await {
        debug!("Could not remove {:?}: {}", output, err);
    }
}

/// Encodes the raw image at `input` into an ECM file. `-` reads stdin or writes stdout.
pub async fn encode_file(
    input: &Path,
    output: Option<&Path>,
    options: EncodeOptions,
    progress: &ProgressBar,
) -> ConvertResult<EncodeReport> {
    let output = output.map_or_else(|| default_encode_output(input), Path::to_path_buf);
    ensure_writable(input, &output, options.force).await?;

    let strategy = if is_stdio(input) {
        EncodeStrategy::Streaming
    } else {
        options.strategy.unwrap_or_default()
    };

    info!("Encoding {:?} to {:?}", input, output);
    let reader = open_input(input, progress).await?;
    let writer = create_output(&output).await?;

    match encode_stream(reader, writer, strategy, progress).await {
        Ok(report) => Ok(report),
        Err(err) => {
            remove_partial_output(&output).await;
            Err(err.into())
        }
    }
}

/// Restores the raw image from the ECM file at `input`, optionally writing a CUE sheet for it.
pub async fn decode_file(
    input: &Path,
    output: Option<&Path>,
    options: DecodeOptions,
    progress: &ProgressBar,
) -> ConvertResult<DecodeReport> {
    let default_output = default_decode_output(input)?;
    let output = output.map_or(default_output, Path::to_path_buf);
    ensure_writable(input, &output, options.force).await?;

    info!("Decoding {:?} to {:?}", input, output);
    let reader = open_input(input, progress).await?;
    let writer = create_output(&output).await?;

    let report = match decode_stream(reader, writer, progress).await {
        Ok(report) => report,
        Err(err) => {
            remove_partial_output(&output).await;
            return Err(err.into());
        }
    };

    if options.write_cue && !is_stdio(&output) {
        let track_type = if report.has_mode2() {
            TrackType::Mode2_2352
        } else {
            TrackType::Mode1_2352
        };
        let cue_path = write_cue_file(&output, track_type).await?;
        info!("Created CUE file: {:?}", cue_path);
    }

    Ok(report)
}

/// Decodes `input` without keeping the output, checking every record and the stream EDC.
pub async fn verify_file(input: &Path, progress: &ProgressBar) -> ConvertResult<DecodeReport> {
    info!("Verifying {:?}", input);
    let reader = open_input(input, progress).await?;
    Ok(decode_stream(reader, tokio::io::sink(), progress).await?)
}
