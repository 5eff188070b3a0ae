use crate::commands::{Cli, Commands};
use anyhow::Result;
use clap::Parser;
use ecm_converto::convert::{DecodeOptions, EncodeOptions, decode_file, encode_file, verify_file};
use ecm_converto::ecm::SectorTally;
use ecm_converto::ecm::encoder::EncodeStrategy;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use log::info;

mod commands;

pub mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

fn progress_bar(pb: &MultiProgress, message: &'static str) -> Result<ProgressBar> {
    let bar = pb.add(ProgressBar::new(0));
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bytes}/{total_bytes} ({eta}) {msg}\n[{bar:40}]")?
            .progress_chars("#>-"),
    );
    bar.set_message(message);
    Ok(bar)
}

fn log_tally(tally: &SectorTally) {
    for line in tally.to_string().lines() {
        info!("{line}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let logger = env_logger::builder()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .build();

    let level = logger.filter();
    let pb = MultiProgress::new();

    LogWrapper::new(pb.clone(), logger).try_init()?;
    log::set_max_level(level);

    info!("{} v{}", built_info::PKG_NAME, built_info::PKG_VERSION);

    match cli.command {
        Commands::Encode(cmd) => {
            let bar = progress_bar(&pb, "Encoding")?;
            let options = EncodeOptions {
                strategy: cmd.streaming.then_some(EncodeStrategy::Streaming),
                force: cmd.force,
            };
            let report = encode_file(&cmd.input, cmd.output.as_deref(), options, &bar).await?;
            bar.finish_and_clear();

            log_tally(&report.tally);
            info!("Encoded {} bytes -> {} bytes", report.bytes_in, report.bytes_out);
        }
        Commands::Decode(cmd) => {
            let bar = progress_bar(&pb, "Decoding")?;
            let options = DecodeOptions {
                write_cue: cmd.cue,
                force: cmd.force,
            };
            let report = decode_file(&cmd.input, cmd.output.as_deref(), options, &bar).await?;
            bar.finish_and_clear();

            log_tally(&report.tally);
            info!("Decoded {} bytes -> {} bytes", report.bytes_in, report.bytes_out);
        }
        Commands::Verify(cmd) => {
            let bar = progress_bar(&pb, "Verifying")?;
            let report = verify_file(&cmd.input, &bar).await?;
            bar.finish_and_clear();

            log_tally(&report.tally);
            info!(
                "{:?} is intact: {} bytes decode to {} bytes, stream EDC {:#010x}",
                cmd.input, report.bytes_in, report.bytes_out, report.stream_edc
            );
        }
    }

    Ok(())
}
