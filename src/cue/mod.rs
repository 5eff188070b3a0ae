use crate::cd::msf::Msf;
use crate::cue::error::{CueError, CueResult};
use crate::cue::models::{CueFile, CueSheet, FileType, Index, Track, TrackType};
use log::debug;
use std::path::{Path, PathBuf};

pub mod error;
pub mod models;

impl CueSheet {
    /// Single data track spanning the whole image, as produced for a decoded ECM file.
    pub fn single_track(filename: impl Into<String>, track_type: TrackType) -> CueResult<Self> {
        let filename = filename.into();
        if filename.contains('"') {
            return Err(CueError::QuoteInFileName(filename));
        }

        Ok(Self {
            files: vec![CueFile {
                filename,
                file_type: FileType::Binary,
                tracks: vec![Track {
                    number: 1,
                    track_type,
                    indices: vec![Index {
                        number: 1,
                        position: Msf::ZERO,
                    }],
                }],
            }],
        })
    }
}

/// `image.bin` becomes `image.bin.cue`.
pub fn cue_path_for(image_path: &Path) -> PathBuf {
    let mut path = image_path.as_os_str().to_owned();
    path.push(".cue");
    PathBuf::from(path)
}

/// Writes a one-track sheet next to `image_path` and returns the sheet's path.
pub async fn write_cue_file(image_path: &Path, track_type: TrackType) -> CueResult<PathBuf> {
    let filename = image_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| CueError::InvalidFileName(image_path.to_path_buf()))?;

    let sheet = CueSheet::single_track(filename, track_type)?;
    let cue_path = cue_path_for(image_path);

    debug!("Writing CUE sheet: {:?}", cue_path);
    tokio::fs::write(&cue_path, sheet.to_string()).await?;
    Ok(cue_path)
}
