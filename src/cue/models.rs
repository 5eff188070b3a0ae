// src/cue/models
use crate::cd::msf::Msf;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone)]
pub struct CueSheet {
    pub files: Vec<CueFile>,
}

#[derive(Debug, Clone)]
pub struct CueFile {
    pub filename: String,
    pub file_type: FileType,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone)]
pub struct Track {
    pub number: u8,
    pub track_type: TrackType,
    pub indices: Vec<Index>,
}

#[derive(Debug, Clone, Copy)]
pub struct Index {
    pub number: u8,
    pub position: Msf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackType {
    Mode1_2352,
    Mode2_2352,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Binary,
}

impl Display for TrackType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TrackType::Mode1_2352 => "MODE1/2352",
            TrackType::Mode2_2352 => "MODE2/2352",
        })
    }
}

impl Display for FileType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FileType::Binary => "BINARY",
        })
    }
}

impl Display for CueSheet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for file in &self.files {
            writeln!(f, "FILE \"{}\" {}", file.filename, file.file_type)?;
            for track in &file.tracks {
                writeln!(f, "  TRACK {:02} {}", track.number, track.track_type)?;
                for index in &track.indices {
                    writeln!(f, "    INDEX {:02} {}", index.number, index.position)?;
                }
            }
        }
        Ok(())
    }
}
