use std::fmt::{Display, Formatter};

pub const FRAMES_PER_SECOND: u32 = 75;
pub const SECONDS_PER_MINUTE: u32 = 60;
/// Two-second lead-in before the first addressable sector.
pub const PREGAP_FRAMES: u32 = 150;

/// Minute:Second:Frame disc address, stored as plain binary values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Msf {
    pub minutes: u8,
    pub seconds: u8,
    pub frames: u8,
}

impl Msf {
    pub const ZERO: Msf = Msf {
        minutes: 0,
        seconds: 0,
        frames: 0,
    };

    /// Minutes past 255 wrap, matching how raw headers are written by existing encoders.
    pub fn from_frames(total_frames: u32) -> Self {
        let seconds = total_frames / FRAMES_PER_SECOND;
        Self {
            minutes: (seconds / SECONDS_PER_MINUTE) as u8,
            seconds: (seconds % SECONDS_PER_MINUTE) as u8,
            frames: (total_frames % FRAMES_PER_SECOND) as u8,
        }
    }

    /// Address of the 0-based sector `index` of an image, pregap included.
    pub fn from_sector_index(index: u32) -> Self {
        Self::from_frames(index.wrapping_add(PREGAP_FRAMES))
    }

    pub fn to_frames(&self) -> u32 {
        (self.minutes as u32 * SECONDS_PER_MINUTE + self.seconds as u32) * FRAMES_PER_SECOND
            + self.frames as u32
    }

    /// Packs the address as it appears in a sector header.
    pub fn to_bcd(&self) -> [u8; 3] {
        [to_bcd(self.minutes), to_bcd(self.seconds), to_bcd(self.frames)]
    }

    /// Parses a header address, `None` if any nibble is not a decimal digit.
    pub fn from_bcd(bcd: [u8; 3]) -> Option<Self> {
        Some(Self {
            minutes: from_bcd(bcd[0])?,
            seconds: from_bcd(bcd[1])?,
            frames: from_bcd(bcd[2])?,
        })
    }
}

impl Display for Msf {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.minutes, self.seconds, self.frames)
    }
}

// Values above 99 yield non-decimal nibbles, truncated to a byte as existing encoders do.
fn to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

fn from_bcd(value: u8) -> Option<u8> {
    let (high, low) = (value >> 4, value & 0x0F);
    if high > 9 || low > 9 {
        return None;
    }
    Some(high * 10 + low)
}
