use core::{fmt, str::FromStr};

use crate::{
    error::Error,
    memory::ppu::{DOTS_PER_LINE, SCREEN_HEIGHT},
};

/// Video timing profile.
///
/// Every region shares the 341-dot line and the 240 visible lines; they
/// differ in how many idle lines surround vertical blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Region {
    /// North American / Japanese NTSC timing.
    #[default]
    Ntsc,
    /// European PAL timing.
    Pal,
    /// Dendy-style famiclone: PAL frame length with NTSC-like vblank.
    Dendy,
}

impl Region {
    /// Total scanlines per frame, including pre-render.
    pub const fn scanlines_per_frame(self) -> u16 {
        match self {
            Region::Ntsc => 262,
            Region::Pal | Region::Dendy => 312,
        }
    }

    /// Line on which the vblank flag is raised.
    pub const fn vblank_start_line(self) -> u16 {
        match self {
            Region::Ntsc | Region::Pal => 241,
            Region::Dendy => 291,
        }
    }

    /// Line number of the pre-render line (always the last line).
    pub const fn prerender_line(self) -> u16 {
        self.scanlines_per_frame() - 1
    }

    /// Number of lines spent in vblank before the pre-render line.
    pub const fn vblank_lines(self) -> u16 {
        self.prerender_line() - self.vblank_start_line()
    }

    /// Idle lines between the last visible line and vblank.
    pub const fn postrender_lines(self) -> u16 {
        self.vblank_start_line() - SCREEN_HEIGHT as u16
    }

    /// Whether odd frames drop one dot from the pre-render line when
    /// rendering is enabled.
    pub const fn skips_odd_frame_dot(self) -> bool {
        matches!(self, Region::Ntsc)
    }

    /// Dots per CPU cycle as a `(numerator, denominator)` pair.
    pub const fn dots_per_cpu_cycle(self) -> (u32, u32) {
        match self {
            Region::Ntsc | Region::Dendy => (3, 1),
            Region::Pal => (16, 5),
        }
    }

    /// Dots in a frame without the skipped dot.
    pub const fn dots_per_frame(self) -> u32 {
        self.scanlines_per_frame() as u32 * DOTS_PER_LINE as u32
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Region::Ntsc => "ntsc",
            Region::Pal => "pal",
            Region::Dendy => "dendy",
        };
        f.write_str(s)
    }
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ntsc" => Ok(Region::Ntsc),
            "pal" => Ok(Region::Pal),
            "dendy" => Ok(Region::Dendy),
            _ => Err(Error::UnknownRegion(s.to_owned())),
        }
    }
}
