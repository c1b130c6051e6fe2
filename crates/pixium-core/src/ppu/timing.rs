//! Frame layout and the unit's position inside it.
//!
//! A frame begins on the first vblank line, so a whole frame of CPU time
//! runs from one vblank entry to the next:
//!
//! ```text
//! vblank lines | overclock vblank | pre-render | visible 0..=239 | post-render | overclock post-render
//! ```
//!
//! Overclock sections are empty unless enabled; while the unit is inside
//! one, the reported scanline is frozen at the line preceding it.

use crate::{
    config::Region,
    memory::ppu::{DOTS_PER_LINE, SCREEN_HEIGHT},
};

/// What happens on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum LineKind {
    /// Vertical blank. The first one raises the flag.
    VBlank { first: bool },
    /// Extra idle line with a frozen position.
    Overclock,
    /// Fetches like a visible line without drawing; clears status.
    PreRender,
    /// Drawn line `0..240`.
    Visible(u16),
    /// Idle line after the picture.
    PostRender,
}

impl LineKind {
    /// Lines that run the fetch pipeline.
    #[inline]
    pub(crate) fn renders(self) -> bool {
        matches!(self, LineKind::PreRender | LineKind::Visible(_))
    }
}

/// Line sequence of the frame being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct FramePlan {
    pub(crate) region: Region,
    pub(crate) vblank_extra: u16,
    pub(crate) postrender_extra: u16,
}

impl FramePlan {
    pub(crate) fn new(region: Region) -> Self {
        Self {
            region,
            vblank_extra: 0,
            postrender_extra: 0,
        }
    }

    /// Index of the first extra vblank line.
    pub(crate) fn vblank_extra_start(&self) -> u16 {
        self.region.vblank_lines()
    }

    pub(crate) fn prerender_index(&self) -> u16 {
        self.vblank_extra_start() + self.vblank_extra
    }

    /// Index of the first extra post-render line.
    pub(crate) fn postrender_extra_start(&self) -> u16 {
        self.prerender_index() + 1 + SCREEN_HEIGHT as u16 + self.region.postrender_lines()
    }

    pub(crate) fn line_count(&self) -> u16 {
        self.postrender_extra_start() + self.postrender_extra
    }

    /// Kind and reported scanline number of line `index`.
    pub(crate) fn line(&self, index: u16) -> Option<(LineKind, u16)> {
        let region = self.region;
        let vblank_start = region.vblank_start_line();
        let prerender = self.prerender_index();
        let line = if index < self.vblank_extra_start() {
            (LineKind::VBlank { first: index == 0 }, vblank_start + index)
        } else if index < prerender {
            (LineKind::Overclock, region.prerender_line() - 1)
        } else if index == prerender {
            (LineKind::PreRender, region.prerender_line())
        } else if index < prerender + 1 + SCREEN_HEIGHT as u16 {
            let y = index - prerender - 1;
            (LineKind::Visible(y), y)
        } else if index < self.postrender_extra_start() {
            let y = index - prerender - 1;
            (LineKind::PostRender, y)
        } else if index < self.line_count() {
            (LineKind::Overclock, vblank_start - 1)
        } else {
            return None;
        };
        Some(line)
    }
}

/// Where the event engine stands: the next dot to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Position {
    pub(crate) line_index: u16,
    /// Frame-relative dot at which the current line began.
    pub(crate) line_start: u32,
    pub(crate) dot: u16,
    pub(crate) line_len: u16,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            line_index: 0,
            line_start: 0,
            dot: 0,
            line_len: DOTS_PER_LINE,
        }
    }
}

impl Position {
    /// Frame-relative stamp of the next dot.
    #[inline]
    pub(crate) fn stamp(&self) -> u32 {
        self.line_start + u32::from(self.dot)
    }

    /// Moves past the current dot, wrapping into the next line.
    #[inline]
    pub(crate) fn advance(&mut self) {
        self.dot += 1;
        if self.dot >= self.line_len {
            self.line_start += u32::from(self.line_len);
            self.line_index += 1;
            self.dot = 0;
            self.line_len = DOTS_PER_LINE;
        }
    }
}
