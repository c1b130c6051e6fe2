//! Dot-by-dot sprite evaluation for the next line.
//!
//! Evaluation runs during dots 65..=256 of every visible line. Odd dots read;
//! even dots make decisions. Up to eight in-range sprites are copied to
//! secondary memory. Once eight are found, the scan continues looking for a
//! ninth to raise the overflow flag, but the hardware advances the byte
//! offset together with the sprite index while doing so. It therefore
//! compares X, tile or attribute bytes against the line and both misses
//! real overflows and reports false ones.
//!
//! The index of the first scanned sprite is taken from the sprite address
//! register, so a misaligned `$2003` write shifts which two entries are read
//! first.

use super::sprite::in_range;
use crate::{
    error::Error,
    mem_block::ppu::{OamRam, SecondaryOamRam},
    memory::ppu::SPRITES_PER_LINE,
    state::{StateReader, StateWriter},
};

/// Evaluation phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub(crate) enum EvalMode {
    /// Reading Y bytes looking for an in-range sprite.
    #[default]
    Scan = 0,
    /// Copying bytes 1..=3 of the sprite just found.
    CopyRest = 1,
    /// Eight found: quirked overflow scan.
    OverflowScan = 2,
    /// Ninth sprite matched: reading its remaining bytes.
    OverflowCopy = 3,
    /// All 64 entries visited.
    Idle = 4,
}

impl EvalMode {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::CopyRest,
            2 => Self::OverflowScan,
            3 => Self::OverflowCopy,
            4 => Self::Idle,
            _ => Self::Scan,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct SpriteEvaluator {
    mode: EvalMode,
    /// Sprite index (0..64).
    n: u8,
    /// Byte within the sprite (0..4).
    m: u8,
    found: u8,
    /// Primary memory address of each found sprite.
    found_addr: [u8; SPRITES_PER_LINE],
    /// Last byte read, visible through `$2004`.
    latch: u8,
    secondary: SecondaryOamRam,
}

impl Default for SpriteEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl SpriteEvaluator {
    pub(crate) fn new() -> Self {
        Self {
            mode: EvalMode::Scan,
            n: 0,
            m: 0,
            found: 0,
            found_addr: [0; SPRITES_PER_LINE],
            latch: 0xFF,
            secondary: SecondaryOamRam::filled(0xFF),
        }
    }

    /// Resets for a new line; secondary memory reads back as `$FF`.
    pub(crate) fn start_line(&mut self) {
        *self = Self::new();
    }

    pub(crate) fn found(&self) -> u8 {
        self.found
    }

    /// Whether sprite 0 occupies the first found slot.
    pub(crate) fn sprite0_found(&self) -> bool {
        self.found > 0 && self.found_addr[0] == 0
    }

    /// The four secondary bytes of found sprite `slot`.
    pub(crate) fn entry(&self, slot: usize) -> [u8; 4] {
        let base = slot * 4;
        [
            self.secondary[base],
            self.secondary[base + 1],
            self.secondary[base + 2],
            self.secondary[base + 3],
        ]
    }

    /// OAM index of the last found sprite, if any.
    pub(crate) fn last_found_index(&self) -> Option<u8> {
        self.found
            .checked_sub(1)
            .map(|slot| self.found_addr[slot as usize] >> 2)
    }

    #[inline]
    fn scan_addr(&self, oam_addr: u8) -> u8 {
        if self.n < 2 {
            (oam_addr & 0xF8).wrapping_add(self.n * 4)
        } else {
            self.n * 4
        }
    }

    /// Runs the evaluator for one dot (65..=256) of visible line `line`,
    /// selecting sprites for `line + 1`. Returns `true` when the overflow
    /// condition is detected on this dot.
    pub(crate) fn step(&mut self, dot: u16, line: u16, height: u8, oam: &OamRam, oam_addr: u8) -> bool {
        let decide = dot & 1 == 0;
        let mut overflow = false;
        match self.mode {
            EvalMode::Scan => {
                let addr = self.scan_addr(oam_addr);
                let slot = self.found as usize;
                self.found_addr[slot] = addr;
                self.latch = oam[addr as usize];
                if decide {
                    if in_range(line, self.latch, height) {
                        self.secondary[slot * 4] = self.latch;
                        self.found += 1;
                        self.m = 1;
                        self.mode = EvalMode::CopyRest;
                    } else {
                        self.n += 1;
                        if self.n == 64 {
                            self.n = 0;
                            self.mode = EvalMode::Idle;
                        }
                    }
                }
            }
            EvalMode::CopyRest => {
                let slot = self.found as usize - 1;
                let addr = self.found_addr[slot] | self.m;
                self.latch = oam[addr as usize];
                if decide {
                    self.secondary[slot * 4 + self.m as usize] = self.latch;
                    self.m += 1;
                    if self.m == 4 {
                        self.m = 1;
                        self.n += 1;
                        if self.n == 64 {
                            self.n = 0;
                            self.mode = EvalMode::Idle;
                        } else if self.found as usize == SPRITES_PER_LINE {
                            self.m = 0;
                            self.mode = EvalMode::OverflowScan;
                        } else {
                            self.mode = EvalMode::Scan;
                        }
                    }
                }
            }
            EvalMode::OverflowScan => {
                self.latch = oam[((self.n << 2) | self.m) as usize];
                if decide {
                    if in_range(line, self.latch, height) {
                        self.m = 1;
                        self.mode = EvalMode::OverflowCopy;
                        overflow = true;
                    } else {
                        self.n += 1;
                        if self.n == 64 {
                            self.n = 0;
                            self.mode = EvalMode::Idle;
                        }
                        // The byte offset advances with the index.
                        self.m = (self.m + 1) & 3;
                    }
                }
            }
            EvalMode::OverflowCopy => {
                self.latch = oam[((self.n << 2) | self.m) as usize];
                if decide {
                    self.m += 1;
                    if self.m == 4 {
                        self.m = 0;
                        self.n = (self.n + 1) & 63;
                        self.mode = EvalMode::Idle;
                    }
                }
            }
            EvalMode::Idle => {
                if decide {
                    self.n = (self.n + 1) & 63;
                }
                self.m = 0;
                self.latch = oam[(self.n << 2) as usize];
            }
        }
        overflow
    }

    /// `$2004` read while rendering a visible line.
    pub(crate) fn read_port(&self, dot: u16, oam: &OamRam) -> u8 {
        match dot {
            0..=64 => 0xFF,
            65..=256 => self.latch,
            257..=320 => {
                let slot = ((dot - 257) >> 3) as usize;
                if self.found as usize <= slot {
                    return 0xFF;
                }
                let base = self.found_addr[slot];
                let phase = ((dot - 257) & 7) as u8;
                let byte = phase.min(3);
                oam[(base | byte) as usize]
            }
            _ if self.found > 0 => oam[self.found_addr[0] as usize],
            _ => 0xFF,
        }
    }

    pub(crate) fn save_state(&self, w: &mut StateWriter) {
        w.u8("eval_mode", self.mode as u8);
        w.u8("eval_n", self.n);
        w.u8("eval_m", self.m);
        w.u8("eval_found", self.found);
        w.bytes("eval_found_addr", &self.found_addr);
        w.u8("eval_latch", self.latch);
        w.bytes("secondary_oam", &self.secondary);
    }

    pub(crate) fn load_state(&mut self, r: &StateReader<'_>) -> Result<(), Error> {
        self.mode = EvalMode::from_u8(r.u8("eval_mode")?);
        self.n = r.u8("eval_n")? & 63;
        self.m = r.u8("eval_m")? & 3;
        self.found = r.u8("eval_found")?.min(SPRITES_PER_LINE as u8);
        r.bytes("eval_found_addr", &mut self.found_addr)?;
        self.latch = r.u8("eval_latch")?;
        r.bytes("secondary_oam", &mut self.secondary)
    }
}
