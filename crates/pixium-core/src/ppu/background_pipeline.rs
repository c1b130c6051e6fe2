use crate::{
    error::Error,
    state::{StateReader, StateWriter},
};

/// 16-bit left-shifting register used by the background pipeline.
///
/// Layout:
///   [ high 8 bits | low 8 bits ]
///
/// The high byte holds the tile currently being drawn, the low byte the tile
/// that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
struct Shift16(u16);

impl Shift16 {
    /// Replaces the low byte with freshly fetched data.
    #[inline]
    fn load_low_byte(&mut self, byte: u8) {
        self.0 = (self.0 & 0xFF00) | u16::from(byte);
    }

    /// Returns the bit `offset` places below the MSB (`offset` in 0..16).
    #[inline]
    fn bit_at(self, offset: u8) -> u8 {
        ((self.0 >> (15 - (offset & 0x0F))) & 1) as u8
    }

    /// Moves a whole tile worth of pixels out of the register.
    #[inline]
    fn shift_tile(&mut self) {
        self.0 <<= 8;
    }
}

/// Bytes gathered by the four fetches of one background tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct TileLatch {
    pub(crate) tile: u8,
    /// Two-bit palette group, already shifted out of the attribute byte.
    pub(crate) palette: u8,
    pub(crate) pattern: [u8; 2],
}

/// Background pixel pipeline: two pattern and two palette shifters.
///
/// Pixels leave the pipeline a tile at a time. Fine X is applied as an
/// offset into the 16-bit window, so the eight pixels of the tile in the
/// high byte are at offsets `fine_x..fine_x + 8`. After a tile is drawn the
/// shifters advance by eight and the latched tile is loaded behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct BgPipeline {
    /// Background pattern bitplanes: [bitplane0, bitplane1].
    pattern: [Shift16; 2],
    /// Background palette bits: [palette_bit0, palette_bit1].
    palette: [Shift16; 2],
    /// Tile being fetched.
    pub(crate) latch: TileLatch,
}

impl BgPipeline {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    /// Advances by one tile and loads the latched tile into the low bytes.
    /// Palette bits are replicated across the eight pixels.
    pub(crate) fn advance_tile(&mut self) {
        let latch = self.latch;
        for i in 0..=1 {
            self.pattern[i].shift_tile();
            self.pattern[i].load_low_byte(latch.pattern[i]);

            let repeated = if (latch.palette >> i) & 1 != 0 { 0xFF } else { 0x00 };
            self.palette[i].shift_tile();
            self.palette[i].load_low_byte(repeated);
        }
    }

    /// Samples the pixel `offset` places into the window (fine X plus the
    /// pixel's column within the tile).
    ///
    /// Returns `(palette_bits, pattern_bits)`.
    #[inline]
    pub(crate) fn sample(&self, offset: u8) -> (u8, u8) {
        let pattern_bit0 = self.pattern[0].bit_at(offset);
        let pattern_bit1 = self.pattern[1].bit_at(offset);
        let palette_bit0 = self.palette[0].bit_at(offset);
        let palette_bit1 = self.palette[1].bit_at(offset);

        (
            (palette_bit1 << 1) | palette_bit0,
            (pattern_bit1 << 1) | pattern_bit0,
        )
    }

    pub(crate) fn save_state(&self, w: &mut StateWriter) {
        let mut shifters = [0u8; 8];
        let words = [
            self.pattern[0].0,
            self.pattern[1].0,
            self.palette[0].0,
            self.palette[1].0,
        ];
        for (chunk, word) in shifters.chunks_exact_mut(2).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        w.bytes("bg_shifters", &shifters);
        let latch = self.latch;
        w.bytes(
            "bg_latch",
            &[latch.tile, latch.palette, latch.pattern[0], latch.pattern[1]],
        );
    }

    pub(crate) fn load_state(&mut self, r: &StateReader<'_>) -> Result<(), Error> {
        let mut shifters = [0u8; 8];
        r.bytes("bg_shifters", &mut shifters)?;
        let word = |i: usize| Shift16(u16::from_le_bytes([shifters[i * 2], shifters[i * 2 + 1]]));
        self.pattern = [word(0), word(1)];
        self.palette = [word(2), word(3)];

        let mut latch = [0u8; 4];
        r.bytes("bg_latch", &mut latch)?;
        self.latch = TileLatch {
            tile: latch[0],
            palette: latch[1] & 0b11,
            pattern: [latch[2], latch[3]],
        };
        Ok(())
    }
}
