use super::sprite_pipeline::{SpritePixel, SpriteSet};
use crate::{mem_block::MemBlock, memory::ppu::SCREEN_WIDTH};

const COLOR: u8 = 0b0000_0011;
const PALETTE_SHIFT: u8 = 2;
const BEHIND: u8 = 0b0001_0000;
const SPRITE0: u8 = 0b0010_0000;

/// Sprite plane of one line, resolved before the line is drawn.
///
/// Each entry packs the winning sprite pixel for a column:
/// ```text
/// 7 6 5 4 3 2 1 0
/// . . Z B P P C C
/// ```
/// `C` color (0 = transparent), `P` palette, `B` behind background, `Z`
/// sprite 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct SpriteLineBuffer {
    pixels: MemBlock<u8, SCREEN_WIDTH>,
}

impl Default for SpriteLineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpriteLineBuffer {
    pub(crate) fn new() -> Self {
        Self {
            pixels: MemBlock::new(),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Resolves every column. Sprites are visited back to front so the
    /// lowest slot with an opaque pixel ends up owning the column.
    pub(crate) fn build(&mut self, fetched: &SpriteSet) {
        self.clear();
        for slot in fetched.iter().rev() {
            let flip = slot.attributes.flip_horizontal();
            let meta = (slot.attributes.palette() << PALETTE_SHIFT)
                | if slot.attributes.behind_background() { BEHIND } else { 0 }
                | if slot.sprite0 { SPRITE0 } else { 0 };
            for col in 0..8u8 {
                let x = usize::from(slot.x) + usize::from(col);
                if x >= SCREEN_WIDTH {
                    break;
                }
                let bit = if flip { col } else { 7 - col };
                let color = ((slot.pattern_low >> bit) & 1) | (((slot.pattern_high >> bit) & 1) << 1);
                if color != 0 {
                    self.pixels[x] = meta | color;
                }
            }
        }
    }

    #[inline]
    pub(crate) fn pixel(&self, x: usize) -> SpritePixel {
        let packed = self.pixels[x];
        SpritePixel {
            palette: (packed >> PALETTE_SHIFT) & 0b11,
            color: packed & COLOR,
            priority_behind_bg: packed & BEHIND != 0,
            is_sprite0: packed & SPRITE0 != 0,
        }
    }
}
