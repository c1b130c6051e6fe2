//! Final pixel selection and output tagging.
//!
//! Output bytes carry a 6-bit color index in the low bits and a tag in the
//! top two bits telling the palette stage which emphasis table applies:
//!
//! ```text
//! 7 6 5 4 3 2 1 0
//! T T c c c c c c
//! ```
//! `10` no emphasis, `01` partial emphasis (the exact bits are stored in the
//! separate emphasis plane), `11` all three emphasis bits set.

use super::{palette::Palette, registers::Mask, sprite_pipeline::SpritePixel};
use crate::memory::ppu::SPRITE_PALETTE_BASE;

/// Tags a 6-bit color with the emphasis class of the 3-bit `emphasis`.
#[inline]
pub(crate) fn tag(color: u8, emphasis: u8) -> u8 {
    match emphasis & 0b111 {
        0b111 => (color & 0x3F) | 0xC0,
        0 => (color & 0x3F) | 0x80,
        _ => (color & 0x3F) | 0x40,
    }
}

/// Everything the per-pixel path needs, captured once per group of pixels.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Compositor {
    pub(crate) mask: Mask,
    /// User toggle: draw the background plane.
    pub(crate) show_background: bool,
    /// User toggle: draw the sprite plane.
    pub(crate) show_sprites: bool,
    /// Color shown where nothing opaque is drawn.
    pub(crate) backdrop: u8,
}

/// One composed pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Composed {
    pub(crate) output: u8,
    pub(crate) sprite_zero_hit: bool,
}

impl Compositor {
    /// Tagged backdrop byte shown while rendering is off.
    #[inline]
    pub(crate) fn backdrop_output(&self) -> u8 {
        tag(self.backdrop, self.mask.emphasis())
    }

    /// Composes column `x` from a background sample and a sprite pixel.
    ///
    /// Sprite zero detection looks at the hardware plane enables only; the
    /// user toggles decide what is drawn.
    #[inline]
    pub(crate) fn pixel(&self, x: usize, bg: (u8, u8), sprite: SpritePixel, palette: &Palette) -> Composed {
        let palette_mask = self.mask.palette_mask();
        let (bg_palette, bg_pattern) = bg;
        let bg_opaque = bg_pattern != 0 && self.mask.background_visible_at(x);
        let bg_drawn = bg_opaque && self.show_background;

        let mut color = if bg_drawn {
            palette.read(u16::from((bg_palette << 2) | bg_pattern), palette_mask)
        } else {
            self.backdrop
        };

        let mut sprite_zero_hit = false;
        if sprite.color != 0 && self.mask.sprites_visible_at(x) {
            sprite_zero_hit = sprite.is_sprite0 && bg_opaque && x < 255;
            if self.show_sprites && !(sprite.priority_behind_bg && bg_drawn) {
                let index = SPRITE_PALETTE_BASE | (sprite.palette << 2) | sprite.color;
                color = palette.read(u16::from(index), palette_mask);
            }
        }

        Composed {
            output: tag(color, self.mask.emphasis()),
            sprite_zero_hit,
        }
    }
}
