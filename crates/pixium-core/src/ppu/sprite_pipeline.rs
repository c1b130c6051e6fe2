use super::{
    sprite::{BIT_REVERSE, SpriteAttributes},
    sprite_line::SpriteLineBuffer,
};
use crate::{
    config::Fidelity,
    error::Error,
    mem_block::MemBlock,
    memory::ppu::SPRITE_COUNT,
    state::{StateReader, StateWriter},
};

/// Bytes per slot in the state image.
const SLOT_STATE_BYTES: usize = 5;

/// A sprite fetched during dots 257..=320 for the following line.
///
/// Patterns are stored as fetched; renderers decide how to apply the
/// horizontal flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct SpriteSlot {
    pub(crate) pattern_low: u8,
    pub(crate) pattern_high: u8,
    pub(crate) attributes: SpriteAttributes,
    pub(crate) x: u8,
    /// Indicates this slot belongs to OAM sprite 0.
    pub(crate) sprite0: bool,
}

impl SpriteSlot {
    fn to_bytes(self) -> [u8; SLOT_STATE_BYTES] {
        [
            self.pattern_low,
            self.pattern_high,
            self.attributes.bits(),
            self.x,
            u8::from(self.sprite0),
        ]
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            pattern_low: bytes[0],
            pattern_high: bytes[1],
            attributes: SpriteAttributes::from_bits_retain(bytes[2]),
            x: bytes[3],
            sprite0: bytes[4] != 0,
        }
    }
}

/// Up to 64 sprites for one line (eight with the hardware limit on).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub(crate) struct SpriteSet {
    slots: MemBlock<SpriteSlot, SPRITE_COUNT>,
    count: u8,
}

impl SpriteSet {
    pub(crate) fn clear(&mut self) {
        self.count = 0;
    }

    pub(crate) fn push(&mut self, slot: SpriteSlot) {
        if (self.count as usize) < SPRITE_COUNT {
            self.slots[self.count as usize] = slot;
            self.count += 1;
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.count as usize
    }

    pub(crate) fn iter(&self) -> impl DoubleEndedIterator<Item = &SpriteSlot> {
        self.slots.iter().take(self.count as usize)
    }

    pub(crate) fn save_state(&self, w: &mut StateWriter, count_name: &'static str, slots_name: &'static str) {
        w.u8(count_name, self.count);
        let mut bytes = [0u8; SPRITE_COUNT * SLOT_STATE_BYTES];
        for (chunk, slot) in bytes.chunks_exact_mut(SLOT_STATE_BYTES).zip(self.slots.iter()) {
            chunk.copy_from_slice(&slot.to_bytes());
        }
        w.bytes(slots_name, &bytes);
    }

    pub(crate) fn load_state(
        &mut self,
        r: &StateReader<'_>,
        count_name: &'static str,
        slots_name: &'static str,
    ) -> Result<(), Error> {
        self.count = r.u8(count_name)?.min(SPRITE_COUNT as u8);
        let mut bytes = [0u8; SPRITE_COUNT * SLOT_STATE_BYTES];
        r.bytes(slots_name, &mut bytes)?;
        for (slot, chunk) in self.slots.iter_mut().zip(bytes.chunks_exact(SLOT_STATE_BYTES)) {
            *slot = SpriteSlot::from_bytes(chunk);
        }
        Ok(())
    }
}

/// Sprite pixel information produced for a single dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub(crate) struct SpritePixel {
    /// Sprite palette select (0..=3).
    pub(crate) palette: u8,
    /// Sprite color index within the palette (0..=3, 0 means transparent).
    pub(crate) color: u8,
    /// Whether the sprite has background priority (is drawn behind).
    pub(crate) priority_behind_bg: bool,
    /// Whether this pixel came from sprite 0.
    pub(crate) is_sprite0: bool,
}

/// Per-dot sprite shifters for the current line.
///
/// Each sprite has two pattern shifters and an X counter. When the counter
/// reaches zero, the shifters begin outputting and advance once per dot.
/// Horizontally flipped patterns are bit-reversed when loaded, so output
/// never branches on flip state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub(crate) struct SpritePipeline {
    slots: SpriteSet,
}

impl SpritePipeline {
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }

    /// Loads the sprites fetched on the previous line.
    pub(crate) fn load_scanline(&mut self, fetched: &SpriteSet) {
        self.slots.clear();
        for slot in fetched.iter() {
            let mut slot = *slot;
            if slot.attributes.flip_horizontal() {
                slot.pattern_low = BIT_REVERSE[slot.pattern_low as usize];
                slot.pattern_high = BIT_REVERSE[slot.pattern_high as usize];
            }
            self.slots.push(slot);
        }
    }

    /// Samples the current sprite pixel and advances active shifters by one dot.
    pub(crate) fn sample_and_shift(&mut self) -> SpritePixel {
        let mut chosen: Option<SpritePixel> = None;
        let count = self.slots.len();

        for slot in self.slots.slots.iter_mut().take(count) {
            if slot.x > 0 {
                slot.x -= 1;
                continue;
            }

            let bit0 = (slot.pattern_low >> 7) & 1;
            let bit1 = (slot.pattern_high >> 7) & 1;
            let color = (bit1 << 1) | bit0;

            if chosen.is_none() && color != 0 {
                chosen = Some(SpritePixel {
                    palette: slot.attributes.palette(),
                    color,
                    priority_behind_bg: slot.attributes.behind_background(),
                    is_sprite0: slot.sprite0,
                });
            }

            slot.pattern_low <<= 1;
            slot.pattern_high <<= 1;
        }

        chosen.unwrap_or_default()
    }

    pub(crate) fn save_state(&self, w: &mut StateWriter) {
        self.slots.save_state(w, "sprite_shift_count", "sprite_shift_slots");
    }

    pub(crate) fn load_state(&mut self, r: &StateReader<'_>) -> Result<(), Error> {
        self.slots.load_state(r, "sprite_shift_count", "sprite_shift_slots")
    }
}

/// How sprite pixels are produced for the line being drawn.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum SpriteRenderer {
    /// Shifters clocked once per pixel.
    Shifters(SpritePipeline),
    /// Whole line resolved up front.
    LineBuffer(SpriteLineBuffer),
}

impl SpriteRenderer {
    pub(crate) fn new(fidelity: Fidelity) -> Self {
        match fidelity {
            Fidelity::PerDot => Self::Shifters(SpritePipeline::default()),
            Fidelity::LineBatched => Self::LineBuffer(SpriteLineBuffer::new()),
        }
    }

    pub(crate) fn clear(&mut self) {
        match self {
            Self::Shifters(pipeline) => pipeline.clear(),
            Self::LineBuffer(buffer) => buffer.clear(),
        }
    }

    pub(crate) fn load_scanline(&mut self, fetched: &SpriteSet) {
        match self {
            Self::Shifters(pipeline) => pipeline.load_scanline(fetched),
            Self::LineBuffer(buffer) => buffer.build(fetched),
        }
    }

    /// Sprite pixel at column `x`. Columns must be requested left to right,
    /// each exactly once per line.
    #[inline]
    pub(crate) fn pixel(&mut self, x: usize) -> SpritePixel {
        match self {
            Self::Shifters(pipeline) => pipeline.sample_and_shift(),
            Self::LineBuffer(buffer) => buffer.pixel(x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ppu::sprite_line::SpriteLineBuffer;

    fn set(slots: &[SpriteSlot]) -> SpriteSet {
        let mut set = SpriteSet::default();
        for slot in slots {
            set.push(*slot);
        }
        set
    }

    fn line(renderer: &mut SpriteRenderer) -> Vec<SpritePixel> {
        (0..256).map(|x| renderer.pixel(x)).collect()
    }

    #[test]
    fn shifter_starts_at_sprite_x() {
        let mut pipeline = SpritePipeline::default();
        pipeline.load_scanline(&set(&[SpriteSlot {
            pattern_low: 0b1000_0001,
            x: 3,
            ..SpriteSlot::default()
        }]));
        let colors: Vec<u8> = (0..12).map(|_| pipeline.sample_and_shift().color).collect();
        assert_eq!(colors, [0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 1, 0]);
    }

    #[test]
    fn earlier_opaque_slot_wins() {
        let mut pipeline = SpritePipeline::default();
        pipeline.load_scanline(&set(&[
            SpriteSlot {
                pattern_low: 0b0100_0000,
                attributes: SpriteAttributes::from_bits_retain(0x01),
                ..SpriteSlot::default()
            },
            SpriteSlot {
                pattern_high: 0xFF,
                attributes: SpriteAttributes::from_bits_retain(0x22),
                sprite0: true,
                ..SpriteSlot::default()
            },
        ]));
        let first = pipeline.sample_and_shift();
        assert_eq!((first.color, first.palette), (2, 2));
        assert!(first.priority_behind_bg && first.is_sprite0);
        let second = pipeline.sample_and_shift();
        assert_eq!((second.color, second.palette), (1, 1));
    }

    #[test]
    fn both_renderers_agree_on_flipped_overlapping_sprites() {
        let fetched = set(&[
            SpriteSlot {
                pattern_low: 0b1100_0000,
                pattern_high: 0b0000_0011,
                attributes: SpriteAttributes::FLIP_HORIZONTAL,
                x: 250,
                sprite0: true,
            },
            SpriteSlot {
                pattern_low: 0xF0,
                pattern_high: 0x0F,
                attributes: SpriteAttributes::from_bits_retain(0x23),
                x: 246,
                sprite0: false,
            },
            SpriteSlot {
                pattern_low: 0x81,
                pattern_high: 0x42,
                attributes: SpriteAttributes::FLIP_HORIZONTAL | SpriteAttributes::FLIP_VERTICAL,
                x: 0,
                sprite0: false,
            },
        ]);
        let mut shifters = SpriteRenderer::Shifters(SpritePipeline::default());
        let mut buffer = SpriteRenderer::LineBuffer(SpriteLineBuffer::new());
        shifters.load_scanline(&fetched);
        buffer.load_scanline(&fetched);
        assert_eq!(line(&mut shifters), line(&mut buffer));
    }
}
