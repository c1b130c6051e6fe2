use bitflags::bitflags;

use super::registers::Control;

bitflags! {
    /// Attribute bits stored in sprite byte 2.
    ///
    /// Bit layout:
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// V H P . . . p p
    /// ```
    /// - `V`: Vertical flip
    /// - `H`: Horizontal flip
    /// - `P`: Priority (behind background when set)
    /// - `p`: Sprite palette select (0..=3)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub(crate) struct SpriteAttributes: u8 {
        /// Sprite palette select.
        const PALETTE = 0b0000_0011;

        /// When set, sprite is drawn behind the background.
        const PRIORITY_BEHIND_BACKGROUND = 0b0010_0000;

        /// Horizontal flip.
        const FLIP_HORIZONTAL = 0b0100_0000;

        /// Vertical flip.
        const FLIP_VERTICAL = 0b1000_0000;
    }
}

impl SpriteAttributes {
    #[inline]
    pub(crate) fn palette(self) -> u8 {
        self.bits() & Self::PALETTE.bits()
    }

    #[inline]
    pub(crate) fn behind_background(self) -> bool {
        self.contains(Self::PRIORITY_BEHIND_BACKGROUND)
    }

    #[inline]
    pub(crate) fn flip_horizontal(self) -> bool {
        self.contains(Self::FLIP_HORIZONTAL)
    }
}

/// Bit-reversed value of every byte, used to pre-flip horizontally mirrored
/// sprite patterns at fetch time.
pub(crate) const BIT_REVERSE: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u8).reverse_bits();
        i += 1;
    }
    table
};

/// Whether a sprite whose top edge is `sprite_y` covers `line`.
#[inline]
pub(crate) fn in_range(line: u16, sprite_y: u8, height: u8) -> bool {
    let row = i32::from(line) - i32::from(sprite_y);
    (0..i32::from(height)).contains(&row)
}

/// Pattern address of the low bitplane for one row of a sprite.
///
/// `row` counts from the sprite's top edge; vertical flip is applied here.
/// 8x16 sprites take their pattern table from bit 0 of the tile number and
/// use the even/odd tile pair for the top/bottom halves.
pub(crate) fn pattern_address(control: Control, tile: u8, attributes: SpriteAttributes, row: u8) -> u16 {
    let height = control.sprite_height();
    let mut row = row & (height - 1);
    if attributes.contains(SpriteAttributes::FLIP_VERTICAL) {
        row = height - 1 - row;
    }
    if height == 16 {
        let table = u16::from(tile & 1) << 12;
        let tile = (tile & 0xFE) | (row >> 3);
        table | (u16::from(tile) << 4) | u16::from(row & 7)
    } else {
        control.sprite_pattern_table() | (u16::from(tile) << 4) | u16::from(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_table_matches_bit_order() {
        assert_eq!(BIT_REVERSE[0b1000_0000], 0b0000_0001);
        assert_eq!(BIT_REVERSE[0b1100_1010], 0b0101_0011);
        assert!((0..=255u8).all(|b| BIT_REVERSE[BIT_REVERSE[b as usize] as usize] == b));
    }

    #[test]
    fn range_check_covers_sprite_height() {
        assert!(in_range(10, 10, 8));
        assert!(in_range(17, 10, 8));
        assert!(!in_range(18, 10, 8));
        assert!(in_range(25, 10, 16));
        assert!(!in_range(9, 10, 16));
        assert!(!in_range(0, 0xFF, 8));
    }

    #[test]
    fn tall_sprites_pick_table_from_tile_bit() {
        let tall = Control::SPRITE_SIZE_16;
        let plain = SpriteAttributes::empty();
        assert_eq!(pattern_address(tall, 0x41, plain, 3), 0x1403);
        assert_eq!(pattern_address(tall, 0x41, plain, 9), 0x1411);
        // Vertical flip swaps the halves.
        assert_eq!(pattern_address(tall, 0x40, SpriteAttributes::FLIP_VERTICAL, 0), 0x0417);
    }

    #[test]
    fn small_sprites_use_control_table() {
        let ctrl = Control::SPRITE_TABLE;
        assert_eq!(pattern_address(ctrl, 0x12, SpriteAttributes::empty(), 2), 0x1122);
        assert_eq!(
            pattern_address(Control::empty(), 0x12, SpriteAttributes::FLIP_VERTICAL, 2),
            0x0125
        );
    }
}
