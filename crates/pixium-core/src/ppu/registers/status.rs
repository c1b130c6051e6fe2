use bitflags::bitflags;

bitflags! {
    /// PPU status register (`$2002`).
    ///
    /// Bit layout:
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// V S O . . . . .
    /// ```
    /// - `V`: vertical blank has started
    /// - `S`: sprite zero hit
    /// - `O`: sprite overflow
    /// - `.`: not driven; read back from the register latch
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub(crate) struct Status: u8 {
        /// Sprite overflow flag (bit 5).
        const SPRITE_OVERFLOW = 0b0010_0000;

        /// Sprite zero hit flag (bit 6).
        const SPRITE_ZERO_HIT = 0b0100_0000;

        /// Vertical blank flag (bit 7). Reading `$2002` clears this bit.
        const VERTICAL_BLANK = 0b1000_0000;
    }
}

impl Status {
    /// Undriven low bits that come from the register latch on reads.
    pub(crate) const OPEN_BUS_BITS: u8 = 0x1F;

    /// Value seen by the CPU: the three flags merged with stale latch bits.
    pub(crate) fn read_with_latch(self, latch: u8) -> u8 {
        (self.bits() & !Self::OPEN_BUS_BITS) | (latch & Self::OPEN_BUS_BITS)
    }
}
