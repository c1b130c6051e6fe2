use bitflags::bitflags;

use crate::memory::ppu as ppu_mem;

// Layout (bits 0-14):
//  14 13 12 11 10 9 8 7 6 5 4 3 2 1 0
//  [fine_y][nt][coarse_y   ][coarse_x   ]
//  yyy     VH   YYYYY         XXXXX
bitflags! {
    /// Bit masks for the 15-bit scroll/address counter.
    pub(crate) struct VramAddrMask: u16 {
        const COARSE_X = 0x001F;       // bits 0-4
        const COARSE_Y = 0x03E0;       // bits 5-9
        const NAMETABLE_X = 0x0400;    // bit 10
        const NAMETABLE_Y = 0x0800;    // bit 11
        const NAMETABLE = Self::NAMETABLE_X.bits() | Self::NAMETABLE_Y.bits();
        const FINE_Y = 0x7000;         // bits 12-14
        /// Everything the horizontal latch copies at the end of a line.
        const HORIZONTAL = Self::COARSE_X.bits() | Self::NAMETABLE_X.bits();
        /// Everything the pre-render line copies back for the next frame.
        const VERTICAL = Self::COARSE_Y.bits() | Self::NAMETABLE_Y.bits() | Self::FINE_Y.bits();
        const ALL = Self::COARSE_X.bits()
            | Self::COARSE_Y.bits()
            | Self::NAMETABLE.bits()
            | Self::FINE_Y.bits();
    }
}

const COARSE_Y_SHIFT: u16 = 5;
const NAMETABLE_SHIFT: u16 = 10;
const FINE_Y_SHIFT: u16 = 12;

/// Five packed counters forming the 15-bit VRAM address: fine Y, vertical
/// and horizontal nametable select, coarse Y and coarse X.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct VramAddr(pub(crate) u16);

impl VramAddr {
    /// Returns the coarse X scroll component (0..31).
    #[inline]
    pub fn coarse_x(self) -> u8 {
        (self.0 & VramAddrMask::COARSE_X.bits()) as u8
    }

    #[inline]
    pub fn set_coarse_x(&mut self, cx: u8) {
        self.0 = (self.0 & !VramAddrMask::COARSE_X.bits()) | u16::from(cx & 0b1_1111);
    }

    /// Returns the coarse Y scroll component (0..31).
    #[inline]
    pub fn coarse_y(self) -> u8 {
        ((self.0 & VramAddrMask::COARSE_Y.bits()) >> COARSE_Y_SHIFT) as u8
    }

    #[inline]
    pub fn set_coarse_y(&mut self, cy: u8) {
        self.0 = (self.0 & !VramAddrMask::COARSE_Y.bits())
            | (u16::from(cy & 0b1_1111) << COARSE_Y_SHIFT);
    }

    /// Returns the selected nametable (0..3).
    #[inline]
    pub fn nametable(self) -> u8 {
        ((self.0 & VramAddrMask::NAMETABLE.bits()) >> NAMETABLE_SHIFT) as u8
    }

    #[inline]
    pub fn set_nametable(&mut self, nt: u8) {
        self.0 =
            (self.0 & !VramAddrMask::NAMETABLE.bits()) | (u16::from(nt & 0b11) << NAMETABLE_SHIFT);
    }

    /// Horizontal nametable select bit.
    #[inline]
    pub fn nametable_x(self) -> bool {
        self.0 & VramAddrMask::NAMETABLE_X.bits() != 0
    }

    /// Vertical nametable select bit.
    #[inline]
    pub fn nametable_y(self) -> bool {
        self.0 & VramAddrMask::NAMETABLE_Y.bits() != 0
    }

    /// Returns the fine Y scroll component (0..7).
    #[inline]
    pub fn fine_y(self) -> u8 {
        ((self.0 & VramAddrMask::FINE_Y.bits()) >> FINE_Y_SHIFT) as u8
    }

    #[inline]
    pub fn set_fine_y(&mut self, fy: u8) {
        self.0 = (self.0 & !VramAddrMask::FINE_Y.bits()) | (u16::from(fy & 0b111) << FINE_Y_SHIFT);
    }

    /// Returns the raw 15-bit value.
    #[inline]
    pub fn raw(self) -> u16 {
        self.0
    }

    /// Replaces the raw address, masking to 15 bits.
    #[inline]
    pub fn set_raw(&mut self, v: u16) {
        self.0 = v & VramAddrMask::ALL.bits();
    }

    /// Adds `step` to the packed counters. A carry out of coarse X ripples
    /// into coarse Y, then the nametable bits, then fine Y, and the result
    /// wraps at 15 bits.
    #[inline]
    pub fn increment(&mut self, step: u16) {
        self.0 = (self.0 + step) & VramAddrMask::ALL.bits();
    }

    /// Nametable byte for the tile under the counters.
    #[inline]
    pub fn nametable_fetch_address(self) -> u16 {
        ppu_mem::NAMETABLE_BASE | (self.0 & 0x0FFF)
    }

    /// Attribute byte covering the tile under the counters.
    #[inline]
    pub fn attribute_fetch_address(self) -> u16 {
        ppu_mem::NAMETABLE_BASE
            | ppu_mem::ATTRIBUTE_OFFSET
            | (self.0 & VramAddrMask::NAMETABLE.bits())
            | (u16::from(self.coarse_y() >> 2) << 3)
            | u16::from(self.coarse_x() >> 2)
    }

    /// Right shift that brings this tile's 2-bit palette group to the bottom
    /// of its attribute byte (which quadrant of the 4x4 cell it sits in).
    #[inline]
    pub fn attribute_shift(self) -> u8 {
        ((self.coarse_y() & 0b10) << 1) | (self.coarse_x() & 0b10)
    }

    /// Pattern row for `tile` in the table at `table`, using fine Y.
    #[inline]
    pub fn pattern_fetch_address(self, table: u16, tile: u8) -> u16 {
        table | (u16::from(tile) << 4) | u16::from(self.fine_y())
    }

    /// Address used by `$2007` accesses.
    #[inline]
    pub fn data_port_address(self) -> u16 {
        self.0 & ppu_mem::VRAM_MIRROR_MASK
    }
}

impl core::fmt::Debug for VramAddr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VramAddr")
            .field("raw", &format_args!("{:#06X}", self.0))
            .field("fine_y", &self.fine_y())
            .field("nametable", &self.nametable())
            .field("coarse_y", &self.coarse_y())
            .field("coarse_x", &self.coarse_x())
            .finish()
    }
}

impl core::fmt::Display for VramAddr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "raw={:#06X} fy={} nt={} cy={} cx={}",
            self.0,
            self.fine_y(),
            self.nametable(),
            self.coarse_y(),
            self.coarse_x(),
        )
    }
}

impl From<u16> for VramAddr {
    #[inline]
    fn from(v: u16) -> Self {
        VramAddr(v & VramAddrMask::ALL.bits())
    }
}

impl From<VramAddr> for u16 {
    #[inline]
    fn from(v: VramAddr) -> Self {
        v.raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_accessors_round_trip() {
        let mut addr = VramAddr::default();
        addr.set_coarse_x(31);
        addr.set_coarse_y(29);
        addr.set_nametable(2);
        addr.set_fine_y(5);
        assert_eq!(addr.raw(), 0x5BBF);
        assert!(addr.nametable_y());
        assert!(!addr.nametable_x());
    }

    #[test]
    fn fetch_addresses() {
        // Tile (13, 17) of nametable 1, fine Y 3.
        let mut addr = VramAddr::default();
        addr.set_coarse_x(13);
        addr.set_coarse_y(17);
        addr.set_nametable(1);
        addr.set_fine_y(3);
        assert_eq!(addr.nametable_fetch_address(), 0x2400 + 17 * 32 + 13);
        assert_eq!(addr.attribute_fetch_address(), 0x27C0 + (17 / 4) * 8 + 13 / 4);
        assert_eq!(addr.attribute_shift(), 0);
        assert_eq!(addr.pattern_fetch_address(0x1000, 0x42), 0x1423);
        assert_eq!(addr.data_port_address(), 0x362D);
    }

    #[test]
    fn attribute_shift_selects_quadrant() {
        let quadrant = |cx: u8, cy: u8| {
            let mut addr = VramAddr::default();
            addr.set_coarse_x(cx);
            addr.set_coarse_y(cy);
            addr.attribute_shift()
        };
        assert_eq!(quadrant(0, 0), 0);
        assert_eq!(quadrant(2, 0), 2);
        assert_eq!(quadrant(0, 2), 4);
        assert_eq!(quadrant(3, 3), 6);
    }
}
