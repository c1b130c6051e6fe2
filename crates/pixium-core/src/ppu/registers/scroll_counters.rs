use super::VramAddr;
use super::vram_addr::VramAddrMask;

/// Live and temporary scroll counters plus fine X and the shared write
/// toggle used by `$2005`/`$2006`.
///
/// The temporary copy only reaches the live counters through the explicit
/// latch operations below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct ScrollCounters {
    /// Live counters (`v`), driving every fetch.
    pub(crate) v: VramAddr,
    /// Temporary counters (`t`), composed by register writes.
    pub(crate) t: VramAddr,
    /// Fine X scroll (0..7).
    pub(crate) x: u8,
    /// Write toggle: `false` means the next write is the first of a pair.
    pub(crate) w: bool,
}

impl ScrollCounters {
    /// `$2000` writes land the nametable select in `t`.
    pub(crate) fn write_control(&mut self, nametable: u8) {
        self.t.set_nametable(nametable);
    }

    /// `$2005`: first write is X (coarse + fine), second is Y.
    pub(crate) fn write_scroll(&mut self, value: u8) {
        if !self.w {
            self.t.set_coarse_x(value >> 3);
            self.x = value & 0b111;
        } else {
            self.t.set_coarse_y(value >> 3);
            self.t.set_fine_y(value & 0b111);
        }
        self.w = !self.w;
    }

    /// `$2006`: first write sets the high six bits (clearing bit 14), the
    /// second sets the low byte and copies `t` into `v`. Returns the new
    /// live address after the second write.
    pub(crate) fn write_addr(&mut self, value: u8) -> Option<VramAddr> {
        let second_write = self.w;
        if !second_write {
            let hi = u16::from(value & 0b0011_1111) << 8;
            let lo = self.t.raw() & 0x00FF;
            self.t.set_raw(hi | lo);
        } else {
            let hi = self.t.raw() & 0x7F00;
            self.t.set_raw(hi | u16::from(value));
            self.install_latches();
        }
        self.w = !self.w;
        second_write.then_some(self.v)
    }

    /// Resets the write toggle (status register read).
    pub(crate) fn reset_toggle(&mut self) {
        self.w = false;
    }

    /// Copies every temporary field into the live counters.
    pub(crate) fn install_latches(&mut self) {
        self.v = self.t;
    }

    /// Copies coarse X and the horizontal nametable bit only.
    pub(crate) fn install_horizontal_latches(&mut self) {
        let keep = self.v.raw() & !VramAddrMask::HORIZONTAL.bits();
        let take = self.t.raw() & VramAddrMask::HORIZONTAL.bits();
        self.v.set_raw(keep | take);
    }

    /// Copies fine Y, coarse Y and the vertical nametable bit only.
    pub(crate) fn install_vertical_latches(&mut self) {
        let keep = self.v.raw() & !VramAddrMask::VERTICAL.bits();
        let take = self.t.raw() & VramAddrMask::VERTICAL.bits();
        self.v.set_raw(keep | take);
    }

    /// Steps coarse X, flipping the horizontal nametable on wrap.
    pub(crate) fn increment_coarse_x(&mut self) {
        let raw = self.v.raw();
        if self.v.coarse_x() == 31 {
            self.v
                .set_raw((raw & !VramAddrMask::COARSE_X.bits()) ^ VramAddrMask::NAMETABLE_X.bits());
        } else {
            self.v.set_raw(raw + 1);
        }
    }

    /// Steps fine Y. On overflow coarse Y advances; reaching row 30 wraps to
    /// 0 and flips the vertical nametable, while a coarse Y already at 31
    /// wraps to 0 without the flip (attribute rows are not tile rows).
    pub(crate) fn increment_fine_y(&mut self) {
        let fine_y = self.v.fine_y() + 1;
        if fine_y < 8 {
            self.v.set_fine_y(fine_y);
            return;
        }
        self.v.set_fine_y(0);
        let coarse_y = (self.v.coarse_y() + 1) & 0b1_1111;
        if coarse_y == 30 {
            self.v.set_coarse_y(0);
            let raw = self.v.raw();
            self.v.set_raw(raw ^ VramAddrMask::NAMETABLE_Y.bits());
        } else {
            self.v.set_coarse_y(coarse_y);
        }
    }

    /// Post-access step of `$2007`. Outside rendering the whole counter
    /// chain advances by 1 or 32; while the picture is being fetched the
    /// access instead clocks the fetch-pattern increments (coarse X and
    /// fine Y together).
    pub(crate) fn increment_on_register_access(&mut self, rendering_active: bool, by_row: bool) {
        if rendering_active {
            self.increment_coarse_x();
            self.increment_fine_y();
        } else {
            self.v.increment(if by_row { 32 } else { 1 });
        }
    }

    /// Pixel scroll held in the temporary counters, as `(x, y)` including
    /// the nametable offsets.
    pub(crate) fn scroll(&self) -> (u16, u16) {
        let t = self.t;
        let x = u16::from(t.coarse_x()) * 8 + u16::from(self.x) + if t.nametable_x() { 256 } else { 0 };
        let y = u16::from(t.coarse_y()) * 8 + u16::from(t.fine_y()) + if t.nametable_y() { 240 } else { 0 };
        (x, y)
    }
}
