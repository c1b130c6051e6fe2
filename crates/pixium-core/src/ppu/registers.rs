//! CPU-visible register state and the internal scroll counters.
//!
//! This module mirrors the `$2000-$2007` register set. The concrete bit
//! layouts live in submodules; the `v/t/x/w` counters used by `$2005` and
//! `$2006` live in [`ScrollCounters`].

mod control;
mod mask;
mod scroll_counters;
mod status;
mod vram_addr;

pub(crate) use control::Control;
pub(crate) use mask::Mask;
pub(crate) use scroll_counters::ScrollCounters;
pub(crate) use status::Status;
pub(crate) use vram_addr::VramAddr;

use crate::mem_block::ppu::OamRam;

/// Aggregates the state of all CPU visible registers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Registers {
    /// Mirror of the control register (`$2000`).
    pub(crate) control: Control,
    /// Mirror of the mask register (`$2001`).
    pub(crate) mask: Mask,
    /// Status register (`$2002`).
    pub(crate) status: Status,
    /// Current OAM pointer driven by `$2003`/`$2004`.
    pub(crate) oam_addr: u8,
    /// Primary sprite memory accessible through `$2004`.
    pub(crate) oam: OamRam,
    /// Internal scroll counters (`v`/`t`/`x`/`w`).
    pub(crate) scroll: ScrollCounters,
    /// Internal buffer implementing the delayed `$2007` read behavior.
    pub(crate) vram_buffer: u8,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    /// Creates a new register block with the power-on reset state.
    pub(crate) fn new() -> Self {
        Self {
            control: Control::default(),
            mask: Mask::default(),
            status: Status::default(),
            oam_addr: 0,
            oam: OamRam::new(),
            scroll: ScrollCounters::default(),
            vram_buffer: 0,
        }
    }

    /// Warm reset: every register returns to its reset value, sprite memory
    /// is kept.
    pub(crate) fn soft_reset(&mut self) {
        let oam = core::mem::take(&mut self.oam);
        *self = Self { oam, ..Self::new() };
    }

    /// Updates control, also syncing the nametable bits into `t`. Returns
    /// `true` when the write raised the NMI enable bit.
    pub(crate) fn write_control(&mut self, value: u8) -> bool {
        let was_enabled = self.control.nmi_enabled();
        self.control = Control::from_bits_retain(value);
        self.scroll.write_control(self.control.nametable_index());
        !was_enabled && self.control.nmi_enabled()
    }

    /// Status read side effects: clears vblank and the write toggle and
    /// returns the merged value.
    pub(crate) fn read_status(&mut self, latch: u8) -> u8 {
        let value = self.status.read_with_latch(latch);
        self.status.remove(Status::VERTICAL_BLANK);
        self.scroll.reset_toggle();
        value
    }

    /// `$2004` write: attribute bytes drop their three unimplemented bits.
    pub(crate) fn write_oam_data(&mut self, value: u8) {
        let value = if self.oam_addr & 0b11 == 2 {
            value & 0xE3
        } else {
            value
        };
        self.oam[self.oam_addr as usize] = value;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn control_write_reports_rising_nmi_edge() {
        let mut regs = Registers::new();
        assert!(regs.write_control(0x80));
        assert!(!regs.write_control(0x80));
        assert!(!regs.write_control(0x00));
        assert!(regs.write_control(0x83));
        assert_eq!(regs.scroll.t.nametable(), 3);
    }

    #[test]
    fn status_read_clears_vblank_and_toggle() {
        let mut regs = Registers::new();
        regs.status.insert(Status::VERTICAL_BLANK | Status::SPRITE_ZERO_HIT);
        regs.scroll.write_scroll(0x10);
        assert!(regs.scroll.w);

        let value = regs.read_status(0x15);
        assert_eq!(value, 0xD5);
        assert!(!regs.status.contains(Status::VERTICAL_BLANK));
        assert!(regs.status.contains(Status::SPRITE_ZERO_HIT));
        assert!(!regs.scroll.w);
    }

    #[test]
    fn oam_attribute_bytes_are_masked() {
        let mut regs = Registers::new();
        regs.oam_addr = 0xFE;
        regs.write_oam_data(0xFF);
        regs.write_oam_data(0xFF);
        assert_eq!(regs.oam[0xFE], 0xE3);
        assert_eq!(regs.oam[0xFF], 0xFF);
        assert_eq!(regs.oam_addr, 0);
    }

    proptest! {
        // A status read always restarts the two-write sequence, whatever
        // the toggle state left by earlier writes.
        #[test]
        fn status_read_restarts_pair(writes in proptest::collection::vec(any::<u8>(), 0..7), hi in 0u8..0x40, lo in any::<u8>()) {
            let mut regs = Registers::new();
            for value in writes {
                regs.scroll.write_scroll(value);
            }
            regs.read_status(0);
            regs.scroll.write_addr(hi);
            let v = regs.scroll.write_addr(lo);
            prop_assert_eq!(v.map(VramAddr::raw), Some((u16::from(hi) << 8) | u16::from(lo)));
        }
    }
}
