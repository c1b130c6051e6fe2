//! Cartridge-side collaborator seen from the picture unit.
//!
//! The unit never owns pattern data. Every pattern-table byte is pulled
//! through [`Cartridge::read_pattern`], and the cartridge decides where each
//! of the four logical nametables lives: on one of the unit's two internal
//! pages or in memory of its own ([`NametableTarget`]).
//!
//! Boards that need to watch the address bus (A12-clocked IRQ counters) or
//! be poked once per scanline advertise it through [`Capabilities`]. The
//! unit resolves those flags once when the cartridge is attached and never
//! calls a hook the board did not ask for.

use core::fmt::Debug;

use bitflags::bitflags;
use dyn_clone::DynClone;

use crate::memory::ppu as ppu_mem;

pub mod chr_board;

pub use chr_board::ChrBoard;

/// Nametable wiring selected by the cartridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "savestate-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mirroring {
    /// `$2000`/`$2400` share page 0, `$2800`/`$2C00` share page 1.
    #[default]
    Horizontal,
    /// `$2000`/`$2800` share page 0, `$2400`/`$2C00` share page 1.
    Vertical,
    /// Every nametable maps to page 0.
    SingleScreenLower,
    /// Every nametable maps to page 1.
    SingleScreenUpper,
    /// `$2000`/`$2400` use the two internal pages, `$2800`/`$2C00` live on
    /// the cartridge.
    FourScreen,
}

impl Mirroring {
    /// Physical 1 KiB page (0 or 1) backing a nametable address.
    #[inline]
    pub fn page(self, addr: u16) -> usize {
        let logical = ((addr - ppu_mem::NAMETABLE_BASE) / ppu_mem::NAMETABLE_SIZE) & 0b11;
        match self {
            Mirroring::Horizontal => (logical >> 1) as usize,
            Mirroring::Vertical => (logical & 1) as usize,
            Mirroring::SingleScreenLower => 0,
            Mirroring::SingleScreenUpper => 1,
            Mirroring::FourScreen => (logical & 1) as usize,
        }
    }

    /// Offset into the internal nametable RAM for `addr` (`$2000-$3EFF`).
    #[inline]
    pub fn ram_offset(self, addr: u16) -> usize {
        self.page(addr) * ppu_mem::NAMETABLE_SIZE as usize
            + (addr & (ppu_mem::NAMETABLE_SIZE - 1)) as usize
    }

    /// Where the wiring sends a nametable address. Four-screen boards own
    /// the upper two tables; their cartridge offsets start at 0.
    pub fn target(self, addr: u16) -> NametableTarget {
        let logical = ((addr - ppu_mem::NAMETABLE_BASE) / ppu_mem::NAMETABLE_SIZE) & 0b11;
        if self == Mirroring::FourScreen && logical >= 2 {
            let offset = (addr - ppu_mem::NAMETABLE_BASE) & 0x07FF;
            return NametableTarget::Cartridge(offset);
        }
        NametableTarget::Ciram(self.ram_offset(addr) as u16)
    }
}

/// Backing memory of one nametable access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NametableTarget {
    /// Offset into the unit's 2 KiB internal nametable RAM.
    Ciram(u16),
    /// Offset handed to [`Cartridge::read_nametable`] and
    /// [`Cartridge::write_nametable`].
    Cartridge(u16),
}

bitflags! {
    /// Optional hooks a board wants the unit to drive.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        /// Call [`Cartridge::on_address_observed`] on every VRAM-facing access.
        const OBSERVES_ADDRESSES = 0b0000_0001;
        /// Call [`Cartridge::on_scanline`] once per rendering line.
        const SCANLINE_HOOK = 0b0000_0010;
        /// Call [`Cartridge::on_scanline_late`] at the end of sprite fetch.
        const SCANLINE_HOOK_LATE = 0b0000_0100;
    }
}

/// Pattern-table and wiring provider.
pub trait Cartridge: DynClone + Debug {
    /// Reads a byte from pattern space (`$0000-$1FFF`). Boards with
    /// read-triggered latches update them here.
    fn read_pattern(&mut self, addr: u16) -> u8;

    /// Reads a byte from pattern space without touching board state. Used
    /// by debug reads and by the fetches of sprites beyond the eighth.
    fn peek_pattern(&self, addr: u16) -> u8;

    /// Writes a byte to pattern space. Only called when
    /// [`pattern_writable`](Self::pattern_writable) returns `true`.
    fn write_pattern(&mut self, addr: u16, value: u8);

    /// Whether the 1 KiB page holding `addr` is RAM.
    fn pattern_writable(&self, addr: u16) -> bool {
        let _ = addr;
        false
    }

    /// Current nametable wiring. Queried on every nametable access so that
    /// boards may switch it at runtime.
    fn mirroring(&self) -> Mirroring;

    /// Resolves a nametable address (`$2000-$2FFF`). The default follows
    /// [`mirroring`](Self::mirroring).
    fn map_nametable(&self, addr: u16) -> NametableTarget {
        self.mirroring().target(addr)
    }

    /// Reads board-owned nametable memory.
    fn read_nametable(&self, offset: u16) -> u8 {
        let _ = offset;
        0
    }

    /// Writes board-owned nametable memory.
    fn write_nametable(&mut self, offset: u16, value: u8) {
        let _ = (offset, value);
    }

    /// Hooks this board wants. Read once at attach time.
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }

    /// A VRAM-facing address was placed on the bus.
    fn on_address_observed(&mut self, addr: u16) {
        let _ = addr;
    }

    /// Mid-hblank scanline notification.
    fn on_scanline(&mut self, scanline: u16) {
        let _ = scanline;
    }

    /// End-of-sprite-fetch scanline notification.
    fn on_scanline_late(&mut self, scanline: u16) {
        let _ = scanline;
    }
}

dyn_clone::clone_trait_object!(Cartridge);
