//! Address map constants for the picture unit.
//!
//! The CPU sees eight registers at `$2000-$2007`, mirrored every eight bytes
//! up to `$3FFF`. The unit's own 14-bit address space holds the cartridge
//! pattern tables, the nametables and the palette.

pub mod ppu {
    /// First CPU-visible register address.
    pub const REGISTER_BASE: u16 = 0x2000;
    /// Last CPU address that decodes to a register mirror.
    pub const REGISTER_WINDOW_END: u16 = 0x3FFF;
    /// Mask for decoding register mirrors (`addr & 0x0007`).
    pub const REGISTER_SELECT_MASK: u16 = 0x0007;

    /// Internal nametable RAM. Two 1 KiB pages, arranged by the cartridge
    /// wiring into the four logical nametables at `$2000-$2FFF`.
    pub const NAMETABLE_RAM_SIZE: usize = 0x0800;
    /// Size of a single logical nametable in bytes.
    pub const NAMETABLE_SIZE: u16 = 0x0400;
    /// Base address of logical nametable 0.
    pub const NAMETABLE_BASE: u16 = 0x2000;
    /// Offset of the attribute table inside a nametable.
    pub const ATTRIBUTE_OFFSET: u16 = 0x03C0;

    /// Address mask applied to every VRAM-facing access.
    pub const VRAM_MIRROR_MASK: u16 = 0x3FFF;

    /// Palette RAM base address (`$3F00`).
    pub const PALETTE_BASE: u16 = 0x3F00;
    /// Palette RAM byte count (mirrored every 32 bytes).
    pub const PALETTE_RAM_SIZE: usize = 0x20;
    /// First sprite palette entry.
    pub const SPRITE_PALETTE_BASE: u8 = 0x10;

    /// Pattern table base address for table 0.
    pub const PATTERN_TABLE_0: u16 = 0x0000;
    /// Pattern table base address for table 1.
    pub const PATTERN_TABLE_1: u16 = 0x1000;
    /// End of pattern space (exclusive).
    pub const PATTERN_SPACE_END: u16 = 0x2000;

    /// Primary object memory byte count (64 sprites, 4 bytes each).
    pub const OAM_RAM_SIZE: usize = 0x100;
    /// Secondary object memory: eight found sprites.
    pub const SECONDARY_OAM_RAM_SIZE: usize = 0x20;
    /// Number of sprites in primary object memory.
    pub const SPRITE_COUNT: usize = 64;
    /// Hardware sprite slots per line.
    pub const SPRITES_PER_LINE: usize = 8;

    /// Visible width of a line in pixels.
    pub const SCREEN_WIDTH: usize = 256;
    /// Number of visible lines.
    pub const SCREEN_HEIGHT: usize = 240;
    /// Dots in a regular line.
    pub const DOTS_PER_LINE: u16 = 341;

    /// CPU-visible register identifiers.
    #[repr(u16)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Register {
        /// `$2000` - PPUCTRL
        Control = 0x2000,
        /// `$2001` - PPUMASK
        Mask = 0x2001,
        /// `$2002` - PPUSTATUS
        Status = 0x2002,
        /// `$2003` - OAMADDR
        OamAddr = 0x2003,
        /// `$2004` - OAMDATA
        OamData = 0x2004,
        /// `$2005` - PPUSCROLL
        Scroll = 0x2005,
        /// `$2006` - PPUADDR
        Addr = 0x2006,
        /// `$2007` - PPUDATA
        Data = 0x2007,
    }

    impl Register {
        /// Resolves the register for a CPU address in `$2000-$3FFF`.
        pub const fn from_cpu_addr(addr: u16) -> Self {
            match addr & REGISTER_SELECT_MASK {
                0 => Self::Control,
                1 => Self::Mask,
                2 => Self::Status,
                3 => Self::OamAddr,
                4 => Self::OamData,
                5 => Self::Scroll,
                6 => Self::Addr,
                _ => Self::Data,
            }
        }
    }
}
