use crate::{
    error::Error,
    mem_block::ppu::PaletteRam,
    memory::ppu as ppu_mem,
    state::{StateReader, StateWriter},
};

/// Palette RAM as seen through `$3F00-$3FFF`.
///
/// Entries `$3F10/$3F14/$3F18/$3F1C` are wired to `$3F00/$3F04/$3F08/$3F0C`,
/// so a sprite palette's transparent slot shares storage with the matching
/// background slot. Only the low six bits of each entry exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub(crate) struct Palette {
    ram: PaletteRam,
}

impl Palette {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn index(addr: u16) -> usize {
        let index = (addr as usize) & (ppu_mem::PALETTE_RAM_SIZE - 1);
        if index & 0x13 == 0x10 {
            index & !0x10
        } else {
            index
        }
    }

    /// Reads an entry with the grayscale/width mask applied.
    #[inline]
    pub(crate) fn read(&self, addr: u16, mask: u8) -> u8 {
        self.ram[Self::index(addr)] & mask
    }

    #[inline]
    pub(crate) fn write(&mut self, addr: u16, value: u8) {
        self.ram[Self::index(addr)] = value & 0x3F;
    }

    /// Background color shown through transparent pixels.
    #[inline]
    pub(crate) fn backdrop(&self, mask: u8) -> u8 {
        self.ram[0] & mask
    }

    pub(crate) fn save_state(&self, w: &mut StateWriter) {
        w.bytes("palette", &self.ram);
    }

    pub(crate) fn load_state(&mut self, r: &StateReader<'_>) -> Result<(), Error> {
        r.bytes("palette", &mut self.ram)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprite_transparent_slots_alias_background() {
        let mut palette = Palette::new();
        palette.write(0x3F10, 0x21);
        assert_eq!(palette.read(0x3F00, 0x3F), 0x21);
        palette.write(0x3F0C, 0x05);
        assert_eq!(palette.read(0x3F1C, 0x3F), 0x05);

        // Non-zero slots stay separate.
        palette.write(0x3F11, 0x16);
        assert_eq!(palette.read(0x3F01, 0x3F), 0x00);
    }

    #[test]
    fn writes_keep_six_bits_and_mirror_every_32() {
        let mut palette = Palette::new();
        palette.write(0x3FE3, 0xFF);
        assert_eq!(palette.read(0x3F03, 0x3F), 0x3F);
        assert_eq!(palette.read(0x3F03, 0x30), 0x30);
    }
}
