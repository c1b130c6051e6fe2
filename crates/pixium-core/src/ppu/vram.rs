use super::palette::Palette;
use crate::{
    cartridge::{Capabilities, Cartridge, Mirroring, NametableTarget},
    error::Error,
    mem_block::ppu::NametableRam,
    memory::ppu as ppu_mem,
    state::{StateReader, StateWriter},
};

/// The unit's 14-bit address space: cartridge pattern tables, internal
/// nametable RAM folded by the cartridge wiring, and palette RAM.
///
/// Rendering fetches go through [`fetch`](Self::fetch), which also reports
/// the address to boards that watch the bus. Debug reads go through
/// [`peek`](Self::peek), which neither reports the address nor clocks
/// read-triggered board state.
#[derive(Debug, Clone)]
pub(crate) struct Vram {
    pub(crate) nametables: NametableRam,
    pub(crate) palette: Palette,
    cartridge: Option<Box<dyn Cartridge>>,
    capabilities: Capabilities,
}

impl Default for Vram {
    fn default() -> Self {
        Self::new()
    }
}

impl Vram {
    pub(crate) fn new() -> Self {
        Self {
            nametables: NametableRam::new(),
            palette: Palette::new(),
            cartridge: None,
            capabilities: Capabilities::empty(),
        }
    }

    pub(crate) fn clear_memories(&mut self) {
        self.nametables = NametableRam::new();
        self.palette = Palette::new();
    }

    /// Installs `cartridge`, returning the previous one.
    pub(crate) fn attach(&mut self, cartridge: Box<dyn Cartridge>) -> Option<Box<dyn Cartridge>> {
        self.capabilities = cartridge.capabilities();
        self.cartridge.replace(cartridge)
    }

    pub(crate) fn detach(&mut self) -> Option<Box<dyn Cartridge>> {
        self.capabilities = Capabilities::empty();
        self.cartridge.take()
    }

    pub(crate) fn has_cartridge(&self) -> bool {
        self.cartridge.is_some()
    }

    pub(crate) fn cartridge_mut(&mut self) -> Option<&mut (dyn Cartridge + 'static)> {
        self.cartridge.as_deref_mut()
    }

    #[inline]
    fn map_nametable(&self, addr: u16) -> NametableTarget {
        self.cartridge
            .as_deref()
            .map_or(Mirroring::Horizontal.target(addr), |cart| cart.map_nametable(addr))
    }

    #[inline]
    fn read_nametable(&self, addr: u16) -> u8 {
        match self.map_nametable(addr) {
            NametableTarget::Ciram(offset) => self.nametables[usize::from(offset & 0x07FF)],
            NametableTarget::Cartridge(offset) => self
                .cartridge
                .as_deref()
                .map_or(0, |cart| cart.read_nametable(offset)),
        }
    }

    /// Reports a VRAM-facing address to boards that asked for it.
    #[inline]
    pub(crate) fn observe(&mut self, addr: u16) {
        if self.capabilities.contains(Capabilities::OBSERVES_ADDRESSES)
            && let Some(cart) = self.cartridge.as_deref_mut()
        {
            cart.on_address_observed(addr & ppu_mem::VRAM_MIRROR_MASK);
        }
    }

    /// Rendering fetch: observed, then read.
    #[inline]
    pub(crate) fn fetch(&mut self, addr: u16) -> u8 {
        self.observe(addr);
        self.read(addr)
    }

    /// Bus read without reporting the address. Pattern reads reach the
    /// board's read latches. Palette entries come back unmasked.
    pub(crate) fn read(&mut self, addr: u16) -> u8 {
        let addr = addr & ppu_mem::VRAM_MIRROR_MASK;
        match addr {
            0x0000..ppu_mem::PATTERN_SPACE_END => self
                .cartridge
                .as_deref_mut()
                .map_or(0, |cart| cart.read_pattern(addr)),
            _ => self.peek(addr),
        }
    }

    /// Side-effect-free read.
    pub(crate) fn peek(&self, addr: u16) -> u8 {
        let addr = addr & ppu_mem::VRAM_MIRROR_MASK;
        match addr {
            0x0000..ppu_mem::PATTERN_SPACE_END => self
                .cartridge
                .as_deref()
                .map_or(0, |cart| cart.peek_pattern(addr)),
            ppu_mem::PALETTE_BASE.. => self.palette.read(addr, 0x3F),
            _ => self.read_nametable(addr),
        }
    }

    pub(crate) fn write(&mut self, addr: u16, value: u8) {
        let addr = addr & ppu_mem::VRAM_MIRROR_MASK;
        match addr {
            0x0000..ppu_mem::PATTERN_SPACE_END => {
                if let Some(cart) = self.cartridge.as_deref_mut()
                    && cart.pattern_writable(addr)
                {
                    cart.write_pattern(addr, value);
                }
            }
            ppu_mem::PALETTE_BASE.. => self.palette.write(addr, value),
            _ => match self.map_nametable(addr) {
                NametableTarget::Ciram(offset) => {
                    self.nametables[usize::from(offset & 0x07FF)] = value;
                }
                NametableTarget::Cartridge(offset) => {
                    if let Some(cart) = self.cartridge.as_deref_mut() {
                        cart.write_nametable(offset, value);
                    }
                }
            },
        }
    }

    pub(crate) fn scanline_hook(&mut self, scanline: u16) {
        if self.capabilities.contains(Capabilities::SCANLINE_HOOK)
            && let Some(cart) = self.cartridge.as_deref_mut()
        {
            cart.on_scanline(scanline);
        }
    }

    pub(crate) fn late_scanline_hook(&mut self, scanline: u16) {
        if self.capabilities.contains(Capabilities::SCANLINE_HOOK_LATE)
            && let Some(cart) = self.cartridge.as_deref_mut()
        {
            cart.on_scanline_late(scanline);
        }
    }

    pub(crate) fn save_state(&self, w: &mut StateWriter) {
        w.bytes("nametables", &self.nametables);
        self.palette.save_state(w);
    }

    pub(crate) fn load_state(&mut self, r: &StateReader<'_>) -> Result<(), Error> {
        r.bytes("nametables", &mut self.nametables)?;
        self.palette.load_state(r)
    }
}
