//! The CPU side of the unit's time base.
//!
//! The unit does not own a processor. A host supplies one through
//! [`CpuCore`]; the frame drivers hand it a [`RegisterBus`] with a time
//! budget and the processor spends that budget, reporting its own time
//! through [`RegisterBus::step`]. Every register access first brings the
//! picture unit up to the processor's current dot, so reads observe the
//! state a real console would show at that moment.

use crate::{cartridge::Cartridge, ppu::Ppu};

/// A processor driven by the frame loop.
///
/// `run` should execute whole instructions until
/// [`RegisterBus::remaining`] reaches zero, polling
/// [`RegisterBus::take_nmi`] at instruction boundaries. Returning without
/// consuming any time is allowed; the driver then treats the slice as idle.
pub trait CpuCore {
    fn run(&mut self, bus: &mut RegisterBus<'_>);

    /// Latches a non-maskable interrupt raised between slices.
    fn trigger_nmi(&mut self);

    /// Whether raw 7-bit PCM samples are being written right now.
    ///
    /// Overclocking stretches wall time between writes, so a guarded
    /// overclock backs off while this holds.
    fn raw_pcm_active(&self) -> bool {
        false
    }

    /// Called once per frame after the last dot.
    fn clear_raw_pcm(&mut self) {}
}

/// Processor access to the picture unit for one time slice.
///
/// Positions are frame-relative dots. The bus never moves the processor's
/// clock on its own; [`step`](Self::step) does.
#[derive(Debug)]
pub struct RegisterBus<'a> {
    ppu: &'a mut Ppu,
    end: u32,
}

impl<'a> RegisterBus<'a> {
    pub(crate) fn new(ppu: &'a mut Ppu, end: u32) -> Self {
        Self { ppu, end }
    }

    /// Reads a register in `$2000-$3FFF`.
    pub fn read(&mut self, addr: u16) -> u8 {
        self.ppu.catch_up();
        self.ppu.read_register(addr)
    }

    /// Writes a register in `$2000-$3FFF`.
    pub fn write(&mut self, addr: u16, value: u8) {
        self.ppu.catch_up();
        self.ppu.write_register(addr, value);
    }

    /// Copies a 256-byte page into sprite memory, starting at the current
    /// OAM address.
    pub fn oam_dma(&mut self, page: &[u8; 256]) {
        self.ppu.catch_up();
        self.ppu.oam_dma(page);
    }

    /// Advances the processor clock by `dots`.
    #[inline]
    pub fn step(&mut self, dots: u32) {
        self.ppu.advance_cpu(dots);
    }

    /// Dots left in this slice; zero once the budget is spent.
    #[inline]
    pub fn remaining(&self) -> u32 {
        self.end.saturating_sub(self.ppu.cpu_time())
    }

    /// Frame-relative dot the processor has reached.
    #[inline]
    pub fn now(&self) -> u32 {
        self.ppu.cpu_time()
    }

    /// Takes a pending interrupt raised during this slice.
    pub fn take_nmi(&mut self) -> bool {
        self.ppu.catch_up();
        self.ppu.take_nmi()
    }

    /// Whether the unit is inside an overclock section at the current dot.
    pub fn is_overclocking(&mut self) -> bool {
        self.ppu.catch_up();
        self.ppu.is_overclocking()
    }

    /// Cartridge access for the CPU-facing half of the board (bank
    /// switching). Rendering is brought up to date first so pattern
    /// changes land on the correct dot.
    pub fn cartridge_mut(&mut self) -> Option<&mut (dyn Cartridge + 'static)> {
        self.ppu.catch_up();
        self.ppu.cartridge_mut()
    }
}
