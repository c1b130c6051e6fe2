//! Minimal CHR-only board.
//!
//! `ChrBoard` exposes either CHR ROM or CHR RAM to the picture unit through
//! eight 1 KiB bank slots, with software-selectable nametable wiring. It is
//! enough to host simple boards directly and serves as the reference
//! [`Cartridge`] implementation for tests and tools.
//!
//! With [`Mirroring::FourScreen`] the board carries the extra 2 KiB of
//! nametable RAM for the upper two tables.

use super::{Cartridge, Mirroring};

const BANK_SIZE: usize = 0x0400;
const BANK_SLOTS: usize = 8;
const FOUR_SCREEN_RAM_SIZE: usize = 0x0800;

/// Backing storage of pattern data.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChrStorage {
    Rom(Box<[u8]>),
    Ram(Box<[u8]>),
}

impl ChrStorage {
    fn bytes(&self) -> &[u8] {
        match self {
            ChrStorage::Rom(data) | ChrStorage::Ram(data) => data,
        }
    }
}

/// CHR ROM/RAM board with 1 KiB banking.
#[derive(Debug, Clone)]
pub struct ChrBoard {
    chr: ChrStorage,
    /// Bank number mapped into each 1 KiB slot of `$0000-$1FFF`.
    banks: [usize; BANK_SLOTS],
    mirroring: Mirroring,
    /// Upper two nametables; empty unless four-screen wiring was selected.
    nametables: Vec<u8>,
}

impl ChrBoard {
    /// Board backed by read-only pattern data.
    pub fn rom(data: impl Into<Box<[u8]>>) -> Self {
        Self::with_storage(ChrStorage::Rom(data.into()))
    }

    /// Board backed by `size` bytes of zeroed pattern RAM.
    pub fn ram(size: usize) -> Self {
        Self::with_storage(ChrStorage::Ram(vec![0; size.max(BANK_SIZE)].into_boxed_slice()))
    }

    fn with_storage(chr: ChrStorage) -> Self {
        Self {
            chr,
            banks: core::array::from_fn(|slot| slot),
            mirroring: Mirroring::Horizontal,
            nametables: Vec::new(),
        }
    }

    pub fn with_mirroring(mut self, mirroring: Mirroring) -> Self {
        self.set_mirroring(mirroring);
        self
    }

    /// Selects the wiring. The four-screen RAM is allocated on first use
    /// and kept afterwards.
    pub fn set_mirroring(&mut self, mirroring: Mirroring) {
        if mirroring == Mirroring::FourScreen && self.nametables.is_empty() {
            self.nametables = vec![0; FOUR_SCREEN_RAM_SIZE];
        }
        self.mirroring = mirroring;
    }

    /// Maps 1 KiB `bank` into `slot` (0..8). Out-of-range banks wrap.
    pub fn set_chr_bank(&mut self, slot: usize, bank: usize) {
        self.banks[slot % BANK_SLOTS] = bank;
    }

    /// Raw pattern storage.
    pub fn chr(&self) -> &[u8] {
        self.chr.bytes()
    }

    /// Mutable pattern storage when the board carries RAM.
    pub fn chr_ram_mut(&mut self) -> Option<&mut [u8]> {
        match &mut self.chr {
            ChrStorage::Ram(data) => Some(data),
            ChrStorage::Rom(_) => None,
        }
    }

    #[inline]
    fn offset(&self, addr: u16) -> usize {
        let addr = (addr & 0x1FFF) as usize;
        let len = self.chr.bytes().len().max(1);
        (self.banks[addr / BANK_SIZE] * BANK_SIZE + (addr % BANK_SIZE)) % len
    }
}

impl Cartridge for ChrBoard {
    fn read_pattern(&mut self, addr: u16) -> u8 {
        self.peek_pattern(addr)
    }

    fn peek_pattern(&self, addr: u16) -> u8 {
        let bytes = self.chr.bytes();
        if bytes.is_empty() {
            return 0;
        }
        bytes[self.offset(addr)]
    }

    fn write_pattern(&mut self, addr: u16, value: u8) {
        let offset = self.offset(addr);
        if let ChrStorage::Ram(data) = &mut self.chr
            && let Some(slot) = data.get_mut(offset)
        {
            *slot = value;
        }
    }

    fn pattern_writable(&self, _addr: u16) -> bool {
        matches!(self.chr, ChrStorage::Ram(_))
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn read_nametable(&self, offset: u16) -> u8 {
        self.nametables.get(usize::from(offset)).copied().unwrap_or(0)
    }

    fn write_nametable(&mut self, offset: u16, value: u8) {
        if let Some(slot) = self.nametables.get_mut(usize::from(offset)) {
            *slot = value;
        }
    }
}
