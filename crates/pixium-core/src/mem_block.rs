//! Fixed-size memory blocks owned by the picture unit.
//!
//! `MemBlock` is a thin wrapper over `[T; N]` that can be moved to the heap
//! with the `boxed-memblock` feature. Savestates and clones copy it by value,
//! so every unit instance owns its memories outright.

use core::ops::{Deref, DerefMut};

#[cfg(feature = "boxed-memblock")]
type MemBlockStorage<T, const N: usize> = Box<[T; N]>;

#[cfg(not(feature = "boxed-memblock"))]
type MemBlockStorage<T, const N: usize> = [T; N];

#[repr(transparent)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemBlock<T, const N: usize>(MemBlockStorage<T, N>);

pub mod ppu {
    use crate::memory::ppu as ppu_mem;

    /// The two internal 1 KiB nametable pages.
    pub type NametableRam = super::MemBlock<u8, { ppu_mem::NAMETABLE_RAM_SIZE }>;
    /// Raw palette storage (32 entries, 6 bits each).
    pub type PaletteRam = super::MemBlock<u8, { ppu_mem::PALETTE_RAM_SIZE }>;
    /// Primary object memory.
    pub type OamRam = super::MemBlock<u8, { ppu_mem::OAM_RAM_SIZE }>;
    /// Secondary object memory filled by sprite evaluation.
    pub type SecondaryOamRam = super::MemBlock<u8, { ppu_mem::SECONDARY_OAM_RAM_SIZE }>;
}

impl<T, const N: usize> MemBlock<T, N> {
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        #[cfg(feature = "boxed-memblock")]
        {
            &*self.0
        }
        #[cfg(not(feature = "boxed-memblock"))]
        {
            &self.0
        }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        #[cfg(feature = "boxed-memblock")]
        {
            &mut *self.0
        }
        #[cfg(not(feature = "boxed-memblock"))]
        {
            &mut self.0
        }
    }
}

impl<T: Copy + Default, const N: usize> MemBlock<T, N> {
    pub fn new() -> Self {
        Self::filled(T::default())
    }
}

impl<T: Copy, const N: usize> MemBlock<T, N> {
    /// Create a `MemBlock` where every element is initialized to `value`.
    #[inline]
    pub fn filled(value: T) -> Self {
        #[cfg(feature = "boxed-memblock")]
        {
            Self(Box::new([value; N]))
        }
        #[cfg(not(feature = "boxed-memblock"))]
        {
            Self([value; N])
        }
    }
}

impl<T: Copy + Default, const N: usize> Default for MemBlock<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Deref for MemBlock<T, N> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T, const N: usize> DerefMut for MemBlock<T, N> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

#[cfg(not(feature = "boxed-memblock"))]
impl<T: Copy, const N: usize> Copy for MemBlock<T, N> {}
