use crate::{
    error::Error,
    state::{StateReader, StateWriter},
};

/// Frames a bit may go unrefreshed before it decays to 0.
const DECAY_FRAMES: u32 = 3;

/// Register-side latch returned by write-only registers.
///
/// Every register write drives all eight bits. When decay is enabled, bits
/// that are not refreshed for more than a few frames read back as 0; the
/// frame counter is the time base.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PpuOpenBus {
    value: u8,
    decay_stamp: [u32; 8],
    decay: bool,
}

impl PpuOpenBus {
    pub(crate) fn new(decay: bool) -> Self {
        Self {
            value: 0,
            decay_stamp: [0; 8],
            decay,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.value = 0;
        self.decay_stamp = [0; 8];
    }

    pub(crate) fn set_decay(&mut self, decay: bool) {
        self.decay = decay;
    }

    /// Drives the bits selected by `mask` with `value`; the others keep
    /// their latched level unless they have decayed.
    pub(crate) fn set(&mut self, mask: u8, value: u8, frame: u32) {
        let mut next = 0u8;
        for bit in 0..8 {
            let select = 1u8 << bit;
            if mask & select != 0 {
                next |= value & select;
                self.decay_stamp[bit] = frame;
            } else if !self.decay || frame.wrapping_sub(self.decay_stamp[bit]) <= DECAY_FRAMES {
                next |= self.value & select;
            }
        }
        self.value = next;
    }

    /// Returns `value` with the `mask`ed bits taken from the latch, and
    /// refreshes the latch with the driven bits.
    pub(crate) fn apply(&mut self, mask: u8, value: u8, frame: u32) -> u8 {
        self.set(!mask, value, frame);
        (value & !mask) | (self.value & mask)
    }

    /// Returns the latched value, applying decay for reads of write-only
    /// registers.
    pub(crate) fn sample(&mut self, frame: u32) -> u8 {
        self.set(0, 0, frame);
        self.value
    }

    pub(crate) fn save_state(&self, w: &mut StateWriter) {
        w.u8("open_bus", self.value);
        let mut stamps = [0u8; 32];
        for (chunk, stamp) in stamps.chunks_exact_mut(4).zip(self.decay_stamp) {
            chunk.copy_from_slice(&stamp.to_le_bytes());
        }
        w.bytes("open_bus_decay", &stamps);
    }

    pub(crate) fn load_state(&mut self, r: &StateReader<'_>) -> Result<(), Error> {
        self.value = r.u8("open_bus")?;
        let mut stamps = [0u8; 32];
        r.bytes("open_bus_decay", &mut stamps)?;
        for (stamp, chunk) in self.decay_stamp.iter_mut().zip(stamps.chunks_exact(4)) {
            *stamp = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_write_drives_every_bit() {
        let mut bus = PpuOpenBus::new(true);
        bus.set(0xFF, 0xA5, 0);
        assert_eq!(bus.sample(1), 0xA5);
    }

    #[test]
    fn apply_merges_latched_bits() {
        let mut bus = PpuOpenBus::new(false);
        bus.set(0xFF, 0x1F, 0);
        assert_eq!(bus.apply(0x1F, 0x80, 0), 0x9F);
    }

    #[test]
    fn undriven_bits_decay_only_when_enabled() {
        let mut decaying = PpuOpenBus::new(true);
        decaying.set(0xFF, 0xFF, 10);
        assert_eq!(decaying.sample(13), 0xFF);
        assert_eq!(decaying.sample(14), 0x00);

        let mut held = PpuOpenBus::new(false);
        held.set(0xFF, 0xFF, 10);
        assert_eq!(held.sample(1000), 0xFF);
    }
}
