use crate::{
    error::Error,
    ppu::{Ppu, STATE_FORMAT_VERSION},
    state::{SaveState, Snapshot, SnapshotMeta, StateBlob},
};

/// Snapshots of the picture unit carry its flat field list.
///
/// Deltas are full blobs; the unit's state is small enough that diffing
/// would not pay for itself.
impl SaveState for Ppu {
    type Full = StateBlob;
    type Delta = StateBlob;
    type Error = Error;
    type Meta = SnapshotMeta;

    const FORMAT_VERSION: u32 = STATE_FORMAT_VERSION;

    fn save_full(&self, mut meta: Self::Meta) -> Result<Snapshot<Self::Full, Self::Meta>, Self::Error> {
        meta.format_version = Self::FORMAT_VERSION;
        meta.tick = self.frame_count();
        Ok(Snapshot {
            meta,
            data: self.save_state(),
        })
    }

    fn load_full(&mut self, snapshot: &Snapshot<Self::Full, Self::Meta>) -> Result<(), Self::Error> {
        if snapshot.meta.format_version != Self::FORMAT_VERSION {
            return Err(Error::FormatVersion {
                expected: Self::FORMAT_VERSION,
                found: snapshot.meta.format_version,
            });
        }
        self.load_state(&snapshot.data)
    }
}
