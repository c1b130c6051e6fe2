//! Save/load interfaces and the flat field list the picture unit registers
//! its state against.
//!
//! Components describe their state as an ordered list of named byte fields.
//! [`StateWriter`] collects those fields into a [`StateBlob`];
//! [`StateReader`] hands them back by name on restore. The order in which a
//! component writes its fields is its layout, so adding a field at the end
//! never moves an existing one.

pub mod ppu;

#[cfg(feature = "savestate-serde")]
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Common metadata attached to full/delta snapshots to aid compatibility checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotMeta {
    /// Version of the snapshot payload (per component).
    pub format_version: u32,
    /// Identifier of the baseline full snapshot this delta depends on.
    pub baseline_id: u64,
    /// Global tick/frame counter when this snapshot was captured.
    pub tick: u64,
}

impl Default for SnapshotMeta {
    fn default() -> Self {
        Self {
            format_version: 1,
            baseline_id: 0,
            tick: 0,
        }
    }
}

/// Simple wrapper bundling snapshot metadata with payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<T, M = SnapshotMeta> {
    pub meta: M,
    pub data: T,
}

/// Minimal save/load contract with full and incremental variants.
pub trait SaveState {
    type Full;
    type Delta;
    type Error;
    type Meta: Clone;

    /// Optional format/version tag. Implementers can bump this when changing
    /// the snapshot layout to let callers reject incompatible data.
    const FORMAT_VERSION: u32 = 1;

    /// Capture a full snapshot of the component state.
    fn save_full(&self, meta: Self::Meta) -> Result<Snapshot<Self::Full, Self::Meta>, Self::Error>;

    /// Capture an incremental snapshot relative to a previously captured full
    /// snapshot.
    ///
    /// Default: fall back to a full snapshot when `Delta` can be constructed
    /// from `Full`.
    fn save_delta(
        &self,
        baseline: &Snapshot<Self::Full, Self::Meta>,
    ) -> Result<Snapshot<Self::Delta, Self::Meta>, Self::Error>
    where
        Self::Delta: From<Self::Full>,
    {
        let meta = baseline.meta.clone();
        self.save_full(meta).map(|snap| Snapshot {
            meta: snap.meta,
            data: Self::Delta::from(snap.data),
        })
    }

    /// Restore the component from a full snapshot.
    fn load_full(&mut self, snapshot: &Snapshot<Self::Full, Self::Meta>)
    -> Result<(), Self::Error>;

    /// Apply an incremental snapshot.
    ///
    /// Default: convert the delta back into a full snapshot when possible.
    fn load_delta(&mut self, delta: &Snapshot<Self::Delta, Self::Meta>) -> Result<(), Self::Error>
    where
        Self::Delta: Clone + Into<Self::Full>,
    {
        let full: Self::Full = delta.data.clone().into();
        self.load_full(&Snapshot {
            meta: delta.meta.clone(),
            data: full,
        })
    }
}

/// One entry of a component's flat state layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateField {
    pub name: &'static str,
    /// Field size in bytes.
    pub size: usize,
    /// Byte offset of the field in the concatenated image.
    pub offset: usize,
}

/// A named field inside a [`StateBlob`].
#[cfg_attr(feature = "savestate-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Serialized state: the ordered field list plus the header needed to
/// reject incompatible input.
#[cfg_attr(feature = "savestate-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StateBlob {
    pub format_version: u32,
    /// Whether the per-dot extension list follows the baseline list.
    pub extended: bool,
    pub fields: Vec<StateEntry>,
}

impl StateBlob {
    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&[u8]> {
        self.fields
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.bytes.as_slice())
    }

    /// Every field concatenated in layout order.
    pub fn image(&self) -> Vec<u8> {
        self.fields
            .iter()
            .flat_map(|entry| entry.bytes.iter().copied())
            .collect()
    }

    /// Compact binary encoding.
    #[cfg(feature = "savestate-postcard")]
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(postcard::to_stdvec(self)?)
    }

    /// Inverse of [`to_bytes`](Self::to_bytes).
    #[cfg(feature = "savestate-postcard")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Ok(postcard::from_bytes(bytes)?)
    }
}

/// Collects named fields in the order they are written.
#[derive(Debug, Default)]
pub(crate) struct StateWriter {
    fields: Vec<StateEntry>,
    layout: Vec<StateField>,
    offset: usize,
}

impl StateWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bytes(&mut self, name: &'static str, bytes: &[u8]) {
        self.layout.push(StateField {
            name,
            size: bytes.len(),
            offset: self.offset,
        });
        self.offset += bytes.len();
        self.fields.push(StateEntry {
            name: name.to_owned(),
            bytes: bytes.to_vec(),
        });
    }

    pub(crate) fn u8(&mut self, name: &'static str, value: u8) {
        self.bytes(name, &[value]);
    }

    pub(crate) fn bool(&mut self, name: &'static str, value: bool) {
        self.bytes(name, &[u8::from(value)]);
    }

    pub(crate) fn u16(&mut self, name: &'static str, value: u16) {
        self.bytes(name, &value.to_le_bytes());
    }

    pub(crate) fn u32(&mut self, name: &'static str, value: u32) {
        self.bytes(name, &value.to_le_bytes());
    }

    pub(crate) fn u64(&mut self, name: &'static str, value: u64) {
        self.bytes(name, &value.to_le_bytes());
    }

    pub(crate) fn i32(&mut self, name: &'static str, value: i32) {
        self.bytes(name, &value.to_le_bytes());
    }

    pub(crate) fn layout(&self) -> &[StateField] {
        &self.layout
    }

    pub(crate) fn finish(self, extended: bool, format_version: u32) -> StateBlob {
        StateBlob {
            format_version,
            extended,
            fields: self.fields,
        }
    }
}

/// Hands fields of a [`StateBlob`] back by name.
#[derive(Debug)]
pub(crate) struct StateReader<'a> {
    blob: &'a StateBlob,
}

impl<'a> StateReader<'a> {
    pub(crate) fn new(blob: &'a StateBlob) -> Self {
        Self { blob }
    }

    pub(crate) fn bytes(&self, name: &'static str, out: &mut [u8]) -> Result<(), Error> {
        let bytes = self.blob.field(name).ok_or(Error::MissingField(name))?;
        if bytes.len() != out.len() {
            return Err(Error::FieldSize {
                name,
                expected: out.len(),
                actual: bytes.len(),
            });
        }
        out.copy_from_slice(bytes);
        Ok(())
    }

    fn array<const N: usize>(&self, name: &'static str) -> Result<[u8; N], Error> {
        let mut out = [0; N];
        self.bytes(name, &mut out)?;
        Ok(out)
    }

    pub(crate) fn u8(&self, name: &'static str) -> Result<u8, Error> {
        self.array::<1>(name).map(|[b]| b)
    }

    pub(crate) fn bool(&self, name: &'static str) -> Result<bool, Error> {
        self.u8(name).map(|b| b != 0)
    }

    pub(crate) fn u16(&self, name: &'static str) -> Result<u16, Error> {
        self.array(name).map(u16::from_le_bytes)
    }

    pub(crate) fn u32(&self, name: &'static str) -> Result<u32, Error> {
        self.array(name).map(u32::from_le_bytes)
    }

    pub(crate) fn u64(&self, name: &'static str) -> Result<u64, Error> {
        self.array(name).map(u64::from_le_bytes)
    }

    pub(crate) fn i32(&self, name: &'static str) -> Result<i32, Error> {
        self.array(name).map(i32::from_le_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_offsets_follow_write_order() {
        let mut w = StateWriter::new();
        w.u8("a", 1);
        w.u16("b", 0x0302);
        w.bytes("c", &[4, 5, 6]);
        let offsets: Vec<_> = w.layout().iter().map(|f| (f.name, f.size, f.offset)).collect();
        assert_eq!(offsets, [("a", 1, 0), ("b", 2, 1), ("c", 3, 3)]);
        let blob = w.finish(false, 1);
        assert_eq!(blob.image(), [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn reader_rejects_missing_and_resized_fields() {
        let mut w = StateWriter::new();
        w.u16("wide", 7);
        let blob = w.finish(false, 1);
        let r = StateReader::new(&blob);
        assert_eq!(r.u16("wide"), Ok(7));
        assert_eq!(r.u8("absent"), Err(Error::MissingField("absent")));
        assert_eq!(
            r.u32("wide"),
            Err(Error::FieldSize {
                name: "wide",
                expected: 4,
                actual: 2
            })
        );
    }

    #[cfg(feature = "savestate-postcard")]
    #[test]
    fn postcard_encoding_preserves_fields() {
        let mut w = StateWriter::new();
        w.u32("frame", 0xDEAD_BEEF);
        w.bool("odd", true);
        let blob = w.finish(true, 1);
        let bytes = blob.to_bytes().unwrap();
        assert_eq!(StateBlob::from_bytes(&bytes).unwrap(), blob);
    }
}
