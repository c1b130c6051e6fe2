use thiserror::Error;

/// Errors surfaced by the picture unit's host-facing surfaces.
///
/// Emulation itself never fails: register accesses and frame stepping are
/// infallible. Only savestate restoration and configuration parsing can
/// reject their input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A field required by the active layout was not present in the blob.
    #[error("savestate field `{0}` is missing")]
    MissingField(&'static str),

    /// A field was present but carried the wrong number of bytes.
    #[error("savestate field `{name}` expected {expected} bytes, got {actual}")]
    FieldSize {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The snapshot was produced by an incompatible layout version.
    #[error("savestate format version {found} is not supported (expected {expected})")]
    FormatVersion { expected: u32, found: u32 },

    /// The snapshot was captured under a different fidelity mode.
    #[error("savestate was captured in {found} mode, unit is running in {expected} mode")]
    FidelityMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Binary encoding or decoding of a savestate blob failed.
    #[error("savestate encoding failed: {0}")]
    Encoding(String),

    /// A region name could not be parsed.
    #[error("unknown region `{0}`")]
    UnknownRegion(String),
}

#[cfg(feature = "savestate-postcard")]
impl From<postcard::Error> for Error {
    fn from(value: postcard::Error) -> Self {
        Self::Encoding(value.to_string())
    }
}
