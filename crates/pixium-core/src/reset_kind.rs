/// How the unit is brought back to a known state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResetKind {
    /// Cold boot: memories and registers are cleared.
    PowerOn,
    /// Reset button: registers return to reset values, memories are kept.
    Soft,
}
