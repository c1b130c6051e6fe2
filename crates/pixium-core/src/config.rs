//! Host-supplied configuration consumed by the picture unit.

pub mod region;

pub use region::Region;

/// Which frame driver steps the unit.
///
/// Both drivers share every register, counter and memory; only the way time
/// is sliced between the CPU and the fetch pipeline differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Fidelity {
    /// Runs the CPU for whole line segments and catches rendering up lazily
    /// whenever the CPU touches a register.
    LineBatched,
    /// Interleaves CPU time with every fetch at dot granularity.
    #[default]
    PerDot,
}

impl Fidelity {
    pub const fn name(self) -> &'static str {
        match self {
            Fidelity::LineBatched => "line-batched",
            Fidelity::PerDot => "per-dot",
        }
    }
}

/// Extra non-visible scanlines inserted to give the CPU more time per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OverclockConfig {
    pub enabled: bool,
    /// Lines added at the end of vblank, before pre-render.
    pub vblank_lines: u16,
    /// Lines added after the post-render line(s).
    pub postrender_lines: u16,
    /// Refuse to overclock across raw 7-bit PCM playback.
    pub skip_raw_pcm: bool,
}

/// Runtime configuration of a [`Ppu`](crate::ppu::Ppu).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PpuConfig {
    pub region: Region,
    pub fidelity: Fidelity,
    /// Hardware limit of eight sprites per line. When off, every in-range
    /// sprite is drawn (overflow detection is unaffected).
    pub sprite_limit: bool,
    /// Debug toggle: draw the background plane.
    pub render_background: bool,
    /// Debug toggle: draw the sprite plane.
    pub render_sprites: bool,
    /// Color index shown instead of palette entry 0 wherever the backdrop
    /// shows through.
    pub backdrop_override: Option<u8>,
    pub overclock: OverclockConfig,
    /// Let undriven bits of the register latch decay after a few frames.
    pub open_bus_decay: bool,
}

impl Default for PpuConfig {
    fn default() -> Self {
        Self {
            region: Region::Ntsc,
            fidelity: Fidelity::PerDot,
            sprite_limit: true,
            render_background: true,
            render_sprites: true,
            backdrop_override: None,
            overclock: OverclockConfig::default(),
            open_bus_decay: false,
        }
    }
}

impl PpuConfig {
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    pub fn with_fidelity(mut self, fidelity: Fidelity) -> Self {
        self.fidelity = fidelity;
        self
    }

    pub fn with_sprite_limit(mut self, enabled: bool) -> Self {
        self.sprite_limit = enabled;
        self
    }

    pub fn with_backdrop_override(mut self, color: Option<u8>) -> Self {
        self.backdrop_override = color;
        self
    }

    pub fn with_overclock(mut self, overclock: OverclockConfig) -> Self {
        self.overclock = overclock;
        self
    }
}
