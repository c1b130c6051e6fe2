//! A cycle-accurate NES picture unit.
//!
//! [`Ppu`] owns the register file, video memories, rendering pipelines and a
//! frame engine. A host drives it one frame at a time with
//! [`Ppu::step_frame`], supplying a processor through [`CpuCore`] and a
//! board through [`Cartridge`]. The finished picture is read from
//! [`Ppu::framebuffer`] as 6-bit color indices tagged with an emphasis class.

pub mod cartridge;
pub mod config;
pub mod cpu;
pub mod error;
pub mod mem_block;
pub mod memory;
pub mod ppu;
pub mod reset_kind;
pub mod state;

pub use cartridge::{Capabilities, Cartridge, ChrBoard, Mirroring, NametableTarget};
pub use config::{Fidelity, OverclockConfig, PpuConfig, Region};
pub use cpu::{CpuCore, RegisterBus};
pub use error::Error;
pub use ppu::{FrameBuffer, Ppu};
pub use reset_kind::ResetKind;
pub use state::{StateBlob, StateField};

#[cfg(test)]
mod tests {
    use ctor::ctor;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    #[ctor]
    fn init_tracing() {
        let subscriber = FmtSubscriber::builder()
            .with_file(true)
            .with_line_number(true)
            .with_max_level(Level::DEBUG)
            .pretty()
            .finish();
        tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
    }
}
