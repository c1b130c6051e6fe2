#![allow(dead_code)]

use ctor::ctor;
use pixium_core::{ChrBoard, CpuCore, FrameBuffer, Ppu, PpuConfig, RegisterBus};
use sha1::{Digest, Sha1};
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
    let _ = tracing::subscriber::set_global_default(subscriber);
}

pub const NTSC_FRAME: u32 = 262 * 341;
pub const PAL_FRAME: u32 = 312 * 341;

/// Dots per CPU cycle on NTSC; scripts step in whole cycles.
pub const CYCLE: u32 = 3;

/// Register operation issued by a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Write(u16, u8),
    Read(u16),
}

/// A processor that burns time in fixed-size instructions and performs
/// scripted register accesses at given `(frame, dot)` positions.
#[derive(Debug, Clone, Default)]
pub struct ScriptCpu {
    /// Frame the host is stepping; set before each `step_frame`.
    pub frame: u64,
    /// Dots per instruction.
    pub step: u32,
    script: Vec<(u64, u32, Op)>,
    cursor: usize,
    now: u32,
    nmi_latched: bool,
    pub reads: Vec<(u64, u32, u16, u8)>,
    pub nmis: Vec<(u64, u32)>,
}

impl ScriptCpu {
    pub fn new(step: u32) -> Self {
        Self {
            step,
            ..Self::default()
        }
    }

    pub fn with_script(step: u32, mut script: Vec<(u64, u32, Op)>) -> Self {
        script.sort_by_key(|&(frame, dot, _)| (frame, dot));
        Self {
            script,
            ..Self::new(step)
        }
    }
}

impl CpuCore for ScriptCpu {
    fn run(&mut self, bus: &mut RegisterBus<'_>) {
        while bus.remaining() > 0 {
            self.now = bus.now();
            // Interrupts are taken at instruction boundaries.
            let raised = bus.take_nmi();
            if core::mem::take(&mut self.nmi_latched) || raised {
                self.nmis.push((self.frame, self.now));
            }
            while let Some(&(frame, dot, op)) = self.script.get(self.cursor)
                && (frame, dot) <= (self.frame, self.now)
            {
                match op {
                    Op::Write(addr, value) => bus.write(addr, value),
                    Op::Read(addr) => {
                        let value = bus.read(addr);
                        self.reads.push((self.frame, self.now, addr, value));
                    }
                }
                self.cursor += 1;
            }
            bus.step(self.step);
        }
    }

    fn trigger_nmi(&mut self) {
        self.nmi_latched = true;
    }
}

/// Counts every dot it is given, one dot at a time.
#[derive(Debug, Default)]
pub struct CountingCpu {
    pub dots: u64,
}

impl CpuCore for CountingCpu {
    fn run(&mut self, bus: &mut RegisterBus<'_>) {
        while bus.remaining() > 0 {
            bus.step(1);
            self.dots += 1;
        }
    }

    fn trigger_nmi(&mut self) {}
}

/// A unit with 8 KiB of zeroed pattern RAM attached.
pub fn unit(config: PpuConfig) -> Ppu {
    let mut ppu = Ppu::new(config);
    ppu.attach_cartridge(Box::new(ChrBoard::ram(0x2000)));
    ppu
}

/// Runs the two dead frames that follow power-on.
pub fn warm_up(ppu: &mut Ppu, cpu: &mut ScriptCpu) {
    for _ in 0..2 {
        ppu.step_frame(cpu, false);
        cpu.frame += 1;
    }
}

pub fn write_vram(ppu: &mut Ppu, addr: u16, bytes: &[u8]) {
    ppu.write_register(0x2006, (addr >> 8) as u8);
    ppu.write_register(0x2006, addr as u8);
    for &byte in bytes {
        ppu.write_register(0x2007, byte);
    }
}

/// Tile whose every pixel has color `color` (1..=3).
pub fn solid_tile(ppu: &mut Ppu, table: u16, tile: u8, color: u8) {
    let low = if color & 1 != 0 { 0xFF } else { 0x00 };
    let high = if color & 2 != 0 { 0xFF } else { 0x00 };
    let mut bytes = [low; 16];
    bytes[8..].fill(high);
    write_vram(ppu, table + u16::from(tile) * 16, &bytes);
}

pub fn fill_nametable(ppu: &mut Ppu, tile: u8) {
    write_vram(ppu, 0x2000, &[tile; 0x3C0]);
    write_vram(ppu, 0x23C0, &[0; 0x40]);
}

pub fn set_palette(ppu: &mut Ppu, palette: &[u8; 32]) {
    write_vram(ppu, 0x3F00, palette);
}

/// Loads sprites `0..sprites.len()`; the rest sit below the picture.
pub fn load_oam(ppu: &mut Ppu, sprites: &[[u8; 4]]) {
    let mut page = [0xFF; 256];
    for (chunk, sprite) in page.chunks_exact_mut(4).zip(sprites) {
        chunk.copy_from_slice(sprite);
    }
    ppu.write_register(0x2003, 0);
    ppu.oam_dma(&page);
}

/// Points the scroll at the top-left of nametable 0 with `control` in `$2000`.
pub fn reset_scroll(ppu: &mut Ppu, control: u8) {
    ppu.write_register(0x2000, control & !0b11);
    ppu.read_register(0x2002);
    ppu.write_register(0x2005, 0);
    ppu.write_register(0x2005, 0);
}

pub fn frame_hash(fb: &FrameBuffer) -> String {
    let mut hasher = Sha1::new();
    hasher.update(fb.render());
    hasher.update(fb.emphasis());
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
