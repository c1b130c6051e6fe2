//! Picture Processing Unit (PPU).
//!
//! The unit exposes eight CPU-facing registers between `$2000` and `$2007`
//! and produces one 256x240 frame of tagged palette indices per call to
//! [`Ppu::step_frame`]. Internally every visible effect is an event pinned
//! to a `(line, dot)` position; a single engine executes those events in
//! order up to whatever dot the processor has reached. The two fidelity
//! modes only differ in how often the driver hands time to the processor:
//!
//! - [`Fidelity::PerDot`] interleaves one dot of processor time with every
//!   dot of rendering.
//! - [`Fidelity::LineBatched`] runs the processor through whole line
//!   segments and lets register accesses pull rendering forward lazily.
//!
//! Because every access catches the engine up first, the observable result
//! of both modes is the same.
//!
//! A frame starts on the first vblank line. After power-on or reset the
//! first two frames are dead: the processor runs for a full frame but no
//! unit events happen and the picture is a flat backdrop.

pub mod buffer;

mod background_pipeline;
mod compositor;
mod driver;
mod open_bus;
mod palette;
mod registers;
mod render;
mod savestate;
mod sprite;
mod sprite_eval;
mod sprite_line;
mod sprite_pipeline;
mod timing;
mod vram;

pub use buffer::FrameBuffer;
pub use savestate::STATE_FORMAT_VERSION;

use tracing::{debug, trace, warn};

use crate::{
    cartridge::Cartridge,
    config::{Fidelity, PpuConfig},
    cpu::CpuCore,
    memory::ppu::{DOTS_PER_LINE, PALETTE_BASE, REGISTER_BASE, REGISTER_WINDOW_END, Register},
    reset_kind::ResetKind,
};
use background_pipeline::BgPipeline;
use driver::{DotStepper, LineStepper};
use open_bus::PpuOpenBus;
use registers::{Registers, Status};
use sprite_eval::SpriteEvaluator;
use sprite_pipeline::{SpriteRenderer, SpriteSet};
use timing::{FramePlan, LineKind, Position};
use vram::Vram;

/// Frames after power-on or reset during which the unit ignores rendering.
const WARMUP_FRAMES: u8 = 2;

/// The picture unit: registers, memories, rendering pipelines and the frame
/// engine that advances them.
#[derive(Debug, Clone)]
pub struct Ppu {
    config: PpuConfig,
    registers: Registers,
    open_bus: PpuOpenBus,
    vram: Vram,
    bg: BgPipeline,
    evaluator: SpriteEvaluator,
    /// Sprites fetched during dots 257..=320 for the next line.
    next_sprites: SpriteSet,
    /// Low pattern byte of the sprite slot being fetched.
    sprite_fetch_low: u8,
    sprites: SpriteRenderer,
    framebuffer: FrameBuffer,

    plan: FramePlan,
    /// Next dot the engine will execute.
    pos: Position,
    /// Length of this frame's pre-render line, decided on its dot 338.
    prerender_len: u16,
    /// Processor clock in frame-relative dots. Carries over the end of a
    /// frame as debt.
    cpu_time: u32,
    frame_count: u64,
    /// Whether the frame being produced is an odd one.
    odd_frame: bool,
    /// Remaining dead frames.
    warmup: u8,
    /// Whether the current frame runs unit events.
    live: bool,
    /// NMI raised but not yet handed to the processor.
    nmi_pending: bool,
    /// Whether the current vblank already produced its NMI.
    nmi_delivered: bool,
    /// The host will not display this frame; pixels are not stored.
    render_skipped: bool,
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new(PpuConfig::default())
    }
}

impl Ppu {
    /// Creates a powered-on unit with no cartridge.
    pub fn new(config: PpuConfig) -> Self {
        let mut ppu = Self {
            config,
            registers: Registers::new(),
            open_bus: PpuOpenBus::new(config.open_bus_decay),
            vram: Vram::new(),
            bg: BgPipeline::new(),
            evaluator: SpriteEvaluator::new(),
            next_sprites: SpriteSet::default(),
            sprite_fetch_low: 0,
            sprites: SpriteRenderer::new(config.fidelity),
            framebuffer: FrameBuffer::new(),
            plan: FramePlan::new(config.region),
            pos: Position::default(),
            prerender_len: DOTS_PER_LINE,
            cpu_time: 0,
            frame_count: 0,
            odd_frame: true,
            warmup: WARMUP_FRAMES,
            live: false,
            nmi_pending: false,
            nmi_delivered: false,
            render_skipped: false,
        };
        ppu.power_on();
        ppu
    }

    pub fn config(&self) -> &PpuConfig {
        &self.config
    }

    /// Replaces the configuration. Call between frames; a region change
    /// applies from the next frame on. The fidelity is fixed at
    /// construction and a different one is ignored.
    pub fn set_config(&mut self, mut config: PpuConfig) {
        if config.fidelity != self.config.fidelity {
            warn!(
                current = self.config.fidelity.name(),
                requested = config.fidelity.name(),
                "fidelity is fixed at construction, keeping the current one"
            );
            config.fidelity = self.config.fidelity;
        }
        self.open_bus.set_decay(config.open_bus_decay);
        let region_changed = config.region != self.config.region;
        self.config = config;
        if region_changed {
            debug!("region changed to {}", config.region);
            self.rewind();
        }
    }

    /// Cold boot: memories and registers are cleared.
    pub fn power_on(&mut self) {
        self.registers = Registers::new();
        self.vram.clear_memories();
        self.frame_count = 0;
        self.restart();
        debug!("ppu powered on ({})", self.config.region);
    }

    pub fn reset(&mut self, kind: ResetKind) {
        match kind {
            ResetKind::PowerOn => self.power_on(),
            ResetKind::Soft => {
                self.registers.soft_reset();
                self.restart();
                debug!("ppu soft reset");
            }
        }
    }

    /// State shared by both reset kinds: pipelines, timing and interrupt
    /// bookkeeping start over with a fresh warmup.
    fn restart(&mut self) {
        self.open_bus.reset();
        self.bg.clear();
        self.evaluator = SpriteEvaluator::new();
        self.next_sprites.clear();
        self.sprite_fetch_low = 0;
        self.sprites.clear();
        self.framebuffer.clear();
        self.cpu_time = 0;
        self.odd_frame = true;
        self.warmup = WARMUP_FRAMES;
        self.nmi_pending = false;
        self.nmi_delivered = false;
        self.rewind();
    }

    /// Points the engine at the first dot of a fresh frame.
    fn rewind(&mut self) {
        self.plan = FramePlan::new(self.config.region);
        self.pos = Position::default();
        self.prerender_len = DOTS_PER_LINE;
        self.live = self.warmup == 0;
    }

    /// Installs a cartridge, returning the one it replaces.
    pub fn attach_cartridge(&mut self, cartridge: Box<dyn Cartridge>) -> Option<Box<dyn Cartridge>> {
        debug!(
            mirroring = ?cartridge.mirroring(),
            capabilities = ?cartridge.capabilities(),
            "cartridge attached"
        );
        self.vram.attach(cartridge)
    }

    pub fn detach_cartridge(&mut self) -> Option<Box<dyn Cartridge>> {
        debug!("cartridge detached");
        self.vram.detach()
    }

    pub fn cartridge_mut(&mut self) -> Option<&mut (dyn Cartridge + 'static)> {
        self.vram.cartridge_mut()
    }

    /// Produces one frame, running `cpu` for the frame's worth of time.
    ///
    /// With `render_skipped` the frame is emulated in full but no pixels
    /// are stored and the front buffer keeps the previous picture.
    pub fn step_frame<C: CpuCore + ?Sized>(&mut self, cpu: &mut C, render_skipped: bool) {
        debug_assert!(
            !self.live || self.vram.has_cartridge(),
            "stepping a live frame without a cartridge"
        );
        self.render_skipped = render_skipped;
        match self.config.fidelity {
            Fidelity::PerDot => driver::run_frame::<DotStepper, C>(self, cpu),
            Fidelity::LineBatched => driver::run_frame::<LineStepper, C>(self, cpu),
        }
    }

    /// The double-buffered picture. The front plane holds the last
    /// completed frame.
    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    /// Reported scanline of the next dot. Overclock lines report the line
    /// before them.
    pub fn scanline(&self) -> u16 {
        self.plan
            .line(self.pos.line_index)
            .map_or(self.plan.region.vblank_start_line(), |(_, scanline)| scanline)
    }

    pub fn dot(&self) -> u16 {
        self.pos.dot
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Whether the last executed dot belongs to an overclock line.
    pub fn is_overclocking(&self) -> bool {
        matches!(self.current_line(), Some((LineKind::Overclock, _)))
    }

    /// Scroll held in the temporary counters as pixel `(x, y)`.
    pub fn scroll(&self) -> (u16, u16) {
        self.registers.scroll.scroll()
    }

    /// Debug read of the unit's address space. Boards are neither notified
    /// nor clocked.
    pub fn peek_vram(&self, addr: u16) -> u8 {
        self.vram.peek(addr)
    }

    /// Debug read of sprite memory.
    pub fn oam(&self) -> &[u8] {
        &self.registers.oam
    }

    /// Copies a page into sprite memory through the `$2004` path.
    pub fn oam_dma(&mut self, page: &[u8; 256]) {
        for &value in page {
            self.registers.write_oam_data(value);
        }
        self.open_bus.set(0xFF, page[255], self.frame_count as u32);
    }

    /// Register read. Callers inside a frame go through
    /// [`RegisterBus`](crate::cpu::RegisterBus), which brings rendering up
    /// to date first.
    pub fn read_register(&mut self, addr: u16) -> u8 {
        debug_assert!(
            (REGISTER_BASE..=REGISTER_WINDOW_END).contains(&addr),
            "not a ppu register: {addr:#06x}"
        );
        let frame = self.frame_count as u32;
        match Register::from_cpu_addr(addr) {
            Register::Status => {
                let latch = self.open_bus.sample(frame);
                let value = self.registers.read_status(latch);
                self.open_bus.set(!Status::OPEN_BUS_BITS, value, frame);
                value
            }
            Register::OamData => {
                let value = match self.current_line() {
                    Some((LineKind::Visible(_), dot))
                        if self.live && self.registers.mask.rendering_enabled() =>
                    {
                        self.evaluator.read_port(dot, &self.registers.oam)
                    }
                    _ => self.registers.oam[usize::from(self.registers.oam_addr)],
                };
                self.open_bus.set(0xFF, value, frame);
                value
            }
            Register::Data => self.read_data(frame),
            _ => self.open_bus.sample(frame),
        }
    }

    /// Register write.
    pub fn write_register(&mut self, addr: u16, value: u8) {
        debug_assert!(
            (REGISTER_BASE..=REGISTER_WINDOW_END).contains(&addr),
            "not a ppu register: {addr:#06x}"
        );
        self.open_bus.set(0xFF, value, self.frame_count as u32);
        match Register::from_cpu_addr(addr) {
            Register::Control => {
                let rising = self.registers.write_control(value);
                if rising
                    && self.registers.status.contains(Status::VERTICAL_BLANK)
                    && !self.nmi_delivered
                {
                    self.raise_nmi();
                }
            }
            Register::Mask => self.registers.mask = registers::Mask::from_bits_retain(value),
            Register::Status => {}
            Register::OamAddr => self.registers.oam_addr = value,
            Register::OamData => self.registers.write_oam_data(value),
            Register::Scroll => self.registers.scroll.write_scroll(value),
            Register::Addr => {
                if let Some(v) = self.registers.scroll.write_addr(value) {
                    self.vram.observe(v.raw());
                }
            }
            Register::Data => {
                let addr = self.registers.scroll.v.data_port_address();
                self.vram.observe(addr);
                self.vram.write(addr, value);
                self.step_data_address();
            }
        }
    }

    fn read_data(&mut self, frame: u32) -> u8 {
        let addr = self.registers.scroll.v.data_port_address();
        self.vram.observe(addr);
        let value = if addr >= PALETTE_BASE {
            // Palette reads are immediate; the buffer picks up the
            // nametable byte underneath.
            let color = self
                .vram
                .palette
                .read(addr, self.registers.mask.palette_mask());
            self.registers.vram_buffer = self.vram.read(addr - 0x1000);
            self.open_bus.apply(0xC0, color, frame)
        } else {
            let value = self.registers.vram_buffer;
            self.registers.vram_buffer = self.vram.read(addr);
            self.open_bus.set(0xFF, value, frame);
            value
        };
        self.step_data_address();
        value
    }

    fn step_data_address(&mut self) {
        let rendering_active = self.live
            && self.registers.mask.rendering_enabled()
            && self.current_line().is_some_and(|(kind, _)| kind.renders());
        let by_row = self.registers.control.increments_by_row();
        self.registers
            .scroll
            .increment_on_register_access(rendering_active, by_row);
        self.vram.observe(self.registers.scroll.v.data_port_address());
    }

    /// Line kind and dot of the last executed dot, if the frame has begun.
    fn current_line(&self) -> Option<(LineKind, u16)> {
        let (index, dot) = match (self.pos.line_index, self.pos.dot) {
            (0, 0) => return None,
            (index, 0) => {
                let index = index - 1;
                let len = if index == self.plan.prerender_index() {
                    self.prerender_len
                } else {
                    DOTS_PER_LINE
                };
                (index, len - 1)
            }
            (index, dot) => (index, dot - 1),
        };
        self.plan.line(index).map(|(kind, _)| (kind, dot))
    }

    fn raise_nmi(&mut self) {
        trace!(frame = self.frame_count, "nmi raised");
        self.nmi_pending = true;
        self.nmi_delivered = true;
    }

    pub(crate) fn take_nmi(&mut self) -> bool {
        core::mem::take(&mut self.nmi_pending)
    }

    pub(crate) fn cpu_time(&self) -> u32 {
        self.cpu_time
    }

    pub(crate) fn advance_cpu(&mut self, dots: u32) {
        self.cpu_time += dots;
    }

    /// Executes every dot up to the processor's clock.
    pub(crate) fn catch_up(&mut self) {
        self.sync_through(self.cpu_time);
    }

    /// Executes every dot whose frame-relative stamp is `<= t`. Stops at
    /// the end of the frame.
    pub(crate) fn sync_through(&mut self, t: u32) {
        while self.pos.stamp() <= t {
            let Some((kind, scanline)) = self.plan.line(self.pos.line_index) else {
                break;
            };
            self.tick(kind, scanline, self.pos.dot);
            self.pos.advance();
        }
    }

    fn tick(&mut self, kind: LineKind, scanline: u16, dot: u16) {
        if !self.live {
            return;
        }
        match kind {
            LineKind::VBlank { first: true } if dot == 1 => self.enter_vblank(),
            LineKind::PreRender => {
                if dot == 1 {
                    self.registers.status.remove(
                        Status::VERTICAL_BLANK | Status::SPRITE_ZERO_HIT | Status::SPRITE_OVERFLOW,
                    );
                }
                self.render_dot(kind, scanline, dot);
            }
            LineKind::Visible(_) => self.render_dot(kind, scanline, dot),
            _ => {}
        }
    }

    fn enter_vblank(&mut self) {
        self.registers.status.insert(Status::VERTICAL_BLANK);
        self.registers.oam_addr = 0;
        self.nmi_delivered = false;
        if self.registers.control.nmi_enabled() {
            self.raise_nmi();
        }
    }

    /// Wraps up a frame of `frame_len` dots and prepares the next one.
    fn end_frame(&mut self, frame_len: u32) {
        self.cpu_time = self.cpu_time.saturating_sub(frame_len);
        if !self.live {
            if !self.render_skipped {
                let fill = self.compositor().backdrop_output();
                self.framebuffer.fill(fill, self.registers.mask.emphasis());
            }
            self.warmup -= 1;
            if self.warmup == 0 {
                debug!(frame = self.frame_count, "warmup finished");
            }
        }
        if !self.render_skipped {
            self.framebuffer.swap();
        }
        self.frame_count += 1;
        self.rewind();
    }
}
