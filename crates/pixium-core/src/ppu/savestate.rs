//! Savestate layout of the unit.
//!
//! The baseline list holds everything that survives a frame boundary:
//! registers, counters, memories, timing and interrupt bookkeeping. Units
//! running in [`Fidelity::PerDot`] append an extension list with the
//! pipeline and engine position, so a per-dot unit can only restore a
//! state that carries it. Batched units skip the extension on load.

use tracing::debug;

use super::{
    Ppu,
    registers::{Control, Mask, Status, VramAddr},
    sprite_eval::SpriteEvaluator,
    sprite_pipeline::SpriteRenderer,
};
use crate::{
    config::Fidelity,
    error::Error,
    state::{StateBlob, StateField, StateReader, StateWriter},
};

/// Version of the field layout written by [`Ppu::save_state`].
pub const STATE_FORMAT_VERSION: u32 = 1;

impl Ppu {
    fn write_baseline(&self, w: &mut StateWriter) {
        let regs = &self.registers;
        w.u8("ctrl", regs.control.bits());
        w.u8("mask", regs.mask.bits());
        w.u8("status", regs.status.bits());
        w.u8("oam_addr", regs.oam_addr);
        w.u8("vram_buffer", regs.vram_buffer);
        w.bytes("oam", &regs.oam);
        self.open_bus.save_state(w);
        w.u16("v", regs.scroll.v.raw());
        w.u16("t", regs.scroll.t.raw());
        w.u8("fine_x", regs.scroll.x);
        w.bool("toggle", regs.scroll.w);
        self.vram.save_state(w);
        w.u64("frame_count", self.frame_count);
        w.bool("odd_frame", self.odd_frame);
        w.u8("warmup", self.warmup);
        w.bool("nmi_delivered", self.nmi_delivered);
        w.bool("nmi_pending", self.nmi_pending);
        w.u32("cpu_debt", self.cpu_time);
    }

    fn write_extension(&self, w: &mut StateWriter) {
        self.bg.save_state(w);
        self.evaluator.save_state(w);
        self.next_sprites
            .save_state(w, "sprite_next_count", "sprite_next_slots");
        w.u8("sprite_fetch_low", self.sprite_fetch_low);
        if let SpriteRenderer::Shifters(pipeline) = &self.sprites {
            pipeline.save_state(w);
        }
        w.u16("line_index", self.pos.line_index);
        w.u32("line_start", self.pos.line_start);
        w.u16("dot", self.pos.dot);
        w.u16("line_len", self.pos.line_len);
        w.u16("prerender_len", self.prerender_len);
        w.u16("vblank_extra", self.plan.vblank_extra);
        w.u16("postrender_extra", self.plan.postrender_extra);
        w.bool("live", self.live);
    }

    fn writer(&self) -> StateWriter {
        let mut w = StateWriter::new();
        self.write_baseline(&mut w);
        if self.config.fidelity == Fidelity::PerDot {
            self.write_extension(&mut w);
        }
        w
    }

    /// Captures the unit. Call between frames.
    pub fn save_state(&self) -> StateBlob {
        let extended = self.config.fidelity == Fidelity::PerDot;
        self.writer().finish(extended, STATE_FORMAT_VERSION)
    }

    /// Field names, sizes and offsets of the current layout, in order.
    pub fn state_layout(&self) -> Vec<StateField> {
        self.writer().layout().to_vec()
    }

    /// Restores a state captured by [`save_state`](Self::save_state).
    ///
    /// On error the unit is left untouched. The cartridge is not part of
    /// the state.
    pub fn load_state(&mut self, blob: &StateBlob) -> Result<(), Error> {
        if blob.format_version != STATE_FORMAT_VERSION {
            return Err(Error::FormatVersion {
                expected: STATE_FORMAT_VERSION,
                found: blob.format_version,
            });
        }
        let per_dot = self.config.fidelity == Fidelity::PerDot;
        if per_dot && !blob.extended {
            return Err(Error::FidelityMismatch {
                expected: Fidelity::PerDot.name(),
                found: Fidelity::LineBatched.name(),
            });
        }
        if !per_dot && blob.extended {
            debug!("ignoring per-dot extension of loaded state");
        }

        let r = StateReader::new(blob);
        let mut next = self.clone();
        let loaded = next
            .read_baseline(&r)
            .and_then(|()| if per_dot { next.read_extension(&r) } else { Ok(()) });
        if let Err(err) = loaded {
            debug!(%err, "savestate rejected");
            return Err(err);
        }
        if !per_dot {
            next.bg.clear();
            next.evaluator = SpriteEvaluator::new();
            next.next_sprites.clear();
            next.sprite_fetch_low = 0;
            next.sprites.clear();
            next.rewind();
        }
        *self = next;
        Ok(())
    }

    fn read_baseline(&mut self, r: &StateReader<'_>) -> Result<(), Error> {
        let regs = &mut self.registers;
        regs.control = Control::from_bits_retain(r.u8("ctrl")?);
        regs.mask = Mask::from_bits_retain(r.u8("mask")?);
        regs.status = Status::from_bits_truncate(r.u8("status")?);
        regs.oam_addr = r.u8("oam_addr")?;
        regs.vram_buffer = r.u8("vram_buffer")?;
        r.bytes("oam", &mut regs.oam)?;
        self.open_bus.load_state(r)?;
        let regs = &mut self.registers;
        regs.scroll.v = VramAddr(r.u16("v")? & 0x7FFF);
        regs.scroll.t = VramAddr(r.u16("t")? & 0x7FFF);
        regs.scroll.x = r.u8("fine_x")? & 0b111;
        regs.scroll.w = r.bool("toggle")?;
        self.vram.load_state(r)?;
        self.frame_count = r.u64("frame_count")?;
        self.odd_frame = r.bool("odd_frame")?;
        self.warmup = r.u8("warmup")?;
        self.nmi_delivered = r.bool("nmi_delivered")?;
        self.nmi_pending = r.bool("nmi_pending")?;
        self.cpu_time = r.u32("cpu_debt")?;
        Ok(())
    }

    fn read_extension(&mut self, r: &StateReader<'_>) -> Result<(), Error> {
        self.bg.load_state(r)?;
        self.evaluator.load_state(r)?;
        self.next_sprites
            .load_state(r, "sprite_next_count", "sprite_next_slots")?;
        self.sprite_fetch_low = r.u8("sprite_fetch_low")?;
        if let SpriteRenderer::Shifters(pipeline) = &mut self.sprites {
            pipeline.load_state(r)?;
        }
        self.pos.line_index = r.u16("line_index")?;
        self.pos.line_start = r.u32("line_start")?;
        self.pos.dot = r.u16("dot")?;
        self.pos.line_len = r.u16("line_len")?;
        self.prerender_len = r.u16("prerender_len")?;
        self.plan.vblank_extra = r.u16("vblank_extra")?;
        self.plan.postrender_extra = r.u16("postrender_extra")?;
        self.live = r.bool("live")?;
        Ok(())
    }
}
