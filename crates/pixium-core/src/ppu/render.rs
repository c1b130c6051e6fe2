//! Per-dot events of the rendering lines (pre-render and visible).
//!
//! Dots 1..=256 draw pixel `dot - 1` and fetch one background tile every
//! eight dots; 257..=320 fetch sprite patterns for the next line; 321..=336
//! prefetch the first two tiles of the next line. Everything here only runs
//! while the frame is live.

use super::{
    Ppu,
    compositor::Compositor,
    registers::Status,
    sprite::{self, SpriteAttributes},
    sprite_pipeline::SpriteSlot,
    timing::LineKind,
};
use crate::memory::ppu::{DOTS_PER_LINE, PALETTE_BASE, SPRITE_COUNT, SPRITES_PER_LINE};

/// Secondary memory contents of an unused sprite slot.
const EMPTY_SLOT: [u8; 4] = [0xFF; 4];

impl Ppu {
    pub(super) fn render_dot(&mut self, kind: LineKind, scanline: u16, dot: u16) {
        let visible = match kind {
            LineKind::Visible(y) => Some(y),
            _ => None,
        };
        let rendering = self.registers.mask.rendering_enabled();

        if dot == 0 {
            self.evaluator.start_line();
            if visible.is_some() {
                self.sprites.load_scanline(&self.next_sprites);
            }
        }
        if dot == 257 {
            self.next_sprites.clear();
        }
        if kind == LineKind::PreRender && dot == 338 {
            self.decide_prerender_length(rendering);
        }

        if !rendering {
            // The picture still advances, one backdrop pixel per dot.
            if let Some(y) = visible
                && (1..=256).contains(&dot)
            {
                self.emit_pixel(y, dot - 1);
            }
            return;
        }

        match dot {
            1..=256 => {
                if let Some(y) = visible {
                    if dot >= 65 {
                        self.evaluate_sprites(dot, y);
                    }
                    self.emit_pixel(y, dot - 1);
                }
                self.background_fetch(dot);
                if dot == 256 {
                    self.registers.scroll.increment_fine_y();
                }
            }
            257..=320 => self.sprite_fetch(kind, scanline, dot),
            321..=336 => self.background_fetch(dot),
            337 | 339 => {
                let addr = self.registers.scroll.v.nametable_fetch_address();
                self.vram.fetch(addr);
            }
            _ => {}
        }
    }

    fn decide_prerender_length(&mut self, rendering: bool) {
        let skip = self.odd_frame && rendering && self.plan.region.skips_odd_frame_dot();
        self.odd_frame = !self.odd_frame;
        self.prerender_len = if skip { DOTS_PER_LINE - 1 } else { DOTS_PER_LINE };
        self.pos.line_len = self.prerender_len;
    }

    /// One dot of the eight-dot tile fetch. The tile is complete on the
    /// eighth dot, where it enters the shifters and coarse X steps.
    fn background_fetch(&mut self, dot: u16) {
        let v = self.registers.scroll.v;
        match dot & 7 {
            1 => self.bg.latch.tile = self.vram.fetch(v.nametable_fetch_address()),
            3 => {
                let attribute = self.vram.fetch(v.attribute_fetch_address());
                self.bg.latch.palette = (attribute >> v.attribute_shift()) & 0b11;
            }
            5 | 7 => {
                let table = self.registers.control.background_pattern_table();
                let plane = usize::from(dot & 7 == 7);
                let addr = v.pattern_fetch_address(table, self.bg.latch.tile) + 8 * plane as u16;
                self.bg.latch.pattern[plane] = self.vram.fetch(addr);
            }
            0 => {
                self.bg.advance_tile();
                self.registers.scroll.increment_coarse_x();
            }
            _ => {}
        }
    }

    fn evaluate_sprites(&mut self, dot: u16, line: u16) {
        let height = self.registers.control.sprite_height();
        let overflow = self.evaluator.step(
            dot,
            line,
            height,
            &self.registers.oam,
            self.registers.oam_addr,
        );
        if overflow {
            self.registers.status.insert(Status::SPRITE_OVERFLOW);
        }
    }

    /// Sprite pattern fetches for the next line. Every slot performs its
    /// reads; slots past the found count fetch tile `$FF` and are dropped.
    fn sprite_fetch(&mut self, kind: LineKind, scanline: u16, dot: u16) {
        if dot == 257 {
            self.registers.scroll.install_horizontal_latches();
            self.registers.oam_addr = 0;
        }
        if dot == 274 && !self.registers.control.starves_scanline_counter() {
            self.vram.scanline_hook(scanline);
        }
        if kind == LineKind::PreRender && (280..=304).contains(&dot) {
            self.registers.scroll.install_vertical_latches();
        }

        let slot = usize::from((dot - 257) >> 3);
        match dot & 7 {
            1 | 3 => {
                let addr = self.registers.scroll.v.nametable_fetch_address();
                self.vram.fetch(addr);
            }
            5 => {
                let (addr, _) = self.sprite_row(kind, slot);
                self.sprite_fetch_low = self.vram.fetch(addr);
            }
            7 => {
                let (addr, [_, _, attributes, x]) = self.sprite_row(kind, slot);
                let pattern_high = self.vram.fetch(addr + 8);
                if slot < usize::from(self.evaluator.found()) {
                    self.next_sprites.push(SpriteSlot {
                        pattern_low: self.sprite_fetch_low,
                        pattern_high,
                        attributes: SpriteAttributes::from_bits_retain(attributes),
                        x,
                        sprite0: slot == 0 && self.evaluator.sprite0_found(),
                    });
                }
            }
            _ => {}
        }

        if dot == 320 {
            if !self.config.sprite_limit
                && let LineKind::Visible(line) = kind
            {
                self.fetch_past_limit(line);
            }
            self.vram.late_scanline_hook(scanline);
        }
    }

    /// Pattern address of slot `slot` for the next line, with its
    /// secondary memory entry.
    fn sprite_row(&self, kind: LineKind, slot: usize) -> (u16, [u8; 4]) {
        let entry = if slot < usize::from(self.evaluator.found()) {
            self.evaluator.entry(slot)
        } else {
            EMPTY_SLOT
        };
        let [y, tile, attributes, _] = entry;
        let row = match kind {
            LineKind::Visible(line) => (line as u8).wrapping_sub(y),
            _ => 0,
        };
        let control = self.registers.control;
        let attributes = SpriteAttributes::from_bits_retain(attributes);
        (sprite::pattern_address(control, tile, attributes, row), entry)
    }

    /// Appends in-range sprites beyond the eighth. These reads neither
    /// reach the address bus nor clock the cartridge.
    fn fetch_past_limit(&mut self, line: u16) {
        if usize::from(self.evaluator.found()) < SPRITES_PER_LINE {
            return;
        }
        let Some(last) = self.evaluator.last_found_index() else {
            return;
        };
        let control = self.registers.control;
        let height = control.sprite_height();
        for index in usize::from(last) + 1..SPRITE_COUNT {
            let base = index * 4;
            let y = self.registers.oam[base];
            if !sprite::in_range(line, y, height) {
                continue;
            }
            let tile = self.registers.oam[base + 1];
            let attributes = SpriteAttributes::from_bits_retain(self.registers.oam[base + 2]);
            let x = self.registers.oam[base + 3];
            let row = (line as u8).wrapping_sub(y);
            let addr = sprite::pattern_address(control, tile, attributes, row);
            let slot = SpriteSlot {
                pattern_low: self.vram.peek(addr),
                pattern_high: self.vram.peek(addr + 8),
                attributes,
                x,
                sprite0: false,
            };
            self.next_sprites.push(slot);
        }
    }

    /// Color shown where nothing opaque is drawn, already masked.
    ///
    /// With rendering off and `v` pointing into palette memory, the entry
    /// under `v` is shown instead of entry 0.
    fn backdrop_color(&self) -> u8 {
        let mask = self.registers.mask;
        let palette_mask = mask.palette_mask();
        if let Some(color) = self.config.backdrop_override {
            return color & palette_mask;
        }
        let v = self.registers.scroll.v.data_port_address();
        if !mask.rendering_enabled() && v >= PALETTE_BASE {
            self.vram.palette.read(v, palette_mask)
        } else {
            self.vram.palette.backdrop(palette_mask)
        }
    }

    pub(super) fn compositor(&self) -> Compositor {
        Compositor {
            mask: self.registers.mask,
            show_background: self.config.render_background,
            show_sprites: self.config.render_sprites,
            backdrop: self.backdrop_color(),
        }
    }

    /// Draws pixel `x` of line `y` from the current pipeline state.
    fn emit_pixel(&mut self, y: u16, x: u16) {
        let x = usize::from(x);
        let compositor = self.compositor();
        let sprite = self.sprites.pixel(x);
        let output = if self.registers.mask.rendering_enabled() {
            let bg = self.bg.sample(self.registers.scroll.x + (x & 7) as u8);
            let composed = compositor.pixel(x, bg, sprite, &self.vram.palette);
            if composed.sprite_zero_hit {
                self.registers.status.insert(Status::SPRITE_ZERO_HIT);
            }
            composed.output
        } else {
            compositor.backdrop_output()
        };

        if !self.render_skipped {
            self.framebuffer.write_pixel(
                x,
                usize::from(y),
                output,
                self.registers.mask.emphasis(),
            );
        }
    }
}
