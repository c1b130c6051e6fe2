//! Frame drivers: how processor time is interleaved with rendering.
//!
//! Both drivers walk the same line plan and cut it at the same segment
//! boundaries (the vblank-entry dot and the pre-render dot-length decision).
//! Within a segment, [`DotStepper`] alternates one dot of rendering with
//! one dot of processor time, while [`LineStepper`] hands the processor the
//! whole segment and relies on register accesses to catch rendering up.

use tracing::debug;

use super::{Ppu, timing::LineKind};
use crate::{
    cpu::{CpuCore, RegisterBus},
    memory::ppu::DOTS_PER_LINE,
};

const LINE: u32 = DOTS_PER_LINE as u32;

/// First dot of the pre-render line that depends on the odd-frame decision.
const PRERENDER_SPLIT: u32 = 339;

pub(crate) trait Stepper {
    /// Runs processor time and unit events over `[start, end)`.
    fn segment<C: CpuCore + ?Sized>(ppu: &mut Ppu, cpu: &mut C, start: u32, end: u32);
}

/// Dot-granular interleaving.
pub(crate) struct DotStepper;

/// Whole segments of processor time with lazy catch-up.
pub(crate) struct LineStepper;

impl Stepper for DotStepper {
    fn segment<C: CpuCore + ?Sized>(ppu: &mut Ppu, cpu: &mut C, start: u32, end: u32) {
        for dot in start..end {
            ppu.sync_through(dot);
            run_cpu(ppu, cpu, dot + 1);
        }
    }
}

impl Stepper for LineStepper {
    fn segment<C: CpuCore + ?Sized>(ppu: &mut Ppu, cpu: &mut C, start: u32, end: u32) {
        ppu.sync_through(start);
        run_cpu(ppu, cpu, end);
    }
}

/// Lets the processor run until its clock reaches `end`, delivering any
/// interrupt raised by the preceding events first.
fn run_cpu<C: CpuCore + ?Sized>(ppu: &mut Ppu, cpu: &mut C, end: u32) {
    if ppu.take_nmi() {
        cpu.trigger_nmi();
    }
    while ppu.cpu_time < end {
        let before = ppu.cpu_time;
        cpu.run(&mut RegisterBus::new(ppu, end));
        if ppu.cpu_time == before {
            // An idle core forfeits the rest of the slice.
            ppu.cpu_time = end;
        }
    }
}

/// Produces one frame with stepper `S`.
pub(crate) fn run_frame<S: Stepper, C: CpuCore + ?Sized>(ppu: &mut Ppu, cpu: &mut C) {
    let mut start = 0u32;
    let mut index = 0u16;
    while let Some((kind, _)) = ppu.plan.line(index) {
        if ppu.live {
            plan_overclock(ppu, cpu, index);
        }
        let end = match kind {
            LineKind::VBlank { first: true } => {
                S::segment(ppu, cpu, start, start + 1);
                S::segment(ppu, cpu, start + 1, start + LINE);
                start + LINE
            }
            LineKind::PreRender => {
                S::segment(ppu, cpu, start, start + PRERENDER_SPLIT);
                ppu.sync_through(start + PRERENDER_SPLIT - 1);
                let end = start + u32::from(ppu.prerender_len);
                S::segment(ppu, cpu, start + PRERENDER_SPLIT, end);
                end
            }
            _ => {
                S::segment(ppu, cpu, start, start + LINE);
                start + LINE
            }
        };
        start = end;
        index += 1;
    }
    ppu.sync_through(start - 1);
    cpu.clear_raw_pcm();
    ppu.end_frame(start);
}

/// Sizes the overclock section that starts after line `index`, if any.
///
/// Deciding one line early keeps the plan fixed for every dot the engine
/// may reach while the processor runs ahead.
fn plan_overclock<C: CpuCore + ?Sized>(ppu: &mut Ppu, cpu: &C, index: u16) {
    let overclock = ppu.config.overclock;
    if !overclock.enabled {
        return;
    }
    let vblank = index + 1 == ppu.plan.vblank_extra_start();
    let postrender = index + 1 == ppu.plan.postrender_extra_start();
    if !vblank && !postrender {
        return;
    }
    let allowed = !(overclock.skip_raw_pcm && cpu.raw_pcm_active());
    if !allowed {
        debug!(frame = ppu.frame_count, "raw pcm playing, overclock skipped");
    }
    if vblank {
        ppu.plan.vblank_extra = if allowed { overclock.vblank_lines } else { 0 };
    } else {
        ppu.plan.postrender_extra = if allowed { overclock.postrender_lines } else { 0 };
    }
}
