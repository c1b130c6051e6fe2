mod common;

use common::{CYCLE, NTSC_FRAME, Op, ScriptCpu, unit, warm_up};
use pixium_core::{Fidelity, PpuConfig};

const MODES: [Fidelity; 2] = [Fidelity::PerDot, Fidelity::LineBatched];

fn run(fidelity: Fidelity, control: u8, script: Vec<(u64, u32, Op)>, frames: u64) -> ScriptCpu {
    let mut ppu = unit(PpuConfig::default().with_fidelity(fidelity));
    ppu.write_register(0x2000, control);
    let mut cpu = ScriptCpu::with_script(4 * CYCLE, script);
    warm_up(&mut ppu, &mut cpu);
    for _ in 2..frames {
        ppu.step_frame(&mut cpu, false);
        cpu.frame += 1;
    }
    cpu
}

#[test]
fn one_nmi_per_live_frame_right_after_vblank_entry() {
    for fidelity in MODES {
        let cpu = run(fidelity, 0x80, Vec::new(), 6);
        let frames: Vec<u64> = cpu.nmis.iter().map(|&(frame, _)| frame).collect();
        assert_eq!(frames, [2, 3, 4, 5], "{}", fidelity.name());
        for &(_, dot) in &cpu.nmis {
            assert!((1..1 + 4 * CYCLE).contains(&dot), "nmi taken at dot {dot}");
        }
    }
}

#[test]
fn nmi_timing_matches_across_modes() {
    let script = vec![
        (2, 5_000, Op::Write(0x2000, 0x00)),
        (2, 6_000, Op::Write(0x2000, 0x80)),
        (3, 30_000, Op::Read(0x2002)),
        (4, NTSC_FRAME - 20, Op::Write(0x2000, 0x00)),
    ];
    let per_dot = run(Fidelity::PerDot, 0x80, script.clone(), 6);
    let batched = run(Fidelity::LineBatched, 0x80, script, 6);
    assert_eq!(per_dot.nmis, batched.nmis);
    assert_eq!(per_dot.reads, batched.reads);
}

#[test]
fn enabling_nmi_during_vblank_fires_once() {
    for fidelity in MODES {
        let script = vec![
            (2, 1_000, Op::Write(0x2000, 0x80)),
            (2, 1_100, Op::Write(0x2000, 0x00)),
            (2, 1_200, Op::Write(0x2000, 0x80)),
            // Leave it off for the following frames.
            (2, 1_300, Op::Write(0x2000, 0x00)),
        ];
        let cpu = run(fidelity, 0x00, script, 4);
        assert_eq!(cpu.nmis.len(), 1, "{}", fidelity.name());
        let (frame, dot) = cpu.nmis[0];
        assert_eq!(frame, 2);
        assert!((1_000..1_000 + 2 * 4 * CYCLE).contains(&dot));
    }
}

#[test]
fn status_read_suppresses_late_enable() {
    for fidelity in MODES {
        let script = vec![
            (2, 100, Op::Read(0x2002)),
            (2, 200, Op::Write(0x2000, 0x80)),
            (2, 300, Op::Write(0x2000, 0x00)),
        ];
        let cpu = run(fidelity, 0x00, script, 3);
        assert!(cpu.nmis.is_empty(), "{}", fidelity.name());
        assert_eq!(cpu.reads[0].3 & 0x80, 0x80);
    }
}

#[test]
fn vblank_flag_spans_vblank_and_clears_on_read() {
    for fidelity in MODES {
        let script = vec![
            (2, 50, Op::Read(0x2002)),
            (2, 100, Op::Read(0x2002)),
            (3, 20 * 341 - 50, Op::Read(0x2002)),
            // Left set, the pre-render line clears it.
            (4, 21 * 341 + 10, Op::Read(0x2002)),
        ];
        let cpu = run(fidelity, 0x00, script, 5);
        let status: Vec<u8> = cpu.reads.iter().map(|read| read.3 & 0x80).collect();
        assert_eq!(status, [0x80, 0x00, 0x80, 0x00], "{}", fidelity.name());
    }
}
