mod common;

use anyhow::Result;
use common::{
    Op, ScriptCpu, frame_hash, load_oam, reset_scroll, set_palette, solid_tile, unit, warm_up,
    write_vram,
};
use pixium_core::{Error, Fidelity, Ppu, PpuConfig};

/// Scrolls a little every frame from the middle of the picture.
fn scrolling_script() -> Vec<(u64, u32, Op)> {
    let mut script = Vec::new();
    for frame in 2..12u64 {
        let line = 21 * 341 + 100 * 341;
        script.push((frame, line, Op::Write(0x2005, (frame * 7) as u8)));
        script.push((frame, line, Op::Write(0x2005, (frame * 3) as u8)));
        script.push((frame, line + 12, Op::Read(0x2002)));
    }
    script
}

fn scene(config: PpuConfig) -> (Ppu, ScriptCpu) {
    let mut ppu = unit(config);
    let mut cpu = ScriptCpu::with_script(12, scrolling_script());
    warm_up(&mut ppu, &mut cpu);

    solid_tile(&mut ppu, 0x0000, 1, 1);
    solid_tile(&mut ppu, 0x0000, 2, 2);
    solid_tile(&mut ppu, 0x0000, 3, 3);
    let tiles: Vec<u8> = (0..0x3C0u16).map(|i| (i % 7 % 4) as u8).collect();
    write_vram(&mut ppu, 0x2000, &tiles);
    write_vram(&mut ppu, 0x23C0, &[0b1110_0100; 0x40]);
    let palette: [u8; 32] = core::array::from_fn(|i| (i as u8 * 5) & 0x3F);
    set_palette(&mut ppu, &palette);
    load_oam(&mut ppu, &[[20, 1, 0, 30], [60, 2, 0x41, 90], [61, 3, 0x22, 92]]);
    reset_scroll(&mut ppu, 0x80);
    ppu.write_register(0x2001, 0x1E);
    (ppu, cpu)
}

fn run(ppu: &mut Ppu, cpu: &mut ScriptCpu, frames: usize) -> Vec<String> {
    (0..frames)
        .map(|_| {
            ppu.step_frame(cpu, false);
            cpu.frame += 1;
            frame_hash(ppu.framebuffer())
        })
        .collect()
}

#[test]
fn restoring_a_state_replays_the_same_frames() -> Result<()> {
    for fidelity in [Fidelity::PerDot, Fidelity::LineBatched] {
        let (mut ppu, mut cpu) = scene(PpuConfig::default().with_fidelity(fidelity));
        run(&mut ppu, &mut cpu, 3);

        let blob = ppu.save_state();
        let saved_cpu = cpu.clone();
        let first = run(&mut ppu, &mut cpu, 4);

        // A freshly powered-on unit with the same board.
        let mut fresh = Ppu::new(*ppu.config());
        if let Some(board) = ppu.cartridge_mut() {
            fresh.attach_cartridge(dyn_clone::clone_box(&*board));
        }
        fresh.load_state(&blob)?;
        let mut fresh_cpu = saved_cpu.clone();
        assert_eq!(run(&mut fresh, &mut fresh_cpu, 4), first, "{}", fidelity.name());

        ppu.load_state(&blob)?;
        let mut cpu = saved_cpu;
        let second = run(&mut ppu, &mut cpu, 4);
        assert_eq!(first, second, "{}", fidelity.name());
        assert_eq!(ppu.save_state().field("frame_count"), Some(&9u64.to_le_bytes()[..]));
    }
    Ok(())
}

#[test]
fn batched_unit_continues_from_a_per_dot_state() -> Result<()> {
    let config = PpuConfig::default();
    let (mut ppu, mut cpu) = scene(config);
    run(&mut ppu, &mut cpu, 2);

    let blob = ppu.save_state();
    assert!(blob.extended);
    let mut batched = Ppu::new(config.with_fidelity(Fidelity::LineBatched));
    if let Some(board) = ppu.cartridge_mut() {
        batched.attach_cartridge(dyn_clone::clone_box(&*board));
    }
    batched.load_state(&blob)?;

    let mut batched_cpu = cpu.clone();
    assert_eq!(
        run(&mut ppu, &mut cpu, 3),
        run(&mut batched, &mut batched_cpu, 3)
    );
    assert_eq!(cpu.reads, batched_cpu.reads);

    // The other way round lacks the pipeline state.
    let batched_blob = batched.save_state();
    assert!(!batched_blob.extended);
    assert_eq!(
        ppu.load_state(&batched_blob),
        Err(Error::FidelityMismatch {
            expected: "per-dot",
            found: "line-batched"
        })
    );
    Ok(())
}

#[cfg(feature = "savestate-postcard")]
#[test]
fn postcard_bytes_restore_the_unit() -> Result<()> {
    use pixium_core::StateBlob;

    let (mut ppu, mut cpu) = scene(PpuConfig::default());
    run(&mut ppu, &mut cpu, 2);
    let bytes = ppu.save_state().to_bytes()?;
    let saved_cpu = cpu.clone();
    let first = run(&mut ppu, &mut cpu, 2);

    ppu.load_state(&StateBlob::from_bytes(&bytes)?)?;
    let mut cpu = saved_cpu;
    assert_eq!(run(&mut ppu, &mut cpu, 2), first);
    Ok(())
}
