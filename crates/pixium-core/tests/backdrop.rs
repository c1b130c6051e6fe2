mod common;

use common::{ScriptCpu, set_palette, unit, warm_up};
use pixium_core::{Fidelity, Ppu, PpuConfig};

fn palette() -> [u8; 32] {
    core::array::from_fn(|i| 0x01 + i as u8)
}

/// Steps one live frame with rendering off and `v` left at `addr`.
fn blank_frame(config: PpuConfig, mask: u8, addr: u16) -> Ppu {
    let mut ppu = unit(config);
    let mut cpu = ScriptCpu::new(9);
    warm_up(&mut ppu, &mut cpu);
    set_palette(&mut ppu, &palette());
    ppu.write_register(0x2001, mask);
    ppu.write_register(0x2006, (addr >> 8) as u8);
    ppu.write_register(0x2006, addr as u8);
    ppu.step_frame(&mut cpu, false);
    ppu
}

fn flat(ppu: &Ppu) -> Option<u8> {
    let render = ppu.framebuffer().render();
    render.iter().all(|&p| p == render[0]).then_some(render[0])
}

#[test]
fn palette_pointer_shows_through_while_rendering_is_off() {
    for fidelity in [Fidelity::PerDot, Fidelity::LineBatched] {
        let config = PpuConfig::default().with_fidelity(fidelity);
        assert_eq!(flat(&blank_frame(config, 0x00, 0x3F07)), Some(0x80 | 0x08));
        assert_eq!(flat(&blank_frame(config, 0x00, 0x2000)), Some(0x80 | 0x01));
        // Grayscale applies to the backdrop too.
        assert_eq!(flat(&blank_frame(config, 0x01, 0x3F07)), Some(0x80));
    }
}

#[test]
fn emphasis_tags_blank_frames() {
    let config = PpuConfig::default();
    assert_eq!(flat(&blank_frame(config, 0xE0, 0x2000)), Some(0xC0 | 0x01));
    let ppu = blank_frame(config, 0x40, 0x2000);
    assert_eq!(flat(&ppu), Some(0x40 | 0x01));
    assert!(ppu.framebuffer().emphasis().iter().all(|&e| e == 0b010));
}

#[test]
fn override_replaces_the_backdrop() {
    let config = PpuConfig::default().with_backdrop_override(Some(0x2D));
    assert_eq!(flat(&blank_frame(config, 0x00, 0x3F07)), Some(0x80 | 0x2D));
    assert_eq!(flat(&blank_frame(config, 0x01, 0x2000)), Some(0x80 | 0x20));
}
