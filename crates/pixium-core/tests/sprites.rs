mod common;

use common::{
    Op, ScriptCpu, fill_nametable, load_oam, reset_scroll, set_palette, solid_tile, unit, warm_up,
};
use pixium_core::{Fidelity, Ppu, PpuConfig, Region};

const MODES: [Fidelity; 2] = [Fidelity::PerDot, Fidelity::LineBatched];

const BACKDROP: u8 = 0x80 | 0x0F;
const BG_COLOR: u8 = 0x80 | 0x16;
const SPRITE_COLOR: u8 = 0x80 | 0x31;

/// Tile 1 is solid background color 1, tile 2 solid color 2.
const PALETTE: [u8; 32] = [
    0x0F, 0x16, 0x27, 0x18, 0x0F, 0x0F, 0x0F, 0x0F, 0x0F, 0x0F, 0x0F, 0x0F, 0x0F, 0x0F, 0x0F,
    0x0F, //
    0x0F, 0x30, 0x31, 0x32, 0x0F, 0x0F, 0x0F, 0x0F, 0x0F, 0x0F, 0x0F, 0x0F, 0x0F, 0x0F, 0x0F,
    0x0F,
];

/// Runs one live frame over the given background tile and sprites and
/// returns the unit with the status flags of that frame still readable.
fn render(config: PpuConfig, background: u8, sprites: &[[u8; 4]]) -> Ppu {
    render_with(config, ScriptCpu::new(12), background, sprites).0
}

fn render_with(
    config: PpuConfig,
    mut cpu: ScriptCpu,
    background: u8,
    sprites: &[[u8; 4]],
) -> (Ppu, ScriptCpu) {
    let mut ppu = unit(config);
    warm_up(&mut ppu, &mut cpu);

    solid_tile(&mut ppu, 0x0000, 1, 1);
    solid_tile(&mut ppu, 0x0000, 2, 2);
    fill_nametable(&mut ppu, background);
    set_palette(&mut ppu, &PALETTE);
    load_oam(&mut ppu, sprites);
    reset_scroll(&mut ppu, 0x00);
    ppu.write_register(0x2001, 0x1E);

    ppu.step_frame(&mut cpu, false);
    (ppu, cpu)
}

fn status(ppu: &mut Ppu) -> u8 {
    ppu.read_register(0x2002) & 0x60
}

#[test]
fn sprite_zero_hits_opaque_background() {
    for fidelity in MODES {
        let config = PpuConfig::default().with_fidelity(fidelity);
        let mut ppu = render(config, 1, &[[40, 1, 0, 100]]);
        assert_eq!(status(&mut ppu), 0x40, "{}", fidelity.name());

        // Transparent background under the sprite.
        let mut ppu = render(config, 0, &[[40, 1, 0, 100]]);
        assert_eq!(status(&mut ppu), 0x00, "{}", fidelity.name());

        // Only the rightmost column overlaps.
        let mut ppu = render(config, 1, &[[40, 1, 0, 255]]);
        assert_eq!(status(&mut ppu), 0x00, "{}", fidelity.name());
    }
}

#[test]
fn sprite_zero_hit_is_readable_one_dot_after_its_pixel() {
    // PAL never drops a dot, so line 41 starts at a fixed stamp.
    const LINE_41: u32 = (71 + 41) * 341;
    for fidelity in MODES {
        let config = PpuConfig::default()
            .with_region(Region::Pal)
            .with_fidelity(fidelity);
        let script = (95..=100)
            .map(|dot| (2, LINE_41 + dot, Op::Read(0x2002)))
            .collect();
        let (_, cpu) = render_with(config, ScriptCpu::with_script(1, script), 1, &[[40, 1, 0, 96]]);
        let seen: Vec<(u32, u8)> = cpu
            .reads
            .iter()
            .map(|&(_, stamp, _, value)| (stamp - LINE_41, value & 0x40))
            .collect();
        assert_eq!(
            seen,
            [(95, 0), (96, 0), (97, 0x40), (98, 0x40), (99, 0x40), (100, 0x40)],
            "{}",
            fidelity.name()
        );
    }
}

#[test]
fn sprites_draw_one_line_below_their_y() {
    for fidelity in MODES {
        let config = PpuConfig::default().with_fidelity(fidelity);
        let ppu = render(config, 0, &[[40, 2, 0, 100]]);
        let fb = ppu.framebuffer();
        for y in 41..=48 {
            assert_eq!(&fb.row(y)[100..108], &[SPRITE_COLOR; 8], "line {y}");
            assert_eq!(fb.row(y)[99], BACKDROP);
            assert_eq!(fb.row(y)[108], BACKDROP);
        }
        assert_eq!(fb.row(40)[100], BACKDROP);
        assert_eq!(fb.row(49)[100], BACKDROP);
    }
}

#[test]
fn behind_priority_yields_to_opaque_background() {
    for fidelity in MODES {
        let config = PpuConfig::default().with_fidelity(fidelity);
        let ppu = render(config, 1, &[[40, 2, 0x20, 100], [40, 2, 0x00, 140]]);
        let row = ppu.framebuffer().row(44);
        assert_eq!(row[100], BG_COLOR, "{}", fidelity.name());
        assert_eq!(row[140], SPRITE_COLOR, "{}", fidelity.name());
    }
}

fn line_of(count: usize) -> Vec<[u8; 4]> {
    (0..count).map(|i| [40, 2, 0, (i * 20) as u8]).collect()
}

#[test]
fn ninth_sprite_sets_overflow() {
    for fidelity in MODES {
        let config = PpuConfig::default().with_fidelity(fidelity);
        let mut ppu = render(config, 0, &line_of(8));
        assert_eq!(status(&mut ppu), 0x00, "{}", fidelity.name());
        let mut ppu = render(config, 0, &line_of(9));
        assert_eq!(status(&mut ppu), 0x20, "{}", fidelity.name());
    }
}

#[test]
fn overflow_scan_misreads_tile_byte_as_y() {
    for fidelity in MODES {
        let config = PpuConfig::default().with_fidelity(fidelity);
        let mut sprites = line_of(8);
        sprites.push([0xF0, 0xF0, 0, 0xF0]);
        sprites.push([0xF0, 40, 0, 0xF0]);
        let mut ppu = render(config, 0, &sprites);
        assert_eq!(status(&mut ppu), 0x20, "{}", fidelity.name());

        sprites[9] = [0xF0, 0, 0, 0xF0];
        let mut ppu = render(config, 0, &sprites);
        assert_eq!(status(&mut ppu), 0x00, "{}", fidelity.name());
    }
}

#[test]
fn lifting_the_limit_draws_every_sprite() {
    for fidelity in MODES {
        let limited = PpuConfig::default().with_fidelity(fidelity);
        let ppu = render(limited, 0, &line_of(10));
        assert_eq!(ppu.framebuffer().row(44)[140], SPRITE_COLOR);
        assert_eq!(ppu.framebuffer().row(44)[160], BACKDROP, "{}", fidelity.name());
        assert_eq!(ppu.framebuffer().row(44)[180], BACKDROP);

        let mut ppu = render(limited.with_sprite_limit(false), 0, &line_of(10));
        assert_eq!(ppu.framebuffer().row(44)[160], SPRITE_COLOR, "{}", fidelity.name());
        assert_eq!(ppu.framebuffer().row(44)[180], SPRITE_COLOR);
        // Overflow detection still runs.
        assert_eq!(status(&mut ppu), 0x20);
    }
}

#[test]
fn both_modes_draw_the_same_frame() {
    let sprites = [[30, 1, 0x40, 3], [35, 2, 0x81, 60], [90, 1, 0x22, 250], [120, 2, 0, 0]];
    let per_dot = render(PpuConfig::default(), 1, &sprites);
    let batched = render(PpuConfig::default().with_fidelity(Fidelity::LineBatched), 1, &sprites);
    assert_eq!(
        common::frame_hash(per_dot.framebuffer()),
        common::frame_hash(batched.framebuffer())
    );
}
