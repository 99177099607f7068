mod common;

use gba_core::prelude::{Bus, Gba};

#[test]
fn mode3_scanline_matches_scenario() {
    let mut gba = common::bare_console();
    gba.write16(0x0400_0000, 0x0403); // DISPCNT: mode 3, BG2 on

    let colors: [u16; 4] = [0x001F, 0x03E0, 0x7C00, 0x7FFF];
    for (i, c) in colors.iter().enumerate() {
        gba.write16(0x0600_0000 + i as u32 * 2, *c);
    }

    let fb = gba.step_frame();
    assert_eq!(&fb[0..12], &[248, 0, 0, 0, 248, 0, 0, 0, 248, 248, 248, 248]);
}
