mod common;

use gba_core::prelude::{Bus, Gba};

#[test]
fn immediate_transfer_fills_destination_and_disables() {
    let mut gba = common::bare_console();

    for i in 0..16u32 {
        gba.write32(0x0200_0000 + i * 4, 0xDEAD_0000 + i);
    }

    gba.write16(0x0400_00D4, 0x0000); // DMA3SAD low
    gba.write16(0x0400_00D6, 0x0200); // DMA3SAD high -> 0x02000000
    gba.write16(0x0400_00D8, 0x0100); // DMA3DAD low
    gba.write16(0x0400_00DA, 0x0200); // DMA3DAD high -> 0x02000100
    gba.write16(0x0400_00DC, 16); // DMA3CNT_L
    gba.write16(0x0400_00DE, 0x8400); // DMA3CNT_H: enable, 32-bit, immediate

    gba.step_frame();

    for i in 0..16u32 {
        assert_eq!(gba.read32(0x0200_0100 + i * 4), 0xDEAD_0000 + i);
    }
    assert_eq!(gba.read16(0x0400_00DE) & 0x8000, 0);
}
