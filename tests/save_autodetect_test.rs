mod common;

fn rom_with_marker(marker: &[u8]) -> Vec<u8> {
    let mut rom = vec![0u8; 512];
    rom[0x100..0x100 + marker.len()].copy_from_slice(marker);
    rom
}

#[test]
fn eeprom_marker_selects_eeprom_8k_backend() {
    let mut gba = common::bare_console();
    gba.load_rom(&rom_with_marker(b"EEPROM_V120")).unwrap();
    assert_eq!(gba.get_save().len(), 8 * 1024);
}

#[test]
fn flash1m_marker_selects_flash_128k_backend() {
    let mut gba = common::bare_console();
    gba.load_rom(&rom_with_marker(b"FLASH1M_V102")).unwrap();
    assert_eq!(gba.get_save().len(), 128 * 1024);
}

#[test]
fn no_marker_defaults_to_sram() {
    let mut gba = common::bare_console();
    gba.load_rom(&rom_with_marker(b"NOTHING_HERE")).unwrap();
    assert_eq!(gba.get_save().len(), 32 * 1024);
}
