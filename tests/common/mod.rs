use gba_core::prelude::Gba;

/// Builds a console with a zeroed BIOS and no game ROM loaded, ready for a
/// test to poke memory/registers directly through the public `Bus` impl.
pub fn bare_console() -> Gba {
    let mut gba = Gba::new();
    gba.load_bios(&vec![0u8; 16 * 1024]).expect("zeroed BIOS is always valid");
    gba
}
