//! Cartridge save backends: SRAM, Flash 64K/128K, EEPROM 512B/8K.
//!
//! Grounded on `original_source/memory/save_manager.py`; the EEPROM write
//! path and the detection entry point are reconstructed/generalized per
//! `SPEC_FULL.md` §6 and `DESIGN.md`'s Open Question log.

mod eeprom;
mod flash;

use eeprom::Eeprom;
use flash::Flash;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    None,
    Sram,
    Flash64K,
    Flash128K,
    Eeprom512,
    Eeprom8K,
}

/// Scans ROM bytes for the ASCII marker strings that real cartridges embed
/// to let the BIOS' save-type prober identify them. Pure and idempotent.
pub fn detect(rom: &[u8]) -> SaveKind {
    let text = String::from_utf8_lossy(rom);
    if text.contains("EEPROM_V") {
        SaveKind::Eeprom8K
    } else if text.contains("FLASH1M_V") {
        SaveKind::Flash128K
    } else if text.contains("FLASH_V") || text.contains("FLASH512_V") {
        SaveKind::Flash64K
    } else if text.contains("SRAM_V") || text.contains("SRAM_F_V") {
        SaveKind::Sram
    } else {
        SaveKind::Sram
    }
}

#[derive(Debug, Clone)]
pub enum SaveBackend {
    None,
    Sram(Vec<u8>),
    Flash(Flash),
    Eeprom(Eeprom),
}

impl SaveBackend {
    pub fn new(kind: SaveKind) -> Self {
        match kind {
            SaveKind::None => SaveBackend::None,
            SaveKind::Sram => SaveBackend::Sram(vec![0xFFu8; 32 * 1024]),
            SaveKind::Flash64K => SaveBackend::Flash(Flash::new(false)),
            SaveKind::Flash128K => SaveBackend::Flash(Flash::new(true)),
            SaveKind::Eeprom512 => SaveBackend::Eeprom(Eeprom::new(512)),
            SaveKind::Eeprom8K => SaveBackend::Eeprom(Eeprom::new(8 * 1024)),
        }
    }

    pub fn load(&mut self, bytes: &[u8]) {
        match self {
            SaveBackend::None => {}
            SaveBackend::Sram(data) => {
                let n = bytes.len().min(data.len());
                data[..n].copy_from_slice(&bytes[..n]);
            }
            SaveBackend::Flash(f) => f.load(bytes),
            SaveBackend::Eeprom(e) => e.load(bytes),
        }
    }

    pub fn dump(&self) -> Vec<u8> {
        match self {
            SaveBackend::None => Vec::new(),
            SaveBackend::Sram(data) => data.clone(),
            SaveBackend::Flash(f) => f.dump(),
            SaveBackend::Eeprom(e) => e.dump(),
        }
    }

    pub fn read8(&mut self, addr: u32) -> u8 {
        match self {
            SaveBackend::None => 0xFF,
            SaveBackend::Sram(data) => {
                let a = (addr as usize) & 0x7FFF;
                data.get(a).copied().unwrap_or(0xFF)
            }
            SaveBackend::Flash(f) => f.read(addr),
            SaveBackend::Eeprom(_) => 0xFF,
        }
    }

    pub fn write8(&mut self, addr: u32, value: u8) {
        match self {
            SaveBackend::None => {}
            SaveBackend::Sram(data) => {
                let a = (addr as usize) & 0x7FFF;
                if a < data.len() {
                    data[a] = value;
                }
            }
            SaveBackend::Flash(f) => f.write(addr, value),
            SaveBackend::Eeprom(_) => {}
        }
    }

    /// EEPROM is accessed as a DMA-driven bit-serial 16-bit window; bit 0 of
    /// each halfword carries the serial line.
    pub fn eeprom_read_bit(&mut self) -> u16 {
        match self {
            SaveBackend::Eeprom(e) => e.read_bit(),
            _ => 1,
        }
    }

    pub fn eeprom_write_bit(&mut self, bit: u16) {
        if let SaveBackend::Eeprom(e) = self {
            e.write_bit(bit & 1 != 0);
        }
    }

    pub fn is_eeprom(&self) -> bool {
        matches!(self, SaveBackend::Eeprom(_))
    }
}
