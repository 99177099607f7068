//! Typed failures for the three host-facing load entry points.
//!
//! Every other in-core operation is total (see `SPEC_FULL.md` §7); only
//! `load_bios`/`load_rom`/`load_save` can fail, and they fail with a reason
//! instead of a bare boolean.

use thiserror::Error;

pub const BIOS_SIZE: usize = 16 * 1024;
pub const MAX_ROM_SIZE: usize = 32 * 1024 * 1024;
pub const MIN_ROM_SIZE: usize = 0xC0;
pub const MAX_SAVE_SIZE: usize = 128 * 1024;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("image too large: got {got} bytes, maximum is {max}")]
    TooLarge { got: usize, max: usize },
    #[error("image too small: got {got} bytes, minimum is {min}")]
    TooSmall { got: usize, min: usize },
}

pub fn check_bios(bytes: &[u8]) -> Result<(), LoadError> {
    if bytes.len() > BIOS_SIZE {
        return Err(LoadError::TooLarge { got: bytes.len(), max: BIOS_SIZE });
    }
    Ok(())
}

pub fn check_rom(bytes: &[u8]) -> Result<(), LoadError> {
    if bytes.len() < MIN_ROM_SIZE {
        return Err(LoadError::TooSmall { got: bytes.len(), min: MIN_ROM_SIZE });
    }
    if bytes.len() > MAX_ROM_SIZE {
        return Err(LoadError::TooLarge { got: bytes.len(), max: MAX_ROM_SIZE });
    }
    Ok(())
}

pub fn check_save(bytes: &[u8]) -> Result<(), LoadError> {
    if bytes.len() > MAX_SAVE_SIZE {
        return Err(LoadError::TooLarge { got: bytes.len(), max: MAX_SAVE_SIZE });
    }
    Ok(())
}
