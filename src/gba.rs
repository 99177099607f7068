//! Top-level owning struct. Holds every memory region and peripheral as a
//! plain field and implements `Bus`/`DmaBus` on itself, following the single
//! owning struct shape of the teacher's `machines/src/pacman.rs`
//! (`PacmanSystem` + `impl Bus for PacmanSystem`), including its raw-pointer
//! split-borrow trick for giving the CPU a `&mut dyn Bus` onto the very
//! struct it is a field of (see `PacmanSystem::tick`).

use crate::apu::{Apu, StereoSample};
use crate::bus::{self, Bus};
use crate::cpu::Cpu;
use crate::dma::{DmaBus, DmaController};
use crate::error::{self, LoadError};
use crate::interrupt::{
    InterruptController, IRQ_DMA0, IRQ_DMA1, IRQ_DMA2, IRQ_DMA3, IRQ_TIMER0, IRQ_TIMER1,
    IRQ_TIMER2, IRQ_TIMER3,
};
use crate::keypad::Keypad;
use crate::ppu::{FrameEvent, Ppu};
use crate::save::{self, SaveBackend};
use crate::timers::TimerBlock;

const DMA_IRQ: [u16; 4] = [IRQ_DMA0, IRQ_DMA1, IRQ_DMA2, IRQ_DMA3];
const TIMER_IRQ: [u16; 4] = [IRQ_TIMER0, IRQ_TIMER1, IRQ_TIMER2, IRQ_TIMER3];

/// A complete Game Boy Advance system: CPU, bus, and every peripheral.
pub struct Gba {
    cpu: Cpu,
    interrupt: InterruptController,
    timers: TimerBlock,
    dma: DmaController,
    apu: Apu,
    ppu: Ppu,
    keypad: Keypad,

    bios: Vec<u8>,
    // Last word fetched while PC was inside the BIOS region. A read issued
    // from outside the BIOS sees this instead of the array (§3/§7 open-bus
    // policy) rather than the real contents, since real hardware only drives
    // the BIOS data bus for BIOS-resident fetches.
    bios_latch: u32,
    ewram: Vec<u8>,
    iwram: Vec<u8>,
    palette: Vec<u8>,
    vram: Vec<u8>,
    oam: Vec<u8>,
    rom: Vec<u8>,
    save: SaveBackend,

    waitcnt: u16,
    postflg: u8,
}

impl Default for Gba {
    fn default() -> Self {
        let mut gba = Gba {
            cpu: Cpu::new(),
            interrupt: InterruptController::default(),
            timers: TimerBlock::default(),
            dma: DmaController::default(),
            apu: Apu::default(),
            ppu: Ppu::default(),
            keypad: Keypad::default(),
            bios: vec![0u8; bus::BIOS_SIZE],
            bios_latch: 0,
            ewram: vec![0u8; bus::EWRAM_SIZE],
            iwram: vec![0u8; bus::IWRAM_SIZE],
            palette: vec![0u8; bus::PALETTE_SIZE],
            vram: vec![0u8; bus::VRAM_SIZE],
            oam: vec![0u8; bus::OAM_SIZE],
            rom: Vec::new(),
            save: SaveBackend::None,
            waitcnt: 0,
            postflg: 0,
        };
        gba.cpu.reset();
        gba
    }
}

impl Gba {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        let rom = std::mem::take(&mut self.rom);
        let save = std::mem::replace(&mut self.save, SaveBackend::None);
        *self = Gba::default();
        self.rom = rom;
        self.save = save;
    }

    pub fn load_bios(&mut self, bytes: &[u8]) -> Result<(), LoadError> {
        error::check_bios(bytes)?;
        self.bios.fill(0);
        self.bios[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    pub fn load_rom(&mut self, bytes: &[u8]) -> Result<(), LoadError> {
        error::check_rom(bytes)?;
        self.rom = bytes.to_vec();
        let kind = save::detect(&self.rom);
        log::debug!(target: "gba_core::gba", "detected save type {:?}", kind);
        self.save = SaveBackend::new(kind);
        Ok(())
    }

    pub fn load_save(&mut self, bytes: &[u8]) -> Result<(), LoadError> {
        error::check_save(bytes)?;
        self.save.load(bytes);
        Ok(())
    }

    pub fn get_save(&self) -> Vec<u8> {
        self.save.dump()
    }

    pub fn set_key(&mut self, bitmask: u16, pressed: bool) {
        self.keypad.set_key(bitmask, pressed, &mut self.interrupt);
    }

    pub fn pull_audio(&mut self, max_samples: usize) -> Vec<StereoSample> {
        self.apu.pull_audio(max_samples)
    }

    pub fn framebuffer(&self) -> &[u8] {
        &self.ppu.framebuffer
    }

    /// Informational only: the core's own cycle counting is fixed per
    /// `SPEC_FULL.md` §1's non-goals, but a host or future cycle-accurate
    /// front-end can read what WAITCNT was programmed to.
    pub fn wait_states_for(&self, region: u32) -> (u32, u32) {
        let (n_bits, s_bit) = match region {
            0 => ((self.waitcnt >> 2) & 0x3, (self.waitcnt >> 4) & 0x1),
            1 => ((self.waitcnt >> 5) & 0x3, (self.waitcnt >> 7) & 0x1),
            2 => ((self.waitcnt >> 8) & 0x3, (self.waitcnt >> 10) & 0x1),
            _ => (self.waitcnt & 0x3, 0),
        };
        const N_TABLE: [u32; 4] = [4, 3, 2, 8];
        let n = N_TABLE[n_bits as usize];
        let s = if s_bit != 0 { 1 } else { 2 };
        (n, s)
    }

    /// Runs until the PPU signals end-of-frame (VCOUNT 159 -> 160) and
    /// returns the produced 240x160x3 RGB framebuffer.
    pub fn step_frame(&mut self) -> &[u8] {
        loop {
            if self.run_one_step() {
                break;
            }
        }
        &self.ppu.framebuffer
    }

    /// Drains any runnable DMA transfer, then runs one CPU step (or a
    /// halted no-op), advancing every other peripheral by the elapsed
    /// cycles. Returns whether a frame completed during this step.
    fn run_one_step(&mut self) -> bool {
        let mut frame_complete = false;

        loop {
            let gba_ptr: *mut Gba = self;
            let result = unsafe {
                let bus = &mut *gba_ptr as &mut dyn DmaBus;
                self.dma.step(bus)
            };
            let Some(result) = result else { break };
            if let Some(ch) = result.irq_channel {
                self.interrupt.raise(DMA_IRQ[ch]);
            }
            frame_complete |= self.advance_peripherals(result.cycles);
        }

        // Raw line wakes HALT/STOP regardless of IME; dispatch additionally
        // requires IME (InterruptController::pending).
        let irq_line = (self.interrupt.ie & self.interrupt.if_) != 0;
        let irq_service = self.interrupt.pending();
        let gba_ptr: *mut Gba = self;
        let cycles = unsafe {
            let bus = &mut *gba_ptr as &mut dyn Bus;
            self.cpu.step(bus, irq_line, irq_service)
        };
        frame_complete |= self.advance_peripherals(cycles);
        frame_complete
    }

    fn advance_peripherals(&mut self, cycles: u32) -> bool {
        let mut overflows = Vec::new();
        self.timers.step(cycles, &mut overflows);
        for ov in overflows {
            if ov.irq {
                self.interrupt.raise(TIMER_IRQ[ov.timer_id]);
            }
            if ov.fifo_a || ov.fifo_b {
                let req = self.apu.on_timer_overflow(ov.timer_id);
                if req.fifo_a {
                    self.dma.on_sound_fifo(0);
                }
                if req.fifo_b {
                    self.dma.on_sound_fifo(1);
                }
            }
        }

        self.apu.step(cycles);

        let mut events = Vec::new();
        self.ppu.step(cycles, &self.vram, &self.oam, &self.palette, &mut self.interrupt, &mut events);

        let mut frame_complete = false;
        for ev in events {
            match ev {
                FrameEvent::HBlankStart => self.dma.on_hblank(),
                FrameEvent::VBlankStart => self.dma.on_vblank(),
                FrameEvent::FrameComplete => frame_complete = true,
                FrameEvent::None => {}
            }
        }
        frame_complete
    }

    fn vram_offset(addr: u32) -> usize {
        let mut offset = (addr as usize) % bus::VRAM_LOGICAL_SIZE;
        if offset >= 0x1_8000 {
            offset -= 0x8000;
        }
        offset
    }

    /// BIOS is only driven onto the bus while PC is itself inside the BIOS;
    /// otherwise the last word fetched from it is what reads back (§3/§7).
    fn read_bios_byte(&mut self, addr: u32) -> u8 {
        let offset = (addr as usize) & (bus::BIOS_SIZE - 1);
        if self.cpu.regs.pc >> 24 == 0 {
            let word_offset = offset & !3;
            self.bios_latch = u32::from_le_bytes([
                self.bios[word_offset],
                self.bios[word_offset + 1],
                self.bios[word_offset + 2],
                self.bios[word_offset + 3],
            ]);
            self.bios[offset]
        } else {
            let shift = (offset as u32 & 3) * 8;
            (self.bios_latch >> shift) as u8
        }
    }

    fn rom_byte(&self, addr: u32) -> u8 {
        let offset = (addr & 0x01FF_FFFF) as usize;
        self.rom.get(offset).copied().unwrap_or(0xFF)
    }

    // --- I/O register access -------------------------------------------

    fn io_read16(&mut self, addr: u32) -> u16 {
        match addr & 0x3FE {
            0x000 => self.ppu.dispcnt,
            0x004 => self.ppu.dispstat,
            0x006 => self.ppu.vcount,
            0x008 => self.ppu.bgcnt[0],
            0x00A => self.ppu.bgcnt[1],
            0x00C => self.ppu.bgcnt[2],
            0x00E => self.ppu.bgcnt[3],
            0x048 | 0x04A | 0x04C | 0x050 | 0x052 | 0x054 => 0,
            0x060 => 0,
            0x062 => 0,
            0x064 => 0,
            0x068 => 0,
            0x06C => 0,
            0x070 => 0,
            0x072 => 0,
            0x074 => 0,
            0x078 => 0,
            0x07C => 0,
            0x080 => self.apu_soundcnt_l(),
            0x082 => self.apu_soundcnt_h(),
            0x084 => self.apu_soundcnt_x(),
            0x088 => self.apu_soundbias(),
            0x0B0..=0x0DE => self.dma_read16(addr),
            0x100 => self.timers.counter(0),
            0x102 => self.timers.timers[0].control,
            0x104 => self.timers.counter(1),
            0x106 => self.timers.timers[1].control,
            0x108 => self.timers.counter(2),
            0x10A => self.timers.timers[2].control,
            0x10C => self.timers.counter(3),
            0x10E => self.timers.timers[3].control,
            0x130 => self.keypad.keyinput(),
            0x132 => self.keypad.keycnt,
            0x200 => self.interrupt.ie,
            0x202 => self.interrupt.if_,
            0x204 => self.waitcnt,
            0x208 => self.interrupt.ime as u16,
            _ => 0,
        }
    }

    fn io_write16(&mut self, addr: u32, value: u16) {
        match addr & 0x3FE {
            0x000 => self.ppu.dispcnt = value,
            0x004 => self.ppu.dispstat = (self.ppu.dispstat & 0x0007) | (value & !0x0007),
            0x008 => self.ppu.bgcnt[0] = value,
            0x00A => self.ppu.bgcnt[1] = value,
            0x00C => self.ppu.bgcnt[2] = value,
            0x00E => self.ppu.bgcnt[3] = value,
            0x010 => self.ppu.bg_scroll_x[0] = value & 0x1FF,
            0x012 => self.ppu.bg_scroll_y[0] = value & 0x1FF,
            0x014 => self.ppu.bg_scroll_x[1] = value & 0x1FF,
            0x016 => self.ppu.bg_scroll_y[1] = value & 0x1FF,
            0x018 => self.ppu.bg_scroll_x[2] = value & 0x1FF,
            0x01A => self.ppu.bg_scroll_y[2] = value & 0x1FF,
            0x01C => self.ppu.bg_scroll_x[3] = value & 0x1FF,
            0x01E => self.ppu.bg_scroll_y[3] = value & 0x1FF,
            0x020 => self.ppu.bg_affine_params[0][0] = value as i16,
            0x022 => self.ppu.bg_affine_params[0][1] = value as i16,
            0x024 => self.ppu.bg_affine_params[0][2] = value as i16,
            0x026 => self.ppu.bg_affine_params[0][3] = value as i16,
            0x028 => self.ppu.write_bg_affine_ref_x(0, true, value),
            0x02A => self.ppu.write_bg_affine_ref_x(0, false, value),
            0x02C => self.ppu.write_bg_affine_ref_y(0, true, value),
            0x02E => self.ppu.write_bg_affine_ref_y(0, false, value),
            0x030 => self.ppu.bg_affine_params[1][0] = value as i16,
            0x032 => self.ppu.bg_affine_params[1][1] = value as i16,
            0x034 => self.ppu.bg_affine_params[1][2] = value as i16,
            0x036 => self.ppu.bg_affine_params[1][3] = value as i16,
            0x038 => self.ppu.write_bg_affine_ref_x(1, true, value),
            0x03A => self.ppu.write_bg_affine_ref_x(1, false, value),
            0x03C => self.ppu.write_bg_affine_ref_y(1, true, value),
            0x03E => self.ppu.write_bg_affine_ref_y(1, false, value),
            // Windows/mosaic/blend registers: accepted, not composited (DESIGN.md).
            0x040..=0x055 => {}
            0x060 => self.apu.square1.write_sweep(value),
            0x062 => self.apu.square1.write_duty_len_envelope(value),
            0x064 => self.apu.square1.write_frequency_control(value),
            0x068 => self.apu.square2.write_duty_len_envelope(value),
            0x06C => self.apu.square2.write_frequency_control(value),
            0x070 => self.apu.wave.write_control(value),
            0x072 => self.apu.wave.write_length_volume(value),
            0x074 => self.apu.wave.write_frequency_control(value),
            0x078 => self.apu.noise.write_len_envelope(value),
            0x07C => self.apu.noise.write_frequency_control(value),
            0x080 => self.apu.write_soundcnt_l(value),
            0x082 => self.apu.write_soundcnt_h(value),
            0x084 => self.apu.write_soundcnt_x(value),
            0x088 => self.apu.write_soundbias(value),
            0x090..=0x09E => {
                let base = (addr & 0x3FE) as usize - 0x90;
                self.apu.wave.write_ram(base, value as u8);
                self.apu.wave.write_ram(base + 1, (value >> 8) as u8);
            }
            0x0A0 | 0x0A2 => {}
            0x0A4 | 0x0A6 => {}
            0x0B0..=0x0DE => self.dma_write16(addr, value),
            0x100 => self.timers.write_reload(0, value),
            0x102 => self.timers.write_control(0, value),
            0x104 => self.timers.write_reload(1, value),
            0x106 => self.timers.write_control(1, value),
            0x108 => self.timers.write_reload(2, value),
            0x10A => self.timers.write_control(2, value),
            0x10C => self.timers.write_reload(3, value),
            0x10E => self.timers.write_control(3, value),
            0x130 => {}
            0x132 => self.keypad.write_keycnt(value),
            0x200 => self.interrupt.write_ie(value),
            0x202 => self.interrupt.write_if(value),
            0x204 => self.waitcnt = value & 0xDFFF,
            0x208 => self.interrupt.write_ime(value as u32),
            _ => {}
        }
    }

    fn apu_soundcnt_l(&self) -> u16 {
        // SOUNDCNT_L has no dedicated getter on Apu; reconstructed is
        // unnecessary since the register only has write-visible bits that
        // the host never reads back in practice. Exposed as zero here and
        // tracked by Apu internally for mixing.
        0
    }
    fn apu_soundcnt_h(&self) -> u16 {
        0
    }
    fn apu_soundcnt_x(&self) -> u16 {
        let mut v = 0u16;
        if self.apu.square1.enabled {
            v |= 0x1;
        }
        if self.apu.square2.enabled {
            v |= 0x2;
        }
        if self.apu.wave.enabled {
            v |= 0x4;
        }
        if self.apu.noise.enabled {
            v |= 0x8;
        }
        v
    }
    fn apu_soundbias(&self) -> u16 {
        0x0200
    }

    fn dma_channel_base(addr: u32) -> (usize, u32) {
        let offset = (addr & 0x3FE) - 0x0B0;
        let id = (offset / 0xC) as usize;
        (id, offset % 0xC)
    }

    fn dma_read16(&mut self, addr: u32) -> u16 {
        let (id, reg) = Self::dma_channel_base(addr);
        if id >= 4 {
            return 0;
        }
        match reg {
            0xA => self.dma.read_control(id),
            _ => 0,
        }
    }

    fn dma_write16(&mut self, addr: u32, value: u16) {
        let (id, reg) = Self::dma_channel_base(addr);
        if id >= 4 {
            return;
        }
        match reg {
            0x0 => self.dma.channels[id].write_source_low(value),
            0x2 => self.dma.channels[id].write_source_high(value),
            0x4 => self.dma.channels[id].write_dest_low(value),
            0x6 => self.dma.channels[id].write_dest_high(value),
            0x8 => self.dma.channels[id].write_count(value),
            0xA => self.dma.write_control(id, value),
            _ => {}
        }
    }

    fn io_read8(&mut self, addr: u32) -> u8 {
        match addr & 0x3FF {
            0x090..=0x09F => self.apu.wave.read_ram((addr & 0xF) as usize),
            0x300 => self.postflg,
            0x301 => 0,
            _ => {
                let aligned = addr & !1;
                let value = self.io_read16(aligned);
                if addr & 1 == 0 {
                    value as u8
                } else {
                    (value >> 8) as u8
                }
            }
        }
    }

    fn io_write8(&mut self, addr: u32, value: u8) {
        match addr & 0x3FF {
            0x090..=0x09F => self.apu.wave.write_ram((addr & 0xF) as usize, value),
            0x200 => self.interrupt.write_ie((self.interrupt.ie & 0xFF00) | value as u16),
            0x201 => self.interrupt.write_ie((self.interrupt.ie & 0x00FF) | ((value as u16) << 8)),
            0x202 => self.interrupt.write_if(value as u16),
            0x203 => self.interrupt.write_if((value as u16) << 8),
            0x208 => self.interrupt.write_ime(value as u32),
            0x300 => self.postflg = value,
            0x301 => {
                if value & 0x80 != 0 {
                    self.cpu.stop();
                } else {
                    self.cpu.halt();
                }
            }
            _ => {
                let aligned = addr & !1;
                let current = self.io_read16(aligned);
                let updated = if addr & 1 == 0 {
                    (current & 0xFF00) | value as u16
                } else {
                    (current & 0x00FF) | ((value as u16) << 8)
                };
                self.io_write16(aligned, updated);
            }
        }
    }
}

impl Bus for Gba {
    fn read8(&mut self, addr: u32) -> u8 {
        match bus::region(addr) {
            bus::REGION_BIOS => self.read_bios_byte(addr),
            bus::REGION_EWRAM => self.ewram[(addr as usize) & (bus::EWRAM_SIZE - 1)],
            bus::REGION_IWRAM => self.iwram[(addr as usize) & (bus::IWRAM_SIZE - 1)],
            bus::REGION_IO => self.io_read8(addr),
            bus::REGION_PALETTE => self.palette[(addr as usize) & (bus::PALETTE_SIZE - 1)],
            bus::REGION_VRAM => self.vram[Self::vram_offset(addr)],
            bus::REGION_OAM => self.oam[(addr as usize) & (bus::OAM_SIZE - 1)],
            0x8..=0xD => self.rom_byte(addr),
            bus::REGION_SRAM | 0xF => self.save.read8(addr),
            _ => 0xFF,
        }
    }

    fn read16(&mut self, addr: u32) -> u16 {
        let addr = addr & !1;
        let region = bus::region(addr);
        match region {
            bus::REGION_BIOS | bus::REGION_EWRAM | bus::REGION_IWRAM | bus::REGION_PALETTE
            | bus::REGION_VRAM | bus::REGION_OAM => {
                u16::from_le_bytes([self.read8(addr), self.read8(addr + 1)])
            }
            0x8..=0xD => {
                if self.save.is_eeprom() && (region == 0xC || region == 0xD) {
                    self.save.eeprom_read_bit()
                } else {
                    u16::from_le_bytes([self.read8(addr), self.read8(addr + 1)])
                }
            }
            bus::REGION_IO => self.io_read16(addr),
            bus::REGION_SRAM | 0xF => {
                // SRAM is wired to D0-D7 only; wider accesses see the byte
                // replicated across lanes.
                let byte = self.save.read8(addr) as u16;
                byte | (byte << 8)
            }
            _ => 0xFFFF,
        }
    }

    fn read32(&mut self, addr: u32) -> u32 {
        let addr = addr & !3;
        let lo = self.read16(addr) as u32;
        let hi = self.read16(addr + 2) as u32;
        lo | (hi << 16)
    }

    fn write8(&mut self, addr: u32, value: u8) {
        match bus::region(addr) {
            bus::REGION_BIOS => {}
            bus::REGION_EWRAM => self.ewram[(addr as usize) & (bus::EWRAM_SIZE - 1)] = value,
            bus::REGION_IWRAM => self.iwram[(addr as usize) & (bus::IWRAM_SIZE - 1)] = value,
            bus::REGION_IO => self.io_write8(addr, value),
            bus::REGION_PALETTE => {
                // 8-bit writes to palette/VRAM write the byte into both
                // halves of the containing halfword (SPEC_FULL.md §5).
                let aligned = (addr as usize) & (bus::PALETTE_SIZE - 1) & !1;
                self.palette[aligned] = value;
                self.palette[aligned + 1] = value;
            }
            bus::REGION_VRAM => {
                let aligned = Self::vram_offset(addr) & !1;
                if aligned < self.vram.len() {
                    self.vram[aligned] = value;
                }
                if aligned + 1 < self.vram.len() {
                    self.vram[aligned + 1] = value;
                }
            }
            bus::REGION_OAM => {
                // 8-bit writes to OAM are ignored entirely (SPEC_FULL.md §5).
            }
            0x8..=0xD => {}
            bus::REGION_SRAM | 0xF => self.save.write8(addr, value),
            _ => {}
        }
    }

    fn write16(&mut self, addr: u32, value: u16) {
        let addr = addr & !1;
        match bus::region(addr) {
            bus::REGION_BIOS => {}
            bus::REGION_EWRAM => {
                let a = (addr as usize) & (bus::EWRAM_SIZE - 1);
                self.ewram[a..a + 2].copy_from_slice(&value.to_le_bytes());
            }
            bus::REGION_IWRAM => {
                let a = (addr as usize) & (bus::IWRAM_SIZE - 1);
                self.iwram[a..a + 2].copy_from_slice(&value.to_le_bytes());
            }
            bus::REGION_IO => self.io_write16(addr, value),
            bus::REGION_PALETTE => {
                let a = (addr as usize) & (bus::PALETTE_SIZE - 1);
                self.palette[a..a + 2].copy_from_slice(&value.to_le_bytes());
            }
            bus::REGION_VRAM => {
                let a = Self::vram_offset(addr);
                if a + 1 < self.vram.len() {
                    self.vram[a..a + 2].copy_from_slice(&value.to_le_bytes());
                }
            }
            bus::REGION_OAM => {
                let a = (addr as usize) & (bus::OAM_SIZE - 1);
                self.oam[a..a + 2].copy_from_slice(&value.to_le_bytes());
            }
            0x8..=0xD => {
                let region = bus::region(addr);
                if self.save.is_eeprom() && (region == 0xC || region == 0xD) {
                    self.save.eeprom_write_bit(value);
                }
            }
            bus::REGION_SRAM | 0xF => self.save.write8(addr, value as u8),
            _ => {}
        }
    }

    fn write32(&mut self, addr: u32, value: u32) {
        let addr = addr & !3;
        match bus::region(addr) {
            bus::REGION_IO => {
                self.io_write16(addr, value as u16);
                self.io_write16(addr + 2, (value >> 16) as u16);
                if addr & 0x3FE == 0x0A0 {
                    self.apu.fifo_write(0, value);
                } else if addr & 0x3FE == 0x0A4 {
                    self.apu.fifo_write(1, value);
                }
            }
            _ => {
                self.write16(addr, value as u16);
                self.write16(addr + 2, (value >> 16) as u16);
            }
        }
    }
}

impl DmaBus for Gba {
    fn dma_read16(&mut self, addr: u32) -> u16 {
        self.read16(addr)
    }
    fn dma_write16(&mut self, addr: u32, value: u16) {
        self.write16(addr, value)
    }
    fn dma_read32(&mut self, addr: u32) -> u32 {
        self.read32(addr)
    }
    fn dma_write32(&mut self, addr: u32, value: u32) {
        self.write32(addr, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_rom() -> Vec<u8> {
        vec![0u8; 0x200]
    }

    #[test]
    fn load_rom_detects_sram_default() {
        let mut gba = Gba::new();
        gba.load_rom(&minimal_rom()).unwrap();
        assert!(matches!(gba.save, SaveBackend::Sram(_)));
    }

    #[test]
    fn ewram_round_trips_through_bus() {
        let mut gba = Gba::new();
        gba.write32(0x0200_0000, 0xDEAD_BEEF);
        assert_eq!(gba.read32(0x0200_0000), 0xDEAD_BEEF);
    }

    #[test]
    fn vram_mirror_quirk_folds_upper_32k() {
        let mut gba = Gba::new();
        gba.write16(0x0601_0000, 0x1234);
        assert_eq!(gba.read16(0x0601_8000), 0x1234);
    }

    #[test]
    fn oam_byte_write_is_ignored() {
        let mut gba = Gba::new();
        gba.write16(0x0700_0000, 0xAAAA);
        gba.write8(0x0700_0000, 0x11);
        assert_eq!(gba.read16(0x0700_0000), 0xAAAA);
    }

    #[test]
    fn palette_byte_write_duplicates_into_halfword() {
        let mut gba = Gba::new();
        gba.write8(0x0500_0000, 0x7F);
        assert_eq!(gba.read16(0x0500_0000), 0x7F7F);
    }

    #[test]
    fn keypad_irq_reaches_vector_when_enabled() {
        let mut gba = Gba::new();
        gba.load_bios(&[0u8; 16 * 1024]).unwrap();
        gba.write16(0x0400_0132, 0xC001); // KEYCNT: IRQ enable, AND mode, select A
        gba.write16(0x0400_0200, 0x1000); // IE: keypad
        gba.write32(0x0400_0208, 1); // IME
        gba.cpu_regs_for_test().set_irq_disabled(false);
        gba.set_key(0x0001, true);
        assert!(gba.interrupt.pending());
        gba.run_one_step();
        assert_eq!(gba.cpu_regs_for_test().mode(), crate::cpu::Mode::Irq);
        assert_eq!(gba.cpu_regs_for_test().pc, crate::cpu::VECTOR_IRQ);
    }

    impl Gba {
        fn cpu_regs_for_test(&mut self) -> &mut crate::cpu::RegisterFile {
            &mut self.cpu.regs
        }
    }
}
