//! Scanline renderer and timing generator. Structure grounded on the
//! teacher's `machines/src/pacman.rs` (`tick`'s frame/line counters and
//! `build_palette`); per-mode semantics ported from
//! `original_source/ppu/ppu.py` and `original_source/ppu/sprites.py`.

mod background;
mod palette;
mod sprites;

use background::{render_affine_scanline, render_text_scanline, AffineRef, BgControl};
use sprites::{render_scanline as render_sprite_scanline, SpritePixel};

use crate::interrupt::{InterruptController, IRQ_HBLANK, IRQ_VBLANK, IRQ_VCOUNT};

pub const SCREEN_WIDTH: usize = 240;
pub const SCREEN_HEIGHT: usize = 160;
pub const CYCLES_PER_LINE: u32 = 1232;
pub const H_DRAW_CYCLES: u32 = 960;
pub const VISIBLE_LINES: u32 = 160;
pub const TOTAL_LINES: u32 = 228;

#[derive(Debug, Clone, Copy, Default)]
pub enum FrameEvent {
    #[default]
    None,
    HBlankStart,
    VBlankStart,
    FrameComplete,
}

#[derive(Debug, Clone)]
pub struct Ppu {
    pub dispcnt: u16,
    pub dispstat: u16,
    pub vcount: u16,

    pub bgcnt: [u16; 4],
    pub bg_scroll_x: [u16; 4],
    pub bg_scroll_y: [u16; 4],

    pub bg_affine_params: [[i16; 4]; 2], // [BG2, BG3][PA,PB,PC,PD]
    pub bg_affine_ref_x: [i32; 2],
    pub bg_affine_ref_y: [i32; 2],
    internal_ref: [AffineRef; 2],

    line_cycle: u32,
    pub framebuffer: Vec<u8>,
}

impl Default for Ppu {
    fn default() -> Self {
        Ppu {
            dispcnt: 0,
            dispstat: 0,
            vcount: 0,
            bgcnt: [0; 4],
            bg_scroll_x: [0; 4],
            bg_scroll_y: [0; 4],
            bg_affine_params: [[0x0100, 0, 0, 0x0100]; 2],
            bg_affine_ref_x: [0; 2],
            bg_affine_ref_y: [0; 2],
            internal_ref: [AffineRef::default(); 2],
            line_cycle: 0,
            framebuffer: vec![0u8; SCREEN_WIDTH * SCREEN_HEIGHT * 3],
        }
    }
}

impl Ppu {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn mode(&self) -> u8 {
        (self.dispcnt & 0x7) as u8
    }

    fn obj_1d_mapping(&self) -> bool {
        self.dispcnt & 0x40 != 0
    }

    fn bg_enabled(&self, bg: usize) -> bool {
        self.dispcnt & (0x100 << bg) != 0
    }

    fn obj_enabled(&self) -> bool {
        self.dispcnt & 0x1000 != 0
    }

    pub fn write_bg_affine_ref_x(&mut self, bg: usize, low: bool, value: u16) {
        let current = self.bg_affine_ref_x[bg] as u32;
        let updated = if low {
            (current & 0xFFFF_0000) | value as u32
        } else {
            (current & 0x0000_FFFF) | ((value as u32) << 16)
        };
        self.bg_affine_ref_x[bg] = sign_extend_28(updated);
    }

    pub fn write_bg_affine_ref_y(&mut self, bg: usize, low: bool, value: u16) {
        let current = self.bg_affine_ref_y[bg] as u32;
        let updated = if low {
            (current & 0xFFFF_0000) | value as u32
        } else {
            (current & 0x0000_FFFF) | ((value as u32) << 16)
        };
        self.bg_affine_ref_y[bg] = sign_extend_28(updated);
    }

    /// Advances the scanline timer by `cycles` CPU cycles, firing
    /// HBlank/VBlank/VCount events at line boundaries. Returns the events
    /// that occurred, in order, so callers can notify DMA/IRQ/APU.
    pub fn step(
        &mut self,
        cycles: u32,
        vram: &[u8],
        oam: &[u8],
        bg_palette: &[u8],
        irq: &mut InterruptController,
        events: &mut Vec<FrameEvent>,
    ) {
        let mut remaining = cycles;
        while remaining > 0 {
            let take = remaining.min(CYCLES_PER_LINE - self.line_cycle);
            let was_before_hblank = self.line_cycle < H_DRAW_CYCLES;
            self.line_cycle += take;
            remaining -= take;

            if was_before_hblank && self.line_cycle >= H_DRAW_CYCLES {
                self.dispstat |= 0x2;
                // Line 227's H-Blank never raises the H-Blank IRQ (SPEC_FULL.md §3 invariant).
                if self.dispstat & 0x10 != 0 && self.vcount as u32 != TOTAL_LINES - 1 {
                    irq.raise(IRQ_HBLANK);
                }
                events.push(FrameEvent::HBlankStart);
                if (self.vcount as u32) < VISIBLE_LINES {
                    self.render_line(self.vcount as u32, vram, oam, bg_palette);
                }
            }

            if self.line_cycle >= CYCLES_PER_LINE {
                self.line_cycle -= CYCLES_PER_LINE;
                self.dispstat &= !0x2;
                self.vcount = ((self.vcount as u32 + 1) % TOTAL_LINES) as u16;

                let match_line = (self.dispstat >> 8) & 0xFF;
                if self.vcount == match_line {
                    self.dispstat |= 0x4;
                    if self.dispstat & 0x20 != 0 {
                        irq.raise(IRQ_VCOUNT);
                    }
                } else {
                    self.dispstat &= !0x4;
                }

                if self.vcount as u32 == VISIBLE_LINES {
                    self.dispstat |= 0x1;
                    if self.dispstat & 0x8 != 0 {
                        irq.raise(IRQ_VBLANK);
                    }
                    self.internal_ref[0] = AffineRef { x: self.bg_affine_ref_x[0], y: self.bg_affine_ref_y[0] };
                    self.internal_ref[1] = AffineRef { x: self.bg_affine_ref_x[1], y: self.bg_affine_ref_y[1] };
                    events.push(FrameEvent::VBlankStart);
                    events.push(FrameEvent::FrameComplete);
                } else if self.vcount == 0 {
                    self.dispstat &= !0x1;
                }
            }
        }
    }

    fn render_line(&mut self, line: u32, vram: &[u8], oam: &[u8], palette: &[u8]) {
        let mut bg_layers: [Option<[Option<((u8, u8, u8), u8)>; SCREEN_WIDTH]>; 4] = Default::default();

        match self.mode() {
            0 => {
                for bg in 0..4 {
                    if self.bg_enabled(bg) {
                        bg_layers[bg] = Some(self.render_text_bg(bg, line, vram, palette));
                    }
                }
            }
            1 => {
                if self.bg_enabled(0) {
                    bg_layers[0] = Some(self.render_text_bg(0, line, vram, palette));
                }
                if self.bg_enabled(1) {
                    bg_layers[1] = Some(self.render_text_bg(1, line, vram, palette));
                }
                if self.bg_enabled(2) {
                    bg_layers[2] = Some(self.render_affine_bg(2, 0, vram, palette));
                }
            }
            2 => {
                if self.bg_enabled(2) {
                    bg_layers[2] = Some(self.render_affine_bg(2, 0, vram, palette));
                }
                if self.bg_enabled(3) {
                    bg_layers[3] = Some(self.render_affine_bg(3, 1, vram, palette));
                }
            }
            3 => {
                bg_layers[2] = Some(self.render_mode3(line, vram));
            }
            4 => {
                bg_layers[2] = Some(self.render_mode4(line, vram, palette));
            }
            5 => {
                bg_layers[2] = Some(self.render_mode5(line, vram, palette));
            }
            _ => {}
        }

        self.advance_affine_refs();

        let mut sprite_layer: [Option<SpritePixel>; SCREEN_WIDTH] = [None; SCREEN_WIDTH];
        if self.obj_enabled() {
            render_sprite_scanline(oam, vram, palette, line as i32, self.obj_1d_mapping(), &mut sprite_layer);
        }

        self.composite(line, &bg_layers, &sprite_layer, palette);
    }

    fn advance_affine_refs(&mut self) {
        for bg in 0..2 {
            let pb = self.bg_affine_params[bg][1] as i32;
            let pd = self.bg_affine_params[bg][3] as i32;
            self.internal_ref[bg].x += pb;
            self.internal_ref[bg].y += pd;
        }
    }

    fn render_text_bg(&self, bg: usize, line: u32, vram: &[u8], palette: &[u8]) -> [Option<((u8, u8, u8), u8)>; SCREEN_WIDTH] {
        let ctrl = BgControl::from_bits(self.bgcnt[bg]);
        let mut out = [None; SCREEN_WIDTH];
        render_text_scanline(&ctrl, vram, palette, self.bg_scroll_x[bg] as u32, self.bg_scroll_y[bg] as u32, line, &mut out);
        out
    }

    fn render_affine_bg(&self, bg: usize, affine_slot: usize, vram: &[u8], palette: &[u8]) -> [Option<((u8, u8, u8), u8)>; SCREEN_WIDTH] {
        let ctrl = BgControl::from_bits(self.bgcnt[bg]);
        let mut out = [None; SCREEN_WIDTH];
        let pa = self.bg_affine_params[affine_slot][0] as i32;
        let pc = self.bg_affine_params[affine_slot][2] as i32;
        render_affine_scanline(
            &ctrl,
            vram,
            palette,
            self.internal_ref[affine_slot].x,
            self.internal_ref[affine_slot].y,
            pa,
            pc,
            &mut out,
        );
        out
    }

    fn render_mode3(&self, line: u32, vram: &[u8]) -> [Option<((u8, u8, u8), u8)>; SCREEN_WIDTH] {
        let mut out = [None; SCREEN_WIDTH];
        let row_base = (line as usize) * SCREEN_WIDTH * 2;
        for x in 0..SCREEN_WIDTH {
            let off = row_base + x * 2;
            if off + 1 >= vram.len() {
                continue;
            }
            let color = u16::from_le_bytes([vram[off], vram[off + 1]]);
            out[x] = Some((palette::bgr555_to_rgb24(color), 2));
        }
        out
    }

    fn render_mode4(&self, line: u32, vram: &[u8], pal: &[u8]) -> [Option<((u8, u8, u8), u8)>; SCREEN_WIDTH] {
        let mut out = [None; SCREEN_WIDTH];
        let frame_offset = if self.dispcnt & 0x10 != 0 { 0xA000 } else { 0 };
        let row_base = frame_offset + (line as usize) * SCREEN_WIDTH;
        for x in 0..SCREEN_WIDTH {
            let idx = vram.get(row_base + x).copied().unwrap_or(0);
            if idx == 0 {
                continue;
            }
            let color = palette::read_palette_color_256(pal, idx as usize);
            out[x] = Some((palette::bgr555_to_rgb24(color), 2));
        }
        out
    }

    fn render_mode5(&self, line: u32, vram: &[u8], _pal: &[u8]) -> [Option<((u8, u8, u8), u8)>; SCREEN_WIDTH] {
        let mut out = [None; SCREEN_WIDTH];
        if line >= 128 {
            return out;
        }
        let frame_offset = if self.dispcnt & 0x10 != 0 { 0xA000 } else { 0 };
        let row_base = frame_offset + (line as usize) * 160 * 2;
        for x in 0..160usize.min(SCREEN_WIDTH) {
            let off = row_base + x * 2;
            if off + 1 >= vram.len() {
                continue;
            }
            let color = u16::from_le_bytes([vram[off], vram[off + 1]]);
            out[x] = Some((palette::bgr555_to_rgb24(color), 2));
        }
        out
    }

    fn composite(
        &mut self,
        line: u32,
        bg_layers: &[Option<[Option<((u8, u8, u8), u8)>; SCREEN_WIDTH]>; 4],
        sprite_layer: &[Option<SpritePixel>; SCREEN_WIDTH],
        palette: &[u8],
    ) {
        let backdrop = palette::read_palette_color_256(palette, 0);
        let backdrop_rgb = palette::bgr555_to_rgb24(backdrop);

        for x in 0..SCREEN_WIDTH {
            let mut best: Option<((u8, u8, u8), u8)> = None;
            let mut best_priority: u8 = 4;

            for layer in bg_layers.iter().flatten() {
                if let Some((rgb, priority)) = layer[x] {
                    if priority <= best_priority {
                        best = Some((rgb, priority));
                        best_priority = priority;
                    }
                }
            }

            if let Some(sprite) = sprite_layer[x] {
                if sprite.priority <= best_priority {
                    best = Some((sprite.rgb, sprite.priority));
                }
            }

            let (r, g, b) = best.map(|(rgb, _)| rgb).unwrap_or(backdrop_rgb);
            let row_base = (line as usize) * SCREEN_WIDTH * 3;
            self.framebuffer[row_base + x * 3] = r;
            self.framebuffer[row_base + x * 3 + 1] = g;
            self.framebuffer[row_base + x * 3 + 2] = b;
        }
    }
}

fn sign_extend_28(value: u32) -> i32 {
    let shifted = (value & 0x0FFF_FFFF) << 4;
    (shifted as i32) >> 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode3_scanline_matches_scenario() {
        let mut ppu = Ppu::default();
        ppu.dispcnt = 0x0403;
        let mut vram = vec![0u8; 0x18000];
        let colors: [u16; 4] = [0x001F, 0x03E0, 0x7C00, 0x7FFF];
        for (i, c) in colors.iter().enumerate() {
            let off = i * 2;
            vram[off..off + 2].copy_from_slice(&c.to_le_bytes());
        }
        let oam = vec![0u8; 1024];
        let palette = vec![0u8; 1024];
        ppu.render_line(0, &vram, &oam, &palette);
        assert_eq!(&ppu.framebuffer[0..12], &[248, 0, 0, 0, 248, 0, 0, 0, 248, 248, 248, 248]);
    }
}
