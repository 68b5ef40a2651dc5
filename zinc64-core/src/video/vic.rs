// This file is part of zinc64.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use bit_field::BitField;

use crate::factory::{Addressable, Chip, VicModel, VideoOutput};
use crate::util::{IrqLine, Pin, Ram, Shared, SharedCell, StateReader, StateWriter};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

use super::border_unit::BorderUnit;
use super::gfx_sequencer::{GfxSequencer, Mode as GfxMode};
use super::mux_unit::MuxUnit;
use super::spec::Spec;
use super::sprite_sequencer::{Mode as SpriteMode, SpriteSequencer};
use super::vic_memory::VicMemory;

// SPEC: The MOS 6567/6569 video controller (VIC-II) and its application in the Commodore 64

pub mod reg {
    pub const M0X: u8 = 0x00;
    pub const M0Y: u8 = 0x01;
    pub const M1X: u8 = 0x02;
    pub const M1Y: u8 = 0x03;
    pub const M2X: u8 = 0x04;
    pub const M2Y: u8 = 0x05;
    pub const M3X: u8 = 0x06;
    pub const M3Y: u8 = 0x07;
    pub const M4X: u8 = 0x08;
    pub const M4Y: u8 = 0x09;
    pub const M5X: u8 = 0x0a;
    pub const M5Y: u8 = 0x0b;
    pub const M6X: u8 = 0x0c;
    pub const M6Y: u8 = 0x0d;
    pub const M7X: u8 = 0x0e;
    pub const M7Y: u8 = 0x0f;
    pub const MX8: u8 = 0x10;
    pub const CR1: u8 = 0x11;
    pub const RASTER: u8 = 0x12;
    pub const LPX: u8 = 0x13;
    pub const LPY: u8 = 0x14;
    pub const ME: u8 = 0x15;
    pub const CR2: u8 = 0x16;
    pub const MYE: u8 = 0x17;
    pub const MEMPTR: u8 = 0x18;
    pub const IRR: u8 = 0x19;
    pub const IMR: u8 = 0x1a;
    pub const MDP: u8 = 0x1b;
    pub const MMC: u8 = 0x1c;
    pub const MXE: u8 = 0x1d;
    pub const MM: u8 = 0x1e;
    pub const MD: u8 = 0x1f;
    pub const EC: u8 = 0x20;
    pub const B0C: u8 = 0x21;
    pub const B1C: u8 = 0x22;
    pub const B2C: u8 = 0x23;
    pub const B3C: u8 = 0x24;
    pub const MM0: u8 = 0x25;
    pub const MM1: u8 = 0x26;
    pub const M0C: u8 = 0x27;
    pub const M1C: u8 = 0x28;
    pub const M2C: u8 = 0x29;
    pub const M3C: u8 = 0x2a;
    pub const M4C: u8 = 0x2b;
    pub const M5C: u8 = 0x2c;
    pub const M6C: u8 = 0x2d;
    pub const M7C: u8 = 0x2e;
}

const FIRST_DMA_LINE: u16 = 0x30;
const LAST_DMA_LINE: u16 = 0xf7;
const DMA_WINDOW_START: u16 = 15;
const DMA_WINDOW_END: u16 = 54;

enum IntSource {
    Raster = 0,
    SpriteBackground = 1,
    SpriteSprite = 2,
    LightPen = 3,
}

pub struct Vic {
    // Dependencies
    color_ram: Shared<Ram>,
    mem: VicMemory,
    frame_buffer: Shared<dyn VideoOutput>,
    vsync_flag: SharedCell<bool>,
    ba_line: Shared<Pin>,
    irq_line: Shared<IrqLine>,
    // Configuration
    spec: Spec,
    display_width: usize,
    // Control registers
    den: bool,
    raster_compare: u16,
    irq_enable: u8,
    irq_status: u8,
    scroll_x: u8,
    scroll_y: u8,
    video_matrix_base: u16,
    char_base: u16,
    light_pen_pos: [u8; 2],
    // Sequencers
    border_unit: BorderUnit,
    gfx_sequencer: GfxSequencer,
    sprites: [SpriteSequencer; 8],
    mux_unit: MuxUnit,
    sprite_active: [bool; 8],
    sprite_mc: [u8; 8],
    // Raster state
    raster_y: u16,
    raster_cycle: u16,
    vc: u16,
    vc_base: u16,
    rc: u8,
    vmli: usize,
    video_matrix_line: [u8; 40],
    color_line: [u8; 40],
    bad_line_enable: bool,
    is_bad_line: bool,
    display_state: bool,
    sprite_outputs: [Option<u8>; 8],
}

impl Vic {
    pub fn new(
        chip_model: VicModel,
        color_ram: Shared<Ram>,
        mem: VicMemory,
        frame_buffer: Shared<dyn VideoOutput>,
        vsync_flag: SharedCell<bool>,
        ba_line: Shared<Pin>,
        irq_line: Shared<IrqLine>,
    ) -> Self {
        let spec = Spec::new(chip_model);
        let (width, _height) = frame_buffer.borrow().get_dimension();
        Vic {
            color_ram,
            mem,
            frame_buffer,
            vsync_flag,
            ba_line,
            irq_line,
            spec,
            display_width: width,
            den: true,
            raster_compare: 0,
            irq_enable: 0,
            irq_status: 0,
            scroll_x: 0,
            scroll_y: 3,
            video_matrix_base: 1024,
            char_base: 4096,
            light_pen_pos: [0; 2],
            border_unit: BorderUnit::new(),
            gfx_sequencer: GfxSequencer::new(),
            sprites: [
                SpriteSequencer::new(),
                SpriteSequencer::new(),
                SpriteSequencer::new(),
                SpriteSequencer::new(),
                SpriteSequencer::new(),
                SpriteSequencer::new(),
                SpriteSequencer::new(),
                SpriteSequencer::new(),
            ],
            mux_unit: MuxUnit::new(),
            sprite_active: [false; 8],
            sprite_mc: [0; 8],
            raster_y: 0,
            raster_cycle: 1,
            vc: 0,
            vc_base: 0,
            rc: 0,
            vmli: 0,
            video_matrix_line: [0; 40],
            color_line: [0; 40],
            bad_line_enable: false,
            is_bad_line: false,
            display_state: false,
            sprite_outputs: [None; 8],
        }
    }

    fn clock_cycle(&mut self) {
        let x = (self.raster_cycle - 1) * 8;
        if self.raster_cycle == 1 {
            self.on_new_line();
        }
        if self.raster_y == FIRST_DMA_LINE && self.raster_cycle == 1 {
            self.bad_line_enable = self.den;
        }
        self.is_bad_line = self.bad_line_enable
            && self.raster_y >= FIRST_DMA_LINE
            && self.raster_y <= LAST_DMA_LINE
            && (self.raster_y & 0x07) == self.scroll_y as u16;
        if self.is_bad_line {
            self.display_state = true;
        }
        let within_window = self.raster_cycle >= DMA_WINDOW_START && self.raster_cycle <= DMA_WINDOW_END;
        self.ba_line.borrow_mut().set_active(!(self.is_bad_line && within_window));
        if self.raster_cycle == 1 {
            self.fetch_sprites();
        }
        if self.is_bad_line && within_window {
            self.c_access();
        }
        if self.display_state && within_window {
            self.g_access();
            self.gfx_sequencer.clock();
        }
        self.clock_sprites(x);
        self.border_unit.update_main_ff(x, self.raster_y, self.den);
        self.compose_pixel(x);
        if self.raster_cycle == self.spec.cycles_per_raster {
            self.on_line_done();
        }
        self.update_irq();
        self.raster_cycle += 1;
    }

    fn on_new_line(&mut self) {
        if self.raster_y == self.raster_compare {
            self.irq_status.set_bit(IntSource::Raster as usize, true);
        }
        if self.is_bad_line {
            self.vc = self.vc_base;
            self.rc = 0;
        }
    }

    fn on_line_done(&mut self) {
        self.raster_cycle = 0;
        self.raster_y += 1;
        if self.raster_y >= self.spec.raster_lines {
            self.raster_y = 0;
            self.vc_base = 0;
            self.display_state = false;
        }
        if self.display_state {
            self.rc = (self.rc + 1) & 0x07;
            if self.rc == 0 {
                self.display_state = self.is_bad_line;
            }
            self.vc_base = self.vc;
        }
        self.vmli = 0;
    }

    fn c_access(&mut self) {
        let address = self.video_matrix_base + self.vc;
        self.video_matrix_line[self.vmli] = self.mem.read(address);
        self.color_line[self.vmli] = self.color_ram.borrow().read(self.vc) & 0x0f;
    }

    fn g_access(&mut self) {
        let c_data = self.video_matrix_line[self.vmli];
        let c_color = self.color_line[self.vmli];
        let g_address = if self.gfx_sequencer.config.mode as u8 & 0x02 != 0 {
            // bitmap modes address from VC, not char base
            (self.char_base & 0x2000) | (self.vc << 3) | self.rc as u16
        } else {
            self.char_base + ((c_data as u16) << 3) + self.rc as u16
        };
        let g_data = self.mem.read(g_address);
        self.gfx_sequencer.set_data(c_data, c_color, g_data);
        self.gfx_sequencer.load_data();
        self.vc += 1;
        self.vmli = (self.vmli + 1) % 40;
    }

    #[inline]
    fn map_sprite_to_screen(x: u16) -> u16 {
        match x {
            0x000..=0x193 => x + 0x64,
            0x194..=0x1ff => x.wrapping_sub(0x194),
            _ => x,
        }
    }

    fn fetch_sprites(&mut self) {
        for i in 0..8 {
            let height: u8 = if self.sprites[i].config.expand_y { 42 } else { 21 };
            if !self.sprite_active[i]
                && self.sprites[i].config.enabled
                && self.raster_y == self.sprites[i].config.y as u16
            {
                self.sprite_active[i] = true;
                self.sprite_mc[i] = 0;
            }
            if self.sprite_active[i] && self.sprite_mc[i] >= height * 3 {
                self.sprite_active[i] = false;
                self.sprites[i].display = false;
                self.sprites[i].dma = false;
            }
            if self.sprite_active[i] {
                self.sprites[i].display = true;
                self.sprites[i].dma = true;
                self.sprites[i].config.x_screen = Self::map_sprite_to_screen(self.sprites[i].config.x);
                let pointer = self.mem.read(self.video_matrix_base + 0x03f8 + i as u16);
                let base = (pointer as u16) << 6;
                let offset = self.sprite_mc[i] as u16;
                for byte in 0..3u16 {
                    let data = self.mem.read(base + offset + byte);
                    self.sprites[i].set_data(byte as usize, data);
                }
                self.sprite_mc[i] += 3;
            }
        }
    }

    fn clock_sprites(&mut self, x: u16) {
        let mut outputs = [None; 8];
        for (i, sprite) in self.sprites.iter_mut().enumerate() {
            sprite.clock(x);
            outputs[i] = sprite.output();
        }
        self.mux_unit.compute_collisions(&outputs);
        self.sprite_outputs = outputs;
    }

    fn compose_pixel(&mut self, x: u16) {
        let border_on = self.border_unit.is_enabled();
        self.mux_unit.feed_border(self.border_unit.config.border_color);
        if !border_on {
            self.mux_unit.feed_graphics(self.gfx_sequencer.output());
        }
        self.mux_unit.feed_sprites(&self.sprite_outputs);
        let y = self.raster_y;
        if (x as usize) < self.display_width && (y as usize) < self.frame_buffer.borrow().get_dimension().1 {
            let index = y as usize * self.display_width + x as usize;
            let color = self.mux_unit.output();
            self.frame_buffer.borrow_mut().write(index, color);
        }
    }

    fn update_irq(&mut self) {
        if self.mux_unit.mb_interrupt {
            self.irq_status.set_bit(IntSource::SpriteBackground as usize, true);
        }
        if self.mux_unit.mm_interrupt {
            self.irq_status.set_bit(IntSource::SpriteSprite as usize, true);
        }
        let triggered = (self.irq_status & self.irq_enable & 0x0f) != 0;
        self.irq_status.set_bit(7, triggered);
        self.irq_line.borrow_mut().set_low(0, triggered);
    }
}

impl Chip for Vic {
    fn clock(&mut self) {
        self.clock_cycle();
    }

    fn clock_delta(&mut self, delta: u32) {
        for _ in 0..delta {
            self.clock();
        }
    }

    fn process_vsync(&mut self) {
        self.vsync_flag.set(true);
    }

    fn reset(&mut self) {
        self.den = true;
        self.raster_compare = 0;
        self.irq_enable = 0;
        self.irq_status = 0;
        self.scroll_x = 0;
        self.scroll_y = 3;
        self.video_matrix_base = 1024;
        self.char_base = 4096;
        self.light_pen_pos = [0; 2];
        self.border_unit.reset();
        self.gfx_sequencer.reset();
        for sprite in self.sprites.iter_mut() {
            sprite.reset();
        }
        self.mux_unit.reset();
        self.sprite_active = [false; 8];
        self.sprite_mc = [0; 8];
        self.raster_y = 0;
        self.raster_cycle = 1;
        self.vc = 0;
        self.vc_base = 0;
        self.rc = 0;
        self.vmli = 0;
        self.bad_line_enable = false;
        self.is_bad_line = false;
        self.display_state = false;
        self.sprite_outputs = [None; 8];
        self.irq_line.borrow_mut().reset();
    }

    fn get_state(&self) -> Vec<u8> {
        let mut w = StateWriter::new();
        w.write_bool(self.den);
        w.write_u16(self.raster_compare);
        w.write_u8(self.irq_enable);
        w.write_u8(self.irq_status);
        w.write_u8(self.scroll_x);
        w.write_u8(self.scroll_y);
        w.write_u16(self.video_matrix_base);
        w.write_u16(self.char_base);
        w.write_bytes(&self.light_pen_pos);
        self.border_unit.save_state(&mut w);
        self.gfx_sequencer.save_state(&mut w);
        for sprite in self.sprites.iter() {
            sprite.save_state(&mut w);
        }
        self.mux_unit.save_state(&mut w);
        for &active in self.sprite_active.iter() {
            w.write_bool(active);
        }
        w.write_bytes(&self.sprite_mc);
        w.write_u16(self.raster_y);
        w.write_u16(self.raster_cycle);
        w.write_u16(self.vc);
        w.write_u16(self.vc_base);
        w.write_u8(self.rc);
        w.write_u8(self.vmli as u8);
        w.write_bytes(&self.video_matrix_line);
        w.write_bytes(&self.color_line);
        w.write_bool(self.bad_line_enable);
        w.write_bool(self.is_bad_line);
        w.write_bool(self.display_state);
        for &output in self.sprite_outputs.iter() {
            w.write_bool(output.is_some());
            w.write_u8(output.unwrap_or(0));
        }
        w.into_inner()
    }

    fn set_state(&mut self, state: &[u8]) {
        let mut r = StateReader::new(state);
        self.den = r.read_bool();
        self.raster_compare = r.read_u16();
        self.irq_enable = r.read_u8();
        self.irq_status = r.read_u8();
        self.scroll_x = r.read_u8();
        self.scroll_y = r.read_u8();
        self.video_matrix_base = r.read_u16();
        self.char_base = r.read_u16();
        self.light_pen_pos.copy_from_slice(r.read_bytes(2));
        self.border_unit.restore_state(&mut r);
        self.gfx_sequencer.restore_state(&mut r);
        for sprite in self.sprites.iter_mut() {
            sprite.restore_state(&mut r);
        }
        self.mux_unit.restore_state(&mut r);
        for active in self.sprite_active.iter_mut() {
            *active = r.read_bool();
        }
        self.sprite_mc.copy_from_slice(r.read_bytes(8));
        self.raster_y = r.read_u16();
        self.raster_cycle = r.read_u16();
        self.vc = r.read_u16();
        self.vc_base = r.read_u16();
        self.rc = r.read_u8();
        self.vmli = r.read_u8() as usize;
        self.video_matrix_line.copy_from_slice(r.read_bytes(40));
        self.color_line.copy_from_slice(r.read_bytes(40));
        self.bad_line_enable = r.read_bool();
        self.is_bad_line = r.read_bool();
        self.display_state = r.read_bool();
        for output in self.sprite_outputs.iter_mut() {
            let has_output = r.read_bool();
            let value = r.read_u8();
            *output = if has_output { Some(value) } else { None };
        }
    }

    fn read(&mut self, reg: u8) -> u8 {
        match reg {
            reg::M0X => (self.sprites[0].config.x & 0x00ff) as u8,
            reg::M0Y => self.sprites[0].config.y,
            reg::M1X => (self.sprites[1].config.x & 0x00ff) as u8,
            reg::M1Y => self.sprites[1].config.y,
            reg::M2X => (self.sprites[2].config.x & 0x00ff) as u8,
            reg::M2Y => self.sprites[2].config.y,
            reg::M3X => (self.sprites[3].config.x & 0x00ff) as u8,
            reg::M3Y => self.sprites[3].config.y,
            reg::M4X => (self.sprites[4].config.x & 0x00ff) as u8,
            reg::M4Y => self.sprites[4].config.y,
            reg::M5X => (self.sprites[5].config.x & 0x00ff) as u8,
            reg::M5Y => self.sprites[5].config.y,
            reg::M6X => (self.sprites[6].config.x & 0x00ff) as u8,
            reg::M6Y => self.sprites[6].config.y,
            reg::M7X => (self.sprites[7].config.x & 0x00ff) as u8,
            reg::M7Y => self.sprites[7].config.y,
            reg::MX8 => {
                let mut result = 0u8;
                for i in 0..8 {
                    result.set_bit(i, self.sprites[i].config.x.get_bit(8));
                }
                result
            }
            reg::CR1 => {
                let mut result = 0u8;
                result.set_bit(7, self.raster_y.get_bit(8));
                result.set_bit(6, self.gfx_sequencer.config.mode as u8 & 0x04 != 0);
                result.set_bit(5, self.gfx_sequencer.config.mode as u8 & 0x02 != 0);
                result.set_bit(4, self.den);
                result.set_bit(3, self.border_unit.config.rsel);
                result | (self.scroll_y & 0x07)
            }
            reg::RASTER => (self.raster_y & 0x00ff) as u8,
            reg::LPX => self.light_pen_pos[0],
            reg::LPY => self.light_pen_pos[1],
            reg::ME => {
                let mut result = 0u8;
                for i in 0..8 {
                    result.set_bit(i, self.sprites[i].config.enabled);
                }
                result
            }
            reg::CR2 => {
                let mut result = 0xc0u8;
                result.set_bit(4, self.gfx_sequencer.config.mode as u8 & 0x01 != 0);
                result.set_bit(3, self.border_unit.config.csel);
                result | (self.scroll_x & 0x07)
            }
            reg::MYE => {
                let mut result = 0u8;
                for i in 0..8 {
                    result.set_bit(i, self.sprites[i].config.expand_y);
                }
                result
            }
            reg::MEMPTR => {
                let vm = ((self.video_matrix_base >> 10) as u8) << 4;
                let cb = ((self.char_base >> 11) as u8) << 1;
                vm | cb | 0x01
            }
            reg::IRR => (self.irq_status & 0x8f) | 0x70,
            reg::IMR => self.irq_enable | 0xf0,
            reg::MDP => {
                let mut result = 0u8;
                for i in 0..8 {
                    result.set_bit(i, !self.mux_unit.config.data_priority[i]);
                }
                result
            }
            reg::MMC => {
                let mut result = 0u8;
                for i in 0..8 {
                    result.set_bit(i, self.sprites[i].config.mode == SpriteMode::Multicolor);
                }
                result
            }
            reg::MXE => {
                let mut result = 0u8;
                for i in 0..8 {
                    result.set_bit(i, self.sprites[i].config.expand_x);
                }
                result
            }
            reg::MM => self.mux_unit.mm_collision,
            reg::MD => self.mux_unit.mb_collision,
            reg::EC => self.border_unit.config.border_color | 0xf0,
            reg::B0C => self.gfx_sequencer.config.bg_color[0] | 0xf0,
            reg::B1C => self.gfx_sequencer.config.bg_color[1] | 0xf0,
            reg::B2C => self.gfx_sequencer.config.bg_color[2] | 0xf0,
            reg::B3C => self.gfx_sequencer.config.bg_color[3] | 0xf0,
            reg::MM0 => self.sprites[0].config.multicolor[0] | 0xf0,
            reg::MM1 => self.sprites[0].config.multicolor[1] | 0xf0,
            reg::M0C => self.sprites[0].config.color | 0xf0,
            reg::M1C => self.sprites[1].config.color | 0xf0,
            reg::M2C => self.sprites[2].config.color | 0xf0,
            reg::M3C => self.sprites[3].config.color | 0xf0,
            reg::M4C => self.sprites[4].config.color | 0xf0,
            reg::M5C => self.sprites[5].config.color | 0xf0,
            reg::M6C => self.sprites[6].config.color | 0xf0,
            reg::M7C => self.sprites[7].config.color | 0xf0,
            _ => 0xff,
        }
    }

    fn write(&mut self, reg: u8, value: u8) {
        match reg {
            reg::M0X => self.sprites[0].config.x = (self.sprites[0].config.x & 0xff00) | value as u16,
            reg::M0Y => self.sprites[0].config.y = value,
            reg::M1X => self.sprites[1].config.x = (self.sprites[1].config.x & 0xff00) | value as u16,
            reg::M1Y => self.sprites[1].config.y = value,
            reg::M2X => self.sprites[2].config.x = (self.sprites[2].config.x & 0xff00) | value as u16,
            reg::M2Y => self.sprites[2].config.y = value,
            reg::M3X => self.sprites[3].config.x = (self.sprites[3].config.x & 0xff00) | value as u16,
            reg::M3Y => self.sprites[3].config.y = value,
            reg::M4X => self.sprites[4].config.x = (self.sprites[4].config.x & 0xff00) | value as u16,
            reg::M4Y => self.sprites[4].config.y = value,
            reg::M5X => self.sprites[5].config.x = (self.sprites[5].config.x & 0xff00) | value as u16,
            reg::M5Y => self.sprites[5].config.y = value,
            reg::M6X => self.sprites[6].config.x = (self.sprites[6].config.x & 0xff00) | value as u16,
            reg::M6Y => self.sprites[6].config.y = value,
            reg::M7X => self.sprites[7].config.x = (self.sprites[7].config.x & 0xff00) | value as u16,
            reg::M7Y => self.sprites[7].config.y = value,
            reg::MX8 => {
                for i in 0..8 {
                    let mut x = self.sprites[i].config.x;
                    x.set_bit(8, value.get_bit(i));
                    self.sprites[i].config.x = x;
                }
            }
            reg::CR1 => {
                self.raster_compare.set_bit(8, value.get_bit(7));
                let mut mode = self.gfx_sequencer.config.mode as u8;
                mode.set_bit(2, value.get_bit(6));
                mode.set_bit(1, value.get_bit(5));
                self.gfx_sequencer.config.mode = GfxMode::from(mode);
                self.den = value.get_bit(4);
                self.border_unit.config.rsel = value.get_bit(3);
                self.scroll_y = value & 0x07;
            }
            reg::RASTER => self.raster_compare = (self.raster_compare & 0xff00) | value as u16,
            reg::LPX => self.light_pen_pos[0] = value,
            reg::LPY => self.light_pen_pos[1] = value,
            reg::ME => {
                for i in 0..8 {
                    self.sprites[i].config.enabled = value.get_bit(i);
                }
            }
            reg::CR2 => {
                let mut mode = self.gfx_sequencer.config.mode as u8;
                mode.set_bit(0, value.get_bit(4));
                self.gfx_sequencer.config.mode = GfxMode::from(mode);
                self.border_unit.config.csel = value.get_bit(3);
                self.scroll_x = value & 0x07;
            }
            reg::MYE => {
                for i in 0..8 {
                    self.sprites[i].config.expand_y = value.get_bit(i);
                }
            }
            reg::MEMPTR => {
                self.video_matrix_base = ((value & 0xf0) as u16) << 6;
                self.char_base = ((value & 0x0e) as u16) << 10;
            }
            reg::IRR => {
                self.irq_status &= !(value & 0x0f);
            }
            reg::IMR => self.irq_enable = value & 0x0f,
            reg::MDP => {
                for i in 0..8 {
                    self.mux_unit.config.data_priority[i] = !value.get_bit(i);
                }
            }
            reg::MMC => {
                for i in 0..8 {
                    self.sprites[i].config.mode = if value.get_bit(i) {
                        SpriteMode::Multicolor
                    } else {
                        SpriteMode::Standard
                    };
                }
            }
            reg::MXE => {
                for i in 0..8 {
                    self.sprites[i].config.expand_x = value.get_bit(i);
                }
            }
            reg::MM => {}
            reg::MD => {}
            reg::EC => self.border_unit.config.border_color = value & 0x0f,
            reg::B0C => self.gfx_sequencer.config.bg_color[0] = value & 0x0f,
            reg::B1C => self.gfx_sequencer.config.bg_color[1] = value & 0x0f,
            reg::B2C => self.gfx_sequencer.config.bg_color[2] = value & 0x0f,
            reg::B3C => self.gfx_sequencer.config.bg_color[3] = value & 0x0f,
            reg::MM0 => {
                for sprite in self.sprites.iter_mut() {
                    sprite.config.multicolor[0] = value & 0x0f;
                }
            }
            reg::MM1 => {
                for sprite in self.sprites.iter_mut() {
                    sprite.config.multicolor[1] = value & 0x0f;
                }
            }
            reg::M0C => self.sprites[0].config.color = value & 0x0f,
            reg::M1C => self.sprites[1].config.color = value & 0x0f,
            reg::M2C => self.sprites[2].config.color = value & 0x0f,
            reg::M3C => self.sprites[3].config.color = value & 0x0f,
            reg::M4C => self.sprites[4].config.color = value & 0x0f,
            reg::M5C => self.sprites[5].config.color = value & 0x0f,
            reg::M6C => self.sprites[6].config.color = value & 0x0f,
            reg::M7C => self.sprites[7].config.color = value & 0x0f,
            _ => {}
        }
    }
}
