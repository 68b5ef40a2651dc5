// This file is part of zinc64.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use bit_field::BitField;
use log::LogLevel;

use zinc64_core::factory::Chip;
use zinc64_core::util::{IoPort, IrqControl, IrqLine, Pin, Shared, StateReader, StateWriter};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// Spec: 6522 VERSATILE INTERFACE ADAPTER (VIA) Datasheet
// Two of these drive the 1541: VIA1 talks to the IEC bus and the drive's own
// switches/LED, VIA2 talks to the read/write head and stepper motor.

pub mod reg {
    pub const ORB: u8 = 0x0;
    pub const ORA: u8 = 0x1;
    pub const DDRB: u8 = 0x2;
    pub const DDRA: u8 = 0x3;
    pub const T1CL: u8 = 0x4;
    pub const T1CH: u8 = 0x5;
    pub const T1LL: u8 = 0x6;
    pub const T1LH: u8 = 0x7;
    pub const T2CL: u8 = 0x8;
    pub const T2CH: u8 = 0x9;
    pub const SR: u8 = 0xa;
    pub const ACR: u8 = 0xb;
    pub const PCR: u8 = 0xc;
    pub const IFR: u8 = 0xd;
    pub const IER: u8 = 0xe;
    pub const ORA_NH: u8 = 0xf;
}

// IFR/IER bit positions.
mod irq {
    pub const CA2: usize = 0;
    pub const CA1: usize = 1;
    pub const SR: usize = 2;
    pub const CB2: usize = 3;
    pub const CB1: usize = 4;
    pub const T2: usize = 5;
    pub const T1: usize = 6;
}

#[derive(Copy, Clone, PartialEq)]
pub enum Mode {
    Via1 = 0,
    Via2 = 1,
}

impl Mode {
    pub fn irq_source(self) -> usize {
        self as usize
    }
}

/// A VIA's T1/T2 - simpler than the CIA's shared `Timer` since the two chips
/// decode their ACR/mode bits differently (T1 free-run vs one-shot, T2
/// timed-interrupt vs PB6 pulse-counting); no shared implementation.
struct LatchedCounter {
    counter: u16,
    latch_lo: u8,
    latch_hi: u8,
}

impl LatchedCounter {
    fn new() -> Self {
        Self {
            counter: 0xffff,
            latch_lo: 0xff,
            latch_hi: 0xff,
        }
    }

    fn latch(&self) -> u16 {
        ((self.latch_hi as u16) << 8) | self.latch_lo as u16
    }

    /// Decrements by one, returns true on underflow (0x0000 -> 0xffff).
    fn clock(&mut self) -> bool {
        if self.counter == 0 {
            self.counter = 0xffff;
            true
        } else {
            self.counter -= 1;
            false
        }
    }

    fn reload(&mut self) {
        self.counter = self.latch();
    }

    fn save_state(&self, w: &mut StateWriter) {
        w.write_u16(self.counter);
        w.write_u8(self.latch_lo);
        w.write_u8(self.latch_hi);
    }

    fn restore_state(&mut self, r: &mut StateReader) {
        self.counter = r.read_u16();
        self.latch_lo = r.read_u8();
        self.latch_hi = r.read_u8();
    }
}

pub struct Via6522 {
    mode: Mode,
    irq_control: IrqControl,
    t1: LatchedCounter,
    t2: LatchedCounter,
    t1_free_run: bool,
    t1_armed: bool,
    t1_pb7: bool,
    sr: u8,
    acr: u8,
    pcr: u8,
    ca1_pin: Shared<Pin>,
    ca2_pin: Shared<Pin>,
    cb1_pin: Shared<Pin>,
    cb2_pin: Shared<Pin>,
    irq_line: Shared<IrqLine>,
    port_a: Shared<IoPort>,
    port_b: Shared<IoPort>,
}

impl Via6522 {
    pub fn new(
        mode: Mode,
        port_a: Shared<IoPort>,
        port_b: Shared<IoPort>,
        ca1_pin: Shared<Pin>,
        ca2_pin: Shared<Pin>,
        cb1_pin: Shared<Pin>,
        cb2_pin: Shared<Pin>,
        irq_line: Shared<IrqLine>,
    ) -> Self {
        Self {
            mode,
            irq_control: IrqControl::default(),
            t1: LatchedCounter::new(),
            t2: LatchedCounter::new(),
            t1_free_run: false,
            t1_armed: true,
            t1_pb7: false,
            sr: 0,
            acr: 0,
            pcr: 0,
            ca1_pin,
            ca2_pin,
            cb1_pin,
            cb2_pin,
            irq_line,
            port_a,
            port_b,
        }
    }

    fn update_irq_line(&mut self) {
        self.irq_line
            .borrow_mut()
            .set_low(self.mode.irq_source(), self.irq_control.is_triggered());
    }

    fn poll_edges(&mut self) {
        if self.ca1_pin.borrow().is_falling() {
            self.irq_control.set_event(irq::CA1);
        }
        if self.cb1_pin.borrow().is_falling() {
            self.irq_control.set_event(irq::CB1);
        }
        if !self.pcr.get_bit(3) && self.ca2_pin.borrow().is_falling() {
            self.irq_control.set_event(irq::CA2);
        }
        if !self.pcr.get_bit(7) && self.cb2_pin.borrow().is_falling() {
            self.irq_control.set_event(irq::CB2);
        }
    }
}

impl Chip for Via6522 {
    fn clock(&mut self) {
        self.poll_edges();
        if self.t1.clock() {
            if self.t1_free_run || self.t1_armed {
                self.irq_control.set_event(irq::T1);
                self.t1_pb7 = !self.t1_pb7;
            }
            if self.t1_free_run {
                self.t1.reload();
            } else {
                self.t1_armed = false;
            }
        }
        if !self.acr.get_bit(5) && self.t2.clock() {
            self.irq_control.set_event(irq::T2);
        }
        self.update_irq_line();
    }

    fn clock_delta(&mut self, delta: u32) {
        for _i in 0..delta {
            self.clock();
        }
    }

    fn process_vsync(&mut self) {}

    fn reset(&mut self) {
        self.irq_control.reset();
        self.t1 = LatchedCounter::new();
        self.t2 = LatchedCounter::new();
        self.t1_free_run = false;
        self.t1_armed = true;
        self.t1_pb7 = false;
        self.sr = 0;
        self.acr = 0;
        self.pcr = 0;
        self.port_a.borrow_mut().reset();
        self.port_b.borrow_mut().reset();
        self.update_irq_line();
    }

    fn get_state(&self) -> Vec<u8> {
        let mut w = StateWriter::new();
        self.irq_control.save_state(&mut w);
        self.t1.save_state(&mut w);
        self.t2.save_state(&mut w);
        w.write_bool(self.t1_free_run);
        w.write_bool(self.t1_armed);
        w.write_bool(self.t1_pb7);
        w.write_u8(self.sr);
        w.write_u8(self.acr);
        w.write_u8(self.pcr);
        w.into_inner()
    }

    fn set_state(&mut self, state: &[u8]) {
        let mut r = StateReader::new(state);
        self.irq_control.restore_state(&mut r);
        self.t1.restore_state(&mut r);
        self.t2.restore_state(&mut r);
        self.t1_free_run = r.read_bool();
        self.t1_armed = r.read_bool();
        self.t1_pb7 = r.read_bool();
        self.sr = r.read_u8();
        self.acr = r.read_u8();
        self.pcr = r.read_u8();
    }

    fn read(&mut self, reg: u8) -> u8 {
        let value = match reg {
            reg::ORB => {
                let mut result = self.port_b.borrow().get_value();
                if self.acr.get_bit(7) {
                    result.set_bit(7, self.t1_pb7);
                }
                self.irq_control.clear_event(irq::CB1);
                if !self.pcr.get_bit(7) {
                    self.irq_control.clear_event(irq::CB2);
                }
                result
            }
            reg::ORA | reg::ORA_NH => {
                if reg == reg::ORA {
                    self.irq_control.clear_event(irq::CA1);
                    if !self.pcr.get_bit(3) {
                        self.irq_control.clear_event(irq::CA2);
                    }
                }
                self.port_a.borrow().get_value()
            }
            reg::DDRB => self.port_b.borrow().get_direction(),
            reg::DDRA => self.port_a.borrow().get_direction(),
            reg::T1CL => {
                self.irq_control.clear_event(irq::T1);
                (self.t1.counter & 0xff) as u8
            }
            reg::T1CH => (self.t1.counter >> 8) as u8,
            reg::T1LL => self.t1.latch_lo,
            reg::T1LH => self.t1.latch_hi,
            reg::T2CL => {
                self.irq_control.clear_event(irq::T2);
                (self.t2.counter & 0xff) as u8
            }
            reg::T2CH => (self.t2.counter >> 8) as u8,
            reg::SR => self.sr,
            reg::ACR => self.acr,
            reg::PCR => self.pcr,
            reg::IFR => self.irq_control.get_data(),
            reg::IER => self.irq_control.get_mask() | 0x80,
            _ => panic!("invalid via reg {}", reg),
        };
        if log_enabled!(LogLevel::Trace) {
            trace!(target: "via::reg", "Read 0x{:02x} = 0x{:02x}", reg, value);
        }
        self.update_irq_line();
        value
    }

    fn write(&mut self, reg: u8, value: u8) {
        if log_enabled!(LogLevel::Trace) {
            trace!(target: "via::reg", "Write 0x{:02x} = 0x{:02x}", reg, value);
        }
        match reg {
            reg::ORB => {
                self.port_b.borrow_mut().set_value(value);
                self.irq_control.clear_event(irq::CB1);
                if !self.pcr.get_bit(7) {
                    self.irq_control.clear_event(irq::CB2);
                }
            }
            reg::ORA | reg::ORA_NH => {
                self.port_a.borrow_mut().set_value(value);
                if reg == reg::ORA {
                    self.irq_control.clear_event(irq::CA1);
                    if !self.pcr.get_bit(3) {
                        self.irq_control.clear_event(irq::CA2);
                    }
                }
            }
            reg::DDRB => self.port_b.borrow_mut().set_direction(value),
            reg::DDRA => self.port_a.borrow_mut().set_direction(value),
            reg::T1CL => self.t1.latch_lo = value,
            reg::T1CH => {
                self.t1.latch_hi = value;
                self.t1.reload();
                self.t1_armed = true;
                self.irq_control.clear_event(irq::T1);
                self.t1_pb7 = false;
            }
            reg::T1LL => self.t1.latch_lo = value,
            reg::T1LH => {
                self.t1.latch_hi = value;
                self.irq_control.clear_event(irq::T1);
            }
            reg::T2CL => self.t2.latch_lo = value,
            reg::T2CH => {
                self.t2.latch_hi = value;
                self.t2.reload();
                self.irq_control.clear_event(irq::T2);
            }
            reg::SR => self.sr = value,
            reg::ACR => {
                self.acr = value;
                self.t1_free_run = value.get_bit(6);
            }
            reg::PCR => self.pcr = value,
            reg::IFR => {
                let data = self.irq_control.get_raw_data() & !(value & 0x7f);
                self.irq_control.set_raw_data(data);
            }
            reg::IER => self.irq_control.update_mask(value),
            _ => panic!("invalid via reg {}", reg),
        }
        self.update_irq_line();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zinc64_core::util::new_shared;

    fn setup_via() -> Via6522 {
        Via6522::new(
            Mode::Via1,
            new_shared(IoPort::new(0, 0xff)),
            new_shared(IoPort::new(0, 0xff)),
            new_shared(Pin::new_high()),
            new_shared(Pin::new_high()),
            new_shared(Pin::new_high()),
            new_shared(Pin::new_high()),
            new_shared(IrqLine::new("cpu::irq")),
        )
    }

    #[test]
    fn t1_one_shot_fires_once() {
        let mut via = setup_via();
        via.write(reg::IER, 0xc0);
        via.write(reg::T1CL, 0x02);
        via.write(reg::T1CH, 0x00);
        for _ in 0..3 {
            via.clock();
        }
        assert!(via.irq_control.is_triggered());
        via.irq_control.clear();
        for _ in 0..0x10000 {
            via.clock();
        }
        assert!(!via.irq_control.is_triggered());
    }

    #[test]
    fn t1_free_run_reloads() {
        let mut via = setup_via();
        via.write(reg::ACR, 0x40);
        via.write(reg::IER, 0xc0);
        via.write(reg::T1LL, 0x01);
        via.write(reg::T1CH, 0x00);
        for _ in 0..2 {
            via.clock();
        }
        assert!(via.irq_control.is_triggered());
        via.irq_control.clear();
        for _ in 0..2 {
            via.clock();
        }
        assert!(via.irq_control.is_triggered());
    }

    #[test]
    fn ifr_write_clears_selected_flags() {
        let mut via = setup_via();
        via.irq_control.set_event(irq::T1);
        via.irq_control.set_event(irq::CB1);
        via.write(reg::IFR, 1 << irq::T1);
        assert!(!via.irq_control.get_raw_data().get_bit(irq::T1));
        assert!(via.irq_control.get_raw_data().get_bit(irq::CB1));
    }
}
