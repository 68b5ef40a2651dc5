// This file is part of zinc64.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use bit_field::BitField;

use crate::util::{Pin, Shared, StateReader, StateWriter};

#[derive(Copy, Clone, PartialEq)]
pub enum Mode {
    TimerA,
    TimerB,
}

#[derive(Copy, Clone, PartialEq)]
enum Input {
    SystemClock,
    External,
    TimerA,
    TimerAWithCnt,
}

#[derive(Copy, Clone, PartialEq)]
enum Output {
    Pulse,
    Toggle,
}

/// A 6526/6522 16-bit timer. The start/stop gate is pipelined two cycles
/// deep and a forced reload while stopped takes two cycles to land on the
/// counter, matching documented silicon behavior.
pub struct Timer {
    mode: Mode,
    cnt_pin: Shared<Pin>,
    enabled: bool,
    one_shot: bool,
    input: Input,
    output: Output,
    pb_on: bool,
    pb_output: bool,
    counter: u16,
    latch: u16,
    feed: bool,
    count2: bool,
    count3: bool,
    load_delay: u8,
}

impl Timer {
    pub fn new(mode: Mode, cnt_pin: Shared<Pin>) -> Self {
        Self {
            mode,
            cnt_pin,
            enabled: false,
            one_shot: true,
            input: Input::SystemClock,
            output: Output::Pulse,
            pb_on: false,
            pb_output: false,
            counter: 0,
            latch: 0xffff,
            feed: false,
            count2: false,
            count3: false,
            load_delay: 0,
        }
    }

    /// Feeds an external pulse observed this cycle (CNT edge or, for timer
    /// B, timer A's underflow output). Ignored unless the timer is
    /// configured to count from that source.
    pub fn feed_source(&mut self, value: bool) {
        self.feed = value;
    }

    fn pulse(&self) -> bool {
        match self.input {
            Input::SystemClock => true,
            Input::External => self.cnt_pin.borrow().is_rising(),
            Input::TimerA => self.feed,
            Input::TimerAWithCnt => self.feed && self.cnt_pin.borrow().is_high(),
        }
    }

    /// Advances the timer one cycle. Returns true iff the counter underflowed
    /// this cycle (used to raise an IRQ event and, for timer A, to feed timer
    /// B in cascaded mode).
    pub fn clock(&mut self) -> bool {
        let mut underflow = false;
        if self.load_delay > 0 {
            self.load_delay -= 1;
            if self.load_delay == 0 {
                self.counter = self.latch;
            }
        }
        let gate = self.count2;
        self.count2 = self.count3;
        self.count3 = self.enabled;
        if gate {
            if self.counter == 0 {
                self.counter = self.latch;
                self.pb_output = match self.output {
                    Output::Toggle => self.pb_output,
                    Output::Pulse => false,
                };
            } else if self.pulse() {
                self.counter -= 1;
                if self.counter == 0 {
                    underflow = true;
                    self.pb_output = match self.output {
                        Output::Toggle => !self.pb_output,
                        Output::Pulse => true,
                    };
                    if self.one_shot {
                        self.enabled = false;
                    }
                }
            }
        }
        self.feed = false;
        underflow
    }

    pub fn is_pb_on(&self) -> bool {
        self.pb_on
    }

    pub fn get_pb_output(&self) -> bool {
        self.pb_output
    }

    pub fn get_counter(&self) -> u16 {
        self.counter
    }

    pub fn get_counter_lo(&self) -> u8 {
        (self.counter & 0x00ff) as u8
    }

    pub fn get_counter_hi(&self) -> u8 {
        ((self.counter & 0xff00) >> 8) as u8
    }

    pub fn get_latch(&self) -> u16 {
        self.latch
    }

    pub fn set_latch_lo(&mut self, value: u8) {
        self.latch = (self.latch & 0xff00) | value as u16;
    }

    pub fn set_latch_hi(&mut self, value: u8) {
        self.latch = (self.latch & 0x00ff) | ((value as u16) << 8);
        if !self.enabled {
            self.load_delay = 2;
        }
    }

    pub fn get_config(&self) -> u8 {
        let mut result = 0u8;
        result.set_bit(0, self.enabled);
        result.set_bit(1, self.pb_on);
        result.set_bit(2, self.output == Output::Toggle);
        result.set_bit(3, self.one_shot);
        match self.mode {
            Mode::TimerA => {
                result.set_bit(5, self.input == Input::External);
            }
            Mode::TimerB => {
                let inmode: u8 = match self.input {
                    Input::SystemClock => 0,
                    Input::External => 1,
                    Input::TimerA => 2,
                    Input::TimerAWithCnt => 3,
                };
                result.set_bits(5..7, inmode);
            }
        }
        result
    }

    pub fn set_config(&mut self, value: u8) {
        self.enabled = value.get_bit(0);
        self.pb_on = value.get_bit(1);
        self.output = if value.get_bit(2) {
            Output::Toggle
        } else {
            Output::Pulse
        };
        self.one_shot = value.get_bit(3);
        self.input = match self.mode {
            Mode::TimerA => {
                if value.get_bit(5) {
                    Input::External
                } else {
                    Input::SystemClock
                }
            }
            Mode::TimerB => match value.get_bits(5..7) {
                0 => Input::SystemClock,
                1 => Input::External,
                2 => Input::TimerA,
                _ => Input::TimerAWithCnt,
            },
        };
        if value.get_bit(4) {
            self.load_delay = 1;
        }
    }

    pub fn reset(&mut self) {
        self.enabled = false;
        self.one_shot = true;
        self.input = Input::SystemClock;
        self.output = Output::Pulse;
        self.pb_on = false;
        self.pb_output = false;
        self.counter = 0;
        self.latch = 0xffff;
        self.feed = false;
        self.count2 = false;
        self.count3 = false;
        self.load_delay = 0;
    }

    pub fn save_state(&self, w: &mut StateWriter) {
        w.write_bool(self.enabled);
        w.write_bool(self.one_shot);
        w.write_u8(match self.input {
            Input::SystemClock => 0,
            Input::External => 1,
            Input::TimerA => 2,
            Input::TimerAWithCnt => 3,
        });
        w.write_bool(self.output == Output::Toggle);
        w.write_bool(self.pb_on);
        w.write_bool(self.pb_output);
        w.write_u16(self.counter);
        w.write_u16(self.latch);
        w.write_bool(self.feed);
        w.write_bool(self.count2);
        w.write_bool(self.count3);
        w.write_u8(self.load_delay);
    }

    pub fn restore_state(&mut self, r: &mut StateReader) {
        self.enabled = r.read_bool();
        self.one_shot = r.read_bool();
        self.input = match r.read_u8() {
            0 => Input::SystemClock,
            1 => Input::External,
            2 => Input::TimerA,
            _ => Input::TimerAWithCnt,
        };
        self.output = if r.read_bool() {
            Output::Toggle
        } else {
            Output::Pulse
        };
        self.pb_on = r.read_bool();
        self.pb_output = r.read_bool();
        self.counter = r.read_u16();
        self.latch = r.read_u16();
        self.feed = r.read_bool();
        self.count2 = r.read_bool();
        self.count3 = r.read_bool();
        self.load_delay = r.read_u8();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::new_shared;

    fn setup() -> Timer {
        let cnt = new_shared(Pin::new_high());
        let mut timer = Timer::new(Mode::TimerA, cnt);
        timer.reset();
        timer
    }

    #[test]
    fn forced_load_takes_two_cycles() {
        let mut timer = setup();
        timer.set_latch_lo(0x01);
        timer.set_latch_hi(0x00);
        timer.clock();
        assert_eq!(0, timer.get_counter());
        timer.clock();
        assert_eq!(1, timer.get_counter());
    }

    #[test]
    fn underflow_after_start_latency() {
        let mut timer = setup();
        timer.set_latch_lo(0x01);
        timer.set_latch_hi(0x00);
        timer.clock();
        timer.clock();
        timer.set_config(0b0000_1001); // start, one-shot
        assert!(!timer.clock());
        assert!(!timer.clock());
        assert!(timer.clock());
        assert!(!timer.clock());
        assert_eq!(1, timer.get_counter());
    }
}
