// This file is part of zinc64.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

#[cfg(not(feature = "std"))]
use alloc::prelude::*;

use super::C64;

/// A loadable image that can patch itself into a running machine, e.g. by copying a PRG
/// into memory or mounting a disk/tape image on the appropriate device.
pub trait Image {
    fn mount(&mut self, c64: &mut C64);
    fn unmount(&mut self, c64: &mut C64);
}

pub enum Mode {
    Run,
    /// Types `LOAD"*",8,1` followed by `RUN` - the standard two-line
    /// sequence for booting a disk image, queued as one string since the
    /// KERNAL's buffered keyboard input picks each line up in turn once
    /// BASIC returns to command mode.
    LoadRun,
}

/// Queues the keystrokes needed to start a mounted image once the machine has booted.
pub struct Autostart {
    mode: Mode,
    image: Box<dyn Image>,
}

impl Autostart {
    pub fn new(mode: Mode, image: Box<dyn Image>) -> Autostart {
        Autostart { mode, image }
    }

    pub fn execute(&mut self, c64: &mut C64) {
        self.image.mount(c64);
        let command = self.get_command().to_string() + "\n";
        c64.get_keyboard().enqueue(&command);
    }

    fn get_command(&self) -> &str {
        match self.mode {
            Mode::Run => "RUN",
            Mode::LoadRun => "LOAD\"*\",8,1\rRUN",
        }
    }
}

pub enum AutostartMethod {
    WithImage(Box<dyn Image>),
    WithBinImage(Box<dyn Image>),
    WithAutostart(Option<Autostart>),
}

impl AutostartMethod {
    pub fn execute(&mut self, c64: &mut C64) {
        match *self {
            AutostartMethod::WithImage(ref mut image) => {
                image.mount(c64);
                c64.reset(false);
            }
            AutostartMethod::WithBinImage(ref mut image) => {
                image.mount(c64);
            }
            AutostartMethod::WithAutostart(ref mut autostart) => {
                c64.set_autostart(autostart.take());
                c64.reset(false);
            }
        }
    }
}
