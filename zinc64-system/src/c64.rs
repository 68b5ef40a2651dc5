// This file is part of zinc64.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

#![cfg_attr(feature = "cargo-clippy", allow(clippy::cast_lossless))]

#[cfg(not(feature = "std"))]
use alloc::prelude::*;
#[cfg(not(feature = "std"))]
use alloc::rc::Rc;
#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::rc::Rc;
#[cfg(feature = "std")]
use std::sync::Arc;
use bit_field::BitField;
use zinc64_core::factory::*;
use zinc64_core::util::*;

use super::breakpoint::BreakpointManager;
use super::snapshot::{RewindBuffer, Snapshot};
use super::{Autostart, Config};
use zinc64_core::device::joystick;
use zinc64_core::device::{Cartridge, Datassette, Joystick, Keyboard};
use zinc64_core::factory::Tape;
use zinc64_core::mem::{ExpansionPort, Pla};
use zinc64_drive::iec::IecLines;
use zinc64_drive::{Drive, Drive1541, IecController};

/// Selects how the scheduler paces the host CPU.
///
/// `Line` batches a whole raster line's worth of cycles between breakpoint
/// and autostart checks instead of re-checking every single cycle - the
/// `Cpu6510` underneath still executes cycle-by-cycle either way, so this is
/// a scheduling coarseness knob, not a second CPU core.
#[derive(Copy, Clone, PartialEq)]
pub enum ExecutionMode {
    Cycle,
    Line,
}

// Spec: CIA2 port A also carries the IEC serial bus - bit 3 ATN out, bit 4
// CLK out, bit 5 DATA out (all active-high "asserted" through an inverting
// driver), bit 6 CLK in, bit 7 DATA in.
mod cia2_pa {
    pub const ATN_OUT: usize = 3;
    pub const CLK_OUT: usize = 4;
    pub const DATA_OUT: usize = 5;
    pub const CLK_IN: usize = 6;
    pub const DATA_IN: usize = 7;
}

// Design:
//   C64 represents the machine itself and all of its components. Connections between different
//   components are managed as component dependencies.

#[allow(dead_code)]
#[derive(Copy, Clone)]
enum BaseAddr {
    Basic = 0xa000,
    BootComplete = 0xa65c,
    Charset = 0xd000,
    Kernal = 0xe000,
}

impl BaseAddr {
    pub fn addr(self) -> u16 {
        self as u16
    }
}

pub struct C64 {
    // Dependencies
    config: Rc<Config>,
    // Chipset
    cpu: Box<dyn Cpu>,
    cia_1: Shared<dyn Chip>,
    cia_2: Shared<dyn Chip>,
    sid: Shared<dyn Chip>,
    vic: Shared<dyn Chip>,
    // Memory
    color_ram: Shared<Ram>,
    expansion_port: Shared<ExpansionPort>,
    ram: Shared<Ram>,
    // Peripherals
    datassette: Shared<Datassette>,
    joystick_1: Option<Joystick>,
    joystick_2: Option<Joystick>,
    keyboard: Keyboard,
    // IEC serial bus
    iec_lines: Shared<IecLines>,
    iec_controller: Shared<IecController>,
    drive_8: Shared<Option<Drive1541>>,
    // Buffers
    frame_buffer: Shared<dyn VideoOutput>,
    sound_buffer: Arc<dyn SoundOutput>,
    // Runtime State
    autostart: Option<Autostart>,
    breakpoints: BreakpointManager,
    clock: Rc<Clock>,
    drive8_path: Option<String>,
    execution_mode: ExecutionMode,
    frame_count: u32,
    last_pc: u16,
    rewind_buffer: RewindBuffer,
    rewinding: bool,
    tick_fn: TickFn,
    vsync_flag: SharedCell<bool>,
}

impl C64 {
    pub fn build(
        config: Rc<Config>,
        factory: &dyn ChipFactory,
        frame_buffer: Shared<dyn VideoOutput>,
        sound_buffer: Arc<dyn SoundOutput>,
    ) -> C64 {
        info!(target: "c64", "Initializing system");
        // Buffers
        let clock = Rc::new(Clock::default());
        let joystick_1_state = new_shared_cell(0u8);
        let joystick_2_state = new_shared_cell(0u8);
        let keyboard_matrix = new_shared([0; 16]);
        let vsync_flag = new_shared_cell(false);
        let vic_base_address = new_shared_cell(0u16);

        // I/O Lines
        let ba_line = new_shared(Pin::new_high());
        let cpu_io_port = new_shared(IoPort::new(0x00, 0xff));
        let cia_1_flag_pin = new_shared(Pin::new_low());
        let cia_1_port_a = new_shared(IoPort::new(0x00, 0xff));
        let cia_1_port_b = new_shared(IoPort::new(0x00, 0xff));
        let cia_2_flag_pin = new_shared(Pin::new_low());
        let cia_2_port_a = new_shared(IoPort::new(0x00, 0xff));
        let cia_2_port_b = new_shared(IoPort::new(0x00, 0xff));
        let exp_io_line = new_shared(IoPort::new(0xff, 0xff));
        let irq_line = new_shared(IrqLine::new("irq"));
        let nmi_line = new_shared(IrqLine::new("nmi"));

        // Memory
        let color_ram = factory.new_ram(config.model.color_ram);
        let ram = factory.new_ram(config.model.memory_size);
        let rom_basic = factory.new_rom(config.roms.basic.as_slice(), BaseAddr::Basic.addr());
        let rom_charset = factory.new_rom(config.roms.charset.as_slice(), 0);
        let rom_kernal = factory.new_rom(config.roms.kernal.as_slice(), BaseAddr::Kernal.addr());

        // Chipset
        let cia_1 = factory.new_cia_1(
            joystick_1_state.clone(),
            joystick_2_state.clone(),
            keyboard_matrix.clone(),
            cia_1_port_a.clone(),
            cia_1_port_b.clone(),
            cia_1_flag_pin.clone(),
            irq_line.clone(),
        );
        let cia_2 = factory.new_cia_2(
            cia_2_port_a.clone(),
            cia_2_port_b.clone(),
            cia_2_flag_pin.clone(),
            nmi_line.clone(),
        );
        let sid = factory.new_sid(config.model.sid_model, clock.clone(), sound_buffer.clone());
        let vic = factory.new_vic(
            config.model.vic_model,
            color_ram.clone(),
            ram.clone(),
            rom_charset.clone(),
            vic_base_address.clone(),
            frame_buffer.clone(),
            vsync_flag.clone(),
            ba_line.clone(),
            irq_line.clone(),
        );

        // Memory Controller and Processor
        let expansion_port = new_shared(ExpansionPort::new(exp_io_line.clone()));
        let mmu = new_shared(Pla::new());
        let mem = factory.new_memory(
            mmu.clone(),
            cia_1.clone(),
            cia_2.clone(),
            color_ram.clone(),
            expansion_port.clone(),
            ram.clone(),
            rom_basic.clone(),
            rom_charset.clone(),
            rom_kernal.clone(),
            sid.clone(),
            vic.clone(),
        );
        let cpu = factory.new_cpu(
            mem.clone(),
            cpu_io_port.clone(),
            ba_line.clone(),
            irq_line.clone(),
            nmi_line.clone(),
        );

        // Peripherals
        let datassette = new_shared(Datassette::new(cia_1_flag_pin.clone(), cpu_io_port.clone()));
        let joystick1 = if config.joystick.joystick_1 != joystick::Mode::None {
            Some(Joystick::new(
                config.joystick.joystick_1,
                config.joystick.axis_motion_threshold,
                joystick_1_state.clone(),
            ))
        } else {
            None
        };
        let joystick2 = if config.joystick.joystick_2 != joystick::Mode::None {
            Some(Joystick::new(
                config.joystick.joystick_2,
                config.joystick.axis_motion_threshold,
                joystick_2_state.clone(),
            ))
        } else {
            None
        };
        let keyboard = Keyboard::new(keyboard_matrix.clone());

        // IEC serial bus
        let iec_lines = new_shared(IecLines::new());
        let iec_controller = new_shared(IecController::new());
        let drive_8: Shared<Option<Drive1541>> = new_shared(None);

        // Observers
        let exp_io_line_clone_1 = exp_io_line.clone();
        let mmu_clone_1 = mmu.clone();
        cpu_io_port
            .borrow_mut()
            .set_observer(Box::new(move |cpu_port| {
                let expansion_port_io = exp_io_line_clone_1.borrow().get_value();
                let mode = cpu_port & 0x07 | expansion_port_io & 0x18;
                mmu_clone_1.borrow_mut().switch_banks(mode);
            }));

        let cpu_io_port_clone_2 = cpu_io_port.clone();
        let mmu_clone_2 = mmu.clone();
        exp_io_line
            .borrow_mut()
            .set_observer(Box::new(move |expansion_port_io| {
                let cpu_port_io = cpu_io_port_clone_2.borrow().get_value();
                let mode = cpu_port_io & 0x07 | expansion_port_io & 0x18;
                mmu_clone_2.borrow_mut().switch_banks(mode);
            }));
        let vic_base_address_clone = vic_base_address.clone();
        let iec_lines_clone_1 = iec_lines.clone();
        cia_2_port_a
            .borrow_mut()
            .set_observer(Box::new(move |value| {
                let base_address = ((!value & 0x03) as u16) << 14;
                vic_base_address_clone.set(base_address);
                let mut lines = iec_lines_clone_1.borrow_mut();
                lines.set_host_atn(value.get_bit(cia2_pa::ATN_OUT));
                lines.set_host_clk(value.get_bit(cia2_pa::CLK_OUT));
                lines.set_host_data(value.get_bit(cia2_pa::DATA_OUT));
            }));
        let tick_fn: TickFn = {
            let cia_1_clone = cia_1.clone();
            let cia_2_clone = cia_2.clone();
            let cia_2_port_a_clone = cia_2_port_a.clone();
            let clock_clone = clock.clone();
            let datassette_clone = datassette.clone();
            let vic_clone = vic.clone();
            let iec_lines_clone_2 = iec_lines.clone();
            let drive_8_clone = drive_8.clone();
            Rc::new(move || {
                vic_clone.borrow_mut().clock();
                cia_1_clone.borrow_mut().clock();
                cia_2_clone.borrow_mut().clock();
                datassette_clone.borrow_mut().clock();
                if let Some(ref drive) = *drive_8_clone.borrow() {
                    let mut lines = iec_lines_clone_2.borrow_mut();
                    lines.set_drive_clk(drive.clk_out());
                    lines.set_drive_data(drive.data_out());
                }
                {
                    let lines = iec_lines_clone_2.borrow();
                    cia_2_port_a_clone
                        .borrow_mut()
                        .set_input_bit(cia2_pa::CLK_IN, !lines.clk());
                    cia_2_port_a_clone
                        .borrow_mut()
                        .set_input_bit(cia2_pa::DATA_IN, !lines.data());
                }
                if let Some(ref mut drive) = *drive_8_clone.borrow_mut() {
                    let lines = iec_lines_clone_2.borrow();
                    drive.set_atn_in(lines.atn());
                    drive.set_clk_in(lines.clk());
                    drive.set_data_in(lines.data());
                }
                clock_clone.tick();
            })
        };
        let rewind_capacity = (30.0f32 * config.model.refresh_rate).round() as usize;
        C64 {
            config,
            cpu,
            cia_1: cia_1.clone(),
            cia_2: cia_2.clone(),
            sid: sid.clone(),
            vic: vic.clone(),
            color_ram: color_ram.clone(),
            expansion_port: expansion_port.clone(),
            ram: ram.clone(),
            datassette,
            joystick_1: joystick1,
            joystick_2: joystick2,
            keyboard,
            iec_lines,
            iec_controller,
            drive_8,
            frame_buffer: frame_buffer.clone(),
            sound_buffer: sound_buffer.clone(),
            autostart: None,
            breakpoints: BreakpointManager::default(),
            clock,
            drive8_path: None,
            execution_mode: ExecutionMode::Cycle,
            frame_count: 0,
            last_pc: 0,
            rewind_buffer: RewindBuffer::new(rewind_capacity),
            rewinding: false,
            tick_fn,
            vsync_flag,
        }
    }

    pub fn get_bpm(&self) -> &BreakpointManager {
        &self.breakpoints
    }

    pub fn get_bpm_mut(&mut self) -> &mut BreakpointManager {
        &mut self.breakpoints
    }

    pub fn get_clock(&self) -> Rc<Clock> {
        self.clock.clone()
    }

    pub fn get_config(&self) -> &Config {
        &self.config
    }

    pub fn get_cpu(&self) -> &dyn Cpu {
        &*self.cpu
    }

    pub fn get_cpu_mut(&mut self) -> &mut dyn Cpu {
        &mut *self.cpu
    }

    pub fn get_cycles(&self) -> u64 {
        self.clock.get()
    }

    pub fn get_cia_1(&self) -> Shared<dyn Chip> {
        self.cia_1.clone()
    }

    pub fn get_cia_2(&self) -> Shared<dyn Chip> {
        self.cia_2.clone()
    }

    pub fn get_color_ram(&self) -> Shared<Ram> {
        self.color_ram.clone()
    }

    pub fn get_datasette(&self) -> Shared<Datassette> {
        self.datassette.clone()
    }

    pub fn get_drive_8(&self) -> Shared<Option<Drive1541>> {
        self.drive_8.clone()
    }

    pub fn get_drive8_path(&self) -> Option<&String> {
        self.drive8_path.as_ref()
    }

    pub fn set_drive8_path(&mut self, path: Option<String>) {
        self.drive8_path = path;
    }

    pub fn get_execution_mode(&self) -> ExecutionMode {
        self.execution_mode
    }

    pub fn set_execution_mode(&mut self, mode: ExecutionMode) {
        self.execution_mode = mode;
    }

    pub fn get_frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn get_ram(&self) -> Shared<Ram> {
        self.ram.clone()
    }

    pub fn get_joystick1(&self) -> &Option<Joystick> {
        &self.joystick_1
    }

    pub fn get_joystick1_mut(&mut self) -> &mut Option<Joystick> {
        &mut self.joystick_1
    }

    pub fn get_joystick2(&self) -> &Option<Joystick> {
        &self.joystick_2
    }

    pub fn get_joystick2_mut(&mut self) -> &mut Option<Joystick> {
        &mut self.joystick_2
    }

    pub fn get_keyboard(&mut self) -> &mut Keyboard {
        &mut self.keyboard
    }

    pub fn get_sid(&self) -> Shared<dyn Chip> {
        self.sid.clone()
    }

    pub fn get_vic(&self) -> Shared<dyn Chip> {
        self.vic.clone()
    }

    pub fn get_vsync(&self) -> bool {
        self.vsync_flag.get()
    }

    pub fn is_cpu_jam(&self) -> bool {
        self.last_pc == self.cpu.get_pc()
    }

    pub fn set_autostart(&mut self, autostart: Option<Autostart>) {
        self.autostart = autostart;
    }

    pub fn reset_vsync(&self) {
        self.vsync_flag.set(false)
    }

    pub fn check_breakpoints(&mut self) -> bool {
        self.breakpoints.check(&*self.cpu).is_some()
    }

    pub fn load(&mut self, data: &[u8], offset: u16) {
        let mut mem = self.ram.borrow_mut();
        let mut address = offset;
        for byte in data {
            mem.write(address, *byte);
            address = address.wrapping_add(1);
        }
    }

    pub fn reset(&mut self, hard: bool) {
        info!(target: "c64", "Resetting system");
        self.clock.reset();
        // Memory
        if hard {
            for i in 0..self.config.model.memory_size as u16 {
                self.ram.borrow_mut().write(i, 0x00);
            }
            for i in 0..self.config.model.color_ram as u16 {
                self.color_ram.borrow_mut().write(i, 0x00);
            }
        }
        // Chipset
        self.cpu.reset();
        self.cia_1.borrow_mut().reset();
        self.cia_2.borrow_mut().reset();
        self.sid.borrow_mut().reset();
        self.vic.borrow_mut().reset();
        // I/O
        self.expansion_port.borrow_mut().reset();
        // Peripherals
        self.datassette.borrow_mut().reset();
        self.iec_controller.borrow_mut().reset();
        if let Some(ref mut drive) = *self.drive_8.borrow_mut() {
            drive.reset();
        }
        if let Some(ref mut joystick) = self.joystick_1 {
            joystick.reset();
        }
        if let Some(ref mut joystick) = self.joystick_2 {
            joystick.reset();
        }
        self.keyboard.reset();
        self.frame_buffer.borrow_mut().reset();
        self.sound_buffer.reset();
        // Runtime State
        self.frame_count = 0;
        self.last_pc = 0;
        self.vsync_flag.set(false);
    }

    pub fn run_frame(&mut self) -> bool {
        if self.rewinding {
            return self.rewind_frame();
        }
        let tick_fn = self.tick_fn.clone();
        let bp_present = self.breakpoints.is_bp_present();
        match self.execution_mode {
            ExecutionMode::Cycle => {
                while !self.vsync_flag.get() {
                    self.step_internal(&tick_fn);
                    if bp_present && self.check_breakpoints() {
                        break;
                    }
                }
            }
            ExecutionMode::Line => {
                // Same cycle-exact stepping underneath, checked against
                // breakpoints once a raster line instead of once a cycle.
                let cycles_per_line = u32::from(self.config.model.cycles_per_line);
                let mut cycle_in_line = 0u32;
                while !self.vsync_flag.get() {
                    self.step_internal(&tick_fn);
                    cycle_in_line += 1;
                    if cycle_in_line >= cycles_per_line {
                        cycle_in_line = 0;
                        if bp_present && self.check_breakpoints() {
                            break;
                        }
                    }
                }
            }
        }
        if self.vsync_flag.get() {
            self.sid.borrow_mut().process_vsync();
            self.cia_1.borrow_mut().process_vsync();
            self.cia_2.borrow_mut().process_vsync();
            self.frame_count = self.frame_count.wrapping_add(1);
            self.capture_rewind_point();
        }
        self.vsync_flag.get()
    }

    fn capture_rewind_point(&mut self) {
        let drive8_path = self.drive8_path.clone();
        let snapshot = Snapshot::capture(self, drive8_path);
        self.rewind_buffer.push(snapshot);
    }

    /// Enters rewind mode: subsequent `run_frame` calls restore history
    /// instead of advancing it, walking backward one captured frame at a
    /// time until the oldest retained snapshot is reached.
    pub fn start_rewind(&mut self) {
        self.rewinding = true;
    }

    pub fn stop_rewind(&mut self) {
        self.rewinding = false;
    }

    pub fn is_rewinding(&self) -> bool {
        self.rewinding
    }

    fn rewind_frame(&mut self) -> bool {
        if let Some(snapshot) = self.rewind_buffer.rewind() {
            snapshot.restore(self);
            self.frame_count = self.frame_count.wrapping_add(1);
            true
        } else {
            self.rewinding = false;
            false
        }
    }

    pub fn step(&mut self) {
        let tick_fn = self.tick_fn.clone();
        self.step_internal(&tick_fn);
        if self.vsync_flag.get() {
            self.sid.borrow_mut().process_vsync();
            self.cia_1.borrow_mut().process_vsync();
            self.cia_2.borrow_mut().process_vsync();
            self.frame_count = self.frame_count.wrapping_add(1);
        }
    }

    #[inline]
    pub fn step_internal(&mut self, tick_fn: &TickFn) {
        self.last_pc = self.cpu.get_pc();
        self.cpu.step(&tick_fn);
        if self.autostart.is_some() && self.cpu.get_pc() == BaseAddr::BootComplete.addr() {
            if let Some(mut autostart) = self.autostart.take() {
                autostart.execute(self);
            }
        }
        // The drive runs its own 6502 at roughly the host's clock rate but is
        // never itself invoked by the host's tick_fn (its instructions aren't
        // cycle-granular from the outside) - so it's caught up here, one
        // instruction at a time, until its own cycle count catches up with
        // the host's.
        if let Some(ref mut drive) = *self.drive_8.borrow_mut() {
            let host_cycles = self.clock.get();
            while (drive.cycles() as u64) < host_cycles {
                drive.step();
            }
        }
    }

    // -- Peripherals Ops

    pub fn attach_cartridge(&mut self, cartridge: Cartridge) {
        self.expansion_port.borrow_mut().attach(cartridge);
    }

    pub fn attach_tape(&mut self, tape: Box<dyn Tape>) {
        self.datassette.borrow_mut().attach(tape);
    }

    pub fn detach_cartridge(&mut self) {
        self.expansion_port.borrow_mut().detach();
        self.reset(false);
    }

    pub fn detach_tape(&mut self) {
        self.datassette.borrow_mut().detach();
    }

    /// Enables processor-level 1541 emulation on device 8, in place of any
    /// DOS-level drive registered there.
    pub fn attach_drive_8(&mut self, drive: Drive1541) {
        self.iec_controller.borrow_mut().set_drive(8, None);
        *self.drive_8.borrow_mut() = Some(drive);
    }

    pub fn detach_drive_8(&mut self) {
        *self.drive_8.borrow_mut() = None;
    }

    /// Registers a DOS-level drive (device 8..11). Has no effect on device 8
    /// while processor-level emulation is attached there.
    pub fn attach_dos_drive(&mut self, device: u8, drive: Box<dyn Drive>) {
        self.iec_controller.borrow_mut().set_drive(device, Some(drive));
    }

    pub fn detach_dos_drive(&mut self, device: u8) {
        self.iec_controller.borrow_mut().set_drive(device, None);
    }

    pub fn get_iec_controller(&self) -> Shared<IecController> {
        self.iec_controller.clone()
    }

    pub fn drive_8_led_on(&self) -> bool {
        self.drive_8.borrow().as_ref().map_or(false, |d| d.led_on())
    }

    /// Mounts a D64 sector image on device 8: fed straight to the
    /// cycle-accurate drive's GCR encoder if processor-level emulation is
    /// attached there, otherwise registered as a DOS-level `ImageDrive`.
    pub fn mount_disk_image_8(&mut self, data: Vec<u8>) {
        if let Some(ref mut drive) = *self.drive_8.borrow_mut() {
            drive.load_d64(&data);
        } else {
            self.iec_controller
                .borrow_mut()
                .set_drive(8, Some(Box::new(zinc64_drive::dos::ImageDrive::from_image(data))));
        }
    }

    /// Mounts a pre-encoded G64 surface on device 8. Only meaningful with
    /// processor-level emulation attached - a DOS-level `ImageDrive` has no
    /// way to turn raw GCR bytes back into sectors without the hardware
    /// path's own decoder, so this is a no-op without a `Drive1541`
    /// present, which callers are expected to check via `get_drive_8`.
    pub fn mount_gcr_image_8(&mut self, halftracks: Vec<Vec<u8>>) {
        if let Some(ref mut drive) = *self.drive_8.borrow_mut() {
            drive.load_g64(halftracks);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::C64Factory;
    use super::*;
    use zinc64_core::factory::SystemModel;

    static RES_BASIC_ROM: &[u8] = include_bytes!("../../res/rom/basic.rom");
    static RES_CHARSET_ROM: &[u8] = include_bytes!("../../res/rom/characters.rom");
    static RES_KERNAL_ROM: &[u8] = include_bytes!("../../res/rom/kernal.rom");

    #[test]
    fn verify_mem_layout() {
        let config = Rc::new(Config::new_with_roms(
            SystemModel::from("pal"),
            RES_BASIC_ROM,
            RES_CHARSET_ROM,
            RES_KERNAL_ROM,
        ));
        let factory = Box::new(C64Factory::new(config.clone()));
        let video_output = new_shared(NullVideo {});
        let sound_output = Arc::new(NullSound {});
        let mut c64 = C64::build(config.clone(), &*factory, video_output, sound_output);
        c64.reset(false);
        let cpu = c64.get_cpu();
        assert_eq!(0x94, cpu.read(0xa000));
    }

    struct NullSound;
    impl SoundOutput for NullSound {
        fn reset(&self) {}
        fn write(&self, _samples: &[i16]) {}
    }

    struct NullVideo;
    impl VideoOutput for NullVideo {
        fn get_dimension(&self) -> (usize, usize) {
            (0, 0)
        }
        fn reset(&mut self) {}
        fn write(&mut self, _index: usize, _color: u8) {}
    }
}
