// This file is part of zinc64.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

#[cfg(not(feature = "std"))]
use alloc::prelude::*;
use log::LogLevel;

use crate::factory::{Addressable, Bank, Mmu};
use crate::util::{Ram, Rom, Shared};

use super::{BaseAddr, Mmio, Pla};

/// CPU-visible $0000-$FFFF address space, bank-switched through `Pla` on
/// every CPU port / expansion port write.
pub struct Memory {
    mmu: Shared<Pla>,
    basic: Shared<Rom>,
    charset: Shared<Rom>,
    io: Mmio,
    kernal: Shared<Rom>,
    ram: Shared<Ram>,
}

impl Memory {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mmu: Shared<Pla>,
        ram: Shared<Ram>,
        rom_basic: Shared<Rom>,
        rom_charset: Shared<Rom>,
        rom_kernal: Shared<Rom>,
        io: Mmio,
    ) -> Self {
        Memory {
            mmu,
            basic: rom_basic,
            charset: rom_charset,
            io,
            kernal: rom_kernal,
            ram,
        }
    }

    pub fn switch_banks(&mut self, mode: u8) {
        if log_enabled!(LogLevel::Trace) {
            trace!(target: "mem::banks", "Switching to {}", mode);
        }
        self.mmu.borrow_mut().switch_banks(mode);
    }
}

impl Addressable for Memory {
    fn read(&self, address: u16) -> u8 {
        match self.mmu.borrow().map(address) {
            Bank::Ram => self.ram.borrow().read(address),
            Bank::Basic => self.basic.borrow().read(address),
            Bank::Charset => self
                .charset
                .borrow()
                .read(address - BaseAddr::Charset.addr()),
            Bank::Kernal => self.kernal.borrow().read(address),
            Bank::RomL => self.ram.borrow().read(address),
            Bank::RomH => self.ram.borrow().read(address),
            Bank::Io => self.io.read(address),
            Bank::Disabled => 0,
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        match self.mmu.borrow().map(address) {
            Bank::Ram | Bank::Basic | Bank::Charset | Bank::Kernal | Bank::RomL | Bank::RomH => {
                self.ram.borrow_mut().write(address, value)
            }
            Bank::Io => self.io.write(address, value),
            Bank::Disabled => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::Chip;
    use crate::util::new_shared;

    struct NullChip;

    impl Chip for NullChip {
        fn clock(&mut self) {}
        fn clock_delta(&mut self, _delta: u32) {}
        fn process_vsync(&mut self) {}
        fn reset(&mut self) {}
        fn read(&mut self, _reg: u8) -> u8 {
            0
        }
        fn write(&mut self, _reg: u8, _value: u8) {}
        fn get_state(&self) -> Vec<u8> {
            Vec::new()
        }
        fn set_state(&mut self, _state: &[u8]) {}
    }

    struct NullFaded;

    impl crate::factory::AddressableFaded for NullFaded {
        fn read(&mut self, _address: u16) -> Option<u8> {
            None
        }
        fn write(&mut self, _address: u16, _value: u8) {}
    }

    fn setup_memory() -> Memory {
        let mmu = new_shared(Pla::new());
        let ram = new_shared(Ram::new(0x10000));
        ram.borrow_mut().fill(0x44);
        let basic = new_shared(Rom::new(0x2000, BaseAddr::Basic.addr(), 0x10));
        let charset = new_shared(Rom::new(0x1000, BaseAddr::Charset.addr(), 0x11));
        let kernal = new_shared(Rom::new(0x2000, BaseAddr::Kernal.addr(), 0x12));
        let color_ram = new_shared(Ram::new(0x0400));
        let io = Mmio::new(
            new_shared(NullChip),
            new_shared(NullChip),
            color_ram,
            new_shared(NullFaded),
            new_shared(NullChip),
            new_shared(NullChip),
        );
        Memory::new(mmu, ram, basic, charset, kernal, io)
    }

    #[test]
    fn read_basic() {
        let mem = setup_memory();
        assert_eq!(0x10, mem.read(BaseAddr::Basic.addr()));
    }

    #[test]
    fn read_charset_after_switch() {
        let mut mem = setup_memory();
        mem.switch_banks(27);
        assert_eq!(0x11, mem.read(BaseAddr::Charset.addr()));
    }

    #[test]
    fn write_goes_through_to_ram_even_when_rom_mapped() {
        let mut mem = setup_memory();
        mem.write(BaseAddr::Basic.addr(), 0xff);
        assert_eq!(0xff, mem.ram.borrow().read(BaseAddr::Basic.addr()));
    }
}
