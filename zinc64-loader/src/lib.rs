// This file is part of zinc64.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(not(feature = "std"), feature(alloc))]

#[cfg(not(feature = "std"))]
#[macro_use]
extern crate alloc;
#[macro_use]
extern crate log;

#[cfg(not(feature = "std"))]
use alloc::prelude::*;

mod bin;
mod crt;
mod d64;
mod g64;
mod io;
mod loaders;
mod p00;
mod prg;
mod tap;
mod x64;

use zinc64_system::{AutostartMethod, Image};

pub use self::io::{ReadBytesExt, Reader, Result};
pub use self::loaders::Loaders;

pub trait Loader {
    fn autostart(&self, reader: &mut dyn Reader) -> Result<AutostartMethod>;
    fn load(&self, reader: &mut dyn Reader) -> Result<Box<dyn Image>>;
}
