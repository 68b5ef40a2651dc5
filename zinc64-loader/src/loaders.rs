// This file is part of zinc64.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

#[cfg(not(feature = "std"))]
use alloc::prelude::*;

use crate::bin;
use crate::crt;
use crate::d64;
use crate::g64;
use crate::p00;
use crate::prg;
use crate::tap;
use crate::x64;
use crate::Loader;

pub struct Loaders;

impl Loaders {
    pub fn from_ext(ext: Option<&str>) -> Result<Box<dyn Loader>, String> {
        match ext {
            Some("bin") => Ok(Box::new(bin::BinLoader::new(0x0801))),
            Some("crt") => Ok(Box::new(crt::CrtLoader::new())),
            Some("d64") | Some("D64") => Ok(Box::new(d64::D64Loader::new())),
            Some("g64") | Some("G64") => Ok(Box::new(g64::G64Loader::new())),
            Some("p00") | Some("P00") => Ok(Box::new(p00::P00Loader::new())),
            Some("prg") => Ok(Box::new(prg::PrgLoader::new())),
            Some("tap") => Ok(Box::new(tap::TapLoader::new())),
            Some("x64") | Some("X64") => Ok(Box::new(x64::X64Loader::new())),
            _ => Err(format!("invalid loader {}", ext.unwrap_or(""))),
        }
    }
}
