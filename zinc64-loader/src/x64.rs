// This file is part of zinc64.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

#[cfg(not(feature = "std"))]
use alloc::prelude::*;

use zinc64_system::autostart;
use zinc64_system::{Autostart, AutostartMethod, Image, C64};

use super::Loader;
use crate::io::{self, Reader};

// SPEC: X64 disk image - a D64 payload wrapped in a 32-byte header
// ("C\x15\x41\x64" magic, version bytes, track counts, a write-protect
// flag and a free-text description field). The loader only needs the
// magic to confirm the wrapper and then hands the trailing D64 payload
// to the same mount path as a bare D64.
static HEADER_SIG: &[u8; 4] = &[0x43, 0x15, 0x41, 0x64];
const HEADER_LEN: usize = 32;

const SIZE_35_TRACKS: usize = 174848;
const SIZE_35_TRACKS_ERR: usize = 175531;
const SIZE_40_TRACKS: usize = 196608;
const SIZE_40_TRACKS_ERR: usize = 197376;

struct X64Image {
    data: Vec<u8>,
}

impl Image for X64Image {
    fn mount(&mut self, c64: &mut C64) {
        info!(target: "loader", "Mounting X64 image");
        c64.mount_disk_image_8(self.data.clone());
    }

    fn unmount(&mut self, c64: &mut C64) {
        c64.detach_dos_drive(8);
    }
}

pub struct X64Loader;

impl X64Loader {
    pub fn new() -> Self {
        Self {}
    }
}

impl Loader for X64Loader {
    fn autostart(&self, reader: &mut dyn Reader) -> io::Result<AutostartMethod> {
        let image = self.load(reader)?;
        let autostart = Autostart::new(autostart::Mode::LoadRun, image);
        Ok(AutostartMethod::WithAutostart(Some(autostart)))
    }

    fn load(&self, reader: &mut dyn Reader) -> io::Result<Box<dyn Image>> {
        info!(target: "loader", "Loading X64");
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;
        if raw.len() < HEADER_LEN || &raw[0..4] != HEADER_SIG {
            return Err("invalid X64 signature".to_owned());
        }
        let data = raw[HEADER_LEN..].to_vec();
        match data.len() {
            SIZE_35_TRACKS | SIZE_35_TRACKS_ERR | SIZE_40_TRACKS | SIZE_40_TRACKS_ERR => {
                info!(target: "loader", "X64 image, payload size {}", data.len());
                Ok(Box::new(X64Image { data }))
            }
            len => Err(format!("invalid x64 payload size {}", len)),
        }
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

    fn build_minimal_x64() -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN];
        data[0..4].copy_from_slice(HEADER_SIG);
        data.extend_from_slice(&[0u8; SIZE_35_TRACKS]);
        data
    }

    #[test]
    fn rejects_bad_signature() {
        let data = vec![0u8; HEADER_LEN + SIZE_35_TRACKS];
        let mut reader = SliceReader::new(&data);
        let loader = X64Loader::new();
        assert!(loader.load(&mut reader).is_err());
    }

    #[test]
    fn strips_header_and_accepts_payload() {
        let data = build_minimal_x64();
        let mut reader = SliceReader::new(&data);
        let loader = X64Loader::new();
        assert!(loader.load(&mut reader).is_ok());
    }
}
