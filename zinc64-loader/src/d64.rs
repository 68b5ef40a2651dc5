// This file is part of zinc64.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

#[cfg(not(feature = "std"))]
use alloc::prelude::*;

use zinc64_system::autostart;
use zinc64_system::{Autostart, AutostartMethod, Image, C64};

use super::Loader;
use crate::io::{self, Reader};

// SPEC: 1541 disk image - https://www.c64-wiki.com/index.php/D64
// 35 tracks, 35 tracks + 683-byte error table, 40 tracks, or 40 tracks +
// error table are the only sizes a real D64 comes in.
const SIZE_35_TRACKS: usize = 174848;
const SIZE_35_TRACKS_ERR: usize = 175531;
const SIZE_40_TRACKS: usize = 196608;
const SIZE_40_TRACKS_ERR: usize = 197376;

struct D64Image {
    data: Vec<u8>,
}

impl Image for D64Image {
    fn mount(&mut self, c64: &mut C64) {
        info!(target: "loader", "Mounting D64 image");
        c64.mount_disk_image_8(self.data.clone());
    }

    fn unmount(&mut self, c64: &mut C64) {
        c64.detach_dos_drive(8);
    }
}

pub struct D64Loader;

impl D64Loader {
    pub fn new() -> Self {
        Self {}
    }
}

impl Loader for D64Loader {
    fn autostart(&self, reader: &mut dyn Reader) -> io::Result<AutostartMethod> {
        let image = self.load(reader)?;
        let autostart = Autostart::new(autostart::Mode::LoadRun, image);
        Ok(AutostartMethod::WithAutostart(Some(autostart)))
    }

    fn load(&self, reader: &mut dyn Reader) -> io::Result<Box<dyn Image>> {
        info!(target: "loader", "Loading D64");
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        match data.len() {
            SIZE_35_TRACKS | SIZE_35_TRACKS_ERR | SIZE_40_TRACKS | SIZE_40_TRACKS_ERR => {
                info!(target: "loader", "D64 image, size {}", data.len());
                Ok(Box::new(D64Image { data }))
            }
            len => Err(format!("invalid d64 image size {}", len)),
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

    #[test]
    fn rejects_wrong_sized_image() {
        let data = vec![0u8; 1000];
        let mut reader = SliceReader::new(&data);
        let loader = D64Loader::new();
        assert!(loader.load(&mut reader).is_err());
    }

    #[test]
    fn accepts_35_track_image() {
        let data = vec![0u8; SIZE_35_TRACKS];
        let mut reader = SliceReader::new(&data);
        let loader = D64Loader::new();
        assert!(loader.load(&mut reader).is_ok());
    }
}
