// This file is part of zinc64.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use std::fs;
use std::path::PathBuf;

use crate::iec::{Drive, DriveError, LedState, Status};

// Spec: CBM-DOS as implemented on top of a D64/X64 disk image, a host
// directory, or a read-only archive container - the three concrete `Drive`
// kinds an IEC bus slot can be bound to.

const DIR_TRACK: u8 = 18;
const DIR_INTERLEAVE: u8 = 3;
const DATA_INTERLEAVE: u8 = 10;
const SIZEOF_DE: usize = 32;
const DIR_ENTRIES_OFFSET: usize = 2;

const BAM_BITMAP: usize = 4;
const BAM_DISK_NAME: usize = 144;
const BAM_DISK_ID: usize = 162;

const DE_TYPE: usize = 0;
const DE_TRACK: usize = 1;
const DE_SECTOR: usize = 2;
const DE_NAME: usize = 3;
const DE_NUM_BLOCKS_L: usize = 28;
const DE_NUM_BLOCKS_H: usize = 29;

const NUM_SECTORS: [u32; 36] = [
    0, 21, 21, 21, 21, 21, 21, 21, 21, 21, 21, 21, 21, 21, 21, 21, 21, 21, 19, 19, 19, 19, 19, 19,
    19, 18, 18, 18, 18, 18, 18, 17, 17, 17, 17, 17,
];

fn num_sectors(track: u8) -> u32 {
    NUM_SECTORS.get(track as usize).copied().unwrap_or(0)
}

fn offset_from_ts(track: u8, sector: u8) -> Option<usize> {
    if track < 1 || track > 35 || sector as u32 >= num_sectors(track) {
        return None;
    }
    let accum: u32 = (1..track).map(num_sectors).sum();
    Some(((accum + sector as u32) << 8) as usize)
}

/// '*' matches the remainder; '?' matches one character; a pattern shorter
/// than 16 bytes must end exactly where the padded name hits its 0xa0 pad.
fn name_matches(pattern: &[u8], name: &[u8; 16]) -> bool {
    let pattern = &pattern[..pattern.len().min(16)];
    for (i, &p) in pattern.iter().enumerate() {
        if p == b'*' {
            return true;
        }
        if p != name[i] && p != b'?' {
            return false;
        }
    }
    pattern.len() == 16 || name[pattern.len()] == 0xa0
}

/// Strips an optional leading '@' (overwrite) and "N:" drive-number prefix,
/// then truncates at the first ',' (file type/mode suffix), as in
/// "@0:HELLO,P,W" -> "HELLO".
fn extract_filename(name: &[u8]) -> &[u8] {
    let name = name.strip_prefix(b"@").unwrap_or(name);
    let name = match name.iter().position(|&b| b == b':') {
        Some(colon) => &name[colon + 1..],
        None => name,
    };
    match name.iter().position(|&b| b == b',') {
        Some(comma) => &name[..comma],
        None => name,
    }
}

fn pad_name(name: &[u8]) -> [u8; 16] {
    let mut padded = [0xa0u8; 16];
    for (i, &b) in name.iter().take(16).enumerate() {
        padded[i] = b;
    }
    padded
}

#[derive(Clone, Copy, PartialEq)]
enum ChannelMode {
    Free,
    Reading,
    Writing,
    Command,
}

struct Channel {
    mode: ChannelMode,
    data: Vec<u8>,
    pos: usize,
    dir_track: u8,
    dir_sector: u8,
    entry: u8,
    track: u8,
    sector: u8,
    num_blocks: u16,
    name: [u8; 16],
}

impl Channel {
    fn free() -> Self {
        Self {
            mode: ChannelMode::Free,
            data: Vec::new(),
            pos: 0,
            dir_track: 0,
            dir_sector: 0,
            entry: 0,
            track: 0,
            sector: 0,
            num_blocks: 0,
            name: [0xa0; 16],
        }
    }
}

/// A D64/X64 disk image mounted on a bus slot.
///
/// The on-disk BAM is authoritative; every allocation/free mutates an
/// in-memory copy (`bam`) which is written back to the image only when the
/// directory channel (15) is closed or a write channel finishes, mirroring
/// the original's `bam_dirty`/`Close` flush.
pub struct ImageDrive {
    path: PathBuf,
    image: Vec<u8>,
    num_tracks: u8,
    write_protected: bool,
    bam: [u8; 256],
    bam_dirty: bool,
    channels: [Channel; 16],
    command: Vec<u8>,
    error: DriveError,
    ready: bool,
    led: LedState,
}

impl ImageDrive {
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let image = fs::read(&path)?;
        let mut drive = Self::from_image(image);
        drive.path = path;
        Ok(drive)
    }

    /// Mounts a disk image already in memory (e.g. one handed over by a
    /// loader after reading it from an archive or a non-path source).
    /// Writes still mutate the in-memory copy but are never flushed to
    /// disk, since there is no backing path to flush to.
    pub fn from_image(image: Vec<u8>) -> Self {
        let num_tracks = if image.len() > offset_from_ts(35, 0).unwrap_or(0) + 256 * 17 { 40 } else { 35 };
        let mut drive = Self {
            path: PathBuf::new(),
            image,
            num_tracks,
            write_protected: false,
            bam: [0; 256],
            bam_dirty: false,
            channels: std::array::from_fn(|_| Channel::free()),
            command: Vec::new(),
            error: DriveError::Ok,
            ready: true,
            led: LedState::Off,
        };
        drive.load_bam();
        drive
    }

    fn load_bam(&mut self) {
        if let Some(offset) = offset_from_ts(DIR_TRACK, 0) {
            if offset + 256 <= self.image.len() {
                self.bam.copy_from_slice(&self.image[offset..offset + 256]);
                return;
            }
        }
        self.clear_bam();
    }

    fn clear_bam(&mut self) {
        const NUM_TO_BITS: [u8; 8] = [0x01, 0x03, 0x07, 0x0f, 0x1f, 0x3f, 0x7f, 0xff];
        for track in 1..=35u8 {
            let n = num_sectors(track);
            let base = BAM_BITMAP + (track as usize - 1) * 4;
            self.bam[base] = n as u8;
            self.bam[base + 1] = 0xff;
            self.bam[base + 2] = 0xff;
            self.bam[base + 3] = NUM_TO_BITS[(n - 16).max(0) as usize % 8];
        }
        self.bam_dirty = true;
    }

    fn read_sector(&self, track: u8, sector: u8) -> Option<[u8; 256]> {
        let offset = offset_from_ts(track, sector)?;
        if offset + 256 > self.image.len() {
            return None;
        }
        let mut buf = [0u8; 256];
        buf.copy_from_slice(&self.image[offset..offset + 256]);
        Some(buf)
    }

    fn write_sector(&mut self, track: u8, sector: u8, data: &[u8; 256]) -> bool {
        match offset_from_ts(track, sector) {
            Some(offset) if offset + 256 <= self.image.len() => {
                self.image[offset..offset + 256].copy_from_slice(data);
                true
            }
            _ => false,
        }
    }

    fn flush_bam(&mut self) {
        if self.bam_dirty {
            if let Some(offset) = offset_from_ts(DIR_TRACK, 0) {
                if offset + 256 <= self.image.len() {
                    self.image[offset..offset + 256].copy_from_slice(&self.bam);
                }
            }
            if !self.path.as_os_str().is_empty() {
                let _ = fs::write(&self.path, &self.image);
            }
            self.bam_dirty = false;
        }
    }

    fn is_block_free(&self, track: u8, sector: u8) -> bool {
        let base = BAM_BITMAP + (track as usize - 1) * 4;
        let byte = sector as usize / 8 + 1;
        let bit = sector % 8;
        self.bam[base + byte] & (1 << bit) != 0
    }

    fn num_free_blocks(&self, track: u8) -> u8 {
        self.bam[BAM_BITMAP + (track as usize - 1) * 4]
    }

    fn alloc_block(&mut self, track: u8, sector: u8) -> DriveError {
        if track < 1 || track > 35 || sector as u32 >= num_sectors(track) {
            return DriveError::IllegalTs;
        }
        let base = BAM_BITMAP + (track as usize - 1) * 4;
        let byte = sector as usize / 8 + 1;
        let bit = sector % 8;
        if self.bam[base + byte] & (1 << bit) != 0 {
            self.bam[base + byte] &= !(1 << bit);
            self.bam[base] -= 1;
            self.bam_dirty = true;
            DriveError::Ok
        } else {
            DriveError::NoBlock
        }
    }

    fn free_block(&mut self, track: u8, sector: u8) -> DriveError {
        if track < 1 || track > 35 || sector as u32 >= num_sectors(track) {
            return DriveError::IllegalTs;
        }
        let base = BAM_BITMAP + (track as usize - 1) * 4;
        let byte = sector as usize / 8 + 1;
        let bit = sector % 8;
        if self.bam[base + byte] & (1 << bit) == 0 {
            self.bam[base + byte] |= 1 << bit;
            self.bam[base] += 1;
            self.bam_dirty = true;
        }
        DriveError::Ok
    }

    /// Walks outward from the directory track (17, 19, 16, 20, ...),
    /// applying `interleave` within a track once free blocks are found.
    fn alloc_next_block(&mut self, track: &mut u8, sector: &mut u8, interleave: u8) -> bool {
        let mut side_changed = false;
        while self.num_free_blocks(*track) == 0 {
            if *track == DIR_TRACK {
                *track = 0;
                *sector = 0;
                self.error = DriveError::DiskFull;
                return false;
            } else if *track > DIR_TRACK {
                *track += 1;
                if *track > 35 {
                    if !side_changed {
                        side_changed = true;
                    } else {
                        *track = 0;
                        *sector = 0;
                        self.error = DriveError::DiskFull;
                        return false;
                    }
                    *track = DIR_TRACK - 1;
                    *sector = 0;
                }
            } else {
                *track -= 1;
                if *track < 1 {
                    if !side_changed {
                        side_changed = true;
                    } else {
                        *track = 0;
                        *sector = 0;
                        self.error = DriveError::DiskFull;
                        return false;
                    }
                    *track = DIR_TRACK + 1;
                    *sector = 0;
                }
            }
        }

        let num = num_sectors(*track) as u8;
        let mut s = sector.wrapping_add(interleave);
        if s >= num {
            s -= num;
            if s > 0 {
                s -= 1;
            }
        }
        while !self.is_block_free(*track, s) {
            s += 1;
            if s >= num {
                s = 0;
                while !self.is_block_free(*track, s) {
                    s += 1;
                    if s >= num {
                        *track = 0;
                        *sector = 0;
                        self.error = DriveError::DirError;
                        return false;
                    }
                }
            }
        }
        *sector = s;
        self.alloc_block(*track, *sector);
        true
    }

    fn read_directory_entries(&self) -> Vec<(u8, u8, u8, [u8; SIZEOF_DE])> {
        let mut entries = Vec::new();
        let mut track = DIR_TRACK;
        let mut sector = 1u8;
        let mut visited = 0;
        while let Some(buf) = self.read_sector(track, sector) {
            for slot in 0..8u8 {
                let base = DIR_ENTRIES_OFFSET + slot as usize * SIZEOF_DE;
                let mut de = [0u8; SIZEOF_DE];
                de.copy_from_slice(&buf[base..base + SIZEOF_DE]);
                if de[DE_TYPE] != 0 {
                    entries.push((track, sector, slot, de));
                }
            }
            let next_track = buf[0];
            let next_sector = buf[1];
            visited += 1;
            if next_track == 0 || visited > num_sectors(DIR_TRACK) as u32 {
                break;
            }
            track = next_track;
            sector = next_sector;
        }
        entries
    }

    fn find_file(&self, pattern: &[u8]) -> Option<(u8, u8, u8, [u8; SIZEOF_DE])> {
        self.read_directory_entries()
            .into_iter()
            .find(|(_, _, _, de)| {
                let mut name = [0u8; 16];
                name.copy_from_slice(&de[DE_NAME..DE_NAME + 16]);
                name_matches(pattern, &name)
            })
    }

    fn alloc_dir_entry(&mut self) -> Option<(u8, u8, u8)> {
        let mut track = DIR_TRACK;
        let mut sector = 1u8;
        loop {
            let buf = self.read_sector(track, sector)?;
            for slot in 0..8u8 {
                let base = DIR_ENTRIES_OFFSET + slot as usize * SIZEOF_DE;
                if buf[base + DE_TYPE] == 0 {
                    return Some((track, sector, slot));
                }
            }
            let next_track = buf[0];
            let next_sector = buf[1];
            if next_track == 0 {
                let mut t = DIR_TRACK;
                let mut s = sector;
                if !self.alloc_next_block(&mut t, &mut s, DIR_INTERLEAVE) {
                    return None;
                }
                let mut new_buf = [0u8; 256];
                new_buf[0] = 0;
                new_buf[1] = 0xff;
                self.write_sector(t, s, &new_buf);
                let mut cur = self.read_sector(track, sector)?;
                cur[0] = t;
                cur[1] = s;
                self.write_sector(track, sector, &cur);
                return Some((t, s, 0));
            }
            track = next_track;
            sector = next_sector;
        }
    }

    fn read_file_contents(&self, first_track: u8, first_sector: u8) -> Vec<u8> {
        let mut data = Vec::new();
        let mut track = first_track;
        let mut sector = first_sector;
        let mut visited = 0u32;
        while let Some(buf) = self.read_sector(track, sector) {
            visited += 1;
            if visited > 1000 {
                break;
            }
            let next_track = buf[0];
            let next_sector = buf[1];
            if next_track == 0 {
                let len = next_sector as usize;
                data.extend_from_slice(&buf[2..len.max(2)]);
                break;
            } else {
                data.extend_from_slice(&buf[2..256]);
                track = next_track;
                sector = next_sector;
            }
        }
        data
    }

    fn write_file_contents(&mut self, channel: u8) {
        let ch_idx = channel as usize;
        let data = self.channels[ch_idx].data.clone();
        let mut track = DIR_TRACK - 1;
        let mut sector = 0u8.wrapping_sub(DATA_INTERLEAVE);
        let mut first_track = 0u8;
        let mut first_sector = 0u8;
        let mut num_blocks = 0u16;
        let mut chunks = data.chunks(254).peekable();
        let mut prev_location: Option<(u8, u8)> = None;
        while let Some(chunk) = chunks.next() {
            if !self.alloc_next_block(&mut track, &mut sector, DATA_INTERLEAVE) {
                break;
            }
            if first_track == 0 {
                first_track = track;
                first_sector = sector;
            }
            let mut buf = [0u8; 256];
            if chunks.peek().is_some() {
                buf[2..2 + chunk.len()].copy_from_slice(chunk);
            } else {
                buf[0] = 0;
                buf[1] = (2 + chunk.len()) as u8;
                buf[2..2 + chunk.len()].copy_from_slice(chunk);
            }
            self.write_sector(track, sector, &buf);
            if let Some((pt, ps)) = prev_location {
                let mut prev = self.read_sector(pt, ps).unwrap_or([0u8; 256]);
                prev[0] = track;
                prev[1] = sector;
                self.write_sector(pt, ps, &prev);
            }
            prev_location = Some((track, sector));
            num_blocks += 1;
        }
        let ch = &mut self.channels[ch_idx];
        ch.track = first_track;
        ch.sector = first_sector;
        ch.num_blocks = num_blocks;
    }
}

impl Drive for ImageDrive {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn led(&self) -> LedState {
        self.led
    }

    fn open(&mut self, channel: u8, name: &[u8]) -> Status {
        if channel == 15 {
            self.command.clear();
            self.command.extend_from_slice(name);
            if !self.command.is_empty() {
                self.error = self.execute_cmd(&self.command.clone());
            }
            return Status::Ok;
        }
        self.led = LedState::On;
        if name.first() == Some(&b'$') {
            let entries = self.read_directory_entries();
            let mut listing = Vec::new();
            listing.extend_from_slice(&self.bam[BAM_DISK_NAME..BAM_DISK_NAME + 18]);
            for (_, _, _, de) in &entries {
                let blocks = de[DE_NUM_BLOCKS_L] as u16 | ((de[DE_NUM_BLOCKS_H] as u16) << 8);
                listing.extend_from_slice(&blocks.to_le_bytes());
                listing.extend_from_slice(&de[DE_NAME..DE_NAME + 16]);
            }
            self.channels[channel as usize] = Channel {
                mode: ChannelMode::Reading,
                data: listing,
                pos: 0,
                ..Channel::free()
            };
            return Status::Ok;
        }
        let writing = name.first() == Some(&b'@') || self.command.starts_with(b"W");
        if writing {
            self.channels[channel as usize] = Channel {
                mode: ChannelMode::Writing,
                name: pad_name(extract_filename(name)),
                ..Channel::free()
            };
            return Status::Ok;
        }
        match self.find_file(name) {
            Some((dir_track, dir_sector, entry, de)) => {
                let data = self.read_file_contents(de[DE_TRACK], de[DE_SECTOR]);
                self.channels[channel as usize] = Channel {
                    mode: ChannelMode::Reading,
                    data,
                    pos: 0,
                    dir_track,
                    dir_sector,
                    entry,
                    ..Channel::free()
                };
                Status::Ok
            }
            None => {
                self.error = DriveError::FileNotFound;
                self.led = LedState::ErrorFlash;
                Status::NotPresent
            }
        }
    }

    fn close(&mut self, channel: u8) -> Status {
        if channel != 15 {
            if self.channels[channel as usize].mode == ChannelMode::Writing {
                self.write_file_contents(channel);
                if let Some((track, sector, entry)) = self.alloc_dir_entry() {
                    let ch = &self.channels[channel as usize];
                    let mut buf = self.read_sector(track, sector).unwrap_or([0u8; 256]);
                    let base = DIR_ENTRIES_OFFSET + entry as usize * SIZEOF_DE;
                    buf[base + DE_TYPE] = 0x82; // PRG, closed
                    buf[base + DE_TRACK] = ch.track;
                    buf[base + DE_SECTOR] = ch.sector;
                    buf[base + DE_NAME..base + DE_NAME + 16].copy_from_slice(&ch.name);
                    buf[base + DE_NUM_BLOCKS_L] = ch.num_blocks as u8;
                    buf[base + DE_NUM_BLOCKS_H] = (ch.num_blocks >> 8) as u8;
                    self.write_sector(track, sector, &buf);
                }
            }
            self.channels[channel as usize] = Channel::free();
            if self.led != LedState::ErrorFlash {
                self.led = LedState::Off;
            }
        }
        self.flush_bam();
        Status::Ok
    }

    fn read(&mut self, channel: u8) -> (Status, u8) {
        let ch = &mut self.channels[channel as usize];
        if ch.pos >= ch.data.len() {
            return (Status::Eof, 0);
        }
        let byte = ch.data[ch.pos];
        ch.pos += 1;
        let status = if ch.pos >= ch.data.len() { Status::Eof } else { Status::Ok };
        (status, byte)
    }

    fn write(&mut self, channel: u8, byte: u8, _eoi: bool) -> Status {
        if channel == 15 {
            self.command.push(byte);
            return Status::Ok;
        }
        self.channels[channel as usize].data.push(byte);
        Status::Ok
    }

    fn reset(&mut self) {
        for ch in self.channels.iter_mut() {
            *ch = Channel::free();
        }
        self.command.clear();
        self.error = DriveError::Startup;
        self.led = LedState::Off;
    }

    fn block_read_cmd(&mut self, channel: u8, track: u8, sector: u8, _user_cmd: bool) -> DriveError {
        match self.read_sector(track, sector) {
            Some(buf) => {
                self.channels[channel as usize] = Channel {
                    mode: ChannelMode::Reading,
                    data: buf.to_vec(),
                    pos: 0,
                    ..Channel::free()
                };
                DriveError::Ok
            }
            None => DriveError::IllegalTs,
        }
    }

    fn block_write_cmd(&mut self, channel: u8, track: u8, sector: u8, _user_cmd: bool) -> DriveError {
        let data = self.channels[channel as usize].data.clone();
        let mut buf = [0u8; 256];
        let len = data.len().min(256);
        buf[..len].copy_from_slice(&data[..len]);
        if self.write_sector(track, sector, &buf) {
            DriveError::Ok
        } else {
            DriveError::IllegalTs
        }
    }

    fn block_allocate_cmd(&mut self, track: u8, sector: u8) -> DriveError {
        self.alloc_block(track, sector)
    }

    fn block_free_cmd(&mut self, track: u8, sector: u8) -> DriveError {
        self.free_block(track, sector)
    }

    fn scratch_cmd(&mut self, files: &[u8]) -> DriveError {
        let mut scratched = 0u8;
        if let Some((track, sector, entry, de)) = self.find_file(files) {
            self.free_block_chain(de[DE_TRACK], de[DE_SECTOR]);
            if let Some(mut buf) = self.read_sector(track, sector) {
                let base = DIR_ENTRIES_OFFSET + entry as usize * SIZEOF_DE;
                buf[base + DE_TYPE] = 0;
                self.write_sector(track, sector, &buf);
                scratched += 1;
            }
        }
        self.flush_bam();
        if scratched > 0 {
            DriveError::Scratched
        } else {
            DriveError::FileNotFound
        }
    }

    fn validate_cmd(&mut self) -> DriveError {
        self.clear_bam();
        self.alloc_block(DIR_TRACK, 0);
        for (_, _, _, de) in self.read_directory_entries() {
            if de[DE_TYPE] != 0 {
                self.alloc_block_chain(de[DE_TRACK], de[DE_SECTOR]);
            }
        }
        self.flush_bam();
        DriveError::Ok
    }

    fn initialize_cmd(&mut self) -> DriveError {
        self.load_bam();
        DriveError::Ok
    }
}

impl ImageDrive {
    fn alloc_block_chain(&mut self, mut track: u8, mut sector: u8) -> bool {
        loop {
            if self.alloc_block(track, sector) != DriveError::Ok {
                return true;
            }
            match self.read_sector(track, sector) {
                Some(buf) if buf[0] != 0 => {
                    track = buf[0];
                    sector = buf[1];
                }
                _ => return true,
            }
        }
    }

    fn free_block_chain(&mut self, mut track: u8, mut sector: u8) -> bool {
        loop {
            if self.free_block(track, sector) != DriveError::Ok {
                return true;
            }
            match self.read_sector(track, sector) {
                Some(buf) if buf[0] != 0 => {
                    track = buf[0];
                    sector = buf[1];
                }
                _ => return true,
            }
        }
    }
}

/// A host directory mounted as a drive: the directory listing is synthesized
/// on `Open("$")` into a BASIC-listable "file", and each open channel keeps
/// a one-byte read-ahead so EOF lands on the correct byte.
pub struct FSDrive {
    root: PathBuf,
    files: [Option<fs::File>; 16],
    read_ahead: [Option<u8>; 16],
    directory_channel: [Option<Vec<u8>>; 16],
    directory_pos: [usize; 16],
    ready: bool,
    led: LedState,
}

impl FSDrive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: std::array::from_fn(|_| None),
            read_ahead: [None; 16],
            directory_channel: std::array::from_fn(|_| None),
            directory_pos: [0; 16],
            ready: true,
            led: LedState::Off,
        }
    }

    fn resolve(&self, name: &[u8]) -> PathBuf {
        self.root.join(String::from_utf8_lossy(name).trim().to_string())
    }

    fn build_directory(&self, pattern: &[u8]) -> Vec<u8> {
        let mut listing = Vec::new();
        let pad = pad_name(b"HOST DISK");
        listing.extend_from_slice(&pad);
        if let Ok(read_dir) = fs::read_dir(&self.root) {
            for entry in read_dir.flatten() {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                let name_bytes = name.as_bytes();
                if !pattern.is_empty() && !name_matches(pattern, &pad_name(name_bytes)) {
                    continue;
                }
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                let blocks = ((size + 253) / 254) as u16;
                listing.extend_from_slice(&blocks.to_le_bytes());
                listing.extend_from_slice(&pad_name(name_bytes));
            }
        }
        listing
    }
}

impl Drive for FSDrive {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn led(&self) -> LedState {
        self.led
    }

    fn open(&mut self, channel: u8, name: &[u8]) -> Status {
        let idx = channel as usize;
        self.led = LedState::On;
        if name.first() == Some(&b'$') {
            let pattern = if name.len() > 1 { &name[1..] } else { &[][..] };
            let mut listing = self.build_directory(pattern);
            if !listing.is_empty() {
                self.directory_pos[idx] = 0;
                self.directory_channel[idx] = Some(std::mem::take(&mut listing));
            }
            return Status::Ok;
        }
        match fs::File::open(self.resolve(name)) {
            Ok(file) => {
                self.files[idx] = Some(file);
                self.read_ahead[idx] = None;
                Status::Ok
            }
            Err(_) => {
                self.led = LedState::ErrorFlash;
                Status::NotPresent
            }
        }
    }

    fn close(&mut self, channel: u8) -> Status {
        let idx = channel as usize;
        self.files[idx] = None;
        self.directory_channel[idx] = None;
        self.read_ahead[idx] = None;
        if self.led != LedState::ErrorFlash {
            self.led = LedState::Off;
        }
        Status::Ok
    }

    fn read(&mut self, channel: u8) -> (Status, u8) {
        use std::io::Read;
        let idx = channel as usize;
        if let Some(listing) = &self.directory_channel[idx] {
            if self.directory_pos[idx] >= listing.len() {
                return (Status::Eof, 0);
            }
            let byte = listing[self.directory_pos[idx]];
            self.directory_pos[idx] += 1;
            let status = if self.directory_pos[idx] >= listing.len() { Status::Eof } else { Status::Ok };
            return (status, byte);
        }
        let Some(file) = self.files[idx].as_mut() else {
            return (Status::ReadTimeout, 0);
        };
        if self.read_ahead[idx].is_none() {
            let mut byte = [0u8; 1];
            self.read_ahead[idx] = if file.read(&mut byte).unwrap_or(0) == 1 { Some(byte[0]) } else { None };
        }
        match self.read_ahead[idx].take() {
            Some(current) => {
                let mut next = [0u8; 1];
                let has_next = self.files[idx].as_mut().unwrap().read(&mut next).unwrap_or(0) == 1;
                self.read_ahead[idx] = if has_next { Some(next[0]) } else { None };
                let status = if has_next { Status::Ok } else { Status::Eof };
                (status, current)
            }
            None => (Status::Eof, 0),
        }
    }

    fn write(&mut self, channel: u8, byte: u8, _eoi: bool) -> Status {
        use std::io::Write as _;
        let idx = channel as usize;
        match self.files[idx].as_mut() {
            Some(file) => {
                let _ = file.write_all(&[byte]);
                Status::Ok
            }
            None => Status::Timeout,
        }
    }

    fn reset(&mut self) {
        self.files = std::array::from_fn(|_| None);
        self.directory_channel = std::array::from_fn(|_| None);
        self.read_ahead = [None; 16];
        self.led = LedState::Off;
    }
}

/// One file inside a read-only archive container (T64/LYNX/P00).
struct ArchEntry {
    name: [u8; 16],
    offset: usize,
    size: usize,
}

/// A read-only archive-backed drive. Only the entry table and a flat byte
/// blob are kept; `Write` and every DOS command callback report the drive
/// as not-ready for modification, matching the original's read-only
/// `ArchDrive`.
pub struct ArchDrive {
    data: Vec<u8>,
    entries: Vec<ArchEntry>,
    open_channel: [Option<(usize, usize)>; 16],
    ready: bool,
    led: LedState,
}

impl ArchDrive {
    /// Parses a T64 container: 64-byte global header, then one 32-byte
    /// directory entry per file (start/end address, name, file offset).
    pub fn open_t64(data: Vec<u8>) -> Option<Self> {
        if data.len() < 64 || &data[0..3] != b"C64" {
            return None;
        }
        let max_entries = u16::from_le_bytes([data[34], data[35]]) as usize;
        let mut entries = Vec::new();
        for i in 0..max_entries {
            let base = 64 + i * 32;
            if base + 32 > data.len() {
                break;
            }
            let entry_type = data[base];
            if entry_type == 0 {
                continue;
            }
            let start = u16::from_le_bytes([data[base + 2], data[base + 3]]) as usize;
            let end = u16::from_le_bytes([data[base + 4], data[base + 5]]) as usize;
            let file_offset = u32::from_le_bytes([
                data[base + 8],
                data[base + 9],
                data[base + 10],
                data[base + 11],
            ]) as usize;
            let mut name = [0xa0u8; 16];
            name.copy_from_slice(&data[base + 16..base + 32]);
            let size = end.saturating_sub(start).max(2);
            entries.push(ArchEntry { name, offset: file_offset, size });
        }
        Some(Self {
            data,
            entries,
            open_channel: std::array::from_fn(|_| None),
            ready: true,
            led: LedState::Off,
        })
    }
}

impl Drive for ArchDrive {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn led(&self) -> LedState {
        self.led
    }

    fn open(&mut self, channel: u8, name: &[u8]) -> Status {
        let idx = channel as usize;
        if name.first() == Some(&b'$') {
            self.open_channel[idx] = Some((usize::MAX, 0));
            return Status::Ok;
        }
        match self.entries.iter().position(|e| name_matches(name, &e.name)) {
            Some(pos) => {
                self.open_channel[idx] = Some((pos, 0));
                Status::Ok
            }
            None => Status::NotPresent,
        }
    }

    fn close(&mut self, channel: u8) -> Status {
        self.open_channel[channel as usize] = None;
        Status::Ok
    }

    fn read(&mut self, channel: u8) -> (Status, u8) {
        let idx = channel as usize;
        match self.open_channel[idx] {
            Some((usize::MAX, pos)) => {
                let mut listing = Vec::new();
                for e in &self.entries {
                    listing.extend_from_slice(&e.name);
                }
                if pos >= listing.len() {
                    return (Status::Eof, 0);
                }
                self.open_channel[idx] = Some((usize::MAX, pos + 1));
                let status = if pos + 1 >= listing.len() { Status::Eof } else { Status::Ok };
                (status, listing[pos])
            }
            Some((entry, pos)) => {
                let e = &self.entries[entry];
                if pos >= e.size || e.offset + pos >= self.data.len() {
                    return (Status::Eof, 0);
                }
                let byte = self.data[e.offset + pos];
                self.open_channel[idx] = Some((entry, pos + 1));
                let status = if pos + 1 >= e.size { Status::Eof } else { Status::Ok };
                (status, byte)
            }
            None => (Status::ReadTimeout, 0),
        }
    }

    fn write(&mut self, _channel: u8, _byte: u8, _eoi: bool) -> Status {
        Status::Timeout
    }

    fn reset(&mut self) {
        self.open_channel = std::array::from_fn(|_| None);
    }
}

fn _assert_drive_object_safe(_: &dyn Drive) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_matches_wildcards() {
        assert!(name_matches(b"TEST*", &pad_name(b"TESTFILE")));
        assert!(name_matches(b"TE?T", &pad_name(b"TEST")));
        assert!(!name_matches(b"FOO", &pad_name(b"TEST")));
        assert!(name_matches(b"TEST", &pad_name(b"TEST")));
    }

    #[test]
    fn offset_from_ts_matches_known_layout() {
        assert_eq!(Some(0), offset_from_ts(1, 0));
        assert_eq!(Some(21 << 8), offset_from_ts(2, 0));
        assert_eq!(None, offset_from_ts(36, 0));
    }

    fn blank_image() -> Vec<u8> {
        vec![0u8; 174848]
    }

    #[test]
    fn alloc_next_block_walks_outward_from_directory_track() {
        let image = blank_image();
        let path = std::env::temp_dir().join("zinc64_drive_test_blank.d64");
        fs::write(&path, &image).unwrap();
        let mut drive = ImageDrive::open(&path).unwrap();
        drive.clear_bam();
        drive.alloc_block(DIR_TRACK, 0);
        let mut track = DIR_TRACK - 1;
        let mut sector = 0u8.wrapping_sub(DATA_INTERLEAVE);
        assert!(drive.alloc_next_block(&mut track, &mut sector, DATA_INTERLEAVE));
        assert_eq!(17, track);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn scratch_reports_file_not_found_on_blank_disk() {
        let image = blank_image();
        let path = std::env::temp_dir().join("zinc64_drive_test_scratch.d64");
        fs::write(&path, &image).unwrap();
        let mut drive = ImageDrive::open(&path).unwrap();
        assert_eq!(DriveError::FileNotFound, drive.scratch_cmd(b"NOSUCHFILE"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn t64_parses_entries_and_reads_content() {
        let mut data = vec![0u8; 64 + 32 + 4];
        data[0..3].copy_from_slice(b"C64");
        data[34] = 1;
        data[35] = 0;
        let base = 64;
        data[base] = 1;
        data[base + 2..base + 4].copy_from_slice(&0x0801u16.to_le_bytes());
        data[base + 4..base + 6].copy_from_slice(&0x0805u16.to_le_bytes());
        data[base + 8..base + 12].copy_from_slice(&(96u32).to_le_bytes());
        data[base + 16..base + 32].copy_from_slice(&pad_name(b"HELLO"));
        data.extend_from_slice(&[1, 2, 3, 4]);
        let mut drive = ArchDrive::open_t64(data).unwrap();
        assert_eq!(Status::Ok, drive.open(0, b"HELLO"));
        let (status, byte) = drive.read(0);
        assert_eq!(Status::Ok, status);
        assert_eq!(1, byte);
    }

    #[test]
    fn write_then_read_round_trips_file_contents() {
        let image = blank_image();
        let path = std::env::temp_dir().join("zinc64_drive_test_rw.d64");
        fs::write(&path, &image).unwrap();
        let mut drive = ImageDrive::open(&path).unwrap();
        drive.clear_bam();
        drive.alloc_block(DIR_TRACK, 0);

        assert_eq!(Status::Ok, drive.open(1, b"@0:HELLO,P,W"));
        for &b in b"HELLO WORLD" {
            drive.write(1, b, false);
        }
        assert_eq!(Status::Ok, drive.close(1));

        assert_eq!(Status::Ok, drive.open(2, b"HELLO"));
        let mut out = Vec::new();
        loop {
            let (status, byte) = drive.read(2);
            out.push(byte);
            if status == Status::Eof {
                break;
            }
        }
        assert_eq!(b"HELLO WORLD", out.as_slice());

        let _ = fs::remove_file(&path);
    }
}
