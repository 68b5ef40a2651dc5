// This file is part of zinc64.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

#[cfg(not(feature = "std"))]
use alloc::prelude::*;
#[cfg(not(feature = "std"))]
use alloc::vec;

use byteorder::{ByteOrder, LittleEndian};

use super::c64::C64;

/// Spec: fixed-layout binary record - 16-byte ASCII tag, versioned by the
/// tag itself so a mismatched reader rejects the file outright instead of
/// misreading it.
pub const SNAPSHOT_TAG: &[u8; 16] = b"FrodoSnapshot4\0\0";
const DRIVE_PATH_SIZE: usize = 256;
const FLAG_DRIVE_PRESENT: u16 = 0x0001;

/// An atomic capture of everything a snapshot restores except ROMs and the
/// disk image bytes themselves - those are reattached from `drive8_path`
/// instead of being carried in the record.
#[derive(Clone)]
pub struct Snapshot {
    pub drive8_path: Option<String>,
    ram: Vec<u8>,
    color_ram: Vec<u8>,
    cpu: Vec<u8>,
    cia_1: Vec<u8>,
    cia_2: Vec<u8>,
    sid: Vec<u8>,
    vic: Vec<u8>,
    drive: Option<Vec<u8>>,
}

impl Snapshot {
    /// Captures the live machine state. `drive8_path` is whatever image path
    /// the caller has mounted on device 8, carried through verbatim so
    /// restore can reattach it without the record itself holding image
    /// bytes.
    pub fn capture(c64: &C64, drive8_path: Option<String>) -> Snapshot {
        let drive = c64.get_drive_8().borrow().as_ref().map(|drive| drive.get_state());
        Snapshot {
            drive8_path,
            ram: c64.get_ram().borrow().as_bytes().to_vec(),
            color_ram: c64.get_color_ram().borrow().as_bytes().to_vec(),
            cpu: c64.get_cpu().get_state(),
            cia_1: c64.get_cia_1().borrow().get_state(),
            cia_2: c64.get_cia_2().borrow().get_state(),
            sid: c64.get_sid().borrow().get_state(),
            vic: c64.get_vic().borrow().get_state(),
            drive,
        }
    }

    /// Restores a previously captured state onto a live machine. The caller
    /// is responsible for reattaching/mounting `drive8_path` beforehand if
    /// processor-level drive state is present - `restore` only feeds the
    /// bytes into whichever `Drive1541` is already attached.
    pub fn restore(&self, c64: &mut C64) {
        c64.get_ram().borrow_mut().set_bytes(&self.ram);
        c64.get_color_ram().borrow_mut().set_bytes(&self.color_ram);
        c64.get_cpu_mut().set_state(&self.cpu);
        c64.get_cia_1().borrow_mut().set_state(&self.cia_1);
        c64.get_cia_2().borrow_mut().set_state(&self.cia_2);
        c64.get_sid().borrow_mut().set_state(&self.sid);
        c64.get_vic().borrow_mut().set_state(&self.vic);
        if let Some(ref drive_state) = self.drive {
            if let Some(ref mut drive) = *c64.get_drive_8().borrow_mut() {
                drive.set_state(drive_state);
            }
        }
    }

    /// Serializes to the fixed binary layout from spec §6: tag, flags,
    /// null-padded path, then each byte-exact record length-prefixed so a
    /// reader can skip a chip record from a future format revision without
    /// understanding it.
    pub fn write(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(SNAPSHOT_TAG);
        let flags: u16 = if self.drive.is_some() { FLAG_DRIVE_PRESENT } else { 0 };
        let mut flags_buf = [0u8; 2];
        LittleEndian::write_u16(&mut flags_buf, flags);
        out.extend_from_slice(&flags_buf);
        let mut path_buf = vec![0u8; DRIVE_PATH_SIZE];
        if let Some(ref path) = self.drive8_path {
            let bytes = path.as_bytes();
            let len = bytes.len().min(DRIVE_PATH_SIZE - 1);
            path_buf[..len].copy_from_slice(&bytes[..len]);
        }
        out.extend_from_slice(&path_buf);
        write_block(&mut out, &self.ram);
        write_block(&mut out, &self.color_ram);
        write_block(&mut out, &self.cpu);
        write_block(&mut out, &self.cia_1);
        write_block(&mut out, &self.cia_2);
        write_block(&mut out, &self.sid);
        write_block(&mut out, &self.vic);
        if let Some(ref drive_state) = self.drive {
            write_block(&mut out, drive_state);
        }
        out
    }

    /// Parses the fixed binary layout, rejecting anything whose tag doesn't
    /// match byte-for-byte (the "snapshot not accepted" case from spec §7).
    pub fn read(data: &[u8]) -> Result<Snapshot, String> {
        if data.len() < SNAPSHOT_TAG.len() + 2 + DRIVE_PATH_SIZE {
            return Err("snapshot truncated".to_string());
        }
        if &data[0..SNAPSHOT_TAG.len()] != SNAPSHOT_TAG.as_ref() {
            return Err("snapshot tag mismatch".to_string());
        }
        let mut pos = SNAPSHOT_TAG.len();
        let flags = LittleEndian::read_u16(&data[pos..pos + 2]);
        pos += 2;
        let path_bytes = &data[pos..pos + DRIVE_PATH_SIZE];
        pos += DRIVE_PATH_SIZE;
        let path_len = path_bytes.iter().position(|&b| b == 0).unwrap_or(DRIVE_PATH_SIZE);
        let drive8_path = if path_len > 0 {
            Some(String::from_utf8_lossy(&path_bytes[..path_len]).into_owned())
        } else {
            None
        };
        let ram = read_block(data, &mut pos)?;
        let color_ram = read_block(data, &mut pos)?;
        let cpu = read_block(data, &mut pos)?;
        let cia_1 = read_block(data, &mut pos)?;
        let cia_2 = read_block(data, &mut pos)?;
        let sid = read_block(data, &mut pos)?;
        let vic = read_block(data, &mut pos)?;
        let drive = if flags & FLAG_DRIVE_PRESENT != 0 {
            Some(read_block(data, &mut pos)?)
        } else {
            None
        };
        Ok(Snapshot {
            drive8_path,
            ram,
            color_ram,
            cpu,
            cia_1,
            cia_2,
            sid,
            vic,
            drive,
        })
    }
}

fn write_block(out: &mut Vec<u8>, block: &[u8]) {
    let mut len_buf = [0u8; 4];
    LittleEndian::write_u32(&mut len_buf, block.len() as u32);
    out.extend_from_slice(&len_buf);
    out.extend_from_slice(block);
}

fn read_block(data: &[u8], pos: &mut usize) -> Result<Vec<u8>, String> {
    if *pos + 4 > data.len() {
        return Err("snapshot truncated".to_string());
    }
    let len = LittleEndian::read_u32(&data[*pos..*pos + 4]) as usize;
    *pos += 4;
    if *pos + len > data.len() {
        return Err("snapshot truncated".to_string());
    }
    let block = data[*pos..*pos + len].to_vec();
    *pos += len;
    Ok(block)
}

/// Fixed-capacity ring buffer of per-frame snapshots backing rewind: on
/// rewind request, the scheduler restores the most recent entry every frame
/// and stops adding new ones, so the bottom of the buffer freezes and
/// rewinding loops on the oldest retained snapshot rather than panicking
/// past it.
pub struct RewindBuffer {
    capacity: usize,
    entries: Vec<Snapshot>,
}

impl RewindBuffer {
    pub fn new(capacity: usize) -> Self {
        RewindBuffer {
            capacity: capacity.max(1),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        if self.entries.len() == self.capacity {
            self.entries.remove(0);
        }
        self.entries.push(snapshot);
    }

    /// Returns the snapshot to restore for this rewind frame: pops and
    /// returns the most recent entry, walking backward through history one
    /// frame per call. Once only one entry remains it's returned
    /// repeatedly without being removed, freezing the bottom of the buffer
    /// instead of running out and looping on the oldest retained snapshot.
    pub fn rewind(&mut self) -> Option<Snapshot> {
        if self.entries.len() > 1 {
            self.entries.pop()
        } else {
            self.entries.last().cloned()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
