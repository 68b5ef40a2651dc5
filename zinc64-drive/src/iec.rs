// This file is part of zinc64.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use log::LogLevel;

// Spec: IEC serial bus, DOS-level (CBM-DOS trap replacement) drive model.
// Used when processor-level 1541 emulation (`cpu`/`via`/`gcr`) is not
// wanted for a given device: the KERNAL IEC routines are replaced by
// trap-opcode calls straight into `IecController`, one level above the
// physical three-wire protocol.

pub const NAMEBUF_LENGTH: usize = 256;

/// Status byte returned to the KERNAL by every bus primitive.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Status {
    Ok,
    ReadTimeout,
    Timeout,
    Eof,
    NotPresent,
}

impl Status {
    pub fn code(self) -> u8 {
        match self {
            Status::Ok => 0x00,
            Status::ReadTimeout => 0x02,
            Status::Timeout => 0x03,
            Status::Eof => 0x40,
            Status::NotPresent => 0x80,
        }
    }
}

/// 1541 DOS error channel codes (the two-digit codes the drive reports on
/// channel 15, e.g. "21,READ ERROR,00,00").
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DriveError {
    Ok,
    Scratched,
    Unimplemented,
    Read20,
    Read21,
    Read22,
    Read23,
    Read24,
    Write25,
    WriteProtect,
    Read27,
    Write28,
    DiskId,
    Syntax30,
    Syntax31,
    Syntax32,
    Syntax33,
    Syntax34,
    WriteFileOpen,
    FileNotOpen,
    FileNotFound,
    FileExists,
    FileType,
    NoBlock,
    IllegalTs,
    NoChannel,
    DirError,
    DiskFull,
    Startup,
    NotReady,
}

impl DriveError {
    pub fn code(self) -> u8 {
        match self {
            DriveError::Ok => 0,
            DriveError::Scratched => 1,
            DriveError::Unimplemented => 3,
            DriveError::Read20 => 20,
            DriveError::Read21 => 21,
            DriveError::Read22 => 22,
            DriveError::Read23 => 23,
            DriveError::Read24 => 24,
            DriveError::Write25 => 25,
            DriveError::WriteProtect => 26,
            DriveError::Read27 => 27,
            DriveError::Write28 => 28,
            DriveError::DiskId => 29,
            DriveError::Syntax30 => 30,
            DriveError::Syntax31 => 31,
            DriveError::Syntax32 => 32,
            DriveError::Syntax33 => 33,
            DriveError::Syntax34 => 34,
            DriveError::WriteFileOpen => 60,
            DriveError::FileNotOpen => 61,
            DriveError::FileNotFound => 62,
            DriveError::FileExists => 63,
            DriveError::FileType => 64,
            DriveError::NoBlock => 65,
            DriveError::IllegalTs => 66,
            DriveError::NoChannel => 70,
            DriveError::DirError => 71,
            DriveError::DiskFull => 72,
            DriveError::Startup => 73,
            DriveError::NotReady => 74,
        }
    }

    fn text(self) -> &'static str {
        match self {
            DriveError::Ok => "OK",
            DriveError::Scratched => "FILES SCRATCHED",
            DriveError::Unimplemented => "UNIMPLEMENTED",
            DriveError::Read20 | DriveError::Read21 | DriveError::Read22 | DriveError::Read23
            | DriveError::Read24 | DriveError::Read27 => "READ ERROR",
            DriveError::Write25 | DriveError::Write28 => "WRITE ERROR",
            DriveError::WriteProtect => "WRITE PROTECT ON",
            DriveError::DiskId => "DISK ID MISMATCH",
            DriveError::Syntax30 | DriveError::Syntax31 | DriveError::Syntax32
            | DriveError::Syntax33 | DriveError::Syntax34 => "SYNTAX ERROR",
            DriveError::WriteFileOpen => "WRITE FILE OPEN",
            DriveError::FileNotOpen => "FILE NOT OPEN",
            DriveError::FileNotFound => "FILE NOT FOUND",
            DriveError::FileExists => "FILE EXISTS",
            DriveError::FileType => "FILE TYPE MISMATCH",
            DriveError::NoBlock => "NO BLOCK",
            DriveError::IllegalTs => "ILLEGAL TRACK OR SECTOR",
            DriveError::NoChannel => "NO CHANNEL",
            DriveError::DirError => "DIR ERROR",
            DriveError::DiskFull => "DISK FULL",
            DriveError::Startup => "VIRTUAL 1541",
            DriveError::NotReady => "DRIVE NOT READY",
        }
    }

    /// The line a drive returns for channel 15, e.g. "21,READ ERROR,18,00".
    pub fn message(self, track: u8, sector: u8) -> String {
        format!("{:02},{},{:02},{:02}\r", self.code(), self.text(), track, sector)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum LedState {
    Off,
    On,
    ErrorOff,
    ErrorOn,
    ErrorFlash,
}

/// Polymorphic DOS-level drive: `ImageDrive`, `FSDrive` or `ArchDrive` (see
/// `dos` module). Command callbacks default to "unimplemented", matching
/// the base class every concrete drive overrides from.
pub trait Drive {
    fn is_ready(&self) -> bool;
    fn led(&self) -> LedState;

    fn open(&mut self, channel: u8, name: &[u8]) -> Status;
    fn close(&mut self, channel: u8) -> Status;
    fn read(&mut self, channel: u8) -> (Status, u8);
    fn write(&mut self, channel: u8, byte: u8, eoi: bool) -> Status;
    fn reset(&mut self);

    fn block_read_cmd(&mut self, _channel: u8, _track: u8, _sector: u8, _user_cmd: bool) -> DriveError {
        DriveError::Unimplemented
    }
    fn block_write_cmd(&mut self, _channel: u8, _track: u8, _sector: u8, _user_cmd: bool) -> DriveError {
        DriveError::Unimplemented
    }
    fn block_execute_cmd(&mut self, _channel: u8, _track: u8, _sector: u8) -> DriveError {
        DriveError::Unimplemented
    }
    fn block_allocate_cmd(&mut self, _track: u8, _sector: u8) -> DriveError {
        DriveError::Unimplemented
    }
    fn block_free_cmd(&mut self, _track: u8, _sector: u8) -> DriveError {
        DriveError::Unimplemented
    }
    fn buffer_pointer_cmd(&mut self, _channel: u8, _pos: u8) -> DriveError {
        DriveError::Unimplemented
    }
    fn mem_read_cmd(&mut self, _address: u16, _len: u8) -> DriveError {
        DriveError::Unimplemented
    }
    fn mem_write_cmd(&mut self, _address: u16, _data: &[u8]) -> DriveError {
        DriveError::Unimplemented
    }
    fn mem_execute_cmd(&mut self, _address: u16) -> DriveError {
        DriveError::Unimplemented
    }
    fn copy_cmd(&mut self, _new_file: &[u8], _old_files: &[u8]) -> DriveError {
        DriveError::Unimplemented
    }
    fn rename_cmd(&mut self, _new_file: &[u8], _old_file: &[u8]) -> DriveError {
        DriveError::Unimplemented
    }
    fn scratch_cmd(&mut self, _files: &[u8]) -> DriveError {
        DriveError::Unimplemented
    }
    fn position_cmd(&mut self, _cmd: &[u8]) -> DriveError {
        DriveError::Unimplemented
    }
    fn initialize_cmd(&mut self) -> DriveError {
        DriveError::Unimplemented
    }
    fn new_cmd(&mut self, _name: &[u8], _id: Option<&[u8]>) -> DriveError {
        DriveError::Unimplemented
    }
    fn validate_cmd(&mut self) -> DriveError {
        DriveError::Unimplemented
    }

    /// Parses and dispatches a command string received on channel 15, in the
    /// same shape the 1541 DOS accepts ("B-R:...", "M-R..", "S:file", ...).
    fn execute_cmd(&mut self, cmd: &[u8]) -> DriveError {
        let cmd = trailing_trimmed(cmd);
        if cmd.is_empty() {
            return DriveError::Syntax31;
        }
        let colon = cmd.iter().position(|&b| b == b':');
        let minus = cmd.iter().position(|&b| b == b'-');
        let comma = cmd.iter().position(|&b| b == b',');
        let equal = colon.and_then(|c| cmd[c..].iter().position(|&b| b == b'=').map(|p| p + c));
        match cmd[0] {
            b'B' => {
                let Some(minus) = minus else { return DriveError::Syntax31 };
                let args_start = colon.map(|c| c + 1).unwrap_or(3.min(cmd.len()));
                let (a1, a2, a3, a4) = parse_block_args(&cmd[args_start..]);
                match cmd.get(minus + 1) {
                    Some(b'R') => self.block_read_cmd(a1, a3, a4, false),
                    Some(b'W') => self.block_write_cmd(a1, a3, a4, false),
                    Some(b'E') => self.block_execute_cmd(a1, a3, a4),
                    Some(b'A') => self.block_allocate_cmd(a2, a3),
                    Some(b'F') => self.block_free_cmd(a2, a3),
                    Some(b'P') => self.buffer_pointer_cmd(a1, a2),
                    _ => DriveError::Syntax31,
                }
            }
            b'M' => {
                if cmd.get(1) != Some(&b'-') || cmd.len() < 6 {
                    return DriveError::Syntax31;
                }
                let address = cmd[3] as u16 | ((cmd[4] as u16) << 8);
                let len = cmd[5];
                match cmd[2] {
                    b'R' => self.mem_read_cmd(address, if cmd.len() < 6 { 1 } else { len }),
                    b'W' => self.mem_write_cmd(address, &cmd[6..]),
                    b'E' => self.mem_execute_cmd(address),
                    _ => DriveError::Syntax31,
                }
            }
            b'C' => {
                let Some(colon) = colon else { return DriveError::Syntax31 };
                if equal.is_none() || cmd.contains(&b'*') || cmd.contains(&b'?')
                    || comma.map_or(false, |c| Some(c) < equal)
                {
                    return DriveError::Syntax30;
                }
                let equal = equal.unwrap();
                self.copy_cmd(&cmd[colon + 1..equal], &cmd[equal + 1..])
            }
            b'R' => {
                let Some(colon) = colon else { return DriveError::Syntax34 };
                if equal.is_none() || comma.is_some() || cmd.contains(&b'*') || cmd.contains(&b'?') {
                    return DriveError::Syntax30;
                }
                let equal = equal.unwrap();
                self.rename_cmd(&cmd[colon + 1..equal], &cmd[equal + 1..])
            }
            b'S' => {
                let Some(colon) = colon else { return DriveError::Syntax34 };
                self.scratch_cmd(&cmd[colon + 1..])
            }
            b'P' => self.position_cmd(&cmd[1..]),
            b'I' => self.initialize_cmd(),
            b'N' => {
                let Some(colon) = colon else { return DriveError::Syntax34 };
                match comma {
                    Some(comma) => self.new_cmd(&cmd[colon + 1..comma], Some(&cmd[comma + 1..])),
                    None => self.new_cmd(&cmd[colon + 1..], None),
                }
            }
            b'V' => self.validate_cmd(),
            b'U' => {
                if cmd.get(1) == Some(&b'0') {
                    return DriveError::Ok;
                }
                match cmd.get(1).map(|b| b & 0x0f) {
                    Some(1) => {
                        let args_start = colon.map(|c| c + 1).unwrap_or(2.min(cmd.len()));
                        let (a1, _a2, a3, a4) = parse_block_args(&cmd[args_start..]);
                        self.block_read_cmd(a1, a3, a4, true)
                    }
                    Some(2) => {
                        let args_start = colon.map(|c| c + 1).unwrap_or(2.min(cmd.len()));
                        let (a1, _a2, a3, a4) = parse_block_args(&cmd[args_start..]);
                        self.block_write_cmd(a1, a3, a4, true)
                    }
                    Some(9) => {
                        if cmd.get(2) != Some(&b'+') && cmd.get(2) != Some(&b'-') {
                            self.reset();
                        }
                        DriveError::Ok
                    }
                    Some(10) => {
                        self.reset();
                        DriveError::Ok
                    }
                    _ => DriveError::Unimplemented,
                }
            }
            _ => DriveError::Syntax31,
        }
    }
}

fn trailing_trimmed(cmd: &[u8]) -> &[u8] {
    let mut end = cmd.len();
    while end > 0 && cmd[end - 1] == 0x0d {
        end -= 1;
    }
    &cmd[..end]
}

/// Up to four decimal numbers separated by space/comma, as accepted after a
/// "B-x:" command prefix; missing numbers default to 0.
fn parse_block_args(buf: &[u8]) -> (u8, u8, u8, u8) {
    let mut values = [0u8; 4];
    let mut idx = 0;
    let mut acc: u32 = 0;
    let mut have_digit = false;
    for &b in buf {
        match b {
            b'0'..=b'9' => {
                acc = acc * 10 + (b - b'0') as u32;
                have_digit = true;
            }
            b',' | b' ' => {
                if idx < values.len() {
                    values[idx] = acc.min(255) as u8;
                }
                idx += 1;
                acc = 0;
                have_digit = false;
            }
            _ => break,
        }
    }
    if have_digit && idx < values.len() {
        values[idx] = acc.min(255) as u8;
    }
    (values[0], values[1], values[2], values[3])
}

// IEC ATN/command framing codes.
mod code {
    pub const ATN_LISTEN: u8 = 0x20;
    pub const ATN_UNLISTEN: u8 = 0x30;
    pub const ATN_TALK: u8 = 0x40;
    pub const ATN_UNTALK: u8 = 0x50;
    pub const CMD_DATA: u8 = 0x60;
    pub const CMD_CLOSE: u8 = 0xe0;
    pub const CMD_OPEN: u8 = 0xf0;
}

/// One bus slot (device 8..11): absent, or bound to a DOS-level drive.
pub type DriveSlot = Option<Box<dyn Drive>>;

/// Controller/listener/talker state machine for the four DOS-level drive
/// slots, replacing the KERNAL's own IEC routines when a device is not
/// running under full processor-level 1541 emulation. Only one listener and
/// one talker may be active at a time (the real bus permits several
/// listeners; this model does not need to).
pub struct IecController {
    drives: [DriveSlot; 4],
    name_buf: Vec<u8>,
    listener: usize,
    talker: usize,
    listener_active: bool,
    talker_active: bool,
    listening: bool,
    received_cmd: u8,
    sec_addr: u8,
}

impl IecController {
    pub fn new() -> Self {
        Self {
            drives: [None, None, None, None],
            name_buf: Vec::with_capacity(NAMEBUF_LENGTH),
            listener: 0,
            talker: 0,
            listener_active: false,
            talker_active: false,
            listening: false,
            received_cmd: 0,
            sec_addr: 0,
        }
    }

    pub fn set_drive(&mut self, device: u8, drive: DriveSlot) {
        if let Some(slot) = (8..=11).position(|d| d == device) {
            self.drives[slot] = drive;
        }
    }

    pub fn drive(&self, device: u8) -> Option<&dyn Drive> {
        let slot = (device.wrapping_sub(8)) as usize;
        self.drives.get(slot).and_then(|d| d.as_deref())
    }

    pub fn reset(&mut self) {
        for drive in self.drives.iter_mut().flatten() {
            if drive.is_ready() {
                drive.reset();
            }
        }
    }

    pub fn led_states(&self) -> [LedState; 4] {
        let mut states = [LedState::Off; 4];
        for (i, drive) in self.drives.iter().enumerate() {
            states[i] = drive.as_ref().map_or(LedState::Off, |d| d.led());
        }
        states
    }

    /// Output one byte (DATA after OPEN or on a data channel).
    pub fn out(&mut self, byte: u8, eoi: bool) -> Status {
        if !self.listener_active {
            return Status::Timeout;
        }
        match self.received_cmd {
            code::CMD_OPEN => self.open_out(byte, eoi),
            code::CMD_DATA => self.data_out(byte, eoi),
            _ => Status::Timeout,
        }
    }

    /// Output one byte under ATN (Listen/Unlisten/Talk/Untalk addressing).
    pub fn out_atn(&mut self, byte: u8) -> Status {
        self.received_cmd = 0;
        self.sec_addr = 0;
        match byte & 0xf0 {
            code::ATN_LISTEN => {
                self.listening = true;
                self.listen(byte & 0x0f)
            }
            code::ATN_UNLISTEN => {
                self.listening = false;
                self.unlisten()
            }
            code::ATN_TALK => {
                self.listening = false;
                self.talk(byte & 0x0f)
            }
            code::ATN_UNTALK => {
                self.listening = false;
                self.untalk()
            }
            _ => Status::Timeout,
        }
    }

    /// Output a secondary address byte following Listen or Talk.
    pub fn out_sec(&mut self, byte: u8) -> Status {
        if self.listening {
            if self.listener_active {
                self.sec_addr = byte & 0x0f;
                self.received_cmd = byte & 0xf0;
                return self.sec_listen();
            }
        } else if self.talker_active {
            self.sec_addr = byte & 0x0f;
            self.received_cmd = byte & 0xf0;
            return self.sec_talk();
        }
        Status::Timeout
    }

    /// Read one byte from the active talker's current data channel.
    pub fn input(&mut self) -> (Status, u8) {
        if self.talker_active && self.received_cmd == code::CMD_DATA {
            return self.data_in();
        }
        (Status::Timeout, 0)
    }

    /// These four only matter for a physical bus; the DOS-level model has no
    /// line-level turnaround of its own and the calls are no-ops.
    pub fn set_atn(&mut self) {}
    pub fn release_atn(&mut self) {}
    pub fn turnaround(&mut self) {}
    pub fn release(&mut self) {}

    fn listen(&mut self, device: u8) -> Status {
        if (8..=11).contains(&device) && self.drives[(device - 8) as usize].is_some() {
            let ready = self.drives[(device - 8) as usize].as_ref().unwrap().is_ready();
            if ready {
                self.listener = (device - 8) as usize;
                self.listener_active = true;
                return Status::Ok;
            }
        }
        self.listener_active = false;
        Status::NotPresent
    }

    fn talk(&mut self, device: u8) -> Status {
        if (8..=11).contains(&device) && self.drives[(device - 8) as usize].is_some() {
            let ready = self.drives[(device - 8) as usize].as_ref().unwrap().is_ready();
            if ready {
                self.talker = (device - 8) as usize;
                self.talker_active = true;
                return Status::Ok;
            }
        }
        self.talker_active = false;
        Status::NotPresent
    }

    fn unlisten(&mut self) -> Status {
        self.listener_active = false;
        Status::Ok
    }

    fn untalk(&mut self) -> Status {
        self.talker_active = false;
        Status::Ok
    }

    fn sec_listen(&mut self) -> Status {
        match self.received_cmd {
            code::CMD_OPEN => {
                self.name_buf.clear();
                Status::Ok
            }
            code::CMD_CLOSE => {
                let sec_addr = self.sec_addr;
                self.drives[self.listener].as_mut().unwrap().close(sec_addr)
            }
            _ => Status::Ok,
        }
    }

    fn sec_talk(&mut self) -> Status {
        Status::Ok
    }

    fn open_out(&mut self, byte: u8, eoi: bool) -> Status {
        if self.name_buf.len() < NAMEBUF_LENGTH {
            self.name_buf.push(byte);
        }
        if eoi {
            let sec_addr = self.sec_addr;
            let name = self.name_buf.clone();
            if log_enabled!(LogLevel::Debug) {
                debug!(target: "drive::iec", "Open {} on device slot {}", String::from_utf8_lossy(&name), self.listener);
            }
            self.drives[self.listener].as_mut().unwrap().open(sec_addr, &name)
        } else {
            Status::Ok
        }
    }

    fn data_out(&mut self, byte: u8, eoi: bool) -> Status {
        let sec_addr = self.sec_addr;
        self.drives[self.listener].as_mut().unwrap().write(sec_addr, byte, eoi)
    }

    fn data_in(&mut self) -> (Status, u8) {
        let sec_addr = self.sec_addr;
        self.drives[self.talker].as_mut().unwrap().read(sec_addr)
    }
}

impl Default for IecController {
    fn default() -> Self {
        Self::new()
    }
}

/// Wired-AND bus lines (ATN/CLK/DATA): each side pulls its own line low
/// independently; a line reads high only when nobody is pulling it down.
#[derive(Default)]
pub struct IecLines {
    atn: [bool; 2],
    clk: [bool; 2],
    data: [bool; 2],
}

const HOST: usize = 0;
const DRIVE: usize = 1;

impl IecLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_host_atn(&mut self, low: bool) {
        self.atn[HOST] = low;
    }
    pub fn set_host_clk(&mut self, low: bool) {
        self.clk[HOST] = low;
    }
    pub fn set_host_data(&mut self, low: bool) {
        self.data[HOST] = low;
    }
    pub fn set_drive_atn(&mut self, low: bool) {
        self.atn[DRIVE] = low;
    }
    pub fn set_drive_clk(&mut self, low: bool) {
        self.clk[DRIVE] = low;
    }
    pub fn set_drive_data(&mut self, low: bool) {
        self.data[DRIVE] = low;
    }

    pub fn atn(&self) -> bool {
        !self.atn[HOST] && !self.atn[DRIVE]
    }
    pub fn clk(&self) -> bool {
        !self.clk[HOST] && !self.clk[DRIVE]
    }
    pub fn data(&self) -> bool {
        !self.data[HOST] && !self.data[DRIVE]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::rc::Rc;

    struct NullDrive {
        ready: bool,
        opened: Rc<RefCell<Option<(u8, Vec<u8>)>>>,
    }

    impl Drive for NullDrive {
        fn is_ready(&self) -> bool {
            self.ready
        }
        fn led(&self) -> LedState {
            LedState::Off
        }
        fn open(&mut self, channel: u8, name: &[u8]) -> Status {
            *self.opened.borrow_mut() = Some((channel, name.to_vec()));
            Status::Ok
        }
        fn close(&mut self, _channel: u8) -> Status {
            Status::Ok
        }
        fn read(&mut self, _channel: u8) -> (Status, u8) {
            (Status::Eof, 0)
        }
        fn write(&mut self, _channel: u8, _byte: u8, _eoi: bool) -> Status {
            Status::Ok
        }
        fn reset(&mut self) {
            *self.opened.borrow_mut() = None;
        }
    }

    #[test]
    fn listen_requires_ready_drive() {
        let mut iec = IecController::new();
        assert_eq!(Status::NotPresent, iec.out_atn(code::ATN_LISTEN | 0x08));
        let opened = Rc::new(RefCell::new(None));
        iec.set_drive(8, Some(Box::new(NullDrive { ready: true, opened })));
        assert_eq!(Status::Ok, iec.out_atn(code::ATN_LISTEN | 0x08));
    }

    #[test]
    fn open_sequence_collects_name_and_calls_drive() {
        let mut iec = IecController::new();
        let opened = Rc::new(RefCell::new(None));
        iec.set_drive(8, Some(Box::new(NullDrive { ready: true, opened: opened.clone() })));
        iec.out_atn(code::ATN_LISTEN | 0x08);
        iec.out_sec(code::CMD_OPEN | 0x02);
        iec.out(b'$', false);
        iec.out(b'a', true);
        let (channel, name) = opened.borrow().clone().unwrap();
        assert_eq!(0x02, channel);
        assert_eq!(b"$a", name.as_slice());
    }

    #[test]
    fn wired_and_lines_require_both_sides_released() {
        let mut lines = IecLines::new();
        assert!(lines.clk());
        lines.set_host_clk(true);
        assert!(!lines.clk());
        lines.set_drive_clk(true);
        lines.set_host_clk(false);
        assert!(!lines.clk());
        lines.set_drive_clk(false);
        assert!(lines.clk());
    }

    #[test]
    fn execute_cmd_dispatches_scratch() {
        struct ScratchDrive(bool);
        impl Drive for ScratchDrive {
            fn is_ready(&self) -> bool {
                true
            }
            fn led(&self) -> LedState {
                LedState::Off
            }
            fn open(&mut self, _c: u8, _n: &[u8]) -> Status {
                Status::Ok
            }
            fn close(&mut self, _c: u8) -> Status {
                Status::Ok
            }
            fn read(&mut self, _c: u8) -> (Status, u8) {
                (Status::Eof, 0)
            }
            fn write(&mut self, _c: u8, _b: u8, _eoi: bool) -> Status {
                Status::Ok
            }
            fn reset(&mut self) {}
            fn scratch_cmd(&mut self, files: &[u8]) -> DriveError {
                self.0 = !files.is_empty();
                DriveError::Ok
            }
        }
        let mut drive = ScratchDrive(false);
        let result = drive.execute_cmd(b"S:TESTFILE\r");
        assert_eq!(DriveError::Ok, result);
        assert!(drive.0);
    }
}
