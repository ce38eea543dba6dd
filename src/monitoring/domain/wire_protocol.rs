//! Fixed-layout frames exchanged with the InstallGuard minifilter.
//!
//! Every frame is a 16-byte filter-manager header followed by a fixed-size
//! body. Strings travel as NUL-terminated UTF-16LE in fixed arrays. All bound
//! checks live in this module; the rest of the pipeline only sees the owned
//! [`WireMessage`] and [`WireResponse`] values.

use crate::shared::error::ChannelError;
use chrono::{DateTime, Utc};

/// Well-known communication port opened by the minifilter.
pub const DEFAULT_PORT_NAME: &str = "\\InstallGuardPort";

pub const MAX_PATH_UNITS: usize = 1024;
pub const MAX_PROCESS_NAME_UNITS: usize = 256;
pub const MAX_USERNAME_UNITS: usize = 256;
pub const MAX_REASON_UNITS: usize = 512;

pub const HEADER_LEN: usize = 16;
pub const REQUEST_BODY_LEN: usize = 3104;
pub const RESPONSE_BODY_LEN: usize = 1036;
pub const REQUEST_FRAME_LEN: usize = HEADER_LEN + REQUEST_BODY_LEN;
pub const RESPONSE_FRAME_LEN: usize = HEADER_LEN + RESPONSE_BODY_LEN;

// Request body offsets (natural C alignment).
const REQ_COMMAND: usize = 0;
const REQ_SIZE: usize = 4;
const REQ_FILE_PATH: usize = 8;
const REQ_FILE_SIZE: usize = 2056;
const REQ_PROCESS_ID: usize = 2064;
const REQ_PROCESS_NAME: usize = 2068;
const REQ_USERNAME: usize = 2580;
const REQ_TIMESTAMP: usize = 3096;

// Response body offsets.
const RESP_COMMAND: usize = 0;
const RESP_REQUEST_ID: usize = 4;
const RESP_ALLOW: usize = 8;
const RESP_REASON: usize = 10;

/// 100 ns intervals between 1601-01-01 and 1970-01-01.
const FILETIME_UNIX_EPOCH: i64 = 116_444_736_000_000_000;
const FILETIME_TICKS_PER_SECOND: i64 = 10_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireCommand {
    InstallRequest,
    InstallResponse,
    CleanupRequest,
    Unknown(u32),
}

impl WireCommand {
    pub fn code(&self) -> u32 {
        match self {
            WireCommand::InstallRequest => 0x1001,
            WireCommand::InstallResponse => 0x1002,
            WireCommand::CleanupRequest => 0x1003,
            WireCommand::Unknown(code) => *code,
        }
    }

    pub fn from_code(code: u32) -> Self {
        match code {
            0x1001 => WireCommand::InstallRequest,
            0x1002 => WireCommand::InstallResponse,
            0x1003 => WireCommand::CleanupRequest,
            other => WireCommand::Unknown(other),
        }
    }
}

/// A decoded driver request. The request id is the filter-manager message id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    pub request_id: u64,
    pub command: WireCommand,
    pub declared_size: u32,
    pub file_path: String,
    pub file_size: i64,
    pub process_id: u32,
    pub process_name: String,
    pub username: String,
    /// FILETIME (100 ns ticks since 1601-01-01 UTC)
    pub timestamp: i64,
}

impl WireMessage {
    pub fn new(request_id: u64, command: WireCommand, file_path: impl Into<String>) -> Self {
        Self {
            request_id,
            command,
            declared_size: REQUEST_BODY_LEN as u32,
            file_path: file_path.into(),
            file_size: 0,
            process_id: 0,
            process_name: String::new(),
            username: String::new(),
            timestamp: datetime_to_filetime(Utc::now()),
        }
    }

    /// Decodes one request frame.
    ///
    /// # Errors
    /// Returns [`ChannelError::Malformed`] when the frame is shorter than a
    /// full request.
    pub fn decode(frame: &[u8]) -> Result<Self, ChannelError> {
        if frame.len() < REQUEST_FRAME_LEN {
            return Err(ChannelError::Malformed {
                details: format!(
                    "request frame is {} bytes, expected {}",
                    frame.len(),
                    REQUEST_FRAME_LEN
                ),
            });
        }

        let request_id = read_u64(frame, 8);
        let body = &frame[HEADER_LEN..REQUEST_FRAME_LEN];

        Ok(Self {
            request_id,
            command: WireCommand::from_code(read_u32(body, REQ_COMMAND)),
            declared_size: read_u32(body, REQ_SIZE),
            file_path: read_utf16(body, REQ_FILE_PATH, MAX_PATH_UNITS),
            file_size: read_i64(body, REQ_FILE_SIZE),
            process_id: read_u32(body, REQ_PROCESS_ID),
            process_name: read_utf16(body, REQ_PROCESS_NAME, MAX_PROCESS_NAME_UNITS),
            username: read_utf16(body, REQ_USERNAME, MAX_USERNAME_UNITS),
            timestamp: read_i64(body, REQ_TIMESTAMP),
        })
    }

    /// Encodes the request the way the minifilter lays it out. Over-length
    /// strings are truncated.
    pub fn encode(&self) -> Vec<u8> {
        let mut frame = vec![0u8; REQUEST_FRAME_LEN];
        write_u32(&mut frame, 0, RESPONSE_FRAME_LEN as u32);
        write_u64(&mut frame, 8, self.request_id);

        let body = &mut frame[HEADER_LEN..];
        write_u32(body, REQ_COMMAND, self.command.code());
        write_u32(body, REQ_SIZE, self.declared_size);
        write_utf16(body, REQ_FILE_PATH, MAX_PATH_UNITS, &self.file_path);
        write_i64(body, REQ_FILE_SIZE, self.file_size);
        write_u32(body, REQ_PROCESS_ID, self.process_id);
        write_utf16(body, REQ_PROCESS_NAME, MAX_PROCESS_NAME_UNITS, &self.process_name);
        write_utf16(body, REQ_USERNAME, MAX_USERNAME_UNITS, &self.username);
        write_i64(body, REQ_TIMESTAMP, self.timestamp);
        frame
    }

    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        filetime_to_datetime(self.timestamp)
    }
}

/// A reply correlated with one request id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    pub request_id: u64,
    pub command: WireCommand,
    pub allow: bool,
    pub reason: String,
}

impl WireResponse {
    pub fn install_response(request_id: u64, allow: bool, reason: impl Into<String>) -> Self {
        Self {
            request_id,
            command: WireCommand::InstallResponse,
            allow,
            reason: reason.into(),
        }
    }

    /// Encodes a reply frame. The header carries the full message id; the
    /// body keeps its low 32 bits.
    pub fn encode(&self) -> Vec<u8> {
        let mut frame = vec![0u8; RESPONSE_FRAME_LEN];
        write_u64(&mut frame, 8, self.request_id);

        let body = &mut frame[HEADER_LEN..];
        write_u32(body, RESP_COMMAND, self.command.code());
        write_u32(body, RESP_REQUEST_ID, self.request_id as u32);
        body[RESP_ALLOW] = u8::from(self.allow);
        write_utf16(body, RESP_REASON, MAX_REASON_UNITS, &self.reason);
        frame
    }

    pub fn decode(frame: &[u8]) -> Result<Self, ChannelError> {
        if frame.len() < RESPONSE_FRAME_LEN {
            return Err(ChannelError::Malformed {
                details: format!(
                    "response frame is {} bytes, expected {}",
                    frame.len(),
                    RESPONSE_FRAME_LEN
                ),
            });
        }

        let body = &frame[HEADER_LEN..RESPONSE_FRAME_LEN];
        Ok(Self {
            request_id: read_u64(frame, 8),
            command: WireCommand::from_code(read_u32(body, RESP_COMMAND)),
            allow: body[RESP_ALLOW] != 0,
            reason: read_utf16(body, RESP_REASON, MAX_REASON_UNITS),
        })
    }
}

pub fn filetime_to_datetime(filetime: i64) -> Option<DateTime<Utc>> {
    let since_unix = filetime.checked_sub(FILETIME_UNIX_EPOCH)?;
    let secs = since_unix.div_euclid(FILETIME_TICKS_PER_SECOND);
    let nanos = (since_unix.rem_euclid(FILETIME_TICKS_PER_SECOND) * 100) as u32;
    DateTime::from_timestamp(secs, nanos)
}

pub fn datetime_to_filetime(datetime: DateTime<Utc>) -> i64 {
    datetime
        .timestamp()
        .saturating_mul(FILETIME_TICKS_PER_SECOND)
        .saturating_add(i64::from(datetime.timestamp_subsec_nanos() / 100))
        .saturating_add(FILETIME_UNIX_EPOCH)
}

fn bytes<const N: usize>(buf: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[offset..offset + N]);
    out
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes(buf, offset))
}

fn read_u64(buf: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(bytes(buf, offset))
}

fn read_i64(buf: &[u8], offset: usize) -> i64 {
    i64::from_le_bytes(bytes(buf, offset))
}

fn write_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn write_u64(buf: &mut [u8], offset: usize, value: u64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

fn write_i64(buf: &mut [u8], offset: usize, value: i64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

/// Reads a NUL-terminated UTF-16LE string from a fixed array of `capacity` units.
fn read_utf16(buf: &[u8], offset: usize, capacity: usize) -> String {
    let units: Vec<u16> = buf[offset..offset + capacity * 2]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

/// Writes at most `capacity - 1` units so the terminator always fits, and
/// never leaves a dangling high surrogate at the cut. The caller's buffer is
/// zeroed, which pads the remainder.
fn write_utf16(buf: &mut [u8], offset: usize, capacity: usize, value: &str) {
    let mut units: Vec<u16> = value
        .encode_utf16()
        .take_while(|&unit| unit != 0)
        .take(capacity - 1)
        .collect();
    if matches!(units.last(), Some(0xD800..=0xDBFF)) {
        units.pop();
    }

    let field = &mut buf[offset..offset + capacity * 2];
    field.fill(0);
    for (slot, unit) in field.chunks_exact_mut(2).zip(units) {
        slot.copy_from_slice(&unit.to_le_bytes());
    }
}
