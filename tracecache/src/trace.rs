use std::io::BufRead;
use lazy_static::lazy_static;
use regex::Regex;
use crate::error::TraceError;

lazy_static! {
    static ref FETCH_PATTERN: Regex =
        Regex::new(r"^EIP \((?P<length>[0-9]+)\): (?P<address>[0-9a-fA-F]+)\b").unwrap();
    static ref MEMORY_PATTERN: Regex =
        Regex::new(r"^dstM: (?P<destination>[0-9a-fA-F]+)\b.*\bsrcM: (?P<source>[0-9a-fA-F]+)\b").unwrap();
}

/// Memory operand address meaning "this instruction has no such operand"
pub const NO_OPERAND: u32 = 0;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessKind {
    Fetch,
    Load,
    Store,
}

/// A single memory access, as consumed by the simulator
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AccessEvent {
    pub kind: AccessKind,
    pub address: u32,
}

impl AccessEvent {
    pub fn fetch(address: u32) -> Self {
        Self { kind: AccessKind::Fetch, address }
    }

    pub fn load(address: u32) -> Self {
        Self { kind: AccessKind::Load, address }
    }

    pub fn store(address: u32) -> Self {
        Self { kind: AccessKind::Store, address }
    }
}

/// A recognised trace line
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TraceLine {
    /// `EIP (<length>): <address> ...`
    Fetch { length: u32, address: u32 },
    /// `dstM: <address> ... srcM: <address> ...`
    Memory { destination: u32, source: u32 },
}

impl TraceLine {
    /// The accesses this line stands for, in trace order. Memory operands equal to
    /// [`NO_OPERAND`] are left out
    pub fn events(&self) -> impl Iterator<Item = AccessEvent> {
        let events = match *self {
            TraceLine::Fetch { address, .. } => [Some(AccessEvent::fetch(address)), None],
            TraceLine::Memory { destination, source } => [
                (destination != NO_OPERAND).then(|| AccessEvent::store(destination)),
                (source != NO_OPERAND).then(|| AccessEvent::load(source)),
            ],
        };
        events.into_iter().flatten()
    }
}

/// Parses a single line, returning `None` when it has neither recognised shape
///
/// # Examples
///
/// ```
/// use tracecache::trace::{parse_line, TraceLine};
/// let line = "EIP (04): 7c809767 83 6c 24 04 01  sub dword [esp+0x4],0x1";
/// assert_eq!(parse_line(line), Some(TraceLine::Fetch { length: 4, address: 0x7c80_9767 }));
/// assert_eq!(parse_line("garbage"), None);
/// ```
pub fn parse_line(line: &str) -> Option<TraceLine> {
    if let Some(captures) = FETCH_PATTERN.captures(line) {
        return Some(TraceLine::Fetch {
            length: captures["length"].parse().ok()?,
            address: parse_address(&captures["address"])?,
        });
    }
    let captures = MEMORY_PATTERN.captures(line)?;
    Some(TraceLine::Memory {
        destination: parse_address(&captures["destination"])?,
        source: parse_address(&captures["source"])?,
    })
}

/// Parses a hexadecimal address, `None` if it doesn't fit in 32 bits
///
/// # Examples
///
/// ```
/// use tracecache::trace::parse_address;
/// assert_eq!(parse_address("0012ffb0"), Some(0x0012_ffb0));
/// assert_eq!(parse_address("100000000"), None);
/// ```
pub fn parse_address(hex: &str) -> Option<u32> {
    u32::from_str_radix(hex, 16).ok()
}

/// Reads trace lines from a buffered reader
///
/// Blank lines are skipped. Lines matching neither shape, or which aren't valid UTF-8, are reported
/// as [`TraceError::MalformedLine`], after which reading carries on with the next line
pub struct TraceReader<R: BufRead> {
    reader: R,
    buffer: Vec<u8>,
    line_number: u64,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            line_number: 0,
        }
    }

    fn malformed(&self, line: &str) -> TraceError {
        TraceError::MalformedLine {
            line_number: self.line_number,
            line: line.to_string(),
        }
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceLine, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(TraceError::Io(e))),
            }
            self.line_number += 1;
            let Ok(text) = std::str::from_utf8(&self.buffer) else {
                let lossy = String::from_utf8_lossy(&self.buffer);
                return Some(Err(self.malformed(lossy.trim_end())));
            };
            let line = text.trim_end();
            if line.is_empty() {
                continue;
            }
            return Some(parse_line(line).ok_or_else(|| self.malformed(line)));
        }
    }
}
