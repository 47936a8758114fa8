use crate::error::{Error, Result};
use crate::hex::{HEX_INVALID, HEX_PAIR_LOOKUP};

/// Length of a fixed width record, excluding the newline:
/// `pppppppppppppppp aaaaaaaaaaaaaaaa R sss`
pub const FIXED_RECORD_LEN: usize = 39;
const PC_OFFSET: usize = 0;
const ADDRESS_OFFSET: usize = 17;
const ADDRESS_SIZE: usize = 16;
const ADDRESS_UPPER: usize = ADDRESS_OFFSET + ADDRESS_SIZE;
const RW_MODE: usize = ADDRESS_UPPER + 1;
const SIZE: usize = RW_MODE + 2;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

impl AccessKind {
    fn parse(byte: u8) -> Option<Self> {
        match byte {
            b'R' | b'r' => Some(AccessKind::Read),
            b'W' | b'w' => Some(AccessKind::Write),
            _ => None,
        }
    }
}

/// A single memory access from a trace
///
/// Only `address` and `size` affect the simulation, the instruction pointer and the access kind
/// are decoded for completeness
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    pub pc: u64,
    pub address: u64,
    pub op: AccessKind,
    pub size: u32,
}

/// Iterates over the records of a textual trace held in memory
///
/// Each line holds an instruction pointer and an address in hex, `R` or `W`, and the size of the
/// access in decimal bytes, separated by whitespace. Blank lines are skipped. Reads from the byte
/// array are strictly sequential, so memory mapped input can be advised accordingly.
///
/// Records which can't be decoded are yielded as [`Error::MalformedTraceEvent`]; iteration can
/// continue past them. A zero sized access is malformed, as it touches no cache line.
pub struct TraceReader<'a> {
    bytes: &'a [u8],
    line: u64,
}

impl<'a> TraceReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, line: 0 }
    }
}

impl<'a> Iterator for TraceReader<'a> {
    type Item = Result<TraceEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let bytes = self.bytes;
            if bytes.is_empty() {
                return None;
            }
            let (record, rest) = match bytes.iter().position(|b| *b == b'\n') {
                Some(end) => (&bytes[..end], &bytes[end + 1..]),
                None => (bytes, &bytes[bytes.len()..]),
            };
            self.bytes = rest;
            self.line += 1;
            let record = record.strip_suffix(b"\r").unwrap_or(record);
            if record.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Some(parse_record(record).map_err(|reason| Error::MalformedTraceEvent {
                line: self.line,
                reason,
            }));
        }
    }
}

/// Decodes one record, without its line terminator
pub fn parse_record(record: &[u8]) -> Result<TraceEvent, String> {
    let event = match parse_fixed(record) {
        Some(event) => event,
        None => parse_fields(record)?,
    };
    if event.size == 0 {
        return Err("zero length access".to_string());
    }
    Ok(event)
}

/// Fast path for the canonical fixed width layout. Returns None if the record has any other
/// shape, or a digit is out of range, leaving the error message to the general parser
fn parse_fixed(record: &[u8]) -> Option<TraceEvent> {
    if record.len() != FIXED_RECORD_LEN
        || record[ADDRESS_OFFSET - 1] != b' '
        || record[RW_MODE - 1] != b' '
        || record[SIZE - 1] != b' '
    {
        return None;
    }
    Some(TraceEvent {
        pc: parse_address(record[PC_OFFSET..PC_OFFSET + ADDRESS_SIZE].try_into().ok()?)?,
        address: parse_address(record[ADDRESS_OFFSET..ADDRESS_UPPER].try_into().ok()?)?,
        op: AccessKind::parse(record[RW_MODE])?,
        size: parse_size(record[SIZE..FIXED_RECORD_LEN].try_into().ok()?)?,
    })
}

fn parse_fields(record: &[u8]) -> Result<TraceEvent, String> {
    let text = std::str::from_utf8(record).map_err(|_| "record is not valid UTF-8".to_string())?;
    let mut fields = text.split_ascii_whitespace();
    let mut next = |what: &str| fields.next().ok_or_else(|| format!("missing {what}"));
    let pc = parse_hex(next("instruction pointer")?, "instruction pointer")?;
    let address = parse_hex(next("address")?, "address")?;
    let op = match next("access kind")?.as_bytes() {
        [byte] => AccessKind::parse(*byte),
        _ => None,
    }
    .ok_or_else(|| "access kind must be R or W".to_string())?;
    let size = next("size")?;
    let size = size
        .parse::<u32>()
        .map_err(|e| format!("bad size {size:?}: {e}"))?;
    if let Some(extra) = fields.next() {
        return Err(format!("unexpected trailing field {extra:?}"));
    }
    Ok(TraceEvent {
        pc,
        address,
        op,
        size,
    })
}

fn parse_hex(field: &str, what: &str) -> Result<u64, String> {
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);
    u64::from_str_radix(digits, 16).map_err(|e| format!("bad {what} {field:?}: {e}"))
}

/// Parses a 64-bit value from a 16 byte hexadecimal address
///
/// For caches which do not require large lookup times, such as direct or 2way, parsing the
/// address with the standard library becomes the bottleneck by a significant margin, so we
/// use a custom implementation.
///
/// This function makes use of a lookup table of 2^16 entries, which performs lookups for each
/// pair of hex characters. This gets unrolled by the compiler, and is significantly faster than
/// individual lookups of each byte, or branching approaches. Entries for pairs which aren't two hex
/// digits carry a flag bit, which is accumulated so the whole address is validated with a single
/// branch at the end.
///
/// The lookup table is generated by build.rs, as a const fn takes too long to evaluate and the
/// result can be cached across compilations.
///
/// # Examples
///
/// ```
/// use cachehier::trace::parse_address;
/// assert_eq!(parse_address(b"000000000000000A"), Some(10));
/// assert_eq!(parse_address(b"00000000000000G0"), None);
/// ```
pub fn parse_address(buf: &[u8; 16]) -> Option<u64> {
    let mut res: u64 = 0;
    let mut flags: u16 = 0;
    let mut x = 0;
    while x < 15 {
        let entry = HEX_PAIR_LOOKUP[(buf[x] as usize) << 8 | buf[x + 1] as usize];
        res = (res << 8) | (entry & 0xFF) as u64;
        flags |= entry;
        x += 2;
    }
    (flags & HEX_INVALID == 0).then_some(res)
}

/// Parses a zero padded three digit decimal size
///
/// # Examples
///
/// ```
/// use cachehier::trace::parse_size;
/// assert_eq!(parse_size(b"010"), Some(10));
/// assert_eq!(parse_size(b" 10"), None);
/// ```
pub fn parse_size(buf: &[u8; 3]) -> Option<u32> {
    if !buf.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(
        100 * (buf[0] - b'0') as u32 + 10 * (buf[1] - b'0') as u32 + (buf[2] - b'0') as u32,
    )
}
