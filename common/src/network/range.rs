//! # Network Range Dataset
//!
//! Maps an address to the network block that owns it.
//!
//! The dataset is a flat TSV file, one range per line:
//!
//! ```text
//! first<TAB>last<TAB>as_number<TAB>country_code<TAB>description
//! ```
//!
//! Lines may mix IPv4 and IPv6 ranges. Every address is normalized to the
//! 16-byte IPv6 form before comparing, so an IPv4 target is never compared
//! against the raw bytes of an IPv6 bound.

use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::net::IpAddr;
use std::path::Path;

use tracing::debug;

use crate::error::{DatasetError, RecordError};

const FIELD_COUNT: usize = 5;

/// A contiguous, inclusive range of addresses and the network that owns it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkRange {
    pub first: IpAddr,
    pub last: IpAddr,
    pub as_number: u32,
    pub country_code: String,
    pub description: String,
}

impl NetworkRange {
    pub fn contains(&self, addr: &IpAddr) -> bool {
        let target = normalize(addr);
        is_between(&target, &normalize(&self.first), &normalize(&self.last))
    }
}

/// Returns the fixed-width form of `addr`. IPv4 addresses are mapped into
/// `::ffff:0:0/96`.
pub fn normalize(addr: &IpAddr) -> [u8; 16] {
    match addr {
        IpAddr::V4(v4) => v4.to_ipv6_mapped().octets(),
        IpAddr::V6(v6) => v6.octets(),
    }
}

fn is_between(target: &[u8; 16], first: &[u8; 16], last: &[u8; 16]) -> bool {
    target.cmp(first) != Ordering::Less && target.cmp(last) != Ordering::Greater
}

/// Parses one dataset line into a [`NetworkRange`]. [`lookup`] goes through
/// the same steps, deferring the AS number until the bounds match.
pub fn parse_record(line: &str) -> Result<NetworkRange, RecordError> {
    let fields = split_fields(line)?;
    let (first, last) = parse_bounds(fields[0], fields[1])?;
    into_range(first, last, &fields)
}

fn split_fields(line: &str) -> Result<[&str; FIELD_COUNT], RecordError> {
    let fields: Vec<&str> = line.split('\t').collect();
    <[&str; FIELD_COUNT]>::try_from(fields.as_slice())
        .map_err(|_| RecordError::FieldCount(fields.len()))
}

fn parse_bounds(first_str: &str, last_str: &str) -> Result<(IpAddr, IpAddr), RecordError> {
    let first: IpAddr = first_str
        .parse()
        .map_err(|_| RecordError::Address(first_str.to_string()))?;
    let last: IpAddr = last_str
        .parse()
        .map_err(|_| RecordError::Address(last_str.to_string()))?;

    if normalize(&first) > normalize(&last) {
        return Err(RecordError::InvertedRange {
            first: first_str.to_string(),
            last: last_str.to_string(),
        });
    }
    Ok((first, last))
}

fn into_range(
    first: IpAddr,
    last: IpAddr,
    fields: &[&str; FIELD_COUNT],
) -> Result<NetworkRange, RecordError> {
    let as_number = fields[2]
        .trim()
        .parse::<u32>()
        .map_err(|_| RecordError::AsNumber(fields[2].to_string()))?;

    Ok(NetworkRange {
        first,
        last,
        as_number,
        country_code: fields[3].to_string(),
        description: fields[4].to_string(),
    })
}

/// Scans `reader` line by line and returns the first range containing
/// `target`.
///
/// Malformed lines are skipped, including lines that are not valid UTF-8
/// (their text is decoded lossily first). Only a failure to read the stream
/// itself is returned as an error; an address that no range covers yields
/// `Ok(None)`.
pub fn lookup<R: BufRead>(
    target: &IpAddr,
    mut reader: R,
) -> Result<Option<NetworkRange>, DatasetError> {
    let needle: [u8; 16] = normalize(target);
    let mut skipped: usize = 0;
    let mut buf: Vec<u8> = Vec::new();
    let mut line_no: usize = 0;

    loop {
        buf.clear();
        line_no += 1;
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| DatasetError::Read { line: line_no, source })?;
        if read == 0 {
            break;
        }

        let text = String::from_utf8_lossy(&buf);
        let line = text.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            continue;
        }

        // Bounds are checked on every line, the remaining fields only on a hit.
        let bounds = split_fields(line)
            .and_then(|fields| parse_bounds(fields[0], fields[1]).map(|b| (fields, b)));
        let (fields, (first, last)) = match bounds {
            Ok(parsed) => parsed,
            Err(e) => {
                skipped += 1;
                debug!(line = line_no, "skipping record: {e}");
                continue;
            }
        };

        if !is_between(&needle, &normalize(&first), &normalize(&last)) {
            continue;
        }

        match into_range(first, last, &fields) {
            Ok(range) => {
                debug!(line = line_no, skipped, "found owning range for {target}");
                return Ok(Some(range));
            }
            Err(e) => {
                skipped += 1;
                debug!(line = line_no, "skipping record: {e}");
            }
        }
    }

    debug!(skipped, "no range contains {target}");
    Ok(None)
}

/// Opens `path` and runs [`lookup`] over it.
pub fn lookup_file(target: &IpAddr, path: &Path) -> Result<Option<NetworkRange>, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    lookup(target, BufReader::new(file))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
