//! `Range: bytes=` requests.
//!
//! Only single-part responses are produced. Overlapping or adjacent ranges
//! are merged first; anything that still spans several parts is answered
//! with the full representation.

/// An inclusive byte range within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered.
    pub fn size(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for a `206` answer.
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{total}", self.start, self.end)
    }
}

/// What a `Range` header asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// Ignore the header and send everything.
    Full,
    /// Send one slice with `206 Partial Content`.
    Partial(ByteRange),
    /// No requested range overlaps the file: `416`.
    Unsatisfiable,
}

/// `Content-Range` value for a `416` answer.
pub fn unsatisfied_content_range(total: u64) -> String {
    format!("bytes */{total}")
}

/// Parse a `Range` header against a file of `len` bytes.
///
/// Units other than `bytes` are ignored. Specs that cannot be satisfied are
/// dropped; if none remain the request is unsatisfiable.
pub fn parse_range(header: &str, len: u64) -> RangeRequest {
    let Some(specs) = header.trim_start().strip_prefix("bytes=") else {
        return RangeRequest::Full;
    };

    let mut ranges: Vec<ByteRange> = specs
        .split(',')
        .filter_map(|spec| parse_spec(spec.trim(), len))
        .collect();
    if ranges.is_empty() {
        return RangeRequest::Unsatisfiable;
    }

    ranges.sort_by_key(|range| range.start);
    let mut merged: Vec<ByteRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end.saturating_add(1) => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }

    match merged.as_slice() {
        [single] => RangeRequest::Partial(*single),
        _ => RangeRequest::Full,
    }
}

fn parse_spec(spec: &str, len: u64) -> Option<ByteRange> {
    let (first, last) = spec.split_once('-')?;
    let (first, last) = (first.trim(), last.trim());
    if len == 0 {
        return None;
    }

    let (start, end) = if first.is_empty() {
        // Suffix range: the final `n` bytes, clamped to the file.
        let suffix = parse_position(last)?;
        if suffix == 0 {
            return None;
        }
        (len.saturating_sub(suffix), len - 1)
    } else {
        let start = parse_position(first)?;
        let end = if last.is_empty() {
            len - 1
        } else {
            parse_position(last)?.min(len - 1)
        };
        (start, end)
    };

    (start <= end).then_some(ByteRange { start, end })
}

fn parse_position(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}
