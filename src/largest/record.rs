use memchr::memchr;

/// Size assigned to a record whose size field is missing or not a valid
/// decimal `i64`. The record still takes part in ranking.
pub const UNPARSED_SIZE: i64 = 0;

/// Something that can be ranked by the top-K machinery. Larger keys win.
pub trait Ranked {
    type Key: Ord + Copy;

    fn rank(&self) -> Self::Key;
}

/// One input line reduced to `(identifier, size)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    link: String,
    size: i64,
}

impl Record {
    pub fn new(link: impl Into<String>, size: i64) -> Self {
        Record {
            link: link.into(),
            size,
        }
    }

    /// Build a record from raw identifier bytes. Invalid UTF-8 is replaced
    /// rather than rejected.
    pub fn from_bytes(link: &[u8], size: i64) -> Self {
        Record {
            link: String::from_utf8_lossy(link).into_owned(),
            size,
        }
    }

    /// Parse one line (without terminator) into a record.
    pub fn parse(line: &[u8]) -> Self {
        let fields = split_line(line);
        Record::from_bytes(fields.link, fields.size_or_default())
    }

    #[inline]
    pub fn link(&self) -> &str {
        &self.link
    }

    #[inline]
    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn into_link(self) -> String {
        self.link
    }
}

impl Ranked for Record {
    type Key = i64;

    #[inline]
    fn rank(&self) -> i64 {
        self.size
    }
}

/// Fields of one line, borrowed from the read buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineFields<'a> {
    pub link: &'a [u8],
    /// `None` if the size token is missing or unparsable.
    pub size: Option<i64>,
}

impl LineFields<'_> {
    #[inline]
    pub fn size_or_default(&self) -> i64 {
        self.size.unwrap_or(UNPARSED_SIZE)
    }
}

/// Split a line on single spaces: token 0 is the identifier, token 1 the size.
/// Tokens after the second are ignored.
#[inline]
pub fn split_line(line: &[u8]) -> LineFields<'_> {
    match memchr(b' ', line) {
        Some(sp) => {
            let rest = &line[sp + 1..];
            let token = match memchr(b' ', rest) {
                Some(end) => &rest[..end],
                None => rest,
            };
            LineFields {
                link: &line[..sp],
                size: parse_size_field(token),
            }
        }
        None => LineFields {
            link: line,
            size: None,
        },
    }
}

/// Parse a signed decimal `i64` with an optional leading `+` or `-`.
/// Returns `None` on empty input, any non-digit byte, or overflow.
pub fn parse_size_field(token: &[u8]) -> Option<i64> {
    let (negative, digits) = match token.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some((b'+', rest)) => (false, rest),
        _ => (false, token),
    };
    if digits.is_empty() {
        return None;
    }

    // Accumulate toward the sign so i64::MIN parses without overflow.
    let mut n: i64 = 0;
    for &b in digits {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.checked_mul(10)?;
        n = if negative {
            n.checked_sub(d as i64)?
        } else {
            n.checked_add(d as i64)?
        };
    }
    Some(n)
}

/// Strip a trailing `\n` and then a trailing `\r`.
#[inline]
pub fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
