//! Request-target decoding.

/// Decodes `%XX` escapes and `+` in place and returns the decoded length.
///
/// The output is never longer than the input, so decoding happens inside the
/// same buffer the request line was read into.
///
/// A `%` is treated as an escape only when at least two bytes follow it;
/// otherwise it is copied through. The two bytes after `%` are always
/// consumed, hex or not: the value is taken from the leading hex digits, so
/// `%4G` decodes to `0x04` and `%G4` to `0x00`.
pub fn decode_in_place(buf: &mut [u8]) -> usize {
    let len = buf.len();
    let mut read = 0;
    let mut written = 0;
    while read < len {
        let byte = buf[read];
        read += 1;
        let decoded = if byte == b'%' && read + 1 < len {
            let value = escape_value(buf[read], buf[read + 1]);
            read += 2;
            value
        } else if byte == b'+' {
            b' '
        } else {
            byte
        };
        buf[written] = decoded;
        written += 1;
    }
    written
}

fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

fn escape_value(high: u8, low: u8) -> u8 {
    match (hex_digit(high), hex_digit(low)) {
        (Some(high), Some(low)) => (high << 4) | low,
        (Some(high), None) => high,
        (None, _) => 0,
    }
}
