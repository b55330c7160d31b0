//! Byte-array helpers, grounded on `original_source/FileSys.c`'s
//! `ForceArrayToAscii`/`BinaryArrayToHexString`/`BinaryToHexAscii`: these
//! exist because raw device/EEPROM bytes land in log lines and CSV
//! records, which need printable text, not binary.

/// Replaces every byte outside the printable ASCII range (`' '..='~'`)
/// with `0`. Returns `None` if the first byte is non-printable, the same
/// "obviously garbage" signal `ForceArrayToAscii` gives its caller by
/// returning `false`.
pub fn force_to_ascii(source: &[u8]) -> Option<Vec<u8>> {
    if source.is_empty() {
        return None;
    }
    let mut out: Vec<u8> = source
        .iter()
        .map(|&b| if (b' '..=b'~').contains(&b) { b } else { 0 })
        .collect();
    if out[0] == 0 {
        return None;
    }
    out.push(0);
    Some(out)
}

fn nibble_to_hex_ascii(nibble: u8) -> char {
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        _ => (b'A' + nibble - 10) as char,
    }
}

/// Renders a byte as two uppercase hex-ASCII characters.
pub fn binary_to_hex_ascii(value: u8) -> [char; 2] {
    [nibble_to_hex_ascii(value >> 4), nibble_to_hex_ascii(value & 0xF)]
}

/// Converts `data` to a hex string, optionally reading it least-significant
/// byte first and/or emitting the digits in reverse order, as
/// `BinaryArrayToHexString` does for BCD fields that are stored
/// little-endian but displayed big-endian (or vice versa). Truncates to
/// fit `max_str_len` (including the implicit null terminator budget, so
/// the returned string's length never exceeds `max_str_len - 1`).
pub fn binary_array_to_hex_string(
    data: &[u8],
    max_str_len: usize,
    get_least_significant: bool,
    reverse_order: bool,
) -> String {
    const MIN_STRING_OUT_SIZE: usize = 3;
    if data.is_empty() || max_str_len < MIN_STRING_OUT_SIZE {
        return String::new();
    }

    let fits = max_str_len >= (data.len() * 2 + 1);
    let (count, offset) = if fits {
        (data.len(), 0)
    } else {
        let count = (max_str_len - 1) / 2;
        let offset = if get_least_significant {
            data.len() - count
        } else {
            0
        };
        (count, offset)
    };

    let mut out = String::with_capacity(count * 2);
    for i in 0..count {
        let index = if reverse_order {
            offset + (count - i - 1)
        } else {
            offset + i
        };
        let [hi, lo] = binary_to_hex_ascii(data[index]);
        out.push(hi);
        out.push(lo);
    }
    out
}
