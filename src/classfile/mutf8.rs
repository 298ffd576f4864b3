//! Modified UTF-8, the string encoding of `CONSTANT_Utf8` entries.
//!
//! It differs from standard UTF-8 in two ways: the NUL character is encoded
//! as the two-byte sequence `C0 80`, and characters outside the Basic
//! Multilingual Plane are encoded as a UTF-16 surrogate pair, each half
//! taking three bytes.

/// Encodes a string as modified UTF-8.
pub fn encode(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        let code = c as u32;
        match code {
            0 => out.extend_from_slice(&[0xC0, 0x80]),
            0x01..=0x7F => out.push(code as u8),
            0x80..=0x7FF => encode_unit(&mut out, code as u16),
            0x800..=0xFFFF => encode_unit(&mut out, code as u16),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    encode_unit(&mut out, *unit);
                }
            }
        }
    }
    out
}

fn encode_unit(out: &mut Vec<u8>, unit: u16) {
    if (0x01..=0x7F).contains(&unit) {
        out.push(unit as u8);
    } else if unit <= 0x7FF {
        out.push(0xC0 | (unit >> 6) as u8);
        out.push(0x80 | (unit & 0x3F) as u8);
    } else {
        out.push(0xE0 | (unit >> 12) as u8);
        out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
        out.push(0x80 | (unit & 0x3F) as u8);
    }
}

/// Decodes modified UTF-8 bytes.
///
/// Returns `None` if the bytes are not well-formed modified UTF-8 or if they
/// contain an unpaired surrogate.
pub fn decode(bytes: &[u8]) -> Option<String> {
    // Plain ASCII without NUL is identical in both encodings.
    if bytes.iter().all(|&b| (0x01..0x80).contains(&b)) {
        return std::str::from_utf8(bytes).ok().map(str::to_owned);
    }

    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i];
        if b0 & 0x80 == 0 {
            if b0 == 0 {
                return None;
            }
            units.push(b0 as u16);
            i += 1;
        } else if b0 & 0xE0 == 0xC0 {
            let b1 = continuation(bytes, i + 1)?;
            units.push(((b0 as u16 & 0x1F) << 6) | b1);
            i += 2;
        } else if b0 & 0xF0 == 0xE0 {
            let b1 = continuation(bytes, i + 1)?;
            let b2 = continuation(bytes, i + 2)?;
            units.push(((b0 as u16 & 0x0F) << 12) | (b1 << 6) | b2);
            i += 3;
        } else {
            return None;
        }
    }

    String::from_utf16(&units).ok()
}

fn continuation(bytes: &[u8], index: usize) -> Option<u16> {
    let b = *bytes.get(index)?;
    (b & 0xC0 == 0x80).then_some((b & 0x3F) as u16)
}
