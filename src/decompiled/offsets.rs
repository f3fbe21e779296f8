//! Packed base-64 delta offsets.
//!
//! Each decompiled line carries the address of the code it came from. The
//! dump stores those addresses as signed deltas from the previous line (the
//! first relative to the function entry), packed as text:
//!
//! - a delta with magnitude below 64 is a single digit,
//! - a larger magnitude is `[` + up to six big-endian digits + `]`, with
//!   leading zero digits suppressed,
//! - a trailing `-` negates the value just written.
//!
//! The digit alphabet is `A-Z a-z 0-9 + /`.

const DIGITS: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Six bits per digit, so six digits cover a 32-bit magnitude.
const MAX_DIGITS: u32 = 6;

fn digit_value(c: u8) -> Option<u32> {
    match c {
        b'A'..=b'Z' => Some(u32::from(c - b'A')),
        b'a'..=b'z' => Some(u32::from(c - b'a') + 26),
        b'0'..=b'9' => Some(u32::from(c - b'0') + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

/// Encode a sequence of deltas.
pub fn encode(offsets: &[i32]) -> String {
    let mut out = String::with_capacity(offsets.len() * 2);
    for &offset in offsets {
        let n = offset.unsigned_abs();
        if n < 64 {
            out.push(char::from(DIGITS[n as usize]));
        } else {
            out.push('[');
            let mut writing = false;
            for d in (0..MAX_DIGITS).rev() {
                let digit = (n >> (d * 6)) & 0x3f;
                if digit != 0 || writing {
                    writing = true;
                    out.push(char::from(DIGITS[digit as usize]));
                }
            }
            out.push(']');
        }

        if offset < 0 {
            out.push('-');
        }
    }
    out
}

/// Decode packed deltas.
///
/// Characters outside the alphabet are skipped, as is a `-` with nothing
/// before it to negate. An unterminated bracket contributes no value.
pub fn decode(packed: &str) -> Vec<i32> {
    let mut results: Vec<i32> = Vec::new();
    let mut current = 0i32;
    let mut multichar = false;

    for c in packed.bytes() {
        match c {
            b'-' => {
                if let Some(last) = results.last_mut() {
                    *last = last.wrapping_neg();
                }
            }
            b'[' => {
                multichar = true;
                current = 0;
            }
            b']' if multichar => {
                results.push(current);
                multichar = false;
            }
            _ => {
                let Some(digit) = digit_value(c) else {
                    continue;
                };
                if multichar {
                    current = current.wrapping_mul(64).wrapping_add(digit as i32);
                } else {
                    results.push(digit as i32);
                }
            }
        }
    }

    results
}

/// Accumulate deltas into absolute addresses starting from `base`.
pub fn to_absolute(base: u32, offsets: &[i32]) -> Vec<u32> {
    let mut last = base;
    offsets
        .iter()
        .map(|&offset| {
            last = last.wrapping_add_signed(offset);
            last
        })
        .collect()
}

/// Inverse of [`to_absolute`].
pub fn to_offsets(base: u32, addresses: &[u32]) -> Vec<i32> {
    let mut last = base;
    addresses
        .iter()
        .map(|&address| {
            let delta = address.wrapping_sub(last) as i32;
            last = address;
            delta
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_mixed_deltas() {
        let offsets = [5, -3, 0, 70, -70];
        let packed = encode(&offsets);
        assert_eq!(packed, "FD-A[BG][BG]-");
        assert_eq!(decode(&packed), offsets);
    }

    #[test]
    fn test_extreme_values() {
        let offsets = [i32::MAX, i32::MIN, -1, 63, 64, -64];
        assert_eq!(decode(&encode(&offsets)), offsets);
        assert_eq!(encode(&[64]), "[BA]");
        assert_eq!(encode(&[63]), "/");
    }

    #[test]
    fn test_decode_is_lenient() {
        assert_eq!(decode("-B"), vec![1]);
        assert_eq!(decode("B C\t[B A]"), vec![1, 2, 64]);
        assert_eq!(decode("B[CD"), vec![1]);
        assert!(decode("").is_empty());
        assert!(decode("]!?").is_empty());
    }

    #[test]
    fn test_absolute_round_trip() {
        let offsets = [4, -2, 0, 0x100, -0x80];
        let absolute = to_absolute(0x401000, &offsets);
        assert_eq!(absolute, vec![0x401004, 0x401002, 0x401002, 0x401102, 0x401082]);
        assert_eq!(to_offsets(0x401000, &absolute), offsets);
        assert!(to_absolute(0x401000, &[]).is_empty());
    }

    #[test]
    fn test_absolute_wraps() {
        let absolute = to_absolute(2, &[-4, 8]);
        assert_eq!(absolute, vec![u32::MAX - 1, 6]);
        assert_eq!(to_offsets(2, &absolute), vec![-4, 8]);
    }
}
