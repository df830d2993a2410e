//! Variable-length integers ("CompactSize") used for counts and script lengths.
//!
//! | value            | encoding              |
//! |------------------|-----------------------|
//! | `< 0xfd`         | 1 byte                |
//! | `<= 0xffff`      | `0xfd` + u16 LE       |
//! | `<= 0xffff_ffff` | `0xfe` + u32 LE       |
//! | otherwise        | `0xff` + u64 LE       |

use crate::error::ChainError;

/// Append the varint encoding of `val` to `buf`.
pub fn write_varint(buf: &mut Vec<u8>, val: u64) {
    if val < 0xFD {
        buf.push(val as u8);
    } else if val <= 0xFFFF {
        buf.push(0xFD);
        buf.extend_from_slice(&(val as u16).to_le_bytes());
    } else if val <= 0xFFFF_FFFF {
        buf.push(0xFE);
        buf.extend_from_slice(&(val as u32).to_le_bytes());
    } else {
        buf.push(0xFF);
        buf.extend_from_slice(&val.to_le_bytes());
    }
}

/// Encoded length of `val` in bytes: 1, 3, 5 or 9.
pub fn varint_len(val: u64) -> usize {
    match val {
        0..=0xFC => 1,
        0xFD..=0xFFFF => 3,
        0x1_0000..=0xFFFF_FFFF => 5,
        _ => 9,
    }
}

/// Decode a varint starting at `offset`.
///
/// Returns the value and the number of bytes consumed.
pub fn read_varint(bytes: &[u8], offset: usize) -> Result<(u64, usize), ChainError> {
    let prefix = *bytes.get(offset).ok_or_else(|| {
        ChainError::MalformedTransactionHex(format!("varint missing at byte {offset}"))
    })?;

    let width = match prefix {
        0xFD => 2,
        0xFE => 4,
        0xFF => 8,
        small => return Ok((small as u64, 1)),
    };

    let body = bytes
        .get(offset + 1..offset + 1 + width)
        .ok_or_else(|| {
            ChainError::MalformedTransactionHex(format!(
                "varint at byte {offset} needs {width} more bytes"
            ))
        })?;

    let mut le = [0u8; 8];
    le[..width].copy_from_slice(body);
    Ok((u64::from_le_bytes(le), 1 + width))
}
