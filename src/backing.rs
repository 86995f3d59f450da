//! Photo backing locators.
//!
//! A backing is either the photo bytes stored inline in the database row, or
//! a byte range inside one of the archive's packed data files:
//!
//! ```text
//! 0x00 <bytes...>
//! 0x01 <u16 LE name length> <name> <u64 LE offset> <u64 LE length>
//! ```

use crate::error::BackingError;

const TAG_INLINE: u8 = 0x00;
const TAG_PACKED: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backing<'a> {
    Inline(&'a [u8]),
    Packed { file: &'a str, offset: u64, length: u64 },
}

impl<'a> Backing<'a> {
    pub fn decode(buf: &'a [u8]) -> Result<Self, BackingError> {
        let (tag, rest) = buf.split_first().ok_or(BackingError::Empty)?;
        match *tag {
            TAG_INLINE => Ok(Backing::Inline(rest)),
            TAG_PACKED => {
                let (name_len, rest) = take::<2>(rest)?;
                let name_len = u16::from_le_bytes(name_len) as usize;
                if rest.len() < name_len {
                    return Err(BackingError::Truncated);
                }
                let (name, rest) = rest.split_at(name_len);
                let file = std::str::from_utf8(name)
                    .map_err(|_| BackingError::InvalidName(String::from_utf8_lossy(name).into()))?;
                if !is_plain_file_name(file) {
                    return Err(BackingError::InvalidName(file.to_string()));
                }
                let (offset, rest) = take::<8>(rest)?;
                let (length, _) = take::<8>(rest)?;
                Ok(Backing::Packed {
                    file,
                    offset: u64::from_le_bytes(offset),
                    length: u64::from_le_bytes(length),
                })
            }
            other => Err(BackingError::UnknownTag(other)),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Backing::Inline(data) => {
                let mut out = Vec::with_capacity(data.len() + 1);
                out.push(TAG_INLINE);
                out.extend_from_slice(data);
                out
            }
            Backing::Packed { file, offset, length } => {
                let mut out = Vec::with_capacity(1 + 2 + file.len() + 16);
                out.push(TAG_PACKED);
                out.extend_from_slice(&(file.len() as u16).to_le_bytes());
                out.extend_from_slice(file.as_bytes());
                out.extend_from_slice(&offset.to_le_bytes());
                out.extend_from_slice(&length.to_le_bytes());
                out
            }
        }
    }
}

fn take<const N: usize>(buf: &[u8]) -> Result<([u8; N], &[u8]), BackingError> {
    if buf.len() < N {
        return Err(BackingError::Truncated);
    }
    let (head, rest) = buf.split_at(N);
    let mut out = [0u8; N];
    out.copy_from_slice(head);
    Ok((out, rest))
}

/// Data files live directly under the archive's data directory.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
