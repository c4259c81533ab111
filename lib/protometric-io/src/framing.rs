//! Length-delimited framing.
//!
//! Each frame is a 4-byte little-endian length delimiter followed by exactly that many bytes of payload. The payload is
//! opaque to this module.
use bytes::{Buf as _, BufMut};

use crate::CodecError;

/// Length of the length delimiter, in bytes.
pub const LENGTH_DELIMITER_LEN: usize = 4;

/// Wraps the given message in a frame.
///
/// # Errors
///
/// If the message is longer than `u32::MAX` bytes, an error is returned.
pub fn write_frame(message: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::with_capacity(LENGTH_DELIMITER_LEN + message.len());
    write_frame_into(message, &mut buf)?;
    Ok(buf)
}

/// Wraps the given message in a frame, writing the frame to `buf`.
///
/// Nothing is written to `buf` if an error is returned.
///
/// # Errors
///
/// If the message is longer than `u32::MAX` bytes, an error is returned.
pub fn write_frame_into<B>(message: &[u8], buf: &mut B) -> Result<(), CodecError>
where
    B: BufMut,
{
    let frame_len = u32::try_from(message.len()).map_err(|_| CodecError::FrameTooLarge { len: message.len() })?;

    buf.put_u32_le(frame_len);
    buf.put_slice(message);
    Ok(())
}

/// Reads a single frame starting at `offset`.
///
/// Returns the frame payload, without the length delimiter, and the offset immediately following the frame, which is
/// where the next frame (if any) begins.
///
/// # Errors
///
/// If there are not enough bytes remaining at `offset` to read the length delimiter, or if the length delimiter
/// indicates more bytes than remain in the buffer, an error is returned.
pub fn read_frame(buf: &[u8], offset: usize) -> Result<(&[u8], usize), CodecError> {
    let remaining = buf.len().saturating_sub(offset);
    if remaining < LENGTH_DELIMITER_LEN {
        return Err(CodecError::TruncatedStream {
            offset,
            needed: LENGTH_DELIMITER_LEN,
            remaining,
        });
    }

    let mut delimiter = &buf[offset..offset + LENGTH_DELIMITER_LEN];
    let frame_len = delimiter.get_u32_le() as usize;

    let payload_start = offset + LENGTH_DELIMITER_LEN;
    let remaining = remaining - LENGTH_DELIMITER_LEN;
    if remaining < frame_len {
        return Err(CodecError::TruncatedStream {
            offset,
            needed: frame_len,
            remaining,
        });
    }

    let payload_end = payload_start + frame_len;
    Ok((&buf[payload_start..payload_end], payload_end))
}
