//! Binary encoding of metrics.
//!
//! Metrics are encoded as Protocol Buffers messages (see `protometric-protos`). A single encoded metric can be written
//! on its own, or wrapped in a length-delimited frame so that many encoded metrics can be concatenated into a single
//! stream and split back apart later.
//!
//! # Wire format
//!
//! A frame is a 4-byte little-endian unsigned length `L`, followed by exactly `L` bytes of message. A stream is a flat
//! concatenation of frames: there is no header, footer, or metric count, and the end of the stream is simply the end of
//! the buffer.
#![deny(warnings)]
#![deny(missing_docs)]

use snafu::Snafu;

pub mod codec;
pub use self::codec::{decode, encode};

pub mod framing;

pub mod serializer;

pub mod stream;
pub use self::stream::{decode_framed, decode_stream, encode_batch, encode_framed, MetricStream};

/// Codec error.
#[derive(Debug, Snafu, Eq, PartialEq)]
#[snafu(context(suffix(false)))]
pub enum CodecError {
    /// A field value has no wire representation.
    ///
    /// When encoding, this occurs if a field holds a value of a type that the wire format cannot carry, such as an
    /// unsigned integer. When decoding, this occurs if a field value does not carry any of the known value types,
    /// which generally means it was encoded by a newer producer using a type this version does not understand.
    #[snafu(display("unsupported type '{}' for field '{}'", type_name, key))]
    UnsupportedFieldType {
        /// Key of the offending field.
        key: String,

        /// Name of the offending type.
        type_name: &'static str,
    },

    /// A message could not be parsed.
    ///
    /// This covers structural problems in the message itself (invalid wire types, truncated sub-messages, invalid
    /// UTF-8 in strings, and so on) as well as messages that parse but describe an invalid metric, such as one without
    /// a name.
    #[snafu(display("malformed message: {}", reason))]
    MalformedMessage {
        /// Description of what was wrong with the message.
        reason: String,
    },

    /// A frame extends past the end of the buffer.
    ///
    /// Either the length delimiter itself could not be read in full, or the length delimiter indicates more bytes than
    /// remain in the buffer. In both cases, `offset` is the position of the start of the offending frame.
    #[snafu(display(
        "truncated stream at offset {} (needed {} bytes, but only {} bytes remaining)",
        offset,
        needed,
        remaining
    ))]
    TruncatedStream {
        /// Offset of the start of the frame.
        offset: usize,

        /// Number of bytes needed to read the length delimiter or frame payload.
        needed: usize,

        /// Number of bytes actually remaining.
        remaining: usize,
    },

    /// The requested operation is not valid for the current configuration.
    #[snafu(display("invalid configuration: {}", reason))]
    ConfigError {
        /// Description of the misconfiguration.
        reason: &'static str,
    },

    /// A message is too large to be described by a length delimiter.
    #[snafu(display("frame too large ({} bytes, maximum is {} bytes)", len, u32::MAX))]
    FrameTooLarge {
        /// Length of the message, in bytes.
        len: usize,
    },
}
