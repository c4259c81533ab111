//! Encoding and decoding of individual metrics.

pub mod field;

mod metric;
pub use self::metric::{decode, encode, encoded_len};
