//! Protocol Buffers serializer.
//!
//! This is the entry point for hosts that serialize metrics on behalf of an agent: a single configurable type that
//! decides whether output is framed, and enforces that batches are always framed.
use protometric_config::{ConfigurationError, GenericConfiguration};
use protometric_event::metric::Metric;
use serde::Deserialize;
use tracing::debug;

use crate::{
    codec::{decode, encode},
    stream::{decode_framed, decode_stream, encode_batch, encode_framed},
    CodecError,
};

const fn default_prepend_length() -> bool {
    true
}

/// Serializer configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct SerializerConfiguration {
    /// Whether or not to prepend a length delimiter to each serialized metric.
    ///
    /// Framing is required to serialize or deserialize more than one metric at a time, since encoded metrics are
    /// variable-length and cannot be split apart otherwise. Disabling it is only useful when exactly one metric is
    /// written per payload and the receiver does not expect framing.
    ///
    /// Defaults to `true`.
    #[serde(default = "default_prepend_length")]
    pub prepend_length: bool,
}

impl SerializerConfiguration {
    /// Creates a new `SerializerConfiguration` from the given configuration.
    ///
    /// # Errors
    ///
    /// If the configuration cannot be deserialized as `SerializerConfiguration`, an error is returned.
    pub fn from_configuration(config: &GenericConfiguration) -> Result<Self, ConfigurationError> {
        config.as_typed()
    }
}

impl Default for SerializerConfiguration {
    fn default() -> Self {
        Self {
            prepend_length: default_prepend_length(),
        }
    }
}

/// Serializes metrics as Protocol Buffers messages.
#[derive(Clone, Debug)]
pub struct ProtobufSerializer {
    prepend_length: bool,
}

impl ProtobufSerializer {
    /// Creates a new `ProtobufSerializer`.
    pub fn new(prepend_length: bool) -> Self {
        Self { prepend_length }
    }

    /// Creates a new `ProtobufSerializer` from the given configuration.
    pub fn from_configuration(config: &SerializerConfiguration) -> Self {
        debug!(prepend_length = config.prepend_length, "Creating Protocol Buffers serializer.");
        Self::new(config.prepend_length)
    }

    /// Returns `true` if serialized metrics are framed.
    pub fn prepend_length(&self) -> bool {
        self.prepend_length
    }

    /// Serializes a single metric.
    ///
    /// # Errors
    ///
    /// If the metric cannot be encoded, an error is returned.
    pub fn serialize(&self, metric: &Metric) -> Result<Vec<u8>, CodecError> {
        if self.prepend_length {
            encode_framed(metric)
        } else {
            encode(metric)
        }
    }

    /// Serializes a batch of metrics as a stream of frames.
    ///
    /// # Errors
    ///
    /// If framing is disabled, or any metric cannot be encoded, an error is returned.
    pub fn serialize_batch(&self, metrics: &[Metric]) -> Result<Vec<u8>, CodecError> {
        self.ensure_framing()?;
        encode_batch(metrics)
    }

    /// Deserializes a single metric, as produced by [`serialize`][Self::serialize].
    ///
    /// # Errors
    ///
    /// If the buffer does not hold exactly one valid metric, an error is returned.
    pub fn deserialize(&self, buf: &[u8]) -> Result<Metric, CodecError> {
        if self.prepend_length {
            decode_framed(buf)
        } else {
            decode(buf)
        }
    }

    /// Deserializes a stream of metrics, as produced by [`serialize_batch`][Self::serialize_batch].
    ///
    /// # Errors
    ///
    /// If framing is disabled, or the stream is truncated or holds an invalid metric, an error is returned.
    pub fn deserialize_batch(&self, buf: &[u8]) -> Result<Vec<Metric>, CodecError> {
        self.ensure_framing()?;
        decode_stream(buf)
    }

    fn ensure_framing(&self) -> Result<(), CodecError> {
        if self.prepend_length {
            Ok(())
        } else {
            Err(CodecError::ConfigError {
                reason: "prepend_length must be enabled to use batch serialization",
            })
        }
    }
}
