//! Streams of framed metrics.
use std::iter::FusedIterator;

use protometric_event::metric::Metric;
use tracing::{debug, trace};

use crate::{
    codec::{decode, encode},
    framing::{read_frame, write_frame, write_frame_into, LENGTH_DELIMITER_LEN},
    CodecError,
};

/// Encodes a metric as a single frame.
///
/// The output can be concatenated with other framed metrics to build a stream.
///
/// # Errors
///
/// If the metric cannot be encoded, or the encoded metric is too large to frame, an error is returned.
pub fn encode_framed(metric: &Metric) -> Result<Vec<u8>, CodecError> {
    let message = encode(metric)?;
    write_frame(&message)
}

/// Encodes a batch of metrics as a stream of frames.
///
/// Frames are written in the same order as the input metrics.
///
/// # Errors
///
/// If any metric cannot be encoded, or any encoded metric is too large to frame, an error is returned. No partial
/// output is returned.
pub fn encode_batch(metrics: &[Metric]) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    for metric in metrics {
        let message = encode(metric)?;
        buf.reserve(LENGTH_DELIMITER_LEN + message.len());
        write_frame_into(&message, &mut buf)?;
    }

    trace!(metrics_len = metrics.len(), buf_len = buf.len(), "Encoded metric batch.");

    Ok(buf)
}

/// Decodes a buffer holding exactly one framed metric.
///
/// # Errors
///
/// If the frame is truncated, the frame payload cannot be decoded, or there are bytes left over after the frame, an
/// error is returned.
pub fn decode_framed(buf: &[u8]) -> Result<Metric, CodecError> {
    let (message, next_offset) = read_frame(buf, 0)?;
    if next_offset != buf.len() {
        return Err(CodecError::MalformedMessage {
            reason: format!("{} unexpected bytes after frame", buf.len() - next_offset),
        });
    }

    decode(message)
}

/// Decodes a stream of framed metrics.
///
/// Metrics are returned in the order they appear in the stream. An empty buffer is a valid, empty stream.
///
/// # Errors
///
/// If any frame is truncated, or any frame payload cannot be decoded, an error is returned. No partial result is
/// returned: callers that want to keep the metrics decoded before the failure should use [`MetricStream`] directly.
pub fn decode_stream(buf: &[u8]) -> Result<Vec<Metric>, CodecError> {
    MetricStream::new(buf).collect()
}

/// A lazy decoder over a stream of framed metrics.
///
/// Yields one decoded metric per frame, in order. Once an error is yielded, the stream is finished and yields nothing
/// further: metrics already yielded remain valid, but nothing after the bad frame can be trusted, since the position of
/// the next frame is unknown.
///
/// The stream is single-pass: it cannot be restarted, only recreated from the original buffer.
pub struct MetricStream<'a> {
    buf: &'a [u8],
    offset: usize,
    finished: bool,
}

impl<'a> MetricStream<'a> {
    /// Creates a new `MetricStream` over the given buffer.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            offset: 0,
            finished: false,
        }
    }

    /// Returns the offset of the next frame to be decoded.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn next_metric(&mut self) -> Result<Metric, CodecError> {
        let (message, next_offset) = read_frame(self.buf, self.offset)?;
        let metric = decode(message)?;

        trace!(offset = self.offset, next_offset, "Decoded metric from frame.");

        self.offset = next_offset;
        Ok(metric)
    }
}

impl Iterator for MetricStream<'_> {
    type Item = Result<Metric, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.offset == self.buf.len() {
            return None;
        }

        let result = self.next_metric();
        if let Err(e) = &result {
            debug!(offset = self.offset, buf_len = self.buf.len(), error = %e, "Failed to decode metric stream.");
            self.finished = true;
        }

        Some(result)
    }
}

impl FusedIterator for MetricStream<'_> {}
