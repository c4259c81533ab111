use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{bail, Context as _};
use protometric_event::metric::{FieldValue, Metric};
use protometric_io::serializer::ProtobufSerializer;
use tracing::trace;

/// Opens the given path for reading, or standard input if no path is given.
pub fn open_input(path: Option<&Path>) -> anyhow::Result<Box<dyn BufRead>> {
    match path {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("failed to open input file '{}'", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(std::io::stdin().lock())),
    }
}

/// Opens the given path for writing, or standard output if no path is given.
pub fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("failed to create output file '{}'", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(std::io::stdout().lock())),
    }
}

/// Reads newline-delimited JSON metrics from `input` and writes them to `output` in the binary format.
///
/// With framing enabled, all metrics are written as a single stream. With framing disabled, exactly one metric must be
/// given, since unframed metrics cannot be split apart again.
///
/// Returns the number of metrics encoded.
pub fn encode<R, W>(serializer: &ProtobufSerializer, input: R, mut output: W) -> anyhow::Result<usize>
where
    R: BufRead,
    W: Write,
{
    let metrics = read_metrics(input)?;

    let buf = if serializer.prepend_length() {
        serializer.serialize_batch(&metrics)?
    } else {
        match metrics.as_slice() {
            [metric] => serializer.serialize(metric)?,
            _ => bail!(
                "exactly one metric is required when prepend_length is disabled, got {}",
                metrics.len()
            ),
        }
    };

    output.write_all(&buf)?;
    output.flush()?;

    Ok(metrics.len())
}

/// Reads metrics in the binary format from `input` and writes them to `output` as newline-delimited JSON.
///
/// JSON has no representation for NaN or infinite numbers, so a metric with a non-finite float field fails the whole
/// decode, and nothing is written.
///
/// Returns the number of metrics decoded.
pub fn decode<R, W>(serializer: &ProtobufSerializer, mut input: R, mut output: W) -> anyhow::Result<usize>
where
    R: Read,
    W: Write,
{
    let mut buf = Vec::new();
    input.read_to_end(&mut buf).context("failed to read input")?;
    trace!(buf_len = buf.len(), "Read encoded input.");

    let metrics = if serializer.prepend_length() {
        serializer.deserialize_batch(&buf)?
    } else {
        vec![serializer.deserialize(&buf)?]
    };

    for metric in &metrics {
        ensure_json_representable(metric)?;
    }

    for metric in &metrics {
        serde_json::to_writer(&mut output, metric)?;
        output.write_all(b"\n")?;
    }
    output.flush()?;

    Ok(metrics.len())
}

fn ensure_json_representable(metric: &Metric) -> anyhow::Result<()> {
    let non_finite = metric
        .fields()
        .iter()
        .find(|(_, value)| matches!(value, FieldValue::Float(v) if !v.is_finite()));

    match non_finite {
        Some((key, value)) => bail!(
            "field '{}' of metric '{}' holds {}, which cannot be written as JSON",
            key,
            metric.name(),
            value
        ),
        None => Ok(()),
    }
}

fn read_metrics<R: BufRead>(input: R) -> anyhow::Result<Vec<Metric>> {
    let mut metrics = Vec::new();
    for (i, line) in input.lines().enumerate() {
        let line = line.context("failed to read input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let metric = serde_json::from_str(line).with_context(|| format!("invalid metric on line {}", i + 1))?;
        metrics.push(metric);
    }

    Ok(metrics)
}
