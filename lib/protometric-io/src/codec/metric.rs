use std::collections::HashMap;

use prost::Message as _;
use protometric_event::metric::{FieldMap, Metric, TagMap};
use protometric_protos::metrics::Metric as WireMetric;

use super::field::{from_wire, to_wire};
use crate::CodecError;

fn to_wire_metric(metric: &Metric) -> Result<WireMetric, CodecError> {
    let mut fields = HashMap::with_capacity(metric.fields().len());
    for (key, value) in metric.fields() {
        fields.insert(key.clone(), to_wire(key, value)?);
    }

    let tags = metric
        .tags()
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(WireMetric {
        name: metric.name().to_string(),
        timestamp: metric.timestamp_nanos(),
        tags,
        fields,
    })
}

/// Encodes a metric as a single message.
///
/// # Errors
///
/// If any field of the metric holds a value with no wire representation, an error is returned.
pub fn encode(metric: &Metric) -> Result<Vec<u8>, CodecError> {
    to_wire_metric(metric).map(|wire| wire.encode_to_vec())
}

/// Returns the length, in bytes, of the message that `encode` would produce for the given metric.
///
/// # Errors
///
/// If any field of the metric holds a value with no wire representation, an error is returned.
pub fn encoded_len(metric: &Metric) -> Result<usize, CodecError> {
    to_wire_metric(metric).map(|wire| wire.encoded_len())
}

/// Decodes a single message into a metric.
///
/// The entire buffer is treated as one message.
///
/// # Errors
///
/// If the buffer is not a valid message, or describes an invalid metric, or any field carries an unknown value type,
/// an error is returned.
pub fn decode(buf: &[u8]) -> Result<Metric, CodecError> {
    let wire = WireMetric::decode(buf).map_err(|e| CodecError::MalformedMessage { reason: e.to_string() })?;

    let mut fields = FieldMap::with_capacity_and_hasher(wire.fields.len(), Default::default());
    for (key, value) in wire.fields {
        let value = from_wire(&key, value)?;
        fields.insert(key, value);
    }

    let tags = wire.tags.into_iter().collect::<TagMap>();

    Metric::from_parts(wire.name, tags, fields, wire.timestamp)
        .map_err(|e| CodecError::MalformedMessage { reason: e.to_string() })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use prost::Message as _;
    use proptest::{collection::hash_map as arb_hash_map, prelude::*};
    use protometric_event::metric::{FieldValue, Metric};

    use super::{decode, encode, encoded_len};
    use crate::CodecError;

    /// A field value as a newer producer might encode it, with a value type this version does not know about.
    #[derive(Clone, PartialEq, ::prost::Message)]
    struct FutureFieldValue {
        #[prost(uint64, tag = "5")]
        uint_value: u64,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    struct FutureMetric {
        #[prost(string, tag = "1")]
        name: String,
        #[prost(sfixed64, tag = "2")]
        timestamp: i64,
        #[prost(map = "string, message", tag = "4")]
        fields: HashMap<String, FutureFieldValue>,
    }

    fn test_metric(value: impl Into<FieldValue>) -> Metric {
        Metric::from_timestamp_nanos("test1", 1_257_894_000_000_000_000)
            .unwrap()
            .with_tag("tag1", "value1")
            .with_field("value", value)
    }

    fn arb_field_value() -> impl Strategy<Value = FieldValue> {
        prop_oneof![
            ".*".prop_map(FieldValue::String),
            any::<i64>().prop_map(FieldValue::Int),
            any::<f64>()
                .prop_filter("NaN never compares equal", |v| !v.is_nan())
                .prop_map(FieldValue::Float),
            any::<bool>().prop_map(FieldValue::Bool),
        ]
    }

    fn arb_metric() -> impl Strategy<Value = Metric> {
        (
            ".+",
            any::<i64>(),
            arb_hash_map(".*", ".*", 0..8),
            arb_hash_map(".*", arb_field_value(), 0..8),
        )
            .prop_map(|(name, timestamp, tags, fields)| {
                let metric = Metric::from_timestamp_nanos(name, timestamp).unwrap();
                let metric = tags
                    .into_iter()
                    .fold(metric, |metric, (key, value)| metric.with_tag(key, value));
                fields
                    .into_iter()
                    .fold(metric, |metric, (key, value)| metric.with_field(key, value))
            })
    }

    #[test]
    fn float() {
        let metric = test_metric(91.5);
        assert_eq!(decode(&encode(&metric).unwrap()).unwrap(), metric);
    }

    #[test]
    fn int() {
        let metric = test_metric(90i64);
        assert_eq!(decode(&encode(&metric).unwrap()).unwrap(), metric);
    }

    #[test]
    fn string() {
        let metric = test_metric("foobar");
        assert_eq!(decode(&encode(&metric).unwrap()).unwrap(), metric);
    }

    #[test]
    fn multiple_fields() {
        let metric = Metric::from_timestamp_nanos("foobar", 0)
            .unwrap()
            .with_field("int_field", 90i64)
            .with_field("float_field", 8559615.0)
            .with_field("string_field", "string_value")
            .with_field("bool_field", true);

        let decoded = decode(&encode(&metric).unwrap()).unwrap();
        assert_eq!(decoded.name(), "foobar");
        assert!(decoded.tags().is_empty());
        assert_eq!(decoded.fields().len(), 4);
        assert_eq!(decoded.field("int_field"), Some(&FieldValue::Int(90)));
        assert_eq!(decoded.field("float_field"), Some(&FieldValue::Float(8559615.0)));
        assert_eq!(
            decoded.field("string_field"),
            Some(&FieldValue::String("string_value".to_string()))
        );
        assert_eq!(decoded.field("bool_field"), Some(&FieldValue::Bool(true)));
        assert_eq!(decoded, metric);
    }

    #[test]
    fn escape_sensitive_keys() {
        let metric = test_metric("foobar").with_field("U,age=Idle", 90i64);
        assert_eq!(decode(&encode(&metric).unwrap()).unwrap(), metric);
    }

    #[test]
    fn encoded_len_matches() {
        let metric = test_metric("foobar").with_field("count", 3i64);
        assert_eq!(encoded_len(&metric).unwrap(), encode(&metric).unwrap().len());
    }

    #[test]
    fn unsupported_field_type() {
        let metric = test_metric(1u64);
        assert!(matches!(
            encode(&metric),
            Err(CodecError::UnsupportedFieldType { type_name: "uint", .. })
        ));
        assert!(encoded_len(&metric).is_err());
    }

    #[test]
    fn unknown_wire_tag() {
        let future = FutureMetric {
            name: "cpu".to_string(),
            timestamp: 0,
            fields: [("usage".to_string(), FutureFieldValue { uint_value: 7 })]
                .into_iter()
                .collect(),
        };

        let result = decode(&future.encode_to_vec());
        assert_eq!(
            result,
            Err(CodecError::UnsupportedFieldType {
                key: "usage".to_string(),
                type_name: "unknown",
            })
        );
    }

    #[test]
    fn missing_name() {
        let metric = test_metric(1i64);
        let mut buf = encode(&metric).unwrap();

        // Field 1 (name) is written first: tag byte, length byte, then the name itself.
        assert_eq!(buf[0], 0x0a);
        let name_len = buf[1] as usize;
        buf.drain(0..2 + name_len);

        assert!(matches!(decode(&buf), Err(CodecError::MalformedMessage { .. })));
    }

    #[test]
    fn empty_buffer() {
        assert!(matches!(decode(&[]), Err(CodecError::MalformedMessage { .. })));
    }

    #[test]
    fn garbage() {
        // Field 1 with wire type 7, which does not exist.
        assert!(matches!(
            decode(&[0x0f, 0x00, 0x01]),
            Err(CodecError::MalformedMessage { .. })
        ));
    }

    #[test]
    fn truncated_message() {
        let buf = encode(&test_metric("foobar")).unwrap();
        assert!(matches!(
            decode(&buf[..buf.len() - 1]),
            Err(CodecError::MalformedMessage { .. })
        ));
    }

    #[test]
    fn invalid_utf8_name() {
        // Field 1 (name), length-delimited, length 2, followed by an invalid UTF-8 sequence.
        assert!(matches!(
            decode(&[0x0a, 0x02, 0xc3, 0x28]),
            Err(CodecError::MalformedMessage { .. })
        ));
    }

    proptest! {
        #[test]
        fn property_test_round_trip(metric in arb_metric()) {
            let buf = encode(&metric).unwrap();
            prop_assert_eq!(decode(&buf).unwrap(), metric);
        }
    }
}
