//! Mapping between field values and their tagged wire representation.
use protometric_event::metric::FieldValue;
use protometric_protos::metrics::{field_value::Value, FieldValue as WireFieldValue};

use crate::CodecError;

/// Converts a field value to its wire representation.
///
/// # Errors
///
/// If the value has no wire representation (unsigned integers), an error is returned.
pub fn to_wire(key: &str, value: &FieldValue) -> Result<WireFieldValue, CodecError> {
    let value = match value {
        FieldValue::String(s) => Value::StringValue(s.clone()),
        FieldValue::Int(v) => Value::IntValue(*v),
        FieldValue::Float(v) => Value::FloatValue(*v),
        FieldValue::Bool(v) => Value::BoolValue(*v),
        FieldValue::UInt(_) => {
            return Err(CodecError::UnsupportedFieldType {
                key: key.to_string(),
                type_name: value.type_name(),
            })
        }
    };

    Ok(WireFieldValue { value: Some(value) })
}

/// Converts a wire field value back to a field value.
///
/// # Errors
///
/// If the wire value does not carry any known value type, an error is returned.
pub fn from_wire(key: &str, value: WireFieldValue) -> Result<FieldValue, CodecError> {
    match value.value {
        Some(Value::StringValue(s)) => Ok(FieldValue::String(s)),
        Some(Value::IntValue(v)) => Ok(FieldValue::Int(v)),
        Some(Value::FloatValue(v)) => Ok(FieldValue::Float(v)),
        Some(Value::BoolValue(v)) => Ok(FieldValue::Bool(v)),
        // Unknown oneof variants are skipped by the decoder, which leaves us with nothing set.
        None => Err(CodecError::UnsupportedFieldType {
            key: key.to_string(),
            type_name: "unknown",
        }),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use protometric_event::metric::FieldValue;
    use protometric_protos::metrics::FieldValue as WireFieldValue;

    use super::{from_wire, to_wire};
    use crate::CodecError;

    fn arb_supported_value() -> impl Strategy<Value = FieldValue> {
        prop_oneof![
            any::<String>().prop_map(FieldValue::String),
            any::<i64>().prop_map(FieldValue::Int),
            any::<f64>()
                .prop_filter("NaN never compares equal", |v| !v.is_nan())
                .prop_map(FieldValue::Float),
            any::<bool>().prop_map(FieldValue::Bool),
        ]
    }

    #[test]
    fn unsigned_rejected() {
        let result = to_wire("bytes_sent", &FieldValue::UInt(42));
        assert_eq!(
            result,
            Err(CodecError::UnsupportedFieldType {
                key: "bytes_sent".to_string(),
                type_name: "uint",
            })
        );
    }

    #[test]
    fn empty_wire_value_rejected() {
        let result = from_wire("mystery", WireFieldValue { value: None });
        assert_eq!(
            result,
            Err(CodecError::UnsupportedFieldType {
                key: "mystery".to_string(),
                type_name: "unknown",
            })
        );
    }

    #[test]
    fn nan_preserved_bitwise() {
        let nan = f64::from_bits(0x7ff8_0000_dead_beef);
        let wire = to_wire("f", &FieldValue::Float(nan)).unwrap();
        match from_wire("f", wire).unwrap() {
            FieldValue::Float(v) => assert_eq!(v.to_bits(), nan.to_bits()),
            other => panic!("unexpected value: {:?}", other),
        }
    }

    #[test]
    fn extremes() {
        for value in [
            FieldValue::Int(i64::MIN),
            FieldValue::Int(i64::MAX),
            FieldValue::Float(f64::MIN_POSITIVE),
            FieldValue::Float(f64::INFINITY),
            FieldValue::Float(-0.0),
            FieldValue::String(String::new()),
            FieldValue::String("héllo, wörld 🦀".to_string()),
        ] {
            let wire = to_wire("f", &value).unwrap();
            assert_eq!(from_wire("f", wire).unwrap(), value);
        }
    }

    proptest! {
        #[test]
        fn property_test_round_trip(value in arb_supported_value()) {
            let wire = to_wire("f", &value).unwrap();
            prop_assert_eq!(from_wire("f", wire).unwrap(), value);
        }
    }
}
