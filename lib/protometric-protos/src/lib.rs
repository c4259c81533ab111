//! Protocol Buffers definitions for the protometric wire format.
//!
//! These types mirror `proto/metric.proto` one-to-one. They are written out with the `prost` derive macros directly,
//! rather than generated at build time, so that building the workspace does not require `protoc`. Any change here must
//! be reflected in the `.proto` file, and vice versa.
#![deny(warnings)]
#![allow(clippy::enum_variant_names)]

/// Metrics-related definitions.
pub mod metrics {
    use std::collections::HashMap;

    /// A single typed field value.
    ///
    /// Exactly one variant of `value` is expected to be set. A value encoded by a newer producer with a variant this
    /// version does not know about decodes with `value` left empty.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct FieldValue {
        #[prost(oneof = "field_value::Value", tags = "1, 2, 3, 4")]
        pub value: Option<field_value::Value>,
    }

    /// Nested types for [`FieldValue`].
    pub mod field_value {
        /// The tagged payload of a field value.
        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum Value {
            #[prost(string, tag = "1")]
            StringValue(String),
            #[prost(int64, tag = "2")]
            IntValue(i64),
            #[prost(double, tag = "3")]
            FloatValue(f64),
            #[prost(bool, tag = "4")]
            BoolValue(bool),
        }
    }

    /// A single time-series data point.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Metric {
        #[prost(string, tag = "1")]
        pub name: String,

        /// Nanoseconds since the Unix epoch.
        #[prost(sfixed64, tag = "2")]
        pub timestamp: i64,

        #[prost(map = "string, string", tag = "3")]
        pub tags: HashMap<String, String>,

        #[prost(map = "string, message", tag = "4")]
        pub fields: HashMap<String, FieldValue>,
    }
}
