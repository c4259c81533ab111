//! Metric types.
use std::fmt;

use chrono::{DateTime, TimeZone as _, Utc};
use serde::{Deserialize, Serialize};
use snafu::Snafu;

mod value;
pub use self::value::FieldValue;

/// A hash map based on `hashbrown` using `foldhash` for fast, quality hashing.
pub type FastHashMap<K, V> = hashbrown::HashMap<K, V, foldhash::quality::RandomState>;

/// Tags of a metric, keyed by tag name.
pub type TagMap = FastHashMap<String, String>;

/// Fields of a metric, keyed by field name.
pub type FieldMap = FastHashMap<String, FieldValue>;

/// Metric construction error.
#[derive(Debug, Snafu, Eq, PartialEq)]
#[snafu(context(suffix(false)))]
pub enum MetricError {
    /// The metric name was empty.
    #[snafu(display("metric name must not be empty"))]
    EmptyName,

    /// The timestamp cannot be represented as nanoseconds since the Unix epoch in a signed 64-bit integer.
    #[snafu(display("timestamp {} is outside the representable range", timestamp))]
    TimestampOutOfRange {
        /// The offending timestamp, in RFC 3339 form.
        timestamp: String,
    },
}

/// A metric.
///
/// Metrics represent the measurement of one or more quantities at a particular point in time. A metric is made up of
/// a name, a timestamp, a set of tags describing where the measurement came from, and a set of named fields holding
/// the measured values.
///
/// ## Equality
///
/// Two metrics are equal when their names and timestamps are equal, and their tags and fields contain the same entries.
/// The order in which tags or fields were added plays no part in equality.
///
/// ## Validation
///
/// The name of a metric must not be empty, and the timestamp must fit within a signed 64-bit count of nanoseconds since
/// the Unix epoch (roughly the years 1677 through 2262). Both are checked at construction time, so any `Metric` value
/// that exists is valid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMetric")]
pub struct Metric {
    name: String,
    timestamp: i64,
    tags: TagMap,
    fields: FieldMap,
}

impl Metric {
    /// Creates a new `Metric` with the given name and timestamp, and no tags or fields.
    ///
    /// # Errors
    ///
    /// If the name is empty, or the timestamp is outside the representable range, an error is returned.
    pub fn new<N>(name: N, timestamp: DateTime<Utc>) -> Result<Self, MetricError>
    where
        N: Into<String>,
    {
        let timestamp_nanos = timestamp.timestamp_nanos_opt().ok_or_else(|| MetricError::TimestampOutOfRange {
            timestamp: timestamp.to_rfc3339(),
        })?;

        Self::from_timestamp_nanos(name, timestamp_nanos)
    }

    /// Creates a new `Metric` with the given name and timestamp, in nanoseconds since the Unix epoch.
    ///
    /// # Errors
    ///
    /// If the name is empty, an error is returned.
    pub fn from_timestamp_nanos<N>(name: N, timestamp: i64) -> Result<Self, MetricError>
    where
        N: Into<String>,
    {
        Self::from_parts(name, TagMap::default(), FieldMap::default(), timestamp)
    }

    /// Creates a `Metric` from the given parts.
    ///
    /// # Errors
    ///
    /// If the name is empty, an error is returned.
    pub fn from_parts<N>(name: N, tags: TagMap, fields: FieldMap, timestamp: i64) -> Result<Self, MetricError>
    where
        N: Into<String>,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(MetricError::EmptyName);
        }

        Ok(Self {
            name,
            timestamp,
            tags,
            fields,
        })
    }

    /// Adds a tag, replacing any existing tag with the same key.
    pub fn with_tag<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Adds a field, replacing any existing field with the same key.
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Gets the name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the timestamp.
    pub fn timestamp(&self) -> DateTime<Utc> {
        Utc.timestamp_nanos(self.timestamp)
    }

    /// Gets the timestamp, in nanoseconds since the Unix epoch.
    pub fn timestamp_nanos(&self) -> i64 {
        self.timestamp
    }

    /// Gets a reference to the tags.
    pub fn tags(&self) -> &TagMap {
        &self.tags
    }

    /// Gets the value of the tag with the given key, if it exists.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Gets a reference to the fields.
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Gets the value of the field with the given key, if it exists.
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Consumes the metric and returns the individual parts.
    pub fn into_parts(self) -> (String, TagMap, FieldMap, i64) {
        (self.name, self.tags, self.fields, self.timestamp)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags = self.tags.iter().collect::<Vec<_>>();
        tags.sort_unstable_by_key(|(key, _)| key.as_str());

        let mut fields = self.fields.iter().collect::<Vec<_>>();
        fields.sort_unstable_by_key(|(key, _)| key.as_str());

        write!(f, "{}", self.name)?;
        for (key, value) in tags {
            write!(f, ",{}={}", key, value)?;
        }

        for (i, (key, value)) in fields.into_iter().enumerate() {
            let sep = if i == 0 { ' ' } else { ',' };
            write!(f, "{}{}={}", sep, key, value)?;
        }

        write!(f, " {}", self.timestamp)
    }
}

#[derive(Deserialize)]
struct RawMetric {
    name: String,
    timestamp: i64,
    #[serde(default)]
    tags: TagMap,
    #[serde(default)]
    fields: FieldMap,
}

impl TryFrom<RawMetric> for Metric {
    type Error = MetricError;

    fn try_from(raw: RawMetric) -> Result<Self, Self::Error> {
        Self::from_parts(raw.name, raw.tags, raw.fields, raw.timestamp)
    }
}
