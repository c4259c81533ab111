//! Core metric type for protometric.
#![deny(warnings)]
#![deny(missing_docs)]

pub mod metric;
