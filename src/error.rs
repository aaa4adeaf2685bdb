use alloc::string::String;

use thiserror::Error;

use crate::{SeriesKind, Timestamp, ValueKind};

/// Result alias used throughout the crate
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors raised by series construction, mutation and lookup.
///
/// Every error is raised at the point of violation and indicates caller misuse;
/// nothing is retried or partially applied.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed or type-mismatched input
    #[error("malformed series data: {0}")]
    Shape(#[from] ShapeError),
    /// An append with a timestamp earlier than the current series end
    #[error("cannot append sample at {time} before series end {end}")]
    Ordering {
        /// Rejected timestamp
        time: Timestamp,
        /// Current end of the series
        end: Timestamp,
    },
    /// A series of the wrong variant was supplied
    #[error("expected a {expected} series, found a {found} series")]
    Type {
        /// Variant the operation needs
        expected: SeriesKind,
        /// Variant that was supplied
        found: SeriesKind,
    },
    /// A path or attribute that the multi series does not know
    #[error("unknown attribute `{attribute}`")]
    Lookup {
        /// Unresolved attribute or path remainder
        attribute: String,
    },
}

/// Shape violations of raw input, sample values or distance operands
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeError {
    /// No samples at all
    #[error("expected an array of [timestamp, value] samples, got none")]
    Empty,
    /// A row that is not a `[timestamp, value]` pair
    #[error("sample {index} has {len} elements, expected [timestamp, value]")]
    NotAPair {
        /// Row position
        index: usize,
        /// Number of elements found
        len: usize,
    },
    /// A row whose first element is not a number
    #[error("sample {index} has a {found} timestamp, expected a number")]
    Timestamp {
        /// Row position
        index: usize,
        /// Kind found in the timestamp slot
        found: ValueKind,
    },
    /// A value of the wrong kind for the series variant
    #[error("sample {index} holds a {found} value, expected a {expected}")]
    ValueKind {
        /// Sample position
        index: usize,
        /// Kind the variant stores
        expected: ValueKind,
        /// Kind that was supplied
        found: ValueKind,
    },
    /// Distance operands of different lengths
    #[error("sequence lengths must match for distance, got {left} and {right}")]
    LengthMismatch {
        /// Length of the first operand
        left: usize,
        /// Length of the second operand
        right: usize,
    },
    /// A pattern longer than the series it is matched against
    #[error("pattern of {pattern} samples exceeds series of {series} samples")]
    PatternTooLong {
        /// Pattern length
        pattern: usize,
        /// Length of the searched series
        series: usize,
    },
    /// A pattern without samples
    #[error("pattern has no samples")]
    EmptyPattern,
}
