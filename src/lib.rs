#![doc = include_str!("../README.md")]
#![no_std]
#![deny(
    unsafe_code,
    unused_imports,
    unused_variables,
    unused_must_use,
    missing_docs,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented
)]
#![allow(clippy::len_without_is_empty)]

#[macro_use]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub(crate) type Kbn<T> = compensated_summation::KahanBabuskaNeumaier<T>;

/// Point in time, in milliseconds since the Unix epoch by convention
pub type Timestamp = f64;

/// A timestamped observation
pub type Sample<V> = (Timestamp, V);

mod utils;
pub(crate) use utils::helper;
pub use utils::{ListenerId, Statistics};

mod traits;
pub use traits::Timeline;

mod error;
pub use error::{Error, Result, ShapeError};

mod value;
pub use value::{Record, Value, ValueKind};

mod timeseries;
pub use timeseries::Timeseries;

mod numeric;
pub use numeric::{DEFAULT_SIMPLIFY_THRESHOLD, NumericTimeseries};

mod multi;
pub use multi::MultiTimeseries;

mod series;
pub use series::{Series, SeriesKind};

mod factory;
pub use factory::{DEFAULT_STEP, Factory};
