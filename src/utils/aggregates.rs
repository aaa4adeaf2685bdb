use crate::{
    Kbn,
    utils::helper::{max_of, min_of},
};

/// Aggregate statistics over a numeric series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    /// Sum of values
    pub sum: f64,
    /// Sum of squared values
    pub sum_sq: f64,
    /// Smallest value, `+inf` for an empty series
    pub min: f64,
    /// Largest value, `-inf` for an empty series
    pub max: f64,
}

/// Incrementally maintained aggregates behind [`Statistics`]
///
/// Sums are accumulated with Kahan-Babuska-Neumaier compensation so that long runs of
/// appends and shifts do not drift from a fresh recomputation.
#[derive(Debug, Clone)]
pub struct Aggregates {
    /// Sum of inputs
    sum: Kbn<f64>,
    /// Sum of squares
    sum_sq: Kbn<f64>,
    /// Minimum
    min: f64,
    /// Maximum
    max: f64,
}

/// Extremes invalidated by a removal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Invalidated {
    /// The removed value was the minimum
    pub min: bool,
    /// The removed value was the maximum
    pub max: bool,
}

impl Aggregates {
    /// Computes the aggregates of a sequence from scratch
    pub fn compute(values: impl Iterator<Item = f64>) -> Self {
        let mut aggregates = Self {
            sum: Kbn::default(),
            sum_sq: Kbn::default(),
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        };
        for v in values {
            aggregates.add(v);
        }
        aggregates
    }

    /// Folds a new value into the aggregates
    #[inline]
    pub fn add(&mut self, value: f64) {
        self.sum += value;
        self.sum_sq += value * value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Removes a value from the sums
    ///
    /// The extremes cannot be repaired incrementally, the caller rescans whatever
    /// the returned flags mark as invalidated.
    #[inline]
    pub fn remove(&mut self, value: f64) -> Invalidated {
        self.sum -= value;
        self.sum_sq -= value * value;
        Invalidated {
            min: value == self.min,
            max: value == self.max,
        }
    }

    /// Recomputes the minimum from the remaining values
    pub fn rescan_min(&mut self, values: impl Iterator<Item = f64>) {
        self.min = min_of(values);
    }

    /// Recomputes the maximum from the remaining values
    pub fn rescan_max(&mut self, values: impl Iterator<Item = f64>) {
        self.max = max_of(values);
    }

    /// Returns a snapshot of the aggregates
    #[inline]
    pub fn statistics(&self) -> Statistics {
        Statistics {
            sum: self.sum.total(),
            sum_sq: self.sum_sq.total(),
            min: self.min,
            max: self.max,
        }
    }
}
