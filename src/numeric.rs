use num_traits::Float;

use alloc::{collections::VecDeque, vec::Vec};

use core::{cell::RefCell, fmt};

use crate::{
    Error, ListenerId, Result, Sample, Series, SeriesKind, ShapeError, Timeline, Timeseries,
    Timestamp,
    helper::{euclidean, z_normalize},
    timeseries::Domain,
    utils::{Aggregates, Statistics},
};

/// Default relative threshold of [`NumericTimeseries::simplify`]
pub const DEFAULT_SIMPLIFY_THRESHOLD: f64 = 0.1;

/// A series of numeric samples with running aggregate statistics.
///
/// Sum, sum of squares, minimum and maximum are computed on first access and then kept
/// consistent with every [`append`](Self::append) and [`shift`](Self::shift) without a
/// full recomputation. The only exception is a shift that removes the current minimum or
/// maximum: a new extremum cannot be derived incrementally, so that one extremum is
/// rescanned in O(n). [`rescans`](Self::rescans) counts how often this happened.
///
/// # Examples
///
/// ```
/// # use ts_series::{Factory, Timeline};
/// let mut series = Factory::new()
///     .numeric([(0.0, 1.0), (60_000.0, 3.0), (120_000.0, 2.0)])
///     .unwrap();
/// assert_eq!(series.sum(), 6.0);
/// assert_eq!(series.mean(), Some(2.0));
///
/// series.append(180_000.0, 10.0).unwrap();
/// series.shift();
/// assert_eq!(series.range(), (2.0, 10.0));
/// ```
#[derive(Debug)]
pub struct NumericTimeseries {
    /// Samples and listeners
    inner: Timeseries<f64>,
    /// Lazily built aggregates
    stats: RefCell<Option<Aggregates>>,
    /// Number of extremum rescans triggered by shift
    rescans: usize,
}

impl NumericTimeseries {
    pub(crate) fn new(data: impl IntoIterator<Item = Sample<f64>>) -> Self {
        Self {
            inner: Timeseries::new(data),
            stats: RefCell::new(None),
            rescans: 0,
        }
    }

    /// Builds a numeric series from tagged values, rejecting anything but numbers
    pub(crate) fn try_from_values(data: impl IntoIterator<Item = Sample<crate::Value>>) -> Result<Self> {
        let data = data
            .into_iter()
            .enumerate()
            .map(|(index, (t, v))| match v.as_number() {
                Some(n) => Ok((t, n)),
                None => Err(ShapeError::ValueKind {
                    index,
                    expected: crate::ValueKind::Number,
                    found: v.kind(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(data))
    }

    /// Returns the aggregate statistics, computing them on first access
    ///
    /// # Returns
    ///
    /// * `Statistics` - Sum, sum of squares, minimum and maximum of all current values
    pub fn statistics(&self) -> Statistics {
        self.stats
            .borrow_mut()
            .get_or_insert_with(|| Aggregates::compute(self.inner.iter().map(|(_, v)| *v)))
            .statistics()
    }

    /// Sum of all values
    #[inline]
    pub fn sum(&self) -> f64 {
        self.statistics().sum
    }

    /// Sum of all squared values
    #[inline]
    pub fn sumsq(&self) -> f64 {
        self.statistics().sum_sq
    }

    /// Smallest value, `+inf` for an empty series
    #[inline]
    pub fn min(&self) -> f64 {
        self.statistics().min
    }

    /// Largest value, `-inf` for an empty series
    #[inline]
    pub fn max(&self) -> f64 {
        self.statistics().max
    }

    /// Returns `(min, max)`
    #[inline]
    pub fn range(&self) -> (f64, f64) {
        let stats = self.statistics();
        (stats.min, stats.max)
    }

    /// Returns `max - min`
    #[inline]
    pub fn span(&self) -> f64 {
        let stats = self.statistics();
        stats.max - stats.min
    }

    /// Number of O(n) extremum rescans performed by [`shift`](Self::shift)
    #[inline]
    pub const fn rescans(&self) -> usize {
        self.rescans
    }

    #[inline]
    pub(crate) fn check_order(&self, time: Timestamp) -> Result<()> {
        self.inner.check_order(time)
    }

    fn n(&self) -> f64 {
        self.inner.size() as f64
    }

    /// Returns the arithmetic mean
    ///
    /// # Returns
    ///
    /// * `Option<f64>` - The mean, or `None` if the series is empty
    pub fn mean(&self) -> Option<f64> {
        (!self.inner.is_empty()).then(|| self.sum() / self.n())
    }

    /// Returns the Bessel-corrected sample variance `Σ(v - mean)² / (n - 1)`
    ///
    /// # Returns
    ///
    /// * `Option<f64>` - The variance, or `None` with fewer than two samples
    pub fn variance(&self) -> Option<f64> {
        if self.inner.size() < 2 {
            return None;
        }
        let mean = self.mean()?;
        let sum = self
            .inner
            .iter()
            .map(|(_, v)| (v - mean) * (v - mean))
            .fold(0.0, |acc, sq| acc + sq);
        Some(sum / (self.n() - 1.0))
    }

    /// Returns the dispersion used for z-normalization
    ///
    /// This is `sqrt((sumsq / n) / mean²)`, the root mean square relative to the mean,
    /// not the textbook standard deviation. Downstream consumers rely on its exact value.
    ///
    /// # Returns
    ///
    /// * `Option<f64>` - The dispersion, or `None` if the series is empty
    pub fn stddev(&self) -> Option<f64> {
        let mean = self.mean()?;
        Some(Float::sqrt((self.sumsq() / self.n()) / (mean * mean)))
    }

    /// Returns every value scaled to `(v - mean) / stddev`, in order
    pub fn norms(&self) -> Vec<f64> {
        match self.mean().zip(self.stddev()) {
            Some((mean, stddev)) => z_normalize(self.inner.iter().map(|(_, v)| *v), mean, stddev),
            None => vec![],
        }
    }

    /// Appends a sample, folding it into the statistics if they have been computed
    ///
    /// # Returns
    ///
    /// * `Result<()>` - [`Error::Ordering`] if `time` is earlier than the current end
    pub fn append(&mut self, time: Timestamp, value: f64) -> Result<()> {
        self.check_order(time)?;
        if let Some(stats) = self.stats.get_mut() {
            stats.add(value);
        }
        self.inner.push(time, value);
        Ok(())
    }

    /// Removes and returns the earliest sample
    ///
    /// Sums are decremented in place. If the removed value was the cached minimum or
    /// maximum, that extremum is recomputed from the remaining samples.
    pub fn shift(&mut self) -> Option<Sample<f64>> {
        let sample = self.inner.pop_front()?;
        if let Some(stats) = self.stats.get_mut() {
            let invalidated = stats.remove(sample.1);
            let remaining = || self.inner.iter().map(|(_, v)| *v);
            if invalidated.min {
                log::debug!("shifted minimum {}, rescanning {} samples", sample.1, self.inner.size());
                stats.rescan_min(remaining());
                self.rescans += 1;
            }
            if invalidated.max {
                log::debug!("shifted maximum {}, rescanning {} samples", sample.1, self.inner.size());
                stats.rescan_max(remaining());
                self.rescans += 1;
            }
        }
        self.inner.notify();
        Some(sample)
    }

    /// Registers a listener invoked after every append and shift
    pub fn listen(&mut self, listener: impl FnMut() + 'static) -> ListenerId {
        self.inner.listen(listener)
    }

    /// Unregisters a listener
    pub fn unlisten(&mut self, id: ListenerId) -> bool {
        self.inner.unlisten(id)
    }

    /// Returns a new numeric series with the samples inside `[t1, t2]`
    ///
    /// See [`Timeseries::scan`] for the boundary rule.
    pub fn scan(&self, t1: Timestamp, t2: Timestamp) -> Self {
        Self {
            inner: self.inner.scan(t1, t2),
            stats: RefCell::new(None),
            rescans: 0,
        }
    }

    /// Returns a new numeric series with the samples for which `predicate` holds
    pub fn filter(&self, predicate: impl FnMut(Timestamp, &f64) -> bool) -> Self {
        Self {
            inner: self.inner.filter(predicate),
            stats: RefCell::new(None),
            rescans: 0,
        }
    }

    pub(crate) fn filter_mask(&self, keep: &[bool]) -> Self {
        Self {
            inner: self.inner.filter_mask(keep),
            stats: RefCell::new(None),
            rescans: 0,
        }
    }

    pub(crate) fn mask(&self, predicate: impl FnMut(Timestamp, &f64) -> bool) -> Vec<bool> {
        self.inner.mask(predicate)
    }

    /// Returns a new numeric series where every sample is replaced by the output of `mapper`
    pub fn map(&self, mapper: impl FnMut(Timestamp, &f64) -> Sample<f64>) -> Self {
        Self {
            inner: self.inner.map(mapper),
            stats: RefCell::new(None),
            rescans: 0,
        }
    }

    /// Downsamples the series, keeping the samples that shape it
    ///
    /// Walks the samples in order comparing each value with the immediately preceding
    /// one. When the change relative to the value span `max - min` exceeds `threshold`,
    /// both the preceding sample (unless it was the last one kept) and the current sample
    /// are kept. The first and last samples are always kept.
    ///
    /// The result is a plain series: the statistics are not carried over.
    ///
    /// # Arguments
    ///
    /// * `threshold` - Relative change that marks a transition, usually [`DEFAULT_SIMPLIFY_THRESHOLD`]
    ///
    /// # Examples
    ///
    /// ```
    /// # use ts_series::{Factory, Timeline, DEFAULT_SIMPLIFY_THRESHOLD};
    /// let series = Factory::new()
    ///     .numeric([(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 10.0), (4.0, 10.0), (5.0, 10.0)])
    ///     .unwrap();
    /// let simple = series.simplify(DEFAULT_SIMPLIFY_THRESHOLD);
    /// assert_eq!(simple.timestamps(), vec![0.0, 2.0, 3.0, 5.0]);
    /// ```
    pub fn simplify(&self, threshold: f64) -> Timeseries<f64> {
        let Some(&first) = self.inner.first() else {
            return Timeseries::new(vec![]);
        };
        let span = self.span();
        let mut kept = vec![first];
        let mut last = first;

        for &sample in self.inner.iter() {
            if Float::abs(sample.1 - last.1) / span > threshold {
                if kept.last().map(|(t, _)| *t) != Some(last.0) {
                    kept.push(last);
                }
                kept.push(sample);
            }
            last = sample;
        }
        if kept.last().map(|(t, _)| *t) != Some(last.0) {
            kept.push(last);
        }

        log::trace!("simplified {} samples to {}", self.inner.size(), kept.len());
        Timeseries::new(kept)
    }

    /// Finds where a pattern fits best in this series
    ///
    /// Both series are z-normalized with [`norms`](Self::norms), then a window of the
    /// pattern's length slides over every offset of this series. The start of the window
    /// with the smallest Euclidean distance is returned; on equal distances the earliest
    /// window wins.
    ///
    /// # Returns
    ///
    /// * `Result<Option<usize>>` - The best offset, `None` if no window has a finite
    ///   distance, or a [`ShapeError`] if the pattern is empty or longer than this series
    ///
    /// # Examples
    ///
    /// ```
    /// # use ts_series::Factory;
    /// let factory = Factory::new();
    /// let values = [5.0, 4.0, 3.0, 2.0, 1.0, 1.0, 3.0, 5.0, 4.0, 2.0];
    /// let source = factory
    ///     .numeric(factory.timestamp_from(values, 0.0, None))
    ///     .unwrap();
    /// let pattern = source.scan(300_000.0, 600_000.0);
    /// assert_eq!(source.match_pattern(&pattern).unwrap(), Some(5));
    /// ```
    pub fn match_pattern(&self, pattern: &NumericTimeseries) -> Result<Option<usize>> {
        let (m, n) = (pattern.size(), self.size());
        if m == 0 {
            return Err(ShapeError::EmptyPattern.into());
        }
        if m > n {
            return Err(ShapeError::PatternTooLong {
                pattern: m,
                series: n,
            }
            .into());
        }

        let query = pattern.norms();
        let source = self.norms();
        let mut best = f64::INFINITY;
        let mut idx = None;
        for (i, window) in source.windows(m).enumerate() {
            let distance = Self::distance(&query, window)?;
            if distance < best {
                best = distance;
                idx = Some(i);
            }
        }
        Ok(idx)
    }

    /// Like [`match_pattern`](Self::match_pattern), for a pattern of any variant
    ///
    /// # Returns
    ///
    /// * `Result<Option<usize>>` - [`Error::Type`] unless `pattern` is a numeric series
    pub fn match_series(&self, pattern: &Series) -> Result<Option<usize>> {
        match pattern {
            Series::Numeric(pattern) => self.match_pattern(pattern),
            other => Err(Error::Type {
                expected: SeriesKind::Numeric,
                found: other.kind(),
            }),
        }
    }

    /// Returns the Euclidean distance between two equally long sequences
    ///
    /// # Returns
    ///
    /// * `Result<f64>` - [`ShapeError::LengthMismatch`] if the lengths differ
    pub fn distance(a: &[f64], b: &[f64]) -> Result<f64> {
        euclidean(a, b).ok_or_else(|| {
            ShapeError::LengthMismatch {
                left: a.len(),
                right: b.len(),
            }
            .into()
        })
    }
}

impl Timeline for NumericTimeseries {
    type Value = f64;

    #[inline]
    fn samples(&self) -> &VecDeque<Sample<f64>> {
        self.inner.samples()
    }
}

fn fmt_opt(f: &mut fmt::Formatter<'_>, label: &str, value: Option<f64>) -> fmt::Result {
    match value {
        Some(v) => writeln!(f, "{label}: {v}"),
        None => writeln!(f, "{label}: -"),
    }
}

impl fmt::Display for NumericTimeseries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Timeseries")?;
        writeln!(f, "items   : {}", self.size())?;
        fmt_opt(f, "mean    ", self.mean())?;
        fmt_opt(f, "stddev  ", self.stddev())?;
        writeln!(f, "domain  : {}", Domain(self.domain()))?;
        let (min, max) = self.range();
        writeln!(f, "range   : [{min}, {max}]")?;
        match self.variance() {
            Some(v) => write!(f, "variance: {v}"),
            None => f.write_str("variance: -"),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    fn series(values: &[f64]) -> NumericTimeseries {
        NumericTimeseries::new(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (i as f64 * 60_000.0, *v)),
        )
    }

    fn assert_fresh(series: &NumericTimeseries) {
        let fresh = Aggregates::compute(series.iter().map(|(_, v)| *v)).statistics();
        let cached = series.statistics();
        assert_approx_eq!(cached.sum, fresh.sum, 1e-9);
        assert_approx_eq!(cached.sum_sq, fresh.sum_sq, 1e-6);
        assert_eq!(cached.min, fresh.min);
        assert_eq!(cached.max, fresh.max);
    }

    #[test]
    fn statistics_work() {
        let s = series(&[1.0, 3.0, 2.0]);
        assert_eq!(s.min(), 1.0);
        assert_eq!(s.max(), 3.0);
        assert_eq!(s.sum(), 6.0);
        assert_eq!(s.sumsq(), 14.0);
        assert_eq!(s.mean(), Some(2.0));
        assert_eq!(s.range(), (1.0, 3.0));
        assert_eq!(s.span(), 2.0);
    }

    #[test]
    fn variance_is_bessel_corrected() {
        let s = series(&[25.4, 26.2, 26.0]);
        assert_approx_eq!(s.variance().unwrap(), 0.1733, 0.0001);
        assert_eq!(series(&[4.0]).variance(), None);
        assert_eq!(series(&[]).variance(), None);
    }

    #[test]
    fn stddev_is_relative_rms() {
        // sqrt((14 / 3) / 4)
        let s = series(&[1.0, 3.0, 2.0]);
        assert_approx_eq!(s.stddev().unwrap(), 1.0801234497346435, 1e-12);
        assert_eq!(series(&[]).stddev(), None);
    }

    #[test]
    fn norms_work() {
        let s = series(&[1.0, 3.0, 2.0]);
        let stddev = s.stddev().unwrap();
        let norms = s.norms();
        assert_eq!(norms.len(), 3);
        assert_approx_eq!(norms[0], -1.0 / stddev, 1e-12);
        assert_approx_eq!(norms[1], 1.0 / stddev, 1e-12);
        assert_approx_eq!(norms[2], 0.0, 1e-12);
        assert!(series(&[]).norms().is_empty());
    }

    #[test]
    fn statistics_are_lazy() {
        let mut s = series(&[1.0, 2.0]);
        assert!(s.stats.borrow().is_none());
        s.append(120_000.0, 9.0).unwrap();
        s.shift();
        assert!(s.stats.borrow().is_none());
        assert_eq!(s.sum(), 11.0);
        assert!(s.stats.borrow().is_some());
    }

    #[test]
    fn append_updates_statistics_incrementally() {
        let mut s = series(&[1.0, 3.0, 2.0]);
        s.statistics();
        s.append(180_000.0, -4.0).unwrap();
        s.append(240_000.0, 8.5).unwrap();
        assert_fresh(&s);
        assert_eq!(s.min(), -4.0);
        assert_eq!(s.max(), 8.5);

        assert_eq!(
            s.append(0.0, 100.0),
            Err(Error::Ordering {
                time: 0.0,
                end: 240_000.0
            })
        );
        assert_eq!(s.max(), 8.5);
        assert_eq!(s.size(), 5);
    }

    #[test]
    fn shift_rescans_only_for_extremes() {
        let mut s = series(&[2.0, 5.0, 1.0, 3.0, 4.0]);
        s.statistics();

        s.shift();
        assert_eq!(s.rescans(), 0);
        assert_fresh(&s);

        // 5.0 is the maximum
        s.shift();
        assert_eq!(s.rescans(), 1);
        assert_eq!(s.max(), 4.0);
        assert_fresh(&s);

        // 1.0 is the minimum
        s.shift();
        assert_eq!(s.rescans(), 2);
        assert_eq!(s.min(), 3.0);
        assert_fresh(&s);
    }

    #[test]
    fn incremental_statistics_match_recomputation() {
        let mut s = series(&[0.5, -1.25, 7.0, 3.5]);
        s.statistics();
        let mut t = 240_000.0;
        for round in 0..60 {
            let v = ((round * 37) % 23) as f64 - 11.0 + 0.125 * round as f64;
            s.append(t, v).unwrap();
            t += 60_000.0;
            if round % 3 != 0 {
                s.shift();
            }
            assert_fresh(&s);
        }
    }

    #[test]
    fn shift_to_empty_resets_extremes() {
        let mut s = series(&[3.0]);
        s.statistics();
        assert_eq!(s.shift(), Some((0.0, 3.0)));
        assert_eq!(s.shift(), None);
        let stats = s.statistics();
        assert_eq!(stats.min, f64::INFINITY);
        assert_eq!(stats.max, f64::NEG_INFINITY);
        assert_approx_eq!(stats.sum, 0.0, 1e-12);
    }

    #[test]
    fn simplify_keeps_endpoints_and_transitions() {
        let s = series(&[0.0, 0.0, 0.0, 10.0, 10.0, 10.0, 0.0, 0.0]);
        let simple = s.simplify(DEFAULT_SIMPLIFY_THRESHOLD);
        assert_eq!(
            simple.values(),
            vec![0.0, 0.0, 10.0, 10.0, 0.0, 0.0]
        );
        assert_eq!(simple.start(), s.start());
        assert_eq!(simple.end(), s.end());
    }

    #[test]
    fn simplify_flat_series_keeps_first_and_last() {
        let s = series(&[4.0, 4.0, 4.0, 4.0]);
        let simple = s.simplify(0.5);
        assert_eq!(simple.timestamps(), vec![0.0, 180_000.0]);

        let single = series(&[4.0]).simplify(0.5);
        assert_eq!(single.size(), 1);
        assert!(series(&[]).simplify(0.5).is_empty());
    }

    #[test]
    fn simplify_always_keeps_first_and_last() {
        let values: Vec<f64> = (0..50)
            .map(|i| ((i * 17) % 11) as f64 * if i % 4 == 0 { -1.0 } else { 1.0 })
            .collect();
        let s = series(&values);
        for threshold in [0.0, 0.05, 0.1, 0.3, 0.9, 2.0] {
            let simple = s.simplify(threshold);
            assert_eq!(simple.first(), s.first());
            assert_eq!(simple.last(), s.last());
            assert!(simple.size() <= s.size());
        }
    }

    #[test]
    fn match_finds_a_sub_slice() {
        let s = series(&[
            5.0, 4.0, 3.0, 2.0, 1.0, 1.0, 3.0, 5.0, 4.0, 2.0, 1.0, 2.0, 3.0, 4.0, 5.0, 3.0, 1.0,
            4.0, 5.0, 2.0,
        ]);
        let pattern = s.scan(s.time(5).unwrap(), s.time(10).unwrap());
        assert_eq!(pattern.size(), 5);
        assert_eq!(s.match_pattern(&pattern), Ok(Some(5)));
    }

    #[test]
    fn match_rejects_bad_patterns() {
        let s = series(&[1.0, 2.0, 3.0]);
        let long = series(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(
            s.match_pattern(&long),
            Err(Error::Shape(ShapeError::PatternTooLong {
                pattern: 4,
                series: 3
            }))
        );
        assert_eq!(
            s.match_pattern(&series(&[])),
            Err(Error::Shape(ShapeError::EmptyPattern))
        );

        let text = Series::Base(Timeseries::new(vec![(0.0, crate::Value::from("x"))]));
        assert_eq!(
            s.match_series(&text),
            Err(Error::Type {
                expected: SeriesKind::Numeric,
                found: SeriesKind::Base
            })
        );
    }

    #[test]
    fn match_whole_series_is_offset_zero() {
        let s = series(&[1.0, 4.0, 2.0, 8.0]);
        let same = series(&[1.0, 4.0, 2.0, 8.0]);
        assert_eq!(s.match_pattern(&same), Ok(Some(0)));
        assert_eq!(s.match_series(&Series::Numeric(same)), Ok(Some(0)));
    }

    #[test]
    fn match_on_degenerate_norms_finds_nothing() {
        // all-zero values normalize to NaN
        let s = series(&[0.0, 0.0, 0.0, 0.0]);
        let pattern = series(&[0.0, 0.0]);
        assert_eq!(s.match_pattern(&pattern), Ok(None));
    }

    #[test]
    fn distance_works() {
        assert_approx_eq!(
            NumericTimeseries::distance(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap(),
            0.0
        );
        assert_approx_eq!(
            NumericTimeseries::distance(&[0.0, 0.0], &[3.0, 4.0]).unwrap(),
            5.0
        );
        assert_eq!(
            NumericTimeseries::distance(&[1.0], &[]),
            Err(Error::Shape(ShapeError::LengthMismatch { left: 1, right: 0 }))
        );
    }

    #[test]
    fn transformations_stay_numeric() {
        let mut s = series(&[1.0, 2.0, 3.0, 4.0]);
        s.listen(|| {});
        let scanned = s.scan(60_000.0, 180_000.0);
        assert_eq!(scanned.values(), vec![2.0, 3.0]);
        assert_eq!(scanned.sum(), 5.0);

        let filtered = s.filter(|_, v| *v > 2.0);
        assert_eq!(filtered.mean(), Some(3.5));

        let mapped = s.map(|t, v| (t, v * v));
        assert_eq!(mapped.max(), 16.0);
    }

    #[test]
    fn display_summarizes() {
        let s = series(&[1.0, 3.0, 2.0]);
        let text = format!("{s}");
        assert!(text.starts_with("Timeseries\nitems   : 3\nmean    : 2\n"));
        assert!(text.contains("domain  : [0, 120000]\n"));
        assert!(text.contains("range   : [1, 3]\n"));
        assert!(text.ends_with("variance: 1"));
    }
}
