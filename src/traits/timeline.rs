use alloc::{collections::VecDeque, vec::Vec};

use core::ops::Range;

use crate::{Sample, Timestamp, helper::nearest_index};

/// Read-only access to an ordered sequence of timestamped samples
///
/// Every concrete series exposes its samples through [`Timeline::samples`]; positional
/// accessors, boundary queries and the nearest-timestamp search are provided on top of it.
/// Mutation is not part of this trait; each variant owns its `append`/`shift` and the
/// bookkeeping that goes with them.
pub trait Timeline {
    /// The value stored alongside each timestamp
    type Value;

    /// The samples in ascending timestamp order
    fn samples(&self) -> &VecDeque<Sample<Self::Value>>;

    /// Returns the number of samples
    ///
    /// # Examples
    ///
    /// ```
    /// # use ts_series::{Factory, Timeline};
    /// let series = Factory::new().numeric([(0.0, 1.0), (60_000.0, 3.0)]).unwrap();
    /// assert_eq!(series.size(), 2);
    /// assert_eq!(series.len(), series.count());
    /// ```
    #[inline]
    fn size(&self) -> usize {
        self.samples().len()
    }

    /// Alias of [`Timeline::size`]
    #[inline]
    fn len(&self) -> usize {
        self.size()
    }

    /// Alias of [`Timeline::size`]
    #[inline]
    fn count(&self) -> usize {
        self.size()
    }

    /// Returns true if there are no samples
    #[inline]
    fn is_empty(&self) -> bool {
        self.samples().is_empty()
    }

    /// Returns the earliest sample
    #[inline]
    fn first(&self) -> Option<&Sample<Self::Value>> {
        self.samples().front()
    }

    /// Returns the latest sample
    #[inline]
    fn last(&self) -> Option<&Sample<Self::Value>> {
        self.samples().back()
    }

    /// Returns the sample at a zero-based position
    #[inline]
    fn sample(&self, idx: usize) -> Option<&Sample<Self::Value>> {
        self.samples().get(idx)
    }

    /// Returns the timestamp at a zero-based position
    #[inline]
    fn time(&self, idx: usize) -> Option<Timestamp> {
        self.sample(idx).map(|(t, _)| *t)
    }

    /// Returns the value at a zero-based position
    #[inline]
    fn value(&self, idx: usize) -> Option<&Self::Value> {
        self.sample(idx).map(|(_, v)| v)
    }

    /// Returns the first and last timestamp
    #[inline]
    fn domain(&self) -> Option<(Timestamp, Timestamp)> {
        self.start().zip(self.end())
    }

    /// Returns the first timestamp
    #[inline]
    fn start(&self) -> Option<Timestamp> {
        self.first().map(|(t, _)| *t)
    }

    /// Returns the last timestamp
    #[inline]
    fn end(&self) -> Option<Timestamp> {
        self.last().map(|(t, _)| *t)
    }

    /// Returns the time between the first and last sample
    #[inline]
    fn duration(&self) -> Option<Timestamp> {
        self.domain().map(|(start, end)| end - start)
    }

    /// Iterates the samples in order
    #[inline]
    fn iter(&self) -> alloc::collections::vec_deque::Iter<'_, Sample<Self::Value>> {
        self.samples().iter()
    }

    /// Returns all values in order
    fn values(&self) -> Vec<Self::Value>
    where
        Self::Value: Clone,
    {
        self.iter().map(|(_, v)| v.clone()).collect()
    }

    /// Returns all timestamps in order
    fn timestamps(&self) -> Vec<Timestamp> {
        self.iter().map(|(t, _)| *t).collect()
    }

    /// Returns the position of the sample whose timestamp is closest to `timestamp`
    ///
    /// When the query falls exactly halfway between two neighbours the later sample wins.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ts_series::{Factory, Timeline};
    /// let series = Factory::new()
    ///     .numeric([(0.0, 1.0), (10.0, 2.0), (20.0, 3.0)])
    ///     .unwrap();
    /// assert_eq!(series.nearest(12.0), Some(1));
    /// assert_eq!(series.nearest(15.0), Some(2));
    /// ```
    fn nearest(&self, timestamp: Timestamp) -> Option<usize> {
        let samples = self.samples();
        nearest_index(samples.len(), |i| samples[i].0, timestamp)
    }

    /// Positions covered by a scan of `[t1, t2]`
    ///
    /// Both bounds start at the nearest sample and move one position forward when that
    /// sample lies before the bound, the upper position being exclusive.
    fn scan_range(&self, t1: Timestamp, t2: Timestamp) -> Range<usize> {
        let samples = self.samples();
        let (Some(mut lo), Some(mut hi)) = (self.nearest(t1), self.nearest(t2)) else {
            return 0..0;
        };
        if samples[lo].0 < t1 {
            lo += 1;
        }
        if samples[hi].0 < t2 {
            hi += 1;
        }
        lo..hi.max(lo)
    }
}
