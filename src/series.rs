use alloc::vec::Vec;

use core::fmt;

use crate::{
    Error, ListenerId, MultiTimeseries, NumericTimeseries, Result, Sample, ShapeError, Timeline,
    Timeseries, Timestamp, Value, ValueKind,
};

/// Variant tag of a [`Series`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesKind {
    /// Plain samples without statistics
    Base,
    /// Numeric samples with aggregate statistics
    Numeric,
    /// Record samples with per-attribute children
    Multi,
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Base => "base",
            Self::Numeric => "numeric",
            Self::Multi => "multi",
        })
    }
}

/// A series whose variant was chosen from the shape of its data.
///
/// This is what [`Factory::build`](crate::Factory::build) returns and what a
/// [`MultiTimeseries`] stores for each attribute. The variant never changes after
/// construction: transformations return a series of the same kind.
///
/// Values cross this interface as [`Value`]s. Use [`Series::as_numeric`] or
/// [`Series::as_multi`] to reach variant specific operations.
#[derive(Debug)]
pub enum Series {
    /// Text or otherwise unclassified values
    Base(Timeseries<Value>),
    /// Numeric values
    Numeric(NumericTimeseries),
    /// Record values
    Multi(MultiTimeseries),
}

macro_rules! each {
    ($series:expr, $inner:ident => $body:expr) => {
        match $series {
            Series::Base($inner) => $body,
            Series::Numeric($inner) => $body,
            Series::Multi($inner) => $body,
        }
    };
}

impl Series {
    /// Classifies samples by the kind of their first value
    ///
    /// Numbers give a numeric series, records a multi series and anything else a base
    /// series. Every later value must match the kind of the first.
    pub(crate) fn from_samples(data: Vec<Sample<Value>>) -> Result<Self> {
        match data.first().map(|(_, v)| v.kind()) {
            Some(ValueKind::Number) => NumericTimeseries::try_from_values(data).map(Self::Numeric),
            Some(ValueKind::Record) => MultiTimeseries::try_from_values(data).map(Self::Multi),
            Some(ValueKind::Text) | None => Ok(Self::Base(Timeseries::new(data))),
        }
    }

    /// Returns the variant tag
    #[inline]
    pub const fn kind(&self) -> SeriesKind {
        match self {
            Self::Base(_) => SeriesKind::Base,
            Self::Numeric(_) => SeriesKind::Numeric,
            Self::Multi(_) => SeriesKind::Multi,
        }
    }

    /// Returns the base series, if this is one
    pub const fn as_base(&self) -> Option<&Timeseries<Value>> {
        match self {
            Self::Base(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric series, if this is one
    pub const fn as_numeric(&self) -> Option<&NumericTimeseries> {
        match self {
            Self::Numeric(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the multi series, if this is one
    pub const fn as_multi(&self) -> Option<&MultiTimeseries> {
        match self {
            Self::Multi(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric series mutably, if this is one
    pub fn as_numeric_mut(&mut self) -> Option<&mut NumericTimeseries> {
        match self {
            Self::Numeric(s) => Some(s),
            _ => None,
        }
    }

    /// Unwraps the base series
    ///
    /// # Returns
    ///
    /// * `Result<Timeseries<Value>>` - [`Error::Type`] for any other variant
    pub fn into_base(self) -> Result<Timeseries<Value>> {
        match self {
            Self::Base(s) => Ok(s),
            other => Err(other.mismatch(SeriesKind::Base)),
        }
    }

    /// Unwraps the numeric series
    ///
    /// # Returns
    ///
    /// * `Result<NumericTimeseries>` - [`Error::Type`] for any other variant
    pub fn into_numeric(self) -> Result<NumericTimeseries> {
        match self {
            Self::Numeric(s) => Ok(s),
            other => Err(other.mismatch(SeriesKind::Numeric)),
        }
    }

    /// Unwraps the multi series
    ///
    /// # Returns
    ///
    /// * `Result<MultiTimeseries>` - [`Error::Type`] for any other variant
    pub fn into_multi(self) -> Result<MultiTimeseries> {
        match self {
            Self::Multi(s) => Ok(s),
            other => Err(other.mismatch(SeriesKind::Multi)),
        }
    }

    fn mismatch(&self, expected: SeriesKind) -> Error {
        Error::Type {
            expected,
            found: self.kind(),
        }
    }

    /// Number of samples
    #[inline]
    pub fn size(&self) -> usize {
        each!(self, s => s.size())
    }

    /// Alias of [`Series::size`]
    #[inline]
    pub fn len(&self) -> usize {
        self.size()
    }

    /// Alias of [`Series::size`]
    #[inline]
    pub fn count(&self) -> usize {
        self.size()
    }

    /// Returns true if there are no samples
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Timestamp at a zero-based position
    pub fn time(&self, idx: usize) -> Option<Timestamp> {
        each!(self, s => s.time(idx))
    }

    /// Value at a zero-based position
    pub fn value(&self, idx: usize) -> Option<Value> {
        each!(self, s => s.value(idx).map(Value::from))
    }

    /// Sample at a zero-based position
    pub fn sample(&self, idx: usize) -> Option<Sample<Value>> {
        each!(self, s => s.sample(idx).map(|(t, v)| (*t, Value::from(v))))
    }

    /// Earliest sample
    pub fn first(&self) -> Option<Sample<Value>> {
        self.sample(0)
    }

    /// Latest sample
    pub fn last(&self) -> Option<Sample<Value>> {
        self.size().checked_sub(1).and_then(|idx| self.sample(idx))
    }

    /// First and last timestamp
    pub fn domain(&self) -> Option<(Timestamp, Timestamp)> {
        each!(self, s => s.domain())
    }

    /// First timestamp
    pub fn start(&self) -> Option<Timestamp> {
        each!(self, s => s.start())
    }

    /// Last timestamp
    pub fn end(&self) -> Option<Timestamp> {
        each!(self, s => s.end())
    }

    /// Time between the first and last sample
    pub fn duration(&self) -> Option<Timestamp> {
        each!(self, s => s.duration())
    }

    /// All timestamps in order
    pub fn timestamps(&self) -> Vec<Timestamp> {
        each!(self, s => s.timestamps())
    }

    /// All values in order
    pub fn values(&self) -> Vec<Value> {
        each!(self, s => s.iter().map(|(_, v)| Value::from(v)).collect())
    }

    /// Position of the sample closest to `timestamp`, see [`Timeline::nearest`]
    pub fn nearest(&self, timestamp: Timestamp) -> Option<usize> {
        each!(self, s => s.nearest(timestamp))
    }

    /// Returns a series of the same variant with the samples inside `[t1, t2]`
    pub fn scan(&self, t1: Timestamp, t2: Timestamp) -> Self {
        match self {
            Self::Base(s) => Self::Base(s.scan(t1, t2)),
            Self::Numeric(s) => Self::Numeric(s.scan(t1, t2)),
            Self::Multi(s) => Self::Multi(s.scan(t1, t2)),
        }
    }

    /// Returns a series of the same variant with the samples for which `predicate` holds
    pub fn filter(&self, mut predicate: impl FnMut(Timestamp, &Value) -> bool) -> Self {
        let keep = match self {
            Self::Base(s) => s.mask(predicate),
            Self::Numeric(s) => s.mask(|t, v| predicate(t, &Value::Number(*v))),
            Self::Multi(s) => s.mask(|t, r| predicate(t, &Value::from(r))),
        };
        self.filter_mask(&keep)
    }

    /// Keeps the samples whose position is marked in `keep`
    pub(crate) fn filter_mask(&self, keep: &[bool]) -> Self {
        match self {
            Self::Base(s) => Self::Base(s.filter_mask(keep)),
            Self::Numeric(s) => Self::Numeric(s.filter_mask(keep)),
            Self::Multi(s) => Self::Multi(s.filter_mask(keep)),
        }
    }

    /// Returns a series of the same variant built from the samples produced by `mapper`
    ///
    /// # Returns
    ///
    /// * `Result<Self>` - A [`ShapeError`] if a mapped value does not fit the variant
    pub fn map(&self, mut mapper: impl FnMut(Timestamp, Value) -> Sample<Value>) -> Result<Self> {
        match self {
            Self::Base(s) => Ok(Self::Base(s.map(|t, v| mapper(t, v.clone())))),
            Self::Numeric(s) => NumericTimeseries::try_from_values(
                s.iter().map(|(t, v)| mapper(*t, Value::Number(*v))),
            )
            .map(Self::Numeric),
            Self::Multi(s) => MultiTimeseries::try_from_values(
                s.iter().map(|(t, r)| mapper(*t, Value::from(r))),
            )
            .map(Self::Multi),
        }
    }

    /// Validates an append without applying it
    pub(crate) fn check_append(&self, time: Timestamp, value: &Value) -> Result<()> {
        let expected = match self {
            Self::Base(s) => return s.check_order(time),
            Self::Numeric(s) => {
                s.check_order(time)?;
                ValueKind::Number
            }
            Self::Multi(s) => match value {
                Value::Record(record) => return s.check_append(time, record),
                _ => ValueKind::Record,
            },
        };
        if value.kind() == expected {
            Ok(())
        } else {
            Err(ShapeError::ValueKind {
                index: self.size(),
                expected,
                found: value.kind(),
            }
            .into())
        }
    }

    /// Appends a sample to the underlying variant
    ///
    /// # Returns
    ///
    /// * `Result<()>` - [`Error::Ordering`] for a past timestamp or a [`ShapeError`] if
    ///   `value` does not fit the variant. Nothing is modified on error.
    pub fn append(&mut self, time: Timestamp, value: Value) -> Result<()> {
        self.check_append(time, &value)?;
        match (self, value) {
            (Self::Base(s), value) => s.append(time, value),
            (Self::Numeric(s), Value::Number(n)) => s.append(time, n),
            (Self::Multi(s), Value::Record(r)) => s.append(time, r),
            (series, value) => Err(ShapeError::ValueKind {
                index: series.size(),
                expected: match series.kind() {
                    SeriesKind::Multi => ValueKind::Record,
                    _ => ValueKind::Number,
                },
                found: value.kind(),
            }
            .into()),
        }
    }

    /// Removes and returns the earliest sample
    pub fn shift(&mut self) -> Option<Sample<Value>> {
        match self {
            Self::Base(s) => s.shift(),
            Self::Numeric(s) => s.shift().map(|(t, v)| (t, Value::Number(v))),
            Self::Multi(s) => s.shift().map(|(t, r)| (t, Value::Record(r))),
        }
    }

    /// Registers a listener invoked after every append and shift
    pub fn listen(&mut self, listener: impl FnMut() + 'static) -> ListenerId {
        each!(self, s => s.listen(listener))
    }

    /// Unregisters a listener
    pub fn unlisten(&mut self, id: ListenerId) -> bool {
        each!(self, s => s.unlisten(id))
    }

    /// Resolves an attribute path on a multi series
    ///
    /// # Returns
    ///
    /// * `Result<&Series>` - [`Error::Type`] unless this is a multi series, otherwise see
    ///   [`MultiTimeseries::series`]
    pub fn series(&self, path: &str) -> Result<&Series> {
        match self {
            Self::Multi(s) => s.series(path),
            other => Err(other.mismatch(SeriesKind::Multi)),
        }
    }
}

impl From<Timeseries<Value>> for Series {
    fn from(series: Timeseries<Value>) -> Self {
        Self::Base(series)
    }
}

impl From<NumericTimeseries> for Series {
    fn from(series: NumericTimeseries) -> Self {
        Self::Numeric(series)
    }
}

impl From<MultiTimeseries> for Series {
    fn from(series: MultiTimeseries) -> Self {
        Self::Multi(series)
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        each!(self, s => fmt::Display::fmt(s, f))
    }
}

#[cfg(test)]
mod tests {
    use alloc::{format, rc::Rc};
    use core::cell::Cell;

    use super::*;
    use crate::Record;

    fn samples(values: Vec<Value>) -> Vec<Sample<Value>> {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i as f64 * 60_000.0, v))
            .collect()
    }

    #[test]
    fn variant_follows_first_value() {
        let numeric = Series::from_samples(samples(vec![Value::Number(1.0), Value::Number(2.0)])).unwrap();
        assert_eq!(numeric.kind(), SeriesKind::Numeric);
        assert!(numeric.as_numeric().is_some());

        let text = Series::from_samples(samples(vec!["a".into(), "b".into()])).unwrap();
        assert_eq!(text.kind(), SeriesKind::Base);
        assert!(text.as_base().is_some());

        let multi = Series::from_samples(samples(vec![Record::new().with("a", 1.0).into()])).unwrap();
        assert_eq!(multi.kind(), SeriesKind::Multi);
        assert!(multi.as_multi().is_some());
    }

    #[test]
    fn mixed_values_are_rejected() {
        let err = Series::from_samples(samples(vec![Value::Number(1.0), "b".into()])).unwrap_err();
        assert_eq!(
            err,
            Error::Shape(ShapeError::ValueKind {
                index: 1,
                expected: ValueKind::Number,
                found: ValueKind::Text
            })
        );
    }

    #[test]
    fn accessors_convert_to_values() {
        let series = Series::from_samples(samples(vec![Value::Number(1.0), Value::Number(3.0)])).unwrap();
        assert_eq!(series.size(), 2);
        assert_eq!(series.value(1), Some(Value::Number(3.0)));
        assert_eq!(series.first(), Some((0.0, Value::Number(1.0))));
        assert_eq!(series.last(), Some((60_000.0, Value::Number(3.0))));
        assert_eq!(series.values(), vec![Value::Number(1.0), Value::Number(3.0)]);
        assert_eq!(series.domain(), Some((0.0, 60_000.0)));
        assert_eq!(series.nearest(50_000.0), Some(1));
    }

    #[test]
    fn append_checks_kind_and_order() {
        let mut series = Series::from_samples(samples(vec![Value::Number(1.0), Value::Number(3.0)])).unwrap();
        assert_eq!(
            series.append(120_000.0, "x".into()),
            Err(Error::Shape(ShapeError::ValueKind {
                index: 2,
                expected: ValueKind::Number,
                found: ValueKind::Text
            }))
        );
        assert!(matches!(
            series.append(0.0, Value::Number(5.0)),
            Err(Error::Ordering { .. })
        ));
        series.append(120_000.0, Value::Number(5.0)).unwrap();
        assert_eq!(series.as_numeric().map(|s| s.max()), Some(5.0));

        let mut text = Series::from_samples(samples(vec!["a".into()])).unwrap();
        text.append(60_000.0, Value::Number(1.0)).unwrap();
        assert_eq!(text.size(), 2);

        let mut multi =
            Series::from_samples(samples(vec![Record::new().with("a", 1.0).into()])).unwrap();
        assert!(multi.append(60_000.0, Value::Number(1.0)).is_err());
        multi
            .append(60_000.0, Record::new().with("a", 2.0).into())
            .unwrap();
        assert_eq!(multi.size(), 2);
    }

    #[test]
    fn shift_and_listeners_reach_the_variant() {
        let hits = Rc::new(Cell::new(0));
        let mut series = Series::from_samples(samples(vec![Value::Number(1.0), Value::Number(3.0)])).unwrap();
        let id = {
            let hits = Rc::clone(&hits);
            series.listen(move || hits.set(hits.get() + 1))
        };
        assert_eq!(series.shift(), Some((0.0, Value::Number(1.0))));
        assert_eq!(hits.get(), 1);
        assert!(series.unlisten(id));
        series.shift();
        assert_eq!(hits.get(), 1);
        assert!(series.is_empty());
    }

    #[test]
    fn transformations_keep_the_variant() {
        let series = Series::from_samples(samples(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)])).unwrap();
        let scanned = series.scan(60_000.0, 200_000.0);
        assert_eq!(scanned.kind(), SeriesKind::Numeric);
        assert_eq!(scanned.size(), 2);

        let filtered = series.filter(|_, v| v.as_number() != Some(2.0));
        assert_eq!(filtered.as_numeric().map(|s| s.sum()), Some(4.0));

        let mapped = series
            .map(|t, v| (t, Value::Number(v.as_number().unwrap_or_default() * 2.0)))
            .unwrap();
        assert_eq!(mapped.as_numeric().map(|s| s.sum()), Some(12.0));

        assert!(series.map(|t, _| (t, "text".into())).is_err());
    }

    #[test]
    fn unwrapping_checks_the_variant() {
        let series = Series::from_samples(samples(vec!["a".into()])).unwrap();
        assert_eq!(
            series.series("a").unwrap_err(),
            Error::Type {
                expected: SeriesKind::Multi,
                found: SeriesKind::Base
            }
        );
        assert!(matches!(
            series.into_numeric(),
            Err(Error::Type {
                expected: SeriesKind::Numeric,
                found: SeriesKind::Base
            })
        ));
    }

    #[test]
    fn display_delegates() {
        let series = Series::from_samples(samples(vec!["a".into()])).unwrap();
        assert_eq!(format!("{series}"), "Timeseries\nitems   : 1\ndomain  : [0, 0]");
    }
}
