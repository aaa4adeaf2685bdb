use alloc::vec::Vec;

use crate::{
    MultiTimeseries, NumericTimeseries, Result, Sample, Series, ShapeError, Timeseries, Timestamp,
    Value,
};

/// Default spacing of generated timestamps, one minute in milliseconds
pub const DEFAULT_STEP: f64 = 60_000.0;

/// Validates raw input and builds series of the matching variant.
///
/// The factory holds no state besides its configuration, so one instance can serve any
/// number of builds.
///
/// # Examples
///
/// ```
/// # use ts_series::{Factory, SeriesKind};
/// let mut factory = Factory::new();
/// factory.set_step(1_000.0);
///
/// let samples = factory.timestamp_from([1.0, 3.0, 2.0], 0.0, None);
/// assert_eq!(samples[2], (2_000.0, 2.0));
///
/// let series = factory.build(samples).unwrap();
/// assert_eq!(series.kind(), SeriesKind::Numeric);
/// assert_eq!(series.size(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Factory {
    /// Spacing used by `timestamp` when no step is given
    step: f64,
}

impl Default for Factory {
    fn default() -> Self {
        Self::new()
    }
}

impl Factory {
    /// Creates a factory with the default one minute step
    pub const fn new() -> Self {
        Self { step: DEFAULT_STEP }
    }

    /// Returns the default timestamp spacing
    #[inline]
    pub const fn step(&self) -> f64 {
        self.step
    }

    /// Sets the default timestamp spacing
    ///
    /// # Arguments
    ///
    /// * `step` - Spacing in milliseconds
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The factory, for chaining
    pub const fn set_step(&mut self, step: f64) -> &mut Self {
        self.step = step;
        self
    }

    /// Checks the shape of raw `[timestamp, value]` rows
    ///
    /// Only the first row is inspected. Later rows are checked when they are converted
    /// by [`Factory::samples`].
    ///
    /// # Returns
    ///
    /// * `Result<()>` - [`ShapeError::Empty`] without rows, [`ShapeError::NotAPair`] or
    ///   [`ShapeError::Timestamp`] for a malformed first row
    pub fn validate(&self, rows: &[Vec<Value>]) -> Result<()> {
        let first = rows.first().ok_or(ShapeError::Empty)?;
        check_row(0, first)?;
        Ok(())
    }

    /// Converts raw rows into samples
    pub fn samples(&self, rows: Vec<Vec<Value>>) -> Result<Vec<Sample<Value>>> {
        self.validate(&rows)?;
        let samples = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| into_sample(index, row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(samples)
    }

    /// Builds a series from raw rows, see [`Factory::build`]
    pub fn build_rows(&self, rows: Vec<Vec<Value>>) -> Result<Series> {
        Series::from_samples(self.samples(rows)?)
    }

    /// Wraps samples in a base series, whatever their values
    ///
    /// # Returns
    ///
    /// * `Result<Timeseries<Value>>` - [`ShapeError::Empty`] without samples
    pub fn wrap<V: Into<Value>>(&self, data: impl IntoIterator<Item = (Timestamp, V)>) -> Result<Timeseries<Value>> {
        Ok(Timeseries::new(collect(data)?))
    }

    /// Builds a numeric series
    ///
    /// # Returns
    ///
    /// * `Result<NumericTimeseries>` - [`ShapeError::Empty`] without samples or
    ///   [`ShapeError::ValueKind`] for a value that is not a number
    pub fn numeric<V: Into<Value>>(&self, data: impl IntoIterator<Item = (Timestamp, V)>) -> Result<NumericTimeseries> {
        NumericTimeseries::try_from_values(collect(data)?)
    }

    /// Builds a multi series
    ///
    /// # Returns
    ///
    /// * `Result<MultiTimeseries>` - [`ShapeError::Empty`] without samples or
    ///   [`ShapeError::ValueKind`] for a value that is not a record
    pub fn multi<V: Into<Value>>(&self, data: impl IntoIterator<Item = (Timestamp, V)>) -> Result<MultiTimeseries> {
        MultiTimeseries::try_from_values(collect(data)?)
    }

    /// Builds the series variant matching the first value
    ///
    /// Numbers give a [`NumericTimeseries`], records a [`MultiTimeseries`] and text a
    /// base [`Timeseries`]. All values must be of the same kind.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ts_series::{Factory, Record, SeriesKind};
    /// let factory = Factory::new();
    /// let text = factory.build([(0.0, "up"), (60_000.0, "down")]).unwrap();
    /// assert_eq!(text.kind(), SeriesKind::Base);
    ///
    /// let tree = factory
    ///     .build([(0.0, Record::new().with("a", 1.0).with("b", "x"))])
    ///     .unwrap();
    /// assert_eq!(tree.kind(), SeriesKind::Multi);
    /// assert_eq!(tree.series("a").unwrap().kind(), SeriesKind::Numeric);
    /// ```
    pub fn build<V: Into<Value>>(&self, data: impl IntoIterator<Item = (Timestamp, V)>) -> Result<Series> {
        Series::from_samples(collect(data)?)
    }

    /// Pairs each value with the timestamp `start + i * step`
    ///
    /// # Arguments
    ///
    /// * `values` - Values in order
    /// * `start` - Timestamp of the first value, the current time when `None`
    /// * `step` - Spacing, the factory step when `None`
    #[cfg(feature = "std")]
    pub fn timestamp<V>(
        &self,
        values: impl IntoIterator<Item = V>,
        start: Option<Timestamp>,
        step: Option<f64>,
    ) -> Vec<Sample<V>> {
        self.timestamp_from(values, start.unwrap_or_else(now), step)
    }

    /// Pairs values with timestamps spaced `step` apart from an explicit start
    pub fn timestamp_from<V>(
        &self,
        values: impl IntoIterator<Item = V>,
        start: Timestamp,
        step: Option<f64>,
    ) -> Vec<Sample<V>> {
        let step = step.unwrap_or(self.step);
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (start + i as f64 * step, v))
            .collect()
    }
}

/// Milliseconds since the Unix epoch
#[cfg(feature = "std")]
fn now() -> Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0.0, |elapsed| elapsed.as_millis() as f64)
}

fn collect<V: Into<Value>>(data: impl IntoIterator<Item = (Timestamp, V)>) -> Result<Vec<Sample<Value>>> {
    let samples: Vec<Sample<Value>> = data.into_iter().map(|(t, v)| (t, v.into())).collect();
    if samples.is_empty() {
        return Err(ShapeError::Empty.into());
    }
    Ok(samples)
}

fn check_row(index: usize, row: &[Value]) -> Result<Timestamp, ShapeError> {
    match row {
        [Value::Number(t), _] => Ok(*t),
        [time, _] => Err(ShapeError::Timestamp {
            index,
            found: time.kind(),
        }),
        _ => Err(ShapeError::NotAPair {
            index,
            len: row.len(),
        }),
    }
}

fn into_sample(index: usize, row: Vec<Value>) -> Result<Sample<Value>, ShapeError> {
    let time = check_row(index, &row)?;
    let len = row.len();
    let [_, value]: [Value; 2] = row
        .try_into()
        .map_err(|_| ShapeError::NotAPair { index, len })?;
    Ok((time, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Record, SeriesKind, Timeline, ValueKind};

    fn rows(values: &[(f64, Value)]) -> Vec<Vec<Value>> {
        values
            .iter()
            .map(|(t, v)| vec![Value::Number(*t), v.clone()])
            .collect()
    }

    #[test]
    fn build_picks_the_variant() {
        let factory = Factory::new();
        let numeric = factory.build([(0.0, 1.0), (60_000.0, 3.0)]).unwrap();
        assert_eq!(numeric.kind(), SeriesKind::Numeric);
        assert_eq!(numeric.size(), 2);

        let text = factory.build([(0.0, "a")]).unwrap();
        assert_eq!(text.kind(), SeriesKind::Base);

        let multi = factory.build([(0.0, Record::new().with("a", 1.0))]).unwrap();
        assert_eq!(multi.kind(), SeriesKind::Multi);
    }

    #[test]
    fn build_keeps_every_sample() {
        let factory = Factory::new();
        for n in 1..20 {
            let values: Vec<f64> = (0..n).map(|i| (i * 7 % 5) as f64).collect();
            let series = factory
                .build(factory.timestamp_from(values, 1_000.0, None))
                .unwrap();
            assert_eq!(series.size(), n);
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        let factory = Factory::new();
        let none: [(f64, f64); 0] = [];
        assert_eq!(factory.build(none).unwrap_err(), Error::Shape(ShapeError::Empty));
        assert_eq!(factory.numeric(none).unwrap_err(), Error::Shape(ShapeError::Empty));
        assert_eq!(factory.validate(&[]), Err(Error::Shape(ShapeError::Empty)));
    }

    #[test]
    fn typed_builders_check_values() {
        let factory = Factory::new();
        assert_eq!(
            factory.numeric([(0.0, "x")]).unwrap_err(),
            Error::Shape(ShapeError::ValueKind {
                index: 0,
                expected: ValueKind::Number,
                found: ValueKind::Text
            })
        );
        assert_eq!(
            factory.multi([(0.0, 1.0)]).unwrap_err(),
            Error::Shape(ShapeError::ValueKind {
                index: 0,
                expected: ValueKind::Record,
                found: ValueKind::Number
            })
        );
        let wrapped = factory.wrap([(0.0, 1.0), (1.0, 2.0)]).unwrap();
        assert_eq!(wrapped.value(1), Some(&Value::Number(2.0)));
    }

    #[test]
    fn raw_rows_are_validated() {
        let factory = Factory::new();
        assert_eq!(
            factory.validate(&[vec![Value::Number(0.0)]]),
            Err(Error::Shape(ShapeError::NotAPair { index: 0, len: 1 }))
        );
        assert_eq!(
            factory.validate(&[vec![Value::from("t"), Value::Number(1.0)]]),
            Err(Error::Shape(ShapeError::Timestamp {
                index: 0,
                found: ValueKind::Text
            }))
        );

        let mut bad = rows(&[(0.0, Value::Number(1.0))]);
        bad.push(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]);
        assert!(factory.validate(&bad).is_ok());
        assert_eq!(
            factory.samples(bad).unwrap_err(),
            Error::Shape(ShapeError::NotAPair { index: 1, len: 3 })
        );

        let series = factory
            .build_rows(rows(&[(0.0, Value::Number(1.0)), (60_000.0, Value::Number(5.0))]))
            .unwrap();
        assert_eq!(series.as_numeric().map(|s| s.max()), Some(5.0));
    }

    #[test]
    fn timestamps_are_evenly_spaced() {
        let mut factory = Factory::new();
        let samples = factory.timestamp_from(['a', 'b', 'c'], 100.0, None);
        assert_eq!(
            samples.iter().map(|(t, _)| *t).collect::<Vec<_>>(),
            vec![100.0, 60_100.0, 120_100.0]
        );
        let samples = factory.set_step(5.0).timestamp_from([1, 2], 0.0, None);
        assert_eq!(samples, vec![(0.0, 1), (5.0, 2)]);
        let samples = factory.timestamp_from([1, 2], 0.0, Some(2.0));
        assert_eq!(samples, vec![(0.0, 1), (2.0, 2)]);
        assert_eq!(factory.step(), 5.0);
    }

    #[cfg(feature = "std")]
    #[test]
    fn timestamps_default_to_now() {
        let factory = Factory::new();
        let samples = factory.timestamp([1.0, 2.0], None, None);
        assert!(samples[0].0 > 1.6e12);
        assert_eq!(samples[1].0 - samples[0].0, DEFAULT_STEP);
        assert_eq!(factory.timestamp([1.0], Some(7.0), None)[0].0, 7.0);
    }

    #[test]
    fn end_to_end_numeric_statistics() {
        let series = Factory::new()
            .build_rows(rows(&[
                (0.0, Value::Number(1.0)),
                (60_000.0, Value::Number(3.0)),
                (120_000.0, Value::Number(2.0)),
            ]))
            .unwrap()
            .into_numeric()
            .unwrap();
        assert_eq!(series.min(), 1.0);
        assert_eq!(series.max(), 3.0);
        assert_eq!(series.sum(), 6.0);
        assert_eq!(series.mean(), Some(2.0));
    }

    #[test]
    fn end_to_end_multi_lookup() {
        let factory = Factory::new();
        let tree = factory
            .multi([
                (0.0, Record::new().with("a", 1.0).with("b", "x")),
                (60_000.0, Record::new().with("a", 2.0).with("b", "y")),
            ])
            .unwrap();
        assert_eq!(tree.series("a").unwrap().as_numeric().map(|s| s.max()), Some(2.0));
        assert_eq!(tree.size(), 2);
    }
}
