use ahash::RandomState;
use hashbrown::HashMap;

use alloc::{
    collections::VecDeque,
    string::{String, ToString},
    vec::Vec,
};

use core::fmt;

use crate::{
    Error, ListenerId, Record, Result, Sample, Series, ShapeError, Timeline, Timeseries,
    Timestamp, Value, ValueKind, timeseries::Domain,
};

/// A tree of series sharing one timeline.
///
/// Each sample holds a [`Record`]; every attribute of the first record becomes a child
/// series built from the `(timestamp, record[attribute])` projection of all samples.
/// Numeric attributes become [`NumericTimeseries`](crate::NumericTimeseries), nested
/// records become nested multi series and text becomes a base series, so the whole
/// structure is a spanning tree addressable by `/`-separated paths.
///
/// Appends and shifts on the tree are mirrored into the children within the same call.
///
/// # Examples
///
/// ```
/// # use ts_series::{Factory, Record};
/// let tree = Factory::new()
///     .multi([
///         (0.0, Record::new()
///             .with("dan", Record::new().with("drinks", 2.0).with("calories", 160.0))
///             .with("mike", Record::new().with("drinks", 1.0).with("calories", -1.0))),
///     ])
///     .unwrap();
///
/// let drinks = tree.series("dan/drinks").unwrap();
/// assert_eq!(drinks.as_numeric().map(|s| s.max()), Some(2.0));
/// assert!(tree.series("dan").unwrap().as_multi().is_some());
/// assert!(tree.series("bob").is_err());
/// ```
#[derive(Debug)]
pub struct MultiTimeseries {
    /// Full records and listeners
    inner: Timeseries<Record>,
    /// Child series by attribute
    lookup: HashMap<String, Series, RandomState>,
    /// Attribute names in discovery order
    attrs: Vec<String>,
}

impl MultiTimeseries {
    pub(crate) fn new(data: Vec<Sample<Record>>) -> Result<Self> {
        let attrs: Vec<String> = data
            .first()
            .map(|(_, record)| record.keys().map(String::from).collect())
            .unwrap_or_default();

        // attributes unknown to the first record do not shape the tree
        let mut projected: Vec<Vec<Sample<Value>>> = attrs.iter().map(|_| Vec::new()).collect();
        for (time, record) in &data {
            for (key, value) in record.iter() {
                if let Some(pos) = attrs.iter().position(|attr| attr == key) {
                    projected[pos].push((*time, value.clone()));
                }
            }
        }

        let mut lookup = HashMap::with_capacity_and_hasher(attrs.len(), RandomState::default());
        for (attr, samples) in attrs.iter().zip(projected) {
            lookup.insert(attr.clone(), Series::from_samples(samples)?);
        }
        log::debug!(
            "built multi series with {} attributes over {} samples",
            attrs.len(),
            data.len()
        );

        Ok(Self {
            inner: Timeseries::new(data),
            lookup,
            attrs,
        })
    }

    /// Builds a multi series from tagged values, rejecting anything but records
    pub(crate) fn try_from_values(data: impl IntoIterator<Item = Sample<Value>>) -> Result<Self> {
        let data = data
            .into_iter()
            .enumerate()
            .map(|(index, (t, v))| match v {
                Value::Record(record) => Ok((t, record)),
                other => Err(ShapeError::ValueKind {
                    index,
                    expected: ValueKind::Record,
                    found: other.kind(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(data)
    }

    /// Attribute names in discovery order
    pub fn attrs(&self) -> &[String] {
        &self.attrs
    }

    fn child(&self, name: &str) -> Result<&Series> {
        self.lookup.get(name).ok_or_else(|| Error::Lookup {
            attribute: name.to_string(),
        })
    }

    /// Resolves a `/`-separated attribute path to a child series
    ///
    /// A single leading slash is ignored. Every segment but the last must name a nested
    /// multi series.
    ///
    /// # Returns
    ///
    /// * `Result<&Series>` - The child, or [`Error::Lookup`] naming the first segment that
    ///   could not be resolved
    pub fn series(&self, path: &str) -> Result<&Series> {
        let path = path.strip_prefix('/').unwrap_or(path);
        match path.split_once('/') {
            Some((head, rest)) => match self.child(head)? {
                Series::Multi(child) => child.series(rest),
                _ => Err(Error::Lookup {
                    attribute: rest.to_string(),
                }),
            },
            None => self.child(path),
        }
    }

    /// Alias of [`MultiTimeseries::series`]
    pub fn attr(&self, name: &str) -> Result<&Series> {
        self.series(name)
    }

    /// Validates an append without applying it
    pub(crate) fn check_append(&self, time: Timestamp, record: &Record) -> Result<()> {
        self.inner.check_order(time)?;
        for (key, value) in record.iter() {
            self.child(key)?.check_append(time, value)?;
        }
        Ok(())
    }

    /// Appends a record, forwarding each of its attributes to the matching child
    ///
    /// Only the attributes present in `record` are forwarded. Children of omitted
    /// attributes fall behind the tree, so callers that need every child in step must
    /// always supply complete records.
    ///
    /// # Returns
    ///
    /// * `Result<()>` - [`Error::Ordering`] for a past timestamp, [`Error::Lookup`] for an
    ///   attribute outside the tree, or a [`ShapeError`] for a value of the wrong kind.
    ///   Nothing is modified when an error is returned.
    pub fn append(&mut self, time: Timestamp, record: Record) -> Result<()> {
        self.check_append(time, &record)?;
        for (key, value) in record.iter() {
            if let Some(child) = self.lookup.get_mut(key) {
                child.append(time, value.clone())?;
            }
        }
        self.inner.push(time, record);
        Ok(())
    }

    /// Removes and returns the earliest record, shifting every child first
    pub fn shift(&mut self) -> Option<Sample<Record>> {
        for attr in &self.attrs {
            if let Some(child) = self.lookup.get_mut(attr) {
                child.shift();
            }
        }
        self.inner.shift()
    }

    /// Registers a listener invoked after every append and shift of the tree
    pub fn listen(&mut self, listener: impl FnMut() + 'static) -> ListenerId {
        self.inner.listen(listener)
    }

    /// Unregisters a listener
    pub fn unlisten(&mut self, id: ListenerId) -> bool {
        self.inner.unlisten(id)
    }

    /// Returns a new tree with the samples inside `[t1, t2]`, children sliced alike
    pub fn scan(&self, t1: Timestamp, t2: Timestamp) -> Self {
        Self {
            inner: self.inner.scan(t1, t2),
            lookup: self.children(|child| child.scan(t1, t2)),
            attrs: self.attrs.clone(),
        }
    }

    /// Returns a new tree with the records for which `predicate` holds
    ///
    /// Children keep the samples at the positions kept in the tree, so repeated
    /// timestamps cannot desynchronize them.
    pub fn filter(&self, predicate: impl FnMut(Timestamp, &Record) -> bool) -> Self {
        self.filter_mask(&self.inner.mask(predicate))
    }

    /// Keeps the samples whose position is marked in `keep`, in the tree and every child
    pub(crate) fn filter_mask(&self, keep: &[bool]) -> Self {
        Self {
            inner: self.inner.filter_mask(keep),
            lookup: self.children(|child| child.filter_mask(keep)),
            attrs: self.attrs.clone(),
        }
    }

    pub(crate) fn mask(&self, predicate: impl FnMut(Timestamp, &Record) -> bool) -> Vec<bool> {
        self.inner.mask(predicate)
    }

    /// Returns a new tree rebuilt from the records produced by `mapper`
    ///
    /// # Returns
    ///
    /// * `Result<Self>` - A [`ShapeError`] if the mapped records give an attribute
    ///   values of mixed kinds
    pub fn map(&self, mut mapper: impl FnMut(Timestamp, &Record) -> Sample<Record>) -> Result<Self> {
        Self::new(self.inner.iter().map(|(t, r)| mapper(*t, r)).collect())
    }

    fn children(&self, mut f: impl FnMut(&Series) -> Series) -> HashMap<String, Series, RandomState> {
        let mut lookup = HashMap::with_capacity_and_hasher(self.attrs.len(), RandomState::default());
        for attr in &self.attrs {
            if let Some(child) = self.lookup.get(attr) {
                lookup.insert(attr.clone(), f(child));
            }
        }
        lookup
    }
}

impl Timeline for MultiTimeseries {
    type Value = Record;

    #[inline]
    fn samples(&self) -> &VecDeque<Sample<Record>> {
        self.inner.samples()
    }
}

impl fmt::Display for MultiTimeseries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Timeseries")?;
        writeln!(f, "items   : {}", self.size())?;
        writeln!(f, "attrs   : {}", self.attrs.join(", "))?;
        write!(f, "domain  : {}", Domain(self.domain()))
    }
}
