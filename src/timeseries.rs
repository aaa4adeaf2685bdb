use alloc::{collections::VecDeque, vec::Vec};

use core::fmt;

use crate::{
    Error, ListenerId, Result, Sample, Timeline, Timestamp,
    utils::Listeners,
};

/// An ordered container of timestamped samples.
///
/// `Timeseries<V>` is the shared core of every series variant: it owns the samples, enforces
/// the append ordering rule and notifies registered listeners after each structural
/// mutation. With `V = Value` it is the base series built by the factory for textual data;
/// with `V = f64` it is the plain result of [`NumericTimeseries::simplify`](crate::NumericTimeseries::simplify).
///
/// A series is not synchronized. Callers embedding it in a multi-threaded host must
/// serialize access to a single instance.
#[derive(Debug)]
pub struct Timeseries<V> {
    /// Samples in ascending timestamp order
    data: VecDeque<Sample<V>>,
    /// Change listeners
    listeners: Listeners,
}

impl<V> Timeseries<V> {
    pub(crate) fn new(data: impl IntoIterator<Item = Sample<V>>) -> Self {
        Self {
            data: data.into_iter().collect(),
            listeners: Listeners::default(),
        }
    }

    /// Fails if `time` lies before the current end of the series
    #[inline]
    pub(crate) fn check_order(&self, time: Timestamp) -> Result<()> {
        match self.end() {
            Some(end) if time < end => Err(Error::Ordering { time, end }),
            _ => Ok(()),
        }
    }

    /// Appends a sample at the tail and notifies listeners
    ///
    /// Appending at exactly the current end timestamp is allowed.
    ///
    /// # Arguments
    ///
    /// * `time` - Timestamp of the new sample
    /// * `value` - Value of the new sample
    ///
    /// # Returns
    ///
    /// * `Result<()>` - [`Error::Ordering`] if `time` is earlier than the current end
    pub fn append(&mut self, time: Timestamp, value: V) -> Result<()> {
        self.check_order(time)?;
        self.push(time, value);
        Ok(())
    }

    /// Appends without the ordering check; callers have already validated `time`
    pub(crate) fn push(&mut self, time: Timestamp, value: V) {
        self.data.push_back((time, value));
        log::trace!("appended sample at {time}, {} samples", self.data.len());
        self.notify();
    }

    /// Removes and returns the earliest sample, notifying listeners
    ///
    /// # Returns
    ///
    /// * `Option<Sample<V>>` - The removed sample, or `None` if the series is empty
    pub fn shift(&mut self) -> Option<Sample<V>> {
        let sample = self.pop_front()?;
        self.notify();
        Some(sample)
    }

    /// Removes the earliest sample without notifying
    pub(crate) fn pop_front(&mut self) -> Option<Sample<V>> {
        let sample = self.data.pop_front();
        if let Some((time, _)) = &sample {
            log::trace!("shifted sample at {time}, {} samples", self.data.len());
        }
        sample
    }

    #[inline]
    pub(crate) fn notify(&mut self) {
        self.listeners.notify();
    }

    /// Registers a listener invoked after every append and shift
    ///
    /// Listeners run synchronously in registration order and receive no payload; they
    /// re-query the series if they need its state.
    ///
    /// # Returns
    ///
    /// * `ListenerId` - Handle for [`Timeseries::unlisten`]
    pub fn listen(&mut self, listener: impl FnMut() + 'static) -> ListenerId {
        self.listeners.register(listener)
    }

    /// Unregisters a listener
    ///
    /// # Returns
    ///
    /// * `bool` - True if the listener was registered
    pub fn unlisten(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Number of registered listeners
    pub fn listeners(&self) -> usize {
        self.listeners.len()
    }

    /// Returns a new series with the samples inside `[t1, t2]`
    ///
    /// The slice starts at the sample nearest `t1`, moved forward if it lies before `t1`,
    /// and ends before the sample nearest `t2`, moved forward if it lies before `t2`.
    /// A sample exactly at `t2` is therefore excluded.
    pub fn scan(&self, t1: Timestamp, t2: Timestamp) -> Self
    where
        V: Clone,
    {
        Self::new(self.data.range(self.scan_range(t1, t2)).cloned())
    }

    /// Returns a new series with the samples for which `predicate` holds
    pub fn filter(&self, mut predicate: impl FnMut(Timestamp, &V) -> bool) -> Self
    where
        V: Clone,
    {
        Self::new(self.data.iter().filter(|(t, v)| predicate(*t, v)).cloned())
    }

    /// Returns a new series with the samples whose position is marked in `keep`
    ///
    /// Positions past the end of `keep` are dropped.
    pub(crate) fn filter_mask(&self, keep: &[bool]) -> Self
    where
        V: Clone,
    {
        Self::new(
            self.data
                .iter()
                .zip(keep)
                .filter_map(|(sample, keep)| keep.then(|| sample.clone())),
        )
    }

    /// Marks the positions for which `predicate` holds
    pub(crate) fn mask(&self, mut predicate: impl FnMut(Timestamp, &V) -> bool) -> Vec<bool> {
        self.data.iter().map(|(t, v)| predicate(*t, v)).collect()
    }

    /// Returns a new series where every sample is replaced by the output of `mapper`
    ///
    /// The mapper returns the full replacement sample, timestamp included.
    pub fn map(&self, mut mapper: impl FnMut(Timestamp, &V) -> Sample<V>) -> Self {
        Self::new(self.data.iter().map(|(t, v)| mapper(*t, v)))
    }
}

impl<V> Timeline for Timeseries<V> {
    type Value = V;

    #[inline]
    fn samples(&self) -> &VecDeque<Sample<V>> {
        &self.data
    }
}

/// `[start, end]` rendering of a domain, `[]` when empty
pub(crate) struct Domain(pub(crate) Option<(Timestamp, Timestamp)>);

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some((start, end)) => write!(f, "[{start}, {end}]"),
            None => f.write_str("[]"),
        }
    }
}

impl<V> fmt::Display for Timeseries<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Timeseries")?;
        writeln!(f, "items   : {}", self.size())?;
        write!(f, "domain  : {}", Domain(self.domain()))
    }
}
