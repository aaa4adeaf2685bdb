use alloc::{boxed::Box, vec::Vec};

use core::fmt;

/// Handle returned by `listen`, used to unregister the listener again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Registry of change listeners, invoked in registration order
#[derive(Default)]
pub struct Listeners {
    next: u64,
    entries: Vec<(ListenerId, Box<dyn FnMut()>)>,
}

impl Listeners {
    /// Registers a listener and returns its handle
    pub fn register(&mut self, listener: impl FnMut() + 'static) -> ListenerId {
        let id = ListenerId(self.next);
        self.next += 1;
        self.entries.push((id, Box::new(listener)));
        log::trace!("registered listener {id:?}, {} active", self.entries.len());
        id
    }

    /// Removes a listener
    ///
    /// # Returns
    ///
    /// * `bool` - True if the handle was registered
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        before != self.entries.len()
    }

    /// Invokes every listener once
    pub fn notify(&mut self) {
        for (_, listener) in self.entries.iter_mut() {
            listener();
        }
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("active", &self.entries.len())
            .finish()
    }
}
