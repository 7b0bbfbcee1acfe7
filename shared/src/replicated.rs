//! Authoritative list with an ordered change stream, and the read-only replica that consumes it
//!
//! The server owns the only writable copy (`ReplicatedList`). Every mutation appends exactly one
//! `ListEvent` to an outgoing queue before returning; the owner drains that queue and forwards the
//! events to each connection in order. Clients hold a `ListReplica` which can only apply events.
//!
//! There is no reconciliation: a replica that skips or reorders events diverges for good. An
//! event whose index does not fit the replica means the ordered-delivery guarantee was broken
//! upstream, so it panics instead of returning an error.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One change to a replicated list. Indices refer to the authoritative ordering at emission time.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum ListEvent<T> {
    Add { item: T },
    Update { index: usize, item: T },
    Remove { index: usize, item: T },
    Clear,
}

impl<T> ListEvent<T> {
    /// The item carried by the event, if any.
    pub fn item(&self) -> Option<&T> {
        match self {
            ListEvent::Add { item }
            | ListEvent::Update { item, .. }
            | ListEvent::Remove { item, .. } => Some(item),
            ListEvent::Clear => None,
        }
    }
}

/// The authoritative copy of a replicated list
#[derive(Debug, Clone)]
pub struct ReplicatedList<T> {
    items: Vec<T>,
    outgoing: VecDeque<ListEvent<T>>,
}

impl<T: Clone> ReplicatedList<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            outgoing: VecDeque::new(),
        }
    }

    pub fn add(&mut self, item: T) {
        self.items.push(item.clone());
        self.outgoing.push_back(ListEvent::Add { item });
    }

    /// Replaces the item at `index`.
    ///
    /// Panics if `index` is out of range.
    pub fn update_at(&mut self, index: usize, item: T) {
        let len = self.items.len();
        let slot = self
            .items
            .get_mut(index)
            .unwrap_or_else(|| panic!("update index {} out of range for list of length {}", index, len));
        *slot = item.clone();
        self.outgoing.push_back(ListEvent::Update { index, item });
    }

    /// Removes and returns the item at `index`.
    ///
    /// Panics if `index` is out of range.
    pub fn remove_at(&mut self, index: usize) -> T {
        assert!(
            index < self.items.len(),
            "remove index {} out of range for list of length {}",
            index,
            self.items.len()
        );
        let item = self.items.remove(index);
        self.outgoing.push_back(ListEvent::Remove {
            index,
            item: item.clone(),
        });
        item
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.outgoing.push_back(ListEvent::Clear);
    }

    /// Takes every event emitted since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<ListEvent<T>> {
        self.outgoing.drain(..).collect()
    }

    pub fn pending_events(&self) -> usize {
        self.outgoing.len()
    }

    pub fn position<P>(&self, predicate: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool,
    {
        self.items.iter().position(predicate)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Clone> Default for ReplicatedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A read-only mirror of a `ReplicatedList`
#[derive(Debug, Clone)]
pub struct ListReplica<T> {
    items: Vec<T>,
    events_applied: u64,
}

impl<T: Clone> ListReplica<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            events_applied: 0,
        }
    }

    /// Applies the next event from the authoritative stream.
    ///
    /// Events must be applied in the order they were produced. Panics on an index that does not
    /// exist in this replica, which can only happen after a dropped or reordered event.
    pub fn apply_event(&mut self, event: ListEvent<T>) {
        match event {
            ListEvent::Add { item } => self.items.push(item),
            ListEvent::Update { index, item } => {
                let len = self.items.len();
                match self.items.get_mut(index) {
                    Some(slot) => *slot = item,
                    None => panic!(
                        "replica diverged: update index {} with {} items after {} events",
                        index, len, self.events_applied
                    ),
                }
            }
            ListEvent::Remove { index, .. } => {
                assert!(
                    index < self.items.len(),
                    "replica diverged: remove index {} with {} items after {} events",
                    index,
                    self.items.len(),
                    self.events_applied
                );
                self.items.remove(index);
            }
            ListEvent::Clear => self.items.clear(),
        }
        self.events_applied += 1;
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn events_applied(&self) -> u64 {
        self.events_applied
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Clone> Default for ListReplica<T> {
    fn default() -> Self {
        Self::new()
    }
}
