//! An ordered collection of records with create/update/delete.

use crate::record::Record;
use crate::{error::Result, Error, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Records in insertion order.
///
/// Order matters: it is what the remote store receives on push and what the
/// merge preserves on pull.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Record> Collection<T> {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(items: Vec<T>) -> Self {
        Self { items }
    }

    /// Get a record by ID.
    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|r| r.id() == id)
    }

    /// Check if a record exists.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Create a record from a draft and append it.
    pub fn create(&mut self, id: RecordId, draft: T::Draft, now: DateTime<Utc>) -> Result<&T> {
        let record = T::create(id, draft, now)?;
        self.items.push(record);
        Ok(&self.items[self.items.len() - 1])
    }

    /// Update a record in place from a draft.
    pub fn update(&mut self, id: &str, draft: T::Draft, now: DateTime<Utc>) -> Result<&T> {
        let record = self
            .items
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))?;
        record.apply(draft, now)?;
        Ok(record)
    }

    /// Remove a record and return it.
    pub fn delete(&mut self, id: &str) -> Result<T> {
        let index = self
            .items
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))?;
        Ok(self.items.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
