//! Ordered work collections used as traversal queues and result lists.

use std::collections::VecDeque;
use std::collections::vec_deque;

use thiserror::Error;

use crate::handle::{HandleDir, HandleFile};

/// Non-fatal access failures of a [`CollectionWork`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CollectionError {
    /// Front/back access on an empty collection.
    #[error("Collection is empty")]
    Empty,
    /// Indexed access past the end.
    #[error("Index {index} out of bounds (len={len})")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// Insertion-ordered sequence with FIFO and indexed access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionWork<T> {
    items: VecDeque<T>,
}

pub type CollectionDirs = CollectionWork<HandleDir>;
pub type CollectionFiles = CollectionWork<HandleFile>;

impl<T> Default for CollectionWork<T> {
    fn default() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }
}

impl<T> CollectionWork<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn add(&mut self, item: T) {
        self.items.push_back(item);
    }

    /// Move every item of `other` to the back, keeping its order.
    pub fn add_collection(&mut self, mut other: CollectionWork<T>) {
        self.items.append(&mut other.items);
    }

    pub fn pop_first(&mut self) -> Result<T, CollectionError> {
        self.items.pop_front().ok_or(CollectionError::Empty)
    }

    pub fn pop_last(&mut self) -> Result<T, CollectionError> {
        self.items.pop_back().ok_or(CollectionError::Empty)
    }

    pub fn pop_at(&mut self, index: usize) -> Result<T, CollectionError> {
        let len = self.items.len();
        self.items
            .remove(index)
            .ok_or(CollectionError::IndexOutOfBounds { index, len })
    }

    pub fn peek_first(&self) -> Result<&T, CollectionError> {
        self.items.front().ok_or(CollectionError::Empty)
    }

    pub fn peek_last(&self) -> Result<&T, CollectionError> {
        self.items.back().ok_or(CollectionError::Empty)
    }

    pub fn peek_at(&self, index: usize) -> Result<&T, CollectionError> {
        self.items.get(index).ok_or(CollectionError::IndexOutOfBounds {
            index,
            len: self.items.len(),
        })
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> FromIterator<T> for CollectionWork<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> Extend<T> for CollectionWork<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<T> IntoIterator for CollectionWork<T> {
    type Item = T;
    type IntoIter = vec_deque::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a CollectionWork<T> {
    type Item = &'a T;
    type IntoIter = vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl CollectionWork<HandleDir> {
    /// One absolute path per line.
    pub fn format_listing(&self) -> String {
        _format_lines(self.iter().map(|d| d.path().display().to_string()))
    }
}

impl CollectionWork<HandleFile> {
    /// One absolute path per line.
    pub fn format_listing(&self) -> String {
        _format_lines(self.iter().map(|f| f.path().display().to_string()))
    }

    pub fn total_bytes(&self) -> u64 {
        self.iter().map(HandleFile::size).sum()
    }
}

fn _format_lines(iter_lines: impl Iterator<Item = String>) -> String {
    let mut txt = String::new();
    for line in iter_lines {
        txt.push_str(&line);
        txt.push('\n');
    }
    txt
}

#[cfg(test)]
mod tests {
    use super::{CollectionError, CollectionWork};

    #[test]
    fn pop_first_is_fifo_and_reports_empty() {
        let mut collection: CollectionWork<u32> = [1, 2, 3].into_iter().collect();
        assert_eq!(collection.pop_first(), Ok(1));
        assert_eq!(collection.pop_first(), Ok(2));
        assert_eq!(collection.pop_first(), Ok(3));
        assert_eq!(collection.pop_first(), Err(CollectionError::Empty));
        assert_eq!(collection.peek_first(), Err(CollectionError::Empty));
    }

    #[test]
    fn indexed_access_past_end_is_out_of_bounds() {
        let mut collection: CollectionWork<&str> = ["a", "b"].into_iter().collect();
        assert_eq!(collection.peek_at(1), Ok(&"b"));
        assert_eq!(
            collection.peek_at(2),
            Err(CollectionError::IndexOutOfBounds { index: 2, len: 2 })
        );
        assert_eq!(collection.pop_at(0), Ok("a"));
        assert_eq!(
            collection.pop_at(5),
            Err(CollectionError::IndexOutOfBounds { index: 5, len: 1 })
        );

        let empty: CollectionWork<u8> = CollectionWork::new();
        assert_eq!(
            empty.peek_at(0),
            Err(CollectionError::IndexOutOfBounds { index: 0, len: 0 })
        );
    }

    #[test]
    fn add_collection_appends_in_order() {
        let mut left: CollectionWork<u8> = [1, 2].into_iter().collect();
        let right: CollectionWork<u8> = [3, 4].into_iter().collect();
        left.add_collection(right);
        left.add(5);
        assert_eq!(left.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert_eq!(left.pop_last(), Ok(5));
        assert_eq!(left.peek_last(), Ok(&4));

        left.clear();
        assert!(left.is_empty());
    }
}
