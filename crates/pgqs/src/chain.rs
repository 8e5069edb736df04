//! Persistent append-only list used for builder state.

use std::fmt;
use std::sync::Arc;

struct Node<T> {
    value: T,
    prev: Option<Arc<Node<T>>>,
}

/// An immutable list whose `push` returns a new list sharing the old one.
///
/// Two lists derived from the same parent never observe each other's
/// appends.
pub struct Chain<T> {
    tail: Option<Arc<Node<T>>>,
    len: usize,
}

impl<T> Chain<T> {
    pub fn new() -> Self {
        Self { tail: None, len: 0 }
    }

    /// A new list with `value` appended.
    #[must_use]
    pub fn push(&self, value: T) -> Self {
        Self {
            tail: Some(Arc::new(Node {
                value,
                prev: self.tail.clone(),
            })),
            len: self.len + 1,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Items in insertion order.
    pub fn iter(&self) -> std::vec::IntoIter<&T> {
        let mut items = Vec::with_capacity(self.len);
        let mut cursor = self.tail.as_deref();
        while let Some(node) = cursor {
            items.push(&node.value);
            cursor = node.prev.as_deref();
        }
        items.reverse();
        items.into_iter()
    }
}

impl<T> Clone for Chain<T> {
    fn clone(&self) -> Self {
        Self {
            tail: self.tail.clone(),
            len: self.len,
        }
    }
}

impl<T> Default for Chain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Chain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> FromIterator<T> for Chain<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), |chain, v| chain.push(v))
    }
}
