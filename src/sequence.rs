use std::collections::VecDeque;

/// An ordered list of scripted values consumed one per matching request.
///
/// Consuming never fails: an empty sequence yields `None` and stays empty, a
/// single remaining value is returned forever, and longer sequences drop their
/// front value each time it is handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence<T> {
    values: VecDeque<T>,
}

impl<T: Clone> Sequence<T> {
    /// Creates a sequence from the given values, in order
    pub fn new(values: impl IntoIterator<Item = T>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Creates a sequence that repeats `value` indefinitely
    pub fn repeat(value: T) -> Self {
        Self::new([value])
    }

    /// Returns the front value, advancing past it only when more values remain behind it
    pub fn next_value(&mut self) -> Option<T> {
        let value = self.values.front().cloned();
        if self.values.len() > 1 {
            self.values.pop_front();
        }
        value
    }

    /// Value the next call to [`Sequence::next_value`] would return
    pub fn peek(&self) -> Option<&T> {
        self.values.front()
    }

    /// Number of values still queued
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copies the remaining values out in order
    pub fn to_vec(&self) -> Vec<T> {
        self.values.iter().cloned().collect()
    }
}

impl<T> Default for Sequence<T> {
    fn default() -> Self {
        Self {
            values: VecDeque::new(),
        }
    }
}

impl<T: Clone> From<Vec<T>> for Sequence<T> {
    fn from(values: Vec<T>) -> Self {
        Self::new(values)
    }
}

impl<T: Clone, const N: usize> From<[T; N]> for Sequence<T> {
    fn from(values: [T; N]) -> Self {
        Self::new(values)
    }
}

impl<T: Clone> FromIterator<T> for Sequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter)
    }
}
