//! Ordered-list helpers used by reports, dictionaries and mail recipients.

use std::cmp::Ordering;

/// Merge two ordered lists, dropping duplicates.
///
/// The result holds the elements of `first` followed by the elements of
/// `second` that are not already present, each kept at its first appearance.
pub fn merge_lists<T: PartialEq + Clone>(first: &[T], second: &[T]) -> Vec<T> {
    let mut merged: Vec<T> = Vec::with_capacity(first.len() + second.len());
    for item in first.iter().chain(second) {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}

/// Compare two lists with an element comparator.
///
/// Lists of different length order by length alone, shorter first. Lists of
/// equal length order by the first element pair that does not compare equal.
pub fn compare_lists<T, F>(left: &[T], right: &[T], mut compare: F) -> Ordering
where
    F: FnMut(&T, &T) -> Ordering,
{
    if left.len() != right.len() {
        return left.len().cmp(&right.len());
    }
    left.iter()
        .zip(right)
        .map(|(a, b)| compare(a, b))
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Reusable list comparator holding its element comparator, for use with
/// `sort_by`.
#[derive(Debug, Clone, Copy)]
pub struct ListComparator<F> {
    element: F,
}

impl<F> ListComparator<F> {
    pub fn new(element: F) -> Self {
        Self { element }
    }

    pub fn compare<T>(&self, left: &[T], right: &[T]) -> Ordering
    where
        F: Fn(&T, &T) -> Ordering,
    {
        compare_lists(left, right, &self.element)
    }
}

impl ListComparator<fn(&String, &String) -> Ordering> {
    /// Comparator over lists of strings in natural order.
    pub fn natural() -> Self {
        Self::new(|a: &String, b: &String| a.cmp(b))
    }
}
