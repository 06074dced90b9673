use super::y_domain::compute_domain;
use crate::domain::models::{Bucket, YDomain};

/// A narrowed slice of the visible buckets and its domain.
#[derive(Clone, Debug, PartialEq)]
pub struct Zoomed {
    pub buckets: Vec<Bucket>,
    pub domain: Option<YDomain>,
}

/// Position of the first bucket labelled `label`.
pub fn resolve_label(buckets: &[Bucket], label: &str) -> Option<usize> {
    buckets.iter().position(|b| b.label == label)
}

/// Narrows `current` to the inclusive range between `left` and `right`.
///
/// The two ends may come in either order. Returns `None`, meaning the view
/// stays as it is, when an index is out of bounds or both ends coincide.
pub fn zoom(current: &[Bucket], left: usize, right: usize) -> Option<Zoomed> {
    let (left, right) = if left > right {
        (right, left)
    } else {
        (left, right)
    };
    if left == right || right >= current.len() {
        return None;
    }

    let buckets = current[left..=right].to_vec();
    let domain = compute_domain(&buckets);
    Some(Zoomed { buckets, domain })
}
