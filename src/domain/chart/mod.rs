//! Pure transforms from a transaction history to chart buckets.
//!
//! history -> [`bucketizer::bucketize`] (classifying each transaction with
//! [`classifier::classify`]) -> [`y_domain::compute_domain`], and
//! [`zoom::zoom`] to narrow a displayed sequence.

pub mod bucketizer;
pub mod classifier;
pub mod y_domain;
pub mod zoom;

pub use bucketizer::bucketize;
pub use classifier::{classify, Flow};
pub use y_domain::compute_domain;
pub use zoom::{resolve_label, zoom, Zoomed};
