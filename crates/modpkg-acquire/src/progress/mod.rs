//! Download progress aggregation.
//!
//! One tracker spans every artifact of a package, so percentages are
//! computed over the sum of all declared sizes.

mod tracker;

pub use tracker::ProgressTracker;
