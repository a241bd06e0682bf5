//! Monte Carlo guess numbers and guess/crack curves.

/// Guess-number estimation from a prepared sample set.
pub mod estimator;

/// Aggregation of guess numbers into a cumulative cracked curve.
pub mod curve;
