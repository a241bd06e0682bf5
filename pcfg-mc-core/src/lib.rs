//! Monte Carlo guess-number estimation for PCFG password models.
//!
//! This crate provides everything needed to measure how strong a test set of
//! passwords is against a trained probabilistic grammar, including:
//! - The read-only grammar model and its loaders (text tables, binary cache)
//! - Password classification and probability scoring
//! - Uniform sampling with importance weights
//! - Guess-number estimation and guess/crack curve aggregation
//!
//! The text-file helpers are kept internal; everything else is exposed so that
//! other front-ends can reuse the pipeline piece by piece.

/// Grammar model, loaders, classifier, scorer and sampler.
pub mod model;

/// Guess-number estimation and guess/crack curves.
pub mod estimate;

/// Guess/crack report files and plot series.
pub mod report;

/// End-to-end evaluation of a test set against a model.
pub mod evaluation;

/// I/O utilities (file loading, path helpers).
///
/// Not exposed
pub(crate) mod io;

#[cfg(test)]
pub(crate) mod test_utils;
