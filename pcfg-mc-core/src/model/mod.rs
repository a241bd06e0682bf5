//! Top-level module for the PCFG password model.
//!
//! This module provides:
//! - Character classes and the password tokenizer (`classifier`)
//! - The read-only trained tables (`GrammarModel`) and their builder
//! - Loaders building a model from text tables or a binary cache (`loader`)
//! - Probability scoring of arbitrary passwords (`Scorer`)
//! - Uniform sampling with model log-probabilities (`Sampler`)

/// Deterministic single-pass tokenizer splitting a password into
/// maximal runs of letters, digits and symbols.
pub mod classifier;

/// Structures, terminal slots and the immutable `GrammarModel`.
///
/// Models are assembled through `GrammarModelBuilder`, which validates
/// every probability and terminal before it reaches the tables.
pub mod grammar_model;

/// Model sources: the trained-model directory layout and the postcard cache.
pub mod loader;

/// Log2-probability of a password under a model.
pub mod scorer;

/// Uniform sampling of passwords, scored under the trained distribution.
///
/// Supports seeded runs and multithreaded generation.
pub mod sampler;

/// Cost of an event with the given probability, in bits (`-log2(p)`).
///
/// Probability 1 maps to `+0.0`.
pub(crate) fn cost(probability: f64) -> f64 {
	0.0 - probability.log2()
}
