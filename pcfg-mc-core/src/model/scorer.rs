use log::trace;

use super::classifier::classify;
use super::cost;
use super::grammar_model::{GrammarModel, Structure, TerminalSlot};

/// Log-probability returned for passwords the model cannot produce.
pub const UNREACHABLE: f64 = f64::INFINITY;

/// Computes the log2-probability a model assigns to arbitrary passwords.
///
/// Scores are costs in bits: `-log2(p)`, so lower means more probable.
/// A password the model cannot produce scores [`UNREACHABLE`]; that covers
/// unclassifiable characters, unknown structures and unknown terminals,
/// and is a regular outcome rather than an error.
#[derive(Debug, Clone, Copy)]
pub struct Scorer<'a> {
	model: &'a GrammarModel,
}

impl<'a> Scorer<'a> {
	pub fn new(model: &'a GrammarModel) -> Self {
		Self { model }
	}

	/// Returns `-log2(P(password))`, or [`UNREACHABLE`].
	///
	/// The structure cost comes first, then each terminal cost in password
	/// order, so a sampled password re-scores to exactly its sampled value.
	pub fn log_prob(&self, password: &str) -> f64 {
		let tokens = match classify(password) {
			Ok(tokens) => tokens,
			Err(e) => {
				trace!("{password:?} is unreachable: {e}");
				return UNREACHABLE;
			}
		};

		let Some(probability) = Structure::from_tokens(&tokens).and_then(|s| self.model.structure_probability(&s)) else {
			return UNREACHABLE;
		};

		let mut log_prob = cost(probability);
		for token in &tokens {
			let slot = TerminalSlot::new(token.class, token.text.len());
			match self.model.terminal_probability(slot, token.text) {
				Some(probability) => log_prob += cost(probability),
				None => return UNREACHABLE,
			}
		}
		log_prob
	}

	/// Returns `P(password)`, `0.0` for unreachable passwords.
	pub fn probability(&self, password: &str) -> f64 {
		let log_prob = self.log_prob(password);
		if log_prob.is_finite() { (-log_prob).exp2() } else { 0.0 }
	}
}
