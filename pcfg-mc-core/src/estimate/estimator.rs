use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::sampler::SampleSet;

/// How many of the lowest sorted entries are logged at debug level.
const DEBUG_PREVIEW: usize = 100;

/// Estimated guess number of a password.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Estimation {
	/// Number of guesses an attacker following the model needs, at least 1.
	Guesses(u128),
	/// The model gives the password zero probability: it is never guessed.
	Unreachable,
}

impl Estimation {
	/// Returns the guess number, `None` if unreachable.
	pub fn guesses(self) -> Option<u128> {
		match self {
			Self::Guesses(n) => Some(n),
			Self::Unreachable => None,
		}
	}
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EstimateError {
	#[error("sample set holds {actual} of {requested} samples, sampling must complete before estimation")]
	Incomplete { actual: usize, requested: usize },
	#[error("cannot estimate guess numbers from an empty sample set")]
	Empty,
}

/// Guess-number estimator prepared from one complete sample set.
///
/// Preparation sorts the sample log-probabilities ascending (most probable
/// first) and accumulates one weight per sample:
///
/// ```text
/// weight[i]    = 2^(logp[i] - log2(N)) = (1 / p_i) / N
/// positions[i] = weight[0] + ... + weight[i]
/// ```
///
/// `positions[i]` estimates how many passwords are at least as probable as
/// sample `i`. A query with log-probability `q` is answered with
/// `ceil(positions[idx])`, `idx` being the first sample strictly less
/// probable than `q` (ties go past every equal sample), clamped to the last
/// sample.
///
/// The clamp means a password less probable than every sample saturates at
/// the largest position instead of extrapolating. Positions beyond
/// `u128::MAX` saturate to it, which still lies above any curve bound.
///
/// ## Invariants
/// - `log_probs` is sorted ascending and non-empty
/// - `positions` has the same length and is non-decreasing
#[derive(Debug, Clone)]
pub struct GuessEstimator {
	log_probs: Vec<f64>,
	positions: Vec<f64>,
}

impl GuessEstimator {
	/// Prepares an estimator. Done once per sample set; queries are then
	/// `O(log N)`.
	///
	/// # Errors
	/// Returns an error if the set is not complete or is empty.
	pub fn new(samples: &SampleSet) -> Result<Self, EstimateError> {
		if !samples.is_complete() {
			return Err(EstimateError::Incomplete { actual: samples.len(), requested: samples.requested() });
		}
		if samples.is_empty() {
			return Err(EstimateError::Empty);
		}

		let mut log_probs: Vec<f64> = samples.samples().iter().map(|s| s.log_prob).collect();
		log_probs.sort_by(f64::total_cmp);

		let log_n = (log_probs.len() as f64).log2();
		let mut total = 0.0;
		let positions: Vec<f64> = log_probs
			.iter()
			.map(|log_prob| {
				total += (log_prob - log_n).exp2();
				total
			})
			.collect();

		let preview = DEBUG_PREVIEW.min(log_probs.len());
		debug!("log_probs[0..{preview}]: {:?}", &log_probs[..preview]);
		debug!("positions[0..{preview}]: {:?}", &positions[..preview]);

		Ok(Self { log_probs, positions })
	}

	/// Estimates the guess number of a password from its log2-probability.
	pub fn estimate(&self, log_prob: f64) -> Estimation {
		if !log_prob.is_finite() {
			return Estimation::Unreachable;
		}

		let last = self.positions.len() - 1;
		let idx = self.log_probs.partition_point(|sample| *sample <= log_prob).min(last);
		let position = self.positions[idx];

		if position.is_finite() {
			Estimation::Guesses(position.ceil() as u128)
		} else {
			Estimation::Unreachable
		}
	}

	/// Estimates a batch of log-probabilities against the same prepared view.
	pub fn estimate_all<I>(&self, log_probs: I) -> Vec<Estimation>
	where
		I: IntoIterator<Item = f64>,
	{
		log_probs.into_iter().map(|log_prob| self.estimate(log_prob)).collect()
	}

	/// Sample log-probabilities, sorted ascending.
	pub fn log_probs(&self) -> &[f64] {
		&self.log_probs
	}

	/// Cumulative positions matching [`GuessEstimator::log_probs`].
	pub fn positions(&self) -> &[f64] {
		&self.positions
	}
}
