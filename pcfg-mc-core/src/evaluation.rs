//! End-to-end evaluation: sample the model, score every test password,
//! estimate guess numbers and build the guess/crack curve.

use std::io;
use std::path::Path;

use log::{info, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::estimate::curve::{CurvePoint, DEFAULT_UPPER_BOUND, build_curve};
use crate::estimate::estimator::{EstimateError, Estimation, GuessEstimator};
use crate::model::grammar_model::GrammarModel;
use crate::model::sampler::{DEFAULT_SAMPLE_SIZE, SampleError, SampleSet, Sampler};
use crate::model::scorer::Scorer;

/// A progress line is logged every `PROGRESS_STEP` evaluated passwords.
const PROGRESS_STEP: usize = 10_000;

/// Parameters of one evaluation run.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EvaluationConfig {
	/// Number of Monte Carlo samples.
	pub sample_size: usize,
	/// Guess numbers above this bound are left out of the curve.
	pub upper_bound: u128,
	/// Seed for reproducible sampling.
	pub seed: Option<u64>,
	/// Sampling worker threads.
	pub workers: usize,
}

impl Default for EvaluationConfig {
	fn default() -> Self {
		Self {
			sample_size: DEFAULT_SAMPLE_SIZE,
			upper_bound: DEFAULT_UPPER_BOUND,
			seed: None,
			workers: num_cpus::get(),
		}
	}
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
	#[error(transparent)]
	Sample(#[from] SampleError),
	#[error(transparent)]
	Estimate(#[from] EstimateError),
}

/// Result of evaluating a test set.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Evaluation {
	/// One estimation per test password, in input order.
	pub estimations: Vec<Estimation>,
	/// Number of test passwords, the denominator of every percentage.
	pub test_set_size: usize,
	pub curve: Vec<CurvePoint>,
}

impl Evaluation {
	/// Number of passwords the model cannot produce.
	pub fn unreachable(&self) -> usize {
		self.estimations.iter().filter(|e| **e == Estimation::Unreachable).count()
	}
}

/// A scorer and an estimator prepared once, shared by every query.
#[derive(Debug)]
pub struct Evaluator<'a> {
	scorer: Scorer<'a>,
	estimator: GuessEstimator,
}

impl<'a> Evaluator<'a> {
	/// Prepares the estimator from a complete sample set of `model`.
	///
	/// # Errors
	/// Returns an error if the sample set is incomplete or empty.
	pub fn new(model: &'a GrammarModel, samples: &SampleSet) -> Result<Self, EstimateError> {
		Ok(Self { scorer: Scorer::new(model), estimator: GuessEstimator::new(samples)? })
	}

	/// Estimates the guess number of one password.
	pub fn estimate(&self, password: &str) -> Estimation {
		self.estimator.estimate(self.scorer.log_prob(password))
	}

	/// Evaluates a whole test set and builds its curve.
	pub fn evaluate<I, S>(&self, passwords: I, upper_bound: u128) -> Evaluation
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut estimations = Vec::new();
		for password in passwords {
			let password = password.as_ref();
			let estimation = self.estimate(password);
			trace!("{password:?}: {estimation:?}");
			estimations.push(estimation);
			if estimations.len() % PROGRESS_STEP == 0 {
				info!("Progress: {} passwords evaluated", estimations.len());
			}
		}

		let test_set_size = estimations.len();
		let curve = build_curve(&estimations, test_set_size, upper_bound);
		Evaluation { estimations, test_set_size, curve }
	}
}

/// Samples `model` and evaluates `passwords` in one go.
///
/// # Errors
/// Returns an error if sampling fails (zero sample size, nothing to sample).
pub fn evaluate<I, S>(model: &GrammarModel, passwords: I, config: &EvaluationConfig) -> Result<Evaluation, EvaluationError>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let sampler = Sampler::new(model)?.with_workers(config.workers);
	info!("Sampling {} passwords from {} structures", config.sample_size, sampler.structure_count());
	let samples = sampler.sample(config.sample_size, config.seed)?;

	let evaluator = Evaluator::new(model, &samples)?;
	let evaluation = evaluator.evaluate(passwords, config.upper_bound);
	info!(
		"Evaluated {} passwords: {} unreachable, {} curve points",
		evaluation.test_set_size,
		evaluation.unreachable(),
		evaluation.curve.len()
	);
	Ok(evaluation)
}

/// Reads a test set: one password per line, line endings stripped.
///
/// Lines that are not valid UTF-8 are kept with U+FFFD replacements; such
/// passwords are unreachable but still count in the test set size.
pub fn read_test_set<P: AsRef<Path>>(path: P) -> io::Result<Vec<String>> {
	crate::io::read_file_lossy(path)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_utils::{single_path_model, toy_model};

	#[test]
	fn certain_model_cracks_its_only_password_in_one_guess() {
		let model = single_path_model();
		let config = EvaluationConfig { sample_size: 3, seed: Some(1), ..EvaluationConfig::default() };

		let evaluation = evaluate(&model, ["abc7", "abc8", "ab\nc7", "abc7"], &config).unwrap();
		assert_eq!(
			evaluation.estimations,
			vec![Estimation::Guesses(1), Estimation::Unreachable, Estimation::Unreachable, Estimation::Guesses(1)]
		);
		assert_eq!(evaluation.unreachable(), 2);
		assert_eq!(evaluation.curve, vec![CurvePoint { guesses: 1, cracked: 2, percentage: 50.0 }]);
	}

	#[test]
	fn more_probable_passwords_need_fewer_guesses() {
		let model = toy_model();
		let config = EvaluationConfig { sample_size: 2_000, seed: Some(5), ..EvaluationConfig::default() };
		let evaluation = evaluate(&model, ["1234", "cat12", "owl@"], &config).unwrap();

		// 1234: 0.3 * 0.5, cat12: 0.5 / 3 * 0.6, owl@: 0.2 / 3 * 0.25
		let [strong, medium, weak] = [0, 1, 2].map(|i| evaluation.estimations[i].guesses().unwrap());
		assert!(strong <= medium && medium <= weak, "{strong} {medium} {weak}");
	}

	#[test]
	fn zero_sample_size_is_an_error() {
		let model = toy_model();
		let config = EvaluationConfig { sample_size: 0, ..EvaluationConfig::default() };
		let err = evaluate(&model, ["cat12"], &config).unwrap_err();
		assert_eq!(err, EvaluationError::Sample(SampleError::ZeroSamples));
	}

	#[test]
	fn evaluator_refuses_partial_sample_sets() {
		let model = toy_model();
		let partial = SampleSet::from_samples(Vec::new(), 10);
		assert!(matches!(Evaluator::new(&model, &partial), Err(EstimateError::Incomplete { actual: 0, requested: 10 })));
	}

	#[test]
	fn test_set_lines_are_stripped() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("test.txt");
		std::fs::write(&path, "cat12\r\n1234\n").unwrap();
		assert_eq!(read_test_set(&path).unwrap(), vec!["cat12", "1234"]);
	}

	#[test]
	fn non_utf8_password_is_unreachable_not_fatal() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("test.txt");
		std::fs::write(&path, b"cat12\ncaf\xe9\n1234\n").unwrap();

		let passwords = read_test_set(&path).unwrap();
		assert_eq!(passwords.len(), 3);

		let model = toy_model();
		let config = EvaluationConfig { sample_size: 500, seed: Some(2), ..EvaluationConfig::default() };
		let evaluation = evaluate(&model, &passwords, &config).unwrap();
		assert_eq!(evaluation.test_set_size, 3);
		assert_eq!(evaluation.estimations[1], Estimation::Unreachable);
		assert!(evaluation.estimations[0].guesses().is_some());
		assert_eq!(evaluation.curve.last().map(|p| p.cracked), Some(2));
	}
}
