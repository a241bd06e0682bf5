use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cost;
use super::grammar_model::{GrammarModel, TerminalSlot};

/// Default number of samples drawn per evaluation.
pub const DEFAULT_SAMPLE_SIZE: usize = 10_000;

/// A progress line is logged every `PROGRESS_STEP` generated samples.
const PROGRESS_STEP: usize = 5_000;

/// A generated password and its log2-probability under the trained model.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Sample {
	pub password: String,
	pub log_prob: f64,
}

/// The outcome of one sampling run: an ordered list of samples and the
/// number of samples that was requested.
///
/// A `SampleSet` is a value: running the sampler again produces a new set,
/// it never grows an existing one. Estimation refuses sets that are not
/// complete (see [`SampleSet::is_complete`]).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SampleSet {
	samples: Vec<Sample>,
	requested: usize,
}

impl SampleSet {
	/// Wraps samples coming from another source (a file, a test...).
	pub fn from_samples(samples: Vec<Sample>, requested: usize) -> Self {
		Self { samples, requested }
	}

	pub fn samples(&self) -> &[Sample] {
		&self.samples
	}

	/// Number of samples that was asked for.
	pub fn requested(&self) -> usize {
		self.requested
	}

	pub fn len(&self) -> usize {
		self.samples.len()
	}

	pub fn is_empty(&self) -> bool {
		self.samples.is_empty()
	}

	/// True when the set holds exactly the requested number of samples.
	pub fn is_complete(&self) -> bool {
		self.samples.len() == self.requested
	}
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SampleError {
	#[error("sample size must be at least 1")]
	ZeroSamples,
	#[error("no structure of the model has terminals for all of its slots")]
	NothingToSample,
	#[error("sampling produced {produced} of {requested} samples")]
	Incomplete { produced: usize, requested: usize },
}

/// One structure that can be generated: its cost and the terminal pools of its slots.
#[derive(Debug)]
struct Candidate {
	cost: f64,
	pools: Vec<usize>,
}

/// Draws passwords uniformly from the grammar and scores them under the
/// trained distribution.
///
/// Each sample picks a structure uniformly among the generable structures,
/// then one terminal uniformly per slot. Its `log_prob` is the sum of the
/// trained costs of the picked structure and terminals: generation is
/// uniform, scoring is not. The estimator relies on exactly that pairing.
///
/// ## Invariants
/// - `candidates` is non-empty
/// - every pool referenced by a candidate is non-empty
#[derive(Debug)]
pub struct Sampler<'a> {
	candidates: Vec<Candidate>,
	/// Terminal pools with precomputed costs, one per slot in use.
	pools: Vec<Vec<(&'a str, f64)>>,
	workers: usize,
}

impl<'a> Sampler<'a> {
	/// Prepares the uniform views of a model.
	///
	/// Structures with a slot that has no terminals can never be generated and
	/// are left out of the structure draw (with a warning).
	///
	/// # Errors
	/// Returns `SampleError::NothingToSample` if no structure can be generated.
	pub fn new(model: &'a GrammarModel) -> Result<Self, SampleError> {
		let mut pool_index: HashMap<TerminalSlot, usize> = HashMap::new();
		let mut pools: Vec<Vec<(&'a str, f64)>> = Vec::new();
		let mut candidates = Vec::new();
		let mut skipped = 0;

		'structures: for (structure, probability) in model.structures() {
			let mut slots = Vec::with_capacity(structure.slots().len());
			for slot in structure.slots() {
				let index = match pool_index.get(slot) {
					Some(index) => *index,
					None => match model.terminals(*slot) {
						Some(table) if !table.is_empty() => {
							pools.push(table.iter().map(|(t, p)| (t.as_str(), cost(*p))).collect());
							pool_index.insert(*slot, pools.len() - 1);
							pools.len() - 1
						}
						_ => {
							debug!("Structure {structure} has no terminals for slot {slot}");
							skipped += 1;
							continue 'structures;
						}
					},
				};
				slots.push(index);
			}
			candidates.push(Candidate { cost: cost(probability), pools: slots });
		}

		if skipped > 0 {
			warn!("{skipped} structures have empty terminal slots and will never be sampled");
		}
		if candidates.is_empty() {
			return Err(SampleError::NothingToSample);
		}

		Ok(Self { candidates, pools, workers: num_cpus::get() })
	}

	/// Sets the number of worker threads used by [`Sampler::sample`] (at least 1).
	pub fn with_workers(mut self, workers: usize) -> Self {
		self.workers = workers.max(1);
		self
	}

	/// Number of structures the sampler draws from.
	pub fn structure_count(&self) -> usize {
		self.candidates.len()
	}

	/// Generates one password.
	pub fn generate_one<R: Rng + ?Sized>(&self, rng: &mut R) -> Sample {
		let candidate = &self.candidates[rng.random_range(0..self.candidates.len())];

		let mut password = String::new();
		let mut log_prob = candidate.cost;
		for &pool in &candidate.pools {
			let pool = &self.pools[pool];
			let (terminal, cost) = pool[rng.random_range(0..pool.len())];
			password.push_str(terminal);
			log_prob += cost;
		}

		Sample { password, log_prob }
	}

	/// Draws `n` independent samples.
	///
	/// Generation is split into chunks across worker threads. Each chunk has
	/// its own `StdRng`, seeded from `seed` (or from the thread RNG when
	/// `None`) plus the chunk index, and chunks are concatenated in order: a
	/// seeded run is reproducible for a given worker count.
	///
	/// # Errors
	/// Returns `SampleError::ZeroSamples` if `n == 0`.
	pub fn sample(&self, n: usize, seed: Option<u64>) -> Result<SampleSet, SampleError> {
		if n == 0 {
			return Err(SampleError::ZeroSamples);
		}

		let base_seed = seed.unwrap_or_else(|| rand::rng().random());
		let workers = self.workers.clamp(1, n);
		let chunk_size = n.div_ceil(workers);
		let progress = AtomicUsize::new(0);
		debug!("Sampling {n} passwords with {workers} workers (seed {base_seed})");

		let (tx, rx) = mpsc::channel();
		thread::scope(|scope| {
			for (index, start) in (0..n).step_by(chunk_size).enumerate() {
				let count = chunk_size.min(n - start);
				let tx = tx.clone();
				let progress = &progress;

				scope.spawn(move || {
					let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(index as u64));
					let mut chunk = Vec::with_capacity(count);
					for _ in 0..count {
						chunk.push(self.generate_one(&mut rng));
						let done = progress.fetch_add(1, Ordering::Relaxed) + 1;
						if done % PROGRESS_STEP == 0 {
							info!("Progress: {:5.2}%", done as f64 / n as f64 * 100.0);
						}
					}
					// The receiver lives until every worker is joined.
					let _ = tx.send((index, chunk));
				});
			}
		});
		drop(tx);

		let mut chunks: Vec<(usize, Vec<Sample>)> = rx.iter().collect();
		chunks.sort_by_key(|(index, _)| *index);
		let samples: Vec<Sample> = chunks.into_iter().flat_map(|(_, chunk)| chunk).collect();

		if samples.len() != n {
			return Err(SampleError::Incomplete { produced: samples.len(), requested: n });
		}
		Ok(SampleSet::from_samples(samples, n))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::classifier::CharClass;
	use crate::model::scorer::Scorer;
	use crate::test_utils::{single_path_model, structure, toy_model};

	#[test]
	fn certain_model_samples_cost_nothing() {
		let model = single_path_model();
		let set = Sampler::new(&model).unwrap().sample(3, Some(1)).unwrap();

		assert!(set.is_complete());
		assert_eq!(set.len(), 3);
		for sample in set.samples() {
			assert_eq!(sample.password, "abc7");
			assert_eq!(sample.log_prob, 0.0);
		}
	}

	#[test]
	fn samples_rescore_to_their_log_prob() {
		let model = toy_model();
		let scorer = Scorer::new(&model);
		let set = Sampler::new(&model).unwrap().sample(500, Some(7)).unwrap();

		for sample in set.samples() {
			assert_eq!(scorer.log_prob(&sample.password), sample.log_prob, "{}", sample.password);
		}
	}

	#[test]
	fn seeded_runs_are_reproducible() {
		let model = toy_model();
		let sampler = Sampler::new(&model).unwrap().with_workers(4);

		let first = sampler.sample(1_000, Some(42)).unwrap();
		let second = sampler.sample(1_000, Some(42)).unwrap();
		let other = sampler.sample(1_000, Some(43)).unwrap();

		assert_eq!(first, second);
		assert_ne!(first, other);
	}

	#[test]
	fn repeated_runs_never_accumulate() {
		let model = toy_model();
		let sampler = Sampler::new(&model).unwrap();

		for n in [10, 10, 3] {
			let set = sampler.sample(n, None).unwrap();
			assert_eq!(set.len(), n);
			assert_eq!(set.requested(), n);
		}
	}

	#[test]
	fn worker_count_larger_than_sample_size() {
		let model = toy_model();
		let set = Sampler::new(&model).unwrap().with_workers(64).sample(5, Some(3)).unwrap();
		assert_eq!(set.len(), 5);
	}

	#[test]
	fn structures_are_drawn_uniformly() {
		let model = toy_model();
		let set = Sampler::new(&model).unwrap().sample(6_000, Some(11)).unwrap();

		// Three structures: each should get about a third of the draws,
		// whatever its trained probability.
		let digits_only = set.samples().iter().filter(|s| s.password.chars().all(|c| c.is_ascii_digit())).count();
		assert!((1_700..2_300).contains(&digits_only), "{digits_only}");
	}

	#[test]
	fn zero_samples_is_rejected() {
		let model = toy_model();
		assert_eq!(Sampler::new(&model).unwrap().sample(0, None), Err(SampleError::ZeroSamples));
	}

	#[test]
	fn structures_without_terminals_are_skipped() {
		let mut builder = GrammarModel::builder();
		builder.structure(structure("DDD"), 0.5).unwrap();
		builder.structure(structure("SS"), 0.5).unwrap();
		builder.terminal(TerminalSlot::new(CharClass::Symbol, 2), "!!", 1.0).unwrap();
		let model = builder.build();

		let sampler = Sampler::new(&model).unwrap();
		assert_eq!(sampler.structure_count(), 1);
		let set = sampler.sample(20, Some(5)).unwrap();
		assert!(set.samples().iter().all(|s| s.password == "!!"));
	}

	#[test]
	fn model_without_generable_structure_is_rejected() {
		let mut builder = GrammarModel::builder();
		builder.structure(structure("DDD"), 1.0).unwrap();
		let model = builder.build();
		assert_eq!(Sampler::new(&model).unwrap_err(), SampleError::NothingToSample);
	}
}
