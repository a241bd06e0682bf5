use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::Parser;
use log::LevelFilter;
use pcfg_mc_core::evaluation::EvaluationConfig;

/// Command-line configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "pcfg-mc")]
#[command(about = "Monte Carlo guess-number estimation for PCFG password models")]
pub struct Config {
	/// Trained model directory
	#[arg(short = 'm', long)]
	pub trained_model: PathBuf,

	/// Password set to be cracked, one password per line
	#[arg(short = 't', long)]
	pub test_set: PathBuf,

	/// Number of passwords to sample (10000+ suggested)
	#[arg(short = 's', long, default_value = "10000")]
	pub sample_size: usize,

	/// Guess numbers larger than this bound are left out of the curve
	#[arg(short = 'u', long, default_value = "100000000000000000000")]
	pub upper_bound: u128,

	/// Output guess/crack report
	#[arg(short = 'f', long)]
	pub guess_crack_file: PathBuf,

	/// Output plot series (JSON) for the guess/crack curve
	#[arg(short = 'c', long)]
	pub save_gc_curve: PathBuf,

	/// Type in passwords and print their probability instead of evaluating
	#[arg(long)]
	pub prob_mode: bool,

	/// Seed for reproducible sampling
	#[arg(long)]
	pub seed: Option<u64>,

	/// Sampling worker threads (default: number of CPUs)
	#[arg(long)]
	pub threads: Option<usize>,

	/// Binary model cache, loaded if present and written otherwise
	#[arg(long)]
	pub model_cache: Option<PathBuf>,

	/// Curve label (default: the model directory name)
	#[arg(long)]
	pub label: Option<String>,

	/// Log level (off, error, warn, info, debug, trace)
	#[arg(long, default_value = "info", value_parser = clap::value_parser!(LevelFilter))]
	pub log_level: LevelFilter,
}

impl Config {
	/// Fails if an input path, or the directory of an output path, does not exist.
	pub fn validate_paths(&self) -> Result<()> {
		for input in [&self.trained_model, &self.test_set] {
			if !input.exists() {
				bail!("{} does not exist", input.display());
			}
		}
		for output in [&self.guess_crack_file, &self.save_gc_curve] {
			let parent = parent_dir(output);
			if !parent.is_dir() {
				bail!("directory {} of {} does not exist", parent.display(), output.display());
			}
		}
		Ok(())
	}

	pub fn evaluation_config(&self) -> EvaluationConfig {
		let mut config = EvaluationConfig {
			sample_size: self.sample_size,
			upper_bound: self.upper_bound,
			seed: self.seed,
			..EvaluationConfig::default()
		};
		if let Some(threads) = self.threads {
			config.workers = threads.max(1);
		}
		config
	}
}

/// Directory holding `path`; a bare file name lives in the current directory.
fn parent_dir(path: &Path) -> &Path {
	match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(args: &[&str]) -> Config {
		Config::try_parse_from(std::iter::once("pcfg-mc").chain(args.iter().copied())).unwrap()
	}

	#[test]
	fn defaults() {
		let config = parse(&["-m", "model", "-t", "test.txt", "-f", "gc.txt", "-c", "gc.json"]);
		assert_eq!(config.sample_size, 10_000);
		assert_eq!(config.upper_bound, 100_000_000_000_000_000_000);
		assert!(!config.prob_mode);
		assert_eq!(config.seed, None);
		assert_eq!(config.log_level, LevelFilter::Info);

		let evaluation = config.evaluation_config();
		assert_eq!(evaluation.sample_size, 10_000);
		assert!(evaluation.workers >= 1);
	}

	#[test]
	fn long_flags() {
		let config = parse(&[
			"--trained-model", "model",
			"--test-set", "test.txt",
			"--sample-size", "500",
			"--upper-bound", "1000000",
			"--guess-crack-file", "gc.txt",
			"--save-gc-curve", "gc.json",
			"--seed", "7",
			"--threads", "0",
			"--prob-mode",
		]);
		assert!(config.prob_mode);
		let evaluation = config.evaluation_config();
		assert_eq!(evaluation.sample_size, 500);
		assert_eq!(evaluation.upper_bound, 1_000_000);
		assert_eq!(evaluation.seed, Some(7));
		assert_eq!(evaluation.workers, 1);
	}

	#[test]
	fn log_level_is_validated() {
		let config = parse(&["-m", "m", "-t", "t", "-f", "f", "-c", "c", "--log-level", "debug"]);
		assert_eq!(config.log_level, LevelFilter::Debug);

		let typo = Config::try_parse_from(["pcfg-mc", "-m", "m", "-t", "t", "-f", "f", "-c", "c", "--log-level", "verbose"]);
		assert!(typo.is_err());
	}

	#[test]
	fn missing_inputs_fail_validation() {
		let dir = std::env::temp_dir();
		let config = parse(&[
			"-m", "/definitely/not/a/model",
			"-t", dir.to_str().unwrap(),
			"-f", "gc.txt",
			"-c", "gc.json",
		]);
		assert!(config.validate_paths().is_err());
	}

	#[test]
	fn bare_output_names_live_in_the_current_directory() {
		assert_eq!(parent_dir(Path::new("gc.txt")), Path::new("."));
		assert_eq!(parent_dir(Path::new("out/gc.txt")), Path::new("out"));
	}
}
