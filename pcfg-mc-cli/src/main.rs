mod config;

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use log::info;
use pcfg_mc_core::evaluation::{evaluate, read_test_set};
use pcfg_mc_core::model::grammar_model::GrammarModel;
use pcfg_mc_core::model::loader::{DirectoryLoader, ModelLoader};
use pcfg_mc_core::model::scorer::Scorer;
use pcfg_mc_core::report::{PlotSeries, save_report};

fn main() -> Result<()> {
	let config = Config::parse();

	env_logger::Builder::from_default_env()
		.filter_level(config.log_level)
		.init();

	config.validate_paths()?;

	let mut loader = DirectoryLoader::new(&config.trained_model);
	if let Some(cache) = &config.model_cache {
		loader = loader.with_cache(cache);
	}
	let model = loader
		.load()
		.with_context(|| format!("Failed to load model {}", config.trained_model.display()))?;

	if config.prob_mode {
		return probability_lookup(&model);
	}

	let passwords = read_test_set(&config.test_set)
		.with_context(|| format!("Failed to read test set {}", config.test_set.display()))?;
	info!("Read {} test passwords from {}", passwords.len(), config.test_set.display());

	let evaluation = evaluate(&model, &passwords, &config.evaluation_config())?;

	save_report(&config.guess_crack_file, &evaluation.curve)
		.with_context(|| format!("Failed to write {}", config.guess_crack_file.display()))?;
	info!("Wrote {} curve points to {}", evaluation.curve.len(), config.guess_crack_file.display());

	let label = config.label.clone().unwrap_or_else(|| loader.name());
	PlotSeries::from_curve(&label, &evaluation.curve)
		.save(&config.save_gc_curve)
		.with_context(|| format!("Failed to write {}", config.save_gc_curve.display()))?;
	info!("Wrote plot series to {}", config.save_gc_curve.display());

	Ok(())
}

/// Reads passwords from stdin, one per line, and prints their probability
/// until the input ends.
fn probability_lookup(model: &GrammarModel) -> Result<()> {
	let scorer = Scorer::new(model);
	let stdin = io::stdin();
	let mut stdout = io::stdout();

	loop {
		write!(stdout, "Type in password\n>>>")?;
		stdout.flush()?;

		let mut line = String::new();
		if stdin.lock().read_line(&mut line)? == 0 {
			writeln!(stdout)?;
			return Ok(());
		}
		let password = line.trim_end_matches(['\r', '\n']);
		let log_prob = scorer.log_prob(password);
		writeln!(stdout, "{password}: {}, log prob: {log_prob}", scorer.probability(password))?;
	}
}
