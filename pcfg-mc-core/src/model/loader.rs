use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;

use super::classifier::CharClass;
use super::grammar_model::{GrammarModel, GrammarModelBuilder, ParseStructureError, Structure, TableError, TerminalSlot};
use crate::io;

/// Dictionary seeding the uniform letter terminals, relative to the model root.
pub const DICTIONARY_FILE: &str = "dictionary.txt";
/// Structures file, relative to the model root.
pub const STRUCTURES_FILE: &str = "model/grammar/structures.txt";
/// Per-length digit terminal files, relative to the model root.
pub const DIGITS_DIR: &str = "model/digits";
/// Per-length symbol terminal files, relative to the model root.
pub const SYMBOLS_DIR: &str = "model/special";
/// Optional per-length letter terminal files, relative to the model root.
pub const LETTERS_DIR: &str = "model/letters";

/// Errors raised while building a `GrammarModel` from a model source.
///
/// All of them are fatal: no sampling happens on a partially loaded model.
#[derive(Error, Debug)]
pub enum LoadError {
	#[error("failed to read {}: {source}", .path.display())]
	Io { path: PathBuf, source: std::io::Error },

	#[error("{}:{line}: expected `<key>\\t<probability>`, got {content:?}", .path.display())]
	MalformedLine { path: PathBuf, line: usize, content: String },

	#[error("{}:{line}: invalid probability {value:?}", .path.display())]
	InvalidProbability { path: PathBuf, line: usize, value: String },

	#[error("{}:{line}: invalid structure {structure:?}: {source}", .path.display())]
	InvalidStructure { path: PathBuf, line: usize, structure: String, source: ParseStructureError },

	#[error("{}:{line}: {source}", .path.display())]
	Table { path: PathBuf, line: usize, source: TableError },

	#[error("terminal file {} is not named `<length>.txt`", .path.display())]
	TerminalFilename { path: PathBuf },

	#[error("failed to decode binary model {}: {source}", .path.display())]
	Decode { path: PathBuf, source: postcard::Error },
}

/// A source of trained tables.
///
/// Implementations only differ in where the tables come from; everything
/// downstream (scorer, sampler, estimator) only sees the `GrammarModel`.
pub trait ModelLoader {
	/// Builds the model.
	///
	/// # Errors
	/// Returns a `LoadError` on I/O failures or malformed content.
	fn load(&self) -> Result<GrammarModel, LoadError>;
}

/// Loads a trained-model directory:
///
/// ```text
/// <root>/dictionary.txt                  one word per line
/// <root>/model/grammar/structures.txt    <structure>\t<probability>
/// <root>/model/digits/<n>.txt            <terminal>\t<probability>
/// <root>/model/special/<n>.txt           <terminal>\t<probability>
/// <root>/model/letters/<n>.txt           optional, same format
/// ```
///
/// Missing terminal directories are treated as empty, and zero-probability
/// entries are skipped with a warning. With a cache path set,
/// the binary cache is loaded when it exists, and written after a text load
/// otherwise.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
	root: PathBuf,
	cache: Option<PathBuf>,
}

impl DirectoryLoader {
	/// Creates a loader for a model directory. `"."` resolves to the current directory.
	pub fn new<P: AsRef<Path>>(root: P) -> Self {
		Self { root: io::normalize_folder(root), cache: None }
	}

	/// Uses (and fills) a postcard cache file.
	pub fn with_cache<P: AsRef<Path>>(mut self, cache: P) -> Self {
		self.cache = Some(cache.as_ref().to_path_buf());
		self
	}

	/// Model name derived from the directory name.
	pub fn name(&self) -> String {
		io::get_filename(&self.root).unwrap_or_else(|_| self.root.display().to_string())
	}

	fn load_tables(&self) -> Result<GrammarModel, LoadError> {
		let mut builder = GrammarModel::builder();

		let dictionary_path = self.root.join(DICTIONARY_FILE);
		let words = read_lines(&dictionary_path)?;
		debug!("Read {} dictionary lines from {}", words.len(), dictionary_path.display());
		builder.dictionary(&words);

		load_structures(&mut builder, &self.root.join(STRUCTURES_FILE))?;
		load_terminals(&mut builder, &self.root.join(DIGITS_DIR), CharClass::Digit)?;
		load_terminals(&mut builder, &self.root.join(SYMBOLS_DIR), CharClass::Symbol)?;
		load_terminals(&mut builder, &self.root.join(LETTERS_DIR), CharClass::Letter)?;

		Ok(builder.build())
	}
}

impl ModelLoader for DirectoryLoader {
	fn load(&self) -> Result<GrammarModel, LoadError> {
		if let Some(cache) = &self.cache {
			if cache.exists() {
				info!("Loading cached model from {}", cache.display());
				return BinaryLoader::new(cache).load();
			}
		}

		let model = self.load_tables()?;
		info!(
			"Loaded model {}: {} structures, {} terminals",
			self.name(),
			model.structure_count(),
			model.terminal_count()
		);

		if let Some(cache) = &self.cache {
			match model.to_bytes().map(|bytes| std::fs::write(cache, bytes)) {
				Ok(Ok(())) => info!("Wrote model cache {}", cache.display()),
				Ok(Err(e)) => warn!("Could not write model cache {}: {e}", cache.display()),
				Err(e) => warn!("Could not encode model cache: {e}"),
			}
		}

		Ok(model)
	}
}

/// Loads a model previously written with [`GrammarModel::to_bytes`].
#[derive(Debug, Clone)]
pub struct BinaryLoader {
	path: PathBuf,
}

impl BinaryLoader {
	pub fn new<P: AsRef<Path>>(path: P) -> Self {
		Self { path: path.as_ref().to_path_buf() }
	}
}

impl ModelLoader for BinaryLoader {
	fn load(&self) -> Result<GrammarModel, LoadError> {
		let bytes = std::fs::read(&self.path).map_err(|source| LoadError::Io { path: self.path.clone(), source })?;
		GrammarModel::from_bytes(&bytes).map_err(|source| LoadError::Decode { path: self.path.clone(), source })
	}
}

fn read_lines(path: &Path) -> Result<Vec<String>, LoadError> {
	io::read_file(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })
}

/// Splits a `<key>\t<probability>` line. The probability must lie in `[0, 1]`.
///
/// Lines are numbered from 1 in errors.
fn split_entry<'a>(path: &Path, index: usize, line: &'a str) -> Result<(&'a str, f64), LoadError> {
	let mut fields = line.split('\t');
	let (Some(key), Some(value), None) = (fields.next(), fields.next(), fields.next()) else {
		return Err(LoadError::MalformedLine { path: path.to_path_buf(), line: index + 1, content: line.to_owned() });
	};

	let probability = value
		.trim()
		.parse::<f64>()
		.ok()
		.filter(|p| (0.0..=1.0).contains(p))
		.ok_or_else(|| LoadError::InvalidProbability {
			path: path.to_path_buf(),
			line: index + 1,
			value: value.to_owned(),
		})?;

	Ok((key, probability))
}

/// Zero-probability entries are left out of the model, so they score as missing.
fn warn_zero_entries(path: &Path, zeros: usize) {
	if zeros > 0 {
		warn!("Skipped {zeros} zero-probability entries in {}", path.display());
	}
}

fn load_structures(builder: &mut GrammarModelBuilder, path: &Path) -> Result<(), LoadError> {
	let mut zeros = 0;
	for (index, line) in read_lines(path)?.iter().enumerate() {
		let (key, probability) = split_entry(path, index, line)?;
		let structure: Structure = key.parse().map_err(|source| LoadError::InvalidStructure {
			path: path.to_path_buf(),
			line: index + 1,
			structure: key.to_owned(),
			source,
		})?;
		if probability == 0.0 {
			zeros += 1;
			continue;
		}
		builder
			.structure(structure, probability)
			.map_err(|source| LoadError::Table { path: path.to_path_buf(), line: index + 1, source })?;
	}
	warn_zero_entries(path, zeros);
	Ok(())
}

/// Parses a terminal filename (`<positive-integer>.txt`) into a terminal length.
fn terminal_length(filename: &str) -> Option<usize> {
	let digits = filename.strip_suffix(".txt")?;
	if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
		return None;
	}
	digits.parse().ok().filter(|n| *n > 0)
}

fn load_terminals(builder: &mut GrammarModelBuilder, dir: &Path, class: CharClass) -> Result<(), LoadError> {
	if !dir.is_dir() {
		if class != CharClass::Letter {
			warn!("No terminal directory at {}, no {:?} terminals loaded", dir.display(), class);
		}
		return Ok(());
	}

	let files = io::list_files(dir).map_err(|source| LoadError::Io { path: dir.to_path_buf(), source })?;
	for file in files {
		let path = dir.join(&file);
		let length = terminal_length(&file).ok_or_else(|| LoadError::TerminalFilename { path: path.clone() })?;
		let slot = TerminalSlot::new(class, length);

		let lines = read_lines(&path)?;
		let mut zeros = 0;
		for (index, line) in lines.iter().enumerate() {
			let (terminal, probability) = split_entry(&path, index, line)?;
			if probability == 0.0 {
				zeros += 1;
				continue;
			}
			builder
				.terminal(slot, terminal, probability)
				.map_err(|source| LoadError::Table { path: path.clone(), line: index + 1, source })?;
		}
		warn_zero_entries(&path, zeros);
		debug!("Loaded {} terminals for slot {slot} from {}", lines.len() - zeros, path.display());
	}
	Ok(())
}
