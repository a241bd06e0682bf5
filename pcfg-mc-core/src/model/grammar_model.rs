use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::classifier::{CharClass, Token};

/// A (class, run-length) pair: one slot of a structure, and the key of a terminal table.
///
/// Formatted the same way as a single-run structure, e.g. three digits → `DDD`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TerminalSlot {
	pub class: CharClass,
	pub length: usize,
}

impl TerminalSlot {
	pub fn new(class: CharClass, length: usize) -> Self {
		Self { class, length }
	}

	/// Returns true if `terminal` has exactly `length` characters, all of class `class`.
	pub fn fits(&self, terminal: &str) -> bool {
		terminal.chars().count() == self.length
			&& terminal.chars().all(|c| CharClass::of(c) == Some(self.class))
	}
}

impl fmt::Display for TerminalSlot {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for _ in 0..self.length {
			write!(f, "{}", self.class.symbol())?;
		}
		Ok(())
	}
}

/// Token-level shape of a password: an ordered list of terminal slots.
///
/// ## Invariants
/// - At least one slot
/// - Adjacent slots have different classes (runs are maximal)
/// - Every slot has a length >= 1
///
/// Serialized as a structure string where each class letter is repeated
/// run-length times: three letters then two digits → `LLLDD`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Structure {
	slots: Vec<TerminalSlot>,
}

/// Raised when a structure string cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseStructureError {
	#[error("structure is empty")]
	Empty,
	#[error("unknown class symbol {0:?} (expected L, D or S)")]
	Symbol(char),
}

impl Structure {
	/// Builds the structure of an already classified password.
	///
	/// Returns `None` for an empty token list.
	pub fn from_tokens(tokens: &[Token<'_>]) -> Option<Self> {
		if tokens.is_empty() {
			return None;
		}
		Some(Self {
			slots: tokens.iter().map(|t| TerminalSlot::new(t.class, t.text.len())).collect(),
		})
	}

	/// Slots of the structure, in password order.
	pub fn slots(&self) -> &[TerminalSlot] {
		&self.slots
	}
}

impl FromStr for Structure {
	type Err = ParseStructureError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.is_empty() {
			return Err(ParseStructureError::Empty);
		}

		let mut slots: Vec<TerminalSlot> = Vec::new();
		for symbol in s.chars() {
			let class = CharClass::from_symbol(symbol).ok_or(ParseStructureError::Symbol(symbol))?;
			match slots.last_mut() {
				Some(slot) if slot.class == class => slot.length += 1,
				_ => slots.push(TerminalSlot::new(class, 1)),
			}
		}
		Ok(Self { slots })
	}
}

impl fmt::Display for Structure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for slot in &self.slots {
			write!(f, "{slot}")?;
		}
		Ok(())
	}
}

/// Raised when a table entry is rejected by `GrammarModelBuilder`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
	#[error("probability {0} is outside (0, 1]")]
	Probability(f64),
	#[error("terminal {terminal:?} does not fit slot {slot}")]
	SlotMismatch { terminal: String, slot: TerminalSlot },
}

/// Trained PCFG tables: structure probabilities and per-slot terminal probabilities.
///
/// A `GrammarModel` is immutable once built. It is shared read-only by the
/// scorer and the sampler, and can be moved across threads freely.
///
/// ## Invariants
/// - Every probability is finite and in `(0, 1]`
/// - Every terminal fits its slot (length and character class)
///
/// Probabilities are not required to sum to exactly 1.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct GrammarModel {
	structures: BTreeMap<Structure, f64>,
	terminals: BTreeMap<TerminalSlot, BTreeMap<String, f64>>,
}

impl GrammarModel {
	/// Starts an empty builder.
	pub fn builder() -> GrammarModelBuilder {
		GrammarModelBuilder::default()
	}

	/// Trained probability of a structure, if the grammar knows it.
	pub fn structure_probability(&self, structure: &Structure) -> Option<f64> {
		self.structures.get(structure).copied()
	}

	/// Trained probability of a terminal in a slot, if the slot knows it.
	pub fn terminal_probability(&self, slot: TerminalSlot, terminal: &str) -> Option<f64> {
		self.terminals.get(&slot)?.get(terminal).copied()
	}

	/// All structures with their probabilities, in a stable order.
	pub fn structures(&self) -> impl Iterator<Item = (&Structure, f64)> {
		self.structures.iter().map(|(s, p)| (s, *p))
	}

	/// Terminal table of a slot, if any terminal was registered for it.
	pub fn terminals(&self, slot: TerminalSlot) -> Option<&BTreeMap<String, f64>> {
		self.terminals.get(&slot)
	}

	pub fn structure_count(&self) -> usize {
		self.structures.len()
	}

	/// Number of terminals across all slots.
	pub fn terminal_count(&self) -> usize {
		self.terminals.values().map(BTreeMap::len).sum()
	}

	/// Encodes the model with `postcard`.
	pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
		postcard::to_stdvec(self)
	}

	/// Decodes a model previously encoded with [`GrammarModel::to_bytes`].
	pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
		postcard::from_bytes(bytes)
	}
}

/// Incremental, validating constructor for `GrammarModel`.
///
/// Letter terminals can be given explicitly or through a dictionary: at
/// `build` time, every letter length without explicit terminals receives the
/// dictionary words of that length with uniform probability.
#[derive(Debug, Default)]
pub struct GrammarModelBuilder {
	model: GrammarModel,
	dictionary: BTreeMap<usize, BTreeSet<String>>,
}

impl GrammarModelBuilder {
	/// Registers a structure with its trained probability.
	///
	/// A structure registered twice keeps the last probability.
	///
	/// # Errors
	/// Returns an error if the probability is not in `(0, 1]`.
	pub fn structure(&mut self, structure: Structure, probability: f64) -> Result<&mut Self, TableError> {
		check_probability(probability)?;
		self.model.structures.insert(structure, probability);
		Ok(self)
	}

	/// Registers a terminal with its trained probability.
	///
	/// # Errors
	/// Returns an error if the probability is not in `(0, 1]` or if the
	/// terminal does not fit the slot.
	pub fn terminal(&mut self, slot: TerminalSlot, terminal: &str, probability: f64) -> Result<&mut Self, TableError> {
		check_probability(probability)?;
		if !slot.fits(terminal) {
			return Err(TableError::SlotMismatch { terminal: terminal.to_owned(), slot });
		}
		self.model.terminals.entry(slot).or_default().insert(terminal.to_owned(), probability);
		Ok(self)
	}

	/// Adds dictionary words used to synthesize uniform letter terminals.
	///
	/// Blank lines are ignored. Words holding anything other than ASCII letters
	/// are skipped, since the tokenizer could never map them back to a single
	/// letter run. Duplicates count once.
	///
	/// Returns the number of skipped words.
	pub fn dictionary<I, S>(&mut self, words: I) -> usize
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut skipped = 0;
		for word in words {
			let word = word.as_ref();
			if word.is_empty() {
				continue;
			}
			if !word.chars().all(|c| c.is_ascii_alphabetic()) {
				skipped += 1;
				continue;
			}
			self.dictionary.entry(word.len()).or_default().insert(word.to_owned());
		}
		if skipped > 0 {
			warn!("Skipped {skipped} dictionary words that are not made of ASCII letters only");
		}
		skipped
	}

	/// Finalizes the model.
	pub fn build(self) -> GrammarModel {
		let mut model = self.model;
		for (length, words) in self.dictionary {
			let slot = TerminalSlot::new(CharClass::Letter, length);
			if model.terminals.contains_key(&slot) {
				continue;
			}
			let probability = 1.0 / words.len() as f64;
			model.terminals.insert(slot, words.into_iter().map(|w| (w, probability)).collect());
		}
		model
	}
}

fn check_probability(probability: f64) -> Result<(), TableError> {
	if probability.is_finite() && probability > 0.0 && probability <= 1.0 {
		Ok(())
	} else {
		Err(TableError::Probability(probability))
	}
}
