use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Character class of a password run.
///
/// - `Letter`: ASCII letters (`a-z`, `A-Z`)
/// - `Digit`: ASCII digits (`0-9`)
/// - `Symbol`: printable ASCII punctuation (`!` to `/`, `:` to `@`, `[` to `` ` ``, `{` to `~`)
///
/// Whitespace, control characters and anything outside ASCII belong to no class.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CharClass {
	Letter,
	Digit,
	Symbol,
}

impl CharClass {
	/// Returns the class of a character, or `None` if it belongs to no class.
	pub fn of(c: char) -> Option<Self> {
		if c.is_ascii_alphabetic() {
			Some(Self::Letter)
		} else if c.is_ascii_digit() {
			Some(Self::Digit)
		} else if c.is_ascii_punctuation() {
			Some(Self::Symbol)
		} else {
			None
		}
	}

	/// Letter used for this class in structure strings (`L`, `D` or `S`).
	pub fn symbol(self) -> char {
		match self {
			Self::Letter => 'L',
			Self::Digit => 'D',
			Self::Symbol => 'S',
		}
	}

	/// Inverse of [`CharClass::symbol`].
	pub fn from_symbol(symbol: char) -> Option<Self> {
		match symbol {
			'L' => Some(Self::Letter),
			'D' => Some(Self::Digit),
			'S' => Some(Self::Symbol),
			_ => None,
		}
	}
}

/// A maximal run of same-class characters inside a password.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'a> {
	pub class: CharClass,
	pub text: &'a str,
}

/// Raised when a password holds a character outside the three classes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unclassifiable character {character:?} at position {position}")]
pub struct ClassificationError {
	pub character: char,
	/// Character index (not byte offset) of the offending character.
	pub position: usize,
}

/// Splits `text` into maximal runs of letters, digits and symbols.
///
/// Single pass, linear in the input length. Adjacent tokens always have
/// different classes, and concatenating the token texts gives back `text`.
/// An empty input yields no tokens.
///
/// # Errors
/// Returns a `ClassificationError` on the first character that belongs to no class.
pub fn classify(text: &str) -> Result<Vec<Token<'_>>, ClassificationError> {
	let mut tokens = Vec::new();
	let mut current: Option<(CharClass, usize)> = None;

	for (position, (offset, character)) in text.char_indices().enumerate() {
		let class = CharClass::of(character).ok_or(ClassificationError { character, position })?;
		match current {
			Some((run_class, _)) if run_class == class => (),
			Some((run_class, start)) => {
				tokens.push(Token { class: run_class, text: &text[start..offset] });
				current = Some((class, offset));
			}
			None => current = Some((class, offset)),
		}
	}

	if let Some((class, start)) = current {
		tokens.push(Token { class, text: &text[start..] });
	}

	Ok(tokens)
}
