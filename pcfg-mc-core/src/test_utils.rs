//! Small hand-built models shared by the unit tests.

use crate::model::classifier::CharClass;
use crate::model::grammar_model::{GrammarModel, Structure, TerminalSlot};

/// One structure (`LLLD`, probability 1) with one terminal per slot
/// (probability 1): the only password it can produce is `abc7`.
pub(crate) fn single_path_model() -> GrammarModel {
	let mut builder = GrammarModel::builder();
	builder.structure(structure("LLLD"), 1.0).unwrap();
	builder.terminal(TerminalSlot::new(CharClass::Digit, 1), "7", 1.0).unwrap();
	builder.dictionary(["abc"]);
	builder.build()
}

/// A few structures over dictionary words, digits and symbols.
pub(crate) fn toy_model() -> GrammarModel {
	let digits = |n| TerminalSlot::new(CharClass::Digit, n);
	let symbols = |n| TerminalSlot::new(CharClass::Symbol, n);

	let mut builder = GrammarModel::builder();
	builder
		.structure(structure("LLLDD"), 0.5).unwrap()
		.structure(structure("DDDD"), 0.3).unwrap()
		.structure(structure("LLLS"), 0.2).unwrap();
	builder
		.terminal(digits(2), "12", 0.6).unwrap()
		.terminal(digits(2), "99", 0.4).unwrap()
		.terminal(digits(4), "1234", 0.5).unwrap()
		.terminal(digits(4), "0000", 0.25).unwrap()
		.terminal(digits(4), "2024", 0.25).unwrap()
		.terminal(symbols(1), "!", 0.75).unwrap()
		.terminal(symbols(1), "@", 0.25).unwrap();
	builder.dictionary(["cat", "dog", "owl", "pony"]);
	builder.build()
}

pub(crate) fn structure(s: &str) -> Structure {
	s.parse().unwrap()
}
