use serde::{Deserialize, Serialize};

use super::estimator::Estimation;

/// Default upper bound on reported guess numbers (10^20).
pub const DEFAULT_UPPER_BOUND: u128 = 100_000_000_000_000_000_000;

/// One point of a guess/crack curve.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct CurvePoint {
	/// Guess budget.
	pub guesses: u128,
	/// Test passwords cracked within that budget.
	pub cracked: usize,
	/// `cracked` as a percentage of the whole test set.
	pub percentage: f64,
}

/// Aggregates guess numbers into a cumulative guess/crack curve.
///
/// - Identical guess numbers collapse into one point, sorted ascending
/// - Unreachable passwords never produce a point
/// - Points above `upper_bound` are dropped
/// - Percentages always divide by `test_set_size`, so unreachable or
///   dropped passwords keep the curve below 100%
pub fn build_curve(estimations: &[Estimation], test_set_size: usize, upper_bound: u128) -> Vec<CurvePoint> {
	let mut guesses: Vec<u128> = estimations.iter().filter_map(|e| e.guesses()).collect();
	guesses.sort_unstable();

	let mut points = Vec::new();
	let mut cracked = 0;
	for group in guesses.chunk_by(|a, b| a == b) {
		let guesses = group[0];
		if guesses > upper_bound {
			break;
		}
		cracked += group.len();
		points.push(CurvePoint { guesses, cracked, percentage: percentage(cracked, test_set_size) });
	}
	points
}

fn percentage(cracked: usize, total: usize) -> f64 {
	if total == 0 {
		return 0.0;
	}
	cracked as f64 / total as f64 * 100.0
}
