//! Guess/crack report files and plot series.
//!
//! A report holds one line per curve point:
//!
//! ```text
//! <guesses> : <cracked> : <percentage>
//! ```
//!
//! with the percentage printed with two decimals, right-aligned on five
//! characters (`" 5.00"`, `"75.00"`, `"100.00"`).

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::estimate::curve::CurvePoint;

#[derive(Error, Debug)]
pub enum ReportError {
	#[error(transparent)]
	Io(#[from] io::Error),
	#[error("line {line}: expected `<guesses> : <cracked> : <percentage>`, got {content:?}")]
	Malformed { line: usize, content: String },
	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

/// Formats one report line (without line ending).
pub fn format_point(point: &CurvePoint) -> String {
	format!("{} : {} : {:5.2}", point.guesses, point.cracked, point.percentage)
}

/// Parses one report line. Returns `None` if the line is malformed.
pub fn parse_point(line: &str) -> Option<CurvePoint> {
	let mut fields = line.split(" : ").map(str::trim);
	let (Some(guesses), Some(cracked), Some(percentage), None) = (fields.next(), fields.next(), fields.next(), fields.next())
	else {
		return None;
	};

	Some(CurvePoint {
		guesses: guesses.parse().ok()?,
		cracked: cracked.parse().ok()?,
		percentage: percentage.parse().ok()?,
	})
}

/// Writes a report to any writer.
pub fn write_report<W: Write>(mut writer: W, points: &[CurvePoint]) -> io::Result<()> {
	for point in points {
		writeln!(writer, "{}", format_point(point))?;
	}
	writer.flush()
}

/// Reads a report back. Blank lines are ignored.
///
/// # Errors
/// Returns `ReportError::Malformed` on the first line that is not a curve point.
pub fn read_report<R: BufRead>(reader: R) -> Result<Vec<CurvePoint>, ReportError> {
	let mut points = Vec::new();
	for (index, line) in reader.lines().enumerate() {
		let line = line?;
		if line.trim().is_empty() {
			continue;
		}
		let point = parse_point(&line).ok_or_else(|| ReportError::Malformed { line: index + 1, content: line.clone() })?;
		points.push(point);
	}
	Ok(points)
}

/// Writes a report file, replacing any existing one.
pub fn save_report<P: AsRef<Path>>(path: P, points: &[CurvePoint]) -> Result<(), ReportError> {
	let file = File::create(path)?;
	write_report(BufWriter::new(file), points)?;
	Ok(())
}

/// Reads a report file.
pub fn load_report<P: AsRef<Path>>(path: P) -> Result<Vec<CurvePoint>, ReportError> {
	read_report(BufReader::new(File::open(path)?))
}

/// Axis scale hint for the plot renderer.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AxisScale {
	Linear,
	Log,
}

/// Everything a renderer needs to draw a guess/crack curve.
///
/// Guesses go on a logarithmic x axis, cracked percentages on a linear y axis.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PlotSeries {
	pub label: String,
	pub x_label: String,
	pub y_label: String,
	pub x_scale: AxisScale,
	pub y_scale: AxisScale,
	/// `(guesses, cracked percentage)`, in curve order.
	pub points: Vec<(f64, f64)>,
}

impl PlotSeries {
	pub fn from_curve(label: &str, curve: &[CurvePoint]) -> Self {
		Self {
			label: label.to_owned(),
			x_label: "Guesses".to_owned(),
			y_label: "Cracked(%)".to_owned(),
			x_scale: AxisScale::Log,
			y_scale: AxisScale::Linear,
			points: curve.iter().map(|p| (p.guesses as f64, p.percentage)).collect(),
		}
	}

	/// Writes the series as pretty-printed JSON.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ReportError> {
		let mut writer = BufWriter::new(File::create(path)?);
		serde_json::to_writer_pretty(&mut writer, self)?;
		writeln!(writer)?;
		writer.flush()?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::estimate::curve::build_curve;
	use crate::estimate::estimator::Estimation;

	fn curve() -> Vec<CurvePoint> {
		let estimations: Vec<Estimation> = [1u128, 1, 2, 5, 90_000_000_000_000_000_000]
			.into_iter()
			.map(Estimation::Guesses)
			.chain([Estimation::Unreachable, Estimation::Unreachable])
			.collect();
		build_curve(&estimations, estimations.len(), 100_000_000_000_000_000_000)
	}

	#[test]
	fn lines_use_two_decimals() {
		let points = curve();
		let mut out = Vec::new();
		write_report(&mut out, &points).unwrap();

		assert_eq!(
			String::from_utf8(out).unwrap(),
			"1 : 2 : 28.57\n2 : 3 : 42.86\n5 : 4 : 57.14\n90000000000000000000 : 5 : 71.43\n"
		);
		assert_eq!(format_point(&CurvePoint { guesses: 3, cracked: 1, percentage: 5.0 }), "3 : 1 :  5.00");
		assert_eq!(format_point(&CurvePoint { guesses: 3, cracked: 1, percentage: 100.0 }), "3 : 1 : 100.00");
	}

	#[test]
	fn report_round_trip() {
		let points = curve();
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("guess-crack.txt");
		save_report(&path, &points).unwrap();

		let parsed = load_report(&path).unwrap();
		assert_eq!(parsed.len(), points.len());
		for (parsed, original) in parsed.iter().zip(&points) {
			assert_eq!(parsed.guesses, original.guesses);
			assert_eq!(parsed.cracked, original.cracked);
			assert_eq!(parsed.percentage, format!("{:.2}", original.percentage).parse::<f64>().unwrap());
		}

		// Writing the parsed points again gives the same file.
		let mut again = Vec::new();
		write_report(&mut again, &parsed).unwrap();
		assert_eq!(String::from_utf8(again).unwrap(), std::fs::read_to_string(&path).unwrap());
	}

	#[test]
	fn malformed_lines_are_reported() {
		let err = read_report("1 : 2 : 50.00\n\n2 : three : 75.00\n".as_bytes()).unwrap_err();
		assert!(matches!(err, ReportError::Malformed { line: 3, .. }));
		assert_eq!(parse_point("1 : 2"), None);
		assert_eq!(parse_point("1 : 2 : 3 : 4"), None);
	}

	#[test]
	fn plot_series_carries_axis_hints() {
		let series = PlotSeries::from_curve("rockyou", &curve());
		assert_eq!(series.points.first(), Some(&(1.0, 2.0 / 7.0 * 100.0)));

		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("curve.json");
		series.save(&path).unwrap();

		let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
		assert_eq!(json["x_scale"], "log");
		assert_eq!(json["y_label"], "Cracked(%)");
		assert_eq!(json["points"].as_array().unwrap().len(), 4);
	}
}
