use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub(crate) fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Reads a file of lines that may not be valid UTF-8.
///
/// - Splits on `\n`, then strips a trailing `\r`
/// - Invalid bytes become U+FFFD, only on the line holding them
pub(crate) fn read_file_lossy<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let bytes = fs::read(filename)?;
	let mut lines: Vec<String> = bytes
		.split(|b| *b == b'\n')
		.map(|line| String::from_utf8_lossy(line.strip_suffix(b"\r").unwrap_or(line)).into_owned())
		.collect();
	// The split after a final newline (or of an empty file) yields no line.
	if bytes.is_empty() || bytes.ends_with(b"\n") {
		lines.pop();
	}
	Ok(lines)
}

/// Extracts the base name of a path without extension.
///
/// Examples:
/// - `"./models/rockyou"` → `"rockyou"`
/// - `"model.bin"` → `"model"`
pub(crate) fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub(crate) fn normalize_folder<P: AsRef<Path>>(input: P) -> PathBuf {
	let input = input.as_ref();
	if input == Path::new(".") || input == Path::new("./") {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		input.to_path_buf()
	}
}

/// Lists every regular file directly inside a directory.
///
/// Returns file names only (no paths), sorted so that callers see a stable order.
pub(crate) fn list_files<P: AsRef<Path>>(dir: P) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		let path = entry.path();

		if path.is_file() {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn read_file_strips_line_endings() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("lines.txt");
		fs::write(&path, "alpha\r\nbeta\ngamma").unwrap();

		assert_eq!(read_file(&path).unwrap(), vec!["alpha", "beta", "gamma"]);
	}

	#[test]
	fn lossy_read_keeps_lines_around_invalid_bytes() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("lines.txt");
		fs::write(&path, b"love12\r\ncaf\xe9\n\nlove99").unwrap();

		assert_eq!(read_file_lossy(&path).unwrap(), vec!["love12", "caf\u{FFFD}", "", "love99"]);

		fs::write(&path, b"").unwrap();
		assert!(read_file_lossy(&path).unwrap().is_empty());
	}

	#[test]
	fn list_files_skips_directories() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("2.txt"), "").unwrap();
		fs::write(dir.path().join("1.txt"), "").unwrap();
		fs::create_dir(dir.path().join("nested")).unwrap();

		assert_eq!(list_files(dir.path()).unwrap(), vec!["1.txt", "2.txt"]);
	}

	#[test]
	fn filename_drops_extension() {
		assert_eq!(get_filename("./models/rockyou").unwrap(), "rockyou");
		assert_eq!(get_filename("cache/model.bin").unwrap(), "model");
	}
}
