use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Reads a corpus file, one entry per line.
///
/// Blank lines are kept so line numbers stay meaningful; they hold no
/// token and are skipped by chain construction.
pub fn read_file<P: AsRef<Path>>(path: P) -> io::Result<Vec<String>> {
	Ok(fs::read_to_string(path)?.lines().map(str::to_owned).collect())
}

/// Path of the file `stem.extension` inside `dir`.
///
/// Example:
/// `data/` + `"1234"` + `"json"` → `data/1234.json`
pub(crate) fn build_file_path<P: AsRef<Path>>(dir: P, stem: &str, extension: &str) -> PathBuf {
	let mut output = dir.as_ref().join(stem);
	output.set_extension(extension);
	output
}

/// Files of `dir` with the given extension, sorted by path.
pub(crate) fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<PathBuf>> {
	let mut files = fs::read_dir(dir)?
		.map(|entry| entry.map(|entry| entry.path()))
		.filter(|path| {
			path.as_ref()
				.map_or(true, |path| path.is_file() && path.extension().is_some_and(|ext| ext == extension))
		})
		.collect::<io::Result<Vec<_>>>()?;
	files.sort();
	Ok(files)
}

/// Replaces the content of `path` atomically.
///
/// The bytes are written to a temporary file in the same directory,
/// which is then renamed over the target. Readers either see the old
/// content or the new one, never a partial write.
pub(crate) fn write_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> io::Result<()> {
	let path = path.as_ref();
	let parent = path.parent().unwrap_or_else(|| Path::new("."));
	fs::create_dir_all(parent)?;

	let mut temp_file = NamedTempFile::new_in(parent)?;
	temp_file.write_all(bytes)?;
	temp_file.as_file().sync_all()?;
	temp_file.persist(path).map_err(|e| e.error)?;
	Ok(())
}
