use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::voxel_grid::error::{Result, VoxError};
use crate::voxel_grid::utils::format_bytes;

/// `base` with `.suffix` appended to the whole file name (`mesh.v2` -> `mesh.v2.bin`).
pub fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
	let mut name = OsString::from(base.as_os_str());
	name.push(".");
	name.push(suffix);
	PathBuf::from(name)
}

/// Dump `data` to `<base>.bin` with no header. Returns the written path.
pub fn write_binary(data: &[u8], base: impl AsRef<Path>) -> Result<PathBuf> {
	let path = with_suffix(base.as_ref(), "bin");
	log::info!("writing {} of binary data to {}", format_bytes(data.len()), path.display());
	if let Err(e) = fs::write(&path, data) {
		let _ = fs::remove_file(&path);
		return Err(VoxError::io(&path, e));
	}
	Ok(path)
}

/// Size of a file in bytes.
pub fn file_length(path: impl AsRef<Path>) -> Result<u64> {
	let path = path.as_ref();
	fs::metadata(path).map(|m| m.len()).map_err(|e| VoxError::io(path, e))
}

/// Read exactly `length` bytes from the start of `path`.
pub fn read_binary(path: impl AsRef<Path>, length: usize) -> Result<Vec<u8>> {
	let path = path.as_ref();
	log::debug!("reading {} of binary data from {}", format_bytes(length), path.display());
	let mut file = File::open(path).map_err(|e| VoxError::io(path, e))?;
	let mut buf = vec![0u8; length];
	file.read_exact(&mut buf).map_err(|e| VoxError::io(path, e))?;
	Ok(buf)
}
