use std::io;
use std::path::PathBuf;

use glam::UVec3;
use thiserror::Error;

/// Errors raised while deriving grids, querying tables or writing volumes.
#[derive(Debug, Error)]
pub enum VoxError {
	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error("voxel ({x}, {y}, {z}) is outside grid {}x{}x{}", .dims.x, .dims.y, .dims.z)]
	OutOfBounds { x: i64, y: i64, z: i64, dims: UVec3 },

	#[error("cannot allocate {requested} bytes (limit: {limit:?})")]
	AllocationFailure { requested: usize, limit: Option<usize> },

	#[error("I/O error on {}: {source}", .path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
}

impl VoxError {
	pub(crate) fn invalid(msg: impl Into<String>) -> Self {
		VoxError::InvalidInput(msg.into())
	}

	pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
		VoxError::Io { path: path.into(), source }
	}
}

pub type Result<T> = std::result::Result<T, VoxError>;
