//! binvox export and import.
//!
//! A file is an ASCII header
//!
//! ```text
//! #binvox 1
//! dim X Y Z
//! translate TX TY TZ
//! scale S
//! data
//! ```
//!
//! followed directly by `(value, count)` byte pairs, `count` in `1..=255`.
//! Runs cover the volume with x outermost, z in the middle and y innermost.
//! Header floats are written like C's `%g` (six significant digits), so
//! `0.1 * 3.0` comes out as `0.3` rather than the shortest round-trip form.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use glam::{UVec3, Vec3};
use indicatif::ProgressBar;

use crate::voxel_grid::bbox::AxisAlignedBox;
use crate::voxel_grid::error::{Result, VoxError};
use crate::voxel_grid::extract::{self, BINVOX_WINDOW_MARGIN, OutputWindow, VoxelVolume};
use crate::voxel_grid::geometry::GridInfo;
use crate::voxel_grid::raw_io::with_suffix;
use crate::voxel_grid::table::Occupancy;
use crate::voxel_grid::utils::format_float;

const MAGIC: &str = "#binvox 1";
const MAX_RUN: u8 = u8::MAX;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinvoxHeader {
	pub dims: UVec3,
	pub translate: Vec3,
	pub scale: f32,
}

impl BinvoxHeader {
	pub fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
		writeln!(w, "{}", MAGIC)?;
		writeln!(w, "dim {} {} {}", self.dims.x, self.dims.y, self.dims.z)?;
		writeln!(
			w,
			"translate {} {} {}",
			format_float(self.translate.x),
			format_float(self.translate.y),
			format_float(self.translate.z)
		)?;
		writeln!(w, "scale {}", format_float(self.scale))?;
		writeln!(w, "data")?;
		Ok(())
	}
}

/// Streams `(value, count)` pairs to `out` as runs close.
pub struct RunEncoder<W: Write> {
	out: W,
	current: Option<bool>,
	run: u8,
}

impl<W: Write> RunEncoder<W> {
	pub fn new(out: W) -> Self {
		Self { out, current: None, run: 0 }
	}

	pub fn push(&mut self, value: bool) -> io::Result<()> {
		match self.current {
			None => {
				self.current = Some(value);
				self.run = 1;
			}
			Some(current) if current != value || self.run == MAX_RUN => {
				self.flush_run(current)?;
				self.current = Some(value);
				self.run = 1;
			}
			Some(_) => self.run += 1,
		}
		Ok(())
	}

	/// Write the pending run, if any, and hand back the writer.
	pub fn finish(mut self) -> io::Result<W> {
		if let Some(current) = self.current {
			self.flush_run(current)?;
		}
		Ok(self.out)
	}

	fn flush_run(&mut self, value: bool) -> io::Result<()> {
		self.out.write_all(&[value as u8, self.run])
	}
}

/// Run-length encode every voxel of `volume` in binvox order.
pub fn encode_runs<T: Occupancy + ?Sized, W: Write>(volume: &T, out: W) -> io::Result<W> {
	let dims = volume.dims();
	let mut encoder = RunEncoder::new(out);
	for x in 0..dims.x {
		for z in 0..dims.z {
			for y in 0..dims.y {
				encoder.push(volume.voxel(x, y, z))?;
			}
		}
	}
	encoder.finish()
}

/// Header plus run stream for `volume`.
pub fn encode_binvox<T: Occupancy + ?Sized, W: Write>(
	volume: &T,
	translate: Vec3,
	scale: f32,
	mut out: W,
) -> io::Result<W> {
	let header = BinvoxHeader {
		dims: volume.dims(),
		translate,
		scale,
	};
	header.write_to(&mut out)?;
	encode_runs(volume, out)
}

/// Export the window around `mesh_box` (world units, margin [`BINVOX_WINDOW_MARGIN`])
/// to `<base>.binvox`. Returns the written path.
///
/// The file is encoded in memory first and written in one go; a failed write
/// leaves no file behind.
pub fn write_binvox_file<T: Occupancy + ?Sized>(
	table: &T,
	grid: &GridInfo,
	mesh_box: &AxisAlignedBox<Vec3>,
	base: impl AsRef<Path>,
) -> Result<PathBuf> {
	write_binvox_file_with_progress(table, grid, mesh_box, base, &ProgressBar::hidden())
}

/// As [`write_binvox_file`], reporting window extraction on `pb`.
pub fn write_binvox_file_with_progress<T: Occupancy + ?Sized>(
	table: &T,
	grid: &GridInfo,
	mesh_box: &AxisAlignedBox<Vec3>,
	base: impl AsRef<Path>,
	pb: &ProgressBar,
) -> Result<PathBuf> {
	extract::check_table(table, grid)?;
	let window = OutputWindow::around_world(mesh_box, grid, BINVOX_WINDOW_MARGIN);
	let volume = extract::extract_window_with_progress(table, &window, pb)?;
	let path = with_suffix(base.as_ref(), "binvox");

	log::info!("writing binvox {} ({} voxels)", path.display(), window.voxel_count());
	let bytes = encode_binvox(&volume, window.world_origin(grid), grid.unit, Vec::new())
		.map_err(|e| VoxError::io(&path, e))?;
	if let Err(e) = fs::write(&path, &bytes) {
		let _ = fs::remove_file(&path);
		return Err(VoxError::io(&path, e));
	}
	Ok(path)
}

/// A decoded binvox file.
#[derive(Debug, Clone)]
pub struct BinvoxFile {
	pub header: BinvoxHeader,
	pub volume: VoxelVolume,
}

pub fn read_binvox_file(path: impl AsRef<Path>) -> Result<BinvoxFile> {
	let path = path.as_ref();
	let bytes = fs::read(path).map_err(|e| VoxError::io(path, e))?;
	parse_binvox(&bytes)
}

/// Parse a complete binvox byte image.
pub fn parse_binvox(bytes: &[u8]) -> Result<BinvoxFile> {
	let mut rest = bytes;
	let magic = next_line(&mut rest)?;
	if !magic.starts_with("#binvox") {
		return Err(VoxError::invalid(format!("not a binvox file: {:?}", magic)));
	}

	let mut dims = None;
	let mut translate = Vec3::ZERO;
	let mut scale = 1.0;
	loop {
		let line = next_line(&mut rest)?;
		let mut tokens = line.split_whitespace();
		match tokens.next() {
			Some("dim") => dims = Some(UVec3::from_array(parse_three(tokens, line)?)),
			Some("translate") => translate = Vec3::from_array(parse_three(tokens, line)?),
			Some("scale") => scale = parse_one(tokens.next(), line)?,
			Some("data") => break,
			None => continue,
			Some(_) => return Err(VoxError::invalid(format!("unexpected binvox header line {:?}", line))),
		}
	}
	let dims = dims.ok_or_else(|| VoxError::invalid("binvox header has no dim line"))?;

	let header = BinvoxHeader { dims, translate, scale };
	let volume = decode_runs(rest, dims)?;
	Ok(BinvoxFile { header, volume })
}

/// Expand a run stream into a volume of `dims`, checking that runs cover it exactly.
pub fn decode_runs(runs: &[u8], dims: UVec3) -> Result<VoxelVolume> {
	if runs.len() % 2 != 0 {
		return Err(VoxError::invalid("binvox run stream has an odd number of bytes"));
	}
	let total = (dims.x as usize)
		.checked_mul(dims.y as usize)
		.and_then(|n| n.checked_mul(dims.z as usize))
		.ok_or_else(|| VoxError::invalid(format!("binvox dims {} overflow the voxel count", dims)))?;
	// every pair covers at most 255 voxels
	if runs.len() / 2 * (MAX_RUN as usize) < total {
		return Err(VoxError::invalid(format!(
			"binvox runs cannot cover {} voxels with {} bytes",
			total,
			runs.len()
		)));
	}
	let mut volume = VoxelVolume::new(dims);

	let (dy, dz) = (dims.y as usize, dims.z as usize);
	let mut pos = 0usize;
	for pair in runs.chunks_exact(2) {
		let (value, count) = (pair[0], pair[1] as usize);
		if value > 1 || count == 0 {
			return Err(VoxError::invalid(format!("bad binvox run ({}, {})", value, count)));
		}
		if pos + count > total {
			return Err(VoxError::invalid("binvox runs overrun the volume"));
		}
		if value == 1 {
			for p in pos..pos + count {
				// p = y + z*dy + x*dy*dz
				let y = p % dy;
				let z = (p / dy) % dz;
				let x = p / (dy * dz);
				volume.set(x as u32, y as u32, z as u32, true);
			}
		}
		pos += count;
	}
	if pos != total {
		return Err(VoxError::invalid(format!(
			"binvox runs cover {} of {} voxels",
			pos, total
		)));
	}
	Ok(volume)
}

fn next_line<'a>(rest: &mut &'a [u8]) -> Result<&'a str> {
	let bytes: &'a [u8] = *rest;
	let end = bytes
		.iter()
		.position(|&b| b == b'\n')
		.ok_or_else(|| VoxError::invalid("binvox header ends early"))?;
	let line = std::str::from_utf8(&bytes[..end]).map_err(|_| VoxError::invalid("binvox header is not ASCII"))?;
	*rest = &bytes[end + 1..];
	Ok(line.trim_end_matches('\r'))
}

fn parse_one<T: std::str::FromStr>(token: Option<&str>, line: &str) -> Result<T> {
	token
		.and_then(|t| t.parse().ok())
		.ok_or_else(|| VoxError::invalid(format!("malformed binvox header line {:?}", line)))
}

fn parse_three<'a, T: std::str::FromStr>(mut tokens: impl Iterator<Item = &'a str>, line: &str) -> Result<[T; 3]> {
	Ok([
		parse_one(tokens.next(), line)?,
		parse_one(tokens.next(), line)?,
		parse_one(tokens.next(), line)?,
	])
}
