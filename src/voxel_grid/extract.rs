use bitvec::vec::BitVec;
use glam::{IVec3, UVec3, Vec3};
use indicatif::ProgressBar;

use crate::voxel_grid::bbox::AxisAlignedBox;
use crate::voxel_grid::error::{Result, VoxError};
use crate::voxel_grid::geometry::GridInfo;
use crate::voxel_grid::table::Occupancy;

/// Cells kept around the mesh box when exporting the raw grid window.
pub const RAW_WINDOW_MARGIN: i32 = 5;
/// Voxels kept around the mesh box when exporting binvox.
pub const BINVOX_WINDOW_MARGIN: i32 = 3;

/// Clamped sub-region of a grid, in grid-local voxel coordinates.
///
/// `min` is inclusive, `max` exclusive, and `0 <= min <= max <= grid size` on
/// every axis. `translate` is the integer world position of window voxel (0, 0, 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputWindow {
	pub min: IVec3,
	pub max: IVec3,
	pub translate: IVec3,
}

impl OutputWindow {
	/// Window around an integer mesh box, grown by `margin` and clamped to the grid.
	pub fn around(mesh_box: &AxisAlignedBox<IVec3>, grid: &GridInfo, margin: i32) -> Self {
		let origin = grid.bbox.min;
		let local = AxisAlignedBox::new(
			mesh_box.min.saturating_sub(origin),
			mesh_box.max.saturating_sub(origin),
		);
		Self::clamped(&local, grid, margin)
	}

	/// Window around a world-space mesh box. Coordinates are converted to voxels
	/// of `grid.unit` and rounded outward before the margin is applied.
	pub fn around_world(mesh_box: &AxisAlignedBox<Vec3>, grid: &GridInfo, margin: i32) -> Self {
		let local = mesh_box.to_cells(grid.origin(), grid.unit);
		Self::clamped(&local, grid, margin)
	}

	fn clamped(local: &AxisAlignedBox<IVec3>, grid: &GridInfo, margin: i32) -> Self {
		let size = grid.dims().as_ivec3();
		let m = IVec3::splat(margin);
		let min = local.min.saturating_sub(m).clamp(IVec3::ZERO, size);
		// an inverted window collapses to zero extent instead of going negative
		let max = local.max.saturating_add(m).min(size).max(min);
		let window = Self {
			min,
			max,
			translate: min + grid.bbox.min,
		};
		log::debug!("output window {}..{} translate {}", window.min, window.max, window.translate);
		window
	}

	#[inline]
	pub fn dims(&self) -> UVec3 {
		(self.max - self.min).as_uvec3()
	}

	pub fn voxel_count(&self) -> u64 {
		let d = self.dims();
		d.x as u64 * d.y as u64 * d.z as u64
	}

	pub fn is_empty(&self) -> bool {
		self.voxel_count() == 0
	}

	/// World position of window voxel (0, 0, 0) on a grid of `grid.unit` sized voxels.
	pub fn world_origin(&self, grid: &GridInfo) -> Vec3 {
		self.min.as_vec3() * grid.unit + grid.origin()
	}
}

/// Dense boolean volume, x fastest, then y, then z.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxelVolume {
	dims: UVec3,
	bits: BitVec,
}

impl VoxelVolume {
	pub fn new(dims: UVec3) -> Self {
		Self {
			dims,
			bits: BitVec::repeat(false, dims.x as usize * dims.y as usize * dims.z as usize),
		}
	}

	#[inline]
	pub fn index(&self, x: u32, y: u32, z: u32) -> usize {
		let (sx, sy) = (self.dims.x as usize, self.dims.y as usize);
		x as usize + y as usize * sx + z as usize * sx * sy
	}

	pub fn set(&mut self, x: u32, y: u32, z: u32, value: bool) {
		let idx = self.index(x, y, z);
		self.bits.set(idx, value);
	}

	pub fn voxel_count(&self) -> usize {
		self.bits.len()
	}

	pub fn count_filled(&self) -> usize {
		self.bits.count_ones()
	}

	/// Values in x-fastest order.
	pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
		self.bits.iter().by_vals()
	}
}

impl Occupancy for VoxelVolume {
	fn dims(&self) -> UVec3 {
		self.dims
	}

	#[inline]
	fn voxel(&self, x: u32, y: u32, z: u32) -> bool {
		assert!(x < self.dims.x && y < self.dims.y && z < self.dims.z);
		self.bits[self.index(x, y, z)]
	}
}

/// Window voxels of a grid plus the world translation of their origin.
#[derive(Debug, Clone)]
pub struct Extraction {
	pub volume: VoxelVolume,
	pub translate: IVec3,
}

/// Copy the window out of `table` into a dense volume.
pub fn extract_window<T: Occupancy + ?Sized>(table: &T, window: &OutputWindow) -> Result<VoxelVolume> {
	extract_window_with_progress(table, window, &ProgressBar::hidden())
}

/// As [`extract_window`], advancing `pb` once per z slice.
pub fn extract_window_with_progress<T: Occupancy + ?Sized>(
	table: &T,
	window: &OutputWindow,
	pb: &ProgressBar,
) -> Result<VoxelVolume> {
	let dims = window.dims();
	let mut volume = VoxelVolume::new(dims);
	if window.is_empty() {
		return Ok(volume);
	}
	check_window(table, window)?;

	pb.set_length(dims.z as u64);
	let (min, max) = (window.min.as_uvec3(), window.max.as_uvec3());
	for z in min.z..max.z {
		for y in min.y..max.y {
			for x in min.x..max.x {
				if table.voxel(x, y, z) {
					volume.set(x - min.x, y - min.y, z - min.z, true);
				}
			}
		}
		pb.inc(1);
	}
	pb.finish_and_clear();
	Ok(volume)
}

/// Window around the integer mesh box with [`RAW_WINDOW_MARGIN`], extracted from `table`.
pub fn extract_raw<T: Occupancy + ?Sized>(
	mesh_box: &AxisAlignedBox<IVec3>,
	grid: &GridInfo,
	table: &T,
) -> Result<Extraction> {
	check_table(table, grid)?;
	let window = OutputWindow::around(mesh_box, grid, RAW_WINDOW_MARGIN);
	let volume = extract_window(table, &window)?;
	Ok(Extraction {
		volume,
		translate: window.translate,
	})
}

/// Fail unless `table` was sized for `grid`.
pub fn check_table<T: Occupancy + ?Sized>(table: &T, grid: &GridInfo) -> Result<()> {
	if table.dims() != grid.dims() {
		return Err(VoxError::invalid(format!(
			"table is {} but grid is {}",
			table.dims(),
			grid.dims()
		)));
	}
	Ok(())
}

fn check_window<T: Occupancy + ?Sized>(table: &T, window: &OutputWindow) -> Result<()> {
	let last = window.max - IVec3::ONE;
	table.is_occupied(window.min.x, window.min.y, window.min.z)?;
	table.is_occupied(last.x, last.y, last.z)?;
	Ok(())
}
