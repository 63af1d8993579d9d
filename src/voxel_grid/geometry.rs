use glam::{IVec3, UVec3, Vec3};

use crate::voxel_grid::bbox::AxisAlignedBox;
use crate::voxel_grid::error::{Result, VoxError};

/// Every grid axis is a multiple of this many voxels.
pub const DEFAULT_ALIGNMENT: u32 = 4;
/// Empty cells added around the mesh box on every side before alignment.
pub const DEFAULT_MARGIN: i32 = 8;

/// How a mesh bounding box is turned into a grid box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaddingStrategy {
	/// Margin, then per-axis alignment padding.
	#[default]
	Aligned,
	/// Grow every axis to the longest one first, then as `Aligned`.
	Cube,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridConfig {
	pub alignment: u32,
	pub margin: i32,
	pub padding: PaddingStrategy,
}

impl Default for GridConfig {
	fn default() -> Self {
		Self {
			alignment: DEFAULT_ALIGNMENT,
			margin: DEFAULT_MARGIN,
			padding: PaddingStrategy::Aligned,
		}
	}
}

/// Voxel grid covering a padded mesh box. Read-only once derived.
#[derive(Debug, Clone, PartialEq)]
pub struct GridInfo {
	pub bbox: AxisAlignedBox<IVec3>,
	pub size_x: u32,
	pub size_y: u32,
	pub size_z: u32,
	pub triangle_count: usize,
	/// World length of one voxel edge.
	pub unit: f32,
}

impl GridInfo {
	/// Derive the grid for an integer mesh box.
	pub fn from_mesh_box(mesh_box: &AxisAlignedBox<IVec3>, triangle_count: usize, config: &GridConfig) -> Result<Self> {
		if !mesh_box.is_valid() {
			return Err(VoxError::invalid(format!(
				"mesh box min {} exceeds max {}",
				mesh_box.min, mesh_box.max
			)));
		}

		let start = match config.padding {
			PaddingStrategy::Aligned => *mesh_box,
			PaddingStrategy::Cube => cube_box(mesh_box)?,
		};
		let bbox = aligned_box(&start, config.alignment, config.margin)?;
		// voxel indices are i32 downstream, so every axis length must fit one
		let span = bbox.max.as_i64vec3() - bbox.min.as_i64vec3();
		let size = UVec3::new(axis_len(span.x)?, axis_len(span.y)?, axis_len(span.z)?);

		log::debug!(
			"grid for mesh box {}..{}: {}..{} ({}x{}x{})",
			mesh_box.min, mesh_box.max, bbox.min, bbox.max, size.x, size.y, size.z
		);

		Ok(Self {
			bbox,
			size_x: size.x,
			size_y: size.y,
			size_z: size.z,
			triangle_count,
			unit: 1.0,
		})
	}

	/// Derive the grid for a floating-point mesh box, rounded outward to whole voxels.
	pub fn from_world_box(mesh_box: &AxisAlignedBox<Vec3>, triangle_count: usize, config: &GridConfig) -> Result<Self> {
		if !mesh_box.is_valid() {
			return Err(VoxError::invalid(format!(
				"mesh box min {} exceeds max {} or is not finite",
				mesh_box.min, mesh_box.max
			)));
		}
		Self::from_mesh_box(&mesh_box.round_outward(), triangle_count, config)
	}

	/// Set the world length of a voxel edge.
	pub fn with_unit(mut self, unit: f32) -> Result<Self> {
		if !(unit.is_finite() && unit > 0.0) {
			return Err(VoxError::invalid(format!("voxel unit must be positive, got {}", unit)));
		}
		self.unit = unit;
		Ok(self)
	}

	#[inline]
	pub fn dims(&self) -> UVec3 {
		UVec3::new(self.size_x, self.size_y, self.size_z)
	}

	pub fn voxel_count(&self) -> u64 {
		self.size_x as u64 * self.size_y as u64 * self.size_z as u64
	}

	/// World position of grid-local voxel (0, 0, 0).
	pub fn origin(&self) -> Vec3 {
		self.bbox.min.as_vec3()
	}

	/// Print the grid box, axis sizes and triangle count.
	pub fn report(&self) {
		let (min, max) = (self.bbox.min, self.bbox.max);
		eprintln!("Bounding Box: ({}, {}, {}) to ({}, {}, {})", min.x, min.y, min.z, max.x, max.y, max.z);
		eprintln!("Grid size x: {}", self.size_x);
		eprintln!("Grid size y: {}", self.size_y);
		eprintln!("Grid size z: {}", self.size_z);
		eprintln!("Triangles: {}", self.triangle_count);
	}
}

/// Grow `bbox` by `margin` on every side, then pad each axis up to a multiple of
/// `alignment`. An odd pad puts the extra cell on the max side.
pub fn aligned_box(bbox: &AxisAlignedBox<IVec3>, alignment: u32, margin: i32) -> Result<AxisAlignedBox<IVec3>> {
	if alignment == 0 {
		return Err(VoxError::invalid("alignment must be at least 1"));
	}
	let align = alignment as i64;

	let mut min = [0i32; 3];
	let mut max = [0i32; 3];
	for axis in 0..3 {
		let lo = bbox.min[axis] as i64 - margin as i64;
		let hi = bbox.max[axis] as i64 + margin as i64;
		let size = hi - lo;
		if size <= 0 {
			return Err(VoxError::invalid(format!(
				"grid axis {} would have non-positive size {}",
				axis, size
			)));
		}
		let pad = (align - size.rem_euclid(align)).rem_euclid(align);
		let before = pad / 2;
		let after = pad - before;
		min[axis] = to_i32(lo - before)?;
		max[axis] = to_i32(hi + after)?;
	}

	Ok(AxisAlignedBox::new(IVec3::from_array(min), IVec3::from_array(max)))
}

/// Pad each axis of `bbox` up to the length of its longest axis. The shorter
/// half of each pad goes below min.
pub fn cube_box(bbox: &AxisAlignedBox<IVec3>) -> Result<AxisAlignedBox<IVec3>> {
	let lengths = bbox.max.as_i64vec3() - bbox.min.as_i64vec3();
	let max_length = lengths.max_element();
	let mut answer = *bbox;
	for axis in 0..3 {
		let delta = max_length - lengths[axis];
		if delta != 0 {
			let before = delta / 2;
			let after = delta - before;
			answer.min[axis] = to_i32(bbox.min[axis] as i64 - before)?;
			answer.max[axis] = to_i32(bbox.max[axis] as i64 + after)?;
		}
	}
	Ok(answer)
}

fn to_i32(value: i64) -> Result<i32> {
	i32::try_from(value).map_err(|_| VoxError::invalid(format!("grid coordinate {} overflows i32", value)))
}

fn axis_len(value: i64) -> Result<u32> {
	i32::try_from(value)
		.map(|len| len as u32)
		.map_err(|_| VoxError::invalid(format!("grid axis length {} overflows i32", value)))
}
