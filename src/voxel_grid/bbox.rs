use glam::{IVec3, Vec3};

use crate::voxel_grid::error::{Result, VoxError};

/// Axis-aligned box over a 3-component vector type.
///
/// Boxes are values: every operation returns a new box and leaves `self`
/// untouched. `min <= max` component-wise holds for any box handed to the
/// grid deriver; constructors do not enforce it, [`AxisAlignedBox::is_valid`] checks it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisAlignedBox<T> {
	pub min: T,
	pub max: T,
}

impl<T> AxisAlignedBox<T> {
	pub const fn new(min: T, max: T) -> Self {
		Self { min, max }
	}
}

impl AxisAlignedBox<IVec3> {
	/// Build from the `[minx, miny, minz, maxx, maxy, maxz]` layout used by callers
	/// passing a flat integer array.
	pub fn from_array(bb: [i32; 6]) -> Self {
		Self::new(IVec3::new(bb[0], bb[1], bb[2]), IVec3::new(bb[3], bb[4], bb[5]))
	}

	#[inline]
	pub fn size(&self) -> IVec3 {
		self.max - self.min
	}

	#[inline]
	pub fn is_valid(&self) -> bool {
		self.min.cmple(self.max).all()
	}

	/// Grow by `margin` cells on every side.
	pub fn expanded(&self, margin: i32) -> Self {
		Self::new(self.min - IVec3::splat(margin), self.max + IVec3::splat(margin))
	}

	pub fn contains_box(&self, other: &Self) -> bool {
		self.min.cmple(other.min).all() && self.max.cmpge(other.max).all()
	}

	pub fn as_vec3(&self) -> AxisAlignedBox<Vec3> {
		AxisAlignedBox::new(self.min.as_vec3(), self.max.as_vec3())
	}
}

impl AxisAlignedBox<Vec3> {
	#[inline]
	pub fn size(&self) -> Vec3 {
		self.max - self.min
	}

	#[inline]
	pub fn is_valid(&self) -> bool {
		self.min.is_finite() && self.max.is_finite() && self.min.cmple(self.max).all()
	}

	/// Bounding box of a flat triangle soup (`9 * n` floats, three vertices per triangle).
	pub fn from_triangles(triangles: &[f32]) -> Result<Self> {
		if triangles.is_empty() || triangles.len() % 9 != 0 {
			return Err(VoxError::invalid(format!(
				"triangle data must hold 9 floats per triangle, got {} floats",
				triangles.len()
			)));
		}

		let mut min = Vec3::splat(f32::MAX);
		let mut max = Vec3::splat(f32::MIN);
		for vertex in triangles.chunks_exact(3) {
			let v = Vec3::new(vertex[0], vertex[1], vertex[2]);
			min = min.min(v);
			max = max.max(v);
		}
		Ok(Self::new(min, max))
	}

	/// Smallest integer box containing this one: `floor` on min, `ceil` on max.
	pub fn round_outward(&self) -> AxisAlignedBox<IVec3> {
		AxisAlignedBox::new(self.min.floor().as_ivec3(), self.max.ceil().as_ivec3())
	}

	/// Express this box in lattice cells of edge `unit` relative to `origin`,
	/// rounding outward.
	pub fn to_cells(&self, origin: Vec3, unit: f32) -> AxisAlignedBox<IVec3> {
		AxisAlignedBox::new(
			((self.min - origin) / unit).floor().as_ivec3(),
			((self.max - origin) / unit).ceil().as_ivec3(),
		)
	}
}
