//! Packed occupancy tables filled by an external rasterizer.
//!
//! Two byte layouts are supported. Both are part of the binary contract with
//! whatever fills the buffer, so they are fixed:
//!
//! * [`BitTable`]: one bit per voxel. Voxel `(x, y, z)` is bit
//!   `i = x + y*sx + z*sx*sy`, stored in byte `i / 8` at bit `i % 8`
//!   (least significant bit first). Length `ceil(sx*sy*sz / 8)` bytes.
//! * [`BlockTable`]: one byte per 2x2x2 block. Voxel `(x, y, z)` lives in byte
//!   `(x>>1) + (y>>1)*hx + (z>>1)*hx*hy` with `hx = ceil(sx/2)`, `hy = ceil(sy/2)`,
//!   at bit `(x&1) | (y&1)<<1 | (z&1)<<2`. Length `ceil(sx/2)*ceil(sy/2)*ceil(sz/2)` bytes.

use bitvec::prelude::*;
use glam::UVec3;

use crate::voxel_grid::error::{Result, VoxError};

/// Read access to a grid of occupancy bits.
pub trait Occupancy {
	fn dims(&self) -> UVec3;

	/// Value of an in-range voxel. Panics if `(x, y, z)` is outside [`Occupancy::dims`].
	fn voxel(&self, x: u32, y: u32, z: u32) -> bool;

	/// Checked point query.
	fn is_occupied(&self, x: i32, y: i32, z: i32) -> Result<bool> {
		let dims = self.dims();
		if x < 0 || y < 0 || z < 0 || x as u32 >= dims.x || y as u32 >= dims.y || z as u32 >= dims.z {
			return Err(VoxError::OutOfBounds {
				x: x as i64,
				y: y as i64,
				z: z as i64,
				dims,
			});
		}
		Ok(self.voxel(x as u32, y as u32, z as u32))
	}
}

/// Write access, used by host-side rasterizers and tests.
pub trait OccupancyMut: Occupancy {
	/// Set an in-range voxel. Panics if `(x, y, z)` is outside [`Occupancy::dims`].
	fn set_voxel(&mut self, x: u32, y: u32, z: u32, value: bool);

	fn fill_voxel(&mut self, x: u32, y: u32, z: u32) {
		self.set_voxel(x, y, z, true);
	}
}

/// Byte layout of a packed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableLayout {
	#[default]
	Bit,
	Block,
}

impl TableLayout {
	/// Bytes needed for a table of `dims` voxels in this layout.
	pub fn byte_len(self, dims: UVec3) -> usize {
		match self {
			TableLayout::Bit => voxel_total(dims).div_ceil(8),
			TableLayout::Block => {
				let half = half_dims(dims);
				half.x as usize * half.y as usize * half.z as usize
			}
		}
	}
}

/// Upper bound on how much memory the core may request for its buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryLimits {
	pub max_bytes: Option<usize>,
}

impl MemoryLimits {
	pub const UNLIMITED: MemoryLimits = MemoryLimits { max_bytes: None };

	pub fn with_max_bytes(max_bytes: usize) -> Self {
		Self { max_bytes: Some(max_bytes) }
	}

	pub fn check(&self, requested: usize) -> Result<()> {
		match self.max_bytes {
			Some(limit) if requested > limit => Err(VoxError::AllocationFailure {
				requested,
				limit: self.max_bytes,
			}),
			_ => Ok(()),
		}
	}

	/// Zero-filled buffer of `len` bytes, failing instead of aborting when memory is short.
	pub fn allocate_zeroed(&self, len: usize) -> Result<Vec<u8>> {
		self.check(len)?;
		let mut buf = Vec::new();
		buf.try_reserve_exact(len).map_err(|_| VoxError::AllocationFailure {
			requested: len,
			limit: self.max_bytes,
		})?;
		buf.resize(len, 0);
		Ok(buf)
	}
}

fn voxel_total(dims: UVec3) -> usize {
	dims.x as usize * dims.y as usize * dims.z as usize
}

fn half_dims(dims: UVec3) -> UVec3 {
	UVec3::new(dims.x.div_ceil(2), dims.y.div_ceil(2), dims.z.div_ceil(2))
}

fn check_len(layout: TableLayout, dims: UVec3, got: usize) -> Result<()> {
	let want = layout.byte_len(dims);
	if got != want {
		return Err(VoxError::invalid(format!(
			"{:?} table for {}x{}x{} needs {} bytes, got {}",
			layout, dims.x, dims.y, dims.z, want, got
		)));
	}
	Ok(())
}

/// One bit per voxel.
#[derive(Debug, Clone)]
pub struct BitTable {
	dims: UVec3,
	bits: BitVec<u8, Lsb0>,
}

impl BitTable {
	pub fn new(dims: UVec3) -> Self {
		Self {
			dims,
			bits: BitVec::repeat(false, voxel_total(dims)),
		}
	}

	/// Wrap bytes written by a rasterizer using the bit-per-voxel layout.
	pub fn from_bytes(dims: UVec3, bytes: Vec<u8>) -> Result<Self> {
		check_len(TableLayout::Bit, dims, bytes.len())?;
		let mut bits = BitVec::from_vec(bytes);
		bits.truncate(voxel_total(dims));
		Ok(Self { dims, bits })
	}

	pub fn as_bytes(&self) -> &[u8] {
		self.bits.as_raw_slice()
	}

	#[inline]
	pub fn index(&self, x: u32, y: u32, z: u32) -> usize {
		let (sx, sy) = (self.dims.x as usize, self.dims.y as usize);
		x as usize + y as usize * sx + z as usize * sx * sy
	}

	pub fn count_filled(&self) -> usize {
		self.bits.count_ones()
	}
}

impl Occupancy for BitTable {
	fn dims(&self) -> UVec3 {
		self.dims
	}

	#[inline]
	fn voxel(&self, x: u32, y: u32, z: u32) -> bool {
		assert!(x < self.dims.x && y < self.dims.y && z < self.dims.z);
		self.bits[self.index(x, y, z)]
	}
}

impl OccupancyMut for BitTable {
	#[inline]
	fn set_voxel(&mut self, x: u32, y: u32, z: u32, value: bool) {
		assert!(x < self.dims.x && y < self.dims.y && z < self.dims.z);
		let idx = self.index(x, y, z);
		self.bits.set(idx, value);
	}
}

/// One byte per 2x2x2 block of voxels.
#[derive(Debug, Clone)]
pub struct BlockTable {
	dims: UVec3,
	half: UVec3,
	words: Vec<u8>,
}

impl BlockTable {
	pub fn new(dims: UVec3) -> Self {
		Self {
			dims,
			half: half_dims(dims),
			words: vec![0; TableLayout::Block.byte_len(dims)],
		}
	}

	/// Wrap bytes written by a rasterizer using the 2x2x2 block layout.
	pub fn from_bytes(dims: UVec3, bytes: Vec<u8>) -> Result<Self> {
		check_len(TableLayout::Block, dims, bytes.len())?;
		Ok(Self {
			dims,
			half: half_dims(dims),
			words: bytes,
		})
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.words
	}

	/// Byte index and bit mask of a voxel.
	#[inline]
	pub fn locate(&self, x: u32, y: u32, z: u32) -> (usize, u8) {
		let (hx, hy) = (self.half.x as usize, self.half.y as usize);
		let word = (x >> 1) as usize + (y >> 1) as usize * hx + (z >> 1) as usize * hx * hy;
		let bit = (x & 1) | ((y & 1) << 1) | ((z & 1) << 2);
		(word, 1u8 << bit)
	}

	/// Set voxels inside `dims`. Sub-voxels of edge blocks past an odd axis
	/// length are padding and are not counted, whatever the rasterizer wrote.
	pub fn count_filled(&self) -> usize {
		let mut words = self.words.iter();
		let mut total = 0;
		for bz in 0..self.half.z {
			let zm: u8 = if 2 * bz + 1 < self.dims.z { 0xff } else { 0x0f };
			for by in 0..self.half.y {
				let ym = if 2 * by + 1 < self.dims.y { zm } else { zm & 0x33 };
				for bx in 0..self.half.x {
					let mask = if 2 * bx + 1 < self.dims.x { ym } else { ym & 0x55 };
					if let Some(word) = words.next() {
						total += (word & mask).count_ones() as usize;
					}
				}
			}
		}
		total
	}
}

impl Occupancy for BlockTable {
	fn dims(&self) -> UVec3 {
		self.dims
	}

	#[inline]
	fn voxel(&self, x: u32, y: u32, z: u32) -> bool {
		assert!(x < self.dims.x && y < self.dims.y && z < self.dims.z);
		let (word, mask) = self.locate(x, y, z);
		self.words[word] & mask != 0
	}
}

impl OccupancyMut for BlockTable {
	#[inline]
	fn set_voxel(&mut self, x: u32, y: u32, z: u32, value: bool) {
		assert!(x < self.dims.x && y < self.dims.y && z < self.dims.z);
		let (word, mask) = self.locate(x, y, z);
		if value {
			self.words[word] |= mask;
		} else {
			self.words[word] &= !mask;
		}
	}
}

/// A table in either layout, chosen at runtime.
#[derive(Debug, Clone)]
pub enum OccupancyTable {
	Bit(BitTable),
	Block(BlockTable),
}

impl OccupancyTable {
	pub fn new(layout: TableLayout, dims: UVec3) -> Self {
		match layout {
			TableLayout::Bit => OccupancyTable::Bit(BitTable::new(dims)),
			TableLayout::Block => OccupancyTable::Block(BlockTable::new(dims)),
		}
	}

	pub fn from_bytes(layout: TableLayout, dims: UVec3, bytes: Vec<u8>) -> Result<Self> {
		Ok(match layout {
			TableLayout::Bit => OccupancyTable::Bit(BitTable::from_bytes(dims, bytes)?),
			TableLayout::Block => OccupancyTable::Block(BlockTable::from_bytes(dims, bytes)?),
		})
	}

	pub fn layout(&self) -> TableLayout {
		match self {
			OccupancyTable::Bit(_) => TableLayout::Bit,
			OccupancyTable::Block(_) => TableLayout::Block,
		}
	}

	pub fn as_bytes(&self) -> &[u8] {
		match self {
			OccupancyTable::Bit(t) => t.as_bytes(),
			OccupancyTable::Block(t) => t.as_bytes(),
		}
	}

	pub fn count_filled(&self) -> usize {
		match self {
			OccupancyTable::Bit(t) => t.count_filled(),
			OccupancyTable::Block(t) => t.count_filled(),
		}
	}
}

impl Occupancy for OccupancyTable {
	fn dims(&self) -> UVec3 {
		match self {
			OccupancyTable::Bit(t) => t.dims(),
			OccupancyTable::Block(t) => t.dims(),
		}
	}

	#[inline]
	fn voxel(&self, x: u32, y: u32, z: u32) -> bool {
		match self {
			OccupancyTable::Bit(t) => t.voxel(x, y, z),
			OccupancyTable::Block(t) => t.voxel(x, y, z),
		}
	}
}

impl OccupancyMut for OccupancyTable {
	#[inline]
	fn set_voxel(&mut self, x: u32, y: u32, z: u32, value: bool) {
		match self {
			OccupancyTable::Bit(t) => t.set_voxel(x, y, z, value),
			OccupancyTable::Block(t) => t.set_voxel(x, y, z, value),
		}
	}
}
