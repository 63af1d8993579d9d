use std::mem::size_of;

use glam::IVec3;

use crate::voxel_grid::bbox::AxisAlignedBox;
use crate::voxel_grid::error::{Result, VoxError};
use crate::voxel_grid::geometry::{GridConfig, GridInfo};
use crate::voxel_grid::table::{MemoryLimits, OccupancyTable, TableLayout};
use crate::voxel_grid::utils::format_bytes;

/// Triangle rasterizer filling an occupancy buffer.
///
/// `triangles` holds `9 * grid.triangle_count` floats. `table` is zeroed,
/// exactly `layout.byte_len(grid.dims())` bytes long, and must be fully
/// written in `layout` before `voxelize` returns. `morton` only affects the
/// rasterizer's internal traversal order.
pub trait Voxelizer {
	fn voxelize(
		&self,
		grid: &GridInfo,
		triangles: &[f32],
		table: &mut [u8],
		layout: TableLayout,
		morton: bool,
	) -> Result<()>;
}

impl<F> Voxelizer for F
where
	F: Fn(&GridInfo, &[f32], &mut [u8], TableLayout, bool) -> Result<()>,
{
	fn voxelize(
		&self,
		grid: &GridInfo,
		triangles: &[f32],
		table: &mut [u8],
		layout: TableLayout,
		morton: bool,
	) -> Result<()> {
		self(grid, triangles, table, layout, morton)
	}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VoxelizeOptions {
	pub grid: GridConfig,
	pub layout: TableLayout,
	pub limits: MemoryLimits,
	pub morton: bool,
}

/// A derived grid together with its populated table.
#[derive(Debug, Clone)]
pub struct VoxelizedMesh {
	pub grid: GridInfo,
	pub table: OccupancyTable,
}

/// Derive the grid for `mesh_box`, allocate a zeroed table for it and let
/// `voxelizer` fill it.
pub fn voxelize_mesh<V: Voxelizer + ?Sized>(
	triangles: &[f32],
	mesh_box: &AxisAlignedBox<IVec3>,
	options: &VoxelizeOptions,
	voxelizer: &V,
) -> Result<VoxelizedMesh> {
	if triangles.len() % 9 != 0 {
		return Err(VoxError::invalid(format!(
			"triangle data must hold 9 floats per triangle, got {} floats",
			triangles.len()
		)));
	}
	let triangle_count = triangles.len() / 9;
	let grid = GridInfo::from_mesh_box(mesh_box, triangle_count, &options.grid)?;

	let table_bytes = options.layout.byte_len(grid.dims());
	let triangle_bytes = triangles.len() * size_of::<f32>();
	options.limits.check(table_bytes.saturating_add(triangle_bytes))?;
	log::info!(
		"voxelizing {} triangles ({}) into {:?} table of {}",
		triangle_count,
		format_bytes(triangle_bytes),
		options.layout,
		format_bytes(table_bytes)
	);

	let mut buf = options.limits.allocate_zeroed(table_bytes)?;
	voxelizer.voxelize(&grid, triangles, &mut buf, options.layout, options.morton)?;
	let table = OccupancyTable::from_bytes(options.layout, grid.dims(), buf)?;
	log::debug!("voxelizer filled {} voxels", table.count_filled());

	Ok(VoxelizedMesh { grid, table })
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::voxel_grid::table::{Occupancy, OccupancyMut};

	/// Marks the voxel holding each vertex.
	fn mark_vertices(grid: &GridInfo, triangles: &[f32], table: &mut [u8], layout: TableLayout, _morton: bool) -> Result<()> {
		let mut t = OccupancyTable::from_bytes(layout, grid.dims(), table.to_vec())?;
		for v in triangles.chunks_exact(3) {
			let p = IVec3::new(v[0] as i32, v[1] as i32, v[2] as i32) - grid.bbox.min;
			t.fill_voxel(p.x as u32, p.y as u32, p.z as u32);
		}
		table.copy_from_slice(t.as_bytes());
		Ok(())
	}

	fn tri() -> Vec<f32> {
		vec![0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 2.0, 1.0]
	}

	#[test]
	fn pipeline_fills_table_for_grid() {
		let mesh = AxisAlignedBox::from_array([0, 0, 0, 3, 2, 1]);
		for layout in [TableLayout::Bit, TableLayout::Block] {
			let options = VoxelizeOptions { layout, ..Default::default() };
			let out = voxelize_mesh(&tri(), &mesh, &options, &mark_vertices).unwrap();
			assert_eq!(out.grid.triangle_count, 1);
			assert_eq!(out.table.dims(), out.grid.dims());
			assert_eq!(out.table.count_filled(), 3);
			let o = (-out.grid.bbox.min).as_uvec3();
			assert!(out.table.voxel(o.x, o.y, o.z));
			assert!(out.table.voxel(o.x + 3, o.y, o.z));
			assert!(out.table.voxel(o.x, o.y + 2, o.z + 1));
		}
	}

	#[test]
	fn pipeline_rejects_partial_triangles() {
		let mesh = AxisAlignedBox::from_array([0, 0, 0, 3, 2, 1]);
		let err = voxelize_mesh(&tri()[..8], &mesh, &VoxelizeOptions::default(), &mark_vertices).unwrap_err();
		assert!(matches!(err, VoxError::InvalidInput(_)));
	}

	#[test]
	fn pipeline_respects_memory_limits() {
		let mesh = AxisAlignedBox::from_array([0, 0, 0, 3, 2, 1]);
		let options = VoxelizeOptions {
			limits: MemoryLimits::with_max_bytes(64),
			..Default::default()
		};
		let err = voxelize_mesh(&tri(), &mesh, &options, &mark_vertices).unwrap_err();
		assert!(matches!(err, VoxError::AllocationFailure { limit: Some(64), .. }));
	}

	#[test]
	fn voxelizer_errors_propagate() {
		let mesh = AxisAlignedBox::from_array([0, 0, 0, 3, 2, 1]);
		let failing = |_: &GridInfo, _: &[f32], _: &mut [u8], _: TableLayout, _: bool| -> Result<()> {
			Err(VoxError::invalid("rasterizer gave up"))
		};
		assert!(voxelize_mesh(&tri(), &mesh, &VoxelizeOptions::default(), &failing).is_err());
	}
}
