use glam::{IVec3, UVec3, Vec3};

use meshvox::voxel_grid::binvox::{self, BinvoxHeader};
use meshvox::voxel_grid::extract::{self, BINVOX_WINDOW_MARGIN};
use meshvox::voxel_grid::raw_io;
use meshvox::voxel_grid::{
	AxisAlignedBox, BlockTable, GridConfig, GridInfo, Occupancy, OccupancyMut, OccupancyTable, OutputWindow,
	TableLayout, VoxError, VoxelVolume,
};

/// Deterministic xorshift so failures reproduce.
struct XorShift(u32);

impl XorShift {
	fn next_bool(&mut self, density: u32) -> bool {
		self.0 ^= self.0 << 13;
		self.0 ^= self.0 >> 17;
		self.0 ^= self.0 << 5;
		self.0 % 100 < density
	}
}

fn random_volume(dims: UVec3, seed: u32, density: u32) -> VoxelVolume {
	let mut rng = XorShift(seed);
	let mut vol = VoxelVolume::new(dims);
	for z in 0..dims.z {
		for y in 0..dims.y {
			for x in 0..dims.x {
				vol.set(x, y, z, rng.next_bool(density));
			}
		}
	}
	vol
}

fn check_runs(runs: &[u8], voxels: usize) {
	assert_eq!(runs.len() % 2, 0);
	let mut total = 0usize;
	for pair in runs.chunks_exact(2) {
		assert!(pair[0] <= 1);
		assert!(pair[1] >= 1);
		total += pair[1] as usize;
	}
	assert_eq!(total, voxels);
}

#[test]
fn random_volumes_round_trip() {
	let shapes = [
		UVec3::new(1, 1, 1),
		UVec3::new(3, 5, 7),
		UVec3::new(16, 1, 9),
		UVec3::new(8, 33, 4),
		UVec3::new(20, 14, 8),
	];
	for (i, dims) in shapes.into_iter().enumerate() {
		for density in [0, 5, 50, 95, 100] {
			let vol = random_volume(dims, 0x9e37_79b9 ^ (i as u32 * 31 + density), density);
			let runs = binvox::encode_runs(&vol, Vec::new()).unwrap();
			check_runs(&runs, vol.voxel_count());
			let back = binvox::decode_runs(&runs, dims).unwrap();
			assert_eq!(back, vol, "dims {} density {}", dims, density);
		}
	}
}

#[test]
fn long_uniform_runs_round_trip() {
	let dims = UVec3::new(3, 260, 2);
	let mut vol = VoxelVolume::new(dims);
	for x in 0..dims.x {
		for z in 0..dims.z {
			for y in 0..dims.y {
				vol.set(x, y, z, true);
			}
		}
	}
	let runs = binvox::encode_runs(&vol, Vec::new()).unwrap();
	// 1560 voxels = 6 * 255 + 30
	let mut expected = Vec::new();
	for _ in 0..6 {
		expected.extend_from_slice(&[1, 255]);
	}
	expected.extend_from_slice(&[1, 30]);
	assert_eq!(runs, expected);
	assert_eq!(binvox::decode_runs(&runs, dims).unwrap(), vol);
}

#[test]
fn run_never_exceeds_255_across_value_changes() {
	let dims = UVec3::new(1, 600, 1);
	let mut vol = VoxelVolume::new(dims);
	for y in 300..600 {
		vol.set(0, y, 0, true);
	}
	let runs = binvox::encode_runs(&vol, Vec::new()).unwrap();
	assert_eq!(runs, vec![0, 255, 0, 45, 1, 255, 1, 45]);
}

#[test]
fn full_file_round_trip_through_disk() {
	let dir = tempfile::tempdir().unwrap();
	let mesh = AxisAlignedBox::from_array([0, 0, 0, 10, 6, 4]);
	let grid = GridInfo::from_mesh_box(&mesh, 4, &GridConfig::default()).unwrap();

	let mut table = OccupancyTable::new(TableLayout::Block, grid.dims());
	let inside = mesh.min - grid.bbox.min;
	for z in 0..4 {
		for y in 0..6 {
			for x in 0..10 {
				if (x + y + z) % 3 == 0 {
					let p = (inside + IVec3::new(x, y, z)).as_uvec3();
					table.fill_voxel(p.x, p.y, p.z);
				}
			}
		}
	}

	let path = binvox::write_binvox_file(&table, &grid, &mesh.as_vec3(), dir.path().join("part")).unwrap();
	assert_eq!(path, dir.path().join("part.binvox"));

	let bytes = std::fs::read(&path).unwrap();
	let window = OutputWindow::around_world(&mesh.as_vec3(), &grid, BINVOX_WINDOW_MARGIN);
	let header = format!(
		"#binvox 1\ndim {} {} {}\ntranslate {} {} {}\nscale 1\ndata\n",
		window.dims().x,
		window.dims().y,
		window.dims().z,
		window.translate.x,
		window.translate.y,
		window.translate.z
	);
	assert!(bytes.starts_with(header.as_bytes()));
	check_runs(&bytes[header.len()..], window.voxel_count() as usize);

	let file = binvox::read_binvox_file(&path).unwrap();
	assert_eq!(file.header.dims, UVec3::new(16, 12, 10));
	assert_eq!(file.header.translate, Vec3::new(-3.0, -3.0, -3.0));
	assert_eq!(file.header.scale, 1.0);
	let expected = extract::extract_window(&table, &window).unwrap();
	assert_eq!(file.volume, expected);
	assert_eq!(file.volume.count_filled(), table.count_filled());
}

#[test]
fn scaled_grid_writes_world_translate() {
	let dir = tempfile::tempdir().unwrap();
	let mesh = AxisAlignedBox::from_array([0, 0, 0, 4, 4, 4]);
	let grid = GridInfo::from_mesh_box(&mesh, 0, &GridConfig::default())
		.unwrap()
		.with_unit(0.25)
		.unwrap();
	let table = BlockTable::new(grid.dims());
	let world = AxisAlignedBox::new(Vec3::splat(-7.0), Vec3::splat(-6.0));

	let path = binvox::write_binvox_file(&table, &grid, &world, dir.path().join("scaled")).unwrap();
	let file = binvox::read_binvox_file(&path).unwrap();
	// origin -8, (-7 - -8) / 0.25 = 4 -> 1 after margin; (-6 - -8) / 0.25 = 8 -> 11
	assert_eq!(file.header.dims, UVec3::splat(10));
	assert_eq!(file.header.translate, Vec3::splat(-7.75));
	assert_eq!(file.header.scale, 0.25);
	assert_eq!(file.volume.count_filled(), 0);
}

#[test]
fn raw_table_dump_exports_like_in_memory_table() {
	let dir = tempfile::tempdir().unwrap();
	let mesh = AxisAlignedBox::from_array([-3, 2, 0, 5, 9, 1]);
	let grid = GridInfo::from_mesh_box(&mesh, 0, &GridConfig::default()).unwrap();
	let mut table = OccupancyTable::new(TableLayout::Bit, grid.dims());
	table.fill_voxel(9, 9, 9);
	table.fill_voxel(10, 12, 8);

	let dump = raw_io::write_binary(table.as_bytes(), dir.path().join("table")).unwrap();
	let len = TableLayout::Bit.byte_len(grid.dims());
	assert_eq!(raw_io::file_length(&dump).unwrap(), len as u64);
	let reloaded = OccupancyTable::from_bytes(TableLayout::Bit, grid.dims(), raw_io::read_binary(&dump, len).unwrap()).unwrap();

	let a = binvox::write_binvox_file(&table, &grid, &mesh.as_vec3(), dir.path().join("a")).unwrap();
	let b = binvox::write_binvox_file(&reloaded, &grid, &mesh.as_vec3(), dir.path().join("b")).unwrap();
	assert_eq!(std::fs::read(a).unwrap(), std::fs::read(b).unwrap());
}

#[test]
fn export_into_missing_directory_fails_with_path() {
	let dir = tempfile::tempdir().unwrap();
	let mesh = AxisAlignedBox::from_array([0, 0, 0, 2, 2, 2]);
	let grid = GridInfo::from_mesh_box(&mesh, 0, &GridConfig::default()).unwrap();
	let table = OccupancyTable::new(TableLayout::Bit, grid.dims());
	let base = dir.path().join("nope").join("out");
	match binvox::write_binvox_file(&table, &grid, &mesh.as_vec3(), &base) {
		Err(VoxError::Io { path, .. }) => assert_eq!(path, dir.path().join("nope").join("out.binvox")),
		other => panic!("expected Io error, got {:?}", other),
	}
	assert!(!dir.path().join("nope").exists());
}

#[test]
fn header_matches_volume_dims() {
	let vol = random_volume(UVec3::new(2, 3, 4), 7, 40);
	let bytes = binvox::encode_binvox(&vol, Vec3::new(1.5, -2.0, 0.0), 2.0, Vec::new()).unwrap();
	let file = binvox::parse_binvox(&bytes).unwrap();
	assert_eq!(
		file.header,
		BinvoxHeader {
			dims: UVec3::new(2, 3, 4),
			translate: Vec3::new(1.5, -2.0, 0.0),
			scale: 2.0,
		}
	);
	assert_eq!(file.volume, vol);
	assert_eq!(vol.dims(), file.volume.dims());
}
