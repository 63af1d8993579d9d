pub mod voxel_grid {
	pub mod error;
	pub mod info;
	pub mod bbox;
	pub mod geometry;
	pub mod table;
	pub mod utils;
	pub mod extract;
	pub mod binvox;
	pub mod raw_io;
	pub mod voxelize;

	pub use bbox::AxisAlignedBox;
	pub use error::{Result, VoxError};
	pub use extract::{Extraction, OutputWindow, VoxelVolume};
	pub use geometry::{GridConfig, GridInfo, PaddingStrategy};
	pub use table::{BitTable, BlockTable, MemoryLimits, Occupancy, OccupancyMut, OccupancyTable, TableLayout};
}
