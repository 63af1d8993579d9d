use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use glam::IVec3;
use indicatif::{ProgressBar, ProgressStyle};
use log::{LevelFilter, Log, Metadata, Record};

use meshvox::voxel_grid::binvox;
use meshvox::voxel_grid::geometry::{DEFAULT_ALIGNMENT, DEFAULT_MARGIN};
use meshvox::voxel_grid::info;
use meshvox::voxel_grid::raw_io;
use meshvox::voxel_grid::{AxisAlignedBox, GridConfig, GridInfo, OccupancyTable, PaddingStrategy, TableLayout};

#[derive(Parser)]
#[command(name = "meshvox", version, about = "Voxel grid geometry and binvox export for mesh bounding boxes")]
struct Cli {
	/// Skip the banner and reports on stderr
	#[arg(short, long, global = true)]
	quiet: bool,

	/// Log more detail to stderr (-v debug, -vv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	verbose: u8,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Print the padded grid derived from a mesh bounding box
	Grid(GridArgs),
	/// Convert a raw occupancy table dump into a .binvox file
	Export(ExportArgs),
	/// Print the header and fill count of a .binvox file
	Info {
		path: PathBuf,
	},
}

#[derive(Args)]
struct GridArgs {
	/// Mesh box minimum corner
	#[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true, required = true)]
	min: Vec<i32>,

	/// Mesh box maximum corner
	#[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true, required = true)]
	max: Vec<i32>,

	/// Number of triangles in the mesh
	#[arg(long, default_value_t = 0)]
	triangles: usize,

	/// Grid axes are padded to a multiple of this
	#[arg(long, default_value_t = DEFAULT_ALIGNMENT)]
	alignment: u32,

	/// Empty cells around the mesh box
	#[arg(long, default_value_t = DEFAULT_MARGIN, allow_negative_numbers = true)]
	margin: i32,

	/// Make the grid a cube before aligning
	#[arg(long)]
	cube: bool,
}

impl GridArgs {
	fn mesh_box(&self) -> AxisAlignedBox<IVec3> {
		AxisAlignedBox::new(
			IVec3::new(self.min[0], self.min[1], self.min[2]),
			IVec3::new(self.max[0], self.max[1], self.max[2]),
		)
	}

	fn config(&self) -> GridConfig {
		GridConfig {
			alignment: self.alignment,
			margin: self.margin,
			padding: if self.cube { PaddingStrategy::Cube } else { PaddingStrategy::Aligned },
		}
	}

	fn derive(&self) -> Result<GridInfo> {
		GridInfo::from_mesh_box(&self.mesh_box(), self.triangles, &self.config())
			.context("Failed to derive grid from mesh box")
	}
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
	/// One bit per voxel
	Bit,
	/// One byte per 2x2x2 block
	Block,
}

impl From<LayoutArg> for TableLayout {
	fn from(arg: LayoutArg) -> Self {
		match arg {
			LayoutArg::Bit => TableLayout::Bit,
			LayoutArg::Block => TableLayout::Block,
		}
	}
}

#[derive(Args)]
struct ExportArgs {
	#[command(flatten)]
	grid: GridArgs,

	/// Raw occupancy table written by the rasterizer for this grid
	#[arg(long)]
	table: PathBuf,

	/// Byte layout of the table
	#[arg(long, value_enum, default_value = "block")]
	layout: LayoutArg,

	/// Output path without extension; `.binvox` is appended
	#[arg(short, long)]
	out: PathBuf,
}

/// Prints library log records on stderr next to the reports.
struct StderrLogger;

impl Log for StderrLogger {
	fn enabled(&self, metadata: &Metadata) -> bool {
		metadata.level() <= log::max_level()
	}

	fn log(&self, record: &Record) {
		if self.enabled(record.metadata()) {
			eprintln!("[{}] {}", record.level(), record.args());
		}
	}

	fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn log_level(quiet: bool, verbose: u8) -> LevelFilter {
	if quiet {
		return LevelFilter::Warn;
	}
	match verbose {
		0 => LevelFilter::Info,
		1 => LevelFilter::Debug,
		_ => LevelFilter::Trace,
	}
}

fn main() -> Result<()> {
	let cli = Cli::parse();
	log::set_logger(&LOGGER).map_err(|e| anyhow!("Failed to install logger: {}", e))?;
	log::set_max_level(log_level(cli.quiet, cli.verbose));
	if !cli.quiet {
		info::print_banner();
		info::print_compile_info();
	}

	match cli.command {
		Command::Grid(args) => run_grid(&args, cli.quiet),
		Command::Export(args) => run_export(&args, cli.quiet),
		Command::Info { path } => run_info(&path),
	}
}

fn run_grid(args: &GridArgs, quiet: bool) -> Result<()> {
	let grid = args.derive()?;
	if !quiet {
		grid.report();
	}
	let dims = grid.dims();
	println!(
		"{} {} {} {} {} {}",
		grid.bbox.min.x, grid.bbox.min.y, grid.bbox.min.z, grid.bbox.max.x, grid.bbox.max.y, grid.bbox.max.z
	);
	println!("{} {} {}", dims.x, dims.y, dims.z);
	println!("bit table bytes: {}", TableLayout::Bit.byte_len(dims));
	println!("block table bytes: {}", TableLayout::Block.byte_len(dims));
	Ok(())
}

fn run_export(args: &ExportArgs, quiet: bool) -> Result<()> {
	let grid = args.grid.derive()?;
	let layout = TableLayout::from(args.layout);
	let expected = layout.byte_len(grid.dims());

	let found = raw_io::file_length(&args.table)
		.with_context(|| format!("Failed to stat table {}", args.table.display()))?;
	if found != expected as u64 {
		bail!(
			"table {} has {} bytes, a {:?} table for this grid needs {}",
			args.table.display(),
			found,
			layout,
			expected
		);
	}
	let bytes = raw_io::read_binary(&args.table, expected)
		.with_context(|| format!("Failed to read table {}", args.table.display()))?;
	let table = OccupancyTable::from_bytes(layout, grid.dims(), bytes)?;

	if !quiet {
		grid.report();
		table.report_memory();
	}

	let pb = if quiet { ProgressBar::hidden() } else { ProgressBar::new(0) };
	pb.set_style(
		ProgressStyle::default_bar()
		.template("Extracting slices: [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
		.progress_chars("#>-"),
	);
	let mesh_box = args.grid.mesh_box().as_vec3();
	let path = binvox::write_binvox_file_with_progress(&table, &grid, &mesh_box, &args.out, &pb)
		.context("Failed to write binvox file")?;
	eprintln!("binvox file saved: {}", path.display());
	Ok(())
}

fn run_info(path: &Path) -> Result<()> {
	let file = binvox::read_binvox_file(path)
		.with_context(|| format!("Failed to read binvox file {}", path.display()))?;
	let h = &file.header;
	println!("dim {} {} {}", h.dims.x, h.dims.y, h.dims.z);
	println!("translate {} {} {}", h.translate.x, h.translate.y, h.translate.z);
	println!("scale {}", h.scale);
	println!("filled {} of {}", file.volume.count_filled(), file.volume.voxel_count());
	Ok(())
}
