use std::env;
use std::sync::Once;

/// Print the tool banner (only prints once)
pub fn print_banner() {
	static PRINT_BANNER_ONCE: Once = Once::new();
	PRINT_BANNER_ONCE.call_once(|| {
		eprintln!("meshvox: mesh bounding box to voxel grid, window extraction and binvox export");
		eprintln!("Output format: binvox 1 (x/z/y run-length encoding)\n");
	});
}

/// Print compilation information (only prints once)
pub fn print_compile_info() {
	static PRINT_COMPILE_ONCE: Once = Once::new();
	PRINT_COMPILE_ONCE.call_once(|| {
		let program_name = env::current_exe()
		.ok()
		.as_ref()
		.and_then(|path| path.file_name())
		.and_then(|name| name.to_str())
		.unwrap_or("Unknown Program")
		.to_string();

		eprintln!("Program: {}", program_name);
		eprintln!(
			"Compiled on: {} at {}",
			env!("COMPILE_DATE"),
			env!("COMPILE_TIME")
		);
		eprintln!("Crate version: {}", env!("CARGO_PKG_VERSION"));
	});
}
