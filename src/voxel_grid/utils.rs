use std::mem::size_of;

use crate::voxel_grid::table::{Occupancy, OccupancyTable};

/// Format large numbers with KB, MB, GB, TB suffixes
pub fn format_bytes(bytes: usize) -> String {
	const KB: usize = 1024;
	const MB: usize = KB * 1024;
	const GB: usize = MB * 1024;
	const TB: usize = GB * 1024;

	if bytes >= TB {
		format!("{:.2} TB", bytes as f64 / TB as f64)
	} else if bytes >= GB {
		format!("{:.2} GB", bytes as f64 / GB as f64)
	} else if bytes >= MB {
		format!("{:.2} MB", bytes as f64 / MB as f64)
	} else if bytes >= KB {
		format!("{:.2} KB", bytes as f64 / KB as f64)
	} else {
		format!("{} bytes", bytes)
	}
}

/// Format a float the way C's `%g` does: six significant digits, trailing
/// zeros dropped, exponent form below 1e-4 or from 1e6 up.
pub fn format_float(value: f32) -> String {
	if value == 0.0 {
		return if value.is_sign_negative() { "-0".to_string() } else { "0".to_string() };
	}
	if !value.is_finite() {
		return value.to_string();
	}
	// the exponent must be taken after rounding to six digits
	let sci = format!("{:.5e}", value);
	let Some((mantissa, exp)) = sci.split_once('e') else {
		return sci;
	};
	let exp: i32 = exp.parse().unwrap_or(0);
	if (-4..6).contains(&exp) {
		let fixed = format!("{:.*}", (5 - exp) as usize, value);
		trim_fraction(&fixed).to_string()
	} else {
		let sign = if exp < 0 { '-' } else { '+' };
		format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
	}
}

fn trim_fraction(s: &str) -> &str {
	if s.contains('.') {
		s.trim_end_matches('0').trim_end_matches('.')
	} else {
		s
	}
}

impl OccupancyTable {
	/// Print dimensions, layout and buffer size of the table
	pub fn report_memory(&self) {
		let dims = self.dims();
		let table_bytes = self.as_bytes().len();
		let total_voxels = dims.x as u64 * dims.y as u64 * dims.z as u64;

		eprintln!("Occupancy Table Report:");
		eprintln!("-------------------------");
		eprintln!("  Dimensions: {} x {} x {}", dims.x, dims.y, dims.z);
		eprintln!("  Layout: {:?}", self.layout());
		eprintln!("  Total Voxels: {:e}", total_voxels as f64);
		eprintln!("  Filled Voxels: {}", self.count_filled());
		eprintln!("  Struct Overhead: {}", format_bytes(size_of::<Self>()));
		eprintln!("  Table Buffer: {}", format_bytes(table_bytes));
		eprintln!("-------------------------");
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn byte_suffixes() {
		assert_eq!(format_bytes(512), "512 bytes");
		assert_eq!(format_bytes(1536), "1.50 KB");
		assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MB");
		assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5.00 GB");
	}

	#[test]
	fn floats_print_like_percent_g() {
		assert_eq!(format_float(3.0 * 0.1), "0.3");
		assert_eq!(format_float(-5.0), "-5");
		assert_eq!(format_float(2.5), "2.5");
		assert_eq!(format_float(0.0), "0");
		assert_eq!(format_float(-7.75), "-7.75");
		assert_eq!(format_float(123456.7), "123457");
		assert_eq!(format_float(999999.7), "1e+06");
		assert_eq!(format_float(1.0e6), "1e+06");
		assert_eq!(format_float(2.5e7), "2.5e+07");
		assert_eq!(format_float(0.0001), "0.0001");
		assert_eq!(format_float(0.00001), "1e-05");
		assert_eq!(format_float(-1.25e-7), "-1.25e-07");
	}
}
