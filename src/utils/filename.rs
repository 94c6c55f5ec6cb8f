use crate::models::{StationId, YearRange};
use std::path::{Path, PathBuf};

/// Output file for one station: `{dir}/{USAF-WBAN}-{start}[_{end}].{ext}`
pub fn station_output_path(
    output_dir: &Path,
    station: &StationId,
    years: YearRange,
    extension: &str,
) -> PathBuf {
    let span = if years.start == years.end {
        years.start.to_string()
    } else {
        format!("{}_{}", years.start, years.end)
    };
    output_dir.join(format!("{}-{}.{}", station, span, extension))
}
