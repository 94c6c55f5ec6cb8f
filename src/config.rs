//! Run settings: an optional TOML file overlaid with `ISD`-prefixed
//! environment variables. Command-line flags take precedence over both.

use crate::error::Result;
use crate::processors::DecodeOptions;
use crate::utils::constants::{COMPRESSION_SNAPPY, DEFAULT_ROW_GROUP_SIZE};
use crate::writers::ParquetWriter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::Validate;

const DEFAULT_SETTINGS_FILE: &str = "isd-decoder";
const ENV_PREFIX: &str = "ISD";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    /// Root of the local archive mirror
    pub data_dir: PathBuf,

    /// CSV with `id` and `tz_name` columns
    pub stations_file: Option<PathBuf>,

    pub output_dir: PathBuf,

    pub compression: String,

    #[validate(range(min = 1, max = 1024))]
    pub max_workers: usize,

    #[validate(range(min = 1))]
    pub row_group_size: usize,

    pub use_mmap: bool,

    pub decode: DecodeOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            stations_file: None,
            output_dir: PathBuf::from("output"),
            compression: COMPRESSION_SNAPPY.to_string(),
            max_workers: num_cpus::get(),
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            use_mmap: false,
            decode: DecodeOptions::default(),
        }
    }
}

impl Settings {
    /// Load from `path`, or from `isd-decoder.toml` in the working directory
    /// when present, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        builder = match path {
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => builder.add_source(config::File::with_name(DEFAULT_SETTINGS_FILE).required(false)),
        };
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.check()?;
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// Field ranges, compression name and decode option consistency
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        ParquetWriter::new().with_compression(&self.compression)?;
        self.decode.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use std::io::Write;

    fn settings_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.check().is_ok());
        assert!(settings.decode.relative_humidity);
        assert!(settings.decode.local_time);
    }

    #[test]
    fn test_load_from_file() {
        let file = settings_file(
            "data_dir = \"/archive/isd\"\nmax_workers = 3\n\n[decode]\nmake_hourly = true\n",
        );
        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("/archive/isd"));
        assert_eq!(settings.max_workers, 3);
        assert!(settings.decode.make_hourly);
        assert!(!settings.decode.fill_missing_hours);
        assert_eq!(settings.compression, "snappy");
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let file = settings_file("max_workers = 0\n");
        assert!(matches!(
            Settings::load(Some(file.path())),
            Err(ProcessingError::Validation(_))
        ));

        let file = settings_file("compression = \"rar\"\n");
        assert!(matches!(
            Settings::load(Some(file.path())),
            Err(ProcessingError::Config(_))
        ));
    }
}
