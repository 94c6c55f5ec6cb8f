pub mod constants;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use filename::station_output_path;
pub use progress::ProgressReporter;
