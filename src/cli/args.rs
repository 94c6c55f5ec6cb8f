use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "isd-decoder")]
#[command(about = "Decoder for NOAA Integrated Surface Database hourly records")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Settings file (TOML)")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode station-years into one table per station
    Decode(DecodeArgs),

    /// Count records carrying each additional-data category
    Coverage(CoverageArgs),

    /// List the additional-data categories the decoder knows
    Catalog {
        #[arg(help = "Show only this category code")]
        code: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

/// Where station files and zone names come from
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    #[arg(short, long, help = "Year or inclusive span, e.g. 2014 or 2014:2015")]
    pub years: String,

    #[arg(long, help = "Archive directory [default: from settings]")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, help = "CSV with id,tz_name columns [default: from settings]")]
    pub stations_file: Option<PathBuf>,

    #[arg(long, help = "Memory-map uncompressed archive files")]
    pub mmap: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DecodeArgs {
    #[arg(required = true, help = "Station ids as USAF-WBAN")]
    pub stations: Vec<String>,

    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long, conflicts_with = "categories", help = "Add every category present")]
    pub full: bool,

    #[arg(long, help = "Comma separated category codes to add, e.g. AA1,GF1")]
    pub categories: Option<String>,

    #[arg(long, help = "Bucket observations onto whole hours")]
    pub hourly: bool,

    #[arg(long, help = "Add null rows for hours without observations")]
    pub fill: bool,

    #[arg(long, help = "Skip the relative humidity column")]
    pub no_rh: bool,

    #[arg(long, help = "Keep timestamps in UTC")]
    pub utc: bool,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    #[arg(short, long, help = "Output directory [default: from settings]")]
    pub output_dir: Option<PathBuf>,

    #[arg(short, long, help = "Parquet compression [default: from settings]")]
    pub compression: Option<String>,

    #[arg(long, help = "Worker threads [default: from settings]")]
    pub max_workers: Option<usize>,

    #[arg(short, long, help = "Hide the progress bar")]
    pub quiet: bool,

    #[arg(long, help = "Print the decode report of each station")]
    pub report: bool,

    #[arg(long, help = "Write every station's decode report as JSON to this file")]
    pub report_json: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CoverageArgs {
    #[arg(help = "Station id as USAF-WBAN")]
    pub station: String,

    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long, default_value = "all", help = "Grouping: all, year or month")]
    pub by: String,

    #[arg(long, help = "Comma separated category codes [default: whole catalog]")]
    pub categories: Option<String>,

    #[arg(long, help = "One column per category instead of long format")]
    pub wide: bool,

    #[arg(short, long, help = "Write CSV here instead of stdout")]
    pub output: Option<PathBuf>,
}
