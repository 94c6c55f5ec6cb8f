use clap::Parser;
use isd_decoder::cli::{run, Cli};
use isd_decoder::error::Result;

fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}
