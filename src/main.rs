//! CLI entry point for the grid map tooling

use clap::Parser;
use gridmap::io::cli::{Cli, CommandRunner};

fn main() -> gridmap::Result<()> {
    let cli = Cli::parse();
    CommandRunner::new(cli).run()
}
