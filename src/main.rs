use anyhow::Result;
use deepchat::cli;
use deepchat::core::init_tracing;

fn main() -> Result<()> {
    init_tracing();
    cli::run()
}
